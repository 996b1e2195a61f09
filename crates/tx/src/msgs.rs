//! Message router.
//!
//! [`CosmosMsg`] is the closed set of messages this client can place in a transaction body.
//! Each variant knows its protobuf type URL, its legacy amino name, how to pack itself into an
//! [`Any`] and which addresses must sign it. Supporting a new on-chain message means adding a
//! variant; existing entries never change.

use cosmrs::{
    proto::{
        cosmos::{
            bank::v1beta1 as bank,
            base::v1beta1::Coin as ProtoCoin,
            crisis::v1beta1 as crisis,
            distribution::v1beta1 as distribution,
            feegrant::v1beta1 as feegrant,
            gov::v1beta1 as gov,
            slashing::v1beta1 as slashing,
            staking::v1beta1 as staking,
        },
        cosmwasm::wasm::v1 as wasm,
        prost::Message,
    },
    AccountId, Any,
};
use kestrel_primitives::{
    numeric::{parse_amount, split_denom},
    Error, Result,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use serde_with::{serde_as, DisplayFromStr};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coin {
    pub denom: String,
    pub amount: String,
}

impl Coin {
    pub fn new(denom: impl Into<String>, amount: impl ToString) -> Self {
        Self {
            denom: denom.into(),
            amount: amount.to_string(),
        }
    }

    /// Parse `"100axpriv"`.
    pub fn parse(coin: &str) -> Result<Self> {
        let (_, denom) = split_denom(coin);
        if denom.is_empty() {
            return Err(Error::parse("coin", format!("{coin:?} has no denomination")));
        }
        let amount = parse_amount("coin", coin)?;
        Ok(Self::new(denom, amount))
    }

    pub(crate) fn to_proto(&self) -> ProtoCoin {
        ProtoCoin {
            denom: self.denom.clone(),
            amount: self.amount.clone(),
        }
    }

    pub(crate) fn from_proto(coin: ProtoCoin) -> Self {
        Self {
            denom: coin.denom,
            amount: coin.amount,
        }
    }
}

fn coins_to_proto(coins: &[Coin]) -> Vec<ProtoCoin> {
    coins.iter().map(Coin::to_proto).collect()
}

fn coins_from_proto(coins: Vec<ProtoCoin>) -> Vec<Coin> {
    coins.into_iter().map(Coin::from_proto).collect()
}

fn required_coin(what: &str, coin: Option<ProtoCoin>) -> Result<Coin> {
    coin.map(Coin::from_proto)
        .ok_or_else(|| Error::parse(what, "amount is missing"))
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgSend {
    pub from_address: String,
    pub to_address: String,
    pub amount: Vec<Coin>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgDelegate {
    pub delegator_address: String,
    pub validator_address: String,
    pub amount: Coin,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgUndelegate {
    pub delegator_address: String,
    pub validator_address: String,
    pub amount: Coin,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgBeginRedelegate {
    pub delegator_address: String,
    pub validator_src_address: String,
    pub validator_dst_address: String,
    pub amount: Coin,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgWithdrawDelegatorReward {
    pub delegator_address: String,
    pub validator_address: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgSetWithdrawAddress {
    pub delegator_address: String,
    pub withdraw_address: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgFundCommunityPool {
    pub amount: Vec<Coin>,
    pub depositor: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum VoteOption {
    #[serde(rename = "VOTE_OPTION_YES")]
    Yes,
    #[serde(rename = "VOTE_OPTION_ABSTAIN")]
    Abstain,
    #[serde(rename = "VOTE_OPTION_NO")]
    No,
    #[serde(rename = "VOTE_OPTION_NO_WITH_VETO")]
    NoWithVeto,
}

impl VoteOption {
    fn as_i32(self) -> i32 {
        match self {
            VoteOption::Yes => 1,
            VoteOption::Abstain => 2,
            VoteOption::No => 3,
            VoteOption::NoWithVeto => 4,
        }
    }

    fn from_i32(option: i32) -> Result<Self> {
        match option {
            1 => Ok(VoteOption::Yes),
            2 => Ok(VoteOption::Abstain),
            3 => Ok(VoteOption::No),
            4 => Ok(VoteOption::NoWithVeto),
            other => Err(Error::parse("vote option", format!("unknown option {other}"))),
        }
    }
}

#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgVote {
    #[serde_as(as = "DisplayFromStr")]
    pub proposal_id: u64,
    pub voter: String,
    pub option: VoteOption,
}

#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgDeposit {
    #[serde_as(as = "DisplayFromStr")]
    pub proposal_id: u64,
    pub depositor: String,
    pub amount: Vec<Coin>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgUnjail {
    pub validator_addr: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgVerifyInvariant {
    pub sender: String,
    pub invariant_module_name: String,
    pub invariant_route: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgRevokeAllowance {
    pub granter: String,
    pub grantee: String,
}

/// `msg` is the contract's JSON payload; on the wire it is the compact JSON encoding.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgExecuteContract {
    pub sender: String,
    pub contract: String,
    pub msg: Value,
    #[serde(default)]
    pub funds: Vec<Coin>,
}

#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgMigrateContract {
    pub sender: String,
    pub contract: String,
    #[serde_as(as = "DisplayFromStr")]
    pub code_id: u64,
    pub msg: Value,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgUpdateAdmin {
    pub sender: String,
    pub new_admin: String,
    pub contract: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgClearAdmin {
    pub sender: String,
    pub contract: String,
}

/// A message that can be embedded in a transaction body.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "@type")]
pub enum CosmosMsg {
    #[serde(rename = "/cosmos.bank.v1beta1.MsgSend")]
    BankSend(MsgSend),
    #[serde(rename = "/cosmos.staking.v1beta1.MsgDelegate")]
    StakingDelegate(MsgDelegate),
    #[serde(rename = "/cosmos.staking.v1beta1.MsgUndelegate")]
    StakingUndelegate(MsgUndelegate),
    #[serde(rename = "/cosmos.staking.v1beta1.MsgBeginRedelegate")]
    StakingRedelegate(MsgBeginRedelegate),
    #[serde(rename = "/cosmos.distribution.v1beta1.MsgWithdrawDelegatorReward")]
    DistributionWithdrawRewards(MsgWithdrawDelegatorReward),
    #[serde(rename = "/cosmos.distribution.v1beta1.MsgSetWithdrawAddress")]
    DistributionSetWithdrawAddress(MsgSetWithdrawAddress),
    #[serde(rename = "/cosmos.distribution.v1beta1.MsgFundCommunityPool")]
    DistributionFundCommunityPool(MsgFundCommunityPool),
    #[serde(rename = "/cosmos.gov.v1beta1.MsgVote")]
    GovVote(MsgVote),
    #[serde(rename = "/cosmos.gov.v1beta1.MsgDeposit")]
    GovDeposit(MsgDeposit),
    #[serde(rename = "/cosmos.slashing.v1beta1.MsgUnjail")]
    SlashingUnjail(MsgUnjail),
    #[serde(rename = "/cosmos.feegrant.v1beta1.MsgRevokeAllowance")]
    FeegrantRevokeAllowance(MsgRevokeAllowance),
    #[serde(rename = "/cosmwasm.wasm.v1.MsgExecuteContract")]
    WasmExecute(MsgExecuteContract),
    #[serde(rename = "/cosmwasm.wasm.v1.MsgMigrateContract")]
    WasmMigrate(MsgMigrateContract),
    #[serde(rename = "/cosmwasm.wasm.v1.MsgUpdateAdmin")]
    WasmUpdateAdmin(MsgUpdateAdmin),
    #[serde(rename = "/cosmwasm.wasm.v1.MsgClearAdmin")]
    WasmClearAdmin(MsgClearAdmin),
    #[serde(rename = "/cosmos.crisis.v1beta1.MsgVerifyInvariant")]
    CrisisVerifyInvariant(MsgVerifyInvariant),
}

/// `(type URL, amino name)` of every routable message.
pub const ROUTES: &[(&str, &str)] = &[
    ("/cosmos.bank.v1beta1.MsgSend", "cosmos-sdk/MsgSend"),
    ("/cosmos.staking.v1beta1.MsgDelegate", "cosmos-sdk/MsgDelegate"),
    ("/cosmos.staking.v1beta1.MsgUndelegate", "cosmos-sdk/MsgUndelegate"),
    ("/cosmos.staking.v1beta1.MsgBeginRedelegate", "cosmos-sdk/MsgBeginRedelegate"),
    (
        "/cosmos.distribution.v1beta1.MsgWithdrawDelegatorReward",
        "cosmos-sdk/MsgWithdrawDelegationReward",
    ),
    (
        "/cosmos.distribution.v1beta1.MsgSetWithdrawAddress",
        "cosmos-sdk/MsgModifyWithdrawAddress",
    ),
    (
        "/cosmos.distribution.v1beta1.MsgFundCommunityPool",
        "cosmos-sdk/MsgFundCommunityPool",
    ),
    ("/cosmos.gov.v1beta1.MsgVote", "cosmos-sdk/MsgVote"),
    ("/cosmos.gov.v1beta1.MsgDeposit", "cosmos-sdk/MsgDeposit"),
    ("/cosmos.slashing.v1beta1.MsgUnjail", "cosmos-sdk/MsgUnjail"),
    ("/cosmos.feegrant.v1beta1.MsgRevokeAllowance", "cosmos-sdk/MsgRevokeAllowance"),
    ("/cosmwasm.wasm.v1.MsgExecuteContract", "wasm/MsgExecuteContract"),
    ("/cosmwasm.wasm.v1.MsgMigrateContract", "wasm/MsgMigrateContract"),
    ("/cosmwasm.wasm.v1.MsgUpdateAdmin", "wasm/MsgUpdateAdmin"),
    ("/cosmwasm.wasm.v1.MsgClearAdmin", "wasm/MsgClearAdmin"),
    ("/cosmos.crisis.v1beta1.MsgVerifyInvariant", "cosmos-sdk/MsgVerifyInvariant"),
];

/// Build a message from a type URL and an opaque JSON payload.
pub fn route(type_url: &str, payload: Value) -> Result<CosmosMsg> {
    if !ROUTES.iter().any(|(url, _)| *url == type_url) {
        return Err(Error::UnknownMessageType(type_url.to_string()));
    }
    let Value::Object(mut fields) = payload else {
        return Err(Error::parse(type_url, "message payload must be a JSON object"));
    };
    fields.insert("@type".to_string(), Value::String(type_url.to_string()));

    serde_json::from_value(Value::Object(fields)).map_err(|e| Error::parse(type_url, e))
}

fn encode_json(what: &str, msg: &Value) -> Result<Vec<u8>> {
    serde_json::to_vec(msg).map_err(|e| Error::parse(what, e))
}

fn decode_json(what: &str, bytes: &[u8]) -> Result<Value> {
    serde_json::from_slice(bytes).map_err(|e| Error::parse(what, e))
}

fn decode<M: Message + Default>(any: &Any) -> Result<M> {
    M::decode(any.value.as_slice()).map_err(|e| Error::parse(&any.type_url, e))
}

impl CosmosMsg {
    pub fn type_url(&self) -> &'static str {
        ROUTES[self.route_index()].0
    }

    pub fn amino_name(&self) -> &'static str {
        ROUTES[self.route_index()].1
    }

    fn route_index(&self) -> usize {
        match self {
            CosmosMsg::BankSend(_) => 0,
            CosmosMsg::StakingDelegate(_) => 1,
            CosmosMsg::StakingUndelegate(_) => 2,
            CosmosMsg::StakingRedelegate(_) => 3,
            CosmosMsg::DistributionWithdrawRewards(_) => 4,
            CosmosMsg::DistributionSetWithdrawAddress(_) => 5,
            CosmosMsg::DistributionFundCommunityPool(_) => 6,
            CosmosMsg::GovVote(_) => 7,
            CosmosMsg::GovDeposit(_) => 8,
            CosmosMsg::SlashingUnjail(_) => 9,
            CosmosMsg::FeegrantRevokeAllowance(_) => 10,
            CosmosMsg::WasmExecute(_) => 11,
            CosmosMsg::WasmMigrate(_) => 12,
            CosmosMsg::WasmUpdateAdmin(_) => 13,
            CosmosMsg::WasmClearAdmin(_) => 14,
            CosmosMsg::CrisisVerifyInvariant(_) => 15,
        }
    }

    pub fn to_any(&self) -> Result<Any> {
        let value = match self {
            CosmosMsg::BankSend(m) => bank::MsgSend {
                from_address: m.from_address.clone(),
                to_address: m.to_address.clone(),
                amount: coins_to_proto(&m.amount),
            }
            .encode_to_vec(),
            CosmosMsg::StakingDelegate(m) => staking::MsgDelegate {
                delegator_address: m.delegator_address.clone(),
                validator_address: m.validator_address.clone(),
                amount: Some(m.amount.to_proto()),
            }
            .encode_to_vec(),
            CosmosMsg::StakingUndelegate(m) => staking::MsgUndelegate {
                delegator_address: m.delegator_address.clone(),
                validator_address: m.validator_address.clone(),
                amount: Some(m.amount.to_proto()),
            }
            .encode_to_vec(),
            CosmosMsg::StakingRedelegate(m) => staking::MsgBeginRedelegate {
                delegator_address: m.delegator_address.clone(),
                validator_src_address: m.validator_src_address.clone(),
                validator_dst_address: m.validator_dst_address.clone(),
                amount: Some(m.amount.to_proto()),
            }
            .encode_to_vec(),
            CosmosMsg::DistributionWithdrawRewards(m) => {
                distribution::MsgWithdrawDelegatorReward {
                    delegator_address: m.delegator_address.clone(),
                    validator_address: m.validator_address.clone(),
                }
                .encode_to_vec()
            }
            CosmosMsg::DistributionSetWithdrawAddress(m) => distribution::MsgSetWithdrawAddress {
                delegator_address: m.delegator_address.clone(),
                withdraw_address: m.withdraw_address.clone(),
            }
            .encode_to_vec(),
            CosmosMsg::DistributionFundCommunityPool(m) => distribution::MsgFundCommunityPool {
                amount: coins_to_proto(&m.amount),
                depositor: m.depositor.clone(),
            }
            .encode_to_vec(),
            CosmosMsg::GovVote(m) => gov::MsgVote {
                proposal_id: m.proposal_id,
                voter: m.voter.clone(),
                option: m.option.as_i32(),
            }
            .encode_to_vec(),
            CosmosMsg::GovDeposit(m) => gov::MsgDeposit {
                proposal_id: m.proposal_id,
                depositor: m.depositor.clone(),
                amount: coins_to_proto(&m.amount),
            }
            .encode_to_vec(),
            CosmosMsg::SlashingUnjail(m) => slashing::MsgUnjail {
                validator_addr: m.validator_addr.clone(),
            }
            .encode_to_vec(),
            CosmosMsg::FeegrantRevokeAllowance(m) => feegrant::MsgRevokeAllowance {
                granter: m.granter.clone(),
                grantee: m.grantee.clone(),
            }
            .encode_to_vec(),
            CosmosMsg::WasmExecute(m) => wasm::MsgExecuteContract {
                sender: m.sender.clone(),
                contract: m.contract.clone(),
                msg: encode_json("contract msg", &m.msg)?,
                funds: coins_to_proto(&m.funds),
            }
            .encode_to_vec(),
            CosmosMsg::WasmMigrate(m) => wasm::MsgMigrateContract {
                sender: m.sender.clone(),
                contract: m.contract.clone(),
                code_id: m.code_id,
                msg: encode_json("migrate msg", &m.msg)?,
            }
            .encode_to_vec(),
            CosmosMsg::WasmUpdateAdmin(m) => wasm::MsgUpdateAdmin {
                sender: m.sender.clone(),
                new_admin: m.new_admin.clone(),
                contract: m.contract.clone(),
            }
            .encode_to_vec(),
            CosmosMsg::WasmClearAdmin(m) => wasm::MsgClearAdmin {
                sender: m.sender.clone(),
                contract: m.contract.clone(),
            }
            .encode_to_vec(),
            CosmosMsg::CrisisVerifyInvariant(m) => crisis::MsgVerifyInvariant {
                sender: m.sender.clone(),
                invariant_module_name: m.invariant_module_name.clone(),
                invariant_route: m.invariant_route.clone(),
            }
            .encode_to_vec(),
        };

        Ok(Any {
            type_url: self.type_url().to_string(),
            value,
        })
    }

    pub fn from_any(any: &Any) -> Result<Self> {
        let msg = match any.type_url.as_str() {
            "/cosmos.bank.v1beta1.MsgSend" => {
                let m: bank::MsgSend = decode(any)?;
                CosmosMsg::BankSend(MsgSend {
                    from_address: m.from_address,
                    to_address: m.to_address,
                    amount: coins_from_proto(m.amount),
                })
            }
            "/cosmos.staking.v1beta1.MsgDelegate" => {
                let m: staking::MsgDelegate = decode(any)?;
                CosmosMsg::StakingDelegate(MsgDelegate {
                    delegator_address: m.delegator_address,
                    validator_address: m.validator_address,
                    amount: required_coin(&any.type_url, m.amount)?,
                })
            }
            "/cosmos.staking.v1beta1.MsgUndelegate" => {
                let m: staking::MsgUndelegate = decode(any)?;
                CosmosMsg::StakingUndelegate(MsgUndelegate {
                    delegator_address: m.delegator_address,
                    validator_address: m.validator_address,
                    amount: required_coin(&any.type_url, m.amount)?,
                })
            }
            "/cosmos.staking.v1beta1.MsgBeginRedelegate" => {
                let m: staking::MsgBeginRedelegate = decode(any)?;
                CosmosMsg::StakingRedelegate(MsgBeginRedelegate {
                    delegator_address: m.delegator_address,
                    validator_src_address: m.validator_src_address,
                    validator_dst_address: m.validator_dst_address,
                    amount: required_coin(&any.type_url, m.amount)?,
                })
            }
            "/cosmos.distribution.v1beta1.MsgWithdrawDelegatorReward" => {
                let m: distribution::MsgWithdrawDelegatorReward = decode(any)?;
                CosmosMsg::DistributionWithdrawRewards(MsgWithdrawDelegatorReward {
                    delegator_address: m.delegator_address,
                    validator_address: m.validator_address,
                })
            }
            "/cosmos.distribution.v1beta1.MsgSetWithdrawAddress" => {
                let m: distribution::MsgSetWithdrawAddress = decode(any)?;
                CosmosMsg::DistributionSetWithdrawAddress(MsgSetWithdrawAddress {
                    delegator_address: m.delegator_address,
                    withdraw_address: m.withdraw_address,
                })
            }
            "/cosmos.distribution.v1beta1.MsgFundCommunityPool" => {
                let m: distribution::MsgFundCommunityPool = decode(any)?;
                CosmosMsg::DistributionFundCommunityPool(MsgFundCommunityPool {
                    amount: coins_from_proto(m.amount),
                    depositor: m.depositor,
                })
            }
            "/cosmos.gov.v1beta1.MsgVote" => {
                let m: gov::MsgVote = decode(any)?;
                CosmosMsg::GovVote(MsgVote {
                    proposal_id: m.proposal_id,
                    voter: m.voter,
                    option: VoteOption::from_i32(m.option)?,
                })
            }
            "/cosmos.gov.v1beta1.MsgDeposit" => {
                let m: gov::MsgDeposit = decode(any)?;
                CosmosMsg::GovDeposit(MsgDeposit {
                    proposal_id: m.proposal_id,
                    depositor: m.depositor,
                    amount: coins_from_proto(m.amount),
                })
            }
            "/cosmos.slashing.v1beta1.MsgUnjail" => {
                let m: slashing::MsgUnjail = decode(any)?;
                CosmosMsg::SlashingUnjail(MsgUnjail {
                    validator_addr: m.validator_addr,
                })
            }
            "/cosmos.feegrant.v1beta1.MsgRevokeAllowance" => {
                let m: feegrant::MsgRevokeAllowance = decode(any)?;
                CosmosMsg::FeegrantRevokeAllowance(MsgRevokeAllowance {
                    granter: m.granter,
                    grantee: m.grantee,
                })
            }
            "/cosmwasm.wasm.v1.MsgExecuteContract" => {
                let m: wasm::MsgExecuteContract = decode(any)?;
                CosmosMsg::WasmExecute(MsgExecuteContract {
                    sender: m.sender,
                    contract: m.contract,
                    msg: decode_json("contract msg", &m.msg)?,
                    funds: coins_from_proto(m.funds),
                })
            }
            "/cosmwasm.wasm.v1.MsgMigrateContract" => {
                let m: wasm::MsgMigrateContract = decode(any)?;
                CosmosMsg::WasmMigrate(MsgMigrateContract {
                    sender: m.sender,
                    contract: m.contract,
                    code_id: m.code_id,
                    msg: decode_json("migrate msg", &m.msg)?,
                })
            }
            "/cosmwasm.wasm.v1.MsgUpdateAdmin" => {
                let m: wasm::MsgUpdateAdmin = decode(any)?;
                CosmosMsg::WasmUpdateAdmin(MsgUpdateAdmin {
                    sender: m.sender,
                    new_admin: m.new_admin,
                    contract: m.contract,
                })
            }
            "/cosmwasm.wasm.v1.MsgClearAdmin" => {
                let m: wasm::MsgClearAdmin = decode(any)?;
                CosmosMsg::WasmClearAdmin(MsgClearAdmin {
                    sender: m.sender,
                    contract: m.contract,
                })
            }
            "/cosmos.crisis.v1beta1.MsgVerifyInvariant" => {
                let m: crisis::MsgVerifyInvariant = decode(any)?;
                CosmosMsg::CrisisVerifyInvariant(MsgVerifyInvariant {
                    sender: m.sender,
                    invariant_module_name: m.invariant_module_name,
                    invariant_route: m.invariant_route,
                })
            }
            other => return Err(Error::UnknownMessageType(other.to_string())),
        };

        Ok(msg)
    }

    /// Addresses whose signatures the message requires, in declaration order.
    pub fn signers(&self) -> Result<Vec<String>> {
        let signer = match self {
            CosmosMsg::BankSend(m) => m.from_address.clone(),
            CosmosMsg::StakingDelegate(m) => m.delegator_address.clone(),
            CosmosMsg::StakingUndelegate(m) => m.delegator_address.clone(),
            CosmosMsg::StakingRedelegate(m) => m.delegator_address.clone(),
            CosmosMsg::DistributionWithdrawRewards(m) => m.delegator_address.clone(),
            CosmosMsg::DistributionSetWithdrawAddress(m) => m.delegator_address.clone(),
            CosmosMsg::DistributionFundCommunityPool(m) => m.depositor.clone(),
            CosmosMsg::GovVote(m) => m.voter.clone(),
            CosmosMsg::GovDeposit(m) => m.depositor.clone(),
            CosmosMsg::SlashingUnjail(m) => operator_account(&m.validator_addr)?,
            CosmosMsg::FeegrantRevokeAllowance(m) => m.granter.clone(),
            CosmosMsg::WasmExecute(m) => m.sender.clone(),
            CosmosMsg::WasmMigrate(m) => m.sender.clone(),
            CosmosMsg::WasmUpdateAdmin(m) => m.sender.clone(),
            CosmosMsg::WasmClearAdmin(m) => m.sender.clone(),
            CosmosMsg::CrisisVerifyInvariant(m) => m.sender.clone(),
        };

        Ok(vec![signer])
    }

    /// `{"type": <amino name>, "value": {...}}` as used by legacy amino JSON signing.
    pub fn amino_json(&self) -> Result<Value> {
        let mut value = serde_json::to_value(self).map_err(|e| Error::parse(self.type_url(), e))?;
        if let Value::Object(fields) = &mut value {
            fields.remove("@type");
        }
        if let CosmosMsg::GovVote(vote) = self {
            value["option"] = Value::from(vote.option.as_i32());
        }
        omit_empty(&mut value);

        Ok(serde_json::json!({
            "type": self.amino_name(),
            "value": value,
        }))
    }
}

/// Legacy amino drops empty strings and empty lists from message values.
fn omit_empty(value: &mut Value) {
    if let Value::Object(fields) = value {
        fields.retain(|_, v| match v {
            Value::String(s) => !s.is_empty(),
            Value::Array(a) => !a.is_empty(),
            Value::Null => false,
            _ => true,
        });
        for v in fields.values_mut() {
            if let Value::Array(items) = v {
                items.iter_mut().for_each(omit_empty);
            }
        }
    }
}

/// Account address of a validator operator (`<prefix>valoper1...` -> `<prefix>1...`).
fn operator_account(valoper: &str) -> Result<String> {
    let operator: AccountId = valoper
        .parse()
        .map_err(|e| Error::parse("validator address", e))?;
    let prefix = operator
        .prefix()
        .strip_suffix("valoper")
        .ok_or_else(|| Error::parse("validator address", format!("{valoper} is not an operator address")))?;
    AccountId::new(prefix, &operator.to_bytes())
        .map(|account| account.to_string())
        .map_err(|e| Error::parse("validator address", e))
}

#[cfg(test)]
mod tests {
    use kestrel_primitives::{ErrorKind, KeyAlgo, PrivateKey};
    use serde_json::json;

    use super::*;

    fn address(seed: u8) -> String {
        PrivateKey::from_slice(KeyAlgo::EthSecp256k1, &[seed; 32])
            .unwrap()
            .public_key()
            .account_id("xpla")
            .unwrap()
            .to_string()
    }

    fn send() -> CosmosMsg {
        CosmosMsg::BankSend(MsgSend {
            from_address: address(1),
            to_address: address(2),
            amount: vec![Coin::new("axpriv", 1000)],
        })
    }

    #[test]
    fn route_builds_typed_message() {
        let msg = route(
            "/cosmos.bank.v1beta1.MsgSend",
            json!({
                "from_address": address(1),
                "to_address": address(2),
                "amount": [{"denom": "axpriv", "amount": "1000"}],
            }),
        )
        .unwrap();
        assert_eq!(msg, send());
    }

    #[test]
    fn unknown_tag_is_reported() {
        let err = route("/cosmos.nft.v1beta1.MsgSend", json!({})).unwrap_err();
        assert!(matches!(err, Error::UnknownMessageType(ref t) if t == "/cosmos.nft.v1beta1.MsgSend"));
        assert_eq!(err.kind(), ErrorKind::InvalidRequest);

        let any = Any {
            type_url: "/unknown.Msg".to_string(),
            value: vec![],
        };
        assert!(matches!(CosmosMsg::from_any(&any), Err(Error::UnknownMessageType(_))));
    }

    #[test]
    fn malformed_payload_is_parse_error() {
        let err = route("/cosmos.bank.v1beta1.MsgSend", json!({"from_address": 3})).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);
    }

    #[test]
    fn any_round_trip_for_every_route() {
        let msgs = vec![
            send(),
            CosmosMsg::GovVote(MsgVote {
                proposal_id: 12,
                voter: address(1),
                option: VoteOption::NoWithVeto,
            }),
            CosmosMsg::WasmExecute(MsgExecuteContract {
                sender: address(1),
                contract: address(2),
                msg: json!({"transfer": {"amount": "5", "recipient": address(2)}}),
                funds: vec![],
            }),
            CosmosMsg::StakingRedelegate(MsgBeginRedelegate {
                delegator_address: address(1),
                validator_src_address: address(2),
                validator_dst_address: address(2),
                amount: Coin::new("axpriv", 7),
            }),
        ];
        for msg in msgs {
            let any = msg.to_any().unwrap();
            assert_eq!(any.type_url, msg.type_url());
            assert_eq!(CosmosMsg::from_any(&any).unwrap(), msg);
        }
    }

    #[test]
    fn amino_json_shape() {
        let amino = send().amino_json().unwrap();
        assert_eq!(amino["type"], "cosmos-sdk/MsgSend");
        assert_eq!(amino["value"]["amount"][0]["amount"], "1000");
        assert!(amino["value"].get("@type").is_none());

        let vote = CosmosMsg::GovVote(MsgVote {
            proposal_id: 3,
            voter: address(1),
            option: VoteOption::Yes,
        });
        let amino = vote.amino_json().unwrap();
        assert_eq!(amino["value"]["option"], 1);
        assert_eq!(amino["value"]["proposal_id"], "3");

        let exec = CosmosMsg::WasmExecute(MsgExecuteContract {
            sender: address(1),
            contract: address(2),
            msg: json!({"ping": {}}),
            funds: vec![],
        });
        assert!(exec.amino_json().unwrap()["value"].get("funds").is_none());
    }

    #[test]
    fn signers_follow_message_kind() {
        assert_eq!(send().signers().unwrap(), vec![address(1)]);

        let operator = AccountId::new(
            "xplavaloper",
            &address(1).parse::<AccountId>().unwrap().to_bytes(),
        )
        .unwrap();
        let unjail = CosmosMsg::SlashingUnjail(MsgUnjail {
            validator_addr: operator.to_string(),
        });
        assert_eq!(unjail.signers().unwrap(), vec![address(1)]);
    }

    #[test]
    fn coin_parse() {
        assert_eq!(Coin::parse("25axpriv").unwrap(), Coin::new("axpriv", 25));
        assert!(Coin::parse("25").is_err());
    }
}
