use cosmrs::proto::cosmos::crypto::multisig::v1beta1::CompactBitArray as ProtoBitArray;
use kestrel_primitives::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_with::{base64::Base64, serde_as};

/// Bit set over multisig member indices, most significant bit of each byte first.
#[serde_as]
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawBitArray")]
pub struct CompactBitArray {
    pub extra_bits_stored: u32,
    #[serde_as(as = "Base64")]
    pub elems: Vec<u8>,
}

#[serde_as]
#[derive(Deserialize)]
struct RawBitArray {
    extra_bits_stored: u32,
    #[serde_as(as = "Base64")]
    elems: Vec<u8>,
}

impl TryFrom<RawBitArray> for CompactBitArray {
    type Error = Error;

    fn try_from(raw: RawBitArray) -> Result<Self> {
        Self::checked(raw.extra_bits_stored, raw.elems)
    }
}

impl CompactBitArray {
    pub fn new(bits: usize) -> Self {
        Self {
            extra_bits_stored: (bits % 8) as u32,
            elems: vec![0; bits.div_ceil(8)],
        }
    }

    /// A decoded bit array; the trailing byte holds fewer than 8 bits.
    pub fn checked(extra_bits_stored: u32, elems: Vec<u8>) -> Result<Self> {
        if extra_bits_stored >= 8 {
            return Err(Error::parse(
                "bit array",
                format!("extra_bits_stored {extra_bits_stored} is not below 8"),
            ));
        }
        if extra_bits_stored > 0 && elems.is_empty() {
            return Err(Error::parse(
                "bit array",
                format!("{extra_bits_stored} extra bits stored without elements"),
            ));
        }
        Ok(Self {
            extra_bits_stored,
            elems,
        })
    }

    pub fn len(&self) -> usize {
        match self.extra_bits_stored {
            0 => self.elems.len() * 8,
            extra => (self.elems.len().saturating_sub(1)) * 8 + extra as usize,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, index: usize) -> bool {
        if index >= self.len() {
            return false;
        }
        self.elems
            .get(index / 8)
            .is_some_and(|byte| byte & (1 << (7 - index % 8)) != 0)
    }

    pub fn set(&mut self, index: usize, value: bool) -> Result<()> {
        if index >= self.len() {
            return Err(Error::InvalidRequest(format!(
                "bit {index} is out of range for {} members",
                self.len()
            )));
        }
        let mask = 1 << (7 - index % 8);
        let byte = self
            .elems
            .get_mut(index / 8)
            .ok_or_else(|| Error::InvalidRequest(format!("bit {index} has no backing byte")))?;
        if value {
            *byte |= mask;
        } else {
            *byte &= !mask;
        }
        Ok(())
    }

    pub fn count_ones(&self) -> usize {
        (0..self.len()).filter(|i| self.get(*i)).count()
    }

    /// Position of `index` among set bits.
    pub fn rank(&self, index: usize) -> usize {
        (0..index.min(self.len())).filter(|i| self.get(*i)).count()
    }

    pub fn ones(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.len()).filter(|i| self.get(*i))
    }

    pub(crate) fn to_proto(&self) -> ProtoBitArray {
        ProtoBitArray {
            extra_bits_stored: self.extra_bits_stored,
            elems: self.elems.clone(),
        }
    }

    pub(crate) fn from_proto(proto: ProtoBitArray) -> Result<Self> {
        Self::checked(proto.extra_bits_stored, proto.elems)
    }
}
