use alloy_primitives::{keccak256, Address, PrimitiveSignature, B256, U256};
use secp256k1::{
    ecdsa::{RecoverableSignature, RecoveryId},
    Message, SECP256K1,
};

/// The order of the secp256k1 curve, divided by two. Signatures with a larger `s` are
/// malleable and rejected per EIP-2.
const SECP256K1N_HALF: U256 = U256::from_be_bytes([
    0x7F, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF,
    0x5D, 0x57, 0x6E, 0x73, 0x57, 0xA4, 0x50, 0x1D, 0xDF, 0xE9, 0x2F, 0x46, 0x68, 0x1B, 0x20, 0xA0,
]);

/// Recover the signing address without the low-`s` check.
pub fn recover_signer_unchecked(signature: &PrimitiveSignature, hash: B256) -> Option<Address> {
    let mut rs = [0u8; 64];
    rs[..32].copy_from_slice(&signature.r().to_be_bytes::<32>());
    rs[32..].copy_from_slice(&signature.s().to_be_bytes::<32>());

    let recovery_id = RecoveryId::from_i32(signature.v() as i32).ok()?;
    let sig = RecoverableSignature::from_compact(&rs, recovery_id).ok()?;
    let public = SECP256K1
        .recover_ecdsa(&Message::from_digest(hash.0), &sig)
        .ok()?;

    let hash = keccak256(&public.serialize_uncompressed()[1..]);
    Some(Address::from_slice(&hash[12..]))
}

/// Recover the signing address, rejecting signatures with `s > secp256k1n / 2`.
pub fn recover_signer(signature: &PrimitiveSignature, hash: B256) -> Option<Address> {
    if signature.s() > SECP256K1N_HALF {
        return None;
    }

    recover_signer_unchecked(signature, hash)
}

#[cfg(test)]
mod tests {
    use alloy_signer::SignerSync;
    use alloy_signer_local::PrivateKeySigner;

    use super::*;

    #[test]
    fn recovers_local_signer() {
        let signer = PrivateKeySigner::from_slice(&[7u8; 32]).unwrap();
        let hash = keccak256(b"kestrel");
        let sig = signer.sign_hash_sync(&hash).unwrap();
        assert_eq!(recover_signer(&sig, hash), Some(signer.address()));
        assert_ne!(recover_signer(&sig, keccak256(b"other")), Some(signer.address()));
    }

    #[test]
    fn rejects_high_s() {
        let signer = PrivateKeySigner::from_slice(&[7u8; 32]).unwrap();
        let hash = keccak256(b"kestrel");
        let sig = signer.sign_hash_sync(&hash).unwrap();

        // (r, n - s, !v) is the malleable twin of (r, s, v).
        let n = SECP256K1N_HALF * U256::from(2) + U256::from(1);
        let twin = PrimitiveSignature::new(sig.r(), n - sig.s(), !sig.v());
        assert_eq!(recover_signer_unchecked(&twin, hash), Some(signer.address()));
        assert_eq!(recover_signer(&twin, hash), None);
    }
}
