//! Sealed bids for the auction variant.
//!
//! Bids are encrypted with an ephemeral Diffie-Hellman exchange on the
//! BLS12-381 G1 group. The investor picks a scalar `r`, publishes
//! `R = r·G` and derives the shared point `S = r·PK`; the administrator
//! later recovers the same point as `sk·R`. The bid amount is XORed with
//! the first 16 bytes of `sha256(S || salt)`.

use soroban_sdk::{
    crypto::bls12_381::{Fr, G1Affine},
    xdr::ToXdr,
    Address, Bytes, BytesN, Env,
};

use crate::error::Error;
use crate::storage::DataKey;

/// Standard BLS12-381 G1 generator, uncompressed big-endian x || y.
const G1_GENERATOR: [u8; 96] = [
    0x17, 0xf1, 0xd3, 0xa7, 0x31, 0x97, 0xd7, 0x94, 0x26, 0x95, 0x63, 0x8c,
    0x4f, 0xa9, 0xac, 0x0f, 0xc3, 0x68, 0x8c, 0x4f, 0x97, 0x74, 0xb9, 0x05,
    0xa1, 0x4e, 0x3a, 0x3f, 0x17, 0x1b, 0xac, 0x58, 0x6c, 0x55, 0xe8, 0x3f,
    0xf9, 0x7a, 0x1a, 0xef, 0xfb, 0x3a, 0xf0, 0x0a, 0xdb, 0x22, 0xc6, 0xbb,
    0x08, 0xb3, 0xf4, 0x81, 0xe3, 0xaa, 0xa0, 0xf1, 0xa0, 0x9e, 0x30, 0xed,
    0x74, 0x1d, 0x8a, 0xe4, 0xfc, 0xf5, 0xe0, 0x95, 0xd5, 0xd0, 0x0a, 0xf6,
    0x00, 0xdb, 0x18, 0xcb, 0x2c, 0x04, 0xb3, 0xed, 0xd0, 0x3c, 0xc7, 0x44,
    0xa2, 0x88, 0x8a, 0xe4, 0x0c, 0xaa, 0x23, 0x29, 0x46, 0xc5, 0xe7, 0xe1,
];

// Compression, infinity and sort flags live in the top three bits
const FLAG_MASK: u8 = 0xe0;

pub fn generator(env: &Env) -> G1Affine {
    G1Affine::from_array(env, &G1_GENERATOR)
}

/// Reject encodings that cannot serve as a Diffie-Hellman point
///
/// # Errors
/// - `InvalidBidPublicKey`: Flagged encoding, identity, or outside the G1 subgroup
pub fn check_point(env: &Env, point: &BytesN<96>) -> Result<G1Affine, Error> {
    let raw = point.to_array();
    if raw[0] & FLAG_MASK != 0 {
        return Err(Error::InvalidBidPublicKey);
    }
    if raw.iter().all(|b| *b == 0) {
        return Err(Error::InvalidBidPublicKey);
    }

    let affine = G1Affine::from_bytes(point.clone());
    if !env.crypto().bls12_381().g1_is_in_subgroup(&affine) {
        return Err(Error::InvalidBidPublicKey);
    }
    Ok(affine)
}

/// Validate a sale public key, including the invalidated-key set
///
/// # Errors
/// - `InvalidBidPublicKey`: See `check_point`, or the key was invalidated
pub fn validate_public_key(env: &Env, public_key: &BytesN<96>) -> Result<(), Error> {
    if env
        .storage()
        .persistent()
        .has(&DataKey::InvalidatedKey(public_key.clone()))
    {
        return Err(Error::InvalidBidPublicKey);
    }
    check_point(env, public_key)?;
    Ok(())
}

pub fn invalidate_public_key(env: &Env, public_key: &BytesN<96>) {
    env.storage()
        .persistent()
        .set(&DataKey::InvalidatedKey(public_key.clone()), &true);
}

/// Public key `sk·G` for a private scalar
pub fn derive_public_key(env: &Env, private_key: &BytesN<32>) -> BytesN<96> {
    let scalar = Fr::from_bytes(private_key.clone());
    env.crypto()
        .bls12_381()
        .g1_mul(&generator(env), &scalar)
        .to_bytes()
}

/// Check a private scalar reproduces the public key bids were sealed to
///
/// # Errors
/// - `InvalidBidPrivateKey`: `sk·G` differs from `public_key`
pub fn verify_private_key(
    env: &Env,
    private_key: &BytesN<32>,
    public_key: &BytesN<96>,
) -> Result<(), Error> {
    if derive_public_key(env, private_key) != *public_key {
        return Err(Error::InvalidBidPrivateKey);
    }
    Ok(())
}

/// Salt binding a ciphertext to its investor: sha256(xdr(investor))
pub fn bid_salt(env: &Env, investor: &Address) -> BytesN<32> {
    env.crypto().sha256(&investor.clone().to_xdr(env)).to_bytes()
}

fn derive_key(env: &Env, shared: &G1Affine, salt: &BytesN<32>) -> u128 {
    let mut data = Bytes::from_array(env, &shared.to_bytes().to_array());
    data.extend_from_array(&salt.to_array());
    let digest = env.crypto().sha256(&data).to_array();

    let mut key = [0u8; 16];
    key.copy_from_slice(&digest[..16]);
    u128::from_be_bytes(key)
}

/// Recover the plaintext amount of a sealed bid
pub fn decrypt(
    env: &Env,
    private_key: &BytesN<32>,
    encrypted_amount: u128,
    salt: &BytesN<32>,
    ephemeral_key: &BytesN<96>,
) -> u128 {
    let scalar = Fr::from_bytes(private_key.clone());
    let ephemeral = G1Affine::from_bytes(ephemeral_key.clone());
    let shared = env.crypto().bls12_381().g1_mul(&ephemeral, &scalar);
    encrypted_amount ^ derive_key(env, &shared, salt)
}

/// Seal `amount` to `public_key` with ephemeral scalar `ephemeral`
///
/// Investors run this off-chain; the contract only validates the result.
#[cfg(any(test, feature = "testutils"))]
pub fn encrypt_bid(
    env: &Env,
    amount: u128,
    ephemeral: &BytesN<32>,
    public_key: &BytesN<96>,
    salt: &BytesN<32>,
) -> crate::storage::SealedBid {
    let scalar = Fr::from_bytes(ephemeral.clone());
    let bls = env.crypto().bls12_381();
    let ephemeral_key = bls.g1_mul(&generator(env), &scalar).to_bytes();
    let shared = bls.g1_mul(&G1Affine::from_bytes(public_key.clone()), &scalar);

    crate::storage::SealedBid {
        encrypted_amount: amount ^ derive_key(env, &shared, salt),
        salt: salt.clone(),
        ephemeral_key,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use soroban_sdk::{testutils::Address as _, Address};

    fn scalar(env: &Env, last: u8) -> BytesN<32> {
        let mut raw = [0u8; 32];
        raw[30] = 0x5a;
        raw[31] = last;
        BytesN::from_array(env, &raw)
    }

    #[test]
    fn test_generator_is_valid_point() {
        let env = Env::default();
        let generator = BytesN::from_array(&env, &G1_GENERATOR);
        assert!(check_point(&env, &generator).is_ok());
    }

    #[test]
    fn test_rejects_identity_and_flagged_keys() {
        let env = Env::default();

        let identity = BytesN::from_array(&env, &[0u8; 96]);
        assert_eq!(
            check_point(&env, &identity).err(),
            Some(Error::InvalidBidPublicKey)
        );

        let mut infinity = [0u8; 96];
        infinity[0] = 0x40;
        assert_eq!(
            check_point(&env, &BytesN::from_array(&env, &infinity)).err(),
            Some(Error::InvalidBidPublicKey)
        );

        let mut compressed = G1_GENERATOR;
        compressed[0] |= 0x80;
        assert_eq!(
            check_point(&env, &BytesN::from_array(&env, &compressed)).err(),
            Some(Error::InvalidBidPublicKey)
        );
    }

    #[test]
    fn test_private_key_must_match() {
        let env = Env::default();
        let sk = scalar(&env, 7);
        let pk = derive_public_key(&env, &sk);

        assert!(verify_private_key(&env, &sk, &pk).is_ok());
        assert_eq!(
            verify_private_key(&env, &scalar(&env, 8), &pk),
            Err(Error::InvalidBidPrivateKey)
        );
    }

    #[test]
    fn test_decrypt_recovers_amount() {
        let env = Env::default();
        let investor = Address::generate(&env);
        let sk = scalar(&env, 11);
        let pk = derive_public_key(&env, &sk);
        let salt = bid_salt(&env, &investor);

        let bid = encrypt_bid(&env, 12_345_678, &scalar(&env, 99), &pk, &salt);
        assert_ne!(bid.encrypted_amount, 12_345_678);

        let amount = decrypt(&env, &sk, bid.encrypted_amount, &bid.salt, &bid.ephemeral_key);
        assert_eq!(amount, 12_345_678);

        // Another key yields an unrelated value
        let other = decrypt(
            &env,
            &scalar(&env, 12),
            bid.encrypted_amount,
            &bid.salt,
            &bid.ephemeral_key,
        );
        assert_ne!(other, 12_345_678);
    }

    #[test]
    fn test_salt_is_bound_to_investor() {
        let env = Env::default();
        let alice = Address::generate(&env);
        let bob = Address::generate(&env);
        assert_eq!(bid_salt(&env, &alice), bid_salt(&env, &alice));
        assert_ne!(bid_salt(&env, &alice), bid_salt(&env, &bob));
    }
}
