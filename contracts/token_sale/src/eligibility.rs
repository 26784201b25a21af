use soroban_sdk::{crypto::Hash, xdr::ToXdr, Address, BytesN, Env};

use crate::error::Error;

/// Digest the eligibility signer signs for one investment
///
/// digest = keccak256(xdr(investor) || amount as 16 big-endian bytes || xdr(sale))
pub fn eligibility_digest(env: &Env, investor: &Address, amount: i128, sale: &Address) -> Hash<32> {
    let mut data = investor.clone().to_xdr(env);
    data.extend_from_array(&amount.to_be_bytes());
    data.append(&sale.clone().to_xdr(env));
    env.crypto().keccak256(&data)
}

/// Check `signature` was produced by `signer` over this investment
///
/// # Errors
/// - `InvalidSignature`: Recovered key differs from the configured signer
pub fn verify_eligibility(
    env: &Env,
    signer: &BytesN<65>,
    investor: &Address,
    amount: i128,
    signature: &BytesN<64>,
    recovery_id: u32,
) -> Result<(), Error> {
    if recovery_id > 3 {
        return Err(Error::InvalidSignature);
    }

    let digest = eligibility_digest(env, investor, amount, &env.current_contract_address());
    let recovered = env
        .crypto()
        .secp256k1_recover(&digest, signature, recovery_id);

    if recovered != *signer {
        return Err(Error::InvalidSignature);
    }
    Ok(())
}
