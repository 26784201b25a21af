use soroban_sdk::{xdr::ToXdr, Address, Bytes, BytesN, Env, Vec};

/// Leaf committing to an (investor, amount) pair
///
/// leaf = keccak256(xdr(investor) || amount as 16 big-endian bytes)
pub fn leaf_hash(env: &Env, investor: &Address, amount: i128) -> BytesN<32> {
    let mut data = investor.clone().to_xdr(env);
    data.extend_from_array(&amount.to_be_bytes());
    env.crypto().keccak256(&data).to_bytes()
}

/// Hash of two sibling nodes, ordered so proofs carry no side bits
pub fn hash_pair(env: &Env, a: &BytesN<32>, b: &BytesN<32>) -> BytesN<32> {
    let (left, right) = if a.to_array() <= b.to_array() {
        (a, b)
    } else {
        (b, a)
    };
    let mut data = Bytes::from_array(env, &left.to_array());
    data.extend_from_array(&right.to_array());
    env.crypto().keccak256(&data).to_bytes()
}

/// Check that `leaf` is included under `root`
pub fn verify(env: &Env, root: &BytesN<32>, leaf: BytesN<32>, proof: &Vec<BytesN<32>>) -> bool {
    let mut computed = leaf;
    for sibling in proof.iter() {
        computed = hash_pair(env, &computed, &sibling);
    }
    computed == *root
}
