use rand::{distributions::Alphanumeric, Rng};
use sha2::{Digest, Sha256};

const TOKEN_LENGTH: usize = 48;

/// Generates the plaintext bearer token handed to the client. Only the
/// hash of it is ever persisted.
pub fn generate_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LENGTH)
        .map(char::from)
        .collect()
}

pub fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}
