use crate::domain::errors::Hash;
use crate::ports::outbound::ContentHasher;
use sha2::{Digest, Sha256};

/// Default content hasher using SHA-256.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256ContentHasher;

impl ContentHasher for Sha256ContentHasher {
    fn hash(&self, data: &[u8]) -> Hash {
        Sha256::digest(data).into()
    }
}
