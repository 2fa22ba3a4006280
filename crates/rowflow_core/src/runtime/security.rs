use std::fmt::Debug;

use rowflow_error::Result;

/// Cryptographic collaborator used by the security functions.
///
/// No cryptography is implemented in this crate, callers plug in a provider
/// through `TransformConfig`.
pub trait SecurityProvider: Debug + Sync + Send {
    fn encrypt(&self, plain: &str, key: &str, iterations: u64) -> Result<String>;
    fn decrypt(&self, cipher: &str, key: &str, iterations: u64) -> Result<String>;

    fn hash(&self, value: &str) -> Result<String>;

    /// Check if `value` hashes to `hash`.
    fn validate_hash(&self, value: &str, hash: &str) -> Result<bool>;
}
