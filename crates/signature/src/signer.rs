use crate::algorithm::KeySpec;
use crate::error::SignatureError;
use crate::signer_info::Certificate;

/// Output of a raw signing operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawSignature {
    pub signature: Vec<u8>,
    /// Leaf first.
    pub certificate_chain: Vec<Certificate>,
}

/// Produces raw signatures over envelope-prepared bytes.
///
/// Implementations are sync; signing is CPU-bound.
/// For remote backends (KMS, plugins), use `spawn_blocking`.
pub trait Signer: Send + Sync {
    fn sign(&self, payload: &[u8]) -> Result<RawSignature, SignatureError>;

    fn key_spec(&self) -> Result<KeySpec, SignatureError>;
}
