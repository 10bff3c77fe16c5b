use crate::algorithm::{Algorithm, HashAlgorithm};
use crate::context::Context;
use crate::error::SignatureError;
use crate::signer_info::TimestampToken;

/// Message imprint sent to a timestamp authority.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimestampRequest {
    pub hash_algorithm: HashAlgorithm,
    pub digest: Vec<u8>,
}

impl TimestampRequest {
    /// Imprint over a produced signature, hashed with the signature's own
    /// hash algorithm.
    pub fn for_signature(algorithm: Algorithm, signature: &[u8]) -> Self {
        let hash_algorithm = algorithm.hash();
        Self {
            hash_algorithm,
            digest: hash_algorithm.digest(signature),
        }
    }
}

/// RFC 3161 timestamp authority client.
///
/// Implementations are responsible for honouring `ctx` cancellation and
/// deadlines around their network calls.
pub trait Timestamper: Send + Sync {
    fn timestamp(
        &self,
        ctx: &Context,
        request: &TimestampRequest,
    ) -> Result<TimestampToken, SignatureError>;
}

/// Obtains a timestamp token over `signature`.
///
/// Every failure surfaces as [`SignatureError::Timestamp`]; errors of other
/// kinds raised by the timestamper are wrapped as its detail.
pub fn timestamp_signature(
    ctx: &Context,
    timestamper: &dyn Timestamper,
    algorithm: Algorithm,
    signature: &[u8],
) -> Result<TimestampToken, SignatureError> {
    if signature.is_empty() {
        return Err(SignatureError::timestamp("signature not present", None));
    }
    if let Some(err) = ctx.err() {
        return Err(SignatureError::timestamp("request aborted", Some(Box::new(err))));
    }

    let request = TimestampRequest::for_signature(algorithm, signature);
    let token = match timestamper.timestamp(ctx, &request) {
        Ok(token) => token,
        Err(err @ SignatureError::Timestamp { .. }) => return Err(err),
        Err(err) => {
            return Err(SignatureError::timestamp(
                "failed to timestamp signature",
                Some(Box::new(err)),
            ));
        }
    };
    if token.is_empty() {
        return Err(SignatureError::timestamp("empty timestamp token", None));
    }
    tracing::debug!(
        hash = ?request.hash_algorithm,
        token_len = token.as_bytes().len(),
        "obtained timestamp token"
    );
    Ok(token)
}
