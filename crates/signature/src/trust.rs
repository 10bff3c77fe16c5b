use crate::error::SignatureError;
use crate::signer_info::{Certificate, SignerInfo};

/// Returns the first trusted certificate that also appears in the signer's
/// chain.
///
/// Certificates are compared by their DER bytes. Chain building and path
/// validation happen elsewhere; this only answers whether the chain is
/// anchored in `trusted`.
pub fn verify_authenticity<'a>(
    signer_info: &SignerInfo,
    trusted: &'a [Certificate],
) -> Result<&'a Certificate, SignatureError> {
    if trusted.is_empty() {
        return Err(SignatureError::invalid_argument("trustedCerts", None));
    }
    if signer_info.certificate_chain.is_empty() {
        return Err(SignatureError::invalid_argument("certificateChain", None));
    }

    trusted
        .iter()
        .find(|anchor| signer_info.certificate_chain.contains(*anchor))
        .inspect(|anchor| tracing::debug!(fingerprint = %anchor.fingerprint(), "matched trusted certificate"))
        .ok_or(SignatureError::Authenticity)
}
