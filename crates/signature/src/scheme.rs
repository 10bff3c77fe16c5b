use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Trust model under which a signature was produced.
///
/// The scheme decides where an authentic signing time may come from; see
/// [`SignerInfo::authentic_signing_time`](crate::SignerInfo::authentic_signing_time).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SigningScheme {
    /// Plain X.509 signing. The signer's clock is not trusted; signing time
    /// must come from an RFC 3161 timestamp.
    #[default]
    #[serde(rename = "notary.x509")]
    X509,
    /// X.509 signing through a signing authority that vouches for its clock.
    #[serde(rename = "notary.x509.signingAuthority")]
    X509SigningAuthority,
}

impl SigningScheme {
    pub const X509_NAME: &'static str = "notary.x509";
    pub const X509_SIGNING_AUTHORITY_NAME: &'static str = "notary.x509.signingAuthority";

    pub fn as_str(&self) -> &'static str {
        match self {
            SigningScheme::X509 => Self::X509_NAME,
            SigningScheme::X509SigningAuthority => Self::X509_SIGNING_AUTHORITY_NAME,
        }
    }
}

impl fmt::Display for SigningScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SigningScheme {
    type Err = SigningSchemeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            Self::X509_NAME => Ok(SigningScheme::X509),
            Self::X509_SIGNING_AUTHORITY_NAME => Ok(SigningScheme::X509SigningAuthority),
            other => Err(SigningSchemeError::UnsupportedScheme {
                scheme: other.to_string(),
            }),
        }
    }
}

/// Why no authentic signing time could be derived from a signer info.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SigningSchemeError {
    #[error("authentic signing time must be present under signing scheme {scheme:?}")]
    MissingSigningTime { scheme: String },
    #[error("authentic signing time not supported under signing scheme {scheme:?}")]
    NotSupported { scheme: String },
    #[error("unsupported signing scheme: {scheme}")]
    UnsupportedScheme { scheme: String },
}

impl SigningSchemeError {
    /// The scheme identifier the error was raised for.
    pub fn scheme(&self) -> &str {
        match self {
            Self::MissingSigningTime { scheme }
            | Self::NotSupported { scheme }
            | Self::UnsupportedScheme { scheme } => scheme,
        }
    }
}
