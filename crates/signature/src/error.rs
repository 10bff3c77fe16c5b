use std::error::Error as StdError;

/// Boxed cause carried by the wrapping error kinds.
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

#[derive(Debug, thiserror::Error)]
pub enum SignatureError {
    /// The signature bytes failed the cryptographic integrity check.
    #[error("signature is invalid. Error: {source}")]
    Integrity {
        #[source]
        source: BoxError,
    },
    /// The envelope is structurally malformed.
    #[error("{}", or_default(.msg, "signature envelope format is invalid"))]
    InvalidSignature { msg: String },
    #[error("signature envelope format with media type {media_type:?} is not supported")]
    UnsupportedSignatureFormat { media_type: String },
    #[error("signature envelope is not present")]
    SignatureNotFound,
    /// The signature verifies but nothing in its chain is trusted.
    #[error("the signature's certificate chain does not contain any trusted certificate")]
    Authenticity,
    #[error("{}", or_default(.msg, "signing key is not supported"))]
    UnsupportedSigningKey { msg: String },
    #[error("{}", invalid_argument_message(.param, .source))]
    InvalidArgument {
        param: String,
        #[source]
        source: Option<BoxError>,
    },
    #[error("{}", or_default(.msg, "SignRequest is invalid"))]
    InvalidSignRequest { msg: String },
    #[error("signature algorithm {alg:?} is not supported")]
    UnsupportedSignatureAlgo { alg: String },
    #[error("signature envelope is not present")]
    EnvelopeNotFound,
    /// A name expected to be unique was repeated.
    #[error("repeated key: {key:?} exists.")]
    DuplicateKey { key: String },
    /// Any failure in the RFC 3161 timestamping flow.
    #[error("{}", timestamp_message(.msg, .detail))]
    Timestamp {
        msg: String,
        #[source]
        detail: Option<BoxError>,
    },
}

impl SignatureError {
    pub fn integrity(source: impl Into<BoxError>) -> Self {
        Self::Integrity {
            source: source.into(),
        }
    }

    pub fn invalid_signature(msg: impl Into<String>) -> Self {
        Self::InvalidSignature { msg: msg.into() }
    }

    pub fn unsupported_format(media_type: impl Into<String>) -> Self {
        Self::UnsupportedSignatureFormat {
            media_type: media_type.into(),
        }
    }

    pub fn unsupported_signing_key(msg: impl Into<String>) -> Self {
        Self::UnsupportedSigningKey { msg: msg.into() }
    }

    pub fn invalid_argument(param: impl Into<String>, source: Option<BoxError>) -> Self {
        Self::InvalidArgument {
            param: param.into(),
            source,
        }
    }

    pub fn invalid_sign_request(msg: impl Into<String>) -> Self {
        Self::InvalidSignRequest { msg: msg.into() }
    }

    pub fn unsupported_algorithm(alg: impl Into<String>) -> Self {
        Self::UnsupportedSignatureAlgo { alg: alg.into() }
    }

    pub fn duplicate_key(key: impl Into<String>) -> Self {
        Self::DuplicateKey { key: key.into() }
    }

    pub fn timestamp(msg: impl Into<String>, detail: Option<BoxError>) -> Self {
        Self::Timestamp {
            msg: msg.into(),
            detail,
        }
    }

    /// Returns the wrapped cause, exactly as it was supplied at construction.
    ///
    /// Always `None` for the kinds that never wrap a cause.
    pub fn cause(&self) -> Option<&(dyn StdError + Send + Sync + 'static)> {
        match self {
            Self::Integrity { source } => Some(&**source),
            Self::InvalidArgument { source, .. } => source.as_deref(),
            Self::Timestamp { detail, .. } => detail.as_deref(),
            _ => None,
        }
    }

    /// Integrity and authenticity failures mean the signature itself is bad,
    /// as opposed to a usage or configuration problem on the caller's side.
    pub fn is_verification_failure(&self) -> bool {
        matches!(
            self,
            Self::Integrity { .. }
                | Self::Authenticity
                | Self::InvalidSignature { .. }
                | Self::SignatureNotFound
        )
    }
}

fn or_default<'a>(msg: &'a str, default: &'a str) -> &'a str {
    if msg.is_empty() { default } else { msg }
}

fn invalid_argument_message(param: &str, source: &Option<BoxError>) -> String {
    match source {
        Some(err) => format!("{param:?} param is invalid. Error: {err}"),
        None => format!("{param:?} param is invalid"),
    }
}

fn timestamp_message(msg: &str, detail: &Option<BoxError>) -> String {
    match (msg.is_empty(), detail) {
        (false, Some(err)) => format!("timestamp: {msg}. Error: {err}"),
        (false, None) => format!("timestamp: {msg}"),
        (true, Some(err)) => format!("timestamp: {err}"),
        (true, None) => "timestamp error".to_string(),
    }
}
