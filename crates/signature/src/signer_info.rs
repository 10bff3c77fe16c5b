use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::algorithm::Algorithm;
use crate::scheme::{SigningScheme, SigningSchemeError};

/// DER-encoded X.509 certificate, kept opaque.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Certificate(#[serde(with = "hex::serde")] Vec<u8>);

impl Certificate {
    pub fn from_der(der: impl Into<Vec<u8>>) -> Self {
        Self(der.into())
    }

    pub fn as_der(&self) -> &[u8] {
        &self.0
    }

    /// Hex-encoded SHA-256 of the DER bytes.
    pub fn fingerprint(&self) -> String {
        hex::encode(Sha256::digest(&self.0))
    }
}

impl std::fmt::Debug for Certificate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Certificate").field(&self.fingerprint()).finish()
    }
}

/// RFC 3161 timestamp token over a signature, as returned by the TSA.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TimestampToken(#[serde(with = "hex::serde")] Vec<u8>);

impl TimestampToken {
    pub fn new(der: impl Into<Vec<u8>>) -> Self {
        Self(der.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A named extension attribute. Critical attributes must be understood by
/// the verifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    pub key: String,
    #[serde(default)]
    pub critical: bool,
    pub value: serde_json::Value,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payload {
    pub content_type: String,
    #[serde(with = "hex::serde")]
    pub content: Vec<u8>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedAttributes {
    /// Raw scheme identifier as carried by the envelope.
    pub signing_scheme: String,
    #[serde(default)]
    pub signing_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub expiry: Option<DateTime<Utc>>,
    #[serde(default)]
    pub extended_attributes: Vec<Attribute>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnsignedAttributes {
    #[serde(default)]
    pub timestamp_signature: Option<TimestampToken>,
    #[serde(default)]
    pub signing_agent: Option<String>,
}

/// Attributes and supporting material of a produced or verified signature.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignerInfo {
    pub signed_attributes: SignedAttributes,
    #[serde(default)]
    pub unsigned_attributes: UnsignedAttributes,
    #[serde(default)]
    pub signature_algorithm: Option<Algorithm>,
    #[serde(default)]
    pub certificate_chain: Vec<Certificate>,
    #[serde(default, with = "hex::serde")]
    pub signature: Vec<u8>,
}

impl SignerInfo {
    pub fn signing_scheme(&self) -> Result<SigningScheme, SigningSchemeError> {
        self.signed_attributes.signing_scheme.parse()
    }

    /// Returns the signing time that can be trusted under the declared
    /// signing scheme.
    ///
    /// Only `notary.x509.signingAuthority` vouches for its own signing time.
    /// Under `notary.x509` this always fails, even when a timestamp token is
    /// attached: deriving time from [`Self::timestamp_token`] is left to the
    /// caller.
    pub fn authentic_signing_time(&self) -> Result<DateTime<Utc>, SigningSchemeError> {
        let scheme = &self.signed_attributes.signing_scheme;
        let result = match self.signing_scheme()? {
            SigningScheme::X509SigningAuthority => self
                .signed_attributes
                .signing_time
                .ok_or_else(|| SigningSchemeError::MissingSigningTime {
                    scheme: scheme.clone(),
                }),
            SigningScheme::X509 => Err(SigningSchemeError::NotSupported {
                scheme: scheme.clone(),
            }),
        };
        if let Err(err) = &result {
            tracing::debug!(%scheme, %err, "no authentic signing time");
        }
        result
    }

    pub fn timestamp_token(&self) -> Option<&TimestampToken> {
        self.unsigned_attributes.timestamp_signature.as_ref()
    }

    pub fn extended_attribute(&self, key: &str) -> Option<&Attribute> {
        self.signed_attributes
            .extended_attributes
            .iter()
            .find(|attr| attr.key == key)
    }

    /// The leaf certificate, i.e. the one that signed.
    pub fn signing_certificate(&self) -> Option<&Certificate> {
        self.certificate_chain.first()
    }
}

/// What an envelope carries once it has been opened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvelopeContent {
    pub signer_info: SignerInfo,
    pub payload: Payload,
}
