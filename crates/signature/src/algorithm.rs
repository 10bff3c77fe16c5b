use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256, Sha384, Sha512};

use crate::error::SignatureError;

/// Signature algorithms accepted for signing and verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Algorithm {
    /// RSASSA-PSS with SHA-256.
    #[serde(rename = "PS256")]
    Ps256,
    #[serde(rename = "PS384")]
    Ps384,
    #[serde(rename = "PS512")]
    Ps512,
    /// ECDSA on secp256r1 with SHA-256.
    #[serde(rename = "ES256")]
    Es256,
    #[serde(rename = "ES384")]
    Es384,
    #[serde(rename = "ES512")]
    Es512,
}

impl Algorithm {
    pub const ALL: [Algorithm; 6] = [
        Algorithm::Ps256,
        Algorithm::Ps384,
        Algorithm::Ps512,
        Algorithm::Es256,
        Algorithm::Es384,
        Algorithm::Es512,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Algorithm::Ps256 => "PS256",
            Algorithm::Ps384 => "PS384",
            Algorithm::Ps512 => "PS512",
            Algorithm::Es256 => "ES256",
            Algorithm::Es384 => "ES384",
            Algorithm::Es512 => "ES512",
        }
    }

    pub fn hash(&self) -> HashAlgorithm {
        match self {
            Algorithm::Ps256 | Algorithm::Es256 => HashAlgorithm::Sha256,
            Algorithm::Ps384 | Algorithm::Es384 => HashAlgorithm::Sha384,
            Algorithm::Ps512 | Algorithm::Es512 => HashAlgorithm::Sha512,
        }
    }

    pub fn key_spec(&self) -> KeySpec {
        match self {
            Algorithm::Ps256 => KeySpec::rsa(2048),
            Algorithm::Ps384 => KeySpec::rsa(3072),
            Algorithm::Ps512 => KeySpec::rsa(4096),
            Algorithm::Es256 => KeySpec::ec(256),
            Algorithm::Es384 => KeySpec::ec(384),
            Algorithm::Es512 => KeySpec::ec(521),
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Algorithm {
    type Err = SignatureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Algorithm::ALL
            .into_iter()
            .find(|alg| alg.as_str() == s)
            .ok_or_else(|| SignatureError::unsupported_algorithm(s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HashAlgorithm {
    Sha256,
    Sha384,
    Sha512,
}

impl HashAlgorithm {
    pub fn digest(&self, data: &[u8]) -> Vec<u8> {
        match self {
            HashAlgorithm::Sha256 => Sha256::digest(data).to_vec(),
            HashAlgorithm::Sha384 => Sha384::digest(data).to_vec(),
            HashAlgorithm::Sha512 => Sha512::digest(data).to_vec(),
        }
    }

    pub fn output_len(&self) -> usize {
        match self {
            HashAlgorithm::Sha256 => 32,
            HashAlgorithm::Sha384 => 48,
            HashAlgorithm::Sha512 => 64,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum KeyType {
    Rsa,
    Ec,
}

/// Type and size (in bits) of a signing key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeySpec {
    pub key_type: KeyType,
    pub size: usize,
}

impl KeySpec {
    pub fn rsa(size: usize) -> Self {
        Self {
            key_type: KeyType::Rsa,
            size,
        }
    }

    pub fn ec(size: usize) -> Self {
        Self {
            key_type: KeyType::Ec,
            size,
        }
    }

    /// Maps the key to the one algorithm it is allowed to sign with.
    pub fn signature_algorithm(&self) -> Result<Algorithm, SignatureError> {
        match (self.key_type, self.size) {
            (KeyType::Rsa, 2048) => Ok(Algorithm::Ps256),
            (KeyType::Rsa, 3072) => Ok(Algorithm::Ps384),
            (KeyType::Rsa, 4096) => Ok(Algorithm::Ps512),
            (KeyType::Ec, 256) => Ok(Algorithm::Es256),
            (KeyType::Ec, 384) => Ok(Algorithm::Es384),
            (KeyType::Ec, 521) => Ok(Algorithm::Es512),
            (KeyType::Rsa, size) => Err(SignatureError::unsupported_signing_key(format!(
                "rsa key size {size} bits is not supported"
            ))),
            (KeyType::Ec, size) => Err(SignatureError::unsupported_signing_key(format!(
                "ecdsa key size {size} bits is not supported"
            ))),
        }
    }
}
