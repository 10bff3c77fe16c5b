use rand_chacha::ChaCha20Rng;
use rand_chacha::rand_core::SeedableRng;
use rsa::pss::{Signature, SigningKey, VerifyingKey};
use rsa::signature::{RandomizedSigner, SignatureEncoding, Verifier};
use rsa::traits::{PrivateKeyParts, PublicKeyParts};
use rsa::{RsaPrivateKey, RsaPublicKey};
use sha2::{Digest, Sha256, Sha384, Sha512};

use crate::algorithm::{Algorithm, KeySpec};
use crate::error::SignatureError;
use crate::signer::{RawSignature, Signer};
use crate::signer_info::Certificate;

/// RSASSA-PSS signer holding its key in memory.
///
/// The key size picks the algorithm: 2048 → PS256, 3072 → PS384, 4096 → PS512.
pub struct LocalSigner {
    private_key: RsaPrivateKey,
    algorithm: Algorithm,
    salt_seed: [u8; 32],
    certificate_chain: Vec<Certificate>,
}

impl LocalSigner {
    /// Wraps an existing key. `certificate_chain` is leaf first and must not
    /// be empty.
    pub fn new(
        private_key: RsaPrivateKey,
        certificate_chain: Vec<Certificate>,
    ) -> Result<Self, SignatureError> {
        if certificate_chain.is_empty() {
            return Err(SignatureError::invalid_argument("certificateChain", None));
        }
        let algorithm = KeySpec::rsa(private_key.size() * 8).signature_algorithm()?;
        let salt_seed = Sha256::digest(private_key.d().to_bytes_be()).into();
        Ok(Self {
            private_key,
            algorithm,
            salt_seed,
            certificate_chain,
        })
    }

    /// Generates the key from a seed and wraps it; see [`Self::generate_key`].
    pub fn from_seed(
        seed: &str,
        bits: usize,
        certificate_chain: Vec<Certificate>,
    ) -> Result<Self, SignatureError> {
        if certificate_chain.is_empty() {
            return Err(SignatureError::invalid_argument("certificateChain", None));
        }
        let private_key = Self::generate_key(seed, bits)?;
        Self::new(private_key, certificate_chain)
    }

    /// Deterministic RSA key generation: the SHA-256 hash of the seed
    /// seeds the CSPRNG.
    pub fn generate_key(seed: &str, bits: usize) -> Result<RsaPrivateKey, SignatureError> {
        KeySpec::rsa(bits).signature_algorithm()?;
        let mut rng = ChaCha20Rng::from_seed(Sha256::digest(seed.as_bytes()).into());
        RsaPrivateKey::new(&mut rng, bits)
            .map_err(|e| SignatureError::unsupported_signing_key(format!("generating RSA key: {e}")))
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub fn public_key(&self) -> RsaPublicKey {
        self.private_key.to_public_key()
    }

    /// Checks `signature` over `payload` against this signer's public key.
    pub fn verify(&self, payload: &[u8], signature: &[u8]) -> Result<(), SignatureError> {
        verify_pss(&self.public_key(), self.algorithm, payload, signature)
    }

    // PSS salts come from a stream keyed by the private exponent and the payload.
    fn salt_rng(&self, payload: &[u8]) -> ChaCha20Rng {
        let mut hasher = Sha256::new();
        hasher.update(self.salt_seed);
        hasher.update(payload);
        ChaCha20Rng::from_seed(hasher.finalize().into())
    }
}

impl Signer for LocalSigner {
    fn sign(&self, payload: &[u8]) -> Result<RawSignature, SignatureError> {
        let mut rng = self.salt_rng(payload);
        let key = self.private_key.clone();
        let signature = match self.algorithm {
            Algorithm::Ps256 => SigningKey::<Sha256>::new(key).sign_with_rng(&mut rng, payload).to_vec(),
            Algorithm::Ps384 => SigningKey::<Sha384>::new(key).sign_with_rng(&mut rng, payload).to_vec(),
            Algorithm::Ps512 => SigningKey::<Sha512>::new(key).sign_with_rng(&mut rng, payload).to_vec(),
            other => return Err(SignatureError::unsupported_algorithm(other.as_str())),
        };
        Ok(RawSignature {
            signature,
            certificate_chain: self.certificate_chain.clone(),
        })
    }

    fn key_spec(&self) -> Result<KeySpec, SignatureError> {
        Ok(KeySpec::rsa(self.private_key.size() * 8))
    }
}

/// Verifies an RSASSA-PSS signature; any mismatch is an integrity failure.
pub fn verify_pss(
    public_key: &RsaPublicKey,
    algorithm: Algorithm,
    payload: &[u8],
    signature: &[u8],
) -> Result<(), SignatureError> {
    let signature = Signature::try_from(signature).map_err(SignatureError::integrity)?;
    let key = public_key.clone();
    let verified = match algorithm {
        Algorithm::Ps256 => VerifyingKey::<Sha256>::new(key).verify(payload, &signature),
        Algorithm::Ps384 => VerifyingKey::<Sha384>::new(key).verify(payload, &signature),
        Algorithm::Ps512 => VerifyingKey::<Sha512>::new(key).verify(payload, &signature),
        other => return Err(SignatureError::unsupported_algorithm(other.as_str())),
    };
    verified.map_err(SignatureError::integrity)
}
