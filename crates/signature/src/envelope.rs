use std::collections::BTreeMap;

use crate::error::SignatureError;
use crate::request::SignRequest;
use crate::signer::Signer;
use crate::signer_info::EnvelopeContent;

/// A signature envelope format (JWS, COSE, ...).
pub trait Envelope: Send {
    /// Signs `request` with `signer` and returns the encoded envelope.
    fn sign(&mut self, request: &SignRequest, signer: &dyn Signer) -> Result<Vec<u8>, SignatureError>;

    /// Checks integrity and returns the verified content.
    fn verify(&self) -> Result<EnvelopeContent, SignatureError>;

    /// Returns the content without verifying it.
    fn content(&self) -> Result<EnvelopeContent, SignatureError>;
}

pub type NewEnvelopeFn = fn() -> Box<dyn Envelope>;
pub type ParseEnvelopeFn = fn(&[u8]) -> Result<Box<dyn Envelope>, SignatureError>;

#[derive(Clone, Copy)]
struct EnvelopeFactory {
    new: NewEnvelopeFn,
    parse: ParseEnvelopeFn,
}

/// Envelope implementations keyed by media type.
#[derive(Default, Clone)]
pub struct EnvelopeRegistry {
    types: BTreeMap<String, EnvelopeFactory>,
}

impl EnvelopeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        media_type: &str,
        new: NewEnvelopeFn,
        parse: ParseEnvelopeFn,
    ) -> Result<(), SignatureError> {
        if media_type.is_empty() {
            return Err(SignatureError::invalid_argument("mediaType", None));
        }
        if self.types.contains_key(media_type) {
            return Err(SignatureError::duplicate_key(media_type));
        }
        self.types
            .insert(media_type.to_string(), EnvelopeFactory { new, parse });
        tracing::debug!(media_type, "registered envelope type");
        Ok(())
    }

    /// Registered media types, sorted.
    pub fn media_types(&self) -> Vec<&str> {
        self.types.keys().map(String::as_str).collect()
    }

    pub fn new_envelope(&self, media_type: &str) -> Result<Box<dyn Envelope>, SignatureError> {
        let factory = self.factory(media_type)?;
        Ok((factory.new)())
    }

    pub fn parse_envelope(
        &self,
        media_type: &str,
        envelope_bytes: &[u8],
    ) -> Result<Box<dyn Envelope>, SignatureError> {
        if envelope_bytes.is_empty() {
            return Err(SignatureError::EnvelopeNotFound);
        }
        let factory = self.factory(media_type)?;
        (factory.parse)(envelope_bytes)
    }

    fn factory(&self, media_type: &str) -> Result<EnvelopeFactory, SignatureError> {
        self.types
            .get(media_type)
            .copied()
            .ok_or_else(|| SignatureError::unsupported_format(media_type))
    }
}
