use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::algorithm::{Algorithm, KeySpec};
use crate::context::Context;
use crate::error::SignatureError;
use crate::scheme::SigningScheme;
use crate::signer_info::{Attribute, Payload, SignedAttributes};

/// Everything an envelope needs to produce a signature.
///
/// The execution context is not serialized; a deserialized request runs
/// under the background context until [`SignRequest::with_context`] is used.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SignRequest {
    pub payload: Payload,
    #[serde(default)]
    pub key_id: String,
    #[serde(default)]
    pub signature_algorithm: Option<Algorithm>,
    #[serde(default)]
    pub signing_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub expiry: Option<DateTime<Utc>>,
    #[serde(default)]
    pub extended_signed_attributes: Vec<Attribute>,
    #[serde(default)]
    pub signing_agent: String,
    #[serde(default)]
    pub signing_scheme: SigningScheme,
    #[serde(skip)]
    pub ctx: Option<Context>,
}

impl SignRequest {
    /// The context to run the request under; background if none was attached.
    pub fn context(&self) -> Context {
        self.ctx.clone().unwrap_or_else(Context::background)
    }

    /// Returns a copy of the request running under `ctx`.
    ///
    /// # Panics
    ///
    /// Panics if `ctx` is `None`.
    pub fn with_context(&self, ctx: impl Into<Option<Context>>) -> Self {
        let Some(ctx) = ctx.into() else {
            panic!("missing context");
        };
        Self {
            ctx: Some(ctx),
            ..self.clone()
        }
    }

    /// Checks the request before any signing work is attempted.
    pub fn validate(&self) -> Result<(), SignatureError> {
        self.check()
            .inspect_err(|err| tracing::debug!(key_id = %self.key_id, %err, "rejecting sign request"))
    }

    fn check(&self) -> Result<(), SignatureError> {
        if self.payload.content_type.is_empty() {
            return Err(SignatureError::invalid_sign_request(
                "payload content type not present",
            ));
        }
        if self.payload.content.is_empty() {
            return Err(SignatureError::invalid_sign_request("payload content not present"));
        }
        if self.signature_algorithm.is_none() {
            return Err(SignatureError::invalid_sign_request(
                "signature algorithm not present",
            ));
        }
        let Some(signing_time) = self.signing_time else {
            return Err(SignatureError::invalid_sign_request("signing time not present"));
        };
        if let Some(expiry) = self.expiry {
            if expiry <= signing_time {
                return Err(SignatureError::invalid_sign_request(
                    "expiry cannot be equal or before the signing time",
                ));
            }
        }

        let mut seen = HashSet::new();
        for attr in &self.extended_signed_attributes {
            if attr.key.is_empty() {
                return Err(SignatureError::invalid_sign_request(
                    "extended attribute key not present",
                ));
            }
            if !seen.insert(attr.key.as_str()) {
                return Err(SignatureError::duplicate_key(&attr.key));
            }
        }
        Ok(())
    }

    /// Checks that a key of shape `spec` may produce the requested algorithm.
    pub fn check_key_spec(&self, spec: KeySpec) -> Result<Algorithm, SignatureError> {
        let key_algorithm = spec.signature_algorithm()?;
        match self.signature_algorithm {
            Some(requested) if requested != key_algorithm => {
                Err(SignatureError::invalid_sign_request(format!(
                    "signature algorithm {requested} does not match signing key algorithm {key_algorithm}"
                )))
            }
            _ => Ok(key_algorithm),
        }
    }

    /// The attributes an envelope embeds under the signature.
    pub fn signed_attributes(&self) -> SignedAttributes {
        SignedAttributes {
            signing_scheme: self.signing_scheme.to_string(),
            signing_time: self.signing_time,
            expiry: self.expiry,
            extended_attributes: self.extended_signed_attributes.clone(),
        }
    }
}
