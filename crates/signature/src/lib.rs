pub mod algorithm;
pub mod context;
pub mod envelope;
pub mod error;
pub mod local;
pub mod request;
pub mod scheme;
pub mod signer;
pub mod signer_info;
pub mod timestamp;
pub mod trust;

pub use algorithm::{Algorithm, HashAlgorithm, KeySpec, KeyType};
pub use context::{CancelHandle, Context, ContextError};
pub use envelope::{Envelope, EnvelopeRegistry, NewEnvelopeFn, ParseEnvelopeFn};
pub use error::{BoxError, SignatureError};
pub use local::LocalSigner;
pub use request::SignRequest;
pub use scheme::{SigningScheme, SigningSchemeError};
pub use signer::{RawSignature, Signer};
pub use signer_info::{
    Attribute, Certificate, EnvelopeContent, Payload, SignedAttributes, SignerInfo,
    TimestampToken, UnsignedAttributes,
};
pub use timestamp::{Timestamper, TimestampRequest, timestamp_signature};
pub use trust::verify_authenticity;
