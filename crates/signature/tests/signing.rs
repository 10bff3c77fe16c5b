use std::sync::LazyLock;

use chrono::{TimeZone, Utc};
use rsa::RsaPublicKey;
use rsa::pkcs1::{DecodeRsaPublicKey, EncodeRsaPublicKey};

use notation_signature::local::verify_pss;
use notation_signature::{
    Algorithm, Attribute, Certificate, Context, Envelope, EnvelopeContent, EnvelopeRegistry,
    LocalSigner, Payload, SignRequest, SignatureError, Signer, SignerInfo, SigningScheme,
    SigningSchemeError, TimestampRequest, TimestampToken, Timestamper, UnsignedAttributes,
    timestamp_signature, verify_authenticity,
};

const MEDIA_TYPE: &str = "application/vnd.test.signature+json";

/// Leaf certificate stand-in: the signer's PKCS#1 public key.
static SIGNER: LazyLock<LocalSigner> = LazyLock::new(|| {
    let key = LocalSigner::generate_key("signing-flow", 2048).unwrap();
    let leaf = key.to_public_key().to_pkcs1_der().unwrap().into_vec();
    let root = vec![0x30, 0x03, 0x02, 0x01, 0x01];
    LocalSigner::new(key, vec![Certificate::from_der(leaf), Certificate::from_der(root)]).unwrap()
});

// ── Test envelope: JSON-encoded EnvelopeContent ──────────────────────

#[derive(Default)]
struct JsonEnvelope {
    content: Option<EnvelopeContent>,
}

fn signing_input(content: &EnvelopeContent) -> Vec<u8> {
    serde_json::to_vec(&(&content.payload, &content.signer_info.signed_attributes)).unwrap()
}

impl Envelope for JsonEnvelope {
    fn sign(&mut self, request: &SignRequest, signer: &dyn Signer) -> Result<Vec<u8>, SignatureError> {
        request.validate()?;
        if let Some(err) = request.context().err() {
            return Err(SignatureError::invalid_sign_request(err.to_string()));
        }
        let algorithm = request.check_key_spec(signer.key_spec()?)?;

        let mut content = EnvelopeContent {
            payload: request.payload.clone(),
            signer_info: SignerInfo {
                signed_attributes: request.signed_attributes(),
                unsigned_attributes: UnsignedAttributes {
                    signing_agent: Some(request.signing_agent.clone()),
                    ..Default::default()
                },
                signature_algorithm: Some(algorithm),
                ..Default::default()
            },
        };
        let raw = signer.sign(&signing_input(&content))?;
        content.signer_info.signature = raw.signature;
        content.signer_info.certificate_chain = raw.certificate_chain;

        let bytes = serde_json::to_vec(&content).unwrap();
        self.content = Some(content);
        Ok(bytes)
    }

    fn verify(&self) -> Result<EnvelopeContent, SignatureError> {
        let content = self.content()?;
        let info = &content.signer_info;
        if info.signature.is_empty() {
            return Err(SignatureError::SignatureNotFound);
        }
        let algorithm = info
            .signature_algorithm
            .ok_or_else(|| SignatureError::invalid_signature("missing signature algorithm"))?;
        let leaf = info
            .signing_certificate()
            .ok_or_else(|| SignatureError::invalid_signature("missing certificate chain"))?;
        let public_key = RsaPublicKey::from_pkcs1_der(leaf.as_der())
            .map_err(|e| SignatureError::invalid_signature(format!("malformed leaf certificate: {e}")))?;

        verify_pss(&public_key, algorithm, &signing_input(&content), &info.signature)?;
        Ok(content)
    }

    fn content(&self) -> Result<EnvelopeContent, SignatureError> {
        self.content.clone().ok_or(SignatureError::SignatureNotFound)
    }
}

fn new_json() -> Box<dyn Envelope> {
    Box::new(JsonEnvelope::default())
}

fn parse_json(bytes: &[u8]) -> Result<Box<dyn Envelope>, SignatureError> {
    let content = serde_json::from_slice(bytes).map_err(|e| SignatureError::invalid_signature(e.to_string()))?;
    Ok(Box::new(JsonEnvelope {
        content: Some(content),
    }))
}

fn registry() -> EnvelopeRegistry {
    let mut registry = EnvelopeRegistry::new();
    registry.register(MEDIA_TYPE, new_json, parse_json).unwrap();
    registry
}

fn request(scheme: SigningScheme) -> SignRequest {
    SignRequest {
        payload: Payload {
            content_type: "application/vnd.cncf.notary.payload.v1+json".to_string(),
            content: br#"{"targetArtifact":{"digest":"sha256:abc"}}"#.to_vec(),
        },
        key_id: "release-key".to_string(),
        signature_algorithm: Some(Algorithm::Ps256),
        signing_time: Some(Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap()),
        signing_agent: "notation-signature/0.1".to_string(),
        signing_scheme: scheme,
        extended_signed_attributes: vec![Attribute {
            key: "io.cncf.notary.verificationPlugin".to_string(),
            critical: true,
            value: serde_json::json!("plugin"),
        }],
        ..Default::default()
    }
}

fn sign(request: &SignRequest) -> Result<Vec<u8>, SignatureError> {
    let mut envelope = registry().new_envelope(MEDIA_TYPE)?;
    envelope.sign(request, &*SIGNER)
}

fn verify(bytes: &[u8]) -> Result<EnvelopeContent, SignatureError> {
    registry().parse_envelope(MEDIA_TYPE, bytes)?.verify()
}

// ── Sign / verify ────────────────────────────────────────────────────

#[test]
fn signing_authority_flow_yields_signing_time() {
    let bytes = sign(&request(SigningScheme::X509SigningAuthority)).unwrap();
    let content = verify(&bytes).unwrap();

    let time = content.signer_info.authentic_signing_time().unwrap();
    assert_eq!(time.to_rfc3339(), "2023-01-01T00:00:00+00:00");
    assert_eq!(content.signer_info.signature_algorithm, Some(Algorithm::Ps256));
    assert!(content
        .signer_info
        .extended_attribute("io.cncf.notary.verificationPlugin")
        .is_some_and(|attr| attr.critical));
}

#[test]
fn plain_x509_flow_has_no_authentic_time() {
    let bytes = sign(&request(SigningScheme::X509)).unwrap();
    let content = verify(&bytes).unwrap();

    let err = content.signer_info.authentic_signing_time().unwrap_err();
    assert_eq!(
        err.to_string(),
        "authentic signing time not supported under signing scheme \"notary.x509\""
    );
}

#[test]
fn tampered_payload_fails_integrity() {
    let bytes = sign(&request(SigningScheme::X509)).unwrap();
    let mut content: EnvelopeContent = serde_json::from_slice(&bytes).unwrap();
    content.payload.content = b"{\"targetArtifact\":{\"digest\":\"sha256:evil\"}}".to_vec();
    let tampered = serde_json::to_vec(&content).unwrap();

    let err = verify(&tampered).unwrap_err();
    assert!(matches!(err, SignatureError::Integrity { .. }));
    assert!(err.is_verification_failure());
    assert!(err.to_string().starts_with("signature is invalid. Error: "));
}

#[test]
fn tampered_scheme_fails_integrity() {
    let bytes = sign(&request(SigningScheme::X509)).unwrap();
    let mut content: EnvelopeContent = serde_json::from_slice(&bytes).unwrap();
    content.signer_info.signed_attributes.signing_scheme =
        SigningScheme::X509SigningAuthority.to_string();
    let tampered = serde_json::to_vec(&content).unwrap();

    assert!(matches!(verify(&tampered), Err(SignatureError::Integrity { .. })));
}

#[test]
fn malformed_envelope_is_invalid_signature() {
    let err = verify(b"not json").unwrap_err();
    assert!(matches!(err, SignatureError::InvalidSignature { .. }));
}

#[test]
fn empty_envelope_is_not_found() {
    assert!(matches!(verify(&[]), Err(SignatureError::EnvelopeNotFound)));
}

#[test]
fn unregistered_media_type_is_unsupported() {
    let err = registry().new_envelope("application/jose+json").err().unwrap();
    assert_eq!(
        err.to_string(),
        "signature envelope format with media type \"application/jose+json\" is not supported"
    );
}

// ── Request errors surface through the envelope ──────────────────────

#[test]
fn invalid_request_is_rejected_before_signing() {
    let mut req = request(SigningScheme::X509);
    req.payload.content.clear();
    let err = sign(&req).unwrap_err();
    assert!(matches!(err, SignatureError::InvalidSignRequest { .. }));
    assert!(!err.is_verification_failure());
}

#[test]
fn mismatched_algorithm_is_rejected() {
    let mut req = request(SigningScheme::X509);
    req.signature_algorithm = Some(Algorithm::Ps512);
    let err = sign(&req).unwrap_err();
    assert_eq!(
        err.to_string(),
        "signature algorithm PS512 does not match signing key algorithm PS256"
    );
}

#[test]
fn duplicate_attributes_are_rejected() {
    let mut req = request(SigningScheme::X509);
    let dup = req.extended_signed_attributes[0].clone();
    req.extended_signed_attributes.push(dup);
    assert!(matches!(sign(&req), Err(SignatureError::DuplicateKey { .. })));
}

#[test]
fn cancelled_context_reaches_the_envelope() {
    let (ctx, cancel) = Context::background().with_cancel();
    let req = request(SigningScheme::X509).with_context(ctx);
    cancel.cancel();
    let err = sign(&req).unwrap_err();
    assert_eq!(err.to_string(), "context canceled");
}

// ── Trust and timestamping ───────────────────────────────────────────

#[test]
fn root_in_trust_store_is_authentic() {
    let content = verify(&sign(&request(SigningScheme::X509)).unwrap()).unwrap();
    let root = content.signer_info.certificate_chain[1].clone();

    let anchor = verify_authenticity(&content.signer_info, std::slice::from_ref(&root)).unwrap();
    assert_eq!(anchor, &root);

    let stranger = Certificate::from_der(vec![0x30, 0x00]);
    let err = verify_authenticity(&content.signer_info, &[stranger]).unwrap_err();
    assert!(matches!(err, SignatureError::Authenticity));
}

struct EchoTimestamper;

impl Timestamper for EchoTimestamper {
    fn timestamp(&self, _ctx: &Context, request: &TimestampRequest) -> Result<TimestampToken, SignatureError> {
        Ok(TimestampToken::new(request.digest.clone()))
    }
}

#[test]
fn plain_x509_caller_falls_back_to_timestamp_token() {
    let bytes = sign(&request(SigningScheme::X509)).unwrap();
    let mut info = verify(&bytes).unwrap().signer_info;

    let token = timestamp_signature(
        &Context::background(),
        &EchoTimestamper,
        Algorithm::Ps256,
        &info.signature,
    )
    .unwrap();
    info.unsigned_attributes.timestamp_signature = Some(token);

    // The policy stays narrow; the token is for the caller to evaluate.
    assert!(matches!(
        info.authentic_signing_time(),
        Err(SigningSchemeError::NotSupported { .. })
    ));
    assert_eq!(info.timestamp_token().unwrap().as_bytes().len(), 32);
}
