// Copyright 2020-2023 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! JWS signing and verification: HS256, RS256, ES256, with the algorithm-confusion
//! and key-selection defenses required of a Verifier (§4.5).

mod ecdsa;
mod header;
mod hmac;
mod rsa;

pub use ecdsa::EcdsaSigner;
pub use header::JwsHeader;
pub use hmac::HmacSigner;
pub use rsa::RsaSigner;

/// Verifies a raw ES256 signature. Exposed for the key-binding JWT validator
/// (§4.13), which verifies outside the `decode`/`KeyResolver` flow since a kb+jwt's
/// signing key is the holder's `cnf.jwk`, carried in the *other* JWT's payload.
pub(crate) use ecdsa::verify as verify_es256;

use rsa::RsaPublicKey;

use crate::base64url;
use crate::json::JsonObject;
use crate::Error;
use crate::Result;

/// The three JWS algorithms this library signs and verifies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JwsAlgorithm {
  Hs256,
  Rs256,
  Es256,
}

impl JwsAlgorithm {
  pub fn as_str(&self) -> &'static str {
    match self {
      JwsAlgorithm::Hs256 => "HS256",
      JwsAlgorithm::Rs256 => "RS256",
      JwsAlgorithm::Es256 => "ES256",
    }
  }

  /// Parses `alg` case-insensitively.
  ///
  /// ## Error
  /// [`Error::AlgorithmConfusion`] if `alg` case-insensitively equals `"none"`.
  /// [`Error::UnsupportedAlgorithm`] for anything else outside `{HS256, RS256, ES256}`.
  pub fn parse(alg: &str) -> Result<Self> {
    if alg.eq_ignore_ascii_case("none") {
      return Err(Error::AlgorithmConfusion(alg.to_string()));
    }
    if alg.eq_ignore_ascii_case("HS256") {
      Ok(JwsAlgorithm::Hs256)
    } else if alg.eq_ignore_ascii_case("RS256") {
      Ok(JwsAlgorithm::Rs256)
    } else if alg.eq_ignore_ascii_case("ES256") {
      Ok(JwsAlgorithm::Es256)
    } else {
      Err(Error::UnsupportedAlgorithm(alg.to_string()))
    }
  }
}

/// A signer capable of producing a JWS signature over a signing input.
///
/// Implemented by [`HmacSigner`], [`RsaSigner`], [`EcdsaSigner`].
pub trait Signer {
  fn algorithm(&self) -> JwsAlgorithm;
  fn key_id(&self) -> Option<&str> {
    None
  }
  fn sign(&self, signing_input: &[u8]) -> Result<Vec<u8>>;
}

/// The verifying key material a [`KeyResolver`] hands back for one JWS.
///
/// The variant MUST match the header's `alg` — `decode` rejects a mismatch as
/// algorithm confusion, so a resolver can never be tricked into handing an HMAC key to
/// a header claiming `ES256`, or vice versa.
pub enum VerifyingKeyMaterial {
  Hmac(Vec<u8>),
  Rsa(RsaPublicKey),
  Ec(p256::ecdsa::VerifyingKey),
}

/// Resolves the verifying key for a JWS header.
///
/// Called once per `decode`, with `kid` set to the header's `kid` when present. A
/// header without `kid` calls this with `None`, expecting the resolver to supply a
/// fallback key; resolvers with no fallback should return `Ok(None)` in that case.
pub trait KeyResolver {
  /// Resolve the key for `kid` (or the fallback key, if `kid` is `None`).
  ///
  /// Return `Ok(None)` when there is no match — `decode` turns that into
  /// `key-id-not-found` (kid present) or `key-resolver-missing` (kid absent). Return
  /// `Err` only for a genuine resolution failure (e.g. a backing store erroring);
  /// `decode` wraps it as `key-resolver-failed`.
  fn resolve(&self, kid: Option<&str>) -> Result<Option<VerifyingKeyMaterial>>;
}

/// A [`KeyResolver`] that always returns the same key, ignoring `kid`.
pub struct SingleKeyResolver(pub VerifyingKeyMaterial);

impl KeyResolver for SingleKeyResolver {
  fn resolve(&self, _kid: Option<&str>) -> Result<Option<VerifyingKeyMaterial>> {
    Ok(Some(match &self.0 {
      VerifyingKeyMaterial::Hmac(key) => VerifyingKeyMaterial::Hmac(key.clone()),
      VerifyingKeyMaterial::Rsa(key) => VerifyingKeyMaterial::Rsa(key.clone()),
      VerifyingKeyMaterial::Ec(key) => VerifyingKeyMaterial::Ec(*key),
    }))
  }
}

/// A [`KeyResolver`] backed by a kid → key map, with an optional fallback for
/// kid-less headers. Mirrors the cache-miss/refresh shape JWKS-backed resolvers use,
/// minus the network fetch — callers populate the map themselves.
#[derive(Default)]
pub struct MapKeyResolver {
  by_kid: std::collections::HashMap<String, VerifyingKeyMaterialOwned>,
  fallback: Option<VerifyingKeyMaterialOwned>,
}

// `VerifyingKeyMaterial` isn't `Clone` (RsaPublicKey's big integers are heavy to dupe
// implicitly); store an owned copy per entry instead of requiring callers to clone.
enum VerifyingKeyMaterialOwned {
  Hmac(Vec<u8>),
  Rsa(RsaPublicKey),
  Ec(p256::ecdsa::VerifyingKey),
}

impl From<VerifyingKeyMaterial> for VerifyingKeyMaterialOwned {
  fn from(value: VerifyingKeyMaterial) -> Self {
    match value {
      VerifyingKeyMaterial::Hmac(key) => Self::Hmac(key),
      VerifyingKeyMaterial::Rsa(key) => Self::Rsa(key),
      VerifyingKeyMaterial::Ec(key) => Self::Ec(key),
    }
  }
}

impl VerifyingKeyMaterialOwned {
  fn to_material(&self) -> VerifyingKeyMaterial {
    match self {
      Self::Hmac(key) => VerifyingKeyMaterial::Hmac(key.clone()),
      Self::Rsa(key) => VerifyingKeyMaterial::Rsa(key.clone()),
      Self::Ec(key) => VerifyingKeyMaterial::Ec(*key),
    }
  }
}

impl MapKeyResolver {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_key(mut self, kid: impl Into<String>, key: VerifyingKeyMaterial) -> Self {
    self.by_kid.insert(kid.into(), key.into());
    self
  }

  pub fn with_fallback(mut self, key: VerifyingKeyMaterial) -> Self {
    self.fallback = Some(key.into());
    self
  }

  pub fn remove_key(&mut self, kid: &str) {
    self.by_kid.remove(kid);
  }
}

impl KeyResolver for MapKeyResolver {
  fn resolve(&self, kid: Option<&str>) -> Result<Option<VerifyingKeyMaterial>> {
    match kid {
      Some(kid) => Ok(self.by_kid.get(kid).map(VerifyingKeyMaterialOwned::to_material)),
      None => Ok(self.fallback.as_ref().map(VerifyingKeyMaterialOwned::to_material)),
    }
  }
}

/// Assembles and signs a compact JWS: `b64u(header).b64u(payload).b64u(signature)`.
///
/// `extra_header` fields (e.g. `typ: "kb+jwt"`) are merged over the defaults produced
/// from `signer`'s algorithm and key id.
pub fn encode(extra_header: Option<JsonObject>, payload: &JsonObject, signer: &dyn Signer) -> Result<String> {
  let mut header = JsonObject::new();
  header.insert("typ".to_string(), "JWT".into());
  header.insert("alg".to_string(), signer.algorithm().as_str().into());
  if let Some(kid) = signer.key_id() {
    header.insert("kid".to_string(), kid.into());
  }
  if let Some(extra) = extra_header {
    header.extend(extra);
  }

  let header_b64 = base64url::encode(serde_json::to_vec(&header).map_err(|e| Error::Unspecified(e.to_string()))?);
  let payload_b64 = base64url::encode(serde_json::to_vec(payload).map_err(|e| Error::Unspecified(e.to_string()))?);
  let signing_input = format!("{header_b64}.{payload_b64}");
  let signature = signer.sign(signing_input.as_bytes())?;
  Ok(format!("{signing_input}.{}", base64url::encode(signature)))
}

/// Decodes a compact JWS's payload without verifying its signature.
///
/// For holder-side operations (selecting which disclosures to present) the holder
/// already trusts the token it was handed directly by the issuer and only needs to
/// inspect its claims tree — there is no resolver to verify against at that point.
pub fn peek_payload(token: &str) -> Result<JsonObject> {
  let payload_b64 = token
    .split('.')
    .nth(1)
    .ok_or_else(|| Error::DeserializationError("missing JWS payload segment".to_string()))?;
  serde_json::from_slice(&base64url::decode(payload_b64)?)
    .map_err(|e| Error::DeserializationError(format!("invalid JWT payload: {e}")))
}

/// Splits, verifies and decodes a compact JWS.
///
/// Returns `(header, payload)` on success. Enforces both defenses of §4.5: algorithm
/// confusion (via [`JwsHeader::from_object`]) and key-selection (the resolved key
/// variant must match the header's `alg`).
pub fn decode(token: &str, resolver: &dyn KeyResolver) -> Result<(JsonObject, JsonObject)> {
  let mut parts = token.split('.');
  let header_b64 = parts
    .next()
    .filter(|s| !s.is_empty())
    .ok_or_else(|| Error::DeserializationError("missing JWS header segment".to_string()))?;
  let payload_b64 = parts
    .next()
    .ok_or_else(|| Error::DeserializationError("missing JWS payload segment".to_string()))?;
  let signature_b64 = parts
    .next()
    .ok_or_else(|| Error::DeserializationError("missing JWS signature segment".to_string()))?;
  if parts.next().is_some() {
    return Err(Error::DeserializationError(
      "JWS must have exactly three dot-separated parts".to_string(),
    ));
  }

  let header_object: JsonObject = serde_json::from_slice(&base64url::decode(header_b64)?)
    .map_err(|e| Error::DeserializationError(format!("invalid JWT header: {e}")))?;
  let header = JwsHeader::from_object(&header_object)?;

  let payload_bytes = base64url::decode(payload_b64)?;
  let payload: JsonObject =
    serde_json::from_slice(&payload_bytes).map_err(|e| Error::DeserializationError(format!("invalid JWT payload: {e}")))?;

  let signature = base64url::decode(signature_b64)?;
  let signing_input = format!("{header_b64}.{payload_b64}");

  let key = match header.kid.as_deref() {
    Some(kid) => resolver
      .resolve(Some(kid))
      .map_err(|e| Error::KeyResolverFailed(e.to_string()))?
      .ok_or_else(|| Error::KeyIdNotFound(kid.to_string()))?,
    None => resolver
      .resolve(None)
      .map_err(|e| Error::KeyResolverFailed(e.to_string()))?
      .ok_or(Error::KeyResolverMissing)?,
  };

  let verified = match (&header.alg, &key) {
    (JwsAlgorithm::Hs256, VerifyingKeyMaterial::Hmac(key)) => hmac::verify(key, signing_input.as_bytes(), &signature),
    (JwsAlgorithm::Rs256, VerifyingKeyMaterial::Rsa(key)) => rsa::verify(key, signing_input.as_bytes(), &signature),
    (JwsAlgorithm::Es256, VerifyingKeyMaterial::Ec(key)) => ecdsa::verify(key, signing_input.as_bytes(), &signature),
    _ => {
      return Err(Error::AlgorithmConfusion(format!(
        "resolved key shape does not match header alg {}",
        header.alg.as_str()
      )))
    }
  };

  if !verified {
    return Err(Error::InvalidSignature);
  }

  Ok((header_object, payload))
}
