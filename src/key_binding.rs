// Copyright 2020-2023 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! Generates and validates key-binding JWTs (`kb+jwt`, §4.13): proof, over the
//! holder's `cnf` key, that the holder presenting an SD-JWT is the one it was issued
//! to.

use p256::ecdsa::SigningKey;
use p256::pkcs8::DecodePublicKey;

use crate::base64url;
use crate::hasher::HashAlgorithm;
use crate::json::JsonObject;
use crate::jws;
use crate::jws::EcdsaSigner;
use crate::Result;

/// The `typ` header value identifying a key-binding JWT.
pub const KB_JWT_TYP: &str = "kb+jwt";

/// Computes `sd_hash = b64u(SHA-256(JWT ~ d1 ~ ... ~ dk ~))`.
///
/// Fixed to SHA-256 regardless of the SD-JWT's own `_sd_alg`, per §4.13: the binding
/// hash protects the transport-level concatenation, not the digest tree.
pub fn compute_sd_hash(jwt: &str, disclosures: &[String]) -> String {
  let input = format!("{jwt}~{}~", disclosures.join("~"));
  base64url::encode(HashAlgorithm::Sha256.digest(input.as_bytes()))
}

/// Generates a key-binding JWT: `{alg: "ES256", typ: "kb+jwt"}.{iat, aud, nonce, sd_hash}`,
/// signed with the holder's private key.
pub fn generate(holder_key: &SigningKey, aud: &str, nonce: &str, sd_hash: &str, iat: i64) -> Result<String> {
  let mut payload = JsonObject::new();
  payload.insert("iat".to_string(), iat.into());
  payload.insert("aud".to_string(), aud.into());
  payload.insert("nonce".to_string(), nonce.into());
  payload.insert("sd_hash".to_string(), sd_hash.into());

  let mut extra_header = JsonObject::new();
  extra_header.insert("typ".to_string(), KB_JWT_TYP.into());

  let signer = EcdsaSigner::new(holder_key.clone());
  jws::encode(Some(extra_header), &payload, &signer)
}

/// Validates a key-binding JWT against an expected `sd_hash` and, optionally, an
/// expected audience/nonce.
///
/// Per §4.13, every failure mode — malformed structure, wrong `typ`, hash/audience/
/// nonce mismatch, bad key material, bad signature — collapses to `false`; the caller
/// (the verifier) maps that uniformly onto `invalid-signature`, never exposing which
/// check failed.
pub fn validate(
  kb_jwt: &str,
  holder_public_key_spki: &[u8],
  expected_sd_hash: &str,
  expected_audience: Option<&str>,
  expected_nonce: Option<&str>,
) -> bool {
  try_validate(kb_jwt, holder_public_key_spki, expected_sd_hash, expected_audience, expected_nonce).unwrap_or(false)
}

fn try_validate(
  kb_jwt: &str,
  holder_public_key_spki: &[u8],
  expected_sd_hash: &str,
  expected_audience: Option<&str>,
  expected_nonce: Option<&str>,
) -> Result<bool> {
  let mut parts = kb_jwt.split('.');
  let Some(header_b64) = parts.next().filter(|s| !s.is_empty()) else {
    return Ok(false);
  };
  let Some(payload_b64) = parts.next() else {
    return Ok(false);
  };
  let Some(signature_b64) = parts.next() else {
    return Ok(false);
  };
  if parts.next().is_some() {
    return Ok(false);
  }

  let Ok(header_bytes) = base64url::decode(header_b64) else {
    return Ok(false);
  };
  let Ok(header) = serde_json::from_slice::<JsonObject>(&header_bytes) else {
    return Ok(false);
  };
  if header.get("typ").and_then(|v| v.as_str()) != Some(KB_JWT_TYP) {
    return Ok(false);
  }

  let Ok(payload_bytes) = base64url::decode(payload_b64) else {
    return Ok(false);
  };
  let Ok(payload) = serde_json::from_slice::<JsonObject>(&payload_bytes) else {
    return Ok(false);
  };

  if payload.get("sd_hash").and_then(|v| v.as_str()) != Some(expected_sd_hash) {
    return Ok(false);
  }
  if let Some(aud) = expected_audience {
    if payload.get("aud").and_then(|v| v.as_str()) != Some(aud) {
      return Ok(false);
    }
  }
  if let Some(nonce) = expected_nonce {
    if payload.get("nonce").and_then(|v| v.as_str()) != Some(nonce) {
      return Ok(false);
    }
  }

  let Ok(verifying_key) = p256::ecdsa::VerifyingKey::from_public_key_der(holder_public_key_spki) else {
    return Ok(false);
  };
  let Ok(signature) = base64url::decode(signature_b64) else {
    return Ok(false);
  };
  let signing_input = format!("{header_b64}.{payload_b64}");
  Ok(jws::verify_es256(&verifying_key, signing_input.as_bytes(), &signature))
}

/// Extracts the `iat` claim from a key-binding JWT's payload, without verifying its
/// signature — used only for the freshness check after [`validate`] has already
/// succeeded.
pub fn extract_iat(kb_jwt: &str) -> Option<i64> {
  let payload_b64 = kb_jwt.split('.').nth(1)?;
  let payload_bytes = base64url::decode(payload_b64).ok()?;
  let payload: JsonObject = serde_json::from_slice(&payload_bytes).ok()?;
  payload.get("iat").and_then(|v| v.as_i64())
}

#[cfg(test)]
mod test {
  use super::*;
  use crate::jwk;

  fn holder_key() -> SigningKey {
    SigningKey::from_slice(&[21u8; 32]).unwrap()
  }

  #[test]
  fn generates_a_validating_kb_jwt() {
    let key = holder_key();
    let spki = jwk::to_spki(&p256::ecdsa::VerifyingKey::from(&key)).unwrap();
    let sd_hash = compute_sd_hash("issuer.jwt.sig", &["d1".to_string(), "d2".to_string()]);

    let kb = generate(&key, "verifier.example", "n0nce", &sd_hash, 1_700_000_000).unwrap();
    assert!(validate(&kb, &spki, &sd_hash, Some("verifier.example"), Some("n0nce")));
  }

  #[test]
  fn mismatched_sd_hash_fails() {
    let key = holder_key();
    let spki = jwk::to_spki(&p256::ecdsa::VerifyingKey::from(&key)).unwrap();
    let sd_hash = compute_sd_hash("issuer.jwt.sig", &[]);
    let kb = generate(&key, "aud", "nonce", &sd_hash, 0).unwrap();
    assert!(!validate(&kb, &spki, "different-hash", None, None));
  }

  #[test]
  fn wrong_key_fails() {
    let key = holder_key();
    let other_spki = jwk::to_spki(&p256::ecdsa::VerifyingKey::from(&SigningKey::from_slice(&[22u8; 32]).unwrap())).unwrap();
    let sd_hash = compute_sd_hash("jwt", &[]);
    let kb = generate(&key, "aud", "nonce", &sd_hash, 0).unwrap();
    assert!(!validate(&kb, &other_spki, &sd_hash, None, None));
  }

  #[test]
  fn garbage_input_fails_closed() {
    assert!(!validate("not.a.jwt.at.all", &[], "x", None, None));
  }

  #[test]
  fn wrong_typ_fails() {
    let key = holder_key();
    let spki = jwk::to_spki(&p256::ecdsa::VerifyingKey::from(&key)).unwrap();
    let signer = EcdsaSigner::new(key);
    let mut payload = JsonObject::new();
    payload.insert("sd_hash".to_string(), "x".into());
    let token = jws::encode(None, &payload, &signer).unwrap();
    assert!(!validate(&token, &spki, "x", None, None));
  }
}
