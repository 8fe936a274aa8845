// Copyright 2020-2023 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! The Verifier (§4.14): the single state machine that validates a presentation and
//! reconstructs its disclosed claims, exposed through both a throwing entry point
//! ([`verify`]) and a result-aggregating one ([`verify_to_result`]).

use serde_json::Value;

use crate::claims::VerificationOptions;
use crate::claims;
use crate::decoder;
use crate::digest_validator;
use crate::hasher::HashAlgorithm;
use crate::json::JsonObject;
use crate::jwk;
use crate::jws;
use crate::jws::KeyResolver;
use crate::key_binding;
use crate::presentation::Presentation;
use crate::Error;
use crate::ErrorKind;
use crate::Result;

/// One failure surfaced by [`verify_to_result`]: its language-neutral kind plus a
/// human-readable detail message (never a claim value, salt, key, or signature).
#[derive(Debug, Clone)]
pub struct VerificationError {
  pub kind: ErrorKind,
  pub detail: String,
}

/// The outcome of [`verify_to_result`].
///
/// `disclosed_claims` is only populated when `is_valid` is `true` — an invalid
/// presentation's claims must never be consumed by a caller who forgot to check the
/// flag.
#[derive(Debug, Clone)]
pub struct VerificationResult {
  pub is_valid: bool,
  pub errors: Vec<VerificationError>,
  pub disclosed_claims: JsonObject,
}

/// Verifies `presentation`, returning its disclosed claims on success.
///
/// ## Error
/// The first failing step's [`Error`], per §4.14 — see [`crate::ErrorKind`] for the
/// externally-visible classification.
pub fn verify(presentation: &str, resolver: &dyn KeyResolver, options: &VerificationOptions) -> Result<JsonObject> {
  run(presentation, resolver, options)
}

/// Verifies `presentation`, aggregating any failure into a [`VerificationResult`]
/// instead of propagating it as an `Err`.
pub fn verify_to_result(presentation: &str, resolver: &dyn KeyResolver, options: &VerificationOptions) -> VerificationResult {
  match run(presentation, resolver, options) {
    Ok(disclosed_claims) => VerificationResult {
      is_valid: true,
      errors: vec![],
      disclosed_claims,
    },
    Err(e) => {
      tracing::warn!("verify_to_result: {e}");
      VerificationResult {
        is_valid: false,
        errors: vec![VerificationError {
          kind: e.kind(),
          detail: e.to_string(),
        }],
        disclosed_claims: JsonObject::new(),
      }
    }
  }
}

#[tracing::instrument(skip_all)]
fn run(presentation: &str, resolver: &dyn KeyResolver, options: &VerificationOptions) -> Result<JsonObject> {
  tracing::debug!("verifier::run");
  // Step 0: structural ceilings, before any parsing work.
  if presentation.len() > options.max_jwt_size {
    return Err(Error::Unspecified("presentation exceeds the maximum allowed size".to_string()));
  }
  let parsed = Presentation::parse(presentation)?;
  if parsed.disclosures.len() > options.max_disclosures {
    return Err(Error::Unspecified(format!(
      "presentation carries more than {} disclosures",
      options.max_disclosures
    )));
  }

  // Step 1/2: verify the issuer's signature and recover header/payload. `jws::decode`
  // already enforces the algorithm-confusion and key-selection defenses of §4.5.
  let (_header, payload) = jws::decode(&parsed.jwt, resolver)?;

  // Step 3: resolve and, if pinned, check the hash algorithm.
  let hash_alg = match payload.get("_sd_alg").and_then(Value::as_str) {
    Some(name) => HashAlgorithm::parse(name)?,
    None => HashAlgorithm::default(),
  };
  if let Some(expected) = options.expected_hash_alg {
    if expected != hash_alg {
      return Err(Error::HashAlgorithmMismatch {
        expected: expected.alg_name().to_string(),
        actual: hash_alg.alg_name().to_string(),
      });
    }
  }

  // Step 4: every presented disclosure must be committed to by a digest in the payload.
  let committed_digests = collect_committed_digests(&Value::Object(payload.clone()));
  digest_validator::validate_disclosures(&parsed.disclosures, &committed_digests, hash_alg)?;

  // Step 5: reconstruct the disclosed claims (also re-checks duplicate/collision/depth).
  let disclosed_claims = decoder::decode(&payload, &parsed.disclosures, hash_alg)?;

  // Step 6: temporal validation.
  let now = now_epoch_secs();
  claims::validate_temporal(&payload, now, options.clock_skew_secs)?;

  // Step 7: issuer/audience validation.
  if let Some(expected_issuer) = &options.expected_issuer {
    claims::validate_issuer(&payload, expected_issuer)?;
  }
  if let Some(expected_audience) = &options.expected_audience {
    claims::validate_audience(&payload, expected_audience)?;
  }

  // Step 8: key binding.
  match (&parsed.key_binding_jwt, options.require_key_binding) {
    (None, true) => {
      return Err(Error::Unspecified(
        "key binding is required but the presentation carries none".to_string(),
      ))
    }
    (None, false) => {}
    (Some(kb_jwt), _) => {
      let holder_jwk = payload
        .get("cnf")
        .and_then(|cnf| cnf.get("jwk"))
        .and_then(Value::as_object)
        .ok_or_else(|| Error::KeyBindingInvalid("no cnf.jwk to bind against".to_string()))?;
      let verifying_key = jwk::from_jwk_object(holder_jwk)?;
      let holder_spki = jwk::to_spki(&verifying_key)?;

      let disclosure_strings: Vec<String> = parsed.disclosures.iter().map(ToString::to_string).collect();
      let sd_hash = key_binding::compute_sd_hash(&parsed.jwt, &disclosure_strings);

      let valid = key_binding::validate(
        kb_jwt,
        &holder_spki,
        &sd_hash,
        options.expected_audience.as_deref(),
        options.expected_nonce.as_deref(),
      );
      if !valid {
        return Err(Error::InvalidSignature);
      }

      let fresh = key_binding::extract_iat(kb_jwt).is_some_and(|iat| now - iat <= options.kb_max_age_secs + options.clock_skew_secs);
      if !fresh {
        return Err(Error::InvalidSignature);
      }
    }
  }

  // Step 9/10: success.
  Ok(disclosed_claims)
}

fn now_epoch_secs() -> i64 {
  std::time::SystemTime::now()
    .duration_since(std::time::UNIX_EPOCH)
    .map(|d| d.as_secs() as i64)
    .unwrap_or(0)
}

/// Recursively collects every digest referenced by `value`'s `_sd` arrays and
/// `{"...": digest}` array placeholders.
fn collect_committed_digests(value: &Value) -> Vec<String> {
  match value {
    Value::Object(object) => {
      let mut digests: Vec<String> = object
        .get(crate::json::DIGESTS_KEY)
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(Value::as_str)
        .map(ToOwned::to_owned)
        .collect();
      for (key, child) in object {
        if key != crate::json::DIGESTS_KEY {
          digests.extend(collect_committed_digests(child));
        }
      }
      digests
    }
    Value::Array(array) => {
      let mut digests = vec![];
      for entry in array {
        if let Some(digest) = crate::json::as_array_digest_placeholder(entry) {
          digests.push(digest.to_string());
        } else {
          digests.extend(collect_committed_digests(entry));
        }
      }
      digests
    }
    _ => vec![],
  }
}

#[cfg(test)]
mod test {
  use super::*;
  use crate::issuer::Issuer;
  use crate::jws::HmacSigner;
  use crate::jws::MapKeyResolver;
  use crate::jws::VerifyingKeyMaterial;
  use serde_json::json;

  fn hmac_key() -> Vec<u8> {
    vec![0x77u8; 32]
  }

  fn issue_sample() -> crate::sd_jwt::SdJwt {
    let claims = json!({
      "iss": "https://issuer.example",
      "sub": "user-42",
      "name": "Alice",
      "age": 30,
    })
    .as_object()
    .unwrap()
    .clone();
    Issuer::new(claims)
      .make_concealable("name")
      .unwrap()
      .make_concealable("age")
      .unwrap()
      .issue(&HmacSigner::new(hmac_key()))
      .unwrap()
  }

  fn resolver() -> MapKeyResolver {
    MapKeyResolver::new().with_fallback(VerifyingKeyMaterial::Hmac(hmac_key()))
  }

  #[test]
  fn verifies_a_full_presentation() {
    let sd_jwt = issue_sample();
    let presentation = sd_jwt.to_string();
    let claims = verify(&presentation, &resolver(), &VerificationOptions::new()).unwrap();
    assert_eq!(claims.get("name").unwrap(), "Alice");
    assert_eq!(claims.get("age").unwrap(), 30);
  }

  #[test]
  fn verifies_a_partial_presentation() {
    let sd_jwt = issue_sample();
    let presentation = Presentation::select(&sd_jwt, &["name"], None).unwrap().to_string();
    let claims = verify(&presentation, &resolver(), &VerificationOptions::new()).unwrap();
    assert_eq!(claims.get("name").unwrap(), "Alice");
    assert!(claims.get("age").is_none());
  }

  #[test]
  fn tampered_disclosure_fails_digest_validation() {
    let sd_jwt = issue_sample();
    let mut presentation = sd_jwt.to_string();
    presentation = presentation.replacen("Alice", "Mallory", 1);
    let result = verify_to_result(&presentation, &resolver(), &VerificationOptions::new());
    assert!(!result.is_valid);
  }

  #[test]
  fn issuer_mismatch_is_rejected() {
    let sd_jwt = issue_sample();
    let presentation = sd_jwt.to_string();
    let options = VerificationOptions::new().expect_issuer("https://someone-else.example");
    assert!(verify(&presentation, &resolver(), &options).is_err());
  }

  #[test]
  fn verify_to_result_never_discloses_claims_on_failure() {
    let result = verify_to_result("garbage~", &resolver(), &VerificationOptions::new());
    assert!(!result.is_valid);
    assert!(result.disclosed_claims.is_empty());
    assert_eq!(result.errors.len(), 1);
  }

  #[test]
  fn required_key_binding_without_one_present_fails() {
    let sd_jwt = issue_sample();
    let presentation = sd_jwt.to_string();
    let options = VerificationOptions::new().require_key_binding(true);
    assert!(verify(&presentation, &resolver(), &options).is_err());
  }
}
