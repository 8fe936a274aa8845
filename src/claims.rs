// Copyright 2020-2023 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! Temporal and issuer/audience claim validation (§4.15), plus [`VerificationOptions`],
//! the verifier's single configuration object (§3).

use serde_json::Value;

use crate::hasher::HashAlgorithm;
use crate::json::JsonObject;
use crate::Error;
use crate::Result;

/// Allowed range for [`VerificationOptions::with_clock_skew_secs`], per §6.
pub const MAX_CLOCK_SKEW_SECS: i64 = 300;

/// Default ceiling on a key-binding JWT's `iat` age, per §6.
pub const DEFAULT_KB_MAX_AGE_SECS: i64 = 300;

/// Default ceiling on disclosures per presentation, per §6.
pub const DEFAULT_MAX_DISCLOSURES: usize = 100;

/// Default ceiling on a presentation's serialized size in bytes, per §6.
pub const DEFAULT_MAX_JWT_SIZE: usize = 65536;

/// Immutable configuration for one verification call.
///
/// Built via the `with_*`/`expect_*` setters, each of which consumes and returns
/// `Self`; once handed to the verifier it is never mutated.
#[derive(Debug, Clone)]
pub struct VerificationOptions {
  pub(crate) clock_skew_secs: i64,
  pub(crate) require_key_binding: bool,
  pub(crate) expected_issuer: Option<String>,
  pub(crate) expected_audience: Option<String>,
  pub(crate) expected_hash_alg: Option<HashAlgorithm>,
  pub(crate) expected_nonce: Option<String>,
  pub(crate) max_disclosures: usize,
  pub(crate) max_jwt_size: usize,
  pub(crate) kb_max_age_secs: i64,
}

impl Default for VerificationOptions {
  fn default() -> Self {
    Self {
      clock_skew_secs: 0,
      require_key_binding: false,
      expected_issuer: None,
      expected_audience: None,
      expected_hash_alg: None,
      expected_nonce: None,
      max_disclosures: DEFAULT_MAX_DISCLOSURES,
      max_jwt_size: DEFAULT_MAX_JWT_SIZE,
      kb_max_age_secs: DEFAULT_KB_MAX_AGE_SECS,
    }
  }
}

impl VerificationOptions {
  pub fn new() -> Self {
    Self::default()
  }

  /// Sets the allowed clock skew, applied symmetrically to `exp`/`nbf`/kb `iat`.
  ///
  /// ## Error
  /// [`Error::InvalidInput`]-adjacent [`Error::Unspecified`] if `secs` is outside
  /// `[0, 300]`.
  pub fn with_clock_skew_secs(mut self, secs: i64) -> Result<Self> {
    if !(0..=MAX_CLOCK_SKEW_SECS).contains(&secs) {
      return Err(Error::Unspecified(format!(
        "clock skew must be between 0 and {MAX_CLOCK_SKEW_SECS} seconds, got {secs}"
      )));
    }
    self.clock_skew_secs = secs;
    Ok(self)
  }

  pub fn require_key_binding(mut self, required: bool) -> Self {
    self.require_key_binding = required;
    self
  }

  pub fn expect_issuer(mut self, issuer: impl Into<String>) -> Self {
    self.expected_issuer = Some(issuer.into());
    self
  }

  pub fn expect_audience(mut self, audience: impl Into<String>) -> Self {
    self.expected_audience = Some(audience.into());
    self
  }

  pub fn expect_hash_algorithm(mut self, alg: HashAlgorithm) -> Self {
    self.expected_hash_alg = Some(alg);
    self
  }

  pub fn expect_nonce(mut self, nonce: impl Into<String>) -> Self {
    self.expected_nonce = Some(nonce.into());
    self
  }

  pub fn with_max_disclosures(mut self, max: usize) -> Self {
    self.max_disclosures = max;
    self
  }

  pub fn with_kb_max_age_secs(mut self, secs: i64) -> Self {
    self.kb_max_age_secs = secs;
    self
  }
}

/// Validates `exp`/`nbf`/`iat`, each permitted to be absent, but rejected with
/// [`Error::DataTypeMismatch`] if present and not a JSON number.
///
/// ## Error
/// [`Error::TokenExpired`] if `now > exp + skew`.
/// [`Error::TokenNotYetValid`] if `now < nbf - skew`.
pub fn validate_temporal(payload: &JsonObject, now: i64, skew_secs: i64) -> Result<()> {
  if let Some(exp) = payload.get("exp") {
    let exp = numeric_claim(exp, "exp")?;
    if now > exp.saturating_add(skew_secs) {
      return Err(Error::TokenExpired);
    }
  }
  if let Some(nbf) = payload.get("nbf") {
    let nbf = numeric_claim(nbf, "nbf")?;
    if now < nbf.saturating_sub(skew_secs) {
      return Err(Error::TokenNotYetValid);
    }
  }
  if let Some(iat) = payload.get("iat") {
    numeric_claim(iat, "iat")?;
  }
  Ok(())
}

fn numeric_claim(value: &Value, name: &str) -> Result<i64> {
  value
    .as_i64()
    .ok_or_else(|| Error::DataTypeMismatch(format!("{name} must be a JSON number")))
}

/// Checks `iss` for an exact string match against `expected`.
///
/// ## Error
/// [`Error::MissingRequiredClaim`] if `iss` is absent, not a string, or mismatched.
pub fn validate_issuer(payload: &JsonObject, expected: &str) -> Result<()> {
  match payload.get("iss").and_then(Value::as_str) {
    Some(iss) if iss == expected => Ok(()),
    _ => Err(Error::MissingRequiredClaim("iss".to_string())),
  }
}

/// Checks `aud` (a string, or an array of strings) for membership of `expected`.
///
/// ## Error
/// [`Error::MissingRequiredClaim`] if `aud` is absent or does not contain `expected`.
pub fn validate_audience(payload: &JsonObject, expected: &str) -> Result<()> {
  let matched = match payload.get("aud") {
    Some(Value::String(aud)) => aud == expected,
    Some(Value::Array(values)) => values.iter().any(|v| v.as_str() == Some(expected)),
    _ => false,
  };
  if matched {
    Ok(())
  } else {
    Err(Error::MissingRequiredClaim("aud".to_string()))
  }
}

#[cfg(test)]
mod test {
  use super::*;
  use serde_json::json;

  fn payload(fields: Value) -> JsonObject {
    fields.as_object().unwrap().clone()
  }

  #[test]
  fn rejects_out_of_range_clock_skew() {
    assert!(VerificationOptions::new().with_clock_skew_secs(301).is_err());
    assert!(VerificationOptions::new().with_clock_skew_secs(-1).is_err());
    assert!(VerificationOptions::new().with_clock_skew_secs(300).is_ok());
  }

  #[test]
  fn expired_token_is_rejected() {
    let claims = payload(json!({"exp": 1000}));
    assert!(matches!(validate_temporal(&claims, 1301, 0).unwrap_err(), Error::TokenExpired));
    validate_temporal(&claims, 1300, 0).unwrap();
  }

  #[test]
  fn clock_skew_extends_expiry_window() {
    let claims = payload(json!({"exp": 1000}));
    validate_temporal(&claims, 1100, 300).unwrap();
    assert!(validate_temporal(&claims, 1301, 300).is_err());
  }

  #[test]
  fn not_yet_valid_token_is_rejected() {
    let claims = payload(json!({"nbf": 1000}));
    assert!(matches!(
      validate_temporal(&claims, 500, 0).unwrap_err(),
      Error::TokenNotYetValid
    ));
    validate_temporal(&claims, 1000, 0).unwrap();
  }

  #[test]
  fn issuer_must_match_exactly() {
    let claims = payload(json!({"iss": "https://issuer.example"}));
    validate_issuer(&claims, "https://issuer.example").unwrap();
    assert!(validate_issuer(&claims, "https://other.example").is_err());
  }

  #[test]
  fn audience_accepts_array_membership() {
    let claims = payload(json!({"aud": ["a", "b", "c"]}));
    validate_audience(&claims, "b").unwrap();
    assert!(validate_audience(&claims, "z").is_err());
  }
}
