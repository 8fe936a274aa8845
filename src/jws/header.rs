// Copyright 2020-2023 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

use crate::json::JsonObject;
use crate::Error;
use crate::Result;

use super::JwsAlgorithm;

pub(crate) const MAX_KID_LEN: usize = 256;

/// A decoded JWS header, tolerant of extra fields (e.g. `typ: "kb+jwt"`, `cnf`-adjacent
/// metadata a caller may want to stash), but strict about `alg` and `kid`.
#[derive(Debug, Clone)]
pub struct JwsHeader {
  pub typ: Option<String>,
  pub alg: JwsAlgorithm,
  pub kid: Option<String>,
}

/// Validates a `kid`: 1–256 printable ASCII bytes (0x20–0x7e).
pub(crate) fn validate_kid(kid: &str) -> Result<()> {
  if kid.is_empty() || kid.len() > MAX_KID_LEN {
    return Err(Error::Unspecified(format!(
      "kid length {} is outside the allowed 1-{MAX_KID_LEN} bytes",
      kid.len()
    )));
  }
  if !kid.bytes().all(|b| (0x20..=0x7e).contains(&b)) {
    return Err(Error::Unspecified("kid must be printable ASCII".to_string()));
  }
  Ok(())
}

impl JwsHeader {
  /// Parses a header JSON object, enforcing the algorithm-confusion defenses of §4.5:
  /// `alg` is matched case-insensitively, the literal `"none"` is rejected outright, and
  /// any value outside `{HS256, RS256, ES256}` is rejected as unsupported.
  pub fn from_object(object: &JsonObject) -> Result<Self> {
    let alg_str = object
      .get("alg")
      .and_then(|v| v.as_str())
      .ok_or_else(|| Error::DeserializationError("JWT header is missing \"alg\"".to_string()))?;

    let alg = JwsAlgorithm::parse(alg_str)?;

    let kid = match object.get("kid") {
      Some(value) => {
        let kid = value
          .as_str()
          .ok_or_else(|| Error::DeserializationError("\"kid\" must be a string".to_string()))?;
        validate_kid(kid)?;
        Some(kid.to_string())
      }
      None => None,
    };

    let typ = object.get("typ").and_then(|v| v.as_str()).map(ToOwned::to_owned);

    Ok(Self { typ, alg, kid })
  }

  /// Renders this header as a JSON object, as `encode` would build it.
  pub fn to_object(&self) -> JsonObject {
    let mut object = JsonObject::new();
    object.insert("typ".to_string(), self.typ.clone().unwrap_or_else(|| "JWT".to_string()).into());
    object.insert("alg".to_string(), self.alg.as_str().into());
    if let Some(kid) = &self.kid {
      object.insert("kid".to_string(), kid.clone().into());
    }
    object
  }
}
