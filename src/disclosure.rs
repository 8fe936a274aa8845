// Copyright 2020-2023 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

use std::fmt::Display;

use serde_json::Value;

use crate::base64url;
use crate::json::render_disclosure_array;
use crate::Error;
use crate::Result;

/// A disclosable value.
///
/// Both object properties and array elements are supported.
///
/// See: https://www.ietf.org/archive/id/draft-ietf-oauth-selective-disclosure-jwt-07.html#name-disclosures
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Disclosure {
  /// The salt value.
  pub salt: String,
  /// The claim name, present only for object-property disclosures.
  pub claim_name: Option<String>,
  /// The claim value, which can be of any JSON type.
  pub claim_value: Value,
}

impl Disclosure {
  /// Creates a new [`Disclosure`]. Use `.to_string()` for the base64url wire form.
  pub fn new(salt: String, claim_name: Option<String>, claim_value: Value) -> Self {
    Self {
      salt,
      claim_name,
      claim_value,
    }
  }

  /// Parses a base64url-encoded disclosure string.
  ///
  /// ## Error
  /// [`Error::MalformedDisclosure`] if `disclosure` does not decode to a JSON array of
  /// length 2 or 3, or if the salt/name elements are not strings.
  pub fn parse(disclosure: &str) -> Result<Self> {
    let decoded: Vec<Value> = base64url::decode(disclosure)
      .map_err(|_| Error::MalformedDisclosure(format!("not valid base64url: {disclosure}")))
      .and_then(|bytes| {
        serde_json::from_slice(&bytes)
          .map_err(|_| Error::MalformedDisclosure(format!("decoded disclosure is not a JSON array: {disclosure}")))
      })?;

    let salt = |value: Option<&Value>| -> Result<String> {
      value
        .and_then(Value::as_str)
        .map(ToOwned::to_owned)
        .ok_or_else(|| Error::MalformedDisclosure("salt must be a non-null string".to_string()))
    };

    match decoded.len() {
      2 => Ok(Self {
        salt: salt(decoded.first())?,
        claim_name: None,
        claim_value: decoded.get(1).cloned().unwrap_or(Value::Null),
      }),
      3 => Ok(Self {
        salt: salt(decoded.first())?,
        claim_name: Some(
          decoded
            .get(1)
            .and_then(Value::as_str)
            .map(ToOwned::to_owned)
            .ok_or_else(|| Error::MalformedDisclosure("claim name must be a string".to_string()))?,
        ),
        claim_value: decoded.get(2).cloned().unwrap_or(Value::Null),
      }),
      n => Err(Error::MalformedDisclosure(format!(
        "deserialized array has an invalid length of {n}"
      ))),
    }
  }

  /// Returns the claim name for object-property disclosures, `None` for array-element ones.
  pub fn name_only(&self) -> Option<&str> {
    self.claim_name.as_deref()
  }

  /// Whether this disclosure discloses an array element rather than an object property.
  pub fn is_array_element(&self) -> bool {
    self.claim_name.is_none()
  }
}

impl Display for Disclosure {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    let input = render_disclosure_array(&self.salt, self.claim_name.as_deref(), &self.claim_value);
    f.write_str(&base64url::encode(input))
  }
}
