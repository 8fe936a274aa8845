// Copyright 2020-2023 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

use serde_json::Map;
use serde_json::Value;

pub(crate) const DIGESTS_KEY: &str = "_sd";
pub(crate) const ARRAY_DIGEST_KEY: &str = "...";
pub(crate) const SD_ALG: &str = "_sd_alg";

/// The concrete JSON object type used at the library's public boundary.
pub type JsonObject = Map<String, Value>;

/// Builds the reserved `{"...": <digest>}` array-element placeholder.
pub fn array_digest_placeholder(digest: &str) -> Value {
  serde_json::json!({ ARRAY_DIGEST_KEY: digest })
}

/// Returns the digest carried by an `{"...": <digest>}` placeholder, if `value` is one.
///
/// A placeholder is an object with exactly one key, `"..."`, whose value is a string.
pub fn as_array_digest_placeholder(value: &Value) -> Option<&str> {
  let object = value.as_object()?;
  if object.len() != 1 {
    return None;
  }
  object.get(ARRAY_DIGEST_KEY)?.as_str()
}

/// Renders a disclosure's `[salt, name?, value]` form as canonical JSON text.
///
/// The digest is computed over the base64url-encoding of exactly this text, so the
/// format is fixed for the life of the library: a comma-space separated array,
/// matching `serde_json`'s own `Display` rendering of each element. `salt` and
/// `claim_name` are run through `serde_json`'s own string escaping before being
/// interpolated — a claim name containing a quote or backslash must not be able to
/// produce a malformed array or shift where `claim_value` begins.
pub fn render_disclosure_array(salt: &str, claim_name: Option<&str>, claim_value: &Value) -> String {
  let salt = Value::String(salt.to_string());
  if let Some(name) = claim_name {
    let name = Value::String(name.to_string());
    format!("[{salt}, {name}, {claim_value}]")
  } else {
    format!("[{salt}, {claim_value}]")
  }
}

/// Adds `digest` to the object's `_sd` array, creating it if absent.
pub(crate) fn push_digest(object: &mut Map<String, Value>, digest: String) -> crate::Result<()> {
  match object.get_mut(DIGESTS_KEY) {
    Some(Value::Array(existing)) => {
      existing.push(Value::String(digest));
      Ok(())
    }
    Some(_) => Err(crate::Error::DataTypeMismatch(
      "invalid object: existing `_sd` type is not an array".to_string(),
    )),
    None => {
      object.insert(DIGESTS_KEY.to_owned(), Value::Array(vec![Value::String(digest)]));
      Ok(())
    }
  }
}

#[cfg(test)]
mod test {
  use super::*;

  #[test]
  fn placeholder_round_trip() {
    let placeholder = array_digest_placeholder("abc123");
    assert_eq!(as_array_digest_placeholder(&placeholder), Some("abc123"));
  }

  #[test]
  fn non_placeholder_objects_are_rejected() {
    let value = serde_json::json!({"...": "abc", "extra": 1});
    assert_eq!(as_array_digest_placeholder(&value), None);
  }

  #[test]
  fn disclosure_array_rendering() {
    let value = Value::String("US".to_string());
    assert_eq!(
      render_disclosure_array("lklxF5jMYlGTPUovMNIvCA", None, &value),
      "[\"lklxF5jMYlGTPUovMNIvCA\", \"US\"]"
    );
  }

  #[test]
  fn escapes_quotes_and_backslashes_in_salt_and_claim_name() {
    let value = Value::String("v".to_string());
    let rendered = render_disclosure_array("sa\"lt\\x", Some("na\"me"), &value);
    let parsed: Vec<Value> = serde_json::from_str(&rendered).unwrap();
    assert_eq!(parsed, vec![Value::String("sa\"lt\\x".to_string()), Value::String("na\"me".to_string()), value]);
  }
}
