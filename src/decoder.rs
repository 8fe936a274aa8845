// Copyright 2020-2023 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! Reconstructs a claims object by substituting digests with the plaintext values
//! carried by their disclosures (the inverse of the nested-claim processor).

use std::collections::BTreeMap;

use serde_json::Map;
use serde_json::Value;

use crate::disclosure::Disclosure;
use crate::hasher::HashAlgorithm;
use crate::json::ARRAY_DIGEST_KEY;
use crate::json::DIGESTS_KEY;
use crate::json::SD_ALG;
use crate::Error;
use crate::Result;

/// Hard cap on recursion depth while walking `_sd`/array placeholders, mirroring the
/// nested-claim processor's own ceiling.
pub const MAX_NESTING_DEPTH: usize = 10;

/// Recomputes the digest→[`Disclosure`] map for `disclosures` under `hash_alg`.
pub fn digest_map(disclosures: &[Disclosure], hash_alg: HashAlgorithm) -> BTreeMap<String, Disclosure> {
  disclosures
    .iter()
    .map(|disclosure| (hash_alg.encoded_digest(&disclosure.to_string()), disclosure.clone()))
    .collect()
}

/// Reconstructs `object` by substituting every digest it references with its
/// disclosed value, recursively.
///
/// ## Error
/// - [`Error::DuplicateDigestError`] if the same digest is referenced more than once.
/// - [`Error::ClaimCollisionError`] if a disclosed claim name already exists plaintext
///   in its parent object.
/// - [`Error::UnusedDisclosures`] if `disclosures` contains entries never referenced.
/// - [`Error::MaxDepthExceeded`] if nesting exceeds [`MAX_NESTING_DEPTH`].
///
/// On success, `_sd_alg` is stripped from the result (it is issuer metadata, not a
/// disclosed claim).
pub fn decode(object: &Map<String, Value>, disclosures: &[Disclosure], hash_alg: HashAlgorithm) -> Result<Map<String, Value>> {
  let disclosures_map = digest_map(disclosures, hash_alg);
  let mut processed_digests: Vec<String> = vec![];

  let mut decoded = decode_object(object, &disclosures_map, &mut processed_digests, 0)?;

  if processed_digests.len() != disclosures.len() {
    return Err(Error::UnusedDisclosures(disclosures.len().saturating_sub(processed_digests.len())));
  }

  decoded.remove(SD_ALG);
  Ok(decoded)
}

fn decode_object(
  object: &Map<String, Value>,
  disclosures: &BTreeMap<String, Disclosure>,
  processed_digests: &mut Vec<String>,
  depth: usize,
) -> Result<Map<String, Value>> {
  if depth > MAX_NESTING_DEPTH {
    return Err(Error::MaxDepthExceeded);
  }

  let mut output: Map<String, Value> = object.clone();
  for (key, value) in object.iter() {
    if key == DIGESTS_KEY {
      let sd_array = value
        .as_array()
        .ok_or_else(|| Error::DataTypeMismatch(format!("{DIGESTS_KEY} is not an array")))?;
      for digest in sd_array {
        let digest_str = digest
          .as_str()
          .ok_or_else(|| Error::DataTypeMismatch(format!("{digest} is not a string")))?
          .to_string();

        if processed_digests.contains(&digest_str) {
          return Err(Error::DuplicateDigestError(digest_str));
        }

        if let Some(disclosure) = disclosures.get(&digest_str) {
          let claim_name = disclosure
            .claim_name
            .clone()
            .ok_or_else(|| Error::DataTypeMismatch(format!("disclosure type error: {disclosure}")))?;

          if output.contains_key(&claim_name) {
            return Err(Error::ClaimCollisionError(claim_name));
          }
          processed_digests.push(digest_str.clone());

          let recursively_decoded = match disclosure.claim_value {
            Value::Array(ref sub_arr) => Value::Array(decode_array(sub_arr, disclosures, processed_digests, depth + 1)?),
            Value::Object(ref sub_obj) => Value::Object(decode_object(sub_obj, disclosures, processed_digests, depth + 1)?),
            _ => disclosure.claim_value.clone(),
          };

          output.insert(claim_name, recursively_decoded);
        }
      }
      output.remove(DIGESTS_KEY);
      continue;
    }

    match value {
      Value::Object(object) => {
        let decoded_object = decode_object(object, disclosures, processed_digests, depth + 1)?;
        output.insert(key.to_string(), Value::Object(decoded_object));
      }
      Value::Array(array) => {
        let decoded_array = decode_array(array, disclosures, processed_digests, depth + 1)?;
        output.insert(key.to_string(), Value::Array(decoded_array));
      }
      _ => {}
    }
  }
  Ok(output)
}

fn decode_array(
  array: &[Value],
  disclosures: &BTreeMap<String, Disclosure>,
  processed_digests: &mut Vec<String>,
  depth: usize,
) -> Result<Vec<Value>> {
  if depth > MAX_NESTING_DEPTH {
    return Err(Error::MaxDepthExceeded);
  }

  let mut output: Vec<Value> = vec![];
  for value in array.iter() {
    if let Some(digest_in_array) = value.as_object().and_then(|object| {
      if object.len() == 1 {
        object.get(ARRAY_DIGEST_KEY).and_then(Value::as_str)
      } else {
        None
      }
    }) {
      let digest_in_array = digest_in_array.to_string();
      if processed_digests.contains(&digest_in_array) {
        return Err(Error::DuplicateDigestError(digest_in_array));
      }
      if let Some(disclosure) = disclosures.get(&digest_in_array) {
        if disclosure.claim_name.is_some() {
          return Err(Error::InvalidDisclosure("array entry disclosure must have no claim name".to_string()));
        }
        processed_digests.push(digest_in_array.clone());
        let recursively_decoded = match disclosure.claim_value {
          Value::Array(ref sub_arr) => Value::Array(decode_array(sub_arr, disclosures, processed_digests, depth + 1)?),
          Value::Object(ref sub_obj) => Value::Object(decode_object(sub_obj, disclosures, processed_digests, depth + 1)?),
          _ => disclosure.claim_value.clone(),
        };
        output.push(recursively_decoded);
      }
      // Digest with no matching disclosure: the element stays concealed, simply omitted.
    } else if let Some(object) = value.as_object() {
      output.push(Value::Object(decode_object(object, disclosures, processed_digests, depth + 1)?));
    } else if let Some(arr) = value.as_array() {
      output.push(Value::Array(decode_array(arr, disclosures, processed_digests, depth + 1)?));
    } else {
      output.push(value.clone());
    }
  }

  Ok(output)
}
