// Copyright 2020-2023 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! Maps a [`ClaimPath`] to the digest(s) of the disclosure(s) it denotes, for the
//! holder-side "reveal less than everything I received" operation (§4.11/§4.12).

use std::collections::HashMap;

use serde_json::Value;

use crate::claim_path::ClaimPath;
use crate::disclosure::Disclosure;
use crate::json::JsonObject;
use crate::Error;
use crate::Result;

/// Finds the digest, among `object`'s `_sd` array (or `object` itself if it is an
/// array-element placeholder), whose disclosure's claim name matches `key`. Pass an
/// empty `key` to match an array-element disclosure (which carries no claim name).
pub fn find_disclosure(object: &JsonObject, key: &str, disclosures: &HashMap<String, Disclosure>) -> Option<String> {
  if let Some(digest) = crate::json::as_array_digest_placeholder(&Value::Object(object.clone())) {
    if key.is_empty() {
      return Some(digest.to_string());
    }
  }

  object
    .get(crate::json::DIGESTS_KEY)
    .and_then(Value::as_array)
    .into_iter()
    .flatten()
    .filter_map(Value::as_str)
    .find(|digest| {
      disclosures
        .get(*digest)
        .and_then(|disclosure| disclosure.claim_name.as_deref())
        .is_some_and(|name| name == key)
    })
    .map(ToOwned::to_owned)
}

/// Collects the digests of every disclosure nested (directly or transitively) within
/// `start`, which is itself already the *disclosed* value of some other disclosure.
pub fn get_all_sub_disclosures(start: &Value, disclosures: &HashMap<String, Disclosure>) -> Vec<String> {
  match start {
    Value::Object(object) => {
      let mut digests: Vec<String> = object
        .get(crate::json::DIGESTS_KEY)
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(Value::as_str)
        .filter(|digest| disclosures.contains_key(*digest))
        .map(ToOwned::to_owned)
        .collect();
      for value in object.values() {
        digests.extend(get_all_sub_disclosures(value, disclosures));
      }
      digests
    }
    Value::Array(array) => {
      let mut digests = vec![];
      for value in array {
        if let Some(digest) = crate::json::as_array_digest_placeholder(value) {
          if disclosures.contains_key(digest) {
            digests.push(digest.to_string());
          }
        } else {
          digests.extend(get_all_sub_disclosures(value, disclosures));
        }
      }
      digests
    }
    _ => vec![],
  }
}

/// Resolves `path` against `object` to the full set of digests that must be dropped
/// to conceal the value it denotes: the value's own digest, plus every digest nested
/// within it (since once a parent is concealed, its children can no longer be
/// independently disclosed).
///
/// ## Error
/// [`Error::InvalidPath`] if `path` does not resolve to a disclosable value in `object`.
pub fn resolve_disclosure_digests(
  object: &Value,
  path: &ClaimPath,
  disclosures: &HashMap<String, Disclosure>,
) -> Result<Vec<String>> {
  walk(object, path.components(), path.index(), disclosures)
}

fn walk(
  object: &Value,
  components: &[String],
  index: Option<usize>,
  disclosures: &HashMap<String, Disclosure>,
) -> Result<Vec<String>> {
  let (head, rest) = components
    .split_first()
    .ok_or_else(|| Error::InvalidPath("path must not be empty".to_string()))?;
  let has_next = !rest.is_empty();

  let invalid = || Error::InvalidPath(format!("{head} does not exist or is not concealable"));

  match object {
    Value::Object(map) if has_next => {
      let next = resolve_property(map, head, disclosures).ok_or_else(invalid)?;
      walk(next, rest, index, disclosures)
    }
    Value::Object(map) => match index {
      None => {
        let digest = find_disclosure(map, head, disclosures).ok_or_else(invalid)?;
        Ok(bundle(&digest, disclosures))
      }
      Some(idx) => {
        let array_value = resolve_property(map, head, disclosures).ok_or_else(invalid)?;
        let array = array_value
          .as_array()
          .ok_or_else(|| Error::InvalidPath(format!("{head} is not an array")))?;
        let entry = array.get(idx).ok_or(Error::IndexOutofBounds(idx))?;
        let digest = entry
          .as_object()
          .and_then(|entry_obj| find_disclosure(entry_obj, "", disclosures))
          .ok_or_else(|| Error::InvalidPath("array element is not concealable".to_string()))?;
        Ok(bundle(&digest, disclosures))
      }
    },
    _ => Err(invalid()),
  }
}

fn resolve_property<'o>(map: &'o JsonObject, key: &str, disclosures: &HashMap<String, Disclosure>) -> Option<&'o Value> {
  map.get(key).or_else(|| {
    find_disclosure(map, key, disclosures)
      .and_then(|digest| disclosures.get(&digest))
      .map(|disclosure| &disclosure.claim_value)
  })
}

fn bundle(digest: &str, disclosures: &HashMap<String, Disclosure>) -> Vec<String> {
  let disclosure = &disclosures[digest];
  let mut digests = get_all_sub_disclosures(&disclosure.claim_value, disclosures);
  digests.push(digest.to_string());
  digests
}
