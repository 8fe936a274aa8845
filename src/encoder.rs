// Copyright 2020-2023 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! The nested-claim processor (§4.8): recursively rewrites an object into its
//! selectively-disclosable form, emitting one `_sd` array per nesting level.

use std::collections::BTreeMap;

use rand::Rng;
use serde_json::Map;
use serde_json::Value;

use crate::base64url;
use crate::disclosure::Disclosure;
use crate::hasher::HashAlgorithm;
use crate::json::array_digest_placeholder;
use crate::json::push_digest;
use crate::Error;
use crate::Result;

/// Hard cap on recursion depth for nested claim concealment, per §4.8/§6.
pub const MAX_NESTING_DEPTH: usize = 10;

/// Generates `len` bytes of CSPRNG salt, base64url-encoded.
pub fn gen_salt(len: usize) -> String {
  let mut rng = rand::thread_rng();
  let random_bytes: Vec<u8> = (0..len).map(|_| rng.gen()).collect();
  base64url::encode(random_bytes)
}

/// Removes `key` from `object`, producing its [`Disclosure`] and digest. Does not
/// insert the digest into `_sd` — the caller decides where that belongs.
///
/// ## Error
/// [`Error::InvalidPath`] if `key` is not present in `object`.
pub fn disclose_property(
  object: &mut Map<String, Value>,
  key: &str,
  salt_size: usize,
  hash_alg: HashAlgorithm,
) -> Result<(Disclosure, String)> {
  let value = object
    .remove(key)
    .ok_or_else(|| Error::InvalidPath(format!("{key} does not exist")))?;
  let disclosure = Disclosure::new(gen_salt(salt_size), Some(key.to_string()), value);
  let digest = hash_alg.encoded_digest(&disclosure.to_string());
  Ok((disclosure, digest))
}

/// Replaces `array[index]` with an `{"...": digest}` placeholder, producing the
/// array-element [`Disclosure`] for the value that was there.
///
/// ## Error
/// [`Error::IndexOutofBounds`] if `index` is out of range.
pub fn conceal_array_element(
  array: &mut [Value],
  index: usize,
  salt_size: usize,
  hash_alg: HashAlgorithm,
) -> Result<Disclosure> {
  let element = array.get_mut(index).ok_or(Error::IndexOutofBounds(index))?;
  let disclosure = Disclosure::new(gen_salt(salt_size), None, element.clone());
  let digest = hash_alg.encoded_digest(&disclosure.to_string());
  *element = array_digest_placeholder(&digest);
  Ok(disclosure)
}

/// Recursively conceals nested-form paths rooted at `object`.
///
/// `paths` carries, per selected nested path, the path components still to descend
/// *below* `object` — e.g. concealing `address.geo.lat` and `address.geo.lon`, once
/// the caller has already stepped into `address`, passes `[["geo", "lat"], ["geo",
/// "lon"]]`. For each distinct next component:
///   - if any path continues past it, the child object is transformed recursively
///     first (depth + 1, capped at [`MAX_NESTING_DEPTH`]), and the (now partially
///     concealed) child is left in place under its key;
///   - the component is *also* disclosed and removed in its own right only if one of
///     the grouped paths terminates exactly there — i.e. the whole key itself was
///     requested, not just something nested inside it;
///   - each digest produced this way is appended to a `_sd` array local to `object`.
///
/// An intermediate container is therefore never wrapped behind its own digest merely
/// because something nested inside it was concealed — only a path that names the
/// container directly does that. `object` gains `_sd` only if at least one disclosure
/// was generated at this level. All generated disclosures are appended, in generation
/// order, to `out_disclosures`.
pub fn conceal_nested(
  object: &mut Map<String, Value>,
  paths: &[Vec<String>],
  hash_alg: HashAlgorithm,
  salt_size: usize,
  depth: usize,
  out_disclosures: &mut Vec<Disclosure>,
) -> Result<()> {
  if depth > MAX_NESTING_DEPTH {
    return Err(Error::MaxDepthExceeded);
  }

  // Group paths by their next (second) component, preserving first-seen order.
  let mut order: Vec<&str> = Vec::new();
  let mut groups: BTreeMap<&str, Vec<&[String]>> = BTreeMap::new();
  for path in paths {
    let Some((head, _)) = path.split_first() else {
      continue;
    };
    if !groups.contains_key(head.as_str()) {
      order.push(head.as_str());
    }
    groups.entry(head.as_str()).or_default().push(path.as_slice());
  }

  let mut local_digests: Vec<String> = Vec::new();

  for key in order {
    let group_paths = &groups[key];
    let deeper: Vec<Vec<String>> = group_paths
      .iter()
      .filter_map(|p| (p.len() > 1).then(|| p[1..].to_vec()))
      .collect();
    let terminates_here = group_paths.iter().any(|p| p.len() == 1);

    if !deeper.is_empty() {
      let child = object
        .get_mut(key)
        .ok_or_else(|| Error::InvalidPath(format!("{key} does not exist")))?
        .as_object_mut()
        .ok_or_else(|| Error::InvalidPath(format!("{key} is not an object")))?;
      conceal_nested(child, &deeper, hash_alg, salt_size, depth + 1, out_disclosures)?;
    }

    if terminates_here {
      let (disclosure, digest) = disclose_property(object, key, salt_size, hash_alg)?;
      local_digests.push(digest);
      out_disclosures.push(disclosure);
    }
  }

  for digest in local_digests {
    push_digest(object, digest)?;
  }

  Ok(())
}

#[cfg(test)]
mod test {
  use super::*;
  use serde_json::json;

  #[test]
  fn conceals_single_leaf() {
    let mut object = json!({"street": "123 Main St", "city": "Boston"}).as_object().unwrap().clone();
    let mut disclosures = vec![];
    conceal_nested(
      &mut object,
      &[vec!["street".to_string()]],
      HashAlgorithm::Sha256,
      16,
      1,
      &mut disclosures,
    )
    .unwrap();
    assert!(object.get("street").is_none());
    assert_eq!(object.get("city").unwrap(), "Boston");
    assert_eq!(object.get("_sd").unwrap().as_array().unwrap().len(), 1);
    assert_eq!(disclosures.len(), 1);
  }

  #[test]
  fn conceals_two_levels_deep() {
    let mut object = json!({
      "street": "123 Main St",
      "city": "Boston",
      "geo": {"lat": 42.36, "lon": -71.06}
    })
    .as_object()
    .unwrap()
    .clone();
    let mut disclosures = vec![];
    conceal_nested(
      &mut object,
      &[vec!["geo".to_string(), "lat".to_string()], vec!["geo".to_string(), "lon".to_string()]],
      HashAlgorithm::Sha256,
      16,
      1,
      &mut disclosures,
    )
    .unwrap();
    // `geo` is only an intermediate container here — neither path names it directly,
    // so it stays in place with its own `_sd` array rather than becoming a disclosure.
    let geo = object.get("geo").unwrap().as_object().unwrap();
    assert!(geo.get("lat").is_none());
    assert!(geo.get("lon").is_none());
    assert_eq!(geo.get("_sd").unwrap().as_array().unwrap().len(), 2);
    assert_eq!(disclosures.len(), 2); // lat, lon — not geo itself
  }

  #[test]
  fn conceals_container_itself_only_when_a_path_names_it_directly() {
    let mut object = json!({"address": {"street": "123 Main St"}}).as_object().unwrap().clone();
    let mut disclosures = vec![];
    conceal_nested(
      &mut object,
      &[vec!["address".to_string()], vec!["address".to_string(), "street".to_string()]],
      HashAlgorithm::Sha256,
      16,
      1,
      &mut disclosures,
    )
    .unwrap();
    // "address" was selected both as a whole and via a nested sub-path: the nested
    // selection is processed first ("street" becomes its own disclosure inside
    // "address"), then "address" itself is wrapped as a disclosure too, since one of
    // its paths terminates there.
    assert!(object.get("address").is_none());
    assert_eq!(object.get("_sd").unwrap().as_array().unwrap().len(), 1);
    assert_eq!(disclosures.len(), 2); // street, then address
  }

  #[test]
  fn conceal_array_element_replaces_with_placeholder() {
    let mut array = vec![json!("BS"), json!("MS"), json!("PhD")];
    let disclosure = conceal_array_element(&mut array, 1, 16, HashAlgorithm::Sha256).unwrap();
    assert_eq!(disclosure.claim_value, json!("MS"));
    assert!(crate::json::as_array_digest_placeholder(&array[1]).is_some());
    assert_eq!(array[0], json!("BS"));
  }

  #[test]
  fn depth_cap_is_enforced() {
    let mut object = Map::new();
    let deep_path: Vec<String> = (0..=MAX_NESTING_DEPTH + 1).map(|i| format!("lvl{i}")).collect();
    let mut disclosures = vec![];
    let err = conceal_nested(&mut object, &[deep_path], HashAlgorithm::Sha256, 16, MAX_NESTING_DEPTH + 1, &mut disclosures)
      .unwrap_err();
    assert!(matches!(err, Error::MaxDepthExceeded));
  }
}
