// Copyright 2020-2023 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! Checks that every disclosure presented alongside an SD-JWT is actually committed to
//! by one of the issuer's digests (§4.16).

use subtle::ConstantTimeEq;

use crate::disclosure::Disclosure;
use crate::hasher::HashAlgorithm;

/// Compares two base64url-encoded digest strings for equality in constant time over
/// their decoded bytes.
///
/// A decode failure on either side is treated as non-equal rather than falling back to
/// ordinary string equality — a malformed digest must never compare equal to anything.
pub fn digests_equal(a: &str, b: &str) -> bool {
  let (Ok(a_bytes), Ok(b_bytes)) = (crate::base64url::decode(a), crate::base64url::decode(b)) else {
    return false;
  };
  if a_bytes.len() != b_bytes.len() {
    return false;
  }
  a_bytes.ct_eq(&b_bytes).into()
}

/// Whether `computed` appears among `expected_digests`.
///
/// Each candidate is compared in constant time; linear scan order still leaks via
/// timing which position (if any) matched, which the digests themselves don't need to
/// hide since they're public values carried in the unsigned payload.
pub fn is_committed(computed: &str, expected_digests: &[String]) -> bool {
  expected_digests.iter().any(|expected| digests_equal(computed, expected))
}

/// Verifies that every disclosure in `disclosures` is committed to by a digest in
/// `expected_digests`, recomputing each disclosure's digest under `hash_alg`.
///
/// ## Error
/// [`crate::Error::DigestMismatch`] on the first disclosure whose digest is not found.
pub fn validate_disclosures(disclosures: &[Disclosure], expected_digests: &[String], hash_alg: HashAlgorithm) -> crate::Result<()> {
  for disclosure in disclosures {
    let computed = hash_alg.encoded_digest(&disclosure.to_string());
    if !is_committed(&computed, expected_digests) {
      return Err(crate::Error::DigestMismatch);
    }
  }
  Ok(())
}

#[cfg(test)]
mod test {
  use super::*;
  use serde_json::json;

  #[test]
  fn identical_digests_are_equal() {
    let disclosure = Disclosure::new("salt".to_string(), Some("id".to_string()), json!("value"));
    let digest = HashAlgorithm::Sha256.encoded_digest(&disclosure.to_string());
    assert!(digests_equal(&digest, &digest));
  }

  #[test]
  fn different_digests_are_not_equal() {
    assert!(!digests_equal(
      &HashAlgorithm::Sha256.encoded_digest("a"),
      &HashAlgorithm::Sha256.encoded_digest("b")
    ));
  }

  #[test]
  fn malformed_digest_never_matches() {
    assert!(!digests_equal("not base64url!!!", "not base64url!!!"));
  }

  #[test]
  fn validate_disclosures_detects_mismatch() {
    let disclosure = Disclosure::new("salt".to_string(), Some("id".to_string()), json!("value"));
    let err = validate_disclosures(&[disclosure], &["bogus".to_string()], HashAlgorithm::Sha256).unwrap_err();
    assert!(matches!(err, crate::Error::DigestMismatch));
  }

  #[test]
  fn validate_disclosures_accepts_committed_set() {
    let disclosure = Disclosure::new("salt".to_string(), Some("id".to_string()), json!("value"));
    let digest = HashAlgorithm::Sha256.encoded_digest(&disclosure.to_string());
    validate_disclosures(&[disclosure], &[digest], HashAlgorithm::Sha256).unwrap();
  }
}
