// Copyright 2020-2023 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

use sha2::Digest;
use sha2::Sha256;
use sha2::Sha384;
use sha2::Sha512;

use crate::base64url;
use crate::Error;
use crate::Result;

/// The hash algorithms the `_sd_alg` claim may name.
///
/// See [Hash Function Claim](https://www.ietf.org/archive/id/draft-ietf-oauth-selective-disclosure-jwt-06.html#name-hash-function-claim).
/// Implementations are expected only for algorithms listed in the IANA "Named
/// Information Hash Algorithm" registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum HashAlgorithm {
  Sha256,
  Sha384,
  Sha512,
}

impl HashAlgorithm {
  pub const SHA256_NAME: &'static str = "sha-256";
  pub const SHA384_NAME: &'static str = "sha-384";
  pub const SHA512_NAME: &'static str = "sha-512";

  /// Returns the IANA "Hash Name String" for this algorithm.
  pub fn alg_name(&self) -> &'static str {
    match self {
      HashAlgorithm::Sha256 => Self::SHA256_NAME,
      HashAlgorithm::Sha384 => Self::SHA384_NAME,
      HashAlgorithm::Sha512 => Self::SHA512_NAME,
    }
  }

  /// Parses an IANA hash name, matching case-insensitively.
  ///
  /// ## Error
  /// [`Error::UnsupportedAlgorithm`] if `name` names anything outside
  /// `{sha-256, sha-384, sha-512}`.
  pub fn parse(name: &str) -> Result<Self> {
    if name.eq_ignore_ascii_case(Self::SHA256_NAME) {
      Ok(HashAlgorithm::Sha256)
    } else if name.eq_ignore_ascii_case(Self::SHA384_NAME) {
      Ok(HashAlgorithm::Sha384)
    } else if name.eq_ignore_ascii_case(Self::SHA512_NAME) {
      Ok(HashAlgorithm::Sha512)
    } else {
      Err(Error::UnsupportedAlgorithm(name.to_string()))
    }
  }

  /// The digest output size in bytes.
  pub fn output_len(&self) -> usize {
    match self {
      HashAlgorithm::Sha256 => 32,
      HashAlgorithm::Sha384 => 48,
      HashAlgorithm::Sha512 => 64,
    }
  }

  /// Digests `input` to produce a unique fixed-size hash value in bytes.
  pub fn digest(&self, input: &[u8]) -> Vec<u8> {
    match self {
      HashAlgorithm::Sha256 => Sha256::digest(input).to_vec(),
      HashAlgorithm::Sha384 => Sha384::digest(input).to_vec(),
      HashAlgorithm::Sha512 => Sha512::digest(input).to_vec(),
    }
  }

  /// Returns the base64url-encoded digest of a base64url-encoded disclosure string.
  ///
  /// Per the IETF draft, "the digest MUST be taken over the US-ASCII bytes of the
  /// base64url-encoded Disclosure" — non-ASCII bytes (there should be none in valid
  /// base64url text) are filtered out defensively before hashing.
  pub fn encoded_digest(&self, disclosure: &str) -> String {
    let ascii_bytes: Vec<u8> = disclosure.bytes().filter(|&byte| byte <= 127).collect();
    base64url::encode(self.digest(&ascii_bytes))
  }
}

impl Default for HashAlgorithm {
  fn default() -> Self {
    HashAlgorithm::Sha256
  }
}

// Test values taken from https://www.ietf.org/archive/id/draft-ietf-oauth-selective-disclosure-jwt-05.html#name-hashing-disclosures
#[cfg(test)]
mod test {
  use super::HashAlgorithm;

  #[test]
  fn test1() {
    let disclosure = "WyI2cU1RdlJMNWhhaiIsICJmYW1pbHlfbmFtZSIsICJNw7ZiaXVzIl0";
    let hash = HashAlgorithm::Sha256.encoded_digest(disclosure);
    assert_eq!("uutlBuYeMDyjLLTpf6Jxi7yNkEF35jdyWMn9U7b_RYY", hash);
  }

  #[test]
  fn test2() {
    let disclosure =
      "WyJlSThaV205UW5LUHBOUGVOZW5IZGhRIiwgImVtYWlsIiwgIlwidW51c3VhbCBlbWFpbCBhZGRyZXNzXCJAZXhhbXBsZS5qcCJd";
    let hash = HashAlgorithm::Sha256.encoded_digest(disclosure);
    assert_eq!("Kuet1yAa0HIQvYnOVd59hcViO9Ug6J2kSfqYRBeowvE", hash);
  }

  #[test]
  fn test3() {
    let disclosure = "WyJsa2x4RjVqTVlsR1RQVW92TU5JdkNBIiwgIkZSIl0";
    let hash = HashAlgorithm::Sha256.encoded_digest(disclosure);
    assert_eq!("w0I8EKcdCtUPkGCNUrfwVp2xEgNjtoIDlOxc9-PlOhs", hash);
  }

  #[test]
  fn parse_is_case_insensitive() {
    assert_eq!(HashAlgorithm::parse("SHA-256").unwrap(), HashAlgorithm::Sha256);
    assert_eq!(HashAlgorithm::parse("Sha-384").unwrap(), HashAlgorithm::Sha384);
  }

  #[test]
  fn parse_rejects_unknown() {
    assert!(HashAlgorithm::parse("md5").is_err());
  }

  #[test]
  fn output_lengths_match_decoded_digests() {
    for alg in [HashAlgorithm::Sha256, HashAlgorithm::Sha384, HashAlgorithm::Sha512] {
      assert_eq!(alg.digest(b"x").len(), alg.output_len());
    }
  }
}
