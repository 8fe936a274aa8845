// Copyright 2020-2023 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

use hmac::Hmac;
use hmac::Mac;
use sha2::Sha256;

use crate::Error;
use crate::Result;

use super::JwsAlgorithm;
use super::Signer;

type HmacSha256 = Hmac<Sha256>;

/// An HS256 [`Signer`] over a raw symmetric key.
///
/// Per §6, the key should be at least 16 bytes; this is advisory (recommended, not
/// enforced) to match the spec's own phrasing.
pub struct HmacSigner {
  key: Vec<u8>,
  kid: Option<String>,
}

impl HmacSigner {
  pub fn new(key: Vec<u8>) -> Self {
    Self { key, kid: None }
  }

  pub fn with_kid(key: Vec<u8>, kid: impl Into<String>) -> Self {
    Self { key, kid: Some(kid.into()) }
  }
}

impl Signer for HmacSigner {
  fn algorithm(&self) -> JwsAlgorithm {
    JwsAlgorithm::Hs256
  }

  fn key_id(&self) -> Option<&str> {
    self.kid.as_deref()
  }

  fn sign(&self, signing_input: &[u8]) -> Result<Vec<u8>> {
    let mut mac =
      HmacSha256::new_from_slice(&self.key).map_err(|e| Error::JwsSignerFailure(format!("invalid HMAC key: {e}")))?;
    mac.update(signing_input);
    Ok(mac.finalize().into_bytes().to_vec())
  }
}

/// Verifies an HS256 signature. `hmac`'s `verify_slice` compares in constant time.
pub fn verify(key: &[u8], signing_input: &[u8], signature: &[u8]) -> bool {
  let Ok(mut mac) = HmacSha256::new_from_slice(key) else {
    return false;
  };
  mac.update(signing_input);
  mac.verify_slice(signature).is_ok()
}

#[cfg(test)]
mod test {
  use super::*;

  #[test]
  fn sign_then_verify() {
    let key = vec![1u8; 32];
    let signer = HmacSigner::new(key.clone());
    let sig = signer.sign(b"header.payload").unwrap();
    assert!(verify(&key, b"header.payload", &sig));
  }

  #[test]
  fn wrong_key_fails() {
    let signer = HmacSigner::new(vec![1u8; 32]);
    let sig = signer.sign(b"header.payload").unwrap();
    assert!(!verify(&[2u8; 32], b"header.payload", &sig));
  }
}
