// Copyright 2020-2023 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

use p256::ecdsa::signature::Signer as _;
use p256::ecdsa::signature::Verifier as _;
use p256::ecdsa::Signature;
use p256::ecdsa::SigningKey;
use p256::ecdsa::VerifyingKey;

use crate::Error;
use crate::Result;

use super::JwsAlgorithm;
use super::Signer;

/// An ES256 [`Signer`]: ECDSA over NIST P-256 with SHA-256.
pub struct EcdsaSigner {
  key: SigningKey,
  kid: Option<String>,
}

impl EcdsaSigner {
  pub fn new(key: SigningKey) -> Self {
    Self { key, kid: None }
  }

  pub fn with_kid(key: SigningKey, kid: impl Into<String>) -> Self {
    Self { key, kid: Some(kid.into()) }
  }
}

impl Signer for EcdsaSigner {
  fn algorithm(&self) -> JwsAlgorithm {
    JwsAlgorithm::Es256
  }

  fn key_id(&self) -> Option<&str> {
    self.kid.as_deref()
  }

  fn sign(&self, signing_input: &[u8]) -> Result<Vec<u8>> {
    let signature: Signature = self
      .key
      .try_sign(signing_input)
      .map_err(|e| Error::JwsSignerFailure(format!("ECDSA signing failed: {e}")))?;
    Ok(signature.to_bytes().to_vec())
  }
}

/// Verifies an ES256 signature. `signature` must be the fixed-size `r || s` encoding
/// JWS uses (64 bytes for P-256), not DER.
pub fn verify(public_key: &VerifyingKey, signing_input: &[u8], signature: &[u8]) -> bool {
  let Ok(signature) = Signature::from_slice(signature) else {
    return false;
  };
  public_key.verify(signing_input, &signature).is_ok()
}

#[cfg(test)]
mod test {
  use super::*;

  #[test]
  fn sign_then_verify() {
    let signing_key = SigningKey::from_slice(&[3u8; 32]).unwrap();
    let verifying_key = VerifyingKey::from(&signing_key);
    let signer = EcdsaSigner::new(signing_key);
    let sig = signer.sign(b"header.payload").unwrap();
    assert!(verify(&verifying_key, b"header.payload", &sig));
  }

  #[test]
  fn wrong_key_fails() {
    let signing_key = SigningKey::from_slice(&[3u8; 32]).unwrap();
    let other_key = SigningKey::from_slice(&[4u8; 32]).unwrap();
    let signer = EcdsaSigner::new(signing_key);
    let sig = signer.sign(b"header.payload").unwrap();
    assert!(!verify(&VerifyingKey::from(&other_key), b"header.payload", &sig));
  }
}
