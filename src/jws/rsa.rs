// Copyright 2020-2023 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

use rsa::pkcs1v15::Pkcs1v15Sign;
use rsa::RsaPrivateKey;
use rsa::RsaPublicKey;
use sha2::Digest;
use sha2::Sha256;

use crate::Error;
use crate::Result;

use super::JwsAlgorithm;
use super::Signer;

/// Minimum RSA modulus size required by §4.5/§6.
pub const MIN_MODULUS_BITS: usize = 2048;

/// An RS256 [`Signer`]: RSASSA-PKCS1-v1_5 with SHA-256.
pub struct RsaSigner {
  key: RsaPrivateKey,
  kid: Option<String>,
}

impl RsaSigner {
  /// ## Error
  /// [`Error::Unspecified`] if the key's modulus is smaller than [`MIN_MODULUS_BITS`].
  pub fn new(key: RsaPrivateKey) -> Result<Self> {
    use rsa::traits::PublicKeyParts;
    if key.n().bits() < MIN_MODULUS_BITS {
      return Err(Error::Unspecified(format!(
        "RSA modulus must be at least {MIN_MODULUS_BITS} bits"
      )));
    }
    Ok(Self { key, kid: None })
  }

  pub fn with_kid(key: RsaPrivateKey, kid: impl Into<String>) -> Result<Self> {
    let mut signer = Self::new(key)?;
    signer.kid = Some(kid.into());
    Ok(signer)
  }
}

impl Signer for RsaSigner {
  fn algorithm(&self) -> JwsAlgorithm {
    JwsAlgorithm::Rs256
  }

  fn key_id(&self) -> Option<&str> {
    self.kid.as_deref()
  }

  fn sign(&self, signing_input: &[u8]) -> Result<Vec<u8>> {
    let hashed = Sha256::digest(signing_input);
    self
      .key
      .sign(Pkcs1v15Sign::new::<Sha256>(), &hashed)
      .map_err(|e| Error::JwsSignerFailure(format!("RSA signing failed: {e}")))
  }
}

/// Verifies an RS256 signature against a public key.
pub fn verify(public_key: &RsaPublicKey, signing_input: &[u8], signature: &[u8]) -> bool {
  let hashed = Sha256::digest(signing_input);
  public_key
    .verify(Pkcs1v15Sign::new::<Sha256>(), &hashed, signature)
    .is_ok()
}
