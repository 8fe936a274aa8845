// Copyright 2020-2023 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! The Issuer (§4.10): turns a claims object plus a set of selective-disclosure paths
//! into a signed [`SdJwt`].

use std::collections::BTreeMap;

use serde_json::Value;

use crate::claim_path::ClaimPath;
use crate::decoy;
use crate::encoder;
use crate::hasher::HashAlgorithm;
use crate::json::JsonObject;
use crate::jws;
use crate::jws::Signer;
use crate::jwk;
use crate::sd_jwt::SdJwt;
use crate::Error;
use crate::Result;

/// Claim names that can never be made selectively disclosable, nor carried as the
/// literal key `_sd_alg` anywhere in the claims tree (§6).
pub const RESERVED_CLAIMS: &[&str] = &["iss", "aud", "exp", "nbf", "cnf", "iat", "sub", "jti", "_sd", "_sd_alg"];

/// Minimum salt length, in bytes, per §6.
pub const DEFAULT_SALT_SIZE: usize = 16;

/// Builds an SD-JWT from a claims object and a set of selective-disclosure paths.
///
/// Every `make_concealable`/`add_decoys`/`require_key_binding` call is deferred until
/// [`Issuer::issue`], which runs the 9-step algorithm of §4.10 atomically: any
/// validation failure leaves no partial artifact.
pub struct Issuer {
  claims: JsonObject,
  hash_alg: HashAlgorithm,
  salt_size: usize,
  paths: Vec<ClaimPath>,
  decoy_count: usize,
  holder_public_key_spki: Option<Vec<u8>>,
}

impl Issuer {
  pub fn new(claims: JsonObject) -> Self {
    Self {
      claims,
      hash_alg: HashAlgorithm::default(),
      salt_size: DEFAULT_SALT_SIZE,
      paths: vec![],
      decoy_count: 0,
      holder_public_key_spki: None,
    }
  }

  pub fn with_hash_algorithm(mut self, alg: HashAlgorithm) -> Self {
    self.hash_alg = alg;
    self
  }

  /// ## Error
  /// [`Error::InvalidSaltSize`] if `size < 16`.
  pub fn with_salt_size(mut self, size: usize) -> Result<Self> {
    if size < DEFAULT_SALT_SIZE {
      return Err(Error::InvalidSaltSize);
    }
    self.salt_size = size;
    Ok(self)
  }

  /// Marks `path` (`"name"`, `"a.b.c"`, or `"a[i]"`) as selectively disclosable.
  ///
  /// ## Error
  /// [`Error::InvalidPath`] if `path` does not parse.
  pub fn make_concealable(mut self, path: &str) -> Result<Self> {
    self.paths.push(ClaimPath::parse(path)?);
    Ok(self)
  }

  /// Requests `count` decoy digests be interleaved into the top-level `_sd` array.
  pub fn add_decoys(mut self, count: usize) -> Self {
    self.decoy_count = count;
    self
  }

  /// Requires proof of possession of `holder_public_key_spki` (a P-256
  /// `SubjectPublicKeyInfo`), embedded as `cnf.jwk`.
  pub fn require_key_binding(mut self, holder_public_key_spki: Vec<u8>) -> Self {
    self.holder_public_key_spki = Some(holder_public_key_spki);
    self
  }

  /// Runs the issuance algorithm and signs the result.
  ///
  /// ## Error
  /// [`Error::ReservedClaim`] if a concealed path's base name is reserved, or the
  /// claims tree carries a literal `_sd_alg` key anywhere.
  /// [`Error::InvalidPath`] / [`Error::IndexOutofBounds`] for malformed concealment
  /// requests. Any [`crate::jws`] signing failure propagates unchanged.
  #[tracing::instrument(skip_all)]
  pub fn issue(self, signer: &dyn Signer) -> Result<SdJwt> {
    tracing::debug!("issuer::issue");
    let Issuer {
      mut claims,
      hash_alg,
      salt_size,
      paths,
      decoy_count,
      holder_public_key_spki,
    } = self;

    if contains_sd_alg_key(&Value::Object(claims.clone())) {
      return Err(Error::ReservedClaim("_sd_alg".to_string()));
    }

    let mut simple_paths = vec![];
    let mut nested_paths = vec![];
    let mut array_paths = vec![];
    for path in &paths {
      if path.is_array_element() {
        array_paths.push(path);
      } else if path.is_nested() {
        nested_paths.push(path);
      } else {
        simple_paths.push(path);
      }
    }

    for path in simple_paths.iter().chain(nested_paths.iter()) {
      if RESERVED_CLAIMS.contains(&path.base_name()) {
        return Err(Error::ReservedClaim(path.base_name().to_string()));
      }
    }
    for path in &array_paths {
      if RESERVED_CLAIMS.contains(&path.base_name()) {
        return Err(Error::ReservedClaim(path.base_name().to_string()));
      }
    }

    let mut disclosures = vec![];
    let mut top_level_digests = vec![];

    // Nested paths first: `conceal_nested` mutates the root object directly, removing
    // and disclosing every grouped component along the way (§4.8).
    if !nested_paths.is_empty() {
      let nested_components: Vec<Vec<String>> = nested_paths.iter().map(|p| p.components().to_vec()).collect();
      encoder::conceal_nested(&mut claims, &nested_components, hash_alg, salt_size, 1, &mut disclosures)?;
    }

    for path in &simple_paths {
      let (disclosure, digest) = encoder::disclose_property(&mut claims, path.base_name(), salt_size, hash_alg)?;
      disclosures.push(disclosure);
      top_level_digests.push(digest);
    }

    if decoy_count > 0 {
      let decoys = decoy::generate(decoy_count, hash_alg);
      top_level_digests = decoy::interleave(top_level_digests, decoys);
    }

    // Group array-element paths by base name, preserving first-seen order.
    let mut order: Vec<&str> = vec![];
    let mut groups: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for path in &array_paths {
      let base = path.base_name();
      let index = path.index().expect("array_paths is_array_element() == true");
      if !groups.contains_key(base) {
        order.push(base);
      }
      groups.entry(base).or_default().push(index);
    }
    for base in order {
      let array = claims
        .get_mut(base)
        .ok_or_else(|| Error::InvalidPath(format!("{base} does not exist")))?
        .as_array_mut()
        .ok_or_else(|| Error::InvalidPath(format!("{base} is not an array")))?;
      for index in &groups[base] {
        let disclosure = encoder::conceal_array_element(array, *index, salt_size, hash_alg)?;
        disclosures.push(disclosure);
      }
    }

    for digest in top_level_digests {
      crate::json::push_digest(&mut claims, digest)?;
    }

    claims.insert("_sd_alg".to_string(), hash_alg.alg_name().into());

    if let Some(spki) = &holder_public_key_spki {
      let holder_jwk = jwk::to_jwk(spki)?;
      let mut cnf = JsonObject::new();
      cnf.insert("jwk".to_string(), Value::Object(holder_jwk));
      claims.insert("cnf".to_string(), Value::Object(cnf));
    }

    let jwt = jws::encode(None, &claims, signer)?;
    Ok(SdJwt::new(jwt, disclosures, hash_alg))
  }
}

fn contains_sd_alg_key(value: &Value) -> bool {
  match value {
    Value::Object(object) => object.iter().any(|(key, value)| key == "_sd_alg" || contains_sd_alg_key(value)),
    Value::Array(array) => array.iter().any(contains_sd_alg_key),
    _ => false,
  }
}

#[cfg(test)]
mod test {
  use super::*;
  use crate::jws::HmacSigner;
  use crate::jws::MapKeyResolver;
  use crate::jws::VerifyingKeyMaterial;
  use serde_json::json;

  fn hmac_key() -> Vec<u8> {
    vec![0x5au8; 32]
  }

  #[test]
  fn issues_a_simple_sd_jwt() {
    let claims = json!({"iss": "https://issuer.example", "sub": "user-42", "name": "Alice"})
      .as_object()
      .unwrap()
      .clone();
    let signer = HmacSigner::new(hmac_key());

    let sd_jwt = Issuer::new(claims).make_concealable("name").unwrap().issue(&signer).unwrap();

    assert_eq!(sd_jwt.disclosures().len(), 1);
    let resolver = MapKeyResolver::new().with_fallback(VerifyingKeyMaterial::Hmac(hmac_key()));
    let (_, payload) = jws::decode(sd_jwt.jwt(), &resolver).unwrap();
    assert!(payload.get("name").is_none());
    assert_eq!(payload.get("_sd_alg").unwrap(), "sha-256");
  }

  #[test]
  fn rejects_reserved_claim_names() {
    let claims = json!({"sub": "user-42"}).as_object().unwrap().clone();
    let err = Issuer::new(claims).make_concealable("sub").unwrap().issue(&HmacSigner::new(hmac_key()));
    assert!(matches!(err.unwrap_err(), Error::ReservedClaim(_)));
  }

  #[test]
  fn rejects_preexisting_sd_alg_key() {
    let claims = json!({"_sd_alg": "sha-512"}).as_object().unwrap().clone();
    let err = Issuer::new(claims).issue(&HmacSigner::new(hmac_key()));
    assert!(matches!(err.unwrap_err(), Error::ReservedClaim(_)));
  }

  #[test]
  fn conceals_array_elements() {
    let claims = json!({"degrees": ["BS", "MS", "PhD"]}).as_object().unwrap().clone();
    let signer = HmacSigner::new(hmac_key());
    let sd_jwt = Issuer::new(claims)
      .make_concealable("degrees[1]")
      .unwrap()
      .issue(&signer)
      .unwrap();

    assert_eq!(sd_jwt.disclosures().len(), 1);
    assert!(sd_jwt.disclosures()[0].is_array_element());
  }

  #[test]
  fn out_of_bounds_array_index_is_rejected() {
    let claims = json!({"degrees": ["BS"]}).as_object().unwrap().clone();
    let err = Issuer::new(claims)
      .make_concealable("degrees[5]")
      .unwrap()
      .issue(&HmacSigner::new(hmac_key()));
    assert!(matches!(err.unwrap_err(), Error::IndexOutofBounds(5)));
  }

  #[test]
  fn conceals_nested_claims() {
    let claims = json!({"address": {"street": "123 Main St", "city": "Boston"}})
      .as_object()
      .unwrap()
      .clone();
    let signer = HmacSigner::new(hmac_key());
    let sd_jwt = Issuer::new(claims)
      .make_concealable("address.street")
      .unwrap()
      .issue(&signer)
      .unwrap();

    // Only "street" becomes a disclosure; "address" stays a plain, directly-visible
    // object with "city" in the clear and "street"'s digest in its own `_sd`.
    assert_eq!(sd_jwt.disclosures().len(), 1);
    let resolver = MapKeyResolver::new().with_fallback(VerifyingKeyMaterial::Hmac(hmac_key()));
    let (_, payload) = jws::decode(sd_jwt.jwt(), &resolver).unwrap();
    let address = payload.get("address").unwrap().as_object().unwrap();
    assert_eq!(address.get("city").unwrap(), "Boston");
    assert!(address.get("street").is_none());
    assert_eq!(address.get("_sd").unwrap().as_array().unwrap().len(), 1);
  }

  #[test]
  fn decoys_do_not_produce_disclosures() {
    let claims = json!({"name": "Alice"}).as_object().unwrap().clone();
    let signer = HmacSigner::new(hmac_key());
    let sd_jwt = Issuer::new(claims)
      .make_concealable("name")
      .unwrap()
      .add_decoys(5)
      .issue(&signer)
      .unwrap();

    assert_eq!(sd_jwt.disclosures().len(), 1);
    let resolver = MapKeyResolver::new().with_fallback(VerifyingKeyMaterial::Hmac(hmac_key()));
    let (_, payload) = jws::decode(sd_jwt.jwt(), &resolver).unwrap();
    assert_eq!(payload.get("_sd").unwrap().as_array().unwrap().len(), 6);
  }

  #[test]
  fn embeds_holder_confirmation_key() {
    use p256::ecdsa::SigningKey;
    use p256::ecdsa::VerifyingKey;

    let holder_key = SigningKey::from_slice(&[8u8; 32]).unwrap();
    let holder_spki = jwk::to_spki(&VerifyingKey::from(&holder_key)).unwrap();

    let claims = json!({"sub": "user-42"}).as_object().unwrap().clone();
    let signer = HmacSigner::new(hmac_key());
    let sd_jwt = Issuer::new(claims).require_key_binding(holder_spki).issue(&signer).unwrap();

    let resolver = MapKeyResolver::new().with_fallback(VerifyingKeyMaterial::Hmac(hmac_key()));
    let (_, payload) = jws::decode(sd_jwt.jwt(), &resolver).unwrap();
    assert!(payload.get("cnf").unwrap().get("jwk").is_some());
  }
}
