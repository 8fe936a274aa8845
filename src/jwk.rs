// Copyright 2020-2023 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

use p256::ecdsa::VerifyingKey;
use p256::elliptic_curve::sec1::ToEncodedPoint;
use p256::pkcs8::DecodePublicKey;
use p256::pkcs8::EncodePublicKey;

use crate::base64url;
use crate::json::JsonObject;
use crate::Error;
use crate::Result;

const KTY: &str = "kty";
const CRV: &str = "crv";
const KTY_EC: &str = "EC";
const CRV_P256: &str = "P-256";
const COORDINATE_LEN: usize = 32;

/// Imports a P-256 `SubjectPublicKeyInfo` and exports it as an EC JWK
/// `{kty:"EC", crv:"P-256", x:b64u(X), y:b64u(Y)}`.
///
/// ## Error
/// [`Error::InvalidPath`]-adjacent [`Error::Unspecified`] if `spki_bytes` is not a
/// valid P-256 SubjectPublicKeyInfo (curve OID `1.2.840.10045.3.1.7`).
pub fn to_jwk(spki_bytes: &[u8]) -> Result<JsonObject> {
  let verifying_key =
    VerifyingKey::from_public_key_der(spki_bytes).map_err(|e| Error::Unspecified(format!("invalid P-256 SPKI: {e}")))?;
  Ok(verifying_key_to_jwk(&verifying_key))
}

/// Renders a parsed P-256 verifying key as an EC JWK.
pub fn verifying_key_to_jwk(verifying_key: &VerifyingKey) -> JsonObject {
  let point = verifying_key.to_encoded_point(false);
  let x = point.x().expect("uncompressed point always carries x");
  let y = point.y().expect("uncompressed point always carries y");
  let mut jwk = JsonObject::new();
  jwk.insert(KTY.to_string(), KTY_EC.into());
  jwk.insert(CRV.to_string(), CRV_P256.into());
  jwk.insert("x".to_string(), base64url::encode(x).into());
  jwk.insert("y".to_string(), base64url::encode(y).into());
  jwk
}

/// Parses an EC P-256 JWK object back into a verifying key.
///
/// ## Error
/// [`Error::Unspecified`] if `kty`/`crv` are not exactly `"EC"`/`"P-256"`, or if `x`/`y`
/// do not each decode to 32 bytes forming a valid curve point.
pub fn from_jwk_object(jwk: &JsonObject) -> Result<VerifyingKey> {
  let kty = jwk.get(KTY).and_then(|v| v.as_str()).ok_or_else(|| Error::Unspecified("JWK missing kty".to_string()))?;
  if kty != KTY_EC {
    return Err(Error::Unspecified(format!("unsupported JWK kty: {kty}")));
  }
  let crv = jwk.get(CRV).and_then(|v| v.as_str()).ok_or_else(|| Error::Unspecified("JWK missing crv".to_string()))?;
  if crv != CRV_P256 {
    return Err(Error::Unspecified(format!("unsupported JWK crv: {crv}")));
  }
  let x = jwk.get("x").and_then(|v| v.as_str()).ok_or_else(|| Error::Unspecified("JWK missing x".to_string()))?;
  let y = jwk.get("y").and_then(|v| v.as_str()).ok_or_else(|| Error::Unspecified("JWK missing y".to_string()))?;

  let x_bytes = base64url::decode(x)?;
  let y_bytes = base64url::decode(y)?;
  if x_bytes.len() != COORDINATE_LEN || y_bytes.len() != COORDINATE_LEN {
    return Err(Error::Unspecified("JWK x/y must each be 32 bytes".to_string()));
  }

  let mut uncompressed = Vec::with_capacity(1 + 2 * COORDINATE_LEN);
  uncompressed.push(0x04);
  uncompressed.extend_from_slice(&x_bytes);
  uncompressed.extend_from_slice(&y_bytes);

  VerifyingKey::from_sec1_bytes(&uncompressed).map_err(|e| Error::Unspecified(format!("invalid P-256 point: {e}")))
}

/// Exports a verifying key back to `SubjectPublicKeyInfo` DER bytes.
pub fn to_spki(verifying_key: &VerifyingKey) -> Result<Vec<u8>> {
  verifying_key
    .to_public_key_der()
    .map(|doc| doc.as_bytes().to_vec())
    .map_err(|e| Error::Unspecified(format!("failed to encode SPKI: {e}")))
}

#[cfg(test)]
mod test {
  use super::*;
  use p256::ecdsa::SigningKey;

  #[test]
  fn round_trip_jwk() {
    let signing_key = SigningKey::from_slice(&[7u8; 32]).unwrap();
    let verifying_key = VerifyingKey::from(&signing_key);

    let jwk = verifying_key_to_jwk(&verifying_key);
    assert_eq!(jwk.get("kty").unwrap(), "EC");
    assert_eq!(jwk.get("crv").unwrap(), "P-256");

    let recovered = from_jwk_object(&jwk).unwrap();
    assert_eq!(recovered, verifying_key);
  }

  #[test]
  fn round_trip_spki() {
    let signing_key = SigningKey::from_slice(&[9u8; 32]).unwrap();
    let verifying_key = VerifyingKey::from(&signing_key);
    let spki = to_spki(&verifying_key).unwrap();
    let jwk = to_jwk(&spki).unwrap();
    let recovered = from_jwk_object(&jwk).unwrap();
    assert_eq!(recovered, verifying_key);
  }

  #[test]
  fn rejects_wrong_curve_name() {
    let mut jwk = JsonObject::new();
    jwk.insert("kty".to_string(), "EC".into());
    jwk.insert("crv".to_string(), "P-384".into());
    jwk.insert("x".to_string(), "x".into());
    jwk.insert("y".to_string(), "y".into());
    assert!(from_jwk_object(&jwk).is_err());
  }
}
