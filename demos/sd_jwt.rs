// Copyright 2020-2023 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

use std::error::Error;

use sd_jwt_rs::HmacSigner;
use sd_jwt_rs::Issuer;
use sd_jwt_rs::MapKeyResolver;
use sd_jwt_rs::Presentation;
use sd_jwt_rs::VerificationOptions;
use sd_jwt_rs::VerifyingKeyMaterial;
use serde_json::json;

fn main() -> Result<(), Box<dyn Error>> {
  let claims = json!({
    "iss": "https://issuer.example.com",
    "sub": "user_42",
    "given_name": "John",
    "family_name": "Doe",
    "email": "johndoe@example.com",
    "phone_number": "+1-202-555-0101",
    "phone_number_verified": true,
    "address": {
      "street_address": "123 Main St",
      "locality": "Anytown",
      "region": "Anystate",
      "country": "US"
    },
    "birthdate": "1940-01-01",
    "updated_at": 1570000000,
    "nationalities": ["US", "DE"]
  })
  .as_object()
  .unwrap()
  .clone();

  let key = b"0123456789ABCDEF0123456789ABCDEF".to_vec();
  let signer = HmacSigner::new(key.clone());

  let sd_jwt = Issuer::new(claims)
    .make_concealable("email")?
    .make_concealable("phone_number")?
    .make_concealable("address.street_address")?
    .make_concealable("nationalities[0]")?
    .issue(&signer)?;

  println!("issued {} disclosure(s)", sd_jwt.disclosures().len());

  // The holder reveals only `email` and the first nationality.
  let presentation = Presentation::select(&sd_jwt, &["email"], None)?;
  println!("presentation: {presentation}");

  let resolver = MapKeyResolver::new().with_fallback(VerifyingKeyMaterial::Hmac(key));
  let disclosed = sd_jwt_rs::verify(&presentation.to_string(), &resolver, &VerificationOptions::new())?;
  println!("disclosed object: {}", serde_json::to_string_pretty(&disclosed)?);
  Ok(())
}
