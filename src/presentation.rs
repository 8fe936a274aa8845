// Copyright 2020-2023 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! The Presenter (§4.12): selects a subset of an issued [`SdJwt`]'s disclosures and
//! optionally attaches a key-binding JWT, producing the wire-format presentation a
//! verifier receives.

use std::collections::HashMap;
use std::fmt::Display;

use serde_json::Value;

use crate::claim_path::ClaimPath;
use crate::disclosure::Disclosure;
use crate::jws;
use crate::mapper;
use crate::sd_jwt::SdJwt;
use crate::Error;
use crate::Result;

/// A presentation: `JWT ~ d1 ~ ... ~ dk ~ kb?`, the artifact a holder actually sends
/// to a verifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Presentation {
  pub jwt: String,
  pub disclosures: Vec<Disclosure>,
  pub key_binding_jwt: Option<String>,
}

impl Presentation {
  /// Selects disclosures from `sd_jwt` by claim path — `"name"`, dotted nested paths
  /// (`"address.street"`), and bracketed array paths (`"degrees[1]"`) per §4.7's
  /// grammar, resolved against the issued claims tree via [`mapper`]. Selecting a
  /// path whose value still has concealed descendants (e.g. a container that was
  /// itself made concealable as a whole) reveals that whole subtree, since there is
  /// no way to partially reveal a digest-wrapped value without a more specific path.
  ///
  /// ## Error
  /// [`Error::InvalidPath`] if a path does not parse, or does not resolve to a
  /// disclosable value in `sd_jwt`.
  pub fn select(sd_jwt: &SdJwt, selected_paths: &[&str], key_binding_jwt: Option<String>) -> Result<Self> {
    let disclosures: HashMap<String, Disclosure> = sd_jwt
      .disclosures()
      .iter()
      .map(|disclosure| (sd_jwt.hash_alg().encoded_digest(&disclosure.to_string()), disclosure.clone()))
      .collect();
    let claims_tree = Value::Object(jws::peek_payload(sd_jwt.jwt())?);

    let mut digests: Vec<String> = Vec::new();
    for raw_path in selected_paths {
      let path = ClaimPath::parse(raw_path)?;
      for digest in mapper::resolve_disclosure_digests(&claims_tree, &path, &disclosures)? {
        if !digests.contains(&digest) {
          digests.push(digest);
        }
      }
    }

    let selected = digests
      .into_iter()
      .map(|digest| {
        disclosures
          .get(&digest)
          .cloned()
          .ok_or_else(|| Error::InvalidPath(format!("no disclosure for digest {digest}")))
      })
      .collect::<Result<Vec<_>>>()?;

    Ok(Self {
      jwt: sd_jwt.jwt().to_string(),
      disclosures: selected,
      key_binding_jwt,
    })
  }

  /// Parses a presentation string: `jwt~d1~...~dk~kb?`, with a single empty slot when
  /// no disclosures were selected.
  pub fn parse(input: &str) -> Result<Self> {
    let mut parts: Vec<&str> = input.split('~').collect();
    if parts.len() < 2 {
      return Err(Error::DeserializationError(
        "presentation must contain at least a JWT and a disclosure slot".to_string(),
      ));
    }
    let jwt = parts.remove(0).to_string();
    let kb = parts.pop().unwrap();
    let disclosures = parts
      .into_iter()
      .filter(|segment| !segment.is_empty())
      .map(Disclosure::parse)
      .collect::<Result<Vec<_>>>()?;

    Ok(Self {
      jwt,
      disclosures,
      key_binding_jwt: (!kb.is_empty()).then(|| kb.to_string()),
    })
  }
}

impl Display for Presentation {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    let disclosures = self
      .disclosures
      .iter()
      .map(ToString::to_string)
      .collect::<Vec<_>>()
      .join("~");
    write!(f, "{}~{disclosures}~{}", self.jwt, self.key_binding_jwt.as_deref().unwrap_or(""))
  }
}

#[cfg(test)]
mod test {
  use super::*;
  use crate::issuer::Issuer;
  use crate::jws::HmacSigner;
  use serde_json::json;

  fn hmac_key(fill: u8) -> Vec<u8> {
    vec![fill; 32]
  }

  fn sample_sd_jwt() -> SdJwt {
    let claims = json!({"name": "Alice", "age": 30}).as_object().unwrap().clone();
    Issuer::new(claims)
      .make_concealable("name")
      .unwrap()
      .make_concealable("age")
      .unwrap()
      .issue(&HmacSigner::new(hmac_key(0x10)))
      .unwrap()
  }

  #[test]
  fn selects_a_subset_by_name() {
    let sd_jwt = sample_sd_jwt();
    let presentation = Presentation::select(&sd_jwt, &["name"], None).unwrap();
    assert_eq!(presentation.disclosures.len(), 1);
    assert_eq!(presentation.disclosures[0].claim_name.as_deref(), Some("name"));
  }

  #[test]
  fn rejects_unknown_selection() {
    let sd_jwt = sample_sd_jwt();
    assert!(Presentation::select(&sd_jwt, &["nonexistent"], None).is_err());
  }

  #[test]
  fn format_then_parse_is_idempotent() {
    let sd_jwt = sample_sd_jwt();
    let presentation = Presentation::select(&sd_jwt, &["age"], Some("kb.jwt.sig".to_string())).unwrap();
    let formatted = presentation.to_string();
    let parsed = Presentation::parse(&formatted).unwrap();
    assert_eq!(parsed, presentation);
    assert_eq!(parsed.to_string(), formatted);
  }

  #[test]
  fn no_selection_yields_a_single_empty_slot() {
    let sd_jwt = sample_sd_jwt();
    let presentation = Presentation::select(&sd_jwt, &[], None).unwrap();
    assert_eq!(presentation.to_string(), format!("{}~~", sd_jwt.jwt()));
  }

  #[test]
  fn selects_an_array_element_by_bracket_path() {
    let claims = json!({"degrees": ["BS", "MS", "PhD"]}).as_object().unwrap().clone();
    let sd_jwt = Issuer::new(claims)
      .make_concealable("degrees[1]")
      .unwrap()
      .issue(&HmacSigner::new(hmac_key(0x11)))
      .unwrap();

    let presentation = Presentation::select(&sd_jwt, &["degrees[1]"], None).unwrap();
    assert_eq!(presentation.disclosures.len(), 1);
    assert!(presentation.disclosures[0].is_array_element());
    assert_eq!(presentation.disclosures[0].claim_value, json!("MS"));
  }

  #[test]
  fn selects_a_nested_dotted_path() {
    let claims = json!({"address": {"street": "123 Main St", "city": "Boston"}})
      .as_object()
      .unwrap()
      .clone();
    let sd_jwt = Issuer::new(claims)
      .make_concealable("address.street")
      .unwrap()
      .issue(&HmacSigner::new(hmac_key(0x12)))
      .unwrap();

    let presentation = Presentation::select(&sd_jwt, &["address.street"], None).unwrap();
    assert_eq!(presentation.disclosures.len(), 1);
    assert_eq!(presentation.disclosures[0].claim_name.as_deref(), Some("street"));
    assert_eq!(presentation.disclosures[0].claim_value, json!("123 Main St"));
  }
}
