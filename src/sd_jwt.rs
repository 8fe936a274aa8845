// Copyright 2020-2023 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! The issued SD-JWT artifact: an issuer-signed JWT plus its full set of disclosures,
//! in emission order.

use std::fmt::Display;
use std::str::FromStr;

use crate::disclosure::Disclosure;
use crate::hasher::HashAlgorithm;
use crate::Error;
use crate::Result;

/// An SD-JWT as handed back by the issuer (§4.10): the signed JWT plus every
/// disclosure it committed digests to, in the order they were generated.
///
/// This is not yet a presentation — [`crate::presentation::Presentation::select`]
/// consumes it to choose which disclosures (if any) a holder reveals, and whether a
/// key-binding JWT is attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SdJwt {
  jwt: String,
  disclosures: Vec<Disclosure>,
  hash_alg: HashAlgorithm,
}

impl SdJwt {
  pub fn new(jwt: String, disclosures: Vec<Disclosure>, hash_alg: HashAlgorithm) -> Self {
    Self {
      jwt,
      disclosures,
      hash_alg,
    }
  }

  /// The compact, issuer-signed JWT (without any `~`-joined disclosures).
  pub fn jwt(&self) -> &str {
    &self.jwt
  }

  /// All disclosures generated at issuance, in emission order.
  pub fn disclosures(&self) -> &[Disclosure] {
    &self.disclosures
  }

  pub fn hash_alg(&self) -> HashAlgorithm {
    self.hash_alg
  }

  /// Parses an SD-JWT string under an explicit hash algorithm, rather than assuming
  /// the default — use this when the algorithm is already known from context (e.g.
  /// while verifying, after the payload's `_sd_alg` has been read).
  pub fn parse_with_hash_alg(sd_jwt: &str, hash_alg: HashAlgorithm) -> Result<Self> {
    let mut parsed = Self::from_str(sd_jwt)?;
    parsed.hash_alg = hash_alg;
    Ok(parsed)
  }
}

impl Display for SdJwt {
  /// Renders the full, unredacted presentation: every disclosure, no key binding.
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}~", self.jwt)?;
    for disclosure in &self.disclosures {
      write!(f, "{disclosure}~")?;
    }
    Ok(())
  }
}

impl FromStr for SdJwt {
  type Err = Error;

  /// Parses `jwt~d1~...~dk~`. The hash algorithm defaults to SHA-256; pair this with
  /// [`SdJwt::parse_with_hash_alg`] once the payload's own `_sd_alg` is known.
  fn from_str(s: &str) -> Result<Self> {
    let segments: Vec<&str> = s.split('~').collect();
    if segments.len() < 2 {
      return Err(Error::DeserializationError(
        "SD-JWT format is invalid: fewer than 2 segments".to_string(),
      ));
    }
    let jwt = segments[0].to_string();
    let disclosures = segments[1..]
      .iter()
      .filter(|segment| !segment.is_empty())
      .map(|segment| Disclosure::parse(segment))
      .collect::<Result<Vec<_>>>()?;

    Ok(Self {
      jwt,
      disclosures,
      hash_alg: HashAlgorithm::default(),
    })
  }
}
