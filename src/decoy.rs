// Copyright 2020-2023 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

use rand::Rng;

use crate::base64url;
use crate::hasher::HashAlgorithm;

/// The number of fresh random bytes hashed to produce one decoy digest — identical to
/// the byte length of a real disclosure's salt, so decoys are indistinguishable from
/// real digests in length and alphabet.
const DECOY_ENTROPY_BYTES: usize = 32;

/// Produces `count` decoy digests.
///
/// Each decoy hashes `DECOY_ENTROPY_BYTES` of fresh CSPRNG data, base64url-encoded
/// first and then fed through the digest calculator — the identical production path a
/// real disclosure's digest takes, so a decoy cannot be distinguished from a real
/// digest by inspecting its shape alone.
pub fn generate(count: usize, alg: HashAlgorithm) -> Vec<String> {
  let mut rng = rand::thread_rng();
  (0..count)
    .map(|_| {
      let random_bytes: Vec<u8> = (0..DECOY_ENTROPY_BYTES).map(|_| rng.gen()).collect();
      let pseudo_disclosure = base64url::encode(random_bytes);
      alg.encoded_digest(&pseudo_disclosure)
    })
    .collect()
}

/// Fisher–Yates-shuffles `real` and `decoys` together using CSPRNG indices.
///
/// The result's length is `real.len() + decoys.len()` and contains exactly the
/// multiset union of both inputs, in an order that reveals nothing about which
/// digests were real.
pub fn interleave(real: Vec<String>, decoys: Vec<String>) -> Vec<String> {
  let mut combined = real;
  combined.extend(decoys);

  let mut rng = rand::thread_rng();
  let len = combined.len();
  for i in (1..len).rev() {
    let j = rng.gen_range(0..=i);
    combined.swap(i, j);
  }
  combined
}
