// Copyright 2020-2023 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

use crate::Error;
use crate::Result;

/// Inputs longer than this are rejected before any decode work happens.
pub const MAX_INPUT_LEN: usize = 10 * 1024 * 1024;

/// Encodes `input` as unpadded base64url (RFC 4648 §5, alphabet `[A-Za-z0-9_-]`).
pub fn encode(input: impl AsRef<[u8]>) -> String {
  multibase::Base::Base64Url.encode(input)
}

/// Decodes unpadded base64url text into raw bytes.
///
/// ## Error
/// [`Error::InvalidDisclosure`] if `input` exceeds [`MAX_INPUT_LEN`] bytes or is not
/// valid base64url.
pub fn decode(input: &str) -> Result<Vec<u8>> {
  if input.len() > MAX_INPUT_LEN {
    return Err(Error::InvalidDisclosure("base64url input exceeds the 10 MiB ceiling".to_string()));
  }
  multibase::Base::Base64Url
    .decode(input)
    .map_err(|e| Error::InvalidDisclosure(format!("not valid base64url: {e}")))
}
