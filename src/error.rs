// Copyright 2020-2023 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

/// Alias for a `Result` with the error type [`Error`].
pub type Result<T> = ::core::result::Result<T, Error>;

/// Language-neutral classification of an [`Error`], stable across releases.
///
/// This is the identifier a caller should match on or log; the [`Error`]
/// variant itself may grow additional context-carrying fields over time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::IntoStaticStr)]
#[strum(serialize_all = "kebab-case")]
pub enum ErrorKind {
  InvalidSignature,
  DigestMismatch,
  TokenExpired,
  TokenNotYetValid,
  UnsupportedAlgorithm,
  MalformedDisclosure,
  MissingRequiredClaim,
  AlgorithmConfusion,
  KeyBindingInvalid,
  InvalidInput,
  HashAlgorithmMismatch,
  KeyIdNotFound,
  KeyResolverMissing,
  KeyResolverFailed,
}

#[derive(Debug, thiserror::Error, strum::IntoStaticStr)]
#[non_exhaustive]
pub enum Error {
  #[error("invalid input: {0}")]
  InvalidDisclosure(String),

  #[error("malformed disclosure: {0}")]
  MalformedDisclosure(String),

  #[error("no hasher can be specified for the hashing algorithm {0}")]
  MissingHasher(String),

  #[error("data type is not expected: {0}")]
  DataTypeMismatch(String),

  #[error("claim {0} of disclosure already exists")]
  ClaimCollisionError(String),

  #[error("digest {0} appears multiple times")]
  DuplicateDigestError(String),

  #[error("{0} unused disclosure(s) were not consumed while decoding")]
  UnusedDisclosures(usize),

  #[error("array disclosure object contains keys other than `...`")]
  InvalidArrayDisclosureObject,

  #[error("invalid path: {0}")]
  InvalidPath(String),

  #[error("invalid input")]
  DeserializationError(String),

  #[error("index {0} is out of bounds for the provided array")]
  IndexOutofBounds(usize),

  #[error("maximum nesting depth exceeded")]
  MaxDepthExceeded,

  #[error("{0}")]
  Unspecified(String),

  #[error("salt size must be greater or equal 16")]
  InvalidSaltSize,

  #[error("claim {0} is reserved and cannot be made selectively disclosable")]
  ReservedClaim(String),

  #[error("invalid JWS signature")]
  InvalidSignature,

  #[error("digest commitment mismatch")]
  DigestMismatch,

  #[error("token has expired")]
  TokenExpired,

  #[error("token is not yet valid")]
  TokenNotYetValid,

  #[error("unsupported algorithm: {0}")]
  UnsupportedAlgorithm(String),

  #[error("missing required claim: {0}")]
  MissingRequiredClaim(String),

  #[error("algorithm confusion attempt detected: alg={0}")]
  AlgorithmConfusion(String),

  #[error("key binding JWT is invalid: {0}")]
  KeyBindingInvalid(String),

  #[error("expected hash algorithm {expected}, got {actual}")]
  HashAlgorithmMismatch { expected: String, actual: String },

  #[error("key id not found: {0}")]
  KeyIdNotFound(String),

  #[error("no key resolver configured for a kid-less header")]
  KeyResolverMissing,

  #[error("key resolver failed: {0}")]
  KeyResolverFailed(String),

  #[error("jws signer failed: {0}")]
  JwsSignerFailure(String),
}

impl Error {
  /// Maps this error onto its externally-visible, language-neutral [`ErrorKind`].
  pub fn kind(&self) -> ErrorKind {
    match self {
      Error::InvalidSignature => ErrorKind::InvalidSignature,
      Error::DigestMismatch | Error::DuplicateDigestError(_) | Error::ClaimCollisionError(_) => {
        ErrorKind::DigestMismatch
      }
      Error::TokenExpired => ErrorKind::TokenExpired,
      Error::TokenNotYetValid => ErrorKind::TokenNotYetValid,
      Error::UnsupportedAlgorithm(_) => ErrorKind::UnsupportedAlgorithm,
      Error::MalformedDisclosure(_) | Error::InvalidDisclosure(_) | Error::InvalidArrayDisclosureObject => {
        ErrorKind::MalformedDisclosure
      }
      Error::MissingRequiredClaim(_) => ErrorKind::MissingRequiredClaim,
      Error::AlgorithmConfusion(_) => ErrorKind::AlgorithmConfusion,
      Error::KeyBindingInvalid(_) => ErrorKind::KeyBindingInvalid,
      Error::HashAlgorithmMismatch { .. } => ErrorKind::HashAlgorithmMismatch,
      Error::KeyIdNotFound(_) => ErrorKind::KeyIdNotFound,
      Error::KeyResolverMissing => ErrorKind::KeyResolverMissing,
      Error::KeyResolverFailed(_) => ErrorKind::KeyResolverFailed,
      _ => ErrorKind::InvalidInput,
    }
  }
}
