// Copyright 2020-2023 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! Issue, present and verify SD-JWTs and SD-JWT key-binding JWTs, per
//! draft-ietf-oauth-selective-disclosure-jwt.

mod base64url;
mod claim_path;
mod claims;
mod decoder;
mod decoy;
mod digest_validator;
mod disclosure;
mod encoder;
mod error;
mod hasher;
mod issuer;
mod json;
mod jwk;
mod jws;
mod key_binding;
mod mapper;
mod presentation;
mod sd_jwt;
mod verifier;

pub use claim_path::ClaimPath;
pub use claims::VerificationOptions;
pub use claims::DEFAULT_KB_MAX_AGE_SECS;
pub use claims::DEFAULT_MAX_DISCLOSURES;
pub use claims::DEFAULT_MAX_JWT_SIZE;
pub use claims::MAX_CLOCK_SKEW_SECS;
pub use disclosure::Disclosure;
pub use error::Error;
pub use error::ErrorKind;
pub use error::Result;
pub use hasher::HashAlgorithm;
pub use issuer::Issuer;
pub use issuer::DEFAULT_SALT_SIZE;
pub use issuer::RESERVED_CLAIMS;
pub use json::JsonObject;
pub use jwk::from_jwk_object;
pub use jwk::to_jwk;
pub use jwk::to_spki;
pub use jws::decode as decode_jws;
pub use jws::encode as encode_jws;
pub use jws::EcdsaSigner;
pub use jws::HmacSigner;
pub use jws::JwsAlgorithm;
pub use jws::JwsHeader;
pub use jws::KeyResolver;
pub use jws::MapKeyResolver;
pub use jws::RsaSigner;
pub use jws::Signer;
pub use jws::SingleKeyResolver;
pub use jws::VerifyingKeyMaterial;
pub use key_binding::compute_sd_hash;
pub use key_binding::generate as generate_key_binding_jwt;
pub use key_binding::validate as validate_key_binding_jwt;
pub use key_binding::KB_JWT_TYP;
pub use presentation::Presentation;
pub use sd_jwt::SdJwt;
pub use verifier::verify;
pub use verifier::verify_to_result;
pub use verifier::VerificationError;
pub use verifier::VerificationResult;
