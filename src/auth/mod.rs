// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Identity is delegated to a managed provider (Firebase Authentication in
//! production, see [`crate::providers::firebase_auth`]).
//!
//! ## Auth Flow
//!
//! 1. Sign-in (password or OAuth credential) returns a [`Session`]
//! 2. The session is passed explicitly into flows (no global current user)
//! 3. Provider failures carry an `auth/...` code which is classified once by
//!    [`classify_auth_code`] and rendered per operation

pub mod error;
pub mod provider;

pub use error::{classify_auth_code, AuthErrorKind, AuthFailure, AuthOperation};
pub use provider::{
    IdentityProvider, IdentityUser, OAuthCredential, ProfileUpdate, ProviderError, Session,
};
