// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! OAuth2/OIDC bearer token authentication for the admin UI API.
//!
//! ## Auth Flow
//!
//! 1. The admin UI signs the user in against the identity provider
//! 2. The UI sends `Authorization: Bearer <access token>`
//! 3. This service, depending on the environment:
//!    - POSTs the token to the provider's introspection endpoint, or
//!    - verifies the JWT against the JWKS advertised by the provider's
//!      discovery document, falling back to the HMAC shared secret
//! 4. The claims are mapped to an [`Identity`]:
//!    - `sub` → `id`
//!    - `realm_access.roles` → `roles`
//!    - `resource_access.<client id>.roles` → `permissions`
//!
//! ## Security
//!
//! - Issuer and audience are mandatory for locally verified tokens
//! - Introspection accepts only `"active": true`
//! - Discovery is cached for the process lifetime, JWKS with a 5 minute TTL
//! - Clock skew tolerance is 60 seconds

pub mod discovery;
pub mod error;
pub mod extractor;
pub mod identity;
pub mod jwks;
pub mod middleware;
pub mod validator;

#[cfg(test)]
pub mod test_support;

pub use error::AuthError;
pub use extractor::{Auth, OptionalAuth};
pub use identity::Identity;
pub use middleware::{
    authenticate, authorize, optional_auth, require_role, RequiredPermissions, RequiredRoles,
};
pub use validator::{AuthStatus, TokenValidator};
