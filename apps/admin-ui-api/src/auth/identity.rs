// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Token claims and the authenticated identity derived from them.

use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;

/// Claims read from a verified JWT or an introspection response.
///
/// Only the claims that feed [`Identity`] are modelled. Registered claims
/// (`iss`, `aud`, `exp`, `nbf`) are checked by the verifier, not here.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TokenClaims {
    #[serde(default)]
    pub sub: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub preferred_username: Option<String>,
    #[serde(default)]
    pub realm_access: Option<RoleClaim>,
    /// Client id -> client roles.
    #[serde(default, deserialize_with = "null_as_default")]
    pub resource_access: HashMap<String, RoleClaim>,
}

/// `{ "roles": [...] }` as used by `realm_access` and `resource_access`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RoleClaim {
    #[serde(default, deserialize_with = "null_as_default")]
    pub roles: Vec<String>,
}

/// Treat an explicit JSON `null` like an absent claim.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Authenticated caller, attached to request extensions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    /// Subject (`sub` claim)
    pub id: String,
    pub email: String,
    pub name: String,
    /// Realm roles
    pub roles: BTreeSet<String>,
    /// Client roles for this application
    pub permissions: BTreeSet<String>,
    pub last_login: DateTime<Utc>,
}

impl Identity {
    /// Map claims onto an identity. Client roles are taken from
    /// `resource_access[client_id]`.
    pub fn from_claims(claims: TokenClaims, client_id: &str) -> Self {
        let TokenClaims {
            sub,
            email,
            name,
            preferred_username,
            realm_access,
            mut resource_access,
        } = claims;

        Self {
            id: sub.unwrap_or_else(|| "unknown".to_string()),
            email: email.unwrap_or_default(),
            name: name.or(preferred_username).unwrap_or_default(),
            roles: realm_access
                .map(|r| r.roles.into_iter().collect())
                .unwrap_or_default(),
            permissions: resource_access
                .remove(client_id)
                .map(|r| r.roles.into_iter().collect())
                .unwrap_or_default(),
            last_login: Utc::now(),
        }
    }

    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.contains(permission)
    }

    /// True when every listed permission is held.
    pub fn has_all_permissions<S: AsRef<str>>(&self, required: &[S]) -> bool {
        required.iter().all(|p| self.has_permission(p.as_ref()))
    }

    /// True when at least one listed role is held.
    pub fn has_any_role<S: AsRef<str>>(&self, accepted: &[S]) -> bool {
        accepted.iter().any(|r| self.roles.contains(r.as_ref()))
    }
}
