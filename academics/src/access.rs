//! Caller identity.
//!
//! A bearer credential resolves to an [`AccessContext`]. Resolution never
//! fails: a missing, malformed, expired or badly signed token yields an
//! anonymous context, and each transaction decides whether that is enough.

use crate::types::SubjectId;
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Caller role
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Regular student
    #[default]
    Student,
    /// Academic administrator
    Admin,
}

impl FromStr for Role {
    type Err = std::convert::Infallible;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        if raw.trim().eq_ignore_ascii_case("admin") {
            Ok(Self::Admin)
        } else {
            Ok(Self::Student)
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Student => f.write_str("student"),
            Self::Admin => f.write_str("admin"),
        }
    }
}

/// Authenticated caller
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Identity {
    /// Student number the caller acts as
    pub subject: SubjectId,
    /// Role from the credential
    pub role: Role,
}

/// Why an access check failed
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccessDenied {
    /// No identity at all
    Unauthenticated,
    /// Identity present but lacking the role
    Forbidden,
}

/// Resolved caller of one request
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AccessContext(Option<Identity>);

impl AccessContext {
    /// Caller without identity
    #[must_use]
    pub const fn anonymous() -> Self {
        Self(None)
    }

    /// Caller with an identity
    #[must_use]
    pub const fn authenticated(identity: Identity) -> Self {
        Self(Some(identity))
    }

    /// Shorthand for a student identity
    #[must_use]
    pub fn student(subject: impl AsRef<str>) -> Self {
        Self::authenticated(Identity {
            subject: SubjectId::new(subject),
            role: Role::Student,
        })
    }

    /// Shorthand for an admin identity
    #[must_use]
    pub fn admin(subject: impl AsRef<str>) -> Self {
        Self::authenticated(Identity {
            subject: SubjectId::new(subject),
            role: Role::Admin,
        })
    }

    /// Identity, if any
    #[must_use]
    pub const fn identity(&self) -> Option<&Identity> {
        self.0.as_ref()
    }

    /// Subject the caller acts as.
    ///
    /// # Errors
    ///
    /// [`AccessDenied::Unauthenticated`] when there is no identity.
    pub fn require_subject(&self) -> Result<&SubjectId, AccessDenied> {
        self.0
            .as_ref()
            .map(|identity| &identity.subject)
            .ok_or(AccessDenied::Unauthenticated)
    }

    /// Check the caller is an administrator.
    ///
    /// # Errors
    ///
    /// [`AccessDenied::Unauthenticated`] without identity,
    /// [`AccessDenied::Forbidden`] for any other role.
    pub fn require_admin(&self) -> Result<&Identity, AccessDenied> {
        match &self.0 {
            None => Err(AccessDenied::Unauthenticated),
            Some(identity) if identity.role == Role::Admin => Ok(identity),
            Some(_) => Err(AccessDenied::Forbidden),
        }
    }
}

/// Token claims issued by the auth service
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Student number
    #[serde(default)]
    pub nim: Option<String>,
    /// Role name, compared case-insensitively
    #[serde(default)]
    pub role: Option<String>,
    /// Issued at (unix seconds)
    #[serde(default)]
    pub iat: i64,
    /// Expiry (unix seconds)
    pub exp: i64,
}

/// Resolves a bearer credential into an [`AccessContext`]
pub trait CredentialVerifier: Send + Sync {
    /// Resolve a raw credential; any problem yields an anonymous context
    fn resolve(&self, credential: Option<&str>) -> AccessContext;
}

/// HS256 shared-secret verifier
#[derive(Clone)]
pub struct JwtVerifier {
    decoding: DecodingKey,
    encoding: EncodingKey,
    validation: Validation,
}

impl fmt::Debug for JwtVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtVerifier").finish_non_exhaustive()
    }
}

impl JwtVerifier {
    /// Verifier for tokens signed with `secret`
    #[must_use]
    pub fn new(secret: &str) -> Self {
        Self {
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
        }
    }

    /// Sign a token valid for `ttl`.
    ///
    /// # Errors
    ///
    /// Returns error if signing fails.
    pub fn issue(
        &self,
        subject: &SubjectId,
        role: Role,
        ttl: Duration,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        let now = Utc::now();
        let claims = Claims {
            nim: Some(subject.as_str().to_string()),
            role: Some(role.to_string()),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
    }
}

impl CredentialVerifier for JwtVerifier {
    fn resolve(&self, credential: Option<&str>) -> AccessContext {
        let Some(token) = credential else {
            return AccessContext::anonymous();
        };

        let claims = match decode::<Claims>(token, &self.decoding, &self.validation) {
            Ok(data) => data.claims,
            Err(e) => {
                tracing::debug!(error = %e, "rejected bearer token");
                return AccessContext::anonymous();
            },
        };

        let subject = SubjectId::new(claims.nim.unwrap_or_default());
        if subject.is_empty() {
            tracing::debug!("bearer token carries no student number");
            return AccessContext::anonymous();
        }

        let role = claims
            .role
            .as_deref()
            .map_or(Role::Student, |r| r.parse().unwrap_or_default());

        AccessContext::authenticated(Identity { subject, role })
    }
}
