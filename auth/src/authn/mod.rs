// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Authentication facilities
//!
//! Every operation in the server carries an authentication context that
//! describes who (or what) is performing it.  This module defines that
//! context and the reasons authentication can fail; the [`external`]
//! submodule extracts identities from inbound request headers.
//!
//! The context is transport-agnostic: background work or tests can construct
//! one directly without any HTTP request in sight.

pub mod external;

use std::fmt;
use std::fmt::Display;
use std::fmt::Formatter;
use trellis_common::api::Error;

/// Describes how the actor performing the current operation is authenticated
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Context {
    kind: Kind,
}

impl Context {
    /// Returns the fixed anonymous context used in single-tenant mode
    ///
    /// In single-tenant mode there is exactly one logical caller; identity
    /// extraction always succeeds and always produces this context.
    pub fn anonymous() -> Context {
        Context { kind: Kind::Authenticated(Actor::Anonymous) }
    }

    /// Returns a context for the given end-user identity
    pub fn for_user(id: &str) -> Context {
        Context {
            kind: Kind::Authenticated(Actor::User { id: id.to_string() }),
        }
    }

    /// Returns a context for a request that carried no usable credentials
    pub fn unauthenticated() -> Context {
        Context { kind: Kind::Unauthenticated }
    }

    /// Returns the authenticated actor, if any
    pub fn actor(&self) -> Option<&Actor> {
        match &self.kind {
            Kind::Authenticated(actor) => Some(actor),
            Kind::Unauthenticated => None,
        }
    }

    /// Returns the authenticated actor if present or an Unauthenticated
    /// error otherwise
    pub fn actor_required(&self) -> Result<&Actor, Error> {
        self.actor().ok_or_else(|| Error::Unauthenticated {
            internal_message: "actor required".to_string(),
        })
    }
}

/// Describes whether the caller is authenticated and as whom
#[derive(Clone, Debug, Eq, PartialEq)]
enum Kind {
    /// No usable credentials accompanied the request
    Unauthenticated,
    /// The caller is authenticated as this actor
    Authenticated(Actor),
}

/// Who is performing an operation
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Actor {
    /// The fixed single-tenant identity
    Anonymous,
    /// An end user, identified by the trusted-header value (e.g., an email)
    User { id: String },
}

impl Actor {
    /// Returns the identity string used in audit messages and RBAC checks
    pub fn id(&self) -> &str {
        match self {
            Actor::Anonymous => "anonymous",
            Actor::User { id } => id,
        }
    }
}

impl Display for Actor {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}", self.id())
    }
}

/// Describes why authentication failed
///
/// These are internal diagnostics: the caller sees only `Unauthenticated`.
/// The details go to the log so an operator can tell a missing proxy header
/// from a malformed one.
#[derive(Debug, thiserror::Error)]
pub enum Reason {
    /// The expected identity header was not present on the request
    #[error("identity header {header:?} was not provided")]
    MissingHeader { header: String },

    /// The header was present but its value is unusable
    #[error("bad identity header value: {source:#}")]
    BadFormat {
        #[source]
        source: anyhow::Error,
    },
}

impl From<Reason> for Error {
    fn from(reason: Reason) -> Error {
        Error::Unauthenticated { internal_message: format!("{:#}", reason) }
    }
}
