// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error handling facilities for the Trellis API server

use crate::api::AccessAttributes;
use crate::api::ResourceType;
use serde::Deserialize;
use serde::Serialize;
use std::fmt::Display;

/// An error that can be generated within the API server core
///
/// Exactly one of these is returned for a failed operation; a successful
/// operation returns a fully-constructed entity and nothing else.  The
/// "decision" variants (`ObjectNotFound`, `ObjectAlreadyExists`,
/// `InvalidRequest`, `Unauthenticated`, `Forbidden`) are terminal for the
/// request and carry enough context for the caller to act on.
/// `ServiceUnavailable` is the only variant an outer layer may reasonably
/// retry; see [`Error::retryable()`].
#[derive(Clone, Debug, Deserialize, thiserror::Error, PartialEq, Serialize)]
pub enum Error {
    /// An object needed as part of this operation was not found.
    #[error("Object (of type {type_name:?}) not found: {lookup_type:?}")]
    ObjectNotFound { type_name: ResourceType, lookup_type: LookupType },
    /// An object already exists with the specified identifier.
    #[error("Object (of type {type_name:?}) already exists: {object_name}")]
    ObjectAlreadyExists { type_name: ResourceType, object_name: String },
    /// The request was malformed or violates the reference schema.
    #[error("Invalid Request: {message}")]
    InvalidRequest { message: String },
    /// Caller identity could not be established.
    #[error("Missing or invalid credentials")]
    Unauthenticated { internal_message: String },
    /// The authorization provider explicitly refused the request.
    ///
    /// Carries the caller identity, the denial reason, and the attribute set
    /// that was submitted for the decision, for audit logging.
    #[error("user \"{identity}\" is not authorized: {reason} (request: {attributes})")]
    Forbidden {
        identity: String,
        reason: String,
        attributes: AccessAttributes,
    },
    /// The system encountered an unhandled operational error.
    #[error("Internal Error: {internal_message}")]
    InternalError { internal_message: String },
    /// A collaborator (or part of the system) is unavailable.
    #[error("Service Unavailable: {internal_message}")]
    ServiceUnavailable { internal_message: String },
}

/// Indicates how an object was looked up (for an `ObjectNotFound` error)
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub enum LookupType {
    /// a specific identifier was requested
    ById(String),
    /// a specific name was requested
    ByName(String),
}

impl LookupType {
    /// Returns an ObjectNotFound error appropriate for the case where this
    /// lookup failed
    pub fn into_not_found(self, type_name: ResourceType) -> Error {
        Error::ObjectNotFound { type_name, lookup_type: self }
    }
}

impl Error {
    /// Returns whether the error is likely transient and could reasonably be
    /// retried
    pub fn retryable(&self) -> bool {
        match self {
            Error::ServiceUnavailable { .. } => true,

            Error::ObjectNotFound { .. }
            | Error::ObjectAlreadyExists { .. }
            | Error::InvalidRequest { .. }
            | Error::Unauthenticated { .. }
            | Error::Forbidden { .. }
            | Error::InternalError { .. } => false,
        }
    }

    /// Generates an [`Error::ObjectNotFound`] error for a lookup by object id.
    pub fn not_found_by_id(type_name: ResourceType, id: &str) -> Error {
        LookupType::ById(id.to_string()).into_not_found(type_name)
    }

    /// Generates an [`Error::InternalError`] error with the specific message
    ///
    /// InternalError should be used for operational conditions that should
    /// not happen but that we cannot reasonably handle at runtime.
    pub fn internal_error(internal_message: &str) -> Error {
        Error::InternalError { internal_message: internal_message.to_owned() }
    }

    /// Generates an [`Error::InvalidRequest`] error with the specific message
    ///
    /// This should be used for failures due to invalid client input, such as
    /// a reference list that violates the schema for the entity type.
    pub fn invalid_request(message: &str) -> Error {
        Error::InvalidRequest { message: message.to_owned() }
    }

    /// Generates an [`Error::ServiceUnavailable`] error with the specific
    /// message
    ///
    /// This should be used for transient collaborator failures where the
    /// caller might be expected to retry.  A definitive "no" from the
    /// authorization provider is `Forbidden`, never this.
    pub fn unavail(message: &str) -> Error {
        Error::ServiceUnavailable { internal_message: message.to_owned() }
    }

    /// Given an [`Error`] with an internal message, return the same error
    /// with `context` prepended to it to provide more context
    ///
    /// If the error has no internal message, then it is returned unchanged.
    pub fn internal_context<C>(self, context: C) -> Error
    where
        C: Display + Send + Sync + 'static,
    {
        match self {
            Error::ObjectNotFound { .. }
            | Error::ObjectAlreadyExists { .. }
            | Error::InvalidRequest { .. }
            | Error::Forbidden { .. } => self,
            Error::Unauthenticated { internal_message } => {
                Error::Unauthenticated {
                    internal_message: format!(
                        "{}: {}",
                        context, internal_message
                    ),
                }
            }
            Error::InternalError { internal_message } => Error::InternalError {
                internal_message: format!("{}: {}", context, internal_message),
            },
            Error::ServiceUnavailable { internal_message } => {
                Error::ServiceUnavailable {
                    internal_message: format!(
                        "{}: {}",
                        context, internal_message
                    ),
                }
            }
        }
    }
}

/// Implements a pattern similar to `anyhow::Context` for providing extra
/// context for internal error messages
///
/// This does not add a new error to a cause chain.  It replaces the given
/// `Error` with one that has the modified internal message, preserving the
/// typed kind for programmatic dispatch.
pub trait InternalContext<T> {
    fn internal_context<C>(self, s: C) -> Result<T, Error>
    where
        C: Display + Send + Sync + 'static;

    fn with_internal_context<C, F>(self, f: F) -> Result<T, Error>
    where
        C: Display + Send + Sync + 'static,
        F: FnOnce() -> C;
}

impl<T> InternalContext<T> for Result<T, Error> {
    fn internal_context<C>(self, context: C) -> Result<T, Error>
    where
        C: Display + Send + Sync + 'static,
    {
        self.map_err(|error| error.internal_context(context))
    }

    fn with_internal_context<C, F>(self, make_context: F) -> Result<T, Error>
    where
        C: Display + Send + Sync + 'static,
        F: FnOnce() -> C,
    {
        self.map_err(|error| error.internal_context(make_context()))
    }
}

#[cfg(test)]
mod test {
    use super::Error;
    use super::InternalContext;
    use crate::api::AccessAttributes;
    use crate::api::Action;
    use crate::api::ResourceType;

    #[test]
    fn test_context() {
        // test `internal_context()` and (separately) `InternalError` variant
        let error: Result<(), Error> = Err(Error::internal_error("boom"));
        match error.internal_context("uh-oh") {
            Err(Error::InternalError { internal_message }) => {
                assert_eq!(internal_message, "uh-oh: boom");
            }
            _ => panic!("returned wrong type"),
        };

        // test `with_internal_context()` and (separately) `ServiceUnavailable`
        // variant
        let error: Result<(), Error> = Err(Error::unavail("boom"));
        match error.with_internal_context(|| format!("uh-oh (#{:2})", 2)) {
            Err(Error::ServiceUnavailable { internal_message }) => {
                assert_eq!(internal_message, "uh-oh (# 2): boom");
            }
            _ => panic!("returned wrong type"),
        };

        // test using a variant that doesn't have an internal message
        let error: Result<(), Error> = Err(Error::Forbidden {
            identity: "user@example.com".to_string(),
            reason: "no role".to_string(),
            attributes: AccessAttributes {
                namespace: "ns1".to_string(),
                resource_type: ResourceType::Run,
                action: Action::Create,
            },
        });
        assert!(matches!(
            error.internal_context("foo"),
            Err(Error::Forbidden { .. })
        ));
    }

    #[test]
    fn test_forbidden_message() {
        let error = Error::Forbidden {
            identity: "user@example.com".to_string(),
            reason: "this is not allowed".to_string(),
            attributes: AccessAttributes {
                namespace: "ns1".to_string(),
                resource_type: ResourceType::Experiment,
                action: Action::Create,
            },
        };
        assert_eq!(
            error.to_string(),
            "user \"user@example.com\" is not authorized: this is not \
             allowed (request: { namespace: \"ns1\", resource: experiment, \
             verb: create })"
        );
    }

    #[test]
    fn test_retryable() {
        assert!(Error::unavail("backend down").retryable());
        assert!(!Error::invalid_request("bad reference").retryable());
        assert!(
            !Error::not_found_by_id(ResourceType::Pipeline, "p1").retryable()
        );
    }
}
