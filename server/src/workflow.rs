// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Workflow engine collaborator interface
//!
//! Run creation is the only operation that talks to the engine: once a run
//! request has passed authorization and reference validation, its resolved
//! specification is submitted and the returned handle is recorded on the
//! persisted run.  Executing the workflow's steps is entirely the engine's
//! business.

use async_trait::async_trait;
use serde::Deserialize;
use serde::Serialize;
use std::fmt;
use std::fmt::Display;
use std::fmt::Formatter;
use trellis_common::api::Error;
use trellis_common::api::RunParameter;

/// The resolved specification submitted to the engine for one run
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct WorkflowSpec {
    pub manifest: String,
    pub parameters: Vec<RunParameter>,
}

/// Opaque engine-side identifier for a submitted workflow
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct EngineHandle(pub String);

impl Display for EngineHandle {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Failure to submit a workflow specification
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The engine rejected the specification itself
    #[error("invalid workflow specification: {message}")]
    InvalidSpec { message: String },

    /// The engine could not be reached
    #[error("workflow engine unavailable: {source:#}")]
    Unavailable {
        #[source]
        source: anyhow::Error,
    },
}

impl From<EngineError> for Error {
    fn from(error: EngineError) -> Error {
        match error {
            EngineError::InvalidSpec { .. } => {
                Error::invalid_request(&format!("{}", error))
            }
            EngineError::Unavailable { .. } => {
                Error::unavail(&format!("{}", error))
            }
        }
    }
}

#[async_trait]
pub trait WorkflowEngine: Send + Sync + std::fmt::Debug {
    /// Submit a workflow specification for execution
    ///
    /// No retries are performed here; a transient engine failure is
    /// surfaced to the caller as retryable.
    async fn submit(
        &self,
        spec: &WorkflowSpec,
    ) -> Result<EngineHandle, EngineError>;
}
