// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Persisted entity model
//!
//! Every entity records its identity, display name, derived owning
//! namespace, creation timestamp, and the ordered reference list it was
//! created with.  The namespace is derived by the server (never
//! client-supplied directly) and the reference list is write-once: nothing
//! mutates it after creation, and [`Entity::references()`] exposes it so a
//! cascade checker can see what an entity points at.

use crate::workflow::WorkflowSpec;
use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;
use trellis_common::api::ResourceKey;
use trellis_common::api::ResourceReference;
use trellis_common::api::ResourceType;

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Experiment {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub namespace: String,
    pub time_created: DateTime<Utc>,
    pub references: Vec<ResourceReference>,
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Pipeline {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub namespace: String,
    pub time_created: DateTime<Utc>,
    pub references: Vec<ResourceReference>,
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct PipelineVersion {
    pub id: String,
    pub name: String,
    /// pipeline definition carried by this version
    pub manifest: String,
    pub namespace: String,
    pub time_created: DateTime<Utc>,
    pub references: Vec<ResourceReference>,
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Run {
    pub id: String,
    pub name: String,
    pub namespace: String,
    pub time_created: DateTime<Utc>,
    pub references: Vec<ResourceReference>,
    /// the exact specification submitted to the workflow engine
    pub workflow_spec: WorkflowSpec,
    /// handle returned by the workflow engine when the run was submitted
    pub engine_handle: String,
}

/// One persisted entity of any type
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum Entity {
    Experiment(Experiment),
    Pipeline(Pipeline),
    PipelineVersion(PipelineVersion),
    Run(Run),
}

impl Entity {
    pub fn resource_type(&self) -> ResourceType {
        match self {
            Entity::Experiment(_) => ResourceType::Experiment,
            Entity::Pipeline(_) => ResourceType::Pipeline,
            Entity::PipelineVersion(_) => ResourceType::PipelineVersion,
            Entity::Run(_) => ResourceType::Run,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            Entity::Experiment(e) => &e.id,
            Entity::Pipeline(p) => &p.id,
            Entity::PipelineVersion(v) => &v.id,
            Entity::Run(r) => &r.id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Entity::Experiment(e) => &e.name,
            Entity::Pipeline(p) => &p.name,
            Entity::PipelineVersion(v) => &v.name,
            Entity::Run(r) => &r.name,
        }
    }

    /// The effective tenant namespace this entity belongs to
    pub fn namespace(&self) -> &str {
        match self {
            Entity::Experiment(e) => &e.namespace,
            Entity::Pipeline(p) => &p.namespace,
            Entity::PipelineVersion(v) => &v.namespace,
            Entity::Run(r) => &r.namespace,
        }
    }

    /// The ordered reference list attached at creation
    pub fn references(&self) -> &[ResourceReference] {
        match self {
            Entity::Experiment(e) => &e.references,
            Entity::Pipeline(p) => &p.references,
            Entity::PipelineVersion(v) => &v.references,
            Entity::Run(r) => &r.references,
        }
    }

    pub fn key(&self) -> ResourceKey {
        ResourceKey::new(self.resource_type(), self.id())
    }
}
