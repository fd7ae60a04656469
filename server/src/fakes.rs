// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Deterministic in-process implementations of the collaborator interfaces
//!
//! These stand in for the real store, clock, id generator, RBAC provider,
//! and workflow engine in tests.  They are deliberately simple: fixed ids,
//! a clock that ticks one second per reading, a `BTreeMap` store with the
//! same atomic check-and-insert contract as the real one, and recording
//! fakes for the two external collaborators so tests can assert on exactly
//! what was submitted.

use crate::clock::Clock;
use crate::ids::IdGenerator;
use crate::model::Entity;
use crate::model::Experiment;
use crate::model::Pipeline;
use crate::model::PipelineVersion;
use crate::store::EntityStore;
use crate::workflow::EngineError;
use crate::workflow::EngineHandle;
use crate::workflow::WorkflowEngine;
use crate::workflow::WorkflowSpec;
use async_trait::async_trait;
use chrono::DateTime;
use chrono::TimeDelta;
use chrono::Utc;
use slog::o;
use slog::Drain;
use slog::Logger;
use std::collections::BTreeMap;
use std::sync::atomic::AtomicI64;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::sync::Mutex;
use trellis_auth::authn;
use trellis_auth::authz::Decision;
use trellis_auth::authz::ProviderError;
use trellis_auth::authz::RbacProvider;
use trellis_common::api::AccessAttributes;
use trellis_common::api::CreateResult;
use trellis_common::api::Error;
use trellis_common::api::ListResultVec;
use trellis_common::api::LookupResult;
use trellis_common::api::Relationship;
use trellis_common::api::ResourceKey;
use trellis_common::api::ResourceType;

/// Identifier minted by [`FixedIdGenerator::default_id()`]
pub const DEFAULT_FAKE_ID: &str = "123e4567-e89b-12d3-a456-426655440000";

/// A second well-known identifier for tests that need two distinct ids
pub const SECOND_FAKE_ID: &str = "123e4567-e89b-12d3-a456-426655441001";

/// Returns a logger that discards everything
pub fn test_logger() -> Logger {
    Logger::root(slog::Discard, o!())
}

/// Returns a logger that writes human-readable output to stderr
///
/// Swap this in for [`test_logger`] when debugging a failing test.
pub fn stderr_logger() -> Logger {
    let decorator = slog_term::TermDecorator::new().stderr().build();
    let drain = slog_term::FullFormat::new(decorator).build().fuse();
    let drain = slog_async::Async::new(drain).build().fuse();
    Logger::root(drain, o!())
}

/// Id generator that returns the same identifier every time
///
/// Useful for asserting the exact id of a created entity, and for provoking
/// an id collision on the second create.
#[derive(Debug)]
pub struct FixedIdGenerator {
    id: String,
}

impl FixedIdGenerator {
    pub fn new(id: &str) -> FixedIdGenerator {
        FixedIdGenerator { id: id.to_string() }
    }

    pub fn default_id() -> FixedIdGenerator {
        FixedIdGenerator::new(DEFAULT_FAKE_ID)
    }
}

impl IdGenerator for FixedIdGenerator {
    fn new_id(&self) -> String {
        self.id.clone()
    }
}

/// Id generator that mints "fake-id-1", "fake-id-2", ...
#[derive(Debug, Default)]
pub struct SequentialIdGenerator {
    counter: AtomicU64,
}

impl SequentialIdGenerator {
    pub fn new() -> SequentialIdGenerator {
        SequentialIdGenerator::default()
    }
}

impl IdGenerator for SequentialIdGenerator {
    fn new_id(&self) -> String {
        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        format!("fake-id-{}", n)
    }
}

/// Clock that starts at the Unix epoch and advances one second per reading
#[derive(Debug, Default)]
pub struct FixedClock {
    readings: AtomicI64,
}

impl FixedClock {
    pub fn new() -> FixedClock {
        FixedClock::default()
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        let n = self.readings.fetch_add(1, Ordering::SeqCst);
        DateTime::UNIX_EPOCH + TimeDelta::seconds(n)
    }
}

/// In-memory [`EntityStore`] with the real store's check-and-insert contract
#[derive(Debug, Default)]
pub struct InMemoryStore {
    entities: Mutex<BTreeMap<(ResourceType, String), Entity>>,
    puts: AtomicUsize,
}

impl InMemoryStore {
    pub fn new() -> InMemoryStore {
        InMemoryStore::default()
    }

    /// Number of successful inserts so far
    ///
    /// Tests use this to assert that a failed operation wrote nothing.
    pub fn put_count(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }

    fn insert(&self, entity: Entity) {
        let key = (entity.resource_type(), entity.id().to_string());
        self.entities.lock().unwrap().insert(key, entity);
    }

    /// Seed an experiment directly, bypassing creation-time checks
    pub async fn seed_experiment(&self, id: &str, namespace: &str) {
        self.insert(Entity::Experiment(Experiment {
            id: id.to_string(),
            name: format!("experiment {}", id),
            description: None,
            namespace: namespace.to_string(),
            time_created: DateTime::UNIX_EPOCH,
            references: Vec::new(),
        }));
    }

    /// Seed a pipeline directly, bypassing creation-time checks
    pub async fn seed_pipeline(&self, id: &str, namespace: &str) {
        self.insert(Entity::Pipeline(Pipeline {
            id: id.to_string(),
            name: format!("pipeline {}", id),
            description: None,
            namespace: namespace.to_string(),
            time_created: DateTime::UNIX_EPOCH,
            references: Vec::new(),
        }));
    }

    /// Seed a pipeline version directly, bypassing creation-time checks
    pub async fn seed_pipeline_version(
        &self,
        id: &str,
        namespace: &str,
        pipeline_id: &str,
    ) {
        self.insert(Entity::PipelineVersion(PipelineVersion {
            id: id.to_string(),
            name: format!("pipeline version {}", id),
            manifest: "steps: []".to_string(),
            namespace: namespace.to_string(),
            time_created: DateTime::UNIX_EPOCH,
            references: vec![trellis_common::api::ResourceReference::owner(
                ResourceType::Pipeline,
                pipeline_id,
            )],
        }));
    }
}

#[async_trait]
impl EntityStore for InMemoryStore {
    async fn get(
        &self,
        resource_type: ResourceType,
        id: &str,
    ) -> LookupResult<Entity> {
        let entities = self.entities.lock().unwrap();
        entities
            .get(&(resource_type, id.to_string()))
            .cloned()
            .ok_or_else(|| Error::not_found_by_id(resource_type, id))
    }

    async fn put(&self, entity: Entity) -> CreateResult<()> {
        let key = (entity.resource_type(), entity.id().to_string());
        let mut entities = self.entities.lock().unwrap();
        if entities.contains_key(&key) {
            return Err(Error::ObjectAlreadyExists {
                type_name: entity.resource_type(),
                object_name: entity.id().to_string(),
            });
        }
        entities.insert(key, entity);
        self.puts.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn list_children(
        &self,
        owner: &ResourceKey,
    ) -> ListResultVec<Entity> {
        let entities = self.entities.lock().unwrap();
        Ok(entities
            .values()
            .filter(|entity| {
                entity.references().iter().any(|reference| {
                    reference.relationship == Relationship::Owner
                        && reference.key == *owner
                })
            })
            .cloned()
            .collect())
    }
}

/// What a [`RecordingRbacProvider`] answers for every check
#[derive(Clone, Debug)]
enum RbacAnswer {
    Allow,
    Deny(String),
}

/// RBAC provider with a fixed answer that records every check it receives
#[derive(Debug)]
pub struct RecordingRbacProvider {
    answer: RbacAnswer,
    checks: Mutex<Vec<(String, AccessAttributes)>>,
}

impl RecordingRbacProvider {
    pub fn allow_all() -> RecordingRbacProvider {
        RecordingRbacProvider {
            answer: RbacAnswer::Allow,
            checks: Mutex::new(Vec::new()),
        }
    }

    pub fn deny_all(reason: &str) -> RecordingRbacProvider {
        RecordingRbacProvider {
            answer: RbacAnswer::Deny(reason.to_string()),
            checks: Mutex::new(Vec::new()),
        }
    }

    /// Returns the (actor id, attributes) pairs checked so far
    pub fn checks(&self) -> Vec<(String, AccessAttributes)> {
        self.checks.lock().unwrap().clone()
    }
}

#[async_trait]
impl RbacProvider for RecordingRbacProvider {
    async fn check(
        &self,
        actor: &authn::Actor,
        attributes: &AccessAttributes,
    ) -> Result<Decision, ProviderError> {
        self.checks
            .lock()
            .unwrap()
            .push((actor.id().to_string(), attributes.clone()));
        Ok(match &self.answer {
            RbacAnswer::Allow => Decision::allow(),
            RbacAnswer::Deny(reason) => Decision::deny(reason),
        })
    }
}

/// RBAC provider whose backend can never be reached
#[derive(Debug)]
pub struct UnreachableRbacProvider;

#[async_trait]
impl RbacProvider for UnreachableRbacProvider {
    async fn check(
        &self,
        _actor: &authn::Actor,
        _attributes: &AccessAttributes,
    ) -> Result<Decision, ProviderError> {
        Err(ProviderError(anyhow::anyhow!("connection refused")))
    }
}

/// Workflow engine that records submissions and mints handles
/// "workflow-1", "workflow-2", ...
///
/// Rejects an empty manifest as an invalid specification, which is the
/// cheapest realistic engine-side failure to provoke in tests.
#[derive(Debug, Default)]
pub struct RecordingWorkflowEngine {
    submissions: Mutex<Vec<WorkflowSpec>>,
    counter: AtomicU64,
}

impl RecordingWorkflowEngine {
    pub fn new() -> RecordingWorkflowEngine {
        RecordingWorkflowEngine::default()
    }

    pub fn submissions(&self) -> Vec<WorkflowSpec> {
        self.submissions.lock().unwrap().clone()
    }
}

#[async_trait]
impl WorkflowEngine for RecordingWorkflowEngine {
    async fn submit(
        &self,
        spec: &WorkflowSpec,
    ) -> Result<EngineHandle, EngineError> {
        if spec.manifest.is_empty() {
            return Err(EngineError::InvalidSpec {
                message: "manifest is empty".to_string(),
            });
        }
        self.submissions.lock().unwrap().push(spec.clone());
        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(EngineHandle(format!("workflow-{}", n)))
    }
}

/// Workflow engine that can never be reached
#[derive(Debug)]
pub struct UnreachableWorkflowEngine;

#[async_trait]
impl WorkflowEngine for UnreachableWorkflowEngine {
    async fn submit(
        &self,
        _spec: &WorkflowSpec,
    ) -> Result<EngineHandle, EngineError> {
        Err(EngineError::Unavailable {
            source: anyhow::anyhow!("connection refused"),
        })
    }
}
