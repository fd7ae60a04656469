// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Resource manager: orchestration of entity creation
//!
//! [`ResourceManager`] owns no policy and no storage of its own.  It wires
//! the injected collaborators together and enforces one fixed order for
//! every create operation:
//!
//! 1. cheap structural checks on the request itself
//! 2. namespace resolution
//! 3. authorization (fail fast; no further store access on deny)
//! 4. reference validation (fail fast)
//! 5. entity construction (id from the generator, timestamp from the clock)
//! 6. persistence (atomic check-and-insert at the store)
//!
//! Run creation inserts a workflow-engine submission between steps 4 and 6.
//! Nothing is retried anywhere on this path; a failed step leaves the store
//! untouched except that persistence itself has already been reached.

use crate::clock::Clock;
use crate::config::TenancyConfig;
use crate::context::OpContext;
use crate::ids::IdGenerator;
use crate::namespace;
use crate::reference;
use crate::store::EntityStore;
use crate::workflow::WorkflowEngine;
use slog::info;
use slog::Logger;
use std::sync::Arc;
use trellis_auth::authn::external::IdentityExtractor;
use trellis_auth::authz::Gate;
use trellis_auth::authz::RbacProvider;
use trellis_common::api::AccessAttributes;
use trellis_common::api::Action;
use trellis_common::api::Error;
use trellis_common::api::ResourceReference;
use trellis_common::api::ResourceType;

mod experiment;
mod pipeline;
mod run;

/// Everything settled before an entity may be constructed
struct CreatePrelude {
    namespace: String,
    references: Vec<ResourceReference>,
}

/// The authorization-and-integrity core of the API server
pub struct ResourceManager {
    log: Logger,
    tenancy: TenancyConfig,
    store: Arc<dyn EntityStore>,
    gate: Gate,
    clock: Arc<dyn Clock>,
    id_generator: Arc<dyn IdGenerator>,
    workflow_engine: Arc<dyn WorkflowEngine>,
}

impl ResourceManager {
    /// Construct a resource manager from its collaborators
    ///
    /// The authorization mode is fixed here from the tenancy config:
    /// multi-tenant mode requires an RBAC provider and builds an enforcing
    /// gate; single-tenant mode builds the explicit bypass and ignores any
    /// provider it is given.
    pub fn new(
        log: Logger,
        tenancy: TenancyConfig,
        store: Arc<dyn EntityStore>,
        rbac_provider: Option<Arc<dyn RbacProvider>>,
        clock: Arc<dyn Clock>,
        id_generator: Arc<dyn IdGenerator>,
        workflow_engine: Arc<dyn WorkflowEngine>,
    ) -> Result<ResourceManager, Error> {
        let gate = if tenancy.multi_tenant {
            let provider = rbac_provider.ok_or_else(|| {
                Error::internal_error(
                    "multi-tenant mode requires an RBAC provider",
                )
            })?;
            Gate::new(provider)
        } else {
            Gate::bypassed()
        };
        info!(log, "resource manager starting";
            "multi_tenant" => tenancy.multi_tenant,
            "default_namespace" => &tenancy.default_namespace,
        );
        Ok(ResourceManager {
            log,
            tenancy,
            store,
            gate,
            clock,
            id_generator,
            workflow_engine,
        })
    }

    pub fn log(&self) -> &Logger {
        &self.log
    }

    pub fn gate(&self) -> &Gate {
        &self.gate
    }

    /// Returns the identity extractor matching this server's tenancy mode
    pub fn identity_extractor(&self) -> IdentityExtractor {
        self.tenancy.identity_extractor()
    }

    /// Run the shared pre-persistence sequence for a create operation
    ///
    /// Order matters and is the same for every entity type: structural name
    /// check, namespace resolution, authorization, reference validation.
    /// The store is only consulted for the minimal owner read during
    /// namespace resolution and for reference resolution after the gate has
    /// allowed the request.
    async fn prepare_create(
        &self,
        opctx: &OpContext,
        resource_type: ResourceType,
        name: &str,
        references: &[ResourceReference],
    ) -> Result<CreatePrelude, Error> {
        if name.is_empty() {
            return Err(Error::invalid_request("name must not be empty"));
        }
        let namespace = namespace::resolve_namespace(
            &self.tenancy,
            &*self.store,
            resource_type,
            references,
        )
        .await?;
        let attributes = AccessAttributes {
            namespace: namespace.clone(),
            resource_type,
            action: Action::Create,
        };
        self.gate.authorize(&opctx.log, &opctx.authn, &attributes).await?;
        let references = reference::validate_references(
            &opctx.log,
            &*self.store,
            resource_type,
            self.tenancy.multi_tenant,
            references,
        )
        .await?;
        Ok(CreatePrelude { namespace, references })
    }
}
