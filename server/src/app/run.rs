// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Runs: single executions of a workflow within an experiment
//!
//! Run creation is the one operation with an external side effect beyond
//! the store: after validation, the resolved specification is submitted to
//! the workflow engine, and only then is the run persisted with the
//! engine's handle.  A run that was submitted but whose persistence fails
//! surfaces that persistence error; reconciling the orphaned engine
//! workflow is the engine operator's concern, not this core's.

use crate::context::OpContext;
use crate::model::Entity;
use crate::model::Run;
use crate::workflow::WorkflowSpec;
use slog::info;
use trellis_common::api::CreateResult;
use trellis_common::api::ResourceType;
use trellis_common::api::RunCreate;

impl super::ResourceManager {
    pub async fn run_create(
        &self,
        opctx: &OpContext,
        params: &RunCreate,
    ) -> CreateResult<Run> {
        let prelude = self
            .prepare_create(
                opctx,
                ResourceType::Run,
                &params.name,
                &params.references,
            )
            .await?;
        let spec = WorkflowSpec {
            manifest: params.workflow_manifest.clone(),
            parameters: params.parameters.clone(),
        };
        let handle = self.workflow_engine.submit(&spec).await?;
        let run = Run {
            id: self.id_generator.new_id(),
            name: params.name.clone(),
            namespace: prelude.namespace,
            time_created: self.clock.now(),
            references: prelude.references,
            workflow_spec: spec,
            engine_handle: handle.to_string(),
        };
        self.store.put(Entity::Run(run.clone())).await?;
        info!(opctx.log, "created run";
            "id" => &run.id,
            "namespace" => &run.namespace,
            "engine_handle" => &run.engine_handle,
        );
        Ok(run)
    }
}
