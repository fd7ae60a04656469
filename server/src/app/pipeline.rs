// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Pipelines and their versions
//!
//! A pipeline is a named container; the definition itself lives on its
//! versions.  A version must name its owning pipeline and may name the
//! version it was derived from.

use crate::context::OpContext;
use crate::model::Entity;
use crate::model::Pipeline;
use crate::model::PipelineVersion;
use slog::info;
use trellis_common::api::CreateResult;
use trellis_common::api::Error;
use trellis_common::api::PipelineCreate;
use trellis_common::api::PipelineVersionCreate;
use trellis_common::api::ResourceType;

impl super::ResourceManager {
    pub async fn pipeline_create(
        &self,
        opctx: &OpContext,
        params: &PipelineCreate,
    ) -> CreateResult<Pipeline> {
        let prelude = self
            .prepare_create(
                opctx,
                ResourceType::Pipeline,
                &params.name,
                &params.references,
            )
            .await?;
        let pipeline = Pipeline {
            id: self.id_generator.new_id(),
            name: params.name.clone(),
            description: params.description.clone(),
            namespace: prelude.namespace,
            time_created: self.clock.now(),
            references: prelude.references,
        };
        self.store.put(Entity::Pipeline(pipeline.clone())).await?;
        info!(opctx.log, "created pipeline";
            "id" => &pipeline.id,
            "namespace" => &pipeline.namespace,
        );
        Ok(pipeline)
    }

    pub async fn pipeline_version_create(
        &self,
        opctx: &OpContext,
        params: &PipelineVersionCreate,
    ) -> CreateResult<PipelineVersion> {
        // A version without a definition is useless; reject it before
        // consulting any collaborator.
        if params.manifest.is_empty() {
            return Err(Error::invalid_request("manifest must not be empty"));
        }
        let prelude = self
            .prepare_create(
                opctx,
                ResourceType::PipelineVersion,
                &params.name,
                &params.references,
            )
            .await?;
        let version = PipelineVersion {
            id: self.id_generator.new_id(),
            name: params.name.clone(),
            manifest: params.manifest.clone(),
            namespace: prelude.namespace,
            time_created: self.clock.now(),
            references: prelude.references,
        };
        self.store.put(Entity::PipelineVersion(version.clone())).await?;
        info!(opctx.log, "created pipeline version";
            "id" => &version.id,
            "namespace" => &version.namespace,
        );
        Ok(version)
    }
}
