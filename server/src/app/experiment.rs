// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Experiments: grouping containers for runs

use crate::context::OpContext;
use crate::model::Entity;
use crate::model::Experiment;
use slog::info;
use trellis_common::api::CreateResult;
use trellis_common::api::ExperimentCreate;
use trellis_common::api::ResourceType;

impl super::ResourceManager {
    pub async fn experiment_create(
        &self,
        opctx: &OpContext,
        params: &ExperimentCreate,
    ) -> CreateResult<Experiment> {
        let prelude = self
            .prepare_create(
                opctx,
                ResourceType::Experiment,
                &params.name,
                &params.references,
            )
            .await?;
        let experiment = Experiment {
            id: self.id_generator.new_id(),
            name: params.name.clone(),
            description: params.description.clone(),
            namespace: prelude.namespace,
            time_created: self.clock.now(),
            references: prelude.references,
        };
        self.store.put(Entity::Experiment(experiment.clone())).await?;
        info!(opctx.log, "created experiment";
            "id" => &experiment.id,
            "namespace" => &experiment.namespace,
        );
        Ok(experiment)
    }
}
