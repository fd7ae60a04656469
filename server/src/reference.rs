// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Reference schema and validation
//!
//! Each creatable entity type has a fixed schema describing which
//! (target type, relationship) pairs it may declare, how many of each, and
//! whether the target must exist in the store.  Validation is read-only and
//! fails fast on the first violation, in the order the references were
//! declared.  It runs strictly after the authorization gate, so an
//! unauthorized caller learns nothing about which identifiers exist.
//!
//! The legality table is closed: a pair not listed here is rejected outright.
//! Notably no rule anywhere admits a `Job` target, and `Namespace` targets
//! are never store-backed because namespaces are platform-owned rather than
//! entities this server persists.

use crate::store::EntityStore;
use slog::debug;
use slog::Logger;
use trellis_common::api::Error;
use trellis_common::api::Relationship;
use trellis_common::api::ResourceReference;
use trellis_common::api::ResourceType;

/// How many references matching a rule an entity may declare
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Cardinality {
    /// the reference is required and must appear exactly once
    ExactlyOne,
    /// the reference is optional but may appear at most once
    ZeroOrOne,
}

/// One legal (target type, relationship) pair for an entity type
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct SchemaRule {
    pub target: ResourceType,
    pub relationship: Relationship,
    pub cardinality: Cardinality,
    /// whether the target must resolve to an existing stored entity
    pub store_backed: bool,
}

/// Experiments and Pipelines in multi-tenant mode declare their owning
/// namespace explicitly.  The namespace is not a stored entity.
const NAMESPACE_OWNED: &[SchemaRule] = &[SchemaRule {
    target: ResourceType::Namespace,
    relationship: Relationship::Owner,
    cardinality: Cardinality::ExactlyOne,
    store_backed: false,
}];

const PIPELINE_VERSION_REFERENCES: &[SchemaRule] = &[
    SchemaRule {
        target: ResourceType::Pipeline,
        relationship: Relationship::Owner,
        cardinality: Cardinality::ExactlyOne,
        store_backed: true,
    },
    SchemaRule {
        target: ResourceType::PipelineVersion,
        relationship: Relationship::Creator,
        cardinality: Cardinality::ZeroOrOne,
        store_backed: true,
    },
];

const RUN_REFERENCES: &[SchemaRule] = &[
    SchemaRule {
        target: ResourceType::Experiment,
        relationship: Relationship::Owner,
        cardinality: Cardinality::ExactlyOne,
        store_backed: true,
    },
    SchemaRule {
        target: ResourceType::PipelineVersion,
        relationship: Relationship::Creator,
        cardinality: Cardinality::ZeroOrOne,
        store_backed: true,
    },
];

const NO_REFERENCES: &[SchemaRule] = &[];

/// Returns the reference schema for creating an entity of the given type
///
/// Experiments and Pipelines are namespace roots: their schema depends on
/// the tenancy mode.  PipelineVersions and Runs inherit their namespace from
/// a store-backed owner, so their schema is the same in both modes.
pub fn reference_schema(
    resource_type: ResourceType,
    multi_tenant: bool,
) -> &'static [SchemaRule] {
    match resource_type {
        ResourceType::Experiment | ResourceType::Pipeline => {
            if multi_tenant {
                NAMESPACE_OWNED
            } else {
                NO_REFERENCES
            }
        }
        ResourceType::PipelineVersion => PIPELINE_VERSION_REFERENCES,
        ResourceType::Run => RUN_REFERENCES,
        // Nothing creatable here; no pair is legal.
        ResourceType::Namespace | ResourceType::Job => NO_REFERENCES,
    }
}

fn matching_rule(
    schema: &'static [SchemaRule],
    reference: &ResourceReference,
) -> Option<&'static SchemaRule> {
    schema.iter().find(|rule| {
        rule.target == reference.key.resource_type
            && rule.relationship == reference.relationship
    })
}

/// Validate a declared reference list against the schema for `resource_type`
///
/// Checks, in order: every declared pair is legal, no pair exceeds its
/// cardinality, every required pair is present, and every store-backed
/// target exists.  The first violation is returned and nothing is written.
/// Existence checks run in declaration order, so the error for a list with
/// several missing targets names the first one.
///
/// On success the declared list is returned unchanged and in order; it is
/// what gets persisted on the entity.
pub async fn validate_references(
    log: &Logger,
    store: &dyn EntityStore,
    resource_type: ResourceType,
    multi_tenant: bool,
    references: &[ResourceReference],
) -> Result<Vec<ResourceReference>, Error> {
    let schema = reference_schema(resource_type, multi_tenant);
    for reference in references {
        if matching_rule(schema, reference).is_none() {
            return Err(Error::invalid_request(&format!(
                "a {} may not declare a {} reference to a {}",
                resource_type,
                reference.relationship,
                reference.key.resource_type,
            )));
        }
    }

    for rule in schema {
        let count = references
            .iter()
            .filter(|reference| {
                reference.key.resource_type == rule.target
                    && reference.relationship == rule.relationship
            })
            .count();
        match rule.cardinality {
            Cardinality::ExactlyOne if count == 0 => {
                return Err(Error::invalid_request(&format!(
                    "a {} requires exactly one {} reference to a {}",
                    resource_type, rule.relationship, rule.target,
                )));
            }
            Cardinality::ExactlyOne | Cardinality::ZeroOrOne if count > 1 => {
                return Err(Error::invalid_request(&format!(
                    "a {} may declare at most one {} reference to a {}",
                    resource_type, rule.relationship, rule.target,
                )));
            }
            _ => (),
        }
    }

    for reference in references {
        // The legality pass above rejected any reference without a rule.
        let Some(rule) = matching_rule(schema, reference) else {
            return Err(Error::internal_error(
                "reference lost its schema rule between passes",
            ));
        };
        if rule.store_backed {
            store
                .get(reference.key.resource_type, &reference.key.id)
                .await?;
        }
    }

    debug!(log, "reference validation passed";
        "resource_type" => %resource_type,
        "count" => references.len(),
    );
    Ok(references.to_vec())
}
