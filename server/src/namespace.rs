// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Namespace resolution
//!
//! Every entity belongs to exactly one tenant namespace, derived by the
//! server rather than taken from an arbitrary request field.  In
//! single-tenant mode everything lands in the configured default namespace.
//! In multi-tenant mode the namespace comes from the entity's `Owner`
//! reference: namespace roots (experiments, pipelines) name theirs
//! explicitly, while owned entities (pipeline versions, runs) inherit the
//! namespace of their stored parent.
//!
//! Resolution runs before the authorization gate because the gate needs the
//! namespace to phrase its question.  The single store read performed here,
//! fetching the declared owner parent, is the only pre-authorization read in
//! the system; full reference validation waits until after authorization.

use crate::config::TenancyConfig;
use crate::reference::reference_schema;
use crate::reference::Cardinality;
use crate::store::EntityStore;
use trellis_common::api::Error;
use trellis_common::api::Relationship;
use trellis_common::api::ResourceReference;
use trellis_common::api::ResourceType;

/// Determine the tenant namespace for an entity about to be created
pub async fn resolve_namespace(
    tenancy: &TenancyConfig,
    store: &dyn EntityStore,
    resource_type: ResourceType,
    references: &[ResourceReference],
) -> Result<String, Error> {
    if !tenancy.multi_tenant {
        return Ok(tenancy.default_namespace.clone());
    }

    let schema = reference_schema(resource_type, true);
    let owner_rule = schema
        .iter()
        .find(|rule| {
            rule.relationship == Relationship::Owner
                && rule.cardinality == Cardinality::ExactlyOne
        })
        .ok_or_else(|| {
            Error::invalid_request(&format!(
                "no namespace can be derived for a {}",
                resource_type,
            ))
        })?;

    let owner_reference = references
        .iter()
        .find(|reference| {
            reference.key.resource_type == owner_rule.target
                && reference.relationship == Relationship::Owner
        })
        .ok_or_else(|| {
            Error::invalid_request(&format!(
                "a {} requires an owner reference to a {} to determine its \
                 namespace",
                resource_type, owner_rule.target,
            ))
        })?;

    if !owner_rule.store_backed {
        // Namespace roots name their namespace directly; namespaces are
        // platform-owned, so there is nothing to fetch.
        return Ok(owner_reference.key.id.clone());
    }

    let parent =
        store.get(owner_rule.target, &owner_reference.key.id).await?;
    Ok(parent.namespace().to_string())
}
