// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Entity store collaborator interface
//!
//! All durability and uniqueness guarantees belong to the store: `put` must
//! provide atomic check-and-insert semantics keyed by identifier.  The core
//! only ever calls `put` after authorization and reference validation have
//! both succeeded, so a request either produces exactly one store write or
//! none at all.

use crate::model::Entity;
use async_trait::async_trait;
use trellis_common::api::CreateResult;
use trellis_common::api::ListResultVec;
use trellis_common::api::LookupResult;
use trellis_common::api::ResourceKey;
use trellis_common::api::ResourceType;

#[async_trait]
pub trait EntityStore: Send + Sync + std::fmt::Debug {
    /// Fetch the entity with the given type and id
    ///
    /// Returns `ObjectNotFound` if no entity of that type has that id.  An
    /// id that exists under a different type is still `ObjectNotFound`: a
    /// reference must resolve to an entity of its declared type.
    async fn get(
        &self,
        resource_type: ResourceType,
        id: &str,
    ) -> LookupResult<Entity>;

    /// Persist a new entity
    ///
    /// Must be an atomic check-and-insert on the entity's key; an existing
    /// entity with the same key fails `ObjectAlreadyExists` and leaves the
    /// store unchanged.
    async fn put(&self, entity: Entity) -> CreateResult<()>;

    /// List entities holding an `Owner` reference to the given key
    ///
    /// Cascade checks on delete (outside this core) use this to verify no
    /// live children remain.
    async fn list_children(&self, owner: &ResourceKey)
        -> ListResultVec<Entity>;
}
