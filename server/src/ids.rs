// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Identifier generator collaborator
//!
//! Entity identifiers are opaque strings, unique within the store's
//! keyspace and never reused.  Uniqueness enforcement lives in the store's
//! atomic check-and-insert; the generator just has to not collide in
//! practice.

pub trait IdGenerator: Send + Sync + std::fmt::Debug {
    fn new_id(&self) -> String;
}

/// Production generator minting random UUIDs
#[derive(Clone, Debug)]
pub struct RandomIdGenerator;

impl IdGenerator for RandomIdGenerator {
    fn new_id(&self) -> String {
        uuid::Uuid::new_v4().to_string()
    }
}
