// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Resource manager core for the Trellis pipeline-orchestration API server
//!
//! This crate is the authorization-and-integrity gate that sits between the
//! transport layer (out of scope here) and the entity store: before any
//! experiment, pipeline, pipeline version, or run is persisted, the request
//! flows through identity extraction, namespace resolution, the
//! authorization gate, and reference validation, in that order.  Ordering is
//! deliberate: an unauthorized caller must not be able to use
//! reference-validation errors to probe for ids in a namespace they cannot
//! read, and nothing is ever written unless every check passed.
//!
//! All durable state and all policy decisions live in injected
//! collaborators ([`store::EntityStore`], `trellis_auth::authz::RbacProvider`,
//! [`workflow::WorkflowEngine`], [`clock::Clock`], [`ids::IdGenerator`]);
//! the core itself holds no mutable state, so concurrent requests need no
//! locking here.

pub mod app;
pub mod clock;
pub mod config;
pub mod context;
pub mod fakes;
pub mod ids;
pub mod model;
pub mod namespace;
pub mod reference;
pub mod store;
pub mod workflow;
