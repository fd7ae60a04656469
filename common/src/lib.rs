// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Types shared by the Trellis pipeline-orchestration API server
//!
//! This crate is transport-agnostic: it defines the resource model (resource
//! types, relationships, references), the request parameter types for the
//! create operations, and the error taxonomy that every layer of the server
//! speaks.  Nothing here knows about gRPC, HTTP, or the database.

pub mod api;
