// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Authentication and authorization for the Trellis API server
//!
//! [`authn`] establishes *who* is making a request (from a trusted
//! proxy-injected header in multi-tenant mode, or a fixed anonymous identity
//! in single-tenant mode).  [`authz`] decides *whether* that caller may
//! perform an action on a namespaced resource, by consulting an external
//! RBAC provider.  Both are HTTP-agnostic beyond reading a header map.

pub mod authn;
pub mod authz;
