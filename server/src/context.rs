// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Shared operation context
//!
//! An [`OpContext`] bundles the resolved caller identity with a logger
//! carrying that identity, and accompanies every operation through the core.
//! Identity extraction happens exactly once, when the context is built for a
//! request; nothing downstream re-reads headers.

use http::HeaderMap;
use slog::o;
use slog::Logger;
use trellis_auth::authn;
use trellis_auth::authn::external::IdentityExtractor;
use trellis_common::api::Error;

/// Provides context for one operation
#[derive(Clone, Debug)]
pub struct OpContext {
    pub log: Logger,
    pub authn: authn::Context,
}

impl OpContext {
    /// Build an `OpContext` for an inbound request
    ///
    /// This is the only place identity extraction runs.  Failure here is
    /// terminal for the request: an `Unauthenticated` caller never reaches
    /// the authorization gate or any store read.
    pub fn for_request(
        log: &Logger,
        extractor: &IdentityExtractor,
        headers: &HeaderMap,
    ) -> Result<OpContext, Error> {
        let authn = extractor.resolve(headers)?;
        Ok(OpContext::new(log, authn))
    }

    /// Build an `OpContext` from an already-resolved identity
    pub fn new(log: &Logger, authn: authn::Context) -> OpContext {
        let actor_id = match authn.actor() {
            Some(actor) => actor.id().to_string(),
            None => "unauthenticated".to_string(),
        };
        let log = log.new(o!("actor" => actor_id));
        OpContext { log, authn }
    }

    /// Returns an `OpContext` suitable for tests, with the given identity
    pub fn for_tests(log: &Logger, authn: authn::Context) -> OpContext {
        OpContext::new(log, authn)
    }
}
