// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Authorization gate
//!
//! Authorization is expressed as role-based access control over
//! (identity, namespace, resource type, verb) tuples, but the policy itself
//! lives outside this server: a [`RbacProvider`] renders the allow/deny
//! decision and this module turns that decision into either `Ok(())` or a
//! `Forbidden` error carrying everything an audit log needs.
//!
//! Two properties matter to callers:
//!
//! - The single-tenant bypass is an explicit mode of the [`Gate`], chosen at
//!   construction from the tenancy configuration and observable via
//!   [`Gate::is_bypassed()`].  It is not an accidental no-op.
//! - "Denied" and "could not determine" are distinct: an explicit deny is
//!   `Forbidden`, while a provider transport failure is `ServiceUnavailable`
//!   so an outer layer may retry.  The gate itself never retries.

use crate::authn;
use async_trait::async_trait;
use slog::debug;
use slog::warn;
use slog::Logger;
use std::sync::Arc;
use trellis_common::api::AccessAttributes;
use trellis_common::api::Error;

/// Fallback denial reason when the provider supplies none
///
/// `Forbidden` promises a non-empty reason to the caller.
const UNSPECIFIED_DENY_REASON: &str = "access denied by authorization policy";

/// The outcome of one RBAC check
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Decision {
    pub allowed: bool,
    /// human-readable explanation, mainly useful on deny
    pub reason: Option<String>,
}

impl Decision {
    pub fn allow() -> Decision {
        Decision { allowed: true, reason: None }
    }

    pub fn deny(reason: &str) -> Decision {
        Decision { allowed: false, reason: Some(reason.to_string()) }
    }
}

/// Failure to obtain a decision from the RBAC provider
///
/// This is a transport-level failure, not a denial.
#[derive(Debug, thiserror::Error)]
#[error("cannot reach RBAC provider: {0:#}")]
pub struct ProviderError(#[from] pub anyhow::Error);

/// External decision provider for RBAC checks
///
/// Production wiring injects a client for the real backend; tests inject a
/// deterministic fake.
#[async_trait]
pub trait RbacProvider: Send + Sync + std::fmt::Debug {
    async fn check(
        &self,
        actor: &authn::Actor,
        attributes: &AccessAttributes,
    ) -> Result<Decision, ProviderError>;
}

/// Decides whether a caller may perform an action on a namespaced resource
#[derive(Clone, Debug)]
pub struct Gate {
    /// `None` is the explicit single-tenant bypass
    provider: Option<Arc<dyn RbacProvider>>,
}

impl Gate {
    /// Returns an enforcing gate backed by the given provider
    pub fn new(provider: Arc<dyn RbacProvider>) -> Gate {
        Gate { provider: Some(provider) }
    }

    /// Returns the single-tenant gate, which allows every request
    pub fn bypassed() -> Gate {
        Gate { provider: None }
    }

    pub fn is_bypassed(&self) -> bool {
        self.provider.is_none()
    }

    /// Check whether the authenticated actor may perform the action
    /// described by `attributes`
    ///
    /// Performs no writes and no retries.  On deny, the returned `Forbidden`
    /// embeds the identity, the reason, and the attribute set.
    pub async fn authorize(
        &self,
        log: &Logger,
        authn: &authn::Context,
        attributes: &AccessAttributes,
    ) -> Result<(), Error> {
        let provider = match &self.provider {
            None => {
                debug!(log, "authz bypassed (single-tenant mode)";
                    "attributes" => %attributes,
                );
                return Ok(());
            }
            Some(provider) => provider,
        };

        let actor = authn.actor_required()?;
        let decision = provider
            .check(actor, attributes)
            .await
            .map_err(|error| Error::unavail(&format!("{}", error)))?;

        if decision.allowed {
            debug!(log, "authz allowed";
                "actor" => actor.id(),
                "attributes" => %attributes,
            );
            return Ok(());
        }

        let reason = match decision.reason {
            Some(reason) if !reason.is_empty() => reason,
            _ => UNSPECIFIED_DENY_REASON.to_string(),
        };
        warn!(log, "authz denied";
            "actor" => actor.id(),
            "reason" => &reason,
            "attributes" => %attributes,
        );
        Err(Error::Forbidden {
            identity: actor.id().to_string(),
            reason,
            attributes: attributes.clone(),
        })
    }
}

#[cfg(test)]
mod test {
    use super::Decision;
    use super::Gate;
    use super::ProviderError;
    use super::RbacProvider;
    use crate::authn;
    use anyhow::anyhow;
    use async_trait::async_trait;
    use slog::o;
    use slog::Logger;
    use std::sync::Arc;
    use trellis_common::api::AccessAttributes;
    use trellis_common::api::Action;
    use trellis_common::api::Error;
    use trellis_common::api::ResourceType;

    fn test_log() -> Logger {
        Logger::root(slog::Discard, o!())
    }

    fn attributes() -> AccessAttributes {
        AccessAttributes {
            namespace: "ns1".to_string(),
            resource_type: ResourceType::Experiment,
            action: Action::Create,
        }
    }

    /// Provider that returns the same decision for every check
    #[derive(Debug)]
    struct FixedProvider(Decision);

    #[async_trait]
    impl RbacProvider for FixedProvider {
        async fn check(
            &self,
            _actor: &authn::Actor,
            _attributes: &AccessAttributes,
        ) -> Result<Decision, ProviderError> {
            Ok(self.0.clone())
        }
    }

    /// Provider whose backend is unreachable
    #[derive(Debug)]
    struct UnreachableProvider;

    #[async_trait]
    impl RbacProvider for UnreachableProvider {
        async fn check(
            &self,
            _actor: &authn::Actor,
            _attributes: &AccessAttributes,
        ) -> Result<Decision, ProviderError> {
            Err(ProviderError(anyhow!("connection refused")))
        }
    }

    #[tokio::test]
    async fn test_bypassed_gate_allows() {
        let gate = Gate::bypassed();
        assert!(gate.is_bypassed());
        // The bypass applies regardless of who (if anyone) is calling.
        gate.authorize(
            &test_log(),
            &authn::Context::anonymous(),
            &attributes(),
        )
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_allow() {
        let gate = Gate::new(Arc::new(FixedProvider(Decision::allow())));
        assert!(!gate.is_bypassed());
        gate.authorize(
            &test_log(),
            &authn::Context::for_user("user@example.com"),
            &attributes(),
        )
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_deny_carries_audit_context() {
        let gate = Gate::new(Arc::new(FixedProvider(Decision::deny(
            "this is not allowed",
        ))));
        let error = gate
            .authorize(
                &test_log(),
                &authn::Context::for_user("user@example.com"),
                &attributes(),
            )
            .await
            .unwrap_err();
        match error {
            Error::Forbidden { identity, reason, attributes: attrs } => {
                assert_eq!(identity, "user@example.com");
                assert_eq!(reason, "this is not allowed");
                assert_eq!(attrs, attributes());
            }
            other => panic!("expected Forbidden, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_deny_reason_never_empty() {
        let gate = Gate::new(Arc::new(FixedProvider(Decision {
            allowed: false,
            reason: None,
        })));
        let error = gate
            .authorize(
                &test_log(),
                &authn::Context::for_user("user@example.com"),
                &attributes(),
            )
            .await
            .unwrap_err();
        match error {
            Error::Forbidden { reason, .. } => assert!(!reason.is_empty()),
            other => panic!("expected Forbidden, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_provider_failure_is_not_a_denial() {
        let gate = Gate::new(Arc::new(UnreachableProvider));
        let error = gate
            .authorize(
                &test_log(),
                &authn::Context::for_user("user@example.com"),
                &attributes(),
            )
            .await
            .unwrap_err();
        assert!(matches!(error, Error::ServiceUnavailable { .. }));
        assert!(error.retryable());
    }

    #[tokio::test]
    async fn test_enforcing_gate_requires_actor() {
        let gate = Gate::new(Arc::new(FixedProvider(Decision::allow())));
        let error = gate
            .authorize(
                &test_log(),
                &authn::Context::unauthenticated(),
                &attributes(),
            )
            .await
            .unwrap_err();
        assert!(matches!(error, Error::Unauthenticated { .. }));
    }
}
