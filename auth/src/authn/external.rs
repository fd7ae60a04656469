// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Identity extraction from inbound request headers
//!
//! In multi-tenant mode, the server sits behind a trusted authenticating
//! proxy that injects the caller's identity into a single expected header as
//! `prefix + identity` (e.g., `accounts.google.com:user@example.com`).  Only
//! that header is trusted; no other header or transport metadata is
//! consulted for identity.  Absence of the header, a non-UTF-8 value, or a
//! value without the expected prefix fails authentication.
//!
//! In single-tenant mode there is no proxy and no header: extraction always
//! yields the fixed anonymous identity and never fails.

use crate::authn::Context;
use crate::authn::Reason;
use anyhow::anyhow;
use http::HeaderMap;
use trellis_common::api::Error;

/// Header the trusted proxy uses to convey the caller identity
pub const DEFAULT_IDENTITY_HEADER: &str = "x-goog-authenticated-user-email";

/// Prefix the trusted proxy prepends to the identity value
pub const DEFAULT_IDENTITY_PREFIX: &str = "accounts.google.com:";

/// Resolves a caller identity from request headers
///
/// The variant is chosen once at startup from the tenancy configuration;
/// there is no per-request fallback between modes.
#[derive(Clone, Debug)]
pub enum IdentityExtractor {
    /// Single-tenant mode: always the fixed anonymous identity
    SingleUser,
    /// Multi-tenant mode: identity from the trusted proxy-injected header
    TrustedHeader { header: String, prefix: String },
}

impl IdentityExtractor {
    pub fn single_user() -> IdentityExtractor {
        IdentityExtractor::SingleUser
    }

    pub fn trusted_header(header: &str, prefix: &str) -> IdentityExtractor {
        IdentityExtractor::TrustedHeader {
            header: header.to_string(),
            prefix: prefix.to_string(),
        }
    }

    /// Resolve the caller identity for one request
    ///
    /// Single-user extraction is infallible.  Trusted-header extraction
    /// fails with `Unauthenticated` if the header is missing or malformed.
    pub fn resolve(&self, headers: &HeaderMap) -> Result<Context, Error> {
        match self {
            IdentityExtractor::SingleUser => Ok(Context::anonymous()),
            IdentityExtractor::TrustedHeader { header, prefix } => {
                let identity = parse_identity_header(headers, header, prefix)?;
                Ok(Context::for_user(&identity))
            }
        }
    }
}

fn parse_identity_header(
    headers: &HeaderMap,
    header: &str,
    prefix: &str,
) -> Result<String, Reason> {
    let value = headers.get(header).ok_or_else(|| Reason::MissingHeader {
        header: header.to_string(),
    })?;
    let value = value.to_str().map_err(|_| Reason::BadFormat {
        source: anyhow!("header {:?} is not valid UTF-8", header),
    })?;
    let identity = value.strip_prefix(prefix).ok_or_else(|| {
        Reason::BadFormat {
            source: anyhow!(
                "header {:?} value does not start with {:?}",
                header,
                prefix
            ),
        }
    })?;
    if identity.is_empty() {
        return Err(Reason::BadFormat {
            source: anyhow!("header {:?} carried an empty identity", header),
        });
    }
    Ok(identity.to_string())
}

#[cfg(test)]
mod test {
    use super::parse_identity_header;
    use super::IdentityExtractor;
    use super::DEFAULT_IDENTITY_HEADER;
    use super::DEFAULT_IDENTITY_PREFIX;
    use crate::authn::Actor;
    use crate::authn::Reason;
    use http::HeaderMap;
    use http::HeaderValue;
    use trellis_common::api::Error;

    fn headers_with_identity(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            DEFAULT_IDENTITY_HEADER,
            HeaderValue::from_str(value).unwrap(),
        );
        headers
    }

    fn default_extractor() -> IdentityExtractor {
        IdentityExtractor::trusted_header(
            DEFAULT_IDENTITY_HEADER,
            DEFAULT_IDENTITY_PREFIX,
        )
    }

    #[test]
    fn test_single_user_never_fails() {
        let extractor = IdentityExtractor::single_user();
        let authn = extractor.resolve(&HeaderMap::new()).unwrap();
        assert_eq!(authn.actor().unwrap(), &Actor::Anonymous);
    }

    #[test]
    fn test_trusted_header_valid() {
        let extractor = default_extractor();
        let headers =
            headers_with_identity("accounts.google.com:user@example.com");
        let authn = extractor.resolve(&headers).unwrap();
        assert_eq!(authn.actor().unwrap().id(), "user@example.com");
    }

    #[test]
    fn test_trusted_header_missing() {
        let extractor = default_extractor();
        let error = extractor.resolve(&HeaderMap::new()).unwrap_err();
        assert!(matches!(error, Error::Unauthenticated { .. }));
    }

    #[test]
    fn test_trusted_header_unprefixed() {
        let extractor = default_extractor();
        // The client provided a bare identity without the prefix the trusted
        // proxy would have added.  Nothing else may vouch for it.
        let headers = headers_with_identity("user@example.com");
        let error = extractor.resolve(&headers).unwrap_err();
        match error {
            Error::Unauthenticated { internal_message } => {
                assert!(internal_message.contains("does not start with"));
            }
            _ => panic!("expected Unauthenticated"),
        }
    }

    #[test]
    fn test_trusted_header_empty_identity() {
        let headers = headers_with_identity(DEFAULT_IDENTITY_PREFIX);
        let result = parse_identity_header(
            &headers,
            DEFAULT_IDENTITY_HEADER,
            DEFAULT_IDENTITY_PREFIX,
        );
        assert!(matches!(result, Err(Reason::BadFormat { .. })));
    }

    #[test]
    fn test_trusted_header_not_utf8() {
        let mut headers = HeaderMap::new();
        headers.insert(
            DEFAULT_IDENTITY_HEADER,
            HeaderValue::from_bytes(b"accounts.google.com:not-\x80-utf8")
                .unwrap(),
        );
        let result = parse_identity_header(
            &headers,
            DEFAULT_IDENTITY_HEADER,
            DEFAULT_IDENTITY_PREFIX,
        );
        assert!(matches!(result, Err(Reason::BadFormat { .. })));
    }
}
