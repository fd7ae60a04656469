// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Interfaces for working with the server's config file

use camino::Utf8Path;
use camino::Utf8PathBuf;
use serde::Deserialize;
use serde::Serialize;
use slog_error_chain::SlogInlineError;
use trellis_auth::authn::external::IdentityExtractor;
use trellis_auth::authn::external::DEFAULT_IDENTITY_HEADER;
use trellis_auth::authn::external::DEFAULT_IDENTITY_PREFIX;

/// Configuration for the resource manager
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Config {
    /// tenancy mode and identity-header settings
    #[serde(default)]
    pub tenancy: TenancyConfig,
}

/// Tenancy mode and the trusted-header identity settings that go with it
///
/// The mode is fixed for the lifetime of the process.  The header and prefix
/// only matter when `multi_tenant` is true.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct TenancyConfig {
    /// whether the server enforces per-namespace isolation
    #[serde(default)]
    pub multi_tenant: bool,
    /// namespace assigned to all entities in single-tenant mode
    #[serde(default = "default_namespace")]
    pub default_namespace: String,
    /// header the trusted proxy uses to convey the caller identity
    #[serde(default = "default_identity_header")]
    pub identity_header: String,
    /// prefix the trusted proxy prepends to the identity value
    #[serde(default = "default_identity_prefix")]
    pub identity_header_prefix: String,
}

fn default_namespace() -> String {
    "default".to_string()
}

fn default_identity_header() -> String {
    DEFAULT_IDENTITY_HEADER.to_string()
}

fn default_identity_prefix() -> String {
    DEFAULT_IDENTITY_PREFIX.to_string()
}

impl Default for TenancyConfig {
    fn default() -> TenancyConfig {
        TenancyConfig {
            multi_tenant: false,
            default_namespace: default_namespace(),
            identity_header: default_identity_header(),
            identity_header_prefix: default_identity_prefix(),
        }
    }
}

impl TenancyConfig {
    /// Returns the identity extractor matching this tenancy mode
    pub fn identity_extractor(&self) -> IdentityExtractor {
        if self.multi_tenant {
            IdentityExtractor::trusted_header(
                &self.identity_header,
                &self.identity_header_prefix,
            )
        } else {
            IdentityExtractor::single_user()
        }
    }
}

impl Config {
    /// Load a `Config` from the given TOML file
    pub fn from_file(path: &Utf8Path) -> Result<Self, LoadError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|err| LoadError::Io { path: path.into(), err })?;
        let config = toml::from_str(&contents)
            .map_err(|err| LoadError::Parse { path: path.into(), err })?;
        Ok(config)
    }
}

#[derive(Debug, thiserror::Error, SlogInlineError)]
pub enum LoadError {
    #[error("failed to read {path}")]
    Io {
        path: Utf8PathBuf,
        #[source]
        err: std::io::Error,
    },
    #[error("failed to parse {path} as TOML")]
    Parse {
        path: Utf8PathBuf,
        #[source]
        err: toml::de::Error,
    },
}
