// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Resource model and request types for the Trellis API
//!
//! A create request names the entity, attaches an ordered list of
//! [`ResourceReference`]s describing how the new entity relates to existing
//! ones, and is validated against a per-type reference schema before anything
//! is persisted.  References are write-once: no API mutates an entity's
//! reference list after creation.

pub mod error;

pub use error::Error;
pub use error::InternalContext;
pub use error::LookupType;

use serde::Deserialize;
use serde::Serialize;
use std::fmt;
use std::fmt::Display;
use std::fmt::Formatter;

/// Result of a create operation for the specified type
pub type CreateResult<T> = Result<T, Error>;
/// Result of a lookup operation for the specified type
pub type LookupResult<T> = Result<T, Error>;
/// Result of a list operation returning a vector
pub type ListResultVec<T> = Result<Vec<T>, Error>;
/// Result of a delete operation
pub type DeleteResult = Result<(), Error>;

/// Identifies a type of API resource
///
/// This is a closed set: the reference validator's legality table is keyed by
/// it, and admitting a new type means extending that table.
#[derive(
    Clone,
    Copy,
    Debug,
    Deserialize,
    Eq,
    Hash,
    Ord,
    PartialEq,
    PartialOrd,
    Serialize,
)]
pub enum ResourceType {
    Namespace,
    Experiment,
    Pipeline,
    PipelineVersion,
    Run,
    Job,
}

impl Display for ResourceType {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                ResourceType::Namespace => "namespace",
                ResourceType::Experiment => "experiment",
                ResourceType::Pipeline => "pipeline",
                ResourceType::PipelineVersion => "pipeline version",
                ResourceType::Run => "run",
                ResourceType::Job => "job",
            }
        )
    }
}

/// How a [`ResourceReference`] relates the referencing entity to its target
///
/// `Owner` is a required, immutable parent relation: it drives namespace
/// inheritance and authorization scope.  `Creator` is a provenance link only
/// (e.g., "this run was created from this pipeline version") and confers no
/// ownership scope.
#[derive(
    Clone,
    Copy,
    Debug,
    Deserialize,
    Eq,
    Hash,
    Ord,
    PartialEq,
    PartialOrd,
    Serialize,
)]
pub enum Relationship {
    Owner,
    Creator,
}

impl Display for Relationship {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Relationship::Owner => "owner",
                Relationship::Creator => "creator",
            }
        )
    }
}

/// Identifies one entity: a resource type plus an opaque string identifier
///
/// Identifiers are minted by the id-generator collaborator and never reused.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct ResourceKey {
    pub resource_type: ResourceType,
    pub id: String,
}

impl ResourceKey {
    pub fn new(resource_type: ResourceType, id: &str) -> ResourceKey {
        ResourceKey { resource_type, id: id.to_string() }
    }
}

impl Display for ResourceKey {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{} \"{}\"", self.resource_type, self.id)
    }
}

/// A declared relationship between a to-be-created entity and an existing one
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct ResourceReference {
    pub key: ResourceKey,
    pub relationship: Relationship,
}

impl ResourceReference {
    /// Shorthand for an `Owner` reference to the given target
    pub fn owner(resource_type: ResourceType, id: &str) -> ResourceReference {
        ResourceReference {
            key: ResourceKey::new(resource_type, id),
            relationship: Relationship::Owner,
        }
    }

    /// Shorthand for a `Creator` reference to the given target
    pub fn creator(
        resource_type: ResourceType,
        id: &str,
    ) -> ResourceReference {
        ResourceReference {
            key: ResourceKey::new(resource_type, id),
            relationship: Relationship::Creator,
        }
    }
}

/// The action a caller is attempting on a resource
///
/// These are the verbs submitted to the RBAC provider.  The set is fixed by
/// the system, not configurable.
#[derive(
    Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize,
)]
pub enum Action {
    Create,
    Read,
    List,
    Delete,
}

impl Display for Action {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Action::Create => "create",
                Action::Read => "read",
                Action::List => "list",
                Action::Delete => "delete",
            }
        )
    }
}

/// The structured attribute set submitted to the RBAC provider for one
/// authorization decision
///
/// On deny, this is embedded in the resulting [`Error::Forbidden`] so the
/// denial can be audited.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct AccessAttributes {
    /// tenant namespace the request is scoped to
    pub namespace: String,
    /// type of the resource being acted on
    pub resource_type: ResourceType,
    /// verb the caller is attempting
    pub action: Action,
}

impl Display for AccessAttributes {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(
            f,
            "{{ namespace: \"{}\", resource: {}, verb: {} }}",
            self.namespace, self.resource_type, self.action
        )
    }
}

/// Create-time parameters for an Experiment
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct ExperimentCreate {
    pub name: String,
    pub description: Option<String>,
    pub references: Vec<ResourceReference>,
}

/// Create-time parameters for a Pipeline
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct PipelineCreate {
    pub name: String,
    pub description: Option<String>,
    pub references: Vec<ResourceReference>,
}

/// Create-time parameters for a PipelineVersion
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct PipelineVersionCreate {
    pub name: String,
    /// pipeline definition carried by this version
    pub manifest: String,
    pub references: Vec<ResourceReference>,
}

/// One runtime parameter supplied with a Run
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct RunParameter {
    pub name: String,
    pub value: String,
}

/// Create-time parameters for a Run
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct RunCreate {
    pub name: String,
    /// workflow definition to submit to the workflow engine
    pub workflow_manifest: String,
    pub parameters: Vec<RunParameter>,
    pub references: Vec<ResourceReference>,
}

#[cfg(test)]
mod test {
    use super::AccessAttributes;
    use super::Action;
    use super::ResourceReference;
    use super::ResourceType;

    #[test]
    fn test_display_forms() {
        assert_eq!(ResourceType::PipelineVersion.to_string(), "pipeline version");
        assert_eq!(Action::Create.to_string(), "create");
        let attributes = AccessAttributes {
            namespace: "ns1".to_string(),
            resource_type: ResourceType::Experiment,
            action: Action::Create,
        };
        assert_eq!(
            attributes.to_string(),
            "{ namespace: \"ns1\", resource: experiment, verb: create }"
        );
    }

    #[test]
    fn test_reference_shorthand() {
        let reference =
            ResourceReference::owner(ResourceType::Experiment, "exp1");
        assert_eq!(reference.key.resource_type, ResourceType::Experiment);
        assert_eq!(reference.key.id, "exp1");
        let reference =
            ResourceReference::creator(ResourceType::PipelineVersion, "pv1");
        assert_eq!(
            reference.key.resource_type,
            ResourceType::PipelineVersion
        );
    }
}
