//! ControlPlane Custom Resource Definition.
//!
//! A managed control plane hosted by Upbound, running a versioned
//! configuration package.

use super::common::{Condition, DeletionPolicy, ProviderConfigReference};
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use upbound_client::{ConfigurationStatus, ControlPlaneResponse, ControlPlaneStatus as Phase};

/// ControlPlane is the Schema for the controlplanes API.
///
/// The operator keeps the remote control plane's configuration version in
/// line with `spec.forProvider.version`, or with the newest published
/// version when `autoUpdate` is set.
#[derive(CustomResource, Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "mcp.upbound.io",
    version = "v1alpha1",
    kind = "ControlPlane",
    plural = "controlplanes",
    status = "ControlPlaneStatus",
    category = "crossplane",
    category = "managed",
    category = "upbound",
    printcolumn = r#"{"name":"READY", "type":"string", "jsonPath":".status.conditions[?(@.type=='Ready')].status"}"#,
    printcolumn = r#"{"name":"SYNCED", "type":"string", "jsonPath":".status.conditions[?(@.type=='Synced')].status"}"#,
    printcolumn = r#"{"name":"EXTERNAL-NAME", "type":"string", "jsonPath":".metadata.annotations.crossplane\\.io/external-name"}"#,
    printcolumn = r#"{"name":"CONFIGURATION", "type":"string", "jsonPath":".status.atProvider.configuration.name"}"#,
    printcolumn = r#"{"name":"VERSION", "type":"string", "jsonPath":".status.atProvider.configuration.currentVersion"}"#,
    printcolumn = r#"{"name":"CONFIGURATION-STATUS", "type":"string", "jsonPath":".status.atProvider.configuration.status"}"#,
    printcolumn = r#"{"name":"AGE", "type":"date", "jsonPath":".metadata.creationTimestamp"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct ControlPlaneSpec {
    /// Desired state of the remote control plane.
    pub for_provider: ControlPlaneParameters,

    /// ProviderConfig holding the Upbound credentials.
    #[serde(default)]
    pub provider_config_ref: ProviderConfigReference,

    /// What to do with the remote control plane on deletion.
    #[serde(default)]
    pub deletion_policy: DeletionPolicy,
}

/// The configurable fields of a ControlPlane.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ControlPlaneParameters {
    /// Organization owning the control plane. Immutable. Falls back to the
    /// ProviderConfig's `organization` when empty.
    #[serde(default)]
    pub organization_name: String,

    /// Name of the configuration to install. Immutable.
    pub configuration: String,

    /// Description of the control plane.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Pinned configuration version. Adopted from the control plane when
    /// unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// Follow the newest published configuration version once the current
    /// one is ready.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_update: Option<bool>,
}

/// ControlPlane status.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ControlPlaneStatus {
    /// Last observed state of the remote control plane.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub at_provider: Option<ControlPlaneObservation>,

    /// Ready and Synced conditions.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,
}

/// Lifecycle phase of the remote control plane.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ControlPlanePhase {
    /// Being provisioned.
    Provisioning,
    /// Being updated.
    Updating,
    /// Ready for use.
    Ready,
    /// Being deleted.
    Deleting,
    /// Reported by the API but not known to the operator.
    Unknown,
}

impl From<Phase> for ControlPlanePhase {
    fn from(phase: Phase) -> Self {
        match phase {
            Phase::Provisioning => Self::Provisioning,
            Phase::Updating => Self::Updating,
            Phase::Ready => Self::Ready,
            Phase::Deleting => Self::Deleting,
            Phase::Unknown => Self::Unknown,
        }
    }
}

/// Lifecycle phase of the configuration installed in a control plane.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ConfigurationPhase {
    /// Queued to begin installation.
    InstallationQueued,
    /// Queued to upgrade.
    UpgradeQueued,
    /// Installing.
    Installing,
    /// Ready for use.
    Ready,
    /// Upgrading.
    Upgrading,
    /// Reported by the API but not known to the operator.
    Unknown,
}

impl From<ConfigurationStatus> for ConfigurationPhase {
    fn from(status: ConfigurationStatus) -> Self {
        match status {
            ConfigurationStatus::InstallationQueued => Self::InstallationQueued,
            ConfigurationStatus::UpgradeQueued => Self::UpgradeQueued,
            ConfigurationStatus::Installing => Self::Installing,
            ConfigurationStatus::Ready => Self::Ready,
            ConfigurationStatus::Upgrading => Self::Upgrading,
            ConfigurationStatus::Unknown => Self::Unknown,
        }
    }
}

/// Observed state of the remote control plane.
///
/// Unset fields serialize as `null` so a status merge patch clears values
/// the remote no longer reports.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ControlPlaneObservation {
    /// Control plane ID.
    #[serde(default)]
    pub id: String,

    /// Control plane name.
    #[serde(default)]
    pub name: String,

    /// Description.
    #[serde(default)]
    pub description: String,

    /// ID of the creating user.
    #[serde(default)]
    pub creator_id: u64,

    /// Whether the control plane is reserved.
    #[serde(default)]
    pub reserved: bool,

    /// Lifecycle phase.
    #[serde(default)]
    pub status: Option<ControlPlanePhase>,

    /// Caller's permission on the control plane.
    #[serde(default)]
    pub permission: Option<String>,

    /// Creation time (RFC 3339).
    #[serde(default)]
    pub created_at: Option<String>,

    /// Last update time (RFC 3339).
    #[serde(default)]
    pub updated_at: Option<String>,

    /// Expiry time (RFC 3339).
    #[serde(default)]
    pub expires_at: Option<String>,

    /// The configuration instance.
    #[serde(default)]
    pub configuration: ConfigurationObservation,
}

/// Observed state of the configuration installed in a control plane.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConfigurationObservation {
    /// Configuration ID.
    #[serde(default)]
    pub id: String,

    /// Configuration name.
    #[serde(default)]
    pub name: Option<String>,

    /// Installation phase.
    #[serde(default)]
    pub status: Option<ConfigurationPhase>,

    /// Version actually installed.
    #[serde(default)]
    pub current_version: Option<String>,

    /// Version the control plane is converging toward.
    #[serde(default)]
    pub desired_version: Option<String>,

    /// Newest version published for the configuration.
    #[serde(default)]
    pub latest_available_version: Option<String>,

    /// Last sync time (RFC 3339).
    #[serde(default)]
    pub synced_at: Option<String>,

    /// Last deployment time (RFC 3339).
    #[serde(default)]
    pub deployed_at: Option<String>,
}

impl ControlPlaneObservation {
    /// Build the observation from an API response and the latest version
    /// published for the configuration.
    pub fn from_response(resp: &ControlPlaneResponse, latest_available: Option<String>) -> Self {
        let cp = &resp.control_plane;
        let cfg = &cp.configuration;

        Self {
            id: cp.id.clone(),
            name: cp.name.clone(),
            description: cp.description.clone(),
            creator_id: cp.creator_id,
            reserved: cp.reserved,
            status: resp.status.map(Into::into),
            permission: resp.permission.clone(),
            created_at: cp.created_at.map(|t| t.to_rfc3339()),
            updated_at: cp.updated_at.map(|t| t.to_rfc3339()),
            expires_at: cp.expires_at.map(|t| t.to_rfc3339()),
            configuration: ConfigurationObservation {
                id: cfg.id.clone(),
                name: cfg.name.clone(),
                status: cfg.status.map(Into::into),
                current_version: cfg.current_version.clone(),
                desired_version: cfg.desired_version.clone(),
                latest_available_version: latest_available,
                synced_at: cfg.synced_at.map(|t| t.to_rfc3339()),
                deployed_at: cfg.deployed_at.map(|t| t.to_rfc3339()),
            },
        }
    }
}
