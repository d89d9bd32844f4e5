//! Wire types for the Upbound API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle phase of a managed control plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ControlPlaneStatus {
    /// Control plane is being provisioned.
    Provisioning,
    /// Control plane is being updated.
    Updating,
    /// Control plane is ready for use.
    Ready,
    /// Control plane is being deleted.
    Deleting,
    /// A phase this client does not know about.
    #[serde(other)]
    Unknown,
}

/// Lifecycle phase of a configuration installed in a control plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ConfigurationStatus {
    /// Queued to begin installation.
    InstallationQueued,
    /// Queued to upgrade to a specified version.
    UpgradeQueued,
    /// Currently installing.
    Installing,
    /// Ready for use.
    Ready,
    /// Currently upgrading to a specified version.
    Upgrading,
    /// A phase this client does not know about.
    #[serde(other)]
    Unknown,
}

/// Body returned when fetching or creating a control plane.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ControlPlaneResponse {
    /// The control plane itself.
    pub control_plane: ControlPlane,
    /// Lifecycle phase.
    #[serde(default)]
    pub status: Option<ControlPlaneStatus>,
    /// Permission the caller holds on the control plane.
    #[serde(default, rename = "controlPlanePermission")]
    pub permission: Option<String>,
}

/// A managed control plane.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ControlPlane {
    /// Control plane ID.
    #[serde(default)]
    pub id: String,
    /// Control plane name, unique within an organization.
    #[serde(default)]
    pub name: String,
    /// Free-form description.
    #[serde(default)]
    pub description: String,
    /// ID of the user that created the control plane.
    #[serde(default)]
    pub creator_id: u64,
    /// Whether the control plane is reserved.
    #[serde(default)]
    pub reserved: bool,
    /// Creation time.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    /// Last update time.
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    /// Expiry time.
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    /// The configuration instance running in the control plane.
    #[serde(default)]
    pub configuration: ControlPlaneConfiguration,
}

/// A configuration instance associated with a control plane.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ControlPlaneConfiguration {
    /// Configuration ID.
    #[serde(default)]
    pub id: String,
    /// Configuration name.
    #[serde(default)]
    pub name: Option<String>,
    /// Version actually installed.
    #[serde(default)]
    pub current_version: Option<String>,
    /// Version the control plane is converging toward.
    #[serde(default)]
    pub desired_version: Option<String>,
    /// Installation phase.
    #[serde(default)]
    pub status: Option<ConfigurationStatus>,
    /// Last sync time.
    #[serde(default)]
    pub synced_at: Option<DateTime<Utc>>,
    /// Last deployment time.
    #[serde(default)]
    pub deployed_at: Option<DateTime<Utc>>,
}

/// Parameters for creating a control plane.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateControlPlaneParams {
    /// Name of the new control plane.
    pub name: String,
    /// Description of the new control plane.
    pub description: String,
    /// ID of the configuration to install.
    pub configuration_id: String,
}

/// A configuration template registered in an organization.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigurationResponse {
    /// Configuration ID.
    #[serde(default)]
    pub id: String,
    /// Configuration name.
    #[serde(default)]
    pub name: String,
    /// Newest version published to the configuration's package registry.
    #[serde(default, alias = "latestVersion")]
    pub latest_available_version: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn control_plane_response_deserializes() {
        let json = serde_json::json!({
            "controlPlane": {
                "id": "2f1c7e0a-1111-2222-3333-444455556666",
                "name": "prod",
                "description": "production",
                "creatorId": 42,
                "reserved": false,
                "createdAt": "2024-01-02T03:04:05Z",
                "configuration": {
                    "id": "cfg-1",
                    "name": "platform-ref-aws",
                    "currentVersion": "v1.0.0+1.abc",
                    "desiredVersion": "v1.0.0+1.abc",
                    "status": "ready"
                }
            },
            "status": "ready",
            "controlPlanePermission": "owner"
        });

        let resp: ControlPlaneResponse = serde_json::from_value(json).unwrap();
        assert_eq!(resp.control_plane.name, "prod");
        assert_eq!(resp.status, Some(ControlPlaneStatus::Ready));
        assert_eq!(resp.permission.as_deref(), Some("owner"));
        assert_eq!(
            resp.control_plane.configuration.status,
            Some(ConfigurationStatus::Ready)
        );
        assert!(resp.control_plane.created_at.is_some());
    }

    #[test]
    fn unknown_status_is_tolerated() {
        let status: ConfigurationStatus = serde_json::from_str("\"paused\"").unwrap();
        assert_eq!(status, ConfigurationStatus::Unknown);

        let status: ConfigurationStatus = serde_json::from_str("\"upgradeQueued\"").unwrap();
        assert_eq!(status, ConfigurationStatus::UpgradeQueued);
    }

    #[test]
    fn configuration_accepts_latest_version_alias() {
        let cfg: ConfigurationResponse = serde_json::from_value(serde_json::json!({
            "id": "cfg-1",
            "name": "platform-ref-aws",
            "latestVersion": "v1.1.0+3.x"
        }))
        .unwrap();
        assert_eq!(cfg.latest_available_version.as_deref(), Some("v1.1.0+3.x"));
    }

    #[test]
    fn create_params_serialize_camel_case() {
        let params = CreateControlPlaneParams {
            name: "prod".into(),
            description: String::new(),
            configuration_id: "cfg-1".into(),
        };
        let json = serde_json::to_value(&params).unwrap();
        assert_eq!(json["configurationId"], "cfg-1");
    }
}
