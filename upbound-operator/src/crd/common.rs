//! Types shared by all managed resources.

use kube::ResourceExt;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Annotation holding the name of the resource in the external system.
pub const EXTERNAL_NAME_ANNOTATION: &str = "crossplane.io/external-name";

/// Condition type reporting whether the external resource is usable.
pub const CONDITION_READY: &str = "Ready";

/// Condition type reporting whether the last reconcile succeeded.
pub const CONDITION_SYNCED: &str = "Synced";

/// What happens to the external resource when the managed resource is
/// deleted.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub enum DeletionPolicy {
    /// Delete the external resource.
    #[default]
    Delete,
    /// Leave the external resource in place.
    Orphan,
}

/// Reference to the ProviderConfig used to connect to Upbound.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProviderConfigReference {
    /// Name of the ProviderConfig.
    pub name: String,
}

impl Default for ProviderConfigReference {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
        }
    }
}

/// A status condition in the Crossplane style.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    /// Condition type (Ready, Synced).
    #[serde(rename = "type")]
    pub condition_type: String,

    /// Status of the condition (True, False, Unknown).
    pub status: String,

    /// Machine readable reason.
    pub reason: String,

    /// Last time the status changed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_transition_time: Option<String>,

    /// Human-readable message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Condition {
    fn new(condition_type: &str, status: &str, reason: &str) -> Self {
        Self {
            condition_type: condition_type.to_string(),
            status: status.to_string(),
            reason: reason.to_string(),
            last_transition_time: Some(chrono::Utc::now().to_rfc3339()),
            message: None,
        }
    }

    /// The external resource is available for use.
    pub fn available() -> Self {
        Self::new(CONDITION_READY, "True", "Available")
    }

    /// The external resource is being created.
    pub fn creating() -> Self {
        Self::new(CONDITION_READY, "False", "Creating")
    }

    /// The external resource is being deleted.
    pub fn deleting() -> Self {
        Self::new(CONDITION_READY, "False", "Deleting")
    }

    /// The external resource exists but is not usable right now.
    pub fn unavailable() -> Self {
        Self::new(CONDITION_READY, "False", "Unavailable")
    }

    /// The last reconcile succeeded.
    pub fn reconcile_success() -> Self {
        Self::new(CONDITION_SYNCED, "True", "ReconcileSuccess")
    }

    /// The last reconcile failed.
    pub fn reconcile_error(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::new(CONDITION_SYNCED, "False", "ReconcileError")
        }
    }

    /// Whether two conditions say the same thing, ignoring timestamps.
    pub fn equivalent(&self, other: &Condition) -> bool {
        self.condition_type == other.condition_type
            && self.status == other.status
            && self.reason == other.reason
            && self.message == other.message
    }
}

/// Insert or replace a condition by type, keeping the previous transition
/// time when nothing changed.
pub fn set_condition(conditions: &mut Vec<Condition>, condition: Condition) {
    match conditions
        .iter_mut()
        .find(|c| c.condition_type == condition.condition_type)
    {
        Some(existing) if existing.equivalent(&condition) => {}
        Some(existing) => *existing = condition,
        None => conditions.push(condition),
    }
}

/// The external name of a managed resource, if set and non-empty.
pub fn external_name<K: ResourceExt>(resource: &K) -> Option<&str> {
    resource
        .annotations()
        .get(EXTERNAL_NAME_ANNOTATION)
        .map(String::as_str)
        .filter(|name| !name.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_condition_replaces_by_type() {
        let mut conditions = vec![Condition::creating(), Condition::reconcile_success()];

        set_condition(&mut conditions, Condition::available());
        assert_eq!(conditions.len(), 2);
        assert_eq!(conditions[0].reason, "Available");

        set_condition(&mut conditions, Condition::reconcile_error("boom"));
        assert_eq!(conditions[1].status, "False");
        assert_eq!(conditions[1].message.as_deref(), Some("boom"));
    }

    #[test]
    fn set_condition_keeps_transition_time_when_unchanged() {
        let mut original = Condition::available();
        original.last_transition_time = Some("2024-01-01T00:00:00+00:00".into());
        let mut conditions = vec![original];

        set_condition(&mut conditions, Condition::available());
        assert_eq!(
            conditions[0].last_transition_time.as_deref(),
            Some("2024-01-01T00:00:00+00:00")
        );
    }

    #[test]
    fn deletion_policy_defaults_to_delete() {
        assert_eq!(DeletionPolicy::default(), DeletionPolicy::Delete);
        let policy: DeletionPolicy = serde_json::from_str("\"Orphan\"").unwrap();
        assert_eq!(policy, DeletionPolicy::Orphan);
    }

    #[test]
    fn provider_config_reference_defaults_to_default() {
        assert_eq!(ProviderConfigReference::default().name, "default");
    }
}
