//! ProviderConfig Custom Resource Definition.
//!
//! Tells the operator how to reach Upbound and where to find the personal
//! access token used to log in.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Configures how the operator connects to Upbound.
#[derive(CustomResource, Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "upbound.io",
    version = "v1alpha1",
    kind = "ProviderConfig",
    plural = "providerconfigs",
    category = "crossplane",
    category = "provider",
    category = "upbound",
    printcolumn = r#"{"name":"SOURCE", "type":"string", "jsonPath":".spec.credentials.source"}"#,
    printcolumn = r#"{"name":"AGE", "type":"date", "jsonPath":".metadata.creationTimestamp"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct ProviderConfigSpec {
    /// Credentials used to log in to Upbound.
    pub credentials: ProviderCredentials,

    /// API endpoint. Defaults to `https://api.upbound.io`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    /// Organization used by resources that leave `organizationName` empty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization: Option<String>,
}

/// Where credentials come from.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub enum CredentialsSource {
    /// A key in a Kubernetes secret.
    #[default]
    Secret,
    /// No credentials.
    None,
}

/// Credentials for Upbound.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProviderCredentials {
    /// Source of the credentials.
    #[serde(default)]
    pub source: CredentialsSource,

    /// Secret key holding the personal access token. Required when the
    /// source is `Secret`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_ref: Option<SecretKeySelector>,
}

/// A key within a namespaced secret.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SecretKeySelector {
    /// Namespace of the secret.
    pub namespace: String,
    /// Name of the secret.
    pub name: String,
    /// Key within the secret data.
    pub key: String,
}
