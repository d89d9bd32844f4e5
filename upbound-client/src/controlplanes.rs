//! Control plane operations.

use crate::client::Client;
use crate::error::Result;
use crate::types::{ControlPlaneResponse, CreateControlPlaneParams};
use serde::Serialize;

/// Body of a control plane PATCH request.
#[derive(Debug, Serialize)]
struct PatchRequest<'a> {
    patches: Vec<PatchOperation<'a>>,
}

/// A single control plane patch, serialized as `{"<op>": <value>}`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
enum PatchOperation<'a> {
    SetDesiredVersion(&'a str),
}

impl Client {
    /// Get a control plane by organization and name.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Api`](crate::ClientError::Api) with status 404
    /// when the control plane does not exist.
    pub async fn get_control_plane(
        &self,
        organization: &str,
        name: &str,
    ) -> Result<ControlPlaneResponse> {
        let response = self
            .get(&format!("controlPlanes/{}/{}", organization, name))
            .await?;
        self.handle_response(response).await
    }

    /// Create a control plane in an organization.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn create_control_plane(
        &self,
        organization: &str,
        params: &CreateControlPlaneParams,
    ) -> Result<ControlPlaneResponse> {
        tracing::debug!(
            organization = %organization,
            name = %params.name,
            "Creating control plane"
        );
        let response = self
            .post(&format!("controlPlanes/{}", organization), params)
            .await?;
        self.handle_response(response).await
    }

    /// Delete a control plane.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, including 404.
    pub async fn delete_control_plane(&self, organization: &str, name: &str) -> Result<()> {
        let response = self
            .delete(&format!("controlPlanes/{}/{}", organization, name))
            .await?;
        self.handle_empty_response(response).await
    }

    /// Ask the control plane to converge its configuration to `version`.
    ///
    /// Sends `{"patches":[{"setDesiredVersion":"<version>"}]}`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn set_desired_version(
        &self,
        organization: &str,
        name: &str,
        version: &str,
    ) -> Result<()> {
        let body = PatchRequest {
            patches: vec![PatchOperation::SetDesiredVersion(version)],
        };
        let response = self
            .patch(&format!("controlPlanes/{}/{}", organization, name), &body)
            .await?;
        self.handle_empty_response(response).await
    }
}
