//! Configuration operations.

use crate::client::Client;
use crate::error::Result;
use crate::types::ConfigurationResponse;

impl Client {
    /// Get a configuration by organization and name.
    ///
    /// The response carries the newest version offered by the
    /// configuration's package registry.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the configuration does not
    /// exist.
    pub async fn get_configuration(
        &self,
        organization: &str,
        name: &str,
    ) -> Result<ConfigurationResponse> {
        let response = self
            .get(&format!("configurations/{}/{}", organization, name))
            .await?;
        self.handle_response(response).await
    }
}
