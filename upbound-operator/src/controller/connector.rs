//! Connecting to Upbound on behalf of a managed resource.
//!
//! Resolves the referenced ProviderConfig, reads the personal access token
//! from its secret and exchanges it for a session through the shared
//! [`SessionCache`].

use crate::crd::{CredentialsSource, ProviderConfig, ProviderConfigReference, SecretKeySelector};
use crate::error::{OperatorError, OperatorResult};
use k8s_openapi::api::core::v1::Secret;
use kube::Api;
use std::sync::Arc;
use std::time::Duration;
use upbound_client::{Client, SessionCache};

/// An authenticated client plus what is needed to drop its session.
#[derive(Debug, Clone)]
pub struct Connection {
    /// Client carrying a valid session.
    pub client: Client,
    /// Organization from the ProviderConfig, if set.
    pub organization: Option<String>,
    token: String,
}

impl Connection {
    /// Forget the cached session, forcing a new login next time.
    pub async fn invalidate(&self, sessions: &SessionCache) {
        sessions.invalidate(self.client.base_url(), &self.token).await;
    }
}

/// Builds authenticated Upbound clients from ProviderConfigs.
#[derive(Clone)]
pub struct Connector {
    kube: kube::Client,
    sessions: Arc<SessionCache>,
    timeout: Duration,
}

impl Connector {
    /// Create a connector sharing the given session cache.
    pub fn new(kube: kube::Client, sessions: Arc<SessionCache>, timeout: Duration) -> Self {
        Self {
            kube,
            sessions,
            timeout,
        }
    }

    /// The shared session cache.
    pub fn sessions(&self) -> &SessionCache {
        &self.sessions
    }

    /// Connect using the referenced ProviderConfig.
    pub async fn connect(&self, reference: &ProviderConfigReference) -> OperatorResult<Connection> {
        let configs: Api<ProviderConfig> = Api::all(self.kube.clone());
        let pc = configs.get(&reference.name).await.map_err(|e| match &e {
            kube::Error::Api(api_err) if api_err.code == 404 => OperatorError::NotFound {
                kind: "ProviderConfig".to_string(),
                name: reference.name.clone(),
            },
            _ => OperatorError::KubeError(e),
        })?;

        let selector = match pc.spec.credentials.source {
            CredentialsSource::Secret => {
                pc.spec.credentials.secret_ref.as_ref().ok_or_else(|| {
                    OperatorError::CredentialsError(format!(
                        "ProviderConfig '{}' uses a Secret source without secretRef",
                        reference.name
                    ))
                })?
            }
            CredentialsSource::None => {
                return Err(OperatorError::CredentialsError(format!(
                    "ProviderConfig '{}' has no credentials",
                    reference.name
                )));
            }
        };

        let token = self.resolve_token(selector).await?;
        let client = Client::for_endpoint(pc.spec.endpoint.as_deref())?.with_timeout(self.timeout)?;
        let session = self.sessions.get_or_login(&client, &token).await?;

        tracing::debug!(
            provider_config = %reference.name,
            endpoint = %client.base_url(),
            "Connected to Upbound"
        );

        Ok(Connection {
            client: client.with_session(session),
            organization: pc.spec.organization.filter(|org| !org.is_empty()),
            token,
        })
    }

    async fn resolve_token(&self, selector: &SecretKeySelector) -> OperatorResult<String> {
        let secrets: Api<Secret> = Api::namespaced(self.kube.clone(), &selector.namespace);
        let secret = secrets.get(&selector.name).await.map_err(|e| match &e {
            kube::Error::Api(api_err) if api_err.code == 404 => OperatorError::NotFound {
                kind: "Secret".to_string(),
                name: format!("{}/{}", selector.namespace, selector.name),
            },
            _ => OperatorError::KubeError(e),
        })?;

        token_from_secret(&secret, selector)
    }
}

/// Read the token stored under the selected key.
pub fn token_from_secret(secret: &Secret, selector: &SecretKeySelector) -> OperatorResult<String> {
    let bytes = secret
        .data
        .as_ref()
        .and_then(|data| data.get(&selector.key))
        .ok_or_else(|| {
            OperatorError::CredentialsError(format!(
                "Secret '{}/{}' missing '{}' field",
                selector.namespace, selector.name, selector.key
            ))
        })?;

    let token = String::from_utf8(bytes.0.clone()).map_err(|_| {
        OperatorError::CredentialsError(format!(
            "Secret '{}/{}' contains invalid UTF-8 in '{}' field",
            selector.namespace, selector.name, selector.key
        ))
    })?;

    let token = token.trim();
    if token.is_empty() {
        return Err(OperatorError::CredentialsError(format!(
            "Secret '{}/{}' has an empty '{}' field",
            selector.namespace, selector.name, selector.key
        )));
    }

    Ok(token.to_string())
}
