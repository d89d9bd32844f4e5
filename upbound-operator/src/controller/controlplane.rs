//! ControlPlane controller.
//!
//! Mirrors ControlPlane resources onto Upbound control planes and keeps the
//! installed configuration version in line with the spec.

use super::managed::{
    ExternalClient, ExternalCreation, ExternalFuture, ExternalObservation, ManagedStep, Observed,
    SpecPatch, plan,
};
use super::version_drift::{DesiredVersion, ObservedConfiguration, decide};
use super::{Connection, ControllerContext, ReconcileAction};
use crate::crd::{
    Condition, ControlPlane, ControlPlaneObservation, ControlPlanePhase, ControlPlaneStatus,
    EXTERNAL_NAME_ANNOTATION, external_name, set_condition,
};
use crate::error::{OperatorError, OperatorResult};
use kube::api::{Patch, PatchParams};
use kube::{Api, ResourceExt};
use std::sync::Arc;
use upbound_client::{Client, CreateControlPlaneParams};

/// Finalizer guarding deletion of the remote control plane.
pub const FINALIZER: &str = "controlplane.mcp.upbound.io/finalizer";

/// Spec change produced by observation: the configuration version to pin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionPatch {
    /// New value of `spec.forProvider.version`.
    pub version: String,
}

impl SpecPatch<ControlPlane> for VersionPatch {
    fn merge_patch(&self) -> serde_json::Value {
        serde_json::json!({
            "spec": {
                "forProvider": {
                    "version": self.version
                }
            }
        })
    }

    fn apply_to(&self, resource: &mut ControlPlane) {
        resource.spec.for_provider.version = Some(self.version.clone());
    }
}

/// The Ready condition matching a control plane phase.
pub fn ready_condition(phase: Option<ControlPlanePhase>) -> Condition {
    match phase {
        Some(ControlPlanePhase::Ready) => Condition::available(),
        Some(ControlPlanePhase::Provisioning) => Condition::creating(),
        Some(ControlPlanePhase::Deleting) => Condition::deleting(),
        Some(ControlPlanePhase::Updating | ControlPlanePhase::Unknown) | None => {
            Condition::unavailable()
        }
    }
}

/// ControlPlane operations against the Upbound API.
#[derive(Debug, Clone)]
pub struct ControlPlaneExternal {
    client: Client,
    default_organization: Option<String>,
}

impl ControlPlaneExternal {
    /// Wrap an authenticated client.
    pub fn new(client: Client) -> Self {
        Self {
            client,
            default_organization: None,
        }
    }

    /// Organization used when `organizationName` is empty.
    pub fn with_default_organization(mut self, organization: Option<String>) -> Self {
        self.default_organization = organization;
        self
    }

    /// The organization owning the control plane.
    fn organization<'a>(&'a self, cp: &'a ControlPlane) -> OperatorResult<&'a str> {
        let own = cp.spec.for_provider.organization_name.as_str();
        if !own.is_empty() {
            return Ok(own);
        }
        self.default_organization
            .as_deref()
            .filter(|org| !org.is_empty())
            .ok_or_else(|| {
                OperatorError::InvalidConfig(format!(
                    "ControlPlane '{}' has no organizationName and its ProviderConfig sets no organization",
                    cp.name_any()
                ))
            })
    }

    async fn observe_control_plane(
        &self,
        cp: &ControlPlane,
    ) -> OperatorResult<Observed<ControlPlaneObservation, VersionPatch>> {
        let Some(name) = external_name(cp) else {
            return Ok(Observed::absent());
        };
        let params = &cp.spec.for_provider;
        let organization = self.organization(cp)?;

        let resp = match self
            .client
            .get_control_plane(organization, name)
            .await
        {
            Ok(resp) => resp,
            Err(e) if e.is_not_found() => {
                tracing::debug!(name = %name, "Control plane does not exist");
                return Ok(Observed::absent());
            }
            Err(e) => return Err(e.into()),
        };

        let configuration = self
            .client
            .get_configuration(organization, &params.configuration)
            .await?;

        let at_provider =
            ControlPlaneObservation::from_response(&resp, configuration.latest_available_version);
        let decision = decide(
            &DesiredVersion::from(params),
            &ObservedConfiguration::from(&at_provider.configuration),
        );

        tracing::debug!(
            name = %name,
            state = ?decision.state,
            up_to_date = decision.up_to_date,
            current = ?at_provider.configuration.current_version,
            latest = ?at_provider.configuration.latest_available_version,
            "Observed control plane"
        );

        Ok(Observed {
            observation: ExternalObservation {
                resource_exists: true,
                resource_up_to_date: decision.up_to_date,
                resource_late_initialized: decision.late_initialized,
            },
            at_provider: Some(at_provider),
            spec_patch: decision
                .new_desired_version
                .map(|version| VersionPatch { version }),
        })
    }

    async fn create_control_plane(&self, cp: &ControlPlane) -> OperatorResult<ExternalCreation> {
        let params = &cp.spec.for_provider;
        let organization = self.organization(cp)?;
        let name = external_name(cp)
            .map(str::to_string)
            .unwrap_or_else(|| cp.name_any());

        let configuration = self
            .client
            .get_configuration(organization, &params.configuration)
            .await?;

        let resp = self
            .client
            .create_control_plane(
                organization,
                &CreateControlPlaneParams {
                    name,
                    description: params.description.clone().unwrap_or_default(),
                    configuration_id: configuration.id,
                },
            )
            .await?;

        if resp.control_plane.name.is_empty() {
            return Err(OperatorError::UnexpectedResponse {
                name: cp.name_any(),
                reason: "created control plane has no name".to_string(),
            });
        }

        Ok(ExternalCreation {
            external_name: resp.control_plane.name,
        })
    }

    async fn update_control_plane(&self, cp: &ControlPlane) -> OperatorResult<()> {
        let params = &cp.spec.for_provider;
        let (Some(name), Some(version)) = (external_name(cp), params.version.as_deref()) else {
            return Ok(());
        };

        let organization = self.organization(cp)?;

        tracing::info!(name = %name, version = %version, "Setting desired configuration version");
        self.client
            .set_desired_version(organization, name, version)
            .await?;
        Ok(())
    }

    async fn delete_control_plane(&self, cp: &ControlPlane) -> OperatorResult<()> {
        let remote_phase = cp
            .status
            .as_ref()
            .and_then(|s| s.at_provider.as_ref())
            .and_then(|at| at.status);
        if remote_phase == Some(ControlPlanePhase::Deleting) {
            return Ok(());
        }

        let Some(name) = external_name(cp) else {
            return Ok(());
        };
        let organization = self.organization(cp)?;

        match self
            .client
            .delete_control_plane(organization, name)
            .await
        {
            Err(e) if e.is_not_found() => Ok(()),
            result => result.map_err(Into::into),
        }
    }
}

impl ExternalClient for ControlPlaneExternal {
    type Resource = ControlPlane;
    type AtProvider = ControlPlaneObservation;
    type SpecPatch = VersionPatch;

    fn observe<'a>(
        &'a self,
        resource: &'a ControlPlane,
    ) -> ExternalFuture<'a, Observed<ControlPlaneObservation, VersionPatch>> {
        Box::pin(self.observe_control_plane(resource))
    }

    fn create<'a>(&'a self, resource: &'a ControlPlane) -> ExternalFuture<'a, ExternalCreation> {
        Box::pin(self.create_control_plane(resource))
    }

    fn update<'a>(&'a self, resource: &'a ControlPlane) -> ExternalFuture<'a, ()> {
        Box::pin(self.update_control_plane(resource))
    }

    fn delete<'a>(&'a self, resource: &'a ControlPlane) -> ExternalFuture<'a, ()> {
        Box::pin(self.delete_control_plane(resource))
    }
}

/// Controller for ControlPlane resources.
#[derive(Clone)]
pub struct ControlPlaneController {
    ctx: Arc<ControllerContext>,
}

impl ControlPlaneController {
    /// Create a new control plane controller.
    pub fn new(ctx: Arc<ControllerContext>) -> Self {
        Self { ctx }
    }

    /// Reconcile a ControlPlane resource.
    ///
    /// 1. Ensures the finalizer and external name are set
    /// 2. Connects to Upbound through the referenced ProviderConfig
    /// 3. Observes the remote control plane and persists spec write-backs
    /// 4. Creates, updates or deletes the remote control plane as needed
    /// 5. Updates the status
    ///
    /// Failures are recorded as a `Synced=False` condition before being
    /// returned to the error policy.
    pub async fn reconcile(&self, cp: Arc<ControlPlane>) -> OperatorResult<ReconcileAction> {
        let name = cp.name_any();
        let api: Api<ControlPlane> = Api::all(self.ctx.client.clone());
        let mut cp = (*cp).clone();

        tracing::info!(
            name = %name,
            organization = %cp.spec.for_provider.organization_name,
            configuration = %cp.spec.for_provider.configuration,
            "Reconciling ControlPlane"
        );

        match self.run(&api, &mut cp).await {
            Ok(action) => Ok(action),
            Err(e) => {
                tracing::warn!(name = %name, error = %e, "ControlPlane reconcile failed");
                let mut status = cp.status.clone().unwrap_or_default();
                set_condition(&mut status.conditions, Condition::reconcile_error(e.to_string()));
                if let Err(status_err) = self.update_status(&api, &name, &status).await {
                    tracing::warn!(
                        name = %name,
                        error = %status_err,
                        "Failed to record reconcile error"
                    );
                }
                Err(e)
            }
        }
    }

    async fn run(
        &self,
        api: &Api<ControlPlane>,
        cp: &mut ControlPlane,
    ) -> OperatorResult<ReconcileAction> {
        let name = cp.name_any();
        let deleting = cp.metadata.deletion_timestamp.is_some();
        let has_finalizer = cp.finalizers().iter().any(|f| f == FINALIZER);

        if deleting && !has_finalizer {
            return Ok(ReconcileAction::Done);
        }
        if !has_finalizer {
            let mut finalizers = cp.finalizers().to_vec();
            finalizers.push(FINALIZER.to_string());
            self.patch_finalizers(api, &name, finalizers).await?;
            cp.finalizers_mut().push(FINALIZER.to_string());
        }
        if !deleting && external_name(cp).is_none() {
            self.patch_external_name(api, &name, &name).await?;
            cp.annotations_mut()
                .insert(EXTERNAL_NAME_ANNOTATION.to_string(), name.clone());
        }

        let connection = self
            .ctx
            .connector
            .connect(&cp.spec.provider_config_ref)
            .await?;

        let result = self.reconcile_external(api, cp, &connection, deleting).await;
        if let Err(e) = &result
            && e.is_unauthorized()
        {
            tracing::info!(name = %name, "Session rejected, dropping cached session");
            connection.invalidate(self.ctx.connector.sessions()).await;
        }
        result
    }

    async fn reconcile_external(
        &self,
        api: &Api<ControlPlane>,
        cp: &mut ControlPlane,
        connection: &Connection,
        deleting: bool,
    ) -> OperatorResult<ReconcileAction> {
        let name = cp.name_any();
        let external = ControlPlaneExternal::new(connection.client.clone())
            .with_default_organization(connection.organization.clone());

        let observed = external.observe(cp).await?;

        if let Some(patch) = &observed.spec_patch {
            api.patch(&name, &PatchParams::default(), &Patch::Merge(&patch.merge_patch()))
                .await?;
            patch.apply_to(cp);
            tracing::info!(
                name = %name,
                version = %patch.version,
                late_initialized = observed.observation.resource_late_initialized,
                "Updated desired configuration version"
            );
        }

        let status = cp.status.get_or_insert_with(ControlPlaneStatus::default);
        if let Some(at_provider) = observed.at_provider {
            status.at_provider = Some(at_provider);
        }
        let phase = status.at_provider.as_ref().and_then(|at| at.status);

        let step = plan(&observed.observation, deleting, cp.spec.deletion_policy);
        tracing::debug!(name = %name, step = ?step, "Planned step");

        let (ready, action) = match step {
            ManagedStep::Create => {
                let creation = external.create(cp).await?;
                self.patch_external_name(api, &name, &creation.external_name)
                    .await?;
                tracing::info!(
                    name = %name,
                    external_name = %creation.external_name,
                    "Created control plane"
                );
                (Condition::creating(), ReconcileAction::requeue_short())
            }
            ManagedStep::Update => {
                external.update(cp).await?;
                (ready_condition(phase), ReconcileAction::requeue_short())
            }
            ManagedStep::Delete => {
                external.delete(cp).await?;
                tracing::info!(name = %name, "Deleting control plane");
                (Condition::deleting(), ReconcileAction::requeue_short())
            }
            ManagedStep::Forget => {
                let finalizers = cp
                    .finalizers()
                    .iter()
                    .filter(|f| f.as_str() != FINALIZER)
                    .cloned()
                    .collect();
                self.patch_finalizers(api, &name, finalizers).await?;
                tracing::info!(name = %name, "Released control plane");
                return Ok(ReconcileAction::Done);
            }
            ManagedStep::Observe => {
                let ready = ready_condition(phase);
                let action = if phase == Some(ControlPlanePhase::Ready) {
                    ReconcileAction::Requeue(self.ctx.config.poll_interval())
                } else {
                    ReconcileAction::requeue_medium()
                };
                (ready, action)
            }
        };

        let mut status = cp.status.clone().unwrap_or_default();
        set_condition(&mut status.conditions, ready);
        set_condition(&mut status.conditions, Condition::reconcile_success());
        self.update_status(api, &name, &status).await?;
        cp.status = Some(status);

        Ok(action)
    }

    async fn patch_finalizers(
        &self,
        api: &Api<ControlPlane>,
        name: &str,
        finalizers: Vec<String>,
    ) -> OperatorResult<()> {
        let patch = serde_json::json!({
            "metadata": {
                "finalizers": finalizers
            }
        });
        api.patch(name, &PatchParams::default(), &Patch::Merge(&patch))
            .await?;
        Ok(())
    }

    async fn patch_external_name(
        &self,
        api: &Api<ControlPlane>,
        name: &str,
        external_name: &str,
    ) -> OperatorResult<()> {
        let patch = serde_json::json!({
            "metadata": {
                "annotations": {
                    EXTERNAL_NAME_ANNOTATION: external_name
                }
            }
        });
        api.patch(name, &PatchParams::default(), &Patch::Merge(&patch))
            .await?;
        Ok(())
    }

    /// Update the control plane status.
    async fn update_status(
        &self,
        api: &Api<ControlPlane>,
        name: &str,
        status: &ControlPlaneStatus,
    ) -> OperatorResult<()> {
        let patch = serde_json::json!({
            "status": status
        });

        api.patch_status(name, &PatchParams::default(), &Patch::Merge(&patch))
            .await?;

        Ok(())
    }
}

/// Handle errors during reconciliation.
pub fn error_policy(
    cp: Arc<ControlPlane>,
    error: &OperatorError,
    ctx: Arc<ControllerContext>,
) -> kube::runtime::controller::Action {
    tracing::error!(name = %cp.name_any(), error = %error, "Reconciliation error");
    kube::runtime::controller::Action::requeue(ctx.config.error_backoff())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crd::{
        ControlPlaneParameters, ControlPlaneSpec, DeletionPolicy, ProviderConfigReference,
    };

    fn control_plane() -> ControlPlane {
        ControlPlane::new(
            "prod",
            ControlPlaneSpec {
                for_provider: ControlPlaneParameters {
                    organization_name: "acme".into(),
                    configuration: "platform-ref-aws".into(),
                    ..Default::default()
                },
                provider_config_ref: ProviderConfigReference::default(),
                deletion_policy: DeletionPolicy::Delete,
            },
        )
    }

    #[test]
    fn version_patch_targets_for_provider() {
        let patch = VersionPatch {
            version: "v3.2.0+14.deadbee".into(),
        };

        assert_eq!(
            patch.merge_patch(),
            serde_json::json!({"spec": {"forProvider": {"version": "v3.2.0+14.deadbee"}}})
        );

        let mut cp = control_plane();
        patch.apply_to(&mut cp);
        assert_eq!(
            cp.spec.for_provider.version.as_deref(),
            Some("v3.2.0+14.deadbee")
        );
    }

    #[test]
    fn ready_condition_mapping() {
        let cases = [
            (Some(ControlPlanePhase::Ready), "True", "Available"),
            (Some(ControlPlanePhase::Provisioning), "False", "Creating"),
            (Some(ControlPlanePhase::Deleting), "False", "Deleting"),
            (Some(ControlPlanePhase::Updating), "False", "Unavailable"),
            (Some(ControlPlanePhase::Unknown), "False", "Unavailable"),
            (None, "False", "Unavailable"),
        ];

        for (phase, status, reason) in cases {
            let condition = ready_condition(phase);
            assert_eq!(condition.condition_type, "Ready");
            assert_eq!(condition.status, status, "{phase:?}");
            assert_eq!(condition.reason, reason, "{phase:?}");
        }
    }
}
