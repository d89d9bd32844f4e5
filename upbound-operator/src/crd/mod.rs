//! Custom Resource Definitions served by the operator.
//!
//! - [`ControlPlane`]: a managed control plane hosted by Upbound
//! - [`ProviderConfig`]: connection settings and credentials for Upbound

mod common;
mod controlplane;
mod provider_config;

pub use common::{
    CONDITION_READY, CONDITION_SYNCED, Condition, DeletionPolicy, EXTERNAL_NAME_ANNOTATION,
    ProviderConfigReference, external_name, set_condition,
};
pub use controlplane::{
    ConfigurationObservation, ConfigurationPhase, ControlPlane, ControlPlaneObservation,
    ControlPlaneParameters, ControlPlanePhase, ControlPlaneSpec, ControlPlaneStatus,
};
pub use provider_config::{
    CredentialsSource, ProviderConfig, ProviderConfigSpec, ProviderCredentials, SecretKeySelector,
};
