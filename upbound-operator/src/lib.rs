//! Upbound Kubernetes Operator
//!
//! Manages Upbound hosted control planes as Kubernetes resources, in the
//! manner of a Crossplane provider.
//!
//! # Custom Resource Definitions
//!
//! - **ControlPlane**: a control plane running a versioned configuration
//! - **ProviderConfig**: endpoint and credentials used to reach Upbound
//!
//! # Example
//!
//! ```yaml
//! apiVersion: mcp.upbound.io/v1alpha1
//! kind: ControlPlane
//! metadata:
//!   name: prod
//! spec:
//!   forProvider:
//!     organizationName: acme
//!     configuration: platform-ref-aws
//!     autoUpdate: true
//!   providerConfigRef:
//!     name: default
//! ```
//!
//! When `version` is omitted it is adopted from the control plane on the
//! first reconcile. With `autoUpdate` the operator moves the control plane to
//! each newer published configuration version once the current one is ready.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod controller;
pub mod crd;
pub mod error;
pub mod observability;
pub mod version;

pub use config::OperatorConfig;
pub use crd::{ControlPlane, ControlPlaneSpec, ProviderConfig, ProviderConfigSpec};
pub use error::{OperatorError, OperatorResult};
