//! Kubernetes controllers for Upbound resources.
//!
//! - [`ControlPlaneController`]: manages ControlPlane resources
//!
//! Controllers are driven by `kube::runtime::Controller`:
//!
//! ```ignore
//! use upbound_operator::controller::{ControlPlaneController, controlplane_error_policy};
//!
//! let controller = ControlPlaneController::new(ctx.clone());
//! Controller::new(control_planes, watcher_config)
//!     .run(move |cp, _ctx| {
//!         let controller = controller.clone();
//!         async move { controller.reconcile(cp).await.map(Into::into) }
//!     }, controlplane_error_policy, ctx)
//!     .for_each(|_| futures::future::ready(()))
//!     .await;
//! ```

mod connector;
mod controlplane;
pub mod managed;
pub mod version_drift;

pub use connector::{Connection, Connector, token_from_secret};
pub use controlplane::{
    ControlPlaneController, ControlPlaneExternal, FINALIZER as CONTROLPLANE_FINALIZER,
    VersionPatch, error_policy as controlplane_error_policy, ready_condition,
};

use crate::config::OperatorConfig;
use kube::runtime::controller::Action;
use std::sync::Arc;
use std::time::Duration;
use upbound_client::SessionCache;

/// Shared context for controllers.
pub struct ControllerContext {
    /// Kubernetes client.
    pub client: kube::Client,
    /// Builds authenticated Upbound clients.
    pub connector: Connector,
    /// Operator settings.
    pub config: OperatorConfig,
}

impl ControllerContext {
    /// Create a new controller context.
    pub fn new(client: kube::Client, sessions: Arc<SessionCache>, config: OperatorConfig) -> Self {
        let connector = Connector::new(client.clone(), sessions, config.request_timeout());
        Self {
            client,
            connector,
            config,
        }
    }
}

/// Result type for reconciliation actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileAction {
    /// Requeue after the specified duration.
    Requeue(Duration),
    /// Don't requeue (reconciliation complete).
    Done,
}

impl ReconcileAction {
    /// Requeue after 5 seconds, used while an external change settles.
    pub fn requeue_short() -> Self {
        Self::Requeue(Duration::from_secs(5))
    }

    /// Requeue after 30 seconds.
    pub fn requeue_medium() -> Self {
        Self::Requeue(Duration::from_secs(30))
    }
}

impl From<ReconcileAction> for Action {
    fn from(action: ReconcileAction) -> Self {
        match action {
            ReconcileAction::Requeue(duration) => Action::requeue(duration),
            ReconcileAction::Done => Action::await_change(),
        }
    }
}
