//! Upbound Kubernetes Operator binary.
//!
//! Runs the ControlPlane controller against the current cluster, or prints
//! the CRDs with `--generate-crds`.

use clap::Parser;
use futures::StreamExt;
use kube::runtime::Controller;
use kube::runtime::watcher::Config as WatcherConfig;
use kube::{Api, Client, CustomResourceExt};
use std::sync::Arc;
use upbound_client::SessionCache;
use upbound_operator::OperatorConfig;
use upbound_operator::controller::{
    ControlPlaneController, ControllerContext, controlplane_error_policy,
};
use upbound_operator::crd::{ControlPlane, ProviderConfig};
use upbound_operator::observability::{TracingConfig, init_tracing};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = OperatorConfig::parse();

    if config.generate_crds {
        generate_crds()?;
        return Ok(());
    }

    init_tracing(&TracingConfig::from_env())?;
    tracing::info!(
        poll_interval_secs = config.poll_interval,
        error_backoff_secs = config.error_backoff,
        "Starting Upbound Kubernetes Operator"
    );

    let client = Client::try_default().await?;
    tracing::info!("Connected to Kubernetes cluster");

    let sessions = Arc::new(SessionCache::new());
    let ctx = Arc::new(ControllerContext::new(client.clone(), sessions, config));

    run_controlplane_controller(client, ctx).await
}

/// Run the ControlPlane controller until shutdown.
async fn run_controlplane_controller(
    client: Client,
    ctx: Arc<ControllerContext>,
) -> anyhow::Result<()> {
    tracing::info!("Starting ControlPlane controller");

    let control_planes: Api<ControlPlane> = Api::all(client);
    let controller = ControlPlaneController::new(ctx.clone());

    Controller::new(control_planes, WatcherConfig::default())
        .shutdown_on_signal()
        .run(
            move |cp, _ctx| {
                let controller = controller.clone();
                async move { controller.reconcile(cp).await.map(Into::into) }
            },
            controlplane_error_policy,
            ctx,
        )
        .for_each(|result| async move {
            match result {
                Ok((obj, action)) => {
                    tracing::debug!(
                        control_plane = %obj.name,
                        ?action,
                        "Reconciled control plane"
                    );
                }
                Err(e) => {
                    tracing::error!(error = %e, "ControlPlane controller stream error");
                }
            }
        })
        .await;

    tracing::info!("ControlPlane controller stopped");
    Ok(())
}

/// Print CRD YAML documents.
fn generate_crds() -> anyhow::Result<()> {
    println!("---");
    println!("{}", serde_yaml::to_string(&ControlPlane::crd())?);
    println!("---");
    println!("{}", serde_yaml::to_string(&ProviderConfig::crd())?);
    Ok(())
}
