//! Command-line configuration for the operator binary.

use clap::Parser;
use std::time::Duration;

/// Runtime settings of the operator.
#[derive(Debug, Clone, Parser)]
#[command(name = "upbound-operator")]
#[command(author, version, about = "Manages Upbound control planes from Kubernetes", long_about = None)]
pub struct OperatorConfig {
    /// Seconds between reconciles of a resource that is in sync
    #[arg(long, env = "POLL_INTERVAL", default_value_t = 60)]
    pub poll_interval: u64,

    /// Seconds to wait before retrying a failed reconcile
    #[arg(long, env = "ERROR_BACKOFF", default_value_t = 30)]
    pub error_backoff: u64,

    /// Seconds after which a request to the Upbound API times out
    #[arg(long, env = "UPBOUND_TIMEOUT", default_value_t = 30)]
    pub request_timeout: u64,

    /// Print the CRDs as YAML and exit
    #[arg(long)]
    pub generate_crds: bool,
}

impl OperatorConfig {
    /// Requeue delay for resources in sync.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval)
    }

    /// Requeue delay after an error.
    pub fn error_backoff(&self) -> Duration {
        Duration::from_secs(self.error_backoff)
    }

    /// Timeout for Upbound API requests.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }
}
