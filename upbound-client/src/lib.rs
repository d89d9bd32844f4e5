//! Async Rust client for the Upbound Cloud API.
//!
//! Covers the calls the provider needs to manage control planes:
//!
//! - Login with a personal access token and session caching
//! - Control planes (get, create, delete, set desired configuration version)
//! - Configurations (get, including the latest available version)
//!
//! # Example
//!
//! ```no_run
//! use upbound_client::{Client, SessionCache};
//!
//! # async fn example(token: &str) -> Result<(), Box<dyn std::error::Error>> {
//! let sessions = SessionCache::new();
//! let client = Client::for_endpoint(None)?;
//! let session = sessions.get_or_login(&client, token).await?;
//! let client = client.with_session(session);
//!
//! let cp = client.get_control_plane("acme", "prod").await?;
//! client
//!     .set_desired_version("acme", "prod", "v1.2.0+7.abcdef0")
//!     .await?;
//! # let _ = cp;
//! # Ok(())
//! # }
//! ```
//!
//! # Error Handling
//!
//! ```no_run
//! # use upbound_client::{Client, ClientError};
//! # async fn example(client: Client) -> Result<(), ClientError> {
//! match client.get_control_plane("acme", "prod").await {
//!     Ok(cp) => println!("Found: {}", cp.control_plane.name),
//!     Err(e) if e.is_not_found() => println!("Control plane not found"),
//!     Err(e) => return Err(e),
//! }
//! # Ok(())
//! # }
//! ```

mod client;
mod configurations;
mod controlplanes;
mod error;
mod session;
mod types;

pub use client::{Client, DEFAULT_ENDPOINT, SESSION_COOKIE, USER_AGENT};
pub use error::{ClientError, Result};
pub use session::{DEFAULT_REFRESH_MARGIN_SECS, SessionCache, token_user_id};
pub use types::{
    ConfigurationResponse, ConfigurationStatus, ControlPlane, ControlPlaneConfiguration,
    ControlPlaneResponse, ControlPlaneStatus, CreateControlPlaneParams,
};
