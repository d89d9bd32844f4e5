//! Configuration version drift detection.
//!
//! Decides, from the desired spec and a fresh snapshot of the remote
//! configuration, whether the control plane runs the version it should and
//! which version should be written back into the spec. Pure and recomputed
//! on every reconcile; nothing here is stored between cycles.

use crate::crd::{ConfigurationObservation, ConfigurationPhase, ControlPlaneParameters};
use crate::version::{compare_versions, is_newer};
use std::cmp::Ordering;

/// The version-related part of the desired state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DesiredVersion {
    /// Pinned version, if any.
    pub version: Option<String>,
    /// Whether to follow the newest published version.
    pub auto_update: Option<bool>,
}

impl From<&ControlPlaneParameters> for DesiredVersion {
    fn from(params: &ControlPlaneParameters) -> Self {
        Self {
            version: params.version.clone(),
            auto_update: params.auto_update,
        }
    }
}

/// The version-related part of the observed configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObservedConfiguration {
    /// Installation phase.
    pub status: Option<ConfigurationPhase>,
    /// Version actually installed.
    pub current_version: Option<String>,
    /// Version the remote is converging toward.
    pub desired_version: Option<String>,
    /// Newest published version.
    pub latest_available_version: Option<String>,
}

impl From<&ConfigurationObservation> for ObservedConfiguration {
    fn from(obs: &ConfigurationObservation) -> Self {
        Self {
            status: obs.status,
            current_version: obs.current_version.clone(),
            desired_version: obs.desired_version.clone(),
            latest_available_version: obs.latest_available_version.clone(),
        }
    }
}

impl ObservedConfiguration {
    fn is_ready(&self) -> bool {
        self.status == Some(ConfigurationPhase::Ready)
    }
}

/// Which branch determined the verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionState {
    /// The spec had no version and adopted the remote's current one.
    NeedsLateInit,
    /// A newer published version is being rolled out.
    AutoUpdateAdvancing,
    /// The remote differs from the pinned version.
    DriftPinned,
    /// Nothing to do.
    Synced,
}

/// Outcome of [`decide`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionDecision {
    /// Whether the remote is at the desired version.
    pub up_to_date: bool,
    /// Whether the version was adopted from the remote this cycle.
    pub late_initialized: bool,
    /// Version to write back into `spec.forProvider.version`.
    pub new_desired_version: Option<String>,
    /// Branch that produced the verdict.
    pub state: VersionState,
}

/// Decide whether the observed configuration matches the desired version.
///
/// Checks run in a fixed order:
///
/// 1. Late initialization: an unset desired version adopts the current one.
///    Not gated on the configuration status.
/// 2. Auto-update: when enabled and the configuration is ready, a strictly
///    newer latest version becomes the new desired version.
/// 3. Pinned check: when ready, the (possibly late-initialized) desired
///    version must compare equal to the current one.
/// 4. Otherwise up to date.
///
/// Version comparisons that cannot be decided never report drift.
pub fn decide(desired: &DesiredVersion, observed: &ObservedConfiguration) -> VersionDecision {
    let mut decision = VersionDecision {
        up_to_date: true,
        late_initialized: false,
        new_desired_version: None,
        state: VersionState::Synced,
    };

    let mut effective = desired.version.clone();
    if effective.is_none()
        && let Some(current) = &observed.current_version
    {
        effective = Some(current.clone());
        decision.new_desired_version = Some(current.clone());
        decision.late_initialized = true;
        decision.state = VersionState::NeedsLateInit;
    }

    if !observed.is_ready() {
        return decision;
    }

    if desired.auto_update == Some(true)
        && let (Some(latest), Some(current)) =
            (&observed.latest_available_version, &observed.current_version)
        && is_newer(latest, current)
    {
        decision.up_to_date = false;
        decision.new_desired_version = Some(latest.clone());
        decision.state = VersionState::AutoUpdateAdvancing;
        return decision;
    }

    if let (Some(wanted), Some(current)) = (&effective, &observed.current_version)
        && compare_versions(wanted, current) != Ordering::Equal
    {
        decision.up_to_date = false;
        decision.state = VersionState::DriftPinned;
    }

    decision
}

#[cfg(test)]
mod tests {
    use super::*;

    fn desired(version: Option<&str>, auto_update: Option<bool>) -> DesiredVersion {
        DesiredVersion {
            version: version.map(String::from),
            auto_update,
        }
    }

    fn observed(
        status: ConfigurationPhase,
        current: Option<&str>,
        latest: Option<&str>,
    ) -> ObservedConfiguration {
        ObservedConfiguration {
            status: Some(status),
            current_version: current.map(String::from),
            desired_version: current.map(String::from),
            latest_available_version: latest.map(String::from),
        }
    }

    #[test]
    fn late_initializes_unset_version() {
        let decision = decide(
            &desired(None, None),
            &observed(ConfigurationPhase::Ready, Some("v2.0.0+5.abc"), None),
        );

        assert!(decision.late_initialized);
        assert!(decision.up_to_date);
        assert_eq!(decision.new_desired_version.as_deref(), Some("v2.0.0+5.abc"));
        assert_eq!(decision.state, VersionState::NeedsLateInit);
    }

    #[test]
    fn late_init_is_not_gated_on_status() {
        let decision = decide(
            &desired(None, None),
            &observed(ConfigurationPhase::Installing, Some("v1.0.0+1.x"), None),
        );

        assert!(decision.late_initialized);
        assert!(decision.up_to_date);
        assert_eq!(decision.new_desired_version.as_deref(), Some("v1.0.0+1.x"));
    }

    #[test]
    fn nothing_to_late_init_without_current_version() {
        let decision = decide(
            &desired(None, None),
            &observed(ConfigurationPhase::Installing, None, None),
        );

        assert!(!decision.late_initialized);
        assert!(decision.new_desired_version.is_none());
        assert_eq!(decision.state, VersionState::Synced);
    }

    #[test]
    fn auto_update_advances_to_newer_latest() {
        let decision = decide(
            &desired(Some("v1.0.0+1.x"), Some(true)),
            &observed(
                ConfigurationPhase::Ready,
                Some("v1.0.0+1.x"),
                Some("v1.1.0+3.x"),
            ),
        );

        assert!(!decision.up_to_date);
        assert_eq!(decision.new_desired_version.as_deref(), Some("v1.1.0+3.x"));
        assert_eq!(decision.state, VersionState::AutoUpdateAdvancing);
    }

    #[test]
    fn auto_update_wins_over_late_init() {
        let decision = decide(
            &desired(None, Some(true)),
            &observed(
                ConfigurationPhase::Ready,
                Some("v1.0.0+1.x"),
                Some("v1.1.0+3.x"),
            ),
        );

        assert!(decision.late_initialized);
        assert!(!decision.up_to_date);
        assert_eq!(decision.new_desired_version.as_deref(), Some("v1.1.0+3.x"));
        assert_eq!(decision.state, VersionState::AutoUpdateAdvancing);
    }

    #[test]
    fn auto_update_on_latest_falls_through_to_pinned_check() {
        let decision = decide(
            &desired(Some("v1.1.0+3.x"), Some(true)),
            &observed(
                ConfigurationPhase::Ready,
                Some("v1.1.0+3.x"),
                Some("v1.1.0+3.x"),
            ),
        );
        assert!(decision.up_to_date);
        assert!(decision.new_desired_version.is_none());

        let drifted = decide(
            &desired(Some("v0.9.0+1.x"), Some(true)),
            &observed(
                ConfigurationPhase::Ready,
                Some("v1.1.0+3.x"),
                Some("v1.1.0+3.x"),
            ),
        );
        assert!(!drifted.up_to_date);
        assert_eq!(drifted.state, VersionState::DriftPinned);
    }

    #[test]
    fn auto_update_disabled_ignores_latest() {
        let decision = decide(
            &desired(Some("v1.0.0+1.x"), Some(false)),
            &observed(
                ConfigurationPhase::Ready,
                Some("v1.0.0+1.x"),
                Some("v1.1.0+3.x"),
            ),
        );

        assert!(decision.up_to_date);
        assert!(decision.new_desired_version.is_none());
    }

    #[test]
    fn auto_update_needs_latest_version() {
        let decision = decide(
            &desired(Some("v1.0.0+1.x"), Some(true)),
            &observed(ConfigurationPhase::Ready, Some("v1.0.0+1.x"), None),
        );

        assert!(decision.up_to_date);
        assert_eq!(decision.state, VersionState::Synced);
    }

    #[test]
    fn pinned_version_matching_is_synced() {
        let decision = decide(
            &desired(Some("v1.0.0+1.x"), None),
            &observed(ConfigurationPhase::Ready, Some("v1.0.0+1.x"), None),
        );

        assert!(decision.up_to_date);
        assert!(!decision.late_initialized);
        assert_eq!(decision.state, VersionState::Synced);
    }

    #[test]
    fn pinned_version_ignores_sha() {
        let decision = decide(
            &desired(Some("v1.0.0+1.aaaaaaa"), None),
            &observed(ConfigurationPhase::Ready, Some("v1.0.0+1.bbbbbbb"), None),
        );

        assert!(decision.up_to_date);
    }

    #[test]
    fn pinned_version_drift() {
        let decision = decide(
            &desired(Some("v1.2.0+9.x"), None),
            &observed(ConfigurationPhase::Ready, Some("v1.0.0+1.x"), None),
        );

        assert!(!decision.up_to_date);
        assert!(decision.new_desired_version.is_none());
        assert_eq!(decision.state, VersionState::DriftPinned);
    }

    #[test]
    fn malformed_versions_never_drift() {
        let decision = decide(
            &desired(Some("latest"), Some(true)),
            &observed(ConfigurationPhase::Ready, Some("v1.0.0+1.x"), Some("garbage")),
        );

        assert!(decision.up_to_date);
        assert!(decision.new_desired_version.is_none());
    }

    #[test]
    fn not_ready_skips_version_checks() {
        for status in [
            ConfigurationPhase::Installing,
            ConfigurationPhase::InstallationQueued,
            ConfigurationPhase::UpgradeQueued,
            ConfigurationPhase::Upgrading,
            ConfigurationPhase::Unknown,
        ] {
            let decision = decide(
                &desired(Some("v9.9.9+9.x"), Some(true)),
                &observed(status, Some("v1.0.0+1.x"), Some("v2.0.0+1.x")),
            );

            assert!(decision.up_to_date, "{status:?}");
            assert!(decision.new_desired_version.is_none(), "{status:?}");
        }
    }

    #[test]
    fn missing_status_is_not_ready() {
        let observed = ObservedConfiguration {
            status: None,
            current_version: Some("v1.0.0+1.x".into()),
            ..Default::default()
        };

        let decision = decide(&desired(Some("v2.0.0+1.x"), None), &observed);
        assert!(decision.up_to_date);
    }

    #[test]
    fn missing_current_version_while_ready_is_not_drift() {
        let decision = decide(
            &desired(Some("v1.0.0+1.x"), Some(true)),
            &observed(ConfigurationPhase::Ready, None, Some("v1.1.0+3.x")),
        );

        assert!(decision.up_to_date);
        assert!(decision.new_desired_version.is_none());
    }

    #[test]
    fn decide_is_stateless() {
        let d = desired(None, Some(true));
        let o = observed(
            ConfigurationPhase::Ready,
            Some("v1.0.0+1.x"),
            Some("v1.1.0+3.x"),
        );

        assert_eq!(decide(&d, &o), decide(&d, &o));
    }

    #[test]
    fn platform_ref_aws_first_reconcile() {
        let decision = decide(
            &desired(None, None),
            &observed(ConfigurationPhase::Ready, Some("v3.2.0+14.deadbee"), None),
        );

        assert!(decision.late_initialized);
        assert!(decision.up_to_date);
        assert_eq!(
            decision.new_desired_version.as_deref(),
            Some("v3.2.0+14.deadbee")
        );
    }
}
