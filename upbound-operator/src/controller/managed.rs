//! Plumbing shared by controllers of managed resources.
//!
//! A managed resource mirrors an object in an external system. Each cycle the
//! controller observes the external object through an [`ExternalClient`],
//! writes back any spec changes the observation produced, then runs the
//! single step chosen by [`plan`].

use crate::crd::DeletionPolicy;
use crate::error::OperatorResult;
use std::future::Future;
use std::pin::Pin;

/// Boxed future returned by [`ExternalClient`] methods.
pub type ExternalFuture<'a, T> = Pin<Box<dyn Future<Output = OperatorResult<T>> + Send + 'a>>;

/// What an observation found out about the external resource.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExternalObservation {
    /// The external resource exists.
    pub resource_exists: bool,
    /// The external resource matches the desired state.
    pub resource_up_to_date: bool,
    /// Unset spec fields were filled in from the external resource.
    pub resource_late_initialized: bool,
}

impl ExternalObservation {
    /// The external resource does not exist.
    pub fn absent() -> Self {
        Self::default()
    }
}

/// Result of observing an external resource.
///
/// Observation never mutates the resource it was given. Spec changes it
/// derives come back in `spec_patch` for the caller to persist.
#[derive(Debug, Clone)]
pub struct Observed<A, P> {
    /// Existence and freshness of the external resource.
    pub observation: ExternalObservation,
    /// Observed state to record under `status.atProvider`.
    pub at_provider: Option<A>,
    /// Spec changes to write back before acting on the observation.
    pub spec_patch: Option<P>,
}

impl<A, P> Observed<A, P> {
    /// The external resource does not exist.
    pub fn absent() -> Self {
        Self {
            observation: ExternalObservation::absent(),
            at_provider: None,
            spec_patch: None,
        }
    }
}

/// A change to the spec of a managed resource.
pub trait SpecPatch<K>: Send + Sync {
    /// JSON merge patch persisting the change.
    fn merge_patch(&self) -> serde_json::Value;

    /// Apply the change to an in-memory copy.
    fn apply_to(&self, resource: &mut K);
}

/// Result of creating an external resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalCreation {
    /// Name the external system assigned to the resource.
    pub external_name: String,
}

/// Operations against the external system for one managed resource kind.
///
/// Each kind gets its own implementation with concrete associated types, so
/// controllers never inspect the resource kind at runtime.
pub trait ExternalClient: Send + Sync {
    /// The managed resource kind.
    type Resource: Send + Sync;
    /// Observed external state recorded in status.
    type AtProvider: Send;
    /// Spec changes produced by observation.
    type SpecPatch: SpecPatch<Self::Resource>;

    /// Observe the external resource.
    fn observe<'a>(
        &'a self,
        resource: &'a Self::Resource,
    ) -> ExternalFuture<'a, Observed<Self::AtProvider, Self::SpecPatch>>;

    /// Create the external resource.
    fn create<'a>(&'a self, resource: &'a Self::Resource) -> ExternalFuture<'a, ExternalCreation>;

    /// Drive the external resource toward the desired state.
    fn update<'a>(&'a self, resource: &'a Self::Resource) -> ExternalFuture<'a, ()>;

    /// Delete the external resource.
    fn delete<'a>(&'a self, resource: &'a Self::Resource) -> ExternalFuture<'a, ()>;
}

/// The one action a reconcile cycle takes after observing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManagedStep {
    /// Create the external resource.
    Create,
    /// Update the external resource.
    Update,
    /// Delete the external resource.
    Delete,
    /// Nothing to do.
    Observe,
    /// The external resource is gone or orphaned; release the finalizer.
    Forget,
}

/// Choose the step for this cycle.
pub fn plan(
    observation: &ExternalObservation,
    deleting: bool,
    policy: DeletionPolicy,
) -> ManagedStep {
    if deleting {
        return match (policy, observation.resource_exists) {
            (DeletionPolicy::Delete, true) => ManagedStep::Delete,
            _ => ManagedStep::Forget,
        };
    }

    if !observation.resource_exists {
        ManagedStep::Create
    } else if !observation.resource_up_to_date {
        ManagedStep::Update
    } else {
        ManagedStep::Observe
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn observation(exists: bool, up_to_date: bool) -> ExternalObservation {
        ExternalObservation {
            resource_exists: exists,
            resource_up_to_date: up_to_date,
            resource_late_initialized: false,
        }
    }

    #[test]
    fn plan_while_live() {
        let policy = DeletionPolicy::Delete;
        assert_eq!(plan(&observation(false, false), false, policy), ManagedStep::Create);
        assert_eq!(plan(&observation(true, false), false, policy), ManagedStep::Update);
        assert_eq!(plan(&observation(true, true), false, policy), ManagedStep::Observe);
    }

    #[test]
    fn plan_while_deleting() {
        assert_eq!(
            plan(&observation(true, true), true, DeletionPolicy::Delete),
            ManagedStep::Delete
        );
        assert_eq!(
            plan(&observation(false, false), true, DeletionPolicy::Delete),
            ManagedStep::Forget
        );
        assert_eq!(
            plan(&observation(true, false), true, DeletionPolicy::Orphan),
            ManagedStep::Forget
        );
    }

    #[test]
    fn late_init_alone_does_not_trigger_update() {
        let obs = ExternalObservation {
            resource_exists: true,
            resource_up_to_date: true,
            resource_late_initialized: true,
        };
        assert_eq!(plan(&obs, false, DeletionPolicy::Delete), ManagedStep::Observe);
    }
}
