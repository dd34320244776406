//! Idempotent provisioning
//!
//! "Ensure exists" semantics: look the name up, return what is there if the
//! name is taken, create it otherwise. An existing object is never compared
//! with or updated to the requested spec.
//!
//! There is no coordination between concurrent callers. Two callers racing
//! on the same name can both see it absent; the loser gets a
//! [`ProvisionError::CreationFailure`] from the remote uniqueness check.

use crate::error::{ApiError, ProvisionError, Result};
use crate::report::{ProvisionEvent, Reporter};

use super::{AdminApi, ResourceDescriptor, ResourceKind, ResourceSpec};

/// How a failed lookup is interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExistencePolicy {
    /// Only a "not found" answer means absent; other lookup errors abort
    #[default]
    Strict,
    /// Any lookup error means absent
    Lenient,
}

/// Result of an existence check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    Found(ResourceDescriptor),
    NotFound,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Created,
    AlreadyExisted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Provisioned {
    pub descriptor: ResourceDescriptor,
    pub outcome: Outcome,
}

/// Counts for a sequence of provisioning calls
#[derive(Debug, Default)]
pub struct BatchSummary {
    pub created: Vec<(ResourceKind, String)>,
    pub existing: Vec<(ResourceKind, String)>,
    pub failed: Vec<(ResourceKind, String, String)>,
    /// Entries never attempted because an earlier one failed
    pub skipped: usize,
}

impl BatchSummary {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty() && self.skipped == 0
    }

    pub fn headline(&self) -> String {
        let mut headline = format!(
            "{} created, {} already existed, {} failed",
            self.created.len(),
            self.existing.len(),
            self.failed.len()
        );
        if self.skipped > 0 {
            headline.push_str(&format!(", {} not attempted", self.skipped));
        }
        headline
    }
}

/// Idempotent provisioner over an injected Admin API client
///
/// Holds no state between calls beyond the borrowed client and the reporter.
pub struct Provisioner<'a, A: AdminApi + ?Sized, R: Reporter> {
    api: &'a A,
    reporter: R,
    policy: ExistencePolicy,
}

impl<'a, A: AdminApi + ?Sized, R: Reporter> Provisioner<'a, A, R> {
    pub fn new(api: &'a A, reporter: R) -> Self {
        Self {
            api,
            reporter,
            policy: ExistencePolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: ExistencePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Look an object up, classifying the answer under the current policy
    pub async fn lookup(&self, kind: ResourceKind, name: &str) -> Result<Lookup> {
        match self.api.get(kind, name).await {
            Ok(descriptor) => Ok(Lookup::Found(descriptor)),
            Err(e) if e.is_not_found() => {
                tracing::debug!("{} '{}' not found", kind, name);
                Ok(Lookup::NotFound)
            }
            Err(e) => match self.policy {
                ExistencePolicy::Lenient => {
                    tracing::warn!(
                        "Lookup of {} '{}' failed ({}), treating as absent",
                        kind,
                        name,
                        e
                    );
                    Ok(Lookup::NotFound)
                }
                ExistencePolicy::Strict => Err(ProvisionError::LookupFailure {
                    kind,
                    name: name.to_string(),
                    source: e,
                }),
            },
        }
    }

    /// Whether an object of this kind and name exists
    pub async fn exists(&self, kind: ResourceKind, name: &str) -> Result<bool> {
        Ok(matches!(self.lookup(kind, name).await?, Lookup::Found(_)))
    }

    /// Create the object unless one with the same name already exists
    ///
    /// At most one lookup and one create call are issued. An existing object
    /// is returned as looked up, even when its attributes differ from `spec`.
    pub async fn ensure_exists(&self, spec: &ResourceSpec) -> Result<Provisioned> {
        let kind = spec.kind();
        let name = spec.name();

        if name.trim().is_empty() {
            return Err(ProvisionError::invalid(kind, "name must not be empty"));
        }

        let lookup = match self.lookup(kind, name).await {
            Ok(lookup) => lookup,
            Err(error) => {
                self.reporter.report(&ProvisionEvent::LookupFailed {
                    kind,
                    name,
                    error: &error,
                });
                return Err(error);
            }
        };

        if let Lookup::Found(descriptor) = lookup {
            self.reporter.report(&ProvisionEvent::AlreadyExists(&descriptor));
            return Ok(Provisioned {
                descriptor,
                outcome: Outcome::AlreadyExisted,
            });
        }

        self.reporter.report(&ProvisionEvent::Creating(spec));

        match self.api.create(spec).await {
            Ok(descriptor) => {
                self.reporter.report(&ProvisionEvent::Created(&descriptor));
                Ok(Provisioned {
                    descriptor,
                    outcome: Outcome::Created,
                })
            }
            Err(source) => {
                let error = creation_failure(kind, name, source);
                self.reporter.report(&ProvisionEvent::CreationFailed {
                    kind,
                    name,
                    error: &error,
                });
                Err(error)
            }
        }
    }

    /// [`Self::ensure_exists`], returning only the descriptor
    pub async fn provision(&self, spec: &ResourceSpec) -> Result<ResourceDescriptor> {
        self.ensure_exists(spec).await.map(|p| p.descriptor)
    }

    /// Provision specs in order
    ///
    /// Stops at the first failure unless `keep_going` is set. Objects created
    /// before a failure are left in place.
    pub async fn provision_all(&self, specs: &[ResourceSpec], keep_going: bool) -> BatchSummary {
        let mut summary = BatchSummary::default();

        for (index, spec) in specs.iter().enumerate() {
            let entry = (spec.kind(), spec.name().to_string());
            match self.ensure_exists(spec).await {
                Ok(Provisioned {
                    outcome: Outcome::Created,
                    ..
                }) => summary.created.push(entry),
                Ok(Provisioned {
                    outcome: Outcome::AlreadyExisted,
                    ..
                }) => summary.existing.push(entry),
                Err(e) => {
                    summary.failed.push((entry.0, entry.1, e.to_string()));
                    if !keep_going {
                        summary.skipped = specs.len() - index - 1;
                        break;
                    }
                }
            }
        }

        summary
    }
}

fn creation_failure(kind: ResourceKind, name: &str, source: ApiError) -> ProvisionError {
    ProvisionError::CreationFailure {
        kind,
        name: name.to_string(),
        source,
    }
}
