//! Idempotent provisioning of Unity Catalog governance objects.
//!
//! Catalogs, metastores, storage credentials and external locations are
//! created only when no object of the same name exists; an existing object is
//! returned untouched.

pub mod config;
pub mod databricks;
pub mod error;
pub mod report;
pub mod resource;

/// Version injected at compile time via UCPROV_VERSION env var (set by CI/CD),
/// or the crate version for local builds.
pub const VERSION: &str = match option_env!("UCPROV_VERSION") {
    Some(v) => v,
    None => env!("CARGO_PKG_VERSION"),
};
