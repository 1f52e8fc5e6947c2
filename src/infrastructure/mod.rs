//! Infrastructure layer - external I/O adapters
//!
//! This module contains all code that interacts with external systems:
//! - Git (changed-unit resolution)
//! - Docker credential stores and helpers
//! - Container registries (distribution v2 API)
//! - The docker CLI (build/tag/push)

pub mod credentials;
pub mod docker;
pub mod git;
pub mod registry;

// Re-export commonly used types
pub use credentials::{CredentialResolver, RegistryCredentials};
pub use docker::DockerCli;
pub use git::GitClient;
pub use registry::RegistryClient;
