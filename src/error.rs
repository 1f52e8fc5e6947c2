//! Centralized error types for foundry
//!
//! Uses thiserror for typed errors that can be matched on,
//! while still being compatible with anyhow for propagation.

use thiserror::Error;

/// Top-level error type for foundry operations
#[derive(Error, Debug)]
pub enum FoundryError {
    #[error("Git error: {0}")]
    Git(#[from] GitError),

    #[error("Manifest error: {0}")]
    Manifest(#[from] ManifestError),

    #[error("Credential error: {0}")]
    Credential(#[from] CredentialError),

    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("Docker error: {0}")]
    Docker(#[from] DockerError),
}

/// Git operation errors
#[derive(Error, Debug)]
pub enum GitError {
    #[error("Not a git repository: {path}")]
    NotARepository { path: String },

    #[error("Commit reference not found: {reference}")]
    RefNotFound { reference: String },

    #[error("Failed to diff {from}..{to}: {message}")]
    DiffFailed {
        from: String,
        to: String,
        message: String,
    },

    #[error("Failed to resolve HEAD: {message}")]
    HeadFailed { message: String },

    #[error("Failed to run git: {message}")]
    CommandFailed { message: String },
}

/// Per-unit manifest errors
#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("Couldn't read manifest file at {path}: {message}")]
    Unreadable { path: String, message: String },

    #[error("Couldn't parse manifest file at {path}: {message}")]
    Parse { path: String, message: String },

    #[error("Manifest at {path} is missing required field: {field}")]
    MissingField { path: String, field: String },
}

/// Registry credential resolution errors
#[derive(Error, Debug)]
pub enum CredentialError {
    #[error("Docker config not found at {path}")]
    ConfigNotFound { path: String },

    #[error("Docker config at {path} is not valid JSON: {message}")]
    MalformedConfig { path: String, message: String },

    #[error("Malformed auth entry for {registry}: expected base64 of username:secret")]
    MalformedAuth { registry: String },

    #[error("No credentials or credential helper configured for {registry}")]
    NoHelperConfigured { registry: String },

    #[error("Credential helper {helper} not found in PATH")]
    HelperNotFound { helper: String },

    #[error("Credential helper {helper} failed (exit code {code:?}): {stderr}")]
    HelperFailed {
        helper: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("Credential helper {helper} returned unexpected output: {message}")]
    HelperOutput { helper: String, message: String },
}

/// Registry v2 API errors
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Request to {url} failed: {message}")]
    Transport { url: String, message: String },

    #[error("Bearer challenge is missing a realm")]
    MissingRealm,

    #[error("Invalid token realm {realm}: {message}")]
    InvalidRealm { realm: String, message: String },

    #[error("Couldn't authenticate to {realm}: got status code {status}")]
    AuthenticationFailed { realm: String, status: u16 },

    #[error("Couldn't decode token response from {realm}: {message}")]
    AuthResponseInvalid { realm: String, message: String },

    #[error("Registry query {url} failed with status {status}: {body}")]
    QueryFailed {
        url: String,
        status: u16,
        body: String,
    },
}

/// Docker CLI invocation errors
#[derive(Error, Debug)]
pub enum DockerError {
    #[error("Docker binary {program} not found in PATH")]
    NotFound { program: String },

    #[error("Couldn't build image {image}: exited with code {code:?}")]
    BuildFailed { image: String, code: Option<i32> },

    #[error("Couldn't tag image {image} as {alias}: exited with code {code:?}")]
    TagFailed {
        image: String,
        alias: String,
        code: Option<i32>,
    },

    #[error("Couldn't push image {image}: exited with code {code:?}")]
    PushFailed { image: String, code: Option<i32> },

    #[error("Failed to run docker: {0}")]
    Io(#[from] std::io::Error),
}
