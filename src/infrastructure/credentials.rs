//! Registry credential resolution
//!
//! Credentials for a registry host come from the user's docker config
//! (`~/.docker/config.json`), tried in a fixed order:
//!
//! 1. A static `auths` entry: base64 of `username:secret`.
//! 2. A credential helper: `docker-credential-{helper}`, where the
//!    helper name comes from `credHelpers[host]` falling back to
//!    `credsStore`. The helper is invoked with the argument `get`, the
//!    host on stdin, and returns a JSON credential object on stdout.
//!
//! Helper invocation goes through [`CommandRunner`] so tests never
//! spawn a real helper. Secrets are never logged.

use base64::Engine;
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use tracing::debug;

use crate::error::CredentialError;
use crate::process::{CommandRunner, SystemRunner};

/// Credentials for one registry host
#[derive(Clone)]
pub struct RegistryCredentials {
    pub server_url: String,
    pub username: String,
    pub secret: String,
}

// Hand-rolled so the secret can't leak through debug formatting.
impl fmt::Debug for RegistryCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistryCredentials")
            .field("server_url", &self.server_url)
            .field("username", &self.username)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Shape of `~/.docker/config.json`, limited to what resolution needs
#[derive(Debug, Default, Deserialize)]
struct DockerConfig {
    #[serde(default)]
    auths: HashMap<String, AuthEntry>,
    #[serde(default, rename = "credsStore")]
    creds_store: Option<String>,
    #[serde(default, rename = "credHelpers")]
    cred_helpers: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct AuthEntry {
    auth: Option<String>,
}

/// Credential helper stdout payload
#[derive(Debug, Deserialize)]
struct HelperResponse {
    #[serde(rename = "ServerURL", default)]
    server_url: String,
    #[serde(rename = "Username")]
    username: String,
    #[serde(rename = "Secret")]
    secret: String,
}

/// Resolves registry credentials from docker config + credential helpers
pub struct CredentialResolver<R: CommandRunner = SystemRunner> {
    config_path: PathBuf,
    runner: R,
}

impl Default for CredentialResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialResolver {
    /// Resolver over `$DOCKER_CONFIG/config.json`, defaulting to
    /// `~/.docker/config.json`
    pub fn new() -> Self {
        let config_path = std::env::var("DOCKER_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                dirs::home_dir()
                    .map(|h| h.join(".docker"))
                    .unwrap_or_else(|| PathBuf::from(".docker"))
            })
            .join("config.json");

        Self {
            config_path,
            runner: SystemRunner,
        }
    }
}

impl<R: CommandRunner> CredentialResolver<R> {
    /// Resolver with an explicit config path and runner (used in tests)
    pub fn with_parts(config_path: PathBuf, runner: R) -> Self {
        Self {
            config_path,
            runner,
        }
    }

    /// Resolve credentials for a registry host
    pub fn resolve(&self, registry: &str) -> Result<RegistryCredentials, CredentialError> {
        let config = self.load_docker_config()?;

        if let Some(entry) = config.auths.get(registry) {
            if let Some(auth) = entry.auth.as_deref().filter(|a| !a.is_empty()) {
                debug!("using static docker config credentials for {}", registry);
                return decode_auth(auth, registry);
            }
        }

        self.resolve_from_helper(&config, registry)
    }

    fn load_docker_config(&self) -> Result<DockerConfig, CredentialError> {
        let path = self.config_path.display().to_string();

        if !self.config_path.exists() {
            return Err(CredentialError::ConfigNotFound { path });
        }

        let content = std::fs::read_to_string(&self.config_path).map_err(|e| {
            CredentialError::MalformedConfig {
                path: path.clone(),
                message: e.to_string(),
            }
        })?;

        // A config file that exists but doesn't parse is an error, not
        // an empty credential store.
        serde_json::from_str(&content).map_err(|e| CredentialError::MalformedConfig {
            path,
            message: e.to_string(),
        })
    }

    fn resolve_from_helper(
        &self,
        config: &DockerConfig,
        registry: &str,
    ) -> Result<RegistryCredentials, CredentialError> {
        let helper = config
            .cred_helpers
            .get(registry)
            .cloned()
            .or_else(|| config.creds_store.clone())
            .filter(|h| !h.is_empty())
            .ok_or_else(|| CredentialError::NoHelperConfigured {
                registry: registry.to_string(),
            })?;

        let program = format!("docker-credential-{}", helper);
        debug!("invoking credential helper {} for {}", program, registry);

        let output = self
            .runner
            .run(&program, &["get"], registry.as_bytes())
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    CredentialError::HelperNotFound {
                        helper: program.clone(),
                    }
                } else {
                    CredentialError::HelperFailed {
                        helper: program.clone(),
                        code: None,
                        stderr: e.to_string(),
                    }
                }
            })?;

        if !output.success {
            return Err(CredentialError::HelperFailed {
                helper: program,
                code: output.code,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let response: HelperResponse = serde_json::from_slice(&output.stdout).map_err(|e| {
            CredentialError::HelperOutput {
                helper: program,
                message: e.to_string(),
            }
        })?;

        let server_url = if response.server_url.is_empty() {
            registry.to_string()
        } else {
            response.server_url
        };

        Ok(RegistryCredentials {
            server_url,
            username: response.username,
            secret: response.secret,
        })
    }
}

/// Decode a static `auths` entry: base64 of `username:secret`
fn decode_auth(auth: &str, registry: &str) -> Result<RegistryCredentials, CredentialError> {
    let malformed = || CredentialError::MalformedAuth {
        registry: registry.to_string(),
    };

    let decoded = base64::engine::general_purpose::STANDARD
        .decode(auth)
        .map_err(|_| malformed())?;
    let decoded = String::from_utf8(decoded).map_err(|_| malformed())?;

    match decoded.split_once(':') {
        Some((username, secret)) if !username.is_empty() && !secret.is_empty() => {
            Ok(RegistryCredentials {
                server_url: registry.to_string(),
                username: username.to_string(),
                secret: secret.to_string(),
            })
        }
        _ => Err(malformed()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    /// Scripted runner recording the invocation it receives
    struct FakeRunner {
        result: std::io::Result<crate::process::CommandOutput>,
        calls: RefCell<Vec<(String, Vec<String>, Vec<u8>)>>,
    }

    impl FakeRunner {
        fn returning(result: std::io::Result<crate::process::CommandOutput>) -> Self {
            Self {
                result,
                calls: RefCell::new(Vec::new()),
            }
        }
    }

    impl CommandRunner for FakeRunner {
        fn run(
            &self,
            program: &str,
            args: &[&str],
            stdin: &[u8],
        ) -> std::io::Result<crate::process::CommandOutput> {
            self.calls.borrow_mut().push((
                program.to_string(),
                args.iter().map(|a| a.to_string()).collect(),
                stdin.to_vec(),
            ));
            match &self.result {
                Ok(output) => Ok(output.clone()),
                Err(e) => Err(std::io::Error::new(e.kind(), e.to_string())),
            }
        }
    }

    fn success_output(stdout: &str) -> crate::process::CommandOutput {
        crate::process::CommandOutput {
            success: true,
            code: Some(0),
            stdout: stdout.as_bytes().to_vec(),
            stderr: Vec::new(),
        }
    }

    fn write_config(content: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, content).unwrap();
        (dir, path)
    }

    fn encode(value: &str) -> String {
        base64::engine::general_purpose::STANDARD.encode(value)
    }

    #[test]
    fn test_static_auth_decodes() {
        let config = format!(
            r#"{{"auths": {{"registry.example.com": {{"auth": "{}"}}}}}}"#,
            encode("alice:secret123")
        );
        let (_dir, path) = write_config(&config);

        let resolver = CredentialResolver::with_parts(
            path,
            FakeRunner::returning(Ok(success_output("{}"))),
        );
        let creds = resolver.resolve("registry.example.com").unwrap();
        assert_eq!(creds.username, "alice");
        assert_eq!(creds.secret, "secret123");
        assert_eq!(creds.server_url, "registry.example.com");
    }

    #[test]
    fn test_static_auth_without_colon_is_malformed() {
        let config = format!(
            r#"{{"auths": {{"registry.example.com": {{"auth": "{}"}}}}}}"#,
            encode("no-separator-here")
        );
        let (_dir, path) = write_config(&config);

        let resolver = CredentialResolver::with_parts(
            path,
            FakeRunner::returning(Ok(success_output("{}"))),
        );
        let err = resolver.resolve("registry.example.com").unwrap_err();
        assert!(matches!(err, CredentialError::MalformedAuth { .. }));
    }

    #[test]
    fn test_malformed_config_file_is_surfaced() {
        let (_dir, path) = write_config("{ this is not json");

        let resolver = CredentialResolver::with_parts(
            path,
            FakeRunner::returning(Ok(success_output("{}"))),
        );
        let err = resolver.resolve("registry.example.com").unwrap_err();
        assert!(matches!(err, CredentialError::MalformedConfig { .. }));
    }

    #[test]
    fn test_missing_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let resolver = CredentialResolver::with_parts(
            dir.path().join("config.json"),
            FakeRunner::returning(Ok(success_output("{}"))),
        );
        let err = resolver.resolve("registry.example.com").unwrap_err();
        assert!(matches!(err, CredentialError::ConfigNotFound { .. }));
    }

    #[test]
    fn test_helper_invocation_protocol() {
        let (_dir, path) = write_config(r#"{"credsStore": "keychain"}"#);
        let runner = FakeRunner::returning(Ok(success_output(
            r#"{"ServerURL": "https://registry.example.com", "Username": "bob", "Secret": "hunter2"}"#,
        )));

        let resolver = CredentialResolver::with_parts(path, runner);
        let creds = resolver.resolve("registry.example.com").unwrap();
        assert_eq!(creds.username, "bob");
        assert_eq!(creds.secret, "hunter2");
        assert_eq!(creds.server_url, "https://registry.example.com");

        let calls = resolver.runner.calls.borrow();
        assert_eq!(calls.len(), 1);
        let (program, args, stdin) = &calls[0];
        assert_eq!(program, "docker-credential-keychain");
        assert_eq!(args, &vec!["get".to_string()]);
        assert_eq!(stdin, b"registry.example.com");
    }

    #[test]
    fn test_per_host_helper_overrides_default() {
        let (_dir, path) = write_config(
            r#"{"credsStore": "keychain", "credHelpers": {"gcr.io": "gcloud"}}"#,
        );
        let runner = FakeRunner::returning(Ok(success_output(
            r#"{"ServerURL": "", "Username": "bob", "Secret": "hunter2"}"#,
        )));

        let resolver = CredentialResolver::with_parts(path, runner);
        let creds = resolver.resolve("gcr.io").unwrap();
        // Empty ServerURL falls back to the requested host
        assert_eq!(creds.server_url, "gcr.io");

        let calls = resolver.runner.calls.borrow();
        assert_eq!(calls[0].0, "docker-credential-gcloud");
    }

    #[test]
    fn test_helper_nonzero_exit() {
        let (_dir, path) = write_config(r#"{"credsStore": "keychain"}"#);
        let runner = FakeRunner::returning(Ok(crate::process::CommandOutput {
            success: false,
            code: Some(1),
            stdout: Vec::new(),
            stderr: b"credentials not found in native keychain".to_vec(),
        }));

        let resolver = CredentialResolver::with_parts(path, runner);
        let err = resolver.resolve("registry.example.com").unwrap_err();
        match err {
            CredentialError::HelperFailed { code, stderr, .. } => {
                assert_eq!(code, Some(1));
                assert!(stderr.contains("native keychain"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_helper_garbage_output() {
        let (_dir, path) = write_config(r#"{"credsStore": "keychain"}"#);
        let runner = FakeRunner::returning(Ok(success_output("not json at all")));

        let resolver = CredentialResolver::with_parts(path, runner);
        let err = resolver.resolve("registry.example.com").unwrap_err();
        assert!(matches!(err, CredentialError::HelperOutput { .. }));
    }

    #[test]
    fn test_helper_binary_missing() {
        let (_dir, path) = write_config(r#"{"credsStore": "keychain"}"#);
        let runner = FakeRunner::returning(Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "no such file",
        )));

        let resolver = CredentialResolver::with_parts(path, runner);
        let err = resolver.resolve("registry.example.com").unwrap_err();
        assert!(matches!(err, CredentialError::HelperNotFound { .. }));
    }

    #[test]
    fn test_no_helper_configured() {
        let (_dir, path) = write_config(r#"{"auths": {}}"#);
        let resolver = CredentialResolver::with_parts(
            path,
            FakeRunner::returning(Ok(success_output("{}"))),
        );
        let err = resolver.resolve("registry.example.com").unwrap_err();
        assert!(matches!(err, CredentialError::NoHelperConfigured { .. }));
    }

    #[test]
    fn test_debug_redacts_secret() {
        let creds = RegistryCredentials {
            server_url: "registry.example.com".to_string(),
            username: "alice".to_string(),
            secret: "secret123".to_string(),
        };
        let formatted = format!("{:?}", creds);
        assert!(!formatted.contains("secret123"));
        assert!(formatted.contains("<redacted>"));
    }
}
