//! Git operations
//!
//! Resolves which top-level unit directories changed between two
//! commits. Shells out to the system `git` binary; the path-to-unit
//! extraction is a pure function so it can be tested without a
//! repository.

use std::collections::BTreeSet;
use std::path::PathBuf;
use tokio::process::Command;
use tracing::debug;

use crate::error::GitError;
use crate::tools::get_tool_path;

/// Client for read-only git queries against one repository
pub struct GitClient {
    repo_path: PathBuf,
    program: String,
}

impl GitClient {
    /// Create a git client for the given repository path
    pub fn new(repo_path: impl Into<PathBuf>) -> Self {
        Self {
            repo_path: repo_path.into(),
            program: get_tool_path("git"),
        }
    }

    /// Resolve the repository's current HEAD commit
    pub async fn head_sha(&self) -> Result<String, GitError> {
        let output = self
            .git(&["rev-parse", "HEAD"])
            .await
            .map_err(|e| GitError::HeadFailed {
                message: e.to_string(),
            })?;

        if !output.status.success() {
            return Err(self.classify_failure(&output.stderr, || GitError::HeadFailed {
                message: stderr_text(&output.stderr),
            }));
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    /// Top-level directories touched between two commits
    ///
    /// An empty `to_ref` resolves to HEAD. Files directly at the
    /// repository root belong to no unit and are ignored. The result is
    /// deduplicated and lexicographically ordered.
    pub async fn changed_units(
        &self,
        to_ref: &str,
        from_ref: &str,
    ) -> Result<BTreeSet<String>, GitError> {
        let to_ref = if to_ref.is_empty() {
            self.head_sha().await?
        } else {
            to_ref.to_string()
        };

        self.verify_commit(from_ref).await?;
        self.verify_commit(&to_ref).await?;

        let output = self
            .git(&["diff", "--name-only", from_ref, to_ref.as_str()])
            .await
            .map_err(|e| GitError::DiffFailed {
                from: from_ref.to_string(),
                to: to_ref.clone(),
                message: e.to_string(),
            })?;

        if !output.status.success() {
            return Err(self.classify_failure(&output.stderr, || GitError::DiffFailed {
                from: from_ref.to_string(),
                to: to_ref.clone(),
                message: stderr_text(&output.stderr),
            }));
        }

        let diff = String::from_utf8_lossy(&output.stdout);
        let units = units_from_paths(diff.lines());
        debug!("diff {}..{} touched {} unit(s)", from_ref, to_ref, units.len());
        Ok(units)
    }

    /// Check that a ref resolves to a commit in this repository
    async fn verify_commit(&self, reference: &str) -> Result<(), GitError> {
        let spec = format!("{}^{{commit}}", reference);
        let output = self
            .git(&["rev-parse", "--verify", "--quiet", &spec])
            .await
            .map_err(|e| GitError::CommandFailed {
                message: e.to_string(),
            })?;

        if !output.status.success() {
            return Err(self.classify_failure(&output.stderr, || GitError::RefNotFound {
                reference: reference.to_string(),
            }));
        }

        Ok(())
    }

    async fn git(&self, args: &[&str]) -> std::io::Result<std::process::Output> {
        Command::new(&self.program)
            .args(args)
            .current_dir(&self.repo_path)
            .output()
            .await
    }

    /// A failure against a path that isn't a repository reports that,
    /// whatever the subcommand was.
    fn classify_failure(&self, stderr: &[u8], fallback: impl FnOnce() -> GitError) -> GitError {
        if stderr_text(stderr)
            .to_lowercase()
            .contains("not a git repository")
        {
            GitError::NotARepository {
                path: self.repo_path.display().to_string(),
            }
        } else {
            fallback()
        }
    }
}

fn stderr_text(stderr: &[u8]) -> String {
    String::from_utf8_lossy(stderr).trim().to_string()
}

/// Extract unit names from changed file paths
///
/// Every path containing at least one separator contributes its first
/// segment; root-level files are skipped. BTreeSet gives deduplication
/// and lexicographic order in one step.
pub fn units_from_paths<'a>(paths: impl Iterator<Item = &'a str>) -> BTreeSet<String> {
    paths
        .filter_map(|path| {
            let path = path.trim();
            match path.split_once('/') {
                Some((unit, rest)) if !unit.is_empty() && !rest.is_empty() => {
                    Some(unit.to_string())
                }
                _ => None,
            }
        })
        .collect()
}
