//! Docker CLI invocation
//!
//! Builds, tags and pushes images by shelling out to the docker binary
//! (resolved via `DOCKER_BIN`, falling back to PATH). Build and push
//! output is streamed straight to the operator's terminal.

use std::path::Path;
use std::process::ExitStatus;
use tokio::process::Command;
use tracing::info;

use crate::config::Manifest;
use crate::error::DockerError;
use crate::tools::get_tool_path;

/// Wrapper around the docker binary
pub struct DockerCli {
    program: String,
}

impl Default for DockerCli {
    fn default() -> Self {
        Self::new()
    }
}

impl DockerCli {
    pub fn new() -> Self {
        Self {
            program: get_tool_path("docker"),
        }
    }

    /// Build the unit directory into its primary image reference
    pub async fn build(&self, context_dir: &Path, image: &str) -> Result<(), DockerError> {
        info!("docker build -t {} {}", image, context_dir.display());
        let status = self
            .run(&["build", "-t", image, &context_dir.display().to_string()])
            .await?;

        if !status.success() {
            return Err(DockerError::BuildFailed {
                image: image.to_string(),
                code: status.code(),
            });
        }
        Ok(())
    }

    /// Apply an additional reference to an already-built image
    pub async fn tag(&self, image: &str, alias: &str) -> Result<(), DockerError> {
        let status = self.run(&["tag", image, alias]).await?;

        if !status.success() {
            return Err(DockerError::TagFailed {
                image: image.to_string(),
                alias: alias.to_string(),
                code: status.code(),
            });
        }
        Ok(())
    }

    /// Push a single image reference
    pub async fn push(&self, image: &str) -> Result<(), DockerError> {
        info!("docker push {}", image);
        let status = self.run(&["push", image]).await?;

        if !status.success() {
            return Err(DockerError::PushFailed {
                image: image.to_string(),
                code: status.code(),
            });
        }
        Ok(())
    }

    /// Push the primary tag, then tag + push each additional tag
    pub async fn push_all(&self, manifest: &Manifest) -> Result<(), DockerError> {
        let primary = manifest.image_name();
        self.push(&primary).await?;

        for alias in manifest.additional_image_names() {
            self.tag(&primary, &alias).await?;
            self.push(&alias).await?;
        }

        Ok(())
    }

    async fn run(&self, args: &[&str]) -> Result<ExitStatus, DockerError> {
        Command::new(&self.program)
            .args(args)
            .status()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    DockerError::NotFound {
                        program: self.program.clone(),
                    }
                } else {
                    DockerError::Io(e)
                }
            })
    }
}
