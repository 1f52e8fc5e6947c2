use anyhow::{Context, Result};
use std::path::Path;

use crate::config::Manifest;
use crate::infrastructure::{DockerCli, GitClient, RegistryClient};
use crate::ui;

/// Build the image for every unit changed between the two commits
///
/// Refuses to build a unit whose primary tag already exists in its
/// registry - that means the manifest tag was not bumped.
pub async fn execute(
    repo_path: String,
    previous_sha: String,
    current_sha: Option<String>,
) -> Result<()> {
    let units = changed_units(&repo_path, &previous_sha, current_sha).await?;
    if units.is_empty() {
        ui::print_info("No changed units, nothing to build");
        return Ok(());
    }

    let registry = RegistryClient::new();
    let docker = DockerCli::new();

    for unit in &units {
        let manifest = Manifest::load(Path::new(&repo_path), unit)
            .with_context(|| format!("Failed to load manifest for {}", unit))?;
        let image = manifest.image_name();
        ui::print_header(&format!("Working on image {} in folder {}", image, unit));

        let exists = registry
            .tag_exists(&manifest)
            .await
            .with_context(|| format!("Failed to check registry for {}", image))?;
        if exists {
            anyhow::bail!(
                "{} already exists. You probably forgot to update the manifest tag.",
                image
            );
        }
        ui::print_success("Image doesn't exist yet");

        ui::print_step("Building image");
        docker.build(&Path::new(&repo_path).join(unit), &image).await?;
        ui::print_success("Image successfully built");
    }

    Ok(())
}

/// Shared change detection: resolve and announce the changed units
pub(crate) async fn changed_units(
    repo_path: &str,
    previous_sha: &str,
    current_sha: Option<String>,
) -> Result<Vec<String>> {
    let git = GitClient::new(repo_path);
    let units = git
        .changed_units(current_sha.as_deref().unwrap_or(""), previous_sha)
        .await
        .context("Failed to resolve changed units")?;

    ui::print_header("Found changes for");
    for unit in &units {
        ui::print_step(&format!("- {}", unit));
    }

    Ok(units.into_iter().collect())
}
