use anyhow::{Context, Result};
use std::path::Path;

use crate::config::Manifest;
use crate::infrastructure::{DockerCli, RegistryClient};
use crate::ui;

/// Build and push the image for every unit changed between the commits
///
/// The primary tag is pushed first, then each additional tag is applied
/// and pushed, in the order the manifest lists them.
pub async fn execute(
    repo_path: String,
    previous_sha: String,
    current_sha: Option<String>,
) -> Result<()> {
    let units = super::build::changed_units(&repo_path, &previous_sha, current_sha).await?;
    if units.is_empty() {
        ui::print_info("No changed units, nothing to push");
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

        ui::print_step("Building image");
        docker.build(&Path::new(&repo_path).join(unit), &image).await?;
        ui::print_success("Image successfully built");

        ui::print_step("Pushing image");
        docker.push_all(&manifest).await?;
        ui::print_success("Image successfully pushed");
    }

    Ok(())
}
