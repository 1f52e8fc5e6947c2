//! Per-unit image manifest
//!
//! Every buildable directory carries a `manifest.yml` naming the target
//! registry, image name, primary tag and any additional tags:
//!
//! ```yaml
//! registry: ghcr.io
//! name: myorg/cart
//! tag: 1.4.2
//! additionalTags:
//!   - latest
//! ```

use serde::Deserialize;
use std::path::Path;

use crate::error::ManifestError;

/// Name of the per-unit manifest file
const MANIFEST_FILE: &str = "manifest.yml";

/// Image build manifest for one unit directory
#[derive(Debug, Clone, Deserialize)]
pub struct Manifest {
    pub registry: String,
    pub name: String,
    pub tag: String,
    /// Extra tags pushed alongside the primary tag, in authored order
    #[serde(default, rename = "additionalTags")]
    pub additional_tags: Vec<String>,
}

impl Manifest {
    /// Load and validate the manifest for a unit directory
    pub fn load(repo_path: &Path, unit: &str) -> Result<Self, ManifestError> {
        let path = repo_path.join(unit).join(MANIFEST_FILE);
        let display = path.display().to_string();

        let content = std::fs::read_to_string(&path).map_err(|e| ManifestError::Unreadable {
            path: display.clone(),
            message: e.to_string(),
        })?;

        let manifest: Manifest =
            serde_yaml::from_str(&content).map_err(|e| ManifestError::Parse {
                path: display.clone(),
                message: e.to_string(),
            })?;

        manifest.validate(&display)?;
        Ok(manifest)
    }

    fn validate(&self, path: &str) -> Result<(), ManifestError> {
        for (field, value) in [
            ("registry", &self.registry),
            ("name", &self.name),
            ("tag", &self.tag),
        ] {
            if value.is_empty() {
                return Err(ManifestError::MissingField {
                    path: path.to_string(),
                    field: field.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Fully qualified reference for the primary tag: `registry/name:tag`
    pub fn image_name(&self) -> String {
        format!("{}/{}:{}", self.registry, self.name, self.tag)
    }

    /// Fully qualified references for each additional tag, in authored order
    pub fn additional_image_names(&self) -> Vec<String> {
        self.additional_tags
            .iter()
            .map(|tag| format!("{}/{}:{}", self.registry, self.name, tag))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manifest() -> Manifest {
        Manifest {
            registry: "ghcr.io".to_string(),
            name: "myorg/cart".to_string(),
            tag: "1.4.2".to_string(),
            additional_tags: vec!["latest".to_string(), "stable".to_string()],
        }
    }

    #[test]
    fn test_image_name() {
        assert_eq!(manifest().image_name(), "ghcr.io/myorg/cart:1.4.2");
    }

    #[test]
    fn test_additional_image_names_preserve_order() {
        assert_eq!(
            manifest().additional_image_names(),
            vec!["ghcr.io/myorg/cart:latest", "ghcr.io/myorg/cart:stable"]
        );
    }

    #[test]
    fn test_load_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let unit = dir.path().join("cart");
        std::fs::create_dir(&unit).unwrap();
        std::fs::write(
            unit.join("manifest.yml"),
            "registry: ghcr.io\nname: myorg/cart\ntag: 1.4.2\nadditionalTags:\n  - latest\n",
        )
        .unwrap();

        let manifest = Manifest::load(dir.path(), "cart").unwrap();
        assert_eq!(manifest.registry, "ghcr.io");
        assert_eq!(manifest.additional_tags, vec!["latest"]);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Manifest::load(dir.path(), "cart").unwrap_err();
        assert!(matches!(err, ManifestError::Unreadable { .. }));
    }

    #[test]
    fn test_load_rejects_empty_tag() {
        let dir = tempfile::tempdir().unwrap();
        let unit = dir.path().join("cart");
        std::fs::create_dir(&unit).unwrap();
        std::fs::write(
            unit.join("manifest.yml"),
            "registry: ghcr.io\nname: myorg/cart\ntag: \"\"\n",
        )
        .unwrap();

        let err = Manifest::load(dir.path(), "cart").unwrap_err();
        assert!(matches!(err, ManifestError::MissingField { ref field, .. } if field == "tag"));
    }

    #[test]
    fn test_load_rejects_invalid_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let unit = dir.path().join("cart");
        std::fs::create_dir(&unit).unwrap();
        std::fs::write(unit.join("manifest.yml"), "registry: [unterminated").unwrap();

        let err = Manifest::load(dir.path(), "cart").unwrap_err();
        assert!(matches!(err, ManifestError::Parse { .. }));
    }
}
