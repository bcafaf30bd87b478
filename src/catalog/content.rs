//! Content loader: reads the category manifest and topic module files.
//!
//! ```text
//! {content_dir}/
//! ├── catalog.toml          ordered [[category]] entries
//! └── *.json                one JSON array of topics per module
//! ```
//!
//! Any unreadable or malformed file aborts loading with
//! [`AppError::Content`] naming the file.

use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::{debug, info};

use super::{aggregate, CatalogIndex, Category, Topic};
use crate::error::AppError;

pub const MANIFEST_FILENAME: &str = "catalog.toml";

/// On-disk shape of `catalog.toml`.
#[derive(Debug, Deserialize)]
struct Manifest {
    #[serde(default, rename = "category")]
    categories: Vec<ManifestCategory>,
}

#[derive(Debug, Deserialize)]
struct ManifestCategory {
    name: String,
    /// Module file names relative to the content dir, in display order.
    modules: Vec<String>,
}

/// Load every category listed in `{content_dir}/catalog.toml`, in manifest order.
pub fn load_categories(content_dir: &Path) -> Result<Vec<Category>, AppError> {
    let manifest_path = content_dir.join(MANIFEST_FILENAME);
    let raw = fs::read_to_string(&manifest_path)
        .map_err(|e| AppError::Content(format!("cannot read {}: {e}", manifest_path.display())))?;
    let manifest: Manifest = toml::from_str(&raw)
        .map_err(|e| AppError::Content(format!("parse error in {}: {e}", manifest_path.display())))?;

    manifest
        .categories
        .into_iter()
        .map(|entry| -> Result<Category, AppError> {
            let modules = entry
                .modules
                .iter()
                .map(|file| load_module(&content_dir.join(file)))
                .collect::<Result<Vec<_>, _>>()?;
            let category = Category::from_modules(entry.name, modules);
            debug!(category = %category.name, topics = category.topics.len(), "category loaded");
            Ok(category)
        })
        .collect()
}

/// Parse one module file: a JSON array of topics.
pub fn load_module(path: &Path) -> Result<Vec<Topic>, AppError> {
    let data = fs::read_to_string(path)
        .map_err(|e| AppError::Content(format!("cannot read {}: {e}", path.display())))?;
    serde_json::from_str(&data)
        .map_err(|e| AppError::Content(format!("malformed {}: {e}", path.display())))
}

/// Load categories and build the index in one step.
///
/// Returns the categories too, so callers can browse by category while
/// querying through the index.
pub fn load_catalog(content_dir: &Path) -> Result<(Vec<Category>, CatalogIndex), AppError> {
    let categories = load_categories(content_dir)?;
    let index = CatalogIndex::build(aggregate(&categories))?;
    info!(
        categories = categories.len(),
        topics = index.len(),
        content_dir = %content_dir.display(),
        "catalog ready"
    );
    Ok((categories, index))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const MANIFEST: &str = r#"
[[category]]
name = "Basics"
modules = ["vars.json", "functions.json"]

[[category]]
name = "Async"
modules = ["async.json"]
"#;

    fn topic_json(id: &str, difficulty: &str) -> String {
        format!(r#"{{"id":"{id}","title":"{id}","difficulty":"{difficulty}","description":"","tags":["t"]}}"#)
    }

    fn write_content(dir: &Path, async_module: &str) {
        fs::write(dir.join(MANIFEST_FILENAME), MANIFEST).unwrap();
        fs::write(dir.join("vars.json"), format!("[{}]", topic_json("vars", "beginner"))).unwrap();
        fs::write(
            dir.join("functions.json"),
            format!("[{},{}]", topic_json("functions", "beginner"), topic_json("closures", "intermediate")),
        )
        .unwrap();
        fs::write(dir.join("async.json"), async_module).unwrap();
    }

    #[test]
    fn loads_categories_in_manifest_order() {
        let dir = TempDir::new().unwrap();
        write_content(dir.path(), &format!("[{}]", topic_json("promises", "intermediate")));

        let cats = load_categories(dir.path()).unwrap();
        assert_eq!(cats.len(), 2);
        assert_eq!(cats[0].name, "Basics");
        let ids: Vec<_> = cats[0].topics.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, ["vars", "functions", "closures"]);
        assert_eq!(cats[1].topics[0].id, "promises");
    }

    #[test]
    fn load_catalog_builds_index() {
        let dir = TempDir::new().unwrap();
        write_content(dir.path(), "[]");
        let (cats, index) = load_catalog(dir.path()).unwrap();
        assert_eq!(cats.len(), 2);
        assert_eq!(index.all_ids(), ["vars", "functions", "closures"]);
    }

    #[test]
    fn duplicate_across_modules_is_content_error() {
        let dir = TempDir::new().unwrap();
        write_content(dir.path(), &format!("[{}]", topic_json("vars", "advanced")));
        let err = load_catalog(dir.path()).unwrap_err();
        assert!(matches!(err, AppError::Content(_)));
        assert!(err.to_string().contains("vars"));
    }

    #[test]
    fn malformed_module_names_file() {
        let dir = TempDir::new().unwrap();
        write_content(dir.path(), &format!("[{}]", topic_json("promises", "expert")));
        let msg = load_categories(dir.path()).unwrap_err().to_string();
        assert!(msg.contains("async.json"));
    }

    #[test]
    fn missing_module_errors() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(MANIFEST_FILENAME), MANIFEST).unwrap();
        let msg = load_categories(dir.path()).unwrap_err().to_string();
        assert!(msg.contains("vars.json"));
    }

    #[test]
    fn missing_manifest_errors() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(load_categories(dir.path()), Err(AppError::Content(_))));
    }
}
