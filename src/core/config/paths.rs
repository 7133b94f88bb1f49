use std::env;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = "felix.yml";

#[derive(Debug, Clone)]
pub struct AppPaths {
    pub project_root: PathBuf,
    pub config_path: PathBuf,
}

impl AppPaths {
    pub fn new() -> Self {
        let project_root = discover_project_root();
        let config_path = discover_config_path(&project_root);
        AppPaths {
            project_root,
            config_path,
        }
    }

    /// Anchor a configured path at the project root unless it is already absolute.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.project_root.join(path)
        }
    }
}

impl Default for AppPaths {
    fn default() -> Self {
        Self::new()
    }
}

fn discover_project_root() -> PathBuf {
    if let Ok(root) = env::var("FELIX_ROOT") {
        return PathBuf::from(root);
    }
    env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

fn discover_config_path(project_root: &Path) -> PathBuf {
    if let Ok(path) = env::var("FELIX_CONFIG") {
        return PathBuf::from(path);
    }
    project_root.join(CONFIG_FILE_NAME)
}
