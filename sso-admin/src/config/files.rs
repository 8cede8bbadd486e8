use serde::Deserialize;
use std::path::PathBuf;

/// Where uploaded avatars and logos are written
#[derive(Debug, Deserialize, Clone)]
pub struct FilesConfig {
    /// Directory served as web root (default: "wwwroot")
    #[serde(default = "default_root")]
    pub root: String,

    /// Sub folder of the web root receiving uploads (default: "multi-media")
    #[serde(default = "default_folder")]
    pub folder: String,
}

fn default_root() -> String {
    "wwwroot".to_string()
}

fn default_folder() -> String {
    "multi-media".to_string()
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            folder: default_folder(),
        }
    }
}

impl FilesConfig {
    /// Directory uploads are written to
    pub fn upload_dir(&self) -> PathBuf {
        PathBuf::from(&self.root).join(&self.folder)
    }
}
