use directories::ProjectDirs;
use std::path::PathBuf;

const APP_NAME: &str = "keysprint";

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    fn project() -> Option<ProjectDirs> {
        ProjectDirs::from("", "", APP_NAME)
    }

    pub fn config_path() -> PathBuf {
        Self::project()
            .map(|pd| pd.config_dir().join("config.json"))
            .unwrap_or_else(|| PathBuf::from("keysprint_config.json"))
    }

    /// User aggregates live next to the other state files, falling back to
    /// the working directory when no home is known.
    pub fn users_path() -> PathBuf {
        Self::project()
            .map(|pd| pd.data_local_dir().join("users.json"))
            .unwrap_or_else(|| PathBuf::from("users.json"))
    }

    pub fn log_path() -> PathBuf {
        Self::project()
            .map(|pd| pd.data_local_dir().join("keysprint.log"))
            .unwrap_or_else(|| PathBuf::from("keysprint.log"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_have_expected_file_names() {
        assert!(AppDirs::config_path().ends_with("config.json"));
        assert!(AppDirs::users_path().ends_with("users.json"));
        assert!(AppDirs::log_path().ends_with("keysprint.log"));
    }
}
