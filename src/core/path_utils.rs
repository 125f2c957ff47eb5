/*
 * Resolves the directories the application reads from and writes to: the
 * per-user local configuration directory holding the autosave slots, and the
 * user's download directory used as the always-available export target.
 */
use directories::{ProjectDirs, UserDirs};
use std::fs;
use std::path::PathBuf;

/*
 * Retrieves the application's local (non-roaming) configuration directory,
 * creating it if necessary. Returns `None` if the platform offers no such
 * location or the directory cannot be created.
 */
pub fn get_base_app_config_local_dir(app_name: &str) -> Option<PathBuf> {
    log::trace!("PathUtils: Attempting to get base app config local dir for '{app_name}'");
    ProjectDirs::from("", "", app_name).and_then(|proj_dirs| {
        let config_path = proj_dirs.config_local_dir();
        if !config_path.exists() {
            if let Err(e) = fs::create_dir_all(config_path) {
                log::error!(
                    "PathUtils: Failed to create base app config directory {config_path:?}: {e}"
                );
                return None;
            }
            log::debug!("PathUtils: Created base app config directory: {config_path:?}");
        }
        Some(config_path.to_path_buf())
    })
}

/*
 * The directory exports are "downloaded" to: the user's download folder when
 * the platform knows one, else the current working directory.
 */
pub fn get_default_download_dir() -> PathBuf {
    UserDirs::new()
        .and_then(|dirs| dirs.download_dir().map(|p| p.to_path_buf()))
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."))
}
