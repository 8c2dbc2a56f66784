/*
 * Path helpers shared by the options layer, the match engine and the progress observer:
 * locating (and creating) the application's local configuration directory, and expressing a
 * visited location relative to the search root.
 */
use directories::ProjectDirs;
use std::fs;
use std::path::{Path, PathBuf};

/*
 * Retrieves the application's primary local configuration directory, creating it if it does
 * not exist yet. The path is derived without an organization qualifier, so it lands directly
 * under the user's local application data directory (e.g. `~/.config/<app>` on Linux).
 *
 * Returns `None` if `ProjectDirs` cannot identify a suitable location or the directory cannot
 * be created.
 */
pub fn get_base_app_config_local_dir(app_name: &str) -> Option<PathBuf> {
    log::trace!("PathUtils: Resolving local config dir for '{app_name}'");
    ProjectDirs::from("", "", app_name).and_then(|proj_dirs| {
        let config_path = proj_dirs.config_local_dir();
        if !config_path.exists() {
            if let Err(e) = fs::create_dir_all(config_path) {
                log::error!("PathUtils: Failed to create config directory {config_path:?}: {e}");
                return None;
            }
            log::debug!("PathUtils: Created config directory {config_path:?}");
        }
        Some(config_path.to_path_buf())
    })
}

/*
 * Expresses `path` relative to `root`. Returns an empty string when both are the same location
 * and `None` when `path` is not below `root`.
 */
pub fn relative_to(path: &Path, root: &Path) -> Option<String> {
    path.strip_prefix(root)
        .ok()
        .map(|relative| relative.to_string_lossy().into_owned())
}

/*
 * The absolute form of a local search root, resolved against the current directory without
 * touching the filesystem. Falls back to `root` as given when it cannot be resolved.
 */
pub fn absolute_root(root: &str) -> String {
    match std::path::absolute(root) {
        Ok(path) => path.to_string_lossy().into_owned(),
        Err(e) => {
            log::warn!("PathUtils: Could not make {root:?} absolute: {e}");
            root.to_string()
        }
    }
}

/*
 * Joins a remote directory and an entry name with `/`, the separator of every line-listing
 * transport we talk to, independent of the local platform.
 */
pub fn join_remote(directory: &str, name: &str) -> String {
    if directory.ends_with('/') {
        format!("{directory}{name}")
    } else {
        format!("{directory}/{name}")
    }
}

/*
 * The directory a remote session returns to after a search: the path part of the root's
 * display form (`host/dir` -> `/dir`), or `/` when the root names only a host.
 */
pub fn remote_reset_path(root: &str) -> &str {
    match root.find('/') {
        Some(index) => &root[index..],
        None => "/",
    }
}
