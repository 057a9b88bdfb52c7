//! Finding `shortcuts.vdf` under the usual Steam install roots.
//!
//! Callers pass in the home directory and `ProgramFiles(x86)` so nothing here reads the environment.

use crate::statics;
use std::path::{Path, PathBuf};
use tracing::debug;

/// `userdata` roots in probe order: Linux, alternate Linux, Windows, macOS.
pub fn userdata_roots(home: &Path, program_files_x86: Option<&Path>) -> Vec<PathBuf> {
    let program_files = program_files_x86
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(statics::STEAM_DEFAULT_PROGRAM_FILES_X86));

    vec![
        home.join(".steam").join("steam").join(statics::STEAM_USERDATA),
        home.join(".local")
            .join("share")
            .join("Steam")
            .join(statics::STEAM_USERDATA),
        program_files.join("Steam").join(statics::STEAM_USERDATA),
        home.join("Library")
            .join("Application Support")
            .join("Steam")
            .join(statics::STEAM_USERDATA),
    ]
}

/// Every `<root>/<user>/config/shortcuts.vdf` that exists, roots in probe order.
pub fn find_all_shortcuts_files(home: &Path, program_files_x86: Option<&Path>) -> Vec<PathBuf> {
    let mut found = Vec::new();
    for root in userdata_roots(home, program_files_x86) {
        let Ok(users) = std::fs::read_dir(&root) else {
            continue;
        };
        let mut user_dirs: Vec<PathBuf> = users
            .filter_map(Result::ok)
            .map(|e| e.path())
            .filter(|p| p.is_dir())
            .collect();
        // read_dir order is unspecified
        user_dirs.sort();

        for user_dir in user_dirs {
            let candidate = user_dir
                .join(statics::STEAM_CONFIG_DIR)
                .join(statics::STEAM_SHORTCUTS_FILE);
            if candidate.is_file() {
                debug!(path = %candidate.display(), "found shortcuts file");
                found.push(candidate);
            }
        }
    }
    found
}

pub fn find_shortcuts_file(home: &Path, program_files_x86: Option<&Path>) -> Option<PathBuf> {
    find_all_shortcuts_files(home, program_files_x86)
        .into_iter()
        .next()
}
