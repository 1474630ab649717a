use crate::config::SweepConfig;
use std::fs;
use std::path::PathBuf;
use tracing::{debug, info, warn};

const INSTALL_DIR_NAME: &str = "Microsoft SQL Server";

/// The well-known install roots, resolved against the environment unless the
/// configuration pins an explicit list. An unset variable (ProgramFiles(x86)
/// on 32-bit hosts) just drops that candidate.
pub fn residual_dirs(cfg: &SweepConfig) -> Vec<PathBuf> {
    if let Some(dirs) = &cfg.cleanup.residual_dirs {
        return dirs.clone();
    }
    ["ProgramFiles", "ProgramFiles(x86)", "ProgramData"]
        .into_iter()
        .filter_map(|var| match std::env::var_os(var) {
            Some(root) => Some(PathBuf::from(root).join(INSTALL_DIR_NAME)),
            None => {
                debug!(var, "environment variable not set, skipping candidate");
                None
            }
        })
        .collect()
}

/// Deletes each residual directory that still exists. Returns how many were
/// removed; a locked file inside one tree is a warning, and the remaining
/// candidates are still attempted.
pub fn remove_residual_dirs(cfg: &SweepConfig) -> usize {
    let mut removed = 0usize;
    for dir in residual_dirs(cfg) {
        if !dir.exists() {
            debug!(path = %dir.display(), "no residual directory");
            continue;
        }
        info!(path = %dir.display(), "removing residual directory");
        match fs::remove_dir_all(&dir) {
            Ok(()) => removed += 1,
            Err(e) => {
                warn!(path = %dir.display(), error = %e, "could not remove residual directory");
            }
        }
    }
    removed
}
