//! Path utilities for tfbridge data directories and config files.
//!
//! - Data root resolution (`TFBRIDGE_DATA_DIR` or the system data directory)
//! - Settings file load/save
//! - Workspace registry file loading
//!
//! No interactive I/O; adapters decide what to do with missing files.

mod error;
mod files;

pub use error::PathError;
pub use files::{
    data_root, env_file_path, load_settings, load_workspaces, save_settings, save_workspaces,
    settings_path, workspaces_path,
};
