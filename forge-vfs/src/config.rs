use clap::Parser;

use crate::path::VfsLimits;

#[derive(Parser, Debug)]
#[command(
    name = "forge-vfs",
    about = "In-memory virtual file system with LLM editing tools over JSON-RPC"
)]
pub struct CliArgs {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "FORGE_VFS_LOG_LEVEL")]
    pub log_level: String,

    /// Maximum size of a single file, in bytes
    #[arg(long, env = "FORGE_VFS_MAX_FILE_SIZE")]
    pub max_file_size: Option<u64>,

    /// Maximum number of stored nodes
    #[arg(long, env = "FORGE_VFS_MAX_NODE_COUNT")]
    pub max_node_count: Option<usize>,

    /// Maximum number of path segments
    #[arg(long, env = "FORGE_VFS_MAX_PATH_DEPTH")]
    pub max_path_depth: Option<usize>,

    /// Maximum length of one path segment
    #[arg(long, env = "FORGE_VFS_MAX_NAME_LENGTH")]
    pub max_name_length: Option<usize>,

    /// Maximum length of a full path
    #[arg(long, env = "FORGE_VFS_MAX_PATH_LENGTH")]
    pub max_path_length: Option<usize>,
}

impl CliArgs {
    /// Limits for new sessions: defaults, overridden by any flag given.
    pub fn limits(&self) -> VfsLimits {
        let defaults = VfsLimits::default();
        VfsLimits {
            max_file_size: self.max_file_size.unwrap_or(defaults.max_file_size),
            max_node_count: self.max_node_count.unwrap_or(defaults.max_node_count),
            max_path_depth: self.max_path_depth.unwrap_or(defaults.max_path_depth),
            max_name_length: self.max_name_length.unwrap_or(defaults.max_name_length),
            max_path_length: self.max_path_length.unwrap_or(defaults.max_path_length),
        }
    }
}
