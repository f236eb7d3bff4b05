use serde::Deserialize;

use crate::path::VfsLimits;
use crate::vfs::SerializedTree;

// ── JSON-RPC 2.0 error codes ────────────────────────────────────────────────

pub const PARSE_ERROR: i32 = -32700;
pub const METHOD_NOT_FOUND: i32 = -32601;
pub const INVALID_PARAMS: i32 = -32602;
pub const VFS_ERROR: i32 = -32000;

// ── Notifications ───────────────────────────────────────────────────────────

pub const VFS_CHANGED: &str = "vfs/changed";

// ── Incoming request ────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct JsonRpcRequest {
    pub id: u64,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

// ── Params ──────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeParams {
    pub limits: Option<LimitsParams>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LimitsParams {
    pub max_file_size: Option<u64>,
    pub max_node_count: Option<usize>,
    pub max_path_depth: Option<usize>,
    pub max_name_length: Option<usize>,
    pub max_path_length: Option<usize>,
}

impl LimitsParams {
    /// Overlay the provided fields on `base`.
    pub fn apply(&self, base: &VfsLimits) -> VfsLimits {
        VfsLimits {
            max_file_size: self.max_file_size.unwrap_or(base.max_file_size),
            max_node_count: self.max_node_count.unwrap_or(base.max_node_count),
            max_path_depth: self.max_path_depth.unwrap_or(base.max_path_depth),
            max_name_length: self.max_name_length.unwrap_or(base.max_name_length),
            max_path_length: self.max_path_length.unwrap_or(base.max_path_length),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadSessionParams {
    #[serde(default)]
    pub files: SerializedTree,
    pub project_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolCallParams {
    pub name: String,
    #[serde(default)]
    pub arguments: serde_json::Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinishSessionParams {
    pub user_id: Option<String>,
    #[serde(default)]
    pub messages: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectLoadParams {
    pub user_id: String,
    pub project_id: String,
}
