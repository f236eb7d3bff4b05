// ---------------------------------------------------------------------------
// Tool adapters: LLM tool calls in, structured results out
// ---------------------------------------------------------------------------
//
// Each adapter parses the raw JSON arguments of a tool call into its command
// enum, runs it against the VirtualFileSystem and folds any failure into a
// `ToolResult` so the calling model can read the error and retry.  Nothing
// raised by the file system escapes this boundary.
// ---------------------------------------------------------------------------

pub mod display;
pub mod editor;
pub mod file_manager;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::VfsError;
use crate::vfs::VirtualFileSystem;

pub use display::display_message;

pub const STR_REPLACE_EDITOR: &str = "str_replace_editor";
pub const FILE_MANAGER: &str = "file_manager";

// ---------------------------------------------------------------------------
// Result / definition types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolResult {
	pub is_error: bool,
	pub content: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub error_code: Option<String>,
}

impl ToolResult {
	pub fn success(content: impl Into<String>) -> Self {
		Self {
			is_error: false,
			content: content.into(),
			error_code: None,
		}
	}

	pub fn failure(err: &VfsError) -> Self {
		Self {
			is_error: true,
			content: err.to_string(),
			error_code: Some(err.code().to_string()),
		}
	}
}

impl From<Result<String, VfsError>> for ToolResult {
	fn from(result: Result<String, VfsError>) -> Self {
		match result {
			Ok(content) => Self::success(content),
			Err(e) => {
				tracing::warn!(code = e.code(), "tool call rejected: {}", e);
				Self::failure(&e)
			}
		}
	}
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDefinition {
	pub name: String,
	pub description: String,
	pub input_schema: serde_json::Value,
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

/// The tools a model may call against a session's file system.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
	StrReplaceEditor,
	FileManager,
}

impl Tool {
	pub const ALL: [Tool; 2] = [Tool::StrReplaceEditor, Tool::FileManager];

	pub fn from_name(name: &str) -> Option<Self> {
		match name {
			STR_REPLACE_EDITOR => Some(Self::StrReplaceEditor),
			FILE_MANAGER => Some(Self::FileManager),
			_ => None,
		}
	}

	pub fn name(&self) -> &'static str {
		match self {
			Self::StrReplaceEditor => STR_REPLACE_EDITOR,
			Self::FileManager => FILE_MANAGER,
		}
	}

	pub fn definition(&self) -> ToolDefinition {
		match self {
			Self::StrReplaceEditor => editor::definition(),
			Self::FileManager => file_manager::definition(),
		}
	}

	pub fn call(&self, vfs: &mut VirtualFileSystem, args: serde_json::Value) -> ToolResult {
		match self {
			Self::StrReplaceEditor => editor::call(vfs, args),
			Self::FileManager => file_manager::call(vfs, args),
		}
	}
}

pub fn definitions() -> Vec<ToolDefinition> {
	Tool::ALL.iter().map(Tool::definition).collect()
}

/// Run a tool call by name.  Unknown tools produce an error result.
pub fn call_tool(vfs: &mut VirtualFileSystem, name: &str, args: serde_json::Value) -> ToolResult {
	match Tool::from_name(name) {
		Some(tool) => tool.call(vfs, args),
		None => ToolResult::from(Err(VfsError::InvalidArgument(format!(
			"Unknown tool: {}",
			name
		)))),
	}
}

fn parse_args<T: DeserializeOwned>(args: serde_json::Value) -> Result<T, VfsError> {
	serde_json::from_value(args)
		.map_err(|e| VfsError::InvalidArgument(format!("Invalid tool arguments: {}", e)))
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	#[test]
	fn unknown_tool_is_an_error_result() {
		let mut vfs = VirtualFileSystem::default();
		let result = call_tool(&mut vfs, "bash", json!({}));
		assert!(result.is_error);
		assert_eq!(result.error_code.as_deref(), Some("VFS_INVALID_ARGUMENT"));
	}

	#[test]
	fn definitions_cover_both_tools() {
		let names: Vec<String> = definitions().into_iter().map(|d| d.name).collect();
		assert_eq!(names, vec!["str_replace_editor", "file_manager"]);
	}

	#[test]
	fn tool_result_serializes_camel_case() {
		let ok = serde_json::to_value(ToolResult::success("done")).unwrap();
		assert_eq!(ok, json!({ "isError": false, "content": "done" }));

		let err = ToolResult::failure(&VfsError::NoHistory("/a.js".into()));
		let v = serde_json::to_value(err).unwrap();
		assert_eq!(v["isError"], true);
		assert_eq!(v["errorCode"], "VFS_NO_HISTORY");
	}
}
