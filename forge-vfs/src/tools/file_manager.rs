//! `file_manager`: rename and delete files or directories.

use serde::Deserialize;

use super::{FILE_MANAGER, ToolDefinition, ToolResult, parse_args};
use crate::error::VfsError;
use crate::vfs::VirtualFileSystem;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum FileManagerCommand {
	Rename { path: String, new_path: String },
	Delete { path: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileManagerCommandKind {
	Rename,
	Delete,
}

impl FileManagerCommandKind {
	pub const ALL: [FileManagerCommandKind; 2] = [Self::Rename, Self::Delete];

	pub fn parse(command: &str) -> Option<Self> {
		Self::ALL.into_iter().find(|k| k.as_str() == command)
	}

	pub fn as_str(&self) -> &'static str {
		match self {
			Self::Rename => "rename",
			Self::Delete => "delete",
		}
	}
}

impl FileManagerCommand {
	pub fn kind(&self) -> FileManagerCommandKind {
		match self {
			Self::Rename { .. } => FileManagerCommandKind::Rename,
			Self::Delete { .. } => FileManagerCommandKind::Delete,
		}
	}

	pub fn execute(&self, vfs: &mut VirtualFileSystem) -> Result<String, VfsError> {
		match self {
			Self::Rename { path, new_path } => {
				vfs.rename(path, new_path)?;
				Ok(format!("Renamed {} to {}", path, new_path))
			}
			Self::Delete { path } => match vfs.delete(path)? {
				1 => Ok(format!("Deleted {}", path)),
				n => Ok(format!("Deleted {} ({} entries)", path, n)),
			},
		}
	}
}

pub fn call(vfs: &mut VirtualFileSystem, args: serde_json::Value) -> ToolResult {
	let result = parse_args::<FileManagerCommand>(args).and_then(|cmd| {
		tracing::debug!(command = cmd.kind().as_str(), "file_manager call");
		cmd.execute(vfs)
	});
	ToolResult::from(result)
}

pub fn definition() -> ToolDefinition {
	let commands: Vec<&str> = FileManagerCommandKind::ALL
		.iter()
		.map(|k| k.as_str())
		.collect();
	ToolDefinition {
		name: FILE_MANAGER.to_string(),
		description: "Rename or delete files and directories. Renaming a directory moves \
			everything inside it; deleting a directory removes its whole subtree. \
			Renaming onto an existing path fails."
			.to_string(),
		input_schema: serde_json::json!({
			"type": "object",
			"properties": {
				"command": { "type": "string", "enum": commands },
				"path": {
					"type": "string",
					"description": "Absolute path of the file or directory"
				},
				"new_path": { "type": "string", "description": "Destination for `rename`" }
			},
			"required": ["command", "path"]
		}),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	fn seeded() -> VirtualFileSystem {
		let mut vfs = VirtualFileSystem::default();
		vfs.create("/components/Card.jsx", "card").unwrap();
		vfs.create("/components/Button.jsx", "btn").unwrap();
		vfs.create("/App.jsx", "app").unwrap();
		vfs
	}

	#[test]
	fn rename_file() {
		let mut vfs = seeded();
		let r = call(
			&mut vfs,
			json!({"command": "rename", "path": "/App.jsx", "new_path": "/Main.jsx"}),
		);
		assert_eq!(r, ToolResult::success("Renamed /App.jsx to /Main.jsx"));
		assert_eq!(vfs.read("/Main.jsx").unwrap(), "app");
	}

	#[test]
	fn rename_conflict_is_error_result() {
		let mut vfs = seeded();
		let r = call(
			&mut vfs,
			json!({"command": "rename", "path": "/App.jsx", "new_path": "/components/Card.jsx"}),
		);
		assert!(r.is_error);
		assert_eq!(r.error_code.as_deref(), Some("VFS_ALREADY_EXISTS"));
	}

	#[test]
	fn rename_requires_new_path() {
		let mut vfs = seeded();
		let r = call(&mut vfs, json!({"command": "rename", "path": "/App.jsx"}));
		assert_eq!(r.error_code.as_deref(), Some("VFS_INVALID_ARGUMENT"));
	}

	#[test]
	fn delete_file_and_directory() {
		let mut vfs = seeded();
		let r = call(&mut vfs, json!({"command": "delete", "path": "/App.jsx"}));
		assert_eq!(r.content, "Deleted /App.jsx");

		let r = call(&mut vfs, json!({"command": "delete", "path": "/components"}));
		assert_eq!(r.content, "Deleted /components (2 entries)");
		assert!(vfs.is_empty());

		let r = call(&mut vfs, json!({"command": "delete", "path": "/components"}));
		assert_eq!(r.error_code.as_deref(), Some("VFS_NOT_FOUND"));
	}
}
