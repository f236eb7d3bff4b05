//! `str_replace_editor`: create, view, replace, insert and undo on files.

use serde::Deserialize;

use super::{STR_REPLACE_EDITOR, ToolDefinition, ToolResult, parse_args};
use crate::error::VfsError;
use crate::vfs::{CreateOutcome, VirtualFileSystem};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum EditorCommand {
	Create {
		path: String,
		#[serde(default)]
		file_text: String,
	},
	View {
		path: String,
		#[serde(default)]
		view_range: Option<[i64; 2]>,
	},
	StrReplace {
		path: String,
		old_str: String,
		#[serde(default)]
		new_str: String,
	},
	Insert {
		path: String,
		insert_line: i64,
		new_str: String,
	},
	UndoEdit {
		path: String,
	},
}

/// Command names without their arguments, for display and schemas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorCommandKind {
	Create,
	View,
	StrReplace,
	Insert,
	UndoEdit,
}

impl EditorCommandKind {
	pub const ALL: [EditorCommandKind; 5] = [
		Self::View,
		Self::Create,
		Self::StrReplace,
		Self::Insert,
		Self::UndoEdit,
	];

	pub fn parse(command: &str) -> Option<Self> {
		Self::ALL.into_iter().find(|k| k.as_str() == command)
	}

	pub fn as_str(&self) -> &'static str {
		match self {
			Self::Create => "create",
			Self::View => "view",
			Self::StrReplace => "str_replace",
			Self::Insert => "insert",
			Self::UndoEdit => "undo_edit",
		}
	}
}

impl EditorCommand {
	pub fn kind(&self) -> EditorCommandKind {
		match self {
			Self::Create { .. } => EditorCommandKind::Create,
			Self::View { .. } => EditorCommandKind::View,
			Self::StrReplace { .. } => EditorCommandKind::StrReplace,
			Self::Insert { .. } => EditorCommandKind::Insert,
			Self::UndoEdit { .. } => EditorCommandKind::UndoEdit,
		}
	}

	pub fn execute(&self, vfs: &mut VirtualFileSystem) -> Result<String, VfsError> {
		match self {
			Self::Create { path, file_text } => match vfs.create(path, file_text)? {
				CreateOutcome::Created => Ok(format!("File created: {}", path)),
				CreateOutcome::Overwritten => Ok(format!("File overwritten: {}", path)),
			},
			Self::View { path, view_range } => {
				let range = view_range.map(|[start, end]| (start, end));
				Ok(vfs.view(path, range)?.render())
			}
			Self::StrReplace {
				path,
				old_str,
				new_str,
			} => {
				vfs.str_replace(path, old_str, new_str)?;
				Ok(format!("The file {} has been edited.", path))
			}
			Self::Insert {
				path,
				insert_line,
				new_str,
			} => {
				let line = usize::try_from(*insert_line).map_err(|_| {
					VfsError::InvalidLine(format!(
						"insert_line must be 0 or greater, got {}",
						insert_line
					))
				})?;
				vfs.insert(path, line, new_str)?;
				Ok(format!("Text inserted after line {} of {}", line, path))
			}
			Self::UndoEdit { path } => {
				vfs.undo_edit(path)?;
				Ok(format!("Last edit to {} undone.", path))
			}
		}
	}
}

pub fn call(vfs: &mut VirtualFileSystem, args: serde_json::Value) -> ToolResult {
	let result = parse_args::<EditorCommand>(args).and_then(|cmd| {
		tracing::debug!(command = cmd.kind().as_str(), "str_replace_editor call");
		cmd.execute(vfs)
	});
	ToolResult::from(result)
}

pub fn definition() -> ToolDefinition {
	let commands: Vec<&str> = EditorCommandKind::ALL.iter().map(|k| k.as_str()).collect();
	ToolDefinition {
		name: STR_REPLACE_EDITOR.to_string(),
		description: "View, create and edit text files in the project's virtual file system. \
			`create` writes a whole file (overwriting is undoable), `str_replace` replaces one \
			exact, unique occurrence of `old_str`, `insert` adds `new_str` after line \
			`insert_line` (0 = top), `view` shows a file or lists a directory, and \
			`undo_edit` reverts the most recent edit of a file."
			.to_string(),
		input_schema: serde_json::json!({
			"type": "object",
			"properties": {
				"command": { "type": "string", "enum": commands },
				"path": { "type": "string", "description": "Absolute path, e.g. /App.jsx" },
				"file_text": { "type": "string", "description": "Content for `create`" },
				"old_str": { "type": "string", "description": "Exact text to replace" },
				"new_str": { "type": "string", "description": "Replacement or inserted text" },
				"insert_line": { "type": "integer", "minimum": 0 },
				"view_range": {
					"type": "array",
					"items": { "type": "integer" },
					"minItems": 2,
					"maxItems": 2,
					"description": "1-based inclusive [start, end]; end -1 means end of file"
				}
			},
			"required": ["command", "path"]
		}),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	fn run(vfs: &mut VirtualFileSystem, args: serde_json::Value) -> ToolResult {
		call(vfs, args)
	}

	#[test]
	fn parses_commands() {
		let cmd: EditorCommand = serde_json::from_value(json!({
			"command": "insert", "path": "/a.js", "insert_line": 3, "new_str": "x"
		}))
		.unwrap();
		assert_eq!(cmd.kind(), EditorCommandKind::Insert);

		let cmd: EditorCommand = serde_json::from_value(json!({
			"command": "view", "path": "/a.js", "view_range": [1, -1]
		}))
		.unwrap();
		assert_eq!(
			cmd,
			EditorCommand::View {
				path: "/a.js".into(),
				view_range: Some([1, -1])
			}
		);
	}

	#[test]
	fn kind_parse_round_trips_names() {
		for kind in EditorCommandKind::ALL {
			assert_eq!(EditorCommandKind::parse(kind.as_str()), Some(kind));
		}
		assert_eq!(EditorCommandKind::parse("delete"), None);
	}

	#[test]
	fn create_view_replace_undo() {
		let mut vfs = VirtualFileSystem::default();
		let r = run(&mut vfs, json!({"command": "create", "path": "/App.jsx", "file_text": "A"}));
		assert_eq!(r, ToolResult::success("File created: /App.jsx"));

		let r = run(
			&mut vfs,
			json!({"command": "str_replace", "path": "/App.jsx", "old_str": "A", "new_str": "B"}),
		);
		assert!(!r.is_error);

		let r = run(&mut vfs, json!({"command": "undo_edit", "path": "/App.jsx"}));
		assert_eq!(r.content, "Last edit to /App.jsx undone.");

		let r = run(&mut vfs, json!({"command": "view", "path": "/App.jsx"}));
		assert_eq!(r, ToolResult::success("A"));
	}

	#[test]
	fn failures_become_error_results() {
		let mut vfs = VirtualFileSystem::default();
		run(&mut vfs, json!({"command": "create", "path": "/a.js", "file_text": "x x"}));

		let r = run(
			&mut vfs,
			json!({"command": "str_replace", "path": "/a.js", "old_str": "x", "new_str": "y"}),
		);
		assert!(r.is_error);
		assert_eq!(r.error_code.as_deref(), Some("VFS_AMBIGUOUS_MATCH"));

		let r = run(&mut vfs, json!({"command": "view", "path": "/missing.js"}));
		assert_eq!(r.error_code.as_deref(), Some("VFS_NOT_FOUND"));

		let r = run(
			&mut vfs,
			json!({"command": "insert", "path": "/a.js", "insert_line": -1, "new_str": "z"}),
		);
		assert_eq!(r.error_code.as_deref(), Some("VFS_INVALID_LINE"));
	}

	#[test]
	fn malformed_arguments_are_reported() {
		let mut vfs = VirtualFileSystem::default();
		let r = run(&mut vfs, json!({"command": "explode", "path": "/a.js"}));
		assert!(r.is_error);
		assert_eq!(r.error_code.as_deref(), Some("VFS_INVALID_ARGUMENT"));

		let r = run(&mut vfs, json!({"command": "str_replace", "path": "/a.js"}));
		assert_eq!(r.error_code.as_deref(), Some("VFS_INVALID_ARGUMENT"));

		let r = run(&mut vfs, json!({}));
		assert!(r.is_error);
	}

	#[test]
	fn view_with_range_and_directory() {
		let mut vfs = VirtualFileSystem::default();
		run(
			&mut vfs,
			json!({"command": "create", "path": "/src/a.js", "file_text": "1\n2\n3"}),
		);
		let r = run(
			&mut vfs,
			json!({"command": "view", "path": "/src/a.js", "view_range": [2, 3]}),
		);
		assert_eq!(r.content, "2\n3");

		let r = run(&mut vfs, json!({"command": "view", "path": "/"}));
		assert_eq!(r.content, "src/");
	}

	#[test]
	fn overwrite_is_reported() {
		let mut vfs = VirtualFileSystem::default();
		run(&mut vfs, json!({"command": "create", "path": "/a.js", "file_text": "1"}));
		let r = run(&mut vfs, json!({"command": "create", "path": "/a.js", "file_text": "2"}));
		assert_eq!(r.content, "File overwritten: /a.js");
	}
}
