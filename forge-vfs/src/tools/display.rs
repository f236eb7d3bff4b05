//! Short human-readable labels for tool calls, shown while they run.

use super::Tool;
use super::editor::EditorCommandKind;
use super::file_manager::FileManagerCommandKind;

/// Label a tool call from its name and (possibly partial) arguments.
///
/// Uses the command's verb and the target path when present, a generic
/// phrase when the path is missing, and the bare tool name when the tool or
/// command is not recognized.
pub fn display_message(tool_name: &str, args: &serde_json::Value) -> String {
	let command = args.get("command").and_then(|v| v.as_str());
	let path = non_empty(args, "path");

	let message = match (Tool::from_name(tool_name), command) {
		(Some(Tool::StrReplaceEditor), Some(command)) => {
			EditorCommandKind::parse(command).map(|kind| editor_message(kind, path))
		}
		(Some(Tool::FileManager), Some(command)) => FileManagerCommandKind::parse(command)
			.map(|kind| file_manager_message(kind, path, non_empty(args, "new_path"))),
		_ => None,
	};

	message.unwrap_or_else(|| tool_name.to_string())
}

fn non_empty<'a>(args: &'a serde_json::Value, key: &str) -> Option<&'a str> {
	args.get(key)
		.and_then(|v| v.as_str())
		.filter(|s| !s.is_empty())
}

fn editor_message(kind: EditorCommandKind, path: Option<&str>) -> String {
	let (verb, fallback) = match kind {
		EditorCommandKind::Create => ("Creating", "Creating file"),
		EditorCommandKind::StrReplace | EditorCommandKind::Insert => ("Editing", "Editing file"),
		EditorCommandKind::View => ("Viewing", "Viewing file"),
		EditorCommandKind::UndoEdit => ("Undoing edit to", "Undoing edit"),
	};
	match path {
		Some(path) => format!("{} {}", verb, path),
		None => fallback.to_string(),
	}
}

fn file_manager_message(
	kind: FileManagerCommandKind,
	path: Option<&str>,
	new_path: Option<&str>,
) -> String {
	match (kind, path, new_path) {
		(FileManagerCommandKind::Rename, Some(path), Some(new_path)) => {
			format!("Renaming {} to {}", path, new_path)
		}
		(FileManagerCommandKind::Rename, Some(path), None) => format!("Renaming {}", path),
		(FileManagerCommandKind::Rename, None, _) => "Renaming file".to_string(),
		(FileManagerCommandKind::Delete, Some(path), _) => format!("Deleting {}", path),
		(FileManagerCommandKind::Delete, None, _) => "Deleting file".to_string(),
	}
}
