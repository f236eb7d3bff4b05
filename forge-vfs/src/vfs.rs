// ---------------------------------------------------------------------------
// VirtualFileSystem: session-scoped in-memory file tree with per-file undo
// ---------------------------------------------------------------------------

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::VfsError;
use crate::history::EditHistory;
use crate::path::{VFS_ROOT, ancestor_paths, rebase, resolve_path, validate_path, VfsLimits};
use crate::store::{DirEntry, FileNode, NodeStore, NodeType, format_listing};

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// Flat storage record for one node: `{ "type": "file", "content": "..." }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializedNode {
	#[serde(rename = "type")]
	pub node_type: NodeType,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub content: Option<String>,
}

impl SerializedNode {
	pub fn file(content: impl Into<String>) -> Self {
		Self {
			node_type: NodeType::File,
			content: Some(content.into()),
		}
	}

	pub fn directory() -> Self {
		Self {
			node_type: NodeType::Directory,
			content: None,
		}
	}
}

/// Path -> record, in listing order.
pub type SerializedTree = IndexMap<String, SerializedNode>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewOutput {
	File(String),
	Directory(Vec<DirEntry>),
}

impl ViewOutput {
	pub fn render(&self) -> String {
		match self {
			Self::File(text) => text.clone(),
			Self::Directory(entries) => format_listing(entries),
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateOutcome {
	Created,
	Overwritten,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum VfsEvent {
	Created { path: String },
	Updated { path: String },
	Restored { path: String },
	#[serde(rename_all = "camelCase")]
	Renamed { old_path: String, new_path: String },
	Deleted { path: String, removed: usize },
	#[serde(rename_all = "camelCase")]
	Loaded { node_count: usize },
}

// ---------------------------------------------------------------------------
// Line helpers
// ---------------------------------------------------------------------------

/// Lines of a text, split on `\n`.  Empty content has no lines.
fn split_lines(text: &str) -> Vec<&str> {
	if text.is_empty() {
		Vec::new()
	} else {
		text.split('\n').collect()
	}
}

/// Byte offsets where `needle` starts in `text`, overlapping matches
/// included.  Stops after `limit` hits.
fn match_starts(text: &str, needle: &str, limit: usize) -> Vec<usize> {
	let mut starts = Vec::new();
	let mut from = 0;
	while starts.len() < limit {
		let Some(offset) = text[from..].find(needle) else {
			break;
		};
		let start = from + offset;
		starts.push(start);
		// Resume one character past this start so overlaps are seen.
		from = start + text[start..].chars().next().map_or(1, char::len_utf8);
	}
	starts
}

/// Slice a 1-based inclusive line range, clamped to the text.  A negative
/// `end` means end of file.
fn slice_lines(text: &str, start: i64, end: i64) -> String {
	let lines = split_lines(text);
	let total = lines.len() as i64;
	let first = start.max(1);
	let last = if end < 0 { total } else { end.min(total) };
	if first > last {
		return String::new();
	}
	lines[(first - 1) as usize..last as usize].join("\n")
}

// ---------------------------------------------------------------------------
// VirtualFileSystem
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct VirtualFileSystem {
	store: NodeStore,
	history: EditHistory,
	limits: VfsLimits,
	pending_events: Vec<VfsEvent>,
}

impl VirtualFileSystem {
	// -- Constructor ------------------------------------------------------

	pub fn new(limits: VfsLimits) -> Self {
		Self {
			store: NodeStore::new(),
			history: EditHistory::new(),
			limits,
			pending_events: Vec::new(),
		}
	}

	pub fn limits(&self) -> &VfsLimits {
		&self.limits
	}

	// -- Helpers (private) ------------------------------------------------

	fn assert_valid_path(&self, path: &str) -> Result<String, VfsError> {
		resolve_path(path, &self.limits)
	}

	fn assert_file<'a>(&'a self, path: &str) -> Result<&'a FileNode, VfsError> {
		match self.store.get(path) {
			Some(node) if node.is_file() => Ok(node),
			Some(_) => Err(VfsError::NotAFile(format!("Not a file: {}", path))),
			None if self.store.is_directory(path) => {
				Err(VfsError::NotAFile(format!("Not a file: {}", path)))
			}
			None => Err(VfsError::NotFound(format!("File not found: {}", path))),
		}
	}

	fn assert_file_size(&self, size: usize, path: &str) -> Result<(), VfsError> {
		if size as u64 > self.limits.max_file_size {
			return Err(VfsError::LimitExceeded(format!(
				"File size {} exceeds limit ({}): {}",
				size, self.limits.max_file_size, path
			)));
		}
		Ok(())
	}

	fn assert_node_limit(&self) -> Result<(), VfsError> {
		if self.store.len() >= self.limits.max_node_count {
			return Err(VfsError::LimitExceeded(format!(
				"Maximum node count exceeded ({})",
				self.limits.max_node_count
			)));
		}
		Ok(())
	}

	/// Every ancestor of `path` must be usable as a directory.
	fn assert_parents_are_directories(store: &NodeStore, path: &str) -> Result<(), VfsError> {
		for ancestor in ancestor_paths(path) {
			if ancestor == VFS_ROOT {
				continue;
			}
			if store.get(&ancestor).is_some_and(FileNode::is_file) {
				return Err(VfsError::NotADirectory(format!(
					"Parent path is a file: {} (for {})",
					ancestor, path
				)));
			}
		}
		Ok(())
	}

	/// Snapshot the current content, then replace it.
	fn replace_content(&mut self, path: &str, new_content: String) -> Result<(), VfsError> {
		self.assert_file_size(new_content.len(), path)?;
		let node = self
			.store
			.get_mut(path)
			.ok_or_else(|| VfsError::NotFound(format!("File not found: {}", path)))?;
		let prior = node.content.replace(new_content).unwrap_or_default();
		self.history.push(path, prior);
		Ok(())
	}

	// -- Text editing -----------------------------------------------------

	/// Create a file, or overwrite an existing one with undo support.
	pub fn create(&mut self, path: &str, content: &str) -> Result<CreateOutcome, VfsError> {
		let normalized = self.assert_valid_path(path)?;
		if normalized == VFS_ROOT {
			return Err(VfsError::NotAFile(
				"Cannot write to root directory as a file".to_string(),
			));
		}
		if self.store.is_directory(&normalized) {
			return Err(VfsError::NotAFile(format!(
				"Cannot overwrite directory with file: {}",
				normalized
			)));
		}
		Self::assert_parents_are_directories(&self.store, &normalized)?;

		if self.store.contains(&normalized) {
			self.replace_content(&normalized, content.to_string())?;
			tracing::debug!(path = %normalized, size = content.len(), "file overwritten");
			self.pending_events.push(VfsEvent::Updated { path: normalized });
			return Ok(CreateOutcome::Overwritten);
		}

		self.assert_file_size(content.len(), &normalized)?;
		self.assert_node_limit()?;
		self.store.put(FileNode::file(normalized.clone(), content));
		tracing::debug!(path = %normalized, size = content.len(), "file created");
		self.pending_events.push(VfsEvent::Created { path: normalized });
		Ok(CreateOutcome::Created)
	}

	/// File content, optionally sliced to a 1-based inclusive line range, or
	/// the immediate children of a directory.
	pub fn view(&self, path: &str, range: Option<(i64, i64)>) -> Result<ViewOutput, VfsError> {
		let normalized = self.assert_valid_path(path)?;
		match self.store.get(&normalized) {
			Some(node) if node.is_file() => {
				let text = node.text();
				Ok(ViewOutput::File(match range {
					Some((start, end)) => slice_lines(text, start, end),
					None => text.to_string(),
				}))
			}
			_ if self.store.is_directory(&normalized) => {
				Ok(ViewOutput::Directory(self.store.children(&normalized)))
			}
			_ => Err(VfsError::NotFound(format!(
				"No such file or directory: {}",
				normalized
			))),
		}
	}

	/// Replace the single occurrence of `old_str` with `new_str`.
	pub fn str_replace(
		&mut self,
		path: &str,
		old_str: &str,
		new_str: &str,
	) -> Result<(), VfsError> {
		let normalized = self.assert_valid_path(path)?;
		if old_str.is_empty() {
			return Err(VfsError::InvalidArgument(
				"old_str must not be empty".to_string(),
			));
		}
		let text = self.assert_file(&normalized)?.text();

		let starts = match_starts(text, old_str, 2);
		let start = match starts.as_slice() {
			[] => {
				return Err(VfsError::NoMatch(format!(
					"old_str was not found verbatim in {}",
					normalized
				)));
			}
			[start] => *start,
			_ => {
				return Err(VfsError::AmbiguousMatch(format!(
					"old_str is not unique in {}; include more surrounding context",
					normalized
				)));
			}
		};

		let mut updated = text.to_string();
		updated.replace_range(start..start + old_str.len(), new_str);
		self.replace_content(&normalized, updated)?;
		tracing::debug!(path = %normalized, "string replaced");
		self.pending_events.push(VfsEvent::Updated { path: normalized });
		Ok(())
	}

	/// Insert `new_str` after line `line` (0 inserts at the top).
	pub fn insert(&mut self, path: &str, line: usize, new_str: &str) -> Result<(), VfsError> {
		let normalized = self.assert_valid_path(path)?;
		let text = self.assert_file(&normalized)?.text();

		let mut lines = split_lines(text);
		if line > lines.len() {
			return Err(VfsError::InvalidLine(format!(
				"Line {} is out of range for {} (valid: 0-{})",
				line,
				normalized,
				lines.len()
			)));
		}
		lines.insert(line, new_str);
		let updated = lines.join("\n");

		self.replace_content(&normalized, updated)?;
		tracing::debug!(path = %normalized, line, "text inserted");
		self.pending_events.push(VfsEvent::Updated { path: normalized });
		Ok(())
	}

	/// Restore the content recorded before the most recent edit.
	pub fn undo_edit(&mut self, path: &str) -> Result<(), VfsError> {
		let normalized = self.assert_valid_path(path)?;
		self.assert_file(&normalized)?;

		let prior = self.history.pop(&normalized)?;
		if let Some(node) = self.store.get_mut(&normalized) {
			node.content = Some(prior);
		}
		let remaining = self.history.depth(&normalized);
		tracing::debug!(path = %normalized, remaining, "edit undone");
		self.pending_events.push(VfsEvent::Restored { path: normalized });
		Ok(())
	}

	// -- File management --------------------------------------------------

	/// Move a file or directory (with its subtree and history).  Fails when
	/// the destination is already occupied.  Returns the number of stored
	/// nodes moved.
	pub fn rename(&mut self, old_path: &str, new_path: &str) -> Result<usize, VfsError> {
		let normalized_old = self.assert_valid_path(old_path)?;
		let normalized_new = self.assert_valid_path(new_path)?;

		if normalized_old == VFS_ROOT || normalized_new == VFS_ROOT {
			return Err(VfsError::InvalidOperation(
				"Cannot rename the root directory".to_string(),
			));
		}
		if !self.store.exists(&normalized_old) {
			return Err(VfsError::NotFound(format!(
				"No such file or directory: {}",
				normalized_old
			)));
		}
		if normalized_old == normalized_new {
			return Ok(0);
		}
		if normalized_new.starts_with(&format!("{}/", normalized_old)) {
			return Err(VfsError::InvalidOperation(format!(
				"Cannot move directory into its own descendant: {} -> {}",
				normalized_old, normalized_new
			)));
		}
		if self.store.exists(&normalized_new) {
			return Err(VfsError::AlreadyExists(format!(
				"Destination already exists: {}",
				normalized_new
			)));
		}
		Self::assert_parents_are_directories(&self.store, &normalized_new)?;

		let subtree = std::iter::once(normalized_old.as_str())
			.chain(self.store.list_under(&normalized_old));
		for p in subtree {
			let moved = rebase(p, &normalized_old, &normalized_new);
			if let Some(err) = validate_path(&moved, &self.limits) {
				return Err(VfsError::InvalidPath(format!("{}: {}", err, moved)));
			}
		}

		let moved = self.store.rename_subtree(&normalized_old, &normalized_new);
		self.history.move_subtree(&normalized_old, &normalized_new);
		tracing::debug!(from = %normalized_old, to = %normalized_new, moved, "renamed");
		self.pending_events.push(VfsEvent::Renamed {
			old_path: normalized_old,
			new_path: normalized_new,
		});
		Ok(moved)
	}

	/// Remove a file or a whole directory subtree along with its history.
	/// Returns the number of stored nodes removed.
	pub fn delete(&mut self, path: &str) -> Result<usize, VfsError> {
		let normalized = self.assert_valid_path(path)?;
		if normalized == VFS_ROOT {
			return Err(VfsError::InvalidOperation(
				"Cannot delete the root directory".to_string(),
			));
		}

		let removed = self.store.remove_subtree(&normalized)?;
		self.history.discard_subtree(&normalized);
		tracing::debug!(path = %normalized, removed, "deleted");
		self.pending_events.push(VfsEvent::Deleted {
			path: normalized,
			removed,
		});
		Ok(removed)
	}

	// -- Navigation -------------------------------------------------------

	pub fn exists(&self, path: &str) -> Result<bool, VfsError> {
		let normalized = self.assert_valid_path(path)?;
		Ok(self.store.exists(&normalized))
	}

	pub fn is_directory(&self, path: &str) -> Result<bool, VfsError> {
		let normalized = self.assert_valid_path(path)?;
		Ok(self.store.is_directory(&normalized))
	}

	/// Full content of a file.
	pub fn read(&self, path: &str) -> Result<&str, VfsError> {
		let normalized = self.assert_valid_path(path)?;
		Ok(self.assert_file(&normalized)?.text())
	}

	pub fn history_depth(&self, path: &str) -> Result<usize, VfsError> {
		let normalized = self.assert_valid_path(path)?;
		Ok(self.history.depth(&normalized))
	}

	pub fn len(&self) -> usize {
		self.store.len()
	}

	pub fn is_empty(&self) -> bool {
		self.store.is_empty()
	}

	pub fn file_count(&self) -> usize {
		self.store.file_count()
	}

	pub fn clear(&mut self) {
		self.store.clear();
		self.history.clear();
	}

	// -- Serialize & Restore ----------------------------------------------

	/// Flat path -> record map of every stored node.  History is not included.
	pub fn serialize(&self) -> SerializedTree {
		self.store
			.iter()
			.map(|node| {
				let record = match node.node_type {
					NodeType::File => SerializedNode::file(node.text()),
					NodeType::Directory => SerializedNode::directory(),
				};
				(node.path.clone(), record)
			})
			.collect()
	}

	/// Replace the whole tree with `nodes`.  Every entry is validated before
	/// anything is committed; one bad entry fails the entire load.  Edit
	/// history starts empty.
	pub fn deserialize_from_nodes(&mut self, nodes: SerializedTree) -> Result<usize, VfsError> {
		let mut staged = NodeStore::new();

		for (raw_path, record) in nodes {
			let normalized = resolve_path(&raw_path, &self.limits).map_err(|e| {
				VfsError::InvalidPath(format!("Cannot load entry {:?}: {}", raw_path, e))
			})?;

			if normalized == VFS_ROOT {
				if record.node_type == NodeType::File {
					return Err(VfsError::InvalidPath(
						"Cannot load a file at the root path".to_string(),
					));
				}
				continue;
			}
			if staged.contains(&normalized) {
				return Err(VfsError::AlreadyExists(format!(
					"Duplicate entry after normalization: {}",
					raw_path
				)));
			}

			let node = match record.node_type {
				NodeType::File => {
					let content = record.content.unwrap_or_default();
					self.assert_file_size(content.len(), &normalized)?;
					FileNode::file(normalized, content)
				}
				NodeType::Directory => FileNode::directory(normalized),
			};
			staged.put(node);
		}

		if staged.len() > self.limits.max_node_count {
			return Err(VfsError::LimitExceeded(format!(
				"Tree has {} nodes, limit is {}",
				staged.len(),
				self.limits.max_node_count
			)));
		}
		for node in staged.iter() {
			Self::assert_parents_are_directories(&staged, &node.path)?;
		}

		let node_count = staged.len();
		self.store = staged;
		self.history.clear();
		tracing::debug!(node_count, "tree loaded");
		self.pending_events.push(VfsEvent::Loaded { node_count });
		Ok(node_count)
	}

	// -- Events -----------------------------------------------------------

	pub fn drain_events(&mut self) -> Vec<VfsEvent> {
		std::mem::take(&mut self.pending_events)
	}
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
