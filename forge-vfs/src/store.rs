// ---------------------------------------------------------------------------
// FileNode store: flat map from normalized path to node
// ---------------------------------------------------------------------------
//
// Hierarchy is never stored as pointers.  Directories are either explicit
// nodes (restored from a serialized tree) or implied by the paths of the
// files beneath them; listing, subtree removal and subtree rename are all
// derived by prefix matching on the keys.  The map keeps insertion order so
// listings and serialized output are deterministic across calls.
// ---------------------------------------------------------------------------

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::VfsError;
use crate::path::{VFS_ROOT, is_descendant, rebase, subtree_prefix};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
	File,
	Directory,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileNode {
	pub path: String,
	pub node_type: NodeType,
	/// Present only for files.
	pub content: Option<String>,
}

impl FileNode {
	pub fn file(path: impl Into<String>, content: impl Into<String>) -> Self {
		Self {
			path: path.into(),
			node_type: NodeType::File,
			content: Some(content.into()),
		}
	}

	pub fn directory(path: impl Into<String>) -> Self {
		Self {
			path: path.into(),
			node_type: NodeType::Directory,
			content: None,
		}
	}

	pub fn is_file(&self) -> bool {
		self.node_type == NodeType::File
	}

	pub fn text(&self) -> &str {
		self.content.as_deref().unwrap_or("")
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirEntry {
	pub name: String,
	#[serde(rename = "type")]
	pub node_type: NodeType,
}

#[derive(Debug, Default, Clone)]
pub struct NodeStore {
	nodes: IndexMap<String, FileNode>,
}

impl NodeStore {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn get(&self, path: &str) -> Option<&FileNode> {
		self.nodes.get(path)
	}

	pub fn get_mut(&mut self, path: &str) -> Option<&mut FileNode> {
		self.nodes.get_mut(path)
	}

	/// Insert or overwrite the node keyed by its own path.  An overwrite keeps
	/// its listing position.
	pub fn put(&mut self, node: FileNode) -> Option<FileNode> {
		self.nodes.insert(node.path.clone(), node)
	}

	pub fn contains(&self, path: &str) -> bool {
		self.nodes.contains_key(path)
	}

	pub fn has_descendants(&self, path: &str) -> bool {
		self.list_under(path).next().is_some()
	}

	/// The root, any explicit directory node, and any path that has nodes
	/// beneath it.
	pub fn is_directory(&self, path: &str) -> bool {
		if path == VFS_ROOT {
			return true;
		}
		match self.nodes.get(path) {
			Some(node) => node.node_type == NodeType::Directory,
			None => self.has_descendants(path),
		}
	}

	/// Either a node is stored at `path` or the path is an implied directory.
	pub fn exists(&self, path: &str) -> bool {
		self.is_directory(path) || self.nodes.contains_key(path)
	}

	/// Lazily yield every stored path strictly beneath `path`.
	pub fn list_under<'a>(&'a self, path: &'a str) -> impl Iterator<Item = &'a str> + 'a {
		self.nodes
			.keys()
			.map(String::as_str)
			.filter(move |key| is_descendant(key, path))
	}

	/// Immediate children of a directory, explicit or implied, in first-seen
	/// order.
	pub fn children(&self, path: &str) -> Vec<DirEntry> {
		let prefix = subtree_prefix(path);
		let mut entries: IndexMap<&str, NodeType> = IndexMap::new();
		for key in self.list_under(path) {
			let remainder = &key[prefix.len()..];
			match remainder.split_once('/') {
				Some((dir, _)) => {
					entries.insert(dir, NodeType::Directory);
				}
				None => {
					let node_type = self.nodes[key].node_type;
					entries.entry(remainder).or_insert(node_type);
				}
			}
		}
		entries
			.into_iter()
			.map(|(name, node_type)| DirEntry {
				name: name.to_string(),
				node_type,
			})
			.collect()
	}

	/// Remove the node at `path` and everything beneath it.  Fails only when
	/// neither the node nor any descendant exists.
	pub fn remove_subtree(&mut self, path: &str) -> Result<usize, VfsError> {
		let before = self.nodes.len();
		self.nodes
			.retain(|key, _| key != path && !is_descendant(key, path));
		let removed = before - self.nodes.len();
		if removed == 0 {
			return Err(VfsError::NotFound(format!(
				"No such file or directory: {}",
				path
			)));
		}
		Ok(removed)
	}

	/// Move the node at `old` and every descendant under `new`, keeping each
	/// entry's listing position.  Returns the number of nodes moved.
	pub fn rename_subtree(&mut self, old: &str, new: &str) -> usize {
		let mut moved = 0;
		let nodes = std::mem::take(&mut self.nodes);
		self.nodes = nodes
			.into_iter()
			.map(|(key, mut node)| {
				if key == old || is_descendant(&key, old) {
					moved += 1;
					let new_key = rebase(&key, old, new);
					node.path = new_key.clone();
					(new_key, node)
				} else {
					(key, node)
				}
			})
			.collect();
		moved
	}

	pub fn iter(&self) -> impl Iterator<Item = &FileNode> {
		self.nodes.values()
	}

	pub fn len(&self) -> usize {
		self.nodes.len()
	}

	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty()
	}

	pub fn file_count(&self) -> usize {
		self.nodes.values().filter(|n| n.is_file()).count()
	}

	pub fn clear(&mut self) {
		self.nodes.clear();
	}
}

/// Render a directory listing the way the editor tool reports it.
pub fn format_listing(entries: &[DirEntry]) -> String {
	entries
		.iter()
		.map(|e| match e.node_type {
			NodeType::Directory => format!("{}/", e.name),
			NodeType::File => e.name.clone(),
		})
		.collect::<Vec<_>>()
		.join("\n")
}
