// ---------------------------------------------------------------------------
// EditHistory: per-file undo stacks
// ---------------------------------------------------------------------------

use std::collections::HashMap;

use crate::error::VfsError;
use crate::path::{is_descendant, rebase};

/// Prior content snapshots, one independent stack per file path.  The most
/// recent snapshot sits at the end of each stack.
#[derive(Debug, Default, Clone)]
pub struct EditHistory {
	stacks: HashMap<String, Vec<String>>,
}

impl EditHistory {
	pub fn new() -> Self {
		Self::default()
	}

	/// Record `prior` as the content to restore on the next undo of `path`.
	pub fn push(&mut self, path: &str, prior: String) {
		self.stacks.entry(path.to_string()).or_default().push(prior);
	}

	/// Remove and return the most recent snapshot for `path`.
	pub fn pop(&mut self, path: &str) -> Result<String, VfsError> {
		let stack = self.stacks.get_mut(path);
		let prior = stack.and_then(Vec::pop).ok_or_else(|| {
			VfsError::NoHistory(format!("No edit history to undo for {}", path))
		})?;
		if self.stacks.get(path).is_some_and(Vec::is_empty) {
			self.stacks.remove(path);
		}
		Ok(prior)
	}

	pub fn depth(&self, path: &str) -> usize {
		self.stacks.get(path).map_or(0, Vec::len)
	}

	/// Drop the history of `path` and of every path beneath it.
	pub fn discard_subtree(&mut self, path: &str) {
		self.stacks
			.retain(|key, _| key != path && !is_descendant(key, path));
	}

	/// Carry the history of `old` and its descendants over to `new`.
	pub fn move_subtree(&mut self, old: &str, new: &str) {
		let moving: Vec<String> = self
			.stacks
			.keys()
			.filter(|key| key.as_str() == old || is_descendant(key, old))
			.cloned()
			.collect();
		for key in moving {
			if let Some(stack) = self.stacks.remove(&key) {
				self.stacks.insert(rebase(&key, old, new), stack);
			}
		}
	}

	pub fn clear(&mut self) {
		self.stacks.clear();
	}
}
