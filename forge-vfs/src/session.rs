// ---------------------------------------------------------------------------
// Session: one generation turn over a restored file tree
// ---------------------------------------------------------------------------
//
// A session is rebuilt from the serialized tree the client sends, receives
// the model's tool calls one at a time, and at the end of the turn hands the
// conversation plus `serialize()` output to the persistence collaborator.
// ---------------------------------------------------------------------------

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::error::VfsError;
use crate::path::VfsLimits;
use crate::tools::{self, ToolResult};
use crate::vfs::{SerializedTree, VirtualFileSystem};

// ---------------------------------------------------------------------------
// Persistence boundary
// ---------------------------------------------------------------------------

/// What gets stored for a project at the end of a turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectRecord {
	pub messages: Vec<serde_json::Value>,
	pub data: SerializedTree,
}

/// Storage for projects, keyed by the owning user.
#[async_trait]
pub trait ProjectStore: Send + Sync {
	async fn save(
		&self,
		user_id: &str,
		project_id: &str,
		record: ProjectRecord,
	) -> Result<(), VfsError>;

	async fn load(
		&self,
		user_id: &str,
		project_id: &str,
	) -> Result<Option<ProjectRecord>, VfsError>;
}

/// In-process `ProjectStore`; contents are lost with the process.
#[derive(Debug, Default)]
pub struct MemoryProjectStore {
	projects: RwLock<HashMap<(String, String), ProjectRecord>>,
}

impl MemoryProjectStore {
	pub fn new() -> Self {
		Self::default()
	}
}

#[async_trait]
impl ProjectStore for MemoryProjectStore {
	async fn save(
		&self,
		user_id: &str,
		project_id: &str,
		record: ProjectRecord,
	) -> Result<(), VfsError> {
		let mut projects = self.projects.write().await;
		projects.insert((user_id.to_string(), project_id.to_string()), record);
		Ok(())
	}

	async fn load(
		&self,
		user_id: &str,
		project_id: &str,
	) -> Result<Option<ProjectRecord>, VfsError> {
		let projects = self.projects.read().await;
		Ok(projects
			.get(&(user_id.to_string(), project_id.to_string()))
			.cloned())
	}
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum PersistOutcome {
	Saved,
	NoProject,
	Unauthenticated,
	Failed { message: String },
}

#[derive(Debug, Default)]
pub struct Session {
	project_id: Option<String>,
	vfs: VirtualFileSystem,
	messages: Vec<serde_json::Value>,
}

impl Session {
	pub fn new(limits: VfsLimits, project_id: Option<String>) -> Self {
		Self {
			project_id,
			vfs: VirtualFileSystem::new(limits),
			messages: Vec::new(),
		}
	}

	/// Rebuild a session from the client's serialized tree.
	pub fn load(
		files: SerializedTree,
		project_id: Option<String>,
		limits: VfsLimits,
	) -> Result<Self, VfsError> {
		let mut session = Self::new(limits, project_id);
		session.vfs.deserialize_from_nodes(files)?;
		session.vfs.drain_events();
		Ok(session)
	}

	pub fn project_id(&self) -> Option<&str> {
		self.project_id.as_deref()
	}

	pub fn vfs(&self) -> &VirtualFileSystem {
		&self.vfs
	}

	pub fn vfs_mut(&mut self) -> &mut VirtualFileSystem {
		&mut self.vfs
	}

	pub fn messages(&self) -> &[serde_json::Value] {
		&self.messages
	}

	/// Run one tool call.  Calls are applied strictly in order.
	pub fn call_tool(&mut self, name: &str, args: serde_json::Value) -> ToolResult {
		tracing::debug!(tool = name, label = %tools::display_message(name, &args), "tool call");
		tools::call_tool(&mut self.vfs, name, args)
	}

	pub fn append_messages(&mut self, messages: impl IntoIterator<Item = serde_json::Value>) {
		self.messages.extend(messages);
	}

	/// Persist the turn.  Skipped without a project or an authenticated
	/// user; storage failures are reported, not raised.
	pub async fn finish(&self, store: &dyn ProjectStore, user_id: Option<&str>) -> PersistOutcome {
		let Some(project_id) = self.project_id.as_deref() else {
			return PersistOutcome::NoProject;
		};
		let Some(user_id) = user_id else {
			tracing::warn!(project_id, "user not authenticated, cannot save project");
			return PersistOutcome::Unauthenticated;
		};

		let record = ProjectRecord {
			messages: self.messages.clone(),
			data: self.vfs.serialize(),
		};
		match store.save(user_id, project_id, record).await {
			Ok(()) => {
				tracing::info!(project_id, files = self.vfs.file_count(), "project saved");
				PersistOutcome::Saved
			}
			Err(e) => {
				tracing::error!(project_id, "failed to save project data: {}", e);
				PersistOutcome::Failed {
					message: e.to_string(),
				}
			}
		}
	}
}
