// ---------------------------------------------------------------------------
// ForgeServer: JSON-RPC dispatcher
// ---------------------------------------------------------------------------
//
// Reads JSON-RPC 2.0 requests (NDJSON) from an async reader, routes them to
// the current Session, and writes responses and `vfs/changed` notifications
// through the transport.  Requests are handled strictly one at a time, so
// tool calls against the tree never overlap.
// ---------------------------------------------------------------------------

use std::sync::Arc;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::error::VfsError;
use crate::path::VfsLimits;
use crate::protocol::*;
use crate::session::{ProjectStore, Session};
use crate::tools;
use crate::transport::NdjsonTransport;

// ---------------------------------------------------------------------------
// Server
// ---------------------------------------------------------------------------

pub struct ForgeServer {
	transport: NdjsonTransport,
	limits: VfsLimits,
	session: Session,
	store: Arc<dyn ProjectStore>,
}

impl ForgeServer {
	/// Create a server with an empty session.
	pub fn new(
		transport: NdjsonTransport,
		limits: VfsLimits,
		store: Arc<dyn ProjectStore>,
	) -> Self {
		Self {
			transport,
			session: Session::new(limits.clone(), None),
			limits,
			store,
		}
	}

	/// Main loop: read one request per line until EOF.  A line that is not
	/// UTF-8 or not a request gets a parse error; the loop keeps going.
	pub async fn run<R>(&mut self, mut reader: R) -> Result<(), VfsError>
	where
		R: AsyncBufRead + Unpin,
	{
		let mut buf = Vec::new();
		loop {
			buf.clear();
			if reader.read_until(b'\n', &mut buf).await? == 0 {
				break;
			}

			let line = match std::str::from_utf8(&buf) {
				Ok(line) => line.trim(),
				Err(e) => {
					tracing::warn!("Parse error: {}", e);
					self.transport.write_parse_error("Parse error: input is not UTF-8");
					continue;
				}
			};
			if line.is_empty() {
				continue;
			}

			match serde_json::from_str::<JsonRpcRequest>(line) {
				Ok(req) => self.dispatch(req).await,
				Err(e) => {
					tracing::warn!("Parse error: {}", e);
					self.transport.write_parse_error("Parse error: invalid JSON");
				}
			}
		}

		tracing::info!("input closed, shutting down");
		Ok(())
	}

	// ── Dispatch ──────────────────────────────────────────────────────────

	async fn dispatch(&mut self, req: JsonRpcRequest) {
		let id = req.id;
		let result = match req.method.as_str() {
			// -- Lifecycle -----------------------------------------------
			"initialize" => self.handle_initialize(req.params),

			// -- Session -------------------------------------------------
			"session/load" => self.handle_load(req.params),
			"session/serialize" => {
				Ok(serde_json::json!({ "files": self.session.vfs().serialize() }))
			}
			"session/finish" => self.handle_finish(req.params).await,

			// -- Tools ---------------------------------------------------
			"tools/list" => Ok(serde_json::json!({ "tools": tools::definitions() })),
			"tools/call" => self.handle_tool_call(req.params),
			"tools/display" => handle_display(req.params),

			// -- Projects ------------------------------------------------
			"project/load" => self.handle_project_load(req.params).await,

			// -- Unknown -------------------------------------------------
			_ => {
				self.transport.write_error(
					id,
					METHOD_NOT_FOUND,
					format!("Unknown method: {}", req.method),
					None,
				);
				return;
			}
		};

		match result {
			Ok(value) => self.transport.write_response(id, value),
			Err(VfsError::InvalidArgument(message)) => {
				self.transport.write_error(id, INVALID_PARAMS, message, None)
			}
			Err(e) => self.transport.write_vfs_error(id, &e),
		}
	}

	// ── Handlers ──────────────────────────────────────────────────────────

	fn handle_initialize(
		&mut self,
		params: serde_json::Value,
	) -> Result<serde_json::Value, VfsError> {
		let p: InitializeParams = if params.is_null() {
			InitializeParams::default()
		} else {
			parse_params(params)?
		};
		if let Some(limits) = p.limits {
			self.limits = limits.apply(&self.limits);
		}
		self.session = Session::new(self.limits.clone(), None);

		let tool_names: Vec<&str> = tools::Tool::ALL.iter().map(|t| t.name()).collect();
		Ok(serde_json::json!({
			"server": env!("CARGO_PKG_NAME"),
			"version": env!("CARGO_PKG_VERSION"),
			"tools": tool_names,
		}))
	}

	fn handle_load(
		&mut self,
		params: serde_json::Value,
	) -> Result<serde_json::Value, VfsError> {
		let p: LoadSessionParams = parse_params(params)?;
		let session = Session::load(p.files, p.project_id, self.limits.clone())?;
		let node_count = session.vfs().len();
		self.session = session;
		tracing::info!(node_count, project_id = ?self.session.project_id(), "session loaded");
		Ok(serde_json::json!({ "nodeCount": node_count }))
	}

	fn handle_tool_call(
		&mut self,
		params: serde_json::Value,
	) -> Result<serde_json::Value, VfsError> {
		let p: ToolCallParams = parse_params(params)?;
		let label = tools::display_message(&p.name, &p.arguments);
		let result = self.session.call_tool(&p.name, p.arguments);

		let events = self.session.vfs_mut().drain_events();
		if !events.is_empty() {
			self.transport
				.write_notification(VFS_CHANGED, serde_json::json!({ "events": events }));
		}

		let mut value = serde_json::to_value(result)?;
		value["label"] = serde_json::Value::String(label);
		Ok(value)
	}

	async fn handle_finish(
		&mut self,
		params: serde_json::Value,
	) -> Result<serde_json::Value, VfsError> {
		let p: FinishSessionParams = parse_params(params)?;
		self.session.append_messages(p.messages);
		let outcome = self
			.session
			.finish(self.store.as_ref(), p.user_id.as_deref())
			.await;
		Ok(serde_json::to_value(outcome)?)
	}

	async fn handle_project_load(
		&self,
		params: serde_json::Value,
	) -> Result<serde_json::Value, VfsError> {
		let p: ProjectLoadParams = parse_params(params)?;
		let project = self.store.load(&p.user_id, &p.project_id).await?;
		Ok(serde_json::json!({ "project": project }))
	}
}

fn handle_display(params: serde_json::Value) -> Result<serde_json::Value, VfsError> {
	let p: ToolCallParams = parse_params(params)?;
	Ok(serde_json::json!({ "message": tools::display_message(&p.name, &p.arguments) }))
}

fn parse_params<T>(params: serde_json::Value) -> Result<T, VfsError>
where
	T: serde::de::DeserializeOwned,
{
	serde_json::from_value(params)
		.map_err(|e| VfsError::InvalidArgument(format!("Invalid params: {}", e)))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
