use std::io::{self, Write};
use std::sync::Mutex;

use serde_json::{Value, json};

use crate::error::VfsError;
use crate::protocol::{PARSE_ERROR, VFS_ERROR};

/// Writes JSON-RPC 2.0 messages as newline-delimited JSON.  Stdout by
/// default; any writer can be plugged in.
pub struct NdjsonTransport {
    out: Mutex<Box<dyn Write + Send>>,
}

impl Default for NdjsonTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl NdjsonTransport {
    pub fn new() -> Self {
        Self::with_writer(io::stdout())
    }

    pub fn with_writer(writer: impl Write + Send + 'static) -> Self {
        Self {
            out: Mutex::new(Box::new(writer)),
        }
    }

    pub fn write_response(&self, id: u64, result: Value) {
        self.emit(json!({ "jsonrpc": "2.0", "id": id, "result": result }));
    }

    pub fn write_error(&self, id: u64, code: i32, message: impl Into<String>, data: Option<Value>) {
        self.emit(error_message(json!(id), code, message.into(), data));
    }

    /// A line that could not be read as a request has no id to answer, so
    /// the reply carries `"id": null`.
    pub fn write_parse_error(&self, message: impl Into<String>) {
        self.emit(error_message(Value::Null, PARSE_ERROR, message.into(), None));
    }

    /// A file-system failure, with its `vfsCode` attached as error data.
    pub fn write_vfs_error(&self, id: u64, err: &VfsError) {
        self.write_error(id, VFS_ERROR, err.to_string(), Some(err.to_json_rpc_error()));
    }

    pub fn write_notification(&self, method: &str, params: Value) {
        self.emit(json!({ "jsonrpc": "2.0", "method": method, "params": params }));
    }

    fn emit(&self, message: Value) {
        let mut line = message.to_string();
        line.push('\n');

        let mut out = match self.out.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Err(e) = out.write_all(line.as_bytes()) {
            tracing::error!("Failed to write to transport: {}", e);
            return;
        }
        if let Err(e) = out.flush() {
            tracing::error!("Failed to flush transport: {}", e);
        }
    }
}

fn error_message(id: Value, code: i32, message: String, data: Option<Value>) -> Value {
    let mut error = json!({ "code": code, "message": message });
    if let Some(data) = data {
        error["data"] = data;
    }
    json!({ "jsonrpc": "2.0", "id": id, "error": error })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Captured {
        fn messages(&self) -> Vec<Value> {
            let bytes = self.0.lock().unwrap().clone();
            String::from_utf8(bytes)
                .unwrap()
                .lines()
                .map(|l| serde_json::from_str(l).unwrap())
                .collect()
        }
    }

    #[test]
    fn notification_then_response_on_separate_lines() {
        let captured = Captured::default();
        let transport = NdjsonTransport::with_writer(captured.clone());
        transport.write_notification("vfs/changed", json!({ "events": [] }));
        transport.write_response(3, json!({ "ok": true }));

        let out = captured.messages();
        assert_eq!(out.len(), 2);
        assert!(out[0].get("id").is_none());
        assert_eq!(out[0]["method"], "vfs/changed");
        assert_eq!(out[1]["id"], 3);
        assert_eq!(out[1]["result"]["ok"], true);
    }

    #[test]
    fn vfs_errors_carry_code() {
        let captured = Captured::default();
        let transport = NdjsonTransport::with_writer(captured.clone());
        transport.write_vfs_error(9, &VfsError::NotFound("/a.js".into()));

        let out = captured.messages();
        assert_eq!(out[0]["error"]["code"], VFS_ERROR);
        assert_eq!(out[0]["error"]["data"]["vfsCode"], "VFS_NOT_FOUND");
        assert!(out[0].get("result").is_none());
    }

    #[test]
    fn plain_errors_omit_data() {
        let captured = Captured::default();
        let transport = NdjsonTransport::with_writer(captured.clone());
        transport.write_error(0, -32601, "Unknown method: x", None);

        let out = captured.messages();
        assert_eq!(out[0]["id"], 0);
        assert!(out[0]["error"].get("data").is_none());
    }

    #[test]
    fn parse_errors_answer_with_null_id() {
        let captured = Captured::default();
        let transport = NdjsonTransport::with_writer(captured.clone());
        transport.write_parse_error("Parse error: invalid JSON");

        let out = captured.messages();
        assert!(out[0]["id"].is_null());
        assert!(out[0].as_object().unwrap().contains_key("id"));
        assert_eq!(out[0]["error"]["code"], PARSE_ERROR);
    }
}
