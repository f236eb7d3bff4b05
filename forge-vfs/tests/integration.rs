// ---------------------------------------------------------------------------
// Integration tests for forge-vfs
//
// Each test drives the built binary over stdin/stdout, one JSON-RPC message
// per line, the way a chat backend would during a generation turn.
// ---------------------------------------------------------------------------

use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

use serde_json::{Value, json};

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

/// One `forge-vfs` process.  `vfs/changed` notifications that arrive ahead
/// of a response are collected in `changes`.
struct Forge {
    child: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
    last_id: u64,
    changes: Vec<Value>,
}

impl Forge {
    fn start() -> Self {
        let mut child = Command::new(env!("CARGO_BIN_EXE_forge-vfs"))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .expect("forge-vfs should start");
        let stdin = child.stdin.take().expect("piped stdin");
        let stdout = BufReader::new(child.stdout.take().expect("piped stdout"));
        Self {
            child,
            stdin,
            stdout,
            last_id: 0,
            changes: Vec::new(),
        }
    }

    fn write_raw(&mut self, bytes: &[u8]) {
        self.stdin.write_all(bytes).unwrap();
        self.stdin.flush().unwrap();
    }

    /// Next message that carries an `id`, stashing notifications on the way.
    fn next_reply(&mut self) -> Value {
        loop {
            let mut line = String::new();
            let n = self.stdout.read_line(&mut line).unwrap();
            assert!(n > 0, "forge-vfs closed stdout before replying");
            if line.trim().is_empty() {
                continue;
            }
            let message: Value = serde_json::from_str(&line)
                .unwrap_or_else(|e| panic!("bad JSON from forge-vfs ({e}): {line}"));
            if message.get("id").is_some() {
                return message;
            }
            if message["method"] == "vfs/changed" {
                self.changes.push(message["params"].clone());
            }
        }
    }

    /// Send one request; `Ok(result)` or `Err(error)`.
    fn request(&mut self, method: &str, params: Value) -> Result<Value, Value> {
        self.last_id += 1;
        let id = self.last_id;
        let line = json!({ "jsonrpc": "2.0", "id": id, "method": method, "params": params });
        self.write_raw(format!("{line}\n").as_bytes());

        let mut reply = self.next_reply();
        assert_eq!(reply["id"], id, "reply out of order: {reply}");
        match reply.get_mut("error") {
            Some(error) => Err(error.take()),
            None => Ok(reply["result"].take()),
        }
    }

    fn ok(&mut self, method: &str, params: Value) -> Value {
        self.request(method, params)
            .unwrap_or_else(|e| panic!("{method} failed: {e}"))
    }

    fn fails(&mut self, method: &str, params: Value) -> Value {
        match self.request(method, params) {
            Ok(v) => panic!("{method} should have failed, got {v}"),
            Err(e) => e,
        }
    }

    /// Call a tool with `command` and `path` plus any extra arguments.
    fn tool(&mut self, name: &str, command: &str, path: &str, extra: Value) -> Value {
        let mut arguments = json!({ "command": command, "path": path });
        if let Value::Object(fields) = extra {
            arguments.as_object_mut().unwrap().extend(fields);
        }
        self.ok("tools/call", json!({ "name": name, "arguments": arguments }))
    }

    fn edit(&mut self, command: &str, path: &str, extra: Value) -> Value {
        self.tool("str_replace_editor", command, path, extra)
    }

    fn manage(&mut self, command: &str, path: &str, extra: Value) -> Value {
        self.tool("file_manager", command, path, extra)
    }

    fn view(&mut self, path: &str) -> String {
        let r = self.edit("view", path, json!({}));
        assert_eq!(r["isError"], false, "view {path}: {r}");
        r["content"].as_str().unwrap().to_string()
    }
}

impl Drop for Forge {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

// ---------------------------------------------------------------------------
// Lifecycle
// ---------------------------------------------------------------------------

#[test]
fn initialize_reports_tools() {
    let mut f = Forge::start();
    let result = f.ok("initialize", json!({ "limits": null }));
    assert_eq!(result["server"], "forge-vfs");
    assert_eq!(result["tools"], json!(["str_replace_editor", "file_manager"]));
}

#[test]
fn tools_list_has_schemas() {
    let mut f = Forge::start();
    let result = f.ok("tools/list", Value::Null);
    let tools = result["tools"].as_array().unwrap();
    assert_eq!(tools.len(), 2);
    assert_eq!(tools[0]["name"], "str_replace_editor");
    assert_eq!(tools[0]["inputSchema"]["type"], "object");
    assert_eq!(tools[1]["name"], "file_manager");
}

#[test]
fn unknown_method_is_rejected() {
    let mut f = Forge::start();
    let err = f.fails("files/explode", json!({}));
    assert_eq!(err["code"], -32601);
}

#[test]
fn unreadable_line_keeps_session_alive() {
    let mut f = Forge::start();
    f.edit("create", "/App.jsx", json!({ "file_text": "A" }));

    f.write_raw(b"\xff\xfe\n");
    let reply = f.next_reply();
    assert!(reply["id"].is_null());
    assert_eq!(reply["error"]["code"], -32700);

    assert_eq!(f.view("/App.jsx"), "A");
}

// ---------------------------------------------------------------------------
// Editing
// ---------------------------------------------------------------------------

#[test]
fn create_then_view() {
    let mut f = Forge::start();
    let r = f.edit("create", "/src/App.jsx", json!({ "file_text": "one\ntwo\nthree" }));
    assert_eq!(r["isError"], false);

    let r = f.edit("view", "/src/App.jsx", json!({ "view_range": [2, -1] }));
    assert_eq!(r["content"], "two\nthree");

    assert_eq!(f.view("/"), "src/");
}

#[test]
fn edit_then_undo_restores_prior_content() {
    let mut f = Forge::start();
    f.edit("create", "/App.jsx", json!({ "file_text": "A" }));
    let r = f.edit("str_replace", "/App.jsx", json!({ "old_str": "A", "new_str": "B" }));
    assert_eq!(r["isError"], false);

    let r = f.edit("undo_edit", "/App.jsx", json!({}));
    assert_eq!(r["isError"], false);
    assert_eq!(f.view("/App.jsx"), "A");

    let r = f.edit("undo_edit", "/App.jsx", json!({}));
    assert_eq!(r["isError"], true);
    assert_eq!(r["errorCode"], "VFS_NO_HISTORY");
}

#[test]
fn ambiguous_replace_leaves_file_untouched() {
    let mut f = Forge::start();
    f.edit("create", "/a.txt", json!({ "file_text": "x x" }));
    let r = f.edit("str_replace", "/a.txt", json!({ "old_str": "x", "new_str": "y" }));
    assert_eq!(r["errorCode"], "VFS_AMBIGUOUS_MATCH");
    assert_eq!(f.view("/a.txt"), "x x");

    f.edit("create", "/App.jsx", json!({ "file_text": "}\n}\n}" }));
    let r = f.edit("str_replace", "/App.jsx", json!({ "old_str": "}\n}", "new_str": "" }));
    assert_eq!(r["errorCode"], "VFS_AMBIGUOUS_MATCH");
    assert_eq!(f.view("/App.jsx"), "}\n}\n}");
}

#[test]
fn insert_after_line() {
    let mut f = Forge::start();
    f.edit("create", "/a.txt", json!({ "file_text": "one\nthree" }));
    let r = f.edit("insert", "/a.txt", json!({ "insert_line": 1, "new_str": "two" }));
    assert_eq!(r["isError"], false);
    assert_eq!(f.view("/a.txt"), "one\ntwo\nthree");

    let r = f.edit("insert", "/a.txt", json!({ "insert_line": 9, "new_str": "x" }));
    assert_eq!(r["errorCode"], "VFS_INVALID_LINE");
}

#[test]
fn malformed_arguments_are_error_results() {
    let mut f = Forge::start();
    let r = f.edit("teleport", "/a.txt", json!({}));
    assert_eq!(r["isError"], true);
    assert_eq!(r["errorCode"], "VFS_INVALID_ARGUMENT");

    let r = f.tool("shell", "run", "/", json!({}));
    assert_eq!(r["isError"], true);
}

// ---------------------------------------------------------------------------
// File manager
// ---------------------------------------------------------------------------

#[test]
fn rename_directory_then_delete() {
    let mut f = Forge::start();
    f.edit("create", "/components/Button.jsx", json!({ "file_text": "b" }));
    f.edit("create", "/components/Card.jsx", json!({ "file_text": "c" }));

    let r = f.manage("rename", "/components", json!({ "new_path": "/ui" }));
    assert_eq!(r["isError"], false);
    assert_eq!(f.view("/ui/Card.jsx"), "c");

    let r = f.edit("view", "/components/Card.jsx", json!({}));
    assert_eq!(r["errorCode"], "VFS_NOT_FOUND");

    let r = f.manage("delete", "/ui", json!({}));
    assert_eq!(r["isError"], false);
    let tree = f.ok("session/serialize", Value::Null);
    assert_eq!(tree["files"], json!({}));
}

#[test]
fn changes_are_announced() {
    let mut f = Forge::start();
    f.edit("create", "/a.txt", json!({ "file_text": "a" }));
    f.manage("rename", "/a.txt", json!({ "new_path": "/b.txt" }));
    f.edit("view", "/b.txt", json!({}));

    let kinds: Vec<&str> = f
        .changes
        .iter()
        .flat_map(|params| params["events"].as_array().unwrap())
        .map(|e| e["type"].as_str().unwrap())
        .collect();
    assert_eq!(kinds, vec!["created", "renamed"]);
}

// ---------------------------------------------------------------------------
// Sessions and persistence
// ---------------------------------------------------------------------------

#[test]
fn load_edit_serialize() {
    let mut f = Forge::start();
    let files = json!({
        "/": { "type": "directory" },
        "/App.jsx": { "type": "file", "content": "export default 1;" },
        "/components": { "type": "directory" },
    });
    let r = f.ok("session/load", json!({ "files": files }));
    assert_eq!(r["nodeCount"], 2);

    f.edit("str_replace", "/App.jsx", json!({ "old_str": "1", "new_str": "2" }));
    let r = f.ok("session/serialize", Value::Null);
    assert_eq!(
        r["files"],
        json!({
            "/App.jsx": { "type": "file", "content": "export default 2;" },
            "/components": { "type": "directory" },
        })
    );
}

#[test]
fn corrupt_tree_is_rejected() {
    let mut f = Forge::start();
    let files = json!({
        "/a.txt": { "type": "file", "content": "a" },
        "/a.txt/b": { "type": "file", "content": "b" },
    });
    let err = f.fails("session/load", json!({ "files": files }));
    assert_eq!(err["code"], -32000);
    assert_eq!(err["data"]["vfsCode"], "VFS_NOT_DIRECTORY");
}

#[test]
fn finish_saves_project() {
    let mut f = Forge::start();
    f.ok("session/load", json!({ "files": {}, "projectId": "p1" }));
    f.edit("create", "/App.jsx", json!({ "file_text": "A" }));

    let r = f.ok("session/finish", json!({ "messages": [] }));
    assert_eq!(r["status"], "unauthenticated");

    let messages = json!([{ "role": "assistant", "content": "done" }]);
    let r = f.ok("session/finish", json!({ "userId": "u1", "messages": messages }));
    assert_eq!(r["status"], "saved");

    let r = f.ok("project/load", json!({ "userId": "u1", "projectId": "p1" }));
    assert_eq!(r["project"]["data"]["/App.jsx"]["content"], "A");
    assert_eq!(r["project"]["messages"][0]["content"], "done");

    let r = f.ok("project/load", json!({ "userId": "u2", "projectId": "p1" }));
    assert!(r["project"].is_null());
}

#[test]
fn display_labels() {
    let mut f = Forge::start();
    let rename = json!({ "command": "rename", "path": "/a", "new_path": "/b" });
    let r = f.ok("tools/display", json!({ "name": "file_manager", "arguments": rename }));
    assert_eq!(r["message"], "Renaming /a to /b");

    let r = f.ok("tools/display", json!({ "name": "mystery", "arguments": {} }));
    assert_eq!(r["message"], "mystery");
}
