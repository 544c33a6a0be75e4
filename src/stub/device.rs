//! Simulated device
//!
//! Answers protocol commands from in-memory state instead of real hardware.

use std::collections::BTreeMap;

use parking_lot::Mutex;
use serde_json::{json, Map, Value};

use crate::protocol::{CommandName, Reply};

/// Mutable device state
struct DeviceState {
    /// Whether `init` has been received (and not undone by `close`)
    connected: bool,

    /// Last indicator value set
    indicator: String,

    /// Identifier reported by `get_bbid`
    identifier: u32,

    /// Files visible to `list_files` / `read_file`
    files: BTreeMap<String, Vec<u8>>,
}

/// In-memory stand-in for a device-control process
pub struct StubDevice {
    state: Mutex<DeviceState>,
}

impl StubDevice {
    /// Create a disconnected device with an empty file table
    pub fn new(identifier: u32) -> Self {
        Self {
            state: Mutex::new(DeviceState {
                connected: false,
                indicator: "0".to_string(),
                identifier,
                files: BTreeMap::new(),
            }),
        }
    }

    /// Add a file to the device
    pub fn with_file(self, name: impl Into<String>, contents: impl Into<Vec<u8>>) -> Self {
        self.state.lock().files.insert(name.into(), contents.into());
        self
    }

    pub fn is_connected(&self) -> bool {
        self.state.lock().connected
    }

    /// Current indicator value
    pub fn indicator(&self) -> String {
        self.state.lock().indicator.clone()
    }

    /// Answer one decoded request object
    pub fn handle(&self, request: &Map<String, Value>) -> Reply {
        let cmd = match string_field(request, "cmd") {
            Some(cmd) => cmd,
            None => return Reply::failure("Missing 'cmd' field"),
        };

        let name = match cmd.parse::<CommandName>() {
            Ok(name) => name,
            Err(_) => return Reply::failure("Unknown command"),
        };

        tracing::debug!("Stub device handling {}", name);

        let mut state = self.state.lock();
        match name {
            CommandName::Ping => Reply::ok("pong"),
            CommandName::Status => {
                Reply::ok("Status retrieved").with_data(object(json!({ "connected": state.connected })))
            }
            CommandName::Init => {
                state.connected = true;
                Reply::ok("Connected to device")
            }
            CommandName::Close => {
                state.connected = false;
                Reply::ok("Connection closed")
            }
            _ if !state.connected => Reply::failure("Device not connected"),
            CommandName::GetIdentifier => Reply::ok("Identifier retrieved")
                .with_data(object(json!({ "identifier": format!("{:08x}", state.identifier) }))),
            CommandName::ListFiles => {
                let files: Vec<Value> = state
                    .files
                    .iter()
                    .map(|(name, contents)| json!({ "name": name, "size": contents.len() }))
                    .collect();
                Reply::ok("Files listed").with_data(object(json!({ "files": files })))
            }
            CommandName::DumpNand => Reply::ok("NAND dumped to nand.bin and spare.bin"),
            CommandName::DumpFs => Reply::ok("Filesystem dumped to current_fs.bin"),
            CommandName::ReadFile => match string_field(request, "filename") {
                None => Reply::failure("Missing 'filename' field"),
                Some(filename) => match state.files.get(filename) {
                    Some(contents) => Reply::ok("File read successfully").with_data(object(
                        json!({ "filename": filename, "size": contents.len() }),
                    )),
                    None => Reply::failure("Failed to read file"),
                },
            },
            CommandName::SetIndicator => match string_field(request, "value") {
                None => Reply::failure("Missing 'value' field"),
                Some(value) => {
                    state.indicator = value.to_string();
                    Reply::ok("Indicator set")
                }
            },
        }
    }
}

impl Default for StubDevice {
    fn default() -> Self {
        Self::new(0x0042_1337)
            .with_file("ticket.sys", vec![0u8; 512])
            .with_file("id.sys", vec![0u8; 64])
    }
}

fn string_field<'a>(request: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    request.get(key).and_then(Value::as_str)
}

fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}
