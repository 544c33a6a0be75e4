//! Command definitions
//!
//! Represents commands sent to the device-control process.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::error::BridgeError;

/// Command names understood by the device-control process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandName {
    Ping,
    Status,
    Init,
    Close,
    GetIdentifier,
    ListFiles,
    DumpNand,
    DumpFs,
    ReadFile,
    SetIndicator,
}

impl CommandName {
    /// Every command, in wire-table order
    pub const ALL: [CommandName; 10] = [
        CommandName::Ping,
        CommandName::Status,
        CommandName::Init,
        CommandName::Close,
        CommandName::GetIdentifier,
        CommandName::ListFiles,
        CommandName::DumpNand,
        CommandName::DumpFs,
        CommandName::ReadFile,
        CommandName::SetIndicator,
    ];

    /// Value of the `cmd` field on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            CommandName::Ping => "ping",
            CommandName::Status => "status",
            CommandName::Init => "init",
            CommandName::Close => "close",
            CommandName::GetIdentifier => "get_bbid",
            CommandName::ListFiles => "list_files",
            CommandName::DumpNand => "dump_nand",
            CommandName::DumpFs => "dump_fs",
            CommandName::ReadFile => "read_file",
            CommandName::SetIndicator => "set_led",
        }
    }
}

impl fmt::Display for CommandName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CommandName {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CommandName::ALL
            .iter()
            .copied()
            .find(|name| name.as_str() == s)
            .ok_or_else(|| BridgeError::Validation(format!("Unknown command: {}", s)))
    }
}

/// A single outbound command
///
/// Built once per client request and consumed by exactly one exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    name: CommandName,
    params: BTreeMap<String, String>,
}

impl Command {
    /// Create a command without parameters
    pub fn new(name: CommandName) -> Self {
        Self {
            name,
            params: BTreeMap::new(),
        }
    }

    /// Read one file from the device
    pub fn read_file(filename: impl Into<String>) -> Self {
        Self::new(CommandName::ReadFile).with_param("filename", filename)
    }

    /// Set the device-side indicator
    pub fn set_indicator(value: impl Into<String>) -> Self {
        Self::new(CommandName::SetIndicator).with_param("value", value)
    }

    /// Attach a named parameter
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn name(&self) -> CommandName {
        self.name
    }

    /// Look up a parameter by name
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    pub fn params(&self) -> &BTreeMap<String, String> {
        &self.params
    }
}

/// Serializes as a flat object: `{"cmd": <name>, <param>: <value>, ...}`
impl Serialize for Command {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("cmd", self.name.as_str())?;
        // `cmd` is reserved for the name
        for (key, value) in self.params.iter().filter(|(key, _)| key.as_str() != "cmd") {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}
