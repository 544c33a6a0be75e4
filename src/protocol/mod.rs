//! Protocol Module
//!
//! Defines the wire protocol between the bridge and the device-control
//! process.
//!
//! ## Protocol Format
//!
//! One JSON object in, one JSON object out, per connection.
//!
//! ### Commands (`cmd` field)
//! - `ping`, `status`, `init`, `close`
//! - `get_bbid`, `list_files`, `dump_nand`, `dump_fs`
//! - `read_file` - `filename` parameter
//! - `set_led`   - `value` parameter
//!
//! ### Reply Fields
//! - `success` (required, bool)
//! - `message` (optional, string)
//! - `data`    (optional, object)

mod command;
mod reply;
mod codec;

pub use command::{Command, CommandName};
pub use reply::Reply;
pub use codec::{decode_frame, decode_reply, encode_command, encode_reply, Frame};
