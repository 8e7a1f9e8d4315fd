//! Small, shared utilities that don't belong to any one protocol layer: the
//! error status taxonomy and per-task error slot, Wake-on-LAN, clipboard
//! buffering, and UTF-8-safe string helpers.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

mod clipboard;
mod error_slot;
mod status;
mod strings;
mod wol;

pub use clipboard::{BLOCK_SIZE, Clipboard};
pub use error_slot::{last_error, set_error, with_error_slot};
pub use status::GuacStatus;
pub use strings::{count_occurrences, join, split, truncate_utf8_safe};
pub use wol::{DEFAULT_PORT, MacAddress, PACKET_SIZE, ParseMacError, magic_packet, wake};
