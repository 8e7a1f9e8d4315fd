//! Log level parsing for the `-L` flag and the `tracing-subscriber` wiring
//! built on top of it.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

mod level;
mod subscriber;

pub use level::{LogLevel, ParseLogLevelError};
pub use subscriber::init;
