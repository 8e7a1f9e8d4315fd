//! The rendering socket: a buffered, typed-opcode sink sitting between a
//! protocol plugin and the wire, with nested-channel multiplexing, tee
//! recording, and the 24-bit-hash image cache that avoids re-sending
//! pixels the client already has.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

mod cache;
mod error;
mod layer;
mod nested;
mod recording;
mod sink;
mod socket;
mod tee;

pub use cache::ImageCache;
pub use error::SinkError;
pub use layer::LayerId;
pub use nested::NestedSink;
pub use recording::{RecordingError, RecordingFile};
pub use sink::{DynSink, InstructionSink};
pub use guac_util::GuacStatus;
pub use socket::{CompositeMode, RenderSocket};
pub use tee::TeeSink;
