#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `guac-codec` implements the Guacamole instruction wire format: a
//! length-prefixed, UTF-8, text-framed instruction stream where the prefix
//! counts Unicode codepoints rather than bytes.
//!
//! # Design
//!
//! [`InstructionParser`] is a streaming state machine — it accepts byte
//! slices in any chunking and never assumes a whole instruction arrives in
//! one read. [`InstructionReader`] layers a deadline and transport read loop
//! on top of it. [`InstructionWriter`] does the inverse: it encodes an
//! opcode/argv pair and serializes concurrent writers through a mutex so
//! instructions are never interleaved on the wire.
//!
//! # Invariants
//!
//! - The declared codepoint count of every encoded element equals
//!   [`unicode::strlen_cp`] of its string.
//! - `decode(encode(op, argv)) == (op, argv)` for any argv, including
//!   zero-length strings.
//! - A timeout is always fatal; the reader never retries internally.

/// Error types shared by the parser, reader, and writer.
pub mod error;
/// The `Instruction` value type and wire encoding.
pub mod instruction;
/// Streaming instruction parser state machine.
pub mod parser;
/// Timeout-aware instruction reader.
pub mod reader;
/// UTF-8 lead-byte classification and codepoint counting.
pub mod unicode;
/// Buffered, mutex-serialized instruction writer.
pub mod writer;

pub use error::{ParseError, ReadError, WriteError};
pub use instruction::{encode, Instruction};
pub use parser::{InstructionParser, ParserState};
pub use reader::InstructionReader;
pub use writer::InstructionWriter;

/// Deadline used by `guac-ioengine`'s input task for every
/// `read_instruction` call (15 seconds, per the wire protocol's liveness
/// contract).
pub const USEC_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(15);
