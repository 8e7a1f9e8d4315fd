//! Timeout-aware instruction reader over an async byte transport.

use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt};

use crate::error::ReadError;
use crate::instruction::Instruction;
use crate::parser::InstructionParser;

const READ_CHUNK: usize = 8192;

/// Reads complete [`Instruction`]s off an `AsyncRead` transport, buffering
/// partial reads across calls.
pub struct InstructionReader<R> {
    inner: R,
    parser: InstructionParser,
    buf: Box<[u8; READ_CHUNK]>,
}

impl<R: AsyncRead + Unpin> InstructionReader<R> {
    /// Wraps `inner`, ready to read instructions from it.
    pub fn new(inner: R) -> Self {
        Self { inner, parser: InstructionParser::new(), buf: Box::new([0u8; READ_CHUNK]) }
    }

    /// Reads and returns the next complete instruction, waiting at most
    /// `timeout` for each underlying read to produce bytes.
    ///
    /// A deadline elapsing is always fatal to the connection per the wire
    /// protocol's liveness contract, even if a partial instruction has
    /// already been buffered.
    pub async fn read_instruction(
        &mut self,
        timeout: Duration,
    ) -> Result<Instruction, ReadError> {
        loop {
            if let Some(instr) = self.parser.take() {
                return Ok(instr);
            }

            let n = match tokio::time::timeout(timeout, self.inner.read(&mut self.buf[..])).await
            {
                Err(_elapsed) => return Err(ReadError::Timeout),
                Ok(Err(e)) => return Err(ReadError::Io(e)),
                Ok(Ok(0)) => {
                    return Err(ReadError::Closed { mid_instruction: self.parser.in_progress() });
                }
                Ok(Ok(n)) => n,
            };

            let mut offset = 0;
            while offset < n {
                let consumed =
                    self.parser.append(&self.buf[offset..n]).map_err(ReadError::Protocol)?;
                offset += consumed;
                if self.parser.state() == crate::parser::ParserState::Complete {
                    break;
                }
            }
        }
    }
}
