//! Tee sink: duplicates every instruction written to a primary sink onto a
//! recording file, byte for byte.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::SinkError;
use crate::recording::RecordingFile;
use crate::sink::InstructionSink;

/// Wraps a primary sink so every write is also appended, as raw encoded
/// bytes, to a [`RecordingFile`].
pub struct TeeSink<S> {
    primary: Arc<S>,
    recording: Arc<RecordingFile>,
}

impl<S> TeeSink<S> {
    /// Builds a tee over `primary` and `recording`.
    #[must_use]
    pub fn new(primary: Arc<S>, recording: Arc<RecordingFile>) -> Self {
        Self { primary, recording }
    }
}

#[async_trait]
impl<S: InstructionSink> InstructionSink for TeeSink<S> {
    async fn write_instruction(&self, opcode: &str, args: &[&str]) -> Result<(), SinkError> {
        let bytes = guac_codec::encode(opcode, args);
        self.recording
            .append(&bytes)
            .await
            .map_err(|e| SinkError::Io(std::io::Error::other(e.to_string())))?;
        self.primary.write_instruction(opcode, args).await
    }

    async fn flush(&self) -> Result<(), SinkError> {
        self.recording
            .flush()
            .await
            .map_err(|e| SinkError::Io(std::io::Error::other(e.to_string())))?;
        self.primary.flush().await
    }
}
