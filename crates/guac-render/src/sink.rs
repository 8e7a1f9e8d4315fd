//! The `InstructionSink` trait unifying direct transports, the nested
//! multiplexer, and the tee used for recording.

use async_trait::async_trait;

use crate::error::SinkError;

/// Something an encoded instruction can be written to.
///
/// Implemented by a direct transport writer, [`crate::nested::NestedSink`],
/// and [`crate::tee::TeeSink`], so `send_*` helpers on
/// [`crate::socket::RenderSocket`] work identically whether they are
/// targeting a TCP connection, a sub-channel multiplexed over one, or a
/// sink that also mirrors bytes to a recording file.
#[async_trait]
pub trait InstructionSink: Send + Sync {
    /// Encodes and writes one instruction.
    async fn write_instruction(&self, opcode: &str, args: &[&str]) -> Result<(), SinkError>;

    /// Forces any buffered bytes out.
    async fn flush(&self) -> Result<(), SinkError>;
}

/// A type-erased, shareable sink.
///
/// The handle a [`crate::socket::RenderSocket`] is built on once a
/// connection's concrete transport has been decided (a plain TCP write
/// half, a [`crate::nested::NestedSink`] sub-channel, or a
/// [`crate::tee::TeeSink`] also recording to disk) and erased behind one
/// object-safe type, so downstream crates (the client state, the plugin
/// registry) don't need to be generic over the transport.
pub type DynSink = std::sync::Arc<dyn InstructionSink>;

#[async_trait]
impl<W> InstructionSink for guac_codec::InstructionWriter<W>
where
    W: tokio::io::AsyncWrite + Unpin + Send,
{
    async fn write_instruction(&self, opcode: &str, args: &[&str]) -> Result<(), SinkError> {
        Self::write_instruction(self, opcode, args).await.map_err(Into::into)
    }

    async fn flush(&self) -> Result<(), SinkError> {
        Self::flush(self).await.map_err(Into::into)
    }
}

/// Lets a type-erased `Arc<dyn InstructionSink>` stand in for a concrete
/// sink, so a [`crate::socket::RenderSocket`] (and anything built on top of
/// it, such as a `Client`) can be generic over "some sink" without callers
/// needing to name the concrete transport, nested-channel, or tee type.
#[async_trait]
impl InstructionSink for std::sync::Arc<dyn InstructionSink> {
    async fn write_instruction(&self, opcode: &str, args: &[&str]) -> Result<(), SinkError> {
        self.as_ref().write_instruction(opcode, args).await
    }

    async fn flush(&self) -> Result<(), SinkError> {
        self.as_ref().flush().await
    }
}
