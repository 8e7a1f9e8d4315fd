//! Buffered, mutex-serialized instruction writer.

use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;

use crate::error::WriteError;
use crate::instruction::encode;

/// Coalescing threshold: buffered bytes beyond this are flushed eagerly
/// rather than left to accumulate indefinitely.
const COALESCE_THRESHOLD: usize = 8192;

struct Buffered<W> {
    writer: W,
    pending: Vec<u8>,
}

/// Serializes writes of whole instructions to an underlying `AsyncWrite`.
///
/// Holding the mutex for the full duration of a `write_instruction` call
/// guarantees no two instructions ever interleave on the wire, even when
/// called concurrently from multiple tasks (the input task's handler
/// responses and the output task's frame pushes share one writer).
pub struct InstructionWriter<W> {
    inner: Mutex<Buffered<W>>,
}

impl<W: AsyncWrite + Unpin> InstructionWriter<W> {
    /// Wraps `inner`, ready to accept instruction writes.
    pub fn new(inner: W) -> Self {
        Self { inner: Mutex::new(Buffered { writer: inner, pending: Vec::new() }) }
    }

    /// Encodes `opcode`/`args` and appends them to the write buffer,
    /// flushing to the transport once the buffer crosses
    /// [`COALESCE_THRESHOLD`].
    pub async fn write_instruction(&self, opcode: &str, args: &[&str]) -> Result<(), WriteError> {
        let bytes = encode(opcode, args);
        let mut guard = self.inner.lock().await;
        guard.pending.extend_from_slice(&bytes);
        if guard.pending.len() >= COALESCE_THRESHOLD {
            flush_locked(&mut guard).await?;
        }
        Ok(())
    }

    /// Forces any buffered bytes out to the transport.
    pub async fn flush(&self) -> Result<(), WriteError> {
        let mut guard = self.inner.lock().await;
        flush_locked(&mut guard).await
    }
}

async fn flush_locked<W: AsyncWrite + Unpin>(guard: &mut Buffered<W>) -> Result<(), WriteError> {
    if !guard.pending.is_empty() {
        guard.writer.write_all(&guard.pending).await.map_err(WriteError::Io)?;
        guard.pending.clear();
    }
    guard.writer.flush().await.map_err(WriteError::Io)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn write_then_flush_produces_well_formed_bytes() {
        let mut out = Vec::new();
        {
            let writer = InstructionWriter::new(&mut out);
            writer.write_instruction("sync", &["123"]).await.unwrap();
            writer.flush().await.unwrap();
        }
        assert_eq!(out, b"4.sync,3.123;");
    }

    #[tokio::test]
    async fn concurrent_writes_never_interleave_bytes() {
        let buf = tokio::io::duplex(1 << 20);
        let (mut rx, tx) = buf;
        let writer = Arc::new(InstructionWriter::new(tx));

        let mut tasks = Vec::new();
        for i in 0..8 {
            let writer = Arc::clone(&writer);
            tasks.push(tokio::spawn(async move {
                let value = i.to_string();
                writer.write_instruction("sync", &[&value]).await.unwrap();
                writer.flush().await.unwrap();
            }));
        }
        for t in tasks {
            t.await.unwrap();
        }
        drop(writer);

        use tokio::io::AsyncReadExt;
        let mut collected = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            match tokio::time::timeout(std::time::Duration::from_millis(50), rx.read(&mut chunk))
                .await
            {
                Ok(Ok(0)) | Err(_) => break,
                Ok(Ok(n)) => collected.extend_from_slice(&chunk[..n]),
                Ok(Err(e)) => panic!("read error: {e}"),
            }
        }

        let text = String::from_utf8(collected).unwrap();
        let mut parser = crate::parser::InstructionParser::new();
        let mut seen = Vec::new();
        let mut rest = text.as_bytes();
        while !rest.is_empty() {
            let consumed = parser.append(rest).unwrap();
            rest = &rest[consumed..];
            if let Some(instr) = parser.take() {
                seen.push(instr.args[0].clone());
            } else {
                break;
            }
        }
        assert_eq!(seen.len(), 8, "every write must be intact and framed");
    }
}
