//! Nested socket: multiplexes a sub-channel's instruction stream onto a
//! parent sink as `nest,<index>,<payload>` instructions.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::SinkError;
use crate::sink::InstructionSink;

/// Maximum payload size per `nest` instruction, chosen so a single
/// multiplexed chunk never forces an oversized write on the parent.
const MAX_CHUNK_BYTES: usize = 8192;

/// A sink that relays every instruction written to it onto a parent sink,
/// wrapped in `nest,<index>,<payload>` and split into UTF-8-safe chunks no
/// larger than [`MAX_CHUNK_BYTES`].
pub struct NestedSink {
    parent: Arc<dyn InstructionSink>,
    index: u32,
}

impl NestedSink {
    /// Wraps `parent`; every write on this sink is multiplexed under
    /// `index`, which the client associates with a sub-channel via its own
    /// protocol-specific handshake (the core only relays bytes).
    #[must_use]
    pub fn new(parent: Arc<dyn InstructionSink>, index: u32) -> Self {
        Self { parent, index }
    }
}

#[async_trait]
impl InstructionSink for NestedSink {
    async fn write_instruction(&self, opcode: &str, args: &[&str]) -> Result<(), SinkError> {
        let payload = guac_codec::encode(opcode, args);
        let payload = std::str::from_utf8(&payload)
            .expect("instruction encoding is always valid UTF-8");

        let index = self.index.to_string();
        for chunk in chunk_utf8_safe(payload, MAX_CHUNK_BYTES) {
            self.parent.write_instruction("nest", &[&index, chunk]).await?;
        }
        Ok(())
    }

    async fn flush(&self) -> Result<(), SinkError> {
        self.parent.flush().await
    }
}

/// Splits `text` into chunks of at most `max_bytes` bytes, never cutting a
/// multi-byte codepoint in half.
fn chunk_utf8_safe(text: &str, max_bytes: usize) -> Vec<&str> {
    let mut chunks = Vec::new();
    let mut rest = text;
    while !rest.is_empty() {
        if rest.len() <= max_bytes {
            chunks.push(rest);
            break;
        }
        let mut split_at = max_bytes;
        while !rest.is_char_boundary(split_at) {
            split_at -= 1;
        }
        let (head, tail) = rest.split_at(split_at);
        chunks.push(head);
        rest = tail;
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::Mutex;

    struct RecordingSink {
        writes: Mutex<Vec<(String, Vec<String>)>>,
    }

    #[async_trait]
    impl InstructionSink for RecordingSink {
        async fn write_instruction(&self, opcode: &str, args: &[&str]) -> Result<(), SinkError> {
            self.writes
                .lock()
                .await
                .push((opcode.to_string(), args.iter().map(|s| (*s).to_string()).collect()));
            Ok(())
        }

        async fn flush(&self) -> Result<(), SinkError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn small_payload_is_a_single_nest_instruction() {
        let parent = Arc::new(RecordingSink { writes: Mutex::new(Vec::new()) });
        let nested = NestedSink::new(parent.clone(), 3);
        nested.write_instruction("blob", &["hello"]).await.unwrap();

        let writes = parent.writes.lock().await;
        assert_eq!(writes.len(), 1);
        assert_eq!(writes[0].0, "nest");
        assert_eq!(writes[0].1[0], "3");
    }

    #[tokio::test]
    async fn large_payload_splits_into_multiple_nest_chunks() {
        let parent = Arc::new(RecordingSink { writes: Mutex::new(Vec::new()) });
        let nested = NestedSink::new(parent.clone(), 0);
        let big = "x".repeat(20_000);
        nested.write_instruction("blob", &[&big]).await.unwrap();

        let writes = parent.writes.lock().await;
        assert!(writes.len() > 1);
        for (opcode, args) in writes.iter() {
            assert_eq!(opcode, "nest");
            assert!(args[1].len() <= MAX_CHUNK_BYTES);
        }
    }

    #[test]
    fn chunking_never_splits_a_codepoint() {
        let text: String = std::iter::repeat('\u{72AC}').take(5000).collect();
        for chunk in chunk_utf8_safe(&text, 8192) {
            assert!(chunk.is_char_boundary(chunk.len()));
            assert!(chunk.chars().all(|c| c == '\u{72AC}'));
        }
    }
}
