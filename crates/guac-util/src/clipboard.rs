//! Clipboard buffering shared by protocol plugins.
//!
//! Grounded directly on `examples/common/clipboard.c` /
//! `common/clipboard.h`: a fixed-capacity buffer tagged with a mimetype,
//! reset whenever a new clipboard transfer begins and appended to as
//! chunks arrive, with appends silently truncated once the buffer fills
//! (mirroring the original's `remaining` clamp rather than growing
//! unboundedly).

/// Chunk size used when splitting clipboard contents into `blob`
/// instructions for broadcast to connected users.
pub const BLOCK_SIZE: usize = 4096;

/// A capacity-bounded clipboard buffer.
pub struct Clipboard {
    mimetype: String,
    buffer: Vec<u8>,
    capacity: usize,
}

impl Clipboard {
    /// Allocates a clipboard that holds at most `capacity` bytes.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self { mimetype: String::new(), buffer: Vec::new(), capacity }
    }

    /// Clears any buffered content and records `mimetype` for the data
    /// that follows.
    pub fn reset(&mut self, mimetype: &str) {
        self.buffer.clear();
        self.mimetype = mimetype.to_string();
    }

    /// Appends `data`, truncated to whatever capacity remains.
    pub fn append(&mut self, data: &[u8]) {
        let remaining = self.capacity.saturating_sub(self.buffer.len());
        let take = remaining.min(data.len());
        self.buffer.extend_from_slice(&data[..take]);
    }

    /// The mimetype set by the last [`Clipboard::reset`].
    #[must_use]
    pub fn mimetype(&self) -> &str {
        &self.mimetype
    }

    /// The buffered bytes.
    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.buffer
    }

    /// Splits the buffered contents into [`BLOCK_SIZE`]-sized chunks, in
    /// the order a `blob` stream would send them.
    pub fn chunks(&self) -> impl Iterator<Item = &[u8]> {
        self.buffer.chunks(BLOCK_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_truncates_once_capacity_is_reached() {
        let mut clip = Clipboard::new(4);
        clip.reset("text/plain");
        clip.append(b"hello");
        assert_eq!(clip.data(), b"hell");
    }

    #[test]
    fn reset_clears_prior_contents_and_mimetype() {
        let mut clip = Clipboard::new(16);
        clip.reset("text/plain");
        clip.append(b"old");
        clip.reset("text/html");
        assert_eq!(clip.data(), b"");
        assert_eq!(clip.mimetype(), "text/html");
    }

    #[test]
    fn chunks_split_at_block_size() {
        let mut clip = Clipboard::new(BLOCK_SIZE * 2 + 10);
        clip.reset("text/plain");
        clip.append(&vec![b'x'; BLOCK_SIZE * 2 + 10]);
        let chunks: Vec<_> = clip.chunks().collect();
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].len(), BLOCK_SIZE);
        assert_eq!(chunks[1].len(), BLOCK_SIZE);
        assert_eq!(chunks[2].len(), 10);
    }
}
