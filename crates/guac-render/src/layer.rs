//! Layer and buffer identifiers.
//!
//! Grounded on `examples/original_source/src/libguac/tests/client/buffer_pool.c`
//! and `libguac/tests/client/layer_pool.c`: layers and buffers share one
//! index space on the wire, but are drawn from independent pools. A visible
//! layer's index is non-negative (0 is the default/root layer); an
//! off-screen buffer's index is negative, with buffer pool slot `n`
//! (0-based) encoded as `-n - 1`.

use std::fmt;

/// A layer or buffer identifier as written on the wire.
///
/// Construct with [`LayerId::layer`] or [`LayerId::buffer`]; the
/// `Display` impl renders the decimal form `send_*` helpers embed directly
/// into instruction arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LayerId(i32);

impl LayerId {
    /// The default, always-visible layer every client starts with.
    pub const DEFAULT: Self = Self(0);

    /// A visible layer allocated from the layer pool. `index` must be
    /// non-negative.
    #[must_use]
    pub fn layer(index: i64) -> Self {
        assert!(index >= 0, "layer index must be non-negative, got {index}");
        Self(i32::try_from(index).expect("layer index out of range"))
    }

    /// An off-screen buffer allocated from the buffer pool. `pool_slot` is
    /// the 0-based index handed out by [`guac_idpool::Pool`].
    #[must_use]
    pub fn buffer(pool_slot: i64) -> Self {
        assert!(pool_slot >= 0, "buffer pool slot must be non-negative, got {pool_slot}");
        let slot = i32::try_from(pool_slot).expect("buffer pool slot out of range");
        Self(-slot - 1)
    }

    /// True if this identifies an off-screen buffer rather than a visible
    /// layer.
    #[must_use]
    pub const fn is_buffer(self) -> bool {
        self.0 < 0
    }

    /// The raw wire value.
    #[must_use]
    pub const fn raw(self) -> i32 {
        self.0
    }
}

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
