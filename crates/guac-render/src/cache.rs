//! Image cache: avoids re-sending pixel data the client was already given
//! in an earlier frame.
//!
//! Per spec §4.2's image pipeline: hash the outgoing rectangle, probe the
//! cache, byte-compare any hash hit against the stored copy (hashes are not
//! cryptographic and can collide), and on a confirmed hit emit a `copy`
//! referencing the cached buffer layer instead of re-sending the image.
//!
//! The cache itself owns no buffer-id pool: the buffer layer a cache miss
//! is stored under is allocated from the client's shared buffer pool (the
//! same pool a plugin draws from for any other off-screen buffer), passed
//! in by the caller.

use std::sync::Mutex;

use guac_hash::{Surface, hash_surface, surfaces_equal};

use crate::layer::LayerId;

struct CachedRect {
    buffer: LayerId,
    width: usize,
    height: usize,
    stride: usize,
    data: Vec<u8>,
}

/// Per-client cache of previously sent rectangles, keyed by rolling hash.
#[derive(Default)]
pub struct ImageCache {
    entries: Mutex<std::collections::HashMap<u32, Vec<CachedRect>>>,
}

impl ImageCache {
    /// Builds an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up `surface` in the cache. Returns the buffer layer already
    /// holding an identical copy, if any.
    #[must_use]
    pub fn probe(&self, surface: &Surface<'_>) -> Option<LayerId> {
        let hash = hash_surface(surface);
        let entries = self.entries.lock().unwrap();
        let candidates = entries.get(&hash)?;
        for candidate in candidates {
            let stored = Surface::new(candidate.width, candidate.height, candidate.stride, &candidate.data);
            if surfaces_equal(&stored, surface) {
                return Some(candidate.buffer);
            }
        }
        None
    }

    /// Records `surface` as now cached under `buffer`.
    pub fn insert(&self, surface: &Surface<'_>, buffer: LayerId) {
        let hash = hash_surface(surface);
        let stride = surface.stride();
        let mut packed = vec![0u8; stride * surface.height()];
        for y in 0..surface.height() {
            for x in 0..surface.width() {
                let pixel = surface.pixel(x, y).to_ne_bytes();
                let offset = y * stride + x * 4;
                packed[offset..offset + 4].copy_from_slice(&pixel);
            }
        }

        let mut entries = self.entries.lock().unwrap();
        entries.entry(hash).or_default().push(CachedRect {
            buffer,
            width: surface.width(),
            height: surface.height(),
            stride,
            data: packed,
        });
    }

    /// Drops every entry referencing `buffer`, e.g. once the buffer layer
    /// has been freed and its index may be reissued for unrelated content.
    pub fn evict_buffer(&self, buffer: LayerId) {
        let mut entries = self.entries.lock().unwrap();
        entries.retain(|_, rects| {
            rects.retain(|rect| rect.buffer != buffer);
            !rects.is_empty()
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn surface(data: &[u8], width: usize, height: usize) -> Surface<'_> {
        Surface::new(width, height, width * 4, data)
    }

    #[test]
    fn miss_then_hit_after_insert() {
        let cache = ImageCache::new();
        let mut data = vec![0u8; 2 * 2 * 4];
        data[0..4].copy_from_slice(&1u32.to_ne_bytes());
        data[4..8].copy_from_slice(&2u32.to_ne_bytes());
        data[8..12].copy_from_slice(&3u32.to_ne_bytes());
        data[12..16].copy_from_slice(&4u32.to_ne_bytes());
        let view = surface(&data, 2, 2);

        assert!(cache.probe(&view).is_none());

        let buffer = LayerId::buffer(0);
        cache.insert(&view, buffer);

        assert_eq!(cache.probe(&view), Some(buffer));
    }

    #[test]
    fn differing_pixels_do_not_hit_despite_hash_bucket_sharing() {
        let cache = ImageCache::new();
        let a = vec![0u8; 4];
        let view_a = surface(&a, 1, 1);
        cache.insert(&view_a, LayerId::buffer(0));

        let mut b = vec![0u8; 4];
        b.copy_from_slice(&9u32.to_ne_bytes());
        let view_b = surface(&b, 1, 1);
        assert!(cache.probe(&view_b).is_none());
    }

    #[test]
    fn evicting_a_buffer_removes_its_entries() {
        let cache = ImageCache::new();
        let data = vec![0u8; 4];
        let view = surface(&data, 1, 1);
        let buffer = LayerId::buffer(0);
        cache.insert(&view, buffer);
        assert!(cache.probe(&view).is_some());

        cache.evict_buffer(buffer);
        assert!(cache.probe(&view).is_none());
    }
}
