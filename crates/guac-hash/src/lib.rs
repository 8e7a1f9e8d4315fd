//! Pixel surface comparison, a 24-bit rolling fingerprint, and a palette
//! builder used by the image cache to decide when a rendered bitmap has
//! already been sent to a client.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

mod hash;
mod palette;
mod surface;

pub use hash::{fold24, hash_pixels, hash_surface};
pub use palette::Palette;
pub use surface::{Surface, surfaces_equal};
