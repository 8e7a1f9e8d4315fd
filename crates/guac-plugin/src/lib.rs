//! Protocol plugin contract and registry.
//!
//! A `guacd` protocol plugin (RDP, VNC, SSH, Kubernetes, ...) is, in the
//! upstream C daemon, a shared object `dlopen`-ed by name and expected to
//! export a `guac_client_init` symbol plus an argument schema. Those
//! concrete protocols are out of scope here; what this crate carries
//! forward is the *contract* between the daemon and a plugin: a
//! [`Protocol`] trait object registered by name in a [`Registry`], looked
//! up at handshake time, and handed the connection's [`guac_client::Client`]
//! to initialize.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

mod error;
mod protocol;
mod registry;

pub use error::PluginError;
pub use protocol::Protocol;
pub use registry::Registry;
