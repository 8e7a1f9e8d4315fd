//! The contract a protocol plugin (RDP, VNC, SSH, ...) implements.

use std::net::IpAddr;

use async_trait::async_trait;

use guac_client::Client;
use guac_util::MacAddress;

use crate::error::PluginError;

/// A protocol plugin: an argument schema the handshake's `args` instruction
/// advertises to the client, and an init function that wires up a
/// [`Client`]'s handler table and plugin-private state once the client has
/// sent back a matching `connect` instruction.
///
/// Grounded on `examples/original_source/libguac/include/plugin.h`'s
/// `guac_client_init` entry point and the `GUAC_ARGS` symbol each `.so`
/// exports; see the crate-level docs for why this is a static trait-object
/// registry rather than dynamic loading.
#[async_trait]
pub trait Protocol: Send + Sync {
    /// The protocol name clients select with `select,<name>`.
    fn name(&self) -> &str;

    /// Ordered argument names sent to the client in the handshake's `args`
    /// instruction, and expected back (in the same order) in `connect`.
    fn argument_schema(&self) -> &[String];

    /// A Wake-on-LAN target to wake before [`Self::init_client`] runs,
    /// derived from the `connect` arguments in `argv`.
    ///
    /// Mirrors the upstream convention (e.g. the RDP/VNC protocols'
    /// `wol-send-packet`/`wol-mac-addr`/`wol-broadcast-addr` arguments) of
    /// each protocol deciding for itself, from its own argument schema,
    /// whether and where to send a wake packet; the default declines.
    fn wake_on_lan_target(&self, _argv: &[String]) -> Option<(MacAddress, IpAddr)> {
        None
    }

    /// Initializes `client` for this protocol using the values the client
    /// sent back in `connect`, in the order named by [`Self::argument_schema`].
    ///
    /// On success the plugin must have installed a handler table via
    /// [`Client::set_handlers`] (even if it is the default no-op table) and
    /// any plugin-private state via [`Client::set_plugin_data`].
    async fn init_client(&self, client: &Client, argv: &[String]) -> Result<(), PluginError>;
}
