//! The static protocol registry: `open`, `close`, `init_client`.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use guac_client::Client;

use crate::error::PluginError;
use crate::protocol::Protocol;

/// Looks up protocol plugins by name.
///
/// Empty by construction; the daemon's startup code builds one and calls
/// [`Self::register`] for every protocol it was linked against. There is no
/// process-wide global registry — each daemon instance (and each test) owns
/// its own, which is what [`crate::Protocol`]'s docs mean by "the load
/// bearing contract plugins out-of-tree would implement and link in".
#[derive(Default)]
pub struct Registry {
    plugins: Mutex<HashMap<String, Arc<dyn Protocol>>>,
}

impl Registry {
    /// Builds an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `protocol` under its own [`Protocol::name`].
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::InvalidName`] if the name contains a `,` or
    /// `;` (a client could never select it, since those are the wire's own
    /// instruction-framing characters), or [`PluginError::AlreadyRegistered`]
    /// if a plugin is already registered under that name.
    pub fn register(&self, protocol: Arc<dyn Protocol>) -> Result<(), PluginError> {
        let name = protocol.name().to_owned();
        if guac_util::split(&name, ',').len() > 1 || guac_util::split(&name, ';').len() > 1 {
            return Err(PluginError::InvalidName(name));
        }

        let mut plugins = self.plugins.lock().unwrap();
        if plugins.contains_key(&name) {
            return Err(PluginError::AlreadyRegistered(name));
        }
        plugins.insert(name, protocol);
        Ok(())
    }

    /// Removes the plugin registered under `name`, if any.
    pub fn close(&self, name: &str) {
        self.plugins.lock().unwrap().remove(name);
    }

    /// Resolves the plugin registered under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::NotFound`] if no plugin is registered under
    /// that name.
    pub fn open(&self, name: &str) -> Result<Arc<dyn Protocol>, PluginError> {
        self.plugins
            .lock()
            .unwrap()
            .get(name)
            .cloned()
            .ok_or_else(|| PluginError::NotFound(name.to_owned()))
    }

    /// Resolves `name` and immediately initializes `client` with it; the
    /// common-case helper the handshake's `connect` handler reaches for.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::NotFound`] if no plugin is registered under
    /// `name`, or whatever [`Protocol::init_client`] returns.
    pub async fn init_client(
        &self,
        name: &str,
        client: &Client,
        argv: &[String],
    ) -> Result<(), PluginError> {
        let protocol = self.open(name)?;
        protocol.init_client(client, argv).await
    }

    /// Every currently registered protocol name, for advertising a select
    /// list or logging.
    #[must_use]
    pub fn protocol_names(&self) -> Vec<String> {
        self.plugins.lock().unwrap().keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;

    struct Echo {
        schema: Vec<String>,
    }

    #[async_trait]
    impl Protocol for Echo {
        fn name(&self) -> &str {
            "echo"
        }

        fn argument_schema(&self) -> &[String] {
            &self.schema
        }

        async fn init_client(&self, client: &Client, _argv: &[String]) -> Result<(), PluginError> {
            client.set_handlers(Arc::new(guac_client::NoopHandlers));
            Ok(())
        }
    }

    fn echo_plugin() -> Arc<dyn Protocol> {
        Arc::new(Echo { schema: vec!["hostname".into(), "port".into()] })
    }

    #[test]
    fn register_then_open_round_trips() {
        let registry = Registry::new();
        registry.register(echo_plugin()).unwrap();
        let plugin = registry.open("echo").unwrap();
        assert_eq!(plugin.argument_schema(), ["hostname", "port"]);
    }

    #[test]
    fn opening_unknown_protocol_is_not_found() {
        let registry = Registry::new();
        assert!(matches!(registry.open("missing"), Err(PluginError::NotFound(_))));
    }

    #[test]
    fn registering_a_name_with_a_wire_delimiter_is_rejected() {
        struct CommaProtocol;

        #[async_trait]
        impl Protocol for CommaProtocol {
            fn name(&self) -> &str {
                "vnc,rdp"
            }
            fn argument_schema(&self) -> &[String] {
                &[]
            }
            async fn init_client(&self, _client: &Client, _argv: &[String]) -> Result<(), PluginError> {
                Ok(())
            }
        }

        let registry = Registry::new();
        let err = registry.register(Arc::new(CommaProtocol)).unwrap_err();
        assert!(matches!(err, PluginError::InvalidName(name) if name == "vnc,rdp"));
    }

    #[test]
    fn registering_the_same_name_twice_fails() {
        let registry = Registry::new();
        registry.register(echo_plugin()).unwrap();
        assert!(matches!(registry.register(echo_plugin()), Err(PluginError::AlreadyRegistered(_))));
    }

    #[test]
    fn closing_a_protocol_removes_it() {
        let registry = Registry::new();
        registry.register(echo_plugin()).unwrap();
        registry.close("echo");
        assert!(registry.open("echo").is_err());
    }

    #[tokio::test]
    async fn init_client_installs_handlers() {
        use guac_codec::InstructionWriter;
        use guac_render::{DynSink, RenderSocket};

        let registry = Registry::new();
        registry.register(echo_plugin()).unwrap();

        let sink: DynSink = Arc::new(InstructionWriter::new(Vec::new()));
        let socket = RenderSocket::new(sink);
        let client = Client::new("conn-1", socket);

        registry.init_client("echo", &client, &["host".into(), "3389".into()]).await.unwrap();
    }
}
