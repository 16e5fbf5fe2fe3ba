//! Application state shared across the consumer, processor, and HTTP API
//! (teacher's `AppState`/`App` composition-root pattern).

use std::sync::Arc;

use crate::config::{AppConfig, WorldConfig};
use crate::infrastructure::bus::EventBusPort;
use crate::infrastructure::command_channel::CommandChannel;
use crate::infrastructure::plugin_client::PluginClient;
use crate::infrastructure::store::CatalogueStore;

#[derive(Clone)]
pub struct AppState {
    pub store: CatalogueStore,
    pub bus: Arc<dyn EventBusPort>,
    pub command_channel: Arc<CommandChannel>,
    pub plugin: PluginClient,
    pub world: WorldConfig,
    pub bluemap_web_url: String,
}

impl AppState {
    pub async fn new(config: &AppConfig, bus: Arc<dyn EventBusPort>) -> anyhow::Result<Self> {
        let store = CatalogueStore::connect(&config.store_connection_string).await?;
        let command_channel = Arc::new(CommandChannel::new(
            config.rcon.host.clone(),
            config.rcon.port,
            config.rcon.password.clone(),
            config.rcon.command_delay(),
        ));
        let plugin = PluginClient::new(config.plugin_base_url.clone());
        Ok(Self {
            store,
            bus,
            command_channel,
            plugin,
            world: config.world.clone(),
            bluemap_web_url: config.bluemap_web_url.clone(),
        })
    }
}
