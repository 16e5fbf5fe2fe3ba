//! Environment-sourced configuration (§6 "Configuration surface").
//!
//! Mirrors the teacher's `AppConfig::from_env()` shape: required keys use
//! `.context(...)`, optional keys fall back via `.unwrap_or_else(...)`.

use anyhow::Context;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct RconConfig {
    pub host: String,
    pub port: u16,
    pub password: String,
    pub command_delay_ms: u64,
}

#[derive(Debug, Clone)]
pub struct WorldConfig {
    pub village_spacing: i32,
    pub base_y: i32,
    pub crossroads_plaza_radius: i32,
    pub crossroads_station_slots: u32,
    pub crossroads_station_radius: i32,
    pub village_station_offset: i32,
    pub fence_radius: i32,
    pub grid_columns: i32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            village_spacing: villagemc_domain::VILLAGE_SPACING,
            base_y: villagemc_domain::BASE_Y,
            crossroads_plaza_radius: 30,
            crossroads_station_slots: villagemc_domain::CROSSROADS_STATION_SLOTS as u32,
            crossroads_station_radius: villagemc_domain::CROSSROADS_STATION_RADIUS,
            village_station_offset: villagemc_domain::VILLAGE_STATION_OFFSET,
            fence_radius: villagemc_domain::FENCE_RADIUS,
            grid_columns: villagemc_domain::GRID_COLUMNS,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub rcon: RconConfig,
    pub plugin_base_url: String,
    pub bluemap_web_url: String,
    pub bus_url: String,
    pub store_connection_string: String,
    pub world: WorldConfig,
    pub server_port: u16,
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let rcon = RconConfig {
            host: env_or("Rcon__Host", "127.0.0.1"),
            port: env_parse_or("Rcon__Port", 25575),
            password: std::env::var("Rcon__Password")
                .context("Rcon__Password is required (§6 configuration surface)")?,
            command_delay_ms: env_parse_or("Rcon__CommandDelayMs", 50),
        };

        let store_connection_string = std::env::var("Store__ConnectionString")
            .context("Store__ConnectionString is required (Postgres catalogue DSN)")?;

        let bus_url = env_or("Bus__Url", "redis://127.0.0.1:6379");
        let plugin_base_url = env_or("Plugin__BaseUrl", "http://127.0.0.1:8123");
        let bluemap_web_url = env_or("BlueMap__WebUrl", "http://127.0.0.1:8100");
        let server_port = env_parse_or("Server__Port", 8080);

        let world = WorldConfig {
            village_spacing: env_parse_or("World__VillageSpacing", villagemc_domain::VILLAGE_SPACING),
            base_y: env_parse_or("World__BaseY", villagemc_domain::BASE_Y),
            crossroads_plaza_radius: env_parse_or("World__CrossroadsPlazaRadius", 30),
            crossroads_station_slots: env_parse_or(
                "World__CrossroadsStationSlots",
                villagemc_domain::CROSSROADS_STATION_SLOTS as u32,
            ),
            crossroads_station_radius: env_parse_or(
                "World__CrossroadsStationRadius",
                villagemc_domain::CROSSROADS_STATION_RADIUS,
            ),
            village_station_offset: env_parse_or(
                "World__VillageStationOffset",
                villagemc_domain::VILLAGE_STATION_OFFSET,
            ),
            fence_radius: env_parse_or("World__FenceRadius", villagemc_domain::FENCE_RADIUS),
            grid_columns: env_parse_or("World__GridColumns", villagemc_domain::GRID_COLUMNS),
        };

        Ok(Self {
            rcon,
            plugin_base_url,
            bluemap_web_url,
            bus_url,
            store_connection_string,
            world,
            server_port,
        })
    }
}

impl RconConfig {
    pub fn command_delay(&self) -> Duration {
        Duration::from_millis(self.command_delay_ms)
    }
}
