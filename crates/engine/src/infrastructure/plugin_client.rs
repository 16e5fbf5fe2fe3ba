//! HTTP client for the in-process plugin's marker/lectern endpoints (§6).
//! Every call here is best-effort from the worker's point of view: failures
//! are logged and swallowed so they never fail a job (§7 "Transient I/O").
//! Mirrors the teacher's `reqwest`-based Ollama/ComfyUI clients.

use villagemc_shared::plugin::{
    BuildingMarkerUpsert, LecternBookRequest, MarkerArchiveRequest, VillageMarkerUpsert,
};

#[derive(Clone)]
pub struct PluginClient {
    base_url: String,
    http: reqwest::Client,
}

impl PluginClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            http: reqwest::Client::new(),
        }
    }

    async fn post_best_effort<T: serde::Serialize>(&self, path: &str, body: &T) {
        let url = format!("{}{path}", self.base_url);
        match self.http.post(&url).json(body).send().await {
            Ok(resp) if !resp.status().is_success() => {
                tracing::warn!(%url, status = %resp.status(), "plugin call returned non-success status");
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(%url, error = %e, "plugin call failed, dropping (best-effort)");
            }
        }
    }

    pub async fn upsert_village_marker(&self, id: &str, label: &str, x: i32, z: i32) {
        self.post_best_effort(
            "/api/markers/village",
            &VillageMarkerUpsert { id: id.to_string(), label: label.to_string(), x, z },
        )
        .await;
    }

    pub async fn upsert_building_marker(&self, id: &str, label: &str, x: i32, z: i32) {
        self.post_best_effort(
            "/api/markers/building",
            &BuildingMarkerUpsert { id: id.to_string(), label: label.to_string(), x, z },
        )
        .await;
    }

    pub async fn archive_village_marker(&self, id: &str) {
        self.post_best_effort("/api/markers/village/archive", &MarkerArchiveRequest { id: id.to_string() })
            .await;
    }

    pub async fn archive_building_marker(&self, id: &str) {
        self.post_best_effort("/api/markers/building/archive", &MarkerArchiveRequest { id: id.to_string() })
            .await;
    }

    pub async fn place_lectern_book(&self, x: i32, y: i32, z: i32, title: &str, author: &str, pages: Vec<String>) {
        self.post_best_effort(
            "/plugin/lectern",
            &LecternBookRequest { x, y, z, title: title.to_string(), author: author.to_string(), pages },
        )
        .await;
    }
}
