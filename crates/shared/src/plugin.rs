//! Payloads sent to the in-process plugin's HTTP endpoints (§6). These calls
//! are always best-effort from the worker's point of view: failures are
//! logged and swallowed, never fail the job.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VillageMarkerUpsert {
    pub id: String,
    pub label: String,
    pub x: i32,
    pub z: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildingMarkerUpsert {
    pub id: String,
    pub label: String,
    pub x: i32,
    pub z: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkerArchiveRequest {
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LecternBookRequest {
    pub x: i32,
    pub y: i32,
    pub z: i32,
    pub title: String,
    pub author: String,
    pub pages: Vec<String>,
}
