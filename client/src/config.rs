use webmap_shared::{
    CHUNK_SIZE, DEFAULT_AVATAR_SERVICE, DEFAULT_AVATAR_SKIN, TILE_RESOLUTION,
};

use crate::surface::Shadow;

/// Rendering, input and polling knobs. `Default` holds the production values.
#[derive(Debug, Clone)]
pub struct MapConfig {
    /// World units per tile side at scale 1.
    pub tile_resolution: i64,
    pub max_tiles: i64,
    pub chunk_size: i64,
    pub max_chunk_cells: i64,
    /// Chunk ownership is drawn only below this zoom factor.
    pub chunk_overlay_max_zoom: f64,
    /// Per-click zoom multiplier.
    pub zoom_step: f64,
    pub background: &'static str,
    pub claimed_fill: &'static str,
    pub avatar_service: String,
    pub avatar_size: u32,
    pub avatar_default_skin: String,
    pub avatar_shadow: Shadow,
    pub meta_poll_ms: u32,
    /// Window size minus these gives the canvas size.
    pub chrome_width: f64,
    pub chrome_height: f64,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            tile_resolution: TILE_RESOLUTION,
            max_tiles: 100,
            chunk_size: CHUNK_SIZE,
            max_chunk_cells: 256,
            chunk_overlay_max_zoom: 4.0,
            zoom_step: 1.1,
            background: "#d5be95",
            claimed_fill: "red",
            avatar_service: DEFAULT_AVATAR_SERVICE.to_string(),
            avatar_size: 32,
            avatar_default_skin: DEFAULT_AVATAR_SKIN.to_string(),
            avatar_shadow: Shadow {
                offset_x: 2.0,
                offset_y: 2.0,
                blur: 12.0,
                color: "black",
            },
            meta_poll_ms: 10_000,
            chrome_width: 20.0,
            chrome_height: 120.0,
        }
    }
}
