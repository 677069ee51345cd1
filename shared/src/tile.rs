use std::fmt;

/// World units covered by one tile side at scale 1.
pub const TILE_RESOLUTION: i64 = 256;
/// World units per chunk side.
pub const CHUNK_SIZE: i64 = 16;
/// Chunks per side of one metadata region.
pub const CHUNKS_PER_REGION: i64 = 16;

pub const MIN_SCALE: u32 = 1;
pub const MAX_SCALE: u32 = 16;

pub const DEFAULT_AVATAR_SERVICE: &str = "https://crafatar.com";
pub const DEFAULT_AVATAR_SKIN: &str = "MHF_Steve";

/// Pick the power-of-two tile resolution for a zoom factor (world units per screen pixel).
///
/// The result is `2^floor(log2(zoom))` clamped to `[MIN_SCALE, MAX_SCALE]`. Degenerate inputs
/// (zero, negative, NaN) resolve to the finest scale.
pub fn select_scale(zoom: f64) -> u32 {
    if zoom.is_nan() || zoom <= 0.0 {
        return MIN_SCALE;
    }
    let max_exp = MAX_SCALE.trailing_zeros() as f64;
    let min_exp = MIN_SCALE.trailing_zeros() as f64;
    let exp = zoom.log2().floor().clamp(min_exp, max_exp);
    1u32 << (exp as u32)
}

/// A server + dimension pair. Every endpoint and cache key is scoped to one.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MapSource {
    pub server: i64,
    pub dimension: String,
}

impl MapSource {
    pub fn new(server: i64, dimension: impl Into<String>) -> Self {
        Self {
            server,
            dimension: dimension.into(),
        }
    }

    pub fn tile(&self, x: i64, y: i64, tile_size: i64, scale: u32) -> TileKey {
        TileKey {
            source: self.clone(),
            x,
            y,
            tile_size,
            scale,
        }
    }

    /// `GET /v1/meta/{server}/{dimension}`
    pub fn dimension_meta_path(&self) -> String {
        format!("/v1/meta/{}/{}", self.server, self.dimension)
    }

    /// `GET /v1/meta/{server}`
    pub fn server_meta_path(&self) -> String {
        format!("/v1/meta/{}", self.server)
    }

    /// `GET /v1/chunk_meta/{server}/{dimension}` for one 16x16-chunk region.
    pub fn chunk_meta_path(&self, region: RegionPos) -> String {
        let (x, z) = region.first_chunk();
        format!(
            "/v1/chunk_meta/{}/{}?x={x}&z={z}&w={CHUNKS_PER_REGION}&h={CHUNKS_PER_REGION}",
            self.server, self.dimension
        )
    }
}

impl fmt::Display for MapSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.server, self.dimension)
    }
}

/// Identifies one fetchable tile image: grid cell `(x, y)` of `tile_size` world units,
/// rendered at resolution multiplier `scale`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TileKey {
    pub source: MapSource,
    pub x: i64,
    pub y: i64,
    pub tile_size: i64,
    pub scale: u32,
}

impl TileKey {
    /// Chunks per tile side.
    pub fn chunk_span(&self) -> i64 {
        (self.tile_size / CHUNK_SIZE).max(1)
    }

    /// Image side length in pixels as served.
    pub fn pixel_size(&self) -> f64 {
        self.tile_size as f64 / self.scale as f64
    }

    /// Canonical request path; doubles as the cache key.
    pub fn path(&self) -> String {
        let span = self.chunk_span();
        format!(
            "/v1/chunk/{}/{}?x={}&z={}&w={span}&h={span}&scale={}",
            self.source.server,
            self.source.dimension,
            self.x * span,
            self.y * span,
            self.scale
        )
    }
}

impl fmt::Display for TileKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

/// A chunk position in chunk units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChunkPos {
    pub x: i64,
    pub z: i64,
}

impl ChunkPos {
    pub fn new(x: i64, z: i64) -> Self {
        Self { x, z }
    }

    pub fn region(self) -> RegionPos {
        RegionPos {
            x: self.x.div_euclid(CHUNKS_PER_REGION),
            z: self.z.div_euclid(CHUNKS_PER_REGION),
        }
    }
}

/// A 16x16-chunk metadata region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RegionPos {
    pub x: i64,
    pub z: i64,
}

impl RegionPos {
    pub fn first_chunk(self) -> (i64, i64) {
        (self.x * CHUNKS_PER_REGION, self.z * CHUNKS_PER_REGION)
    }
}

/// Avatar image URL for a player identifier. Dashes are stripped from the UUID.
pub fn avatar_url(service: &str, uuid: &str, size: u32, default_skin: &str) -> String {
    let id: String = uuid.chars().filter(|c| *c != '-').collect();
    format!(
        "{}/avatars/{id}?size={size}&default={default_skin}&overlay",
        service.trim_end_matches('/')
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scale_is_floor_power_of_two_clamped() {
        assert_eq!(select_scale(0.01), 1);
        assert_eq!(select_scale(1.0), 1);
        assert_eq!(select_scale(1.414), 1);
        assert_eq!(select_scale(1.999), 1);
        assert_eq!(select_scale(2.0), 2);
        assert_eq!(select_scale(3.9), 2);
        assert_eq!(select_scale(4.0), 4);
        assert_eq!(select_scale(15.0), 8);
        assert_eq!(select_scale(16.0), 16);
        assert_eq!(select_scale(1_000_000.0), 16);
        assert_eq!(select_scale(f64::INFINITY), 16);
    }

    #[test]
    fn scale_handles_degenerate_zoom() {
        assert_eq!(select_scale(0.0), 1);
        assert_eq!(select_scale(-3.0), 1);
        assert_eq!(select_scale(f64::NAN), 1);
    }

    #[test]
    fn scale_is_monotonic_and_in_range() {
        let mut previous = 0;
        let mut zoom = 0.001;
        while zoom < 100_000.0 {
            let scale = select_scale(zoom);
            assert!([1, 2, 4, 8, 16].contains(&scale), "zoom {zoom} -> {scale}");
            assert!(scale >= previous, "zoom {zoom} decreased scale");
            previous = scale;
            zoom *= 1.07;
        }
    }

    #[test]
    fn tile_path_uses_chunk_units() {
        let source = MapSource::new(3, "minecraft:overworld");
        let key = source.tile(-2, 5, 512, 2);
        assert_eq!(
            key.path(),
            "/v1/chunk/3/minecraft:overworld?x=-64&z=160&w=32&h=32&scale=2"
        );
        assert_eq!(key.pixel_size(), 256.0);
    }

    #[test]
    fn tile_keys_differ_across_dimensions() {
        let a = MapSource::new(1, "overworld").tile(0, 0, 256, 1);
        let b = MapSource::new(1, "nether").tile(0, 0, 256, 1);
        assert_ne!(a.path(), b.path());
    }

    #[test]
    fn region_of_negative_chunk_floors() {
        assert_eq!(ChunkPos::new(-1, 15).region(), RegionPos { x: -1, z: 0 });
        assert_eq!(ChunkPos::new(16, -16).region(), RegionPos { x: 1, z: -1 });
    }

    #[test]
    fn chunk_meta_path_covers_region() {
        let source = MapSource::new(7, "end");
        let path = source.chunk_meta_path(ChunkPos::new(-3, 40).region());
        assert_eq!(path, "/v1/chunk_meta/7/end?x=-16&z=32&w=16&h=16");
    }

    #[test]
    fn meta_paths() {
        let source = MapSource::new(7, "end");
        assert_eq!(source.dimension_meta_path(), "/v1/meta/7/end");
        assert_eq!(source.server_meta_path(), "/v1/meta/7");
    }

    #[test]
    fn avatar_url_strips_every_dash() {
        let url = avatar_url(
            "https://crafatar.com/",
            "069a79f4-44e9-4726-a5be-fca90e38aaf5",
            32,
            DEFAULT_AVATAR_SKIN,
        );
        assert_eq!(
            url,
            "https://crafatar.com/avatars/069a79f444e94726a5befca90e38aaf5?size=32&default=MHF_Steve&overlay"
        );
    }
}
