use webmap_shared::{ChunkPos, GridRange, MAX_SCALE, MIN_SCALE, MapSource, select_scale};

use crate::cache::{ChunkMetaCache, ImageCache, ImageLoader, RegionFetcher};
use crate::config::MapConfig;
use crate::surface::{Rect, Surface};
use crate::viewport::WorldRect;

/// How each visible tile cell was filled in one frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompositeStats {
    pub cells: usize,
    pub exact: usize,
    pub coarser: usize,
    /// Cells with at least one of their four finer quadrants drawn.
    pub finer: usize,
    pub blank: usize,
}

/// Draw the tile layer for `rect` at `zoom` world units per pixel.
///
/// Each cell asks for its exact-resolution tile (loading it on a miss). Until that is ready
/// the cell borrows a quadrant of the half-resolution parent, or failing that whichever of
/// its four double-resolution children are ready. Fallback probes never start loads. Cells
/// are overdrawn by `zoom` world units to hide seams.
pub fn draw_tiles<S, L>(
    surface: &mut S,
    tiles: &ImageCache<L>,
    source: &MapSource,
    rect: WorldRect,
    zoom: f64,
    config: &MapConfig,
) -> CompositeStats
where
    S: Surface,
    L: ImageLoader<Image = S::Image>,
{
    let scale = select_scale(zoom);
    let tile_size = config.tile_resolution * scale as i64;
    let size = tile_size as f64;
    let margin = zoom;
    let range = GridRange::covering(rect.min_x, rect.min_y, rect.max_x, rect.max_y, size)
        .bounded(config.max_tiles);

    // Half- and double-resolution neighbours; none past the ends of the pyramid.
    let coarse_scale = (scale < MAX_SCALE).then(|| scale * 2);
    let fine_scale = (scale > MIN_SCALE).then(|| scale / 2);
    let half = size / 2.0;

    let mut stats = CompositeStats::default();
    for (x, y) in range.cells() {
        stats.cells += 1;
        let dst = Rect::new(x as f64 * size, y as f64 * size, size + margin, size + margin);

        let exact = source.tile(x, y, tile_size, scale);
        if let Some(image) = tiles.load_ready(&exact.path()) {
            surface.draw_image(&image, dst);
            stats.exact += 1;
            continue;
        }

        if let Some(coarse_scale) = coarse_scale {
            let (px, py) = (x.div_euclid(2), y.div_euclid(2));
            let parent = source.tile(px, py, tile_size * 2, coarse_scale);
            if let Some(image) = tiles.probe_ready(&parent.path()) {
                let quadrant = parent.pixel_size() / 2.0;
                let src = Rect::new(
                    (x - px * 2) as f64 * quadrant,
                    (y - py * 2) as f64 * quadrant,
                    quadrant,
                    quadrant,
                );
                surface.draw_image_region(&image, src, dst);
                stats.coarser += 1;
                continue;
            }
        }

        let mut drew_child = false;
        if let Some(fine_scale) = fine_scale {
            for cx in 0..2 {
                for cy in 0..2 {
                    let child = source.tile(x * 2 + cx, y * 2 + cy, tile_size / 2, fine_scale);
                    if let Some(image) = tiles.probe_ready(&child.path()) {
                        let child_dst = Rect::new(
                            child.x as f64 * half,
                            child.y as f64 * half,
                            half + margin,
                            half + margin,
                        );
                        surface.draw_image(&image, child_dst);
                        drew_child = true;
                    }
                }
            }
        }
        if drew_child {
            stats.finer += 1;
        } else {
            stats.blank += 1;
        }
    }
    stats
}

/// Fill every claimed chunk in `rect`. Only runs when zoomed in past
/// `config.chunk_overlay_max_zoom`; returns the number of filled chunks.
pub fn draw_claims<S, F>(
    surface: &mut S,
    chunks: &ChunkMetaCache<F>,
    source: &MapSource,
    rect: WorldRect,
    zoom: f64,
    config: &MapConfig,
) -> usize
where
    S: Surface,
    F: RegionFetcher,
{
    if !(zoom < config.chunk_overlay_max_zoom) {
        return 0;
    }
    let size = config.chunk_size as f64;
    let range = GridRange::covering(rect.min_x, rect.min_y, rect.max_x, rect.max_y, size)
        .bounded(config.max_chunk_cells);

    let mut filled = 0;
    for (x, z) in range.cells() {
        if chunks.lookup(source, ChunkPos::new(x, z)).is_claimed() {
            surface.fill_rect(
                Rect::new(x as f64 * size, z as f64 * size, size + zoom, size + zoom),
                config.claimed_fill,
            );
            filled += 1;
        }
    }
    filled
}
