use webmap_shared::{MapSource, Player};

use crate::cache::{ChunkMetaCache, ImageCache, ImageLoader, RegionFetcher};
use crate::compositor::{CompositeStats, draw_claims, draw_tiles};
use crate::config::MapConfig;
use crate::overlay::draw_players;
use crate::surface::{Rect, Surface};
use crate::viewport::{Affine, AffineViewport};

/// What one redraw put on screen.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameStats {
    pub zoom: f64,
    pub tiles: CompositeStats,
    pub claims: usize,
    pub players: usize,
}

/// Owns the caches and paints full frames: background, tiles, claimed chunks, players.
pub struct MapRenderer<L: ImageLoader, F: RegionFetcher> {
    config: MapConfig,
    tiles: ImageCache<L>,
    avatars: ImageCache<L>,
    chunks: ChunkMetaCache<F>,
}

impl<L: ImageLoader, F: RegionFetcher> MapRenderer<L, F> {
    pub fn new(
        config: MapConfig,
        tiles: ImageCache<L>,
        avatars: ImageCache<L>,
        chunks: ChunkMetaCache<F>,
    ) -> Self {
        Self {
            config,
            tiles,
            avatars,
            chunks,
        }
    }

    pub fn config(&self) -> &MapConfig {
        &self.config
    }

    pub fn redraw<S>(
        &self,
        surface: &mut S,
        viewport: &mut AffineViewport,
        width: f64,
        height: f64,
        source: &MapSource,
        players: &[Player],
    ) -> FrameStats
    where
        S: Surface<Image = L::Image>,
    {
        viewport.apply(surface);

        viewport.save(surface);
        viewport.set_transform(surface, Affine::IDENTITY);
        surface.fill_rect(Rect::new(0.0, 0.0, width, height), self.config.background);
        viewport.restore(surface);

        let zoom = viewport.zoom_factor();
        let rect = viewport.visible_rect(width, height);
        let tiles = draw_tiles(surface, &self.tiles, source, rect, zoom, &self.config);
        let claims = draw_claims(surface, &self.chunks, source, rect, zoom, &self.config);
        let players = draw_players(
            surface,
            viewport,
            &self.avatars,
            players,
            zoom,
            &self.config,
        );

        FrameStats {
            zoom,
            tiles,
            claims,
            players,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use webmap_shared::{ChunkMeta, ChunkMetaEntry, ChunkPos};

    use super::*;
    use crate::cache::testing::{CountingObserver, ManualFetcher, ManualLoader};
    use crate::surface::testing::{Op, RecordingSurface};

    struct Harness {
        tiles: ManualLoader,
        avatars: ManualLoader,
        fetcher: ManualFetcher,
        observer: Rc<CountingObserver>,
        renderer: MapRenderer<ManualLoader, ManualFetcher>,
    }

    fn harness() -> Harness {
        let tiles = ManualLoader::default();
        let avatars = ManualLoader::default();
        let fetcher = ManualFetcher::default();
        let observer = Rc::new(CountingObserver::default());
        let renderer = MapRenderer::new(
            MapConfig::default(),
            ImageCache::new(tiles.clone(), observer.clone()),
            ImageCache::new(avatars.clone(), observer.clone()),
            ChunkMetaCache::new(fetcher.clone(), observer.clone()),
        );
        Harness {
            tiles,
            avatars,
            fetcher,
            observer,
            renderer,
        }
    }

    fn player(uuid: &str, x: f64, z: f64) -> Player {
        Player {
            uuid: uuid.to_string(),
            name: Some("Alex".into()),
            x,
            y: 70.0,
            z,
        }
    }

    #[test]
    fn background_is_painted_in_screen_space() {
        let h = harness();
        let mut vp = AffineViewport::default();
        vp.translate(50.0, 50.0);
        let matrix = vp.matrix();
        let source = MapSource::new(1, "overworld");

        let mut surface = RecordingSurface::default();
        h.renderer
            .redraw(&mut surface, &mut vp, 640.0, 480.0, &source, &[]);

        assert_eq!(
            &surface.ops[..5],
            &[
                Op::SetTransform(matrix),
                Op::Save,
                Op::SetTransform(Affine::IDENTITY),
                Op::Fill(Rect::new(0.0, 0.0, 640.0, 480.0), "#d5be95".to_string()),
                Op::Restore,
            ]
        );
        assert_eq!(vp.matrix(), matrix);
        assert_eq!(vp.saved_depth(), 0);
    }

    #[test]
    fn frame_fills_in_as_loads_complete() {
        let h = harness();
        let mut vp = AffineViewport::default();
        let source = MapSource::new(1, "overworld");
        let players = vec![player("u1", 10.0, 10.0)];

        let mut surface = RecordingSurface::default();
        let first = h
            .renderer
            .redraw(&mut surface, &mut vp, 300.0, 200.0, &source, &players);
        assert!((first.zoom - 2f64.sqrt()).abs() < 1e-12);
        assert_eq!(first.tiles.cells, 2);
        assert_eq!(first.tiles.blank, 2);
        assert_eq!(first.players, 0);
        assert_eq!(h.tiles.request_count(), 2);
        assert_eq!(h.avatars.request_count(), 1);
        // 300x200 at zoom ~1.41 covers chunk columns 0..19 and rows 0..13.
        assert_eq!(h.renderer.chunks.requested_regions(&source), 2);

        let tile = source.tile(0, 0, 256, 1).path();
        h.tiles.settle(&tile, true);
        let avatar = h.avatars.requests.borrow()[0].clone();
        h.avatars.settle(&avatar, true);
        let region = source.chunk_meta_path(ChunkPos::new(0, 0).region());
        let reply = h.fetcher.take(&region).expect("region requested");
        reply.deliver(vec![ChunkMetaEntry {
            x: 3,
            z: 4,
            meta: ChunkMeta {
                team: Some("red".into()),
            },
        }]);
        assert_eq!(h.observer.redraws.get(), 3);

        let mut surface = RecordingSurface::default();
        let second = h
            .renderer
            .redraw(&mut surface, &mut vp, 300.0, 200.0, &source, &players);
        assert_eq!(second.tiles.exact, 1);
        assert_eq!(second.claims, 1);
        assert_eq!(second.players, 1);
        assert_eq!(h.tiles.request_count(), 2);
        assert_eq!(vp.saved_depth(), 0);
    }

    #[test]
    fn zoomed_out_frame_skips_claims() {
        let h = harness();
        let mut vp = AffineViewport::default();
        vp.scale(0.1, 0.1);
        let source = MapSource::new(2, "nether");

        let mut surface = RecordingSurface::default();
        let stats = h
            .renderer
            .redraw(&mut surface, &mut vp, 800.0, 600.0, &source, &[]);
        assert!(stats.zoom > h.renderer.config().chunk_overlay_max_zoom);
        assert_eq!(stats.claims, 0);
        assert_eq!(h.renderer.chunks.requested_regions(&source), 0);
        assert!(stats.tiles.cells <= h.renderer.config().max_tiles as usize);
    }
}
