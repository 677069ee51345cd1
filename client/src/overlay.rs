use webmap_shared::{Player, avatar_url};

use crate::cache::{ImageCache, ImageLoader};
use crate::config::MapConfig;
use crate::surface::{Rect, Surface};
use crate::viewport::AffineViewport;

/// Draw each player's avatar centred on their world position. Avatars load on first sight
/// and appear on the redraw that follows; returns how many were drawn.
pub fn draw_players<S, L>(
    surface: &mut S,
    viewport: &mut AffineViewport,
    avatars: &ImageCache<L>,
    players: &[Player],
    zoom: f64,
    config: &MapConfig,
) -> usize
where
    S: Surface,
    L: ImageLoader<Image = S::Image>,
{
    let size = config.avatar_size as f64 * zoom.max(0.0).sqrt();
    let mut drawn = 0;
    for player in players {
        let url = avatar_url(
            &config.avatar_service,
            &player.uuid,
            config.avatar_size,
            &config.avatar_default_skin,
        );
        let Some(image) = avatars.load_ready(&url) else {
            continue;
        };

        viewport.save(surface);
        surface.set_shadow(&config.avatar_shadow);
        surface.draw_image(
            &image,
            Rect::new(player.x - size / 2.0, player.z - size / 2.0, size, size),
        );
        viewport.restore(surface);
        drawn += 1;
    }
    drawn
}
