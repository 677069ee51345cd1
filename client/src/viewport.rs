use crate::surface::Surface;

/// A 2D affine matrix in canvas order: `x' = a*x + c*y + e`, `y' = b*x + d*y + f`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Affine {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl Affine {
    pub const IDENTITY: Self = Self {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        e: 0.0,
        f: 0.0,
    };

    pub fn translation(dx: f64, dy: f64) -> Self {
        Self {
            e: dx,
            f: dy,
            ..Self::IDENTITY
        }
    }

    pub fn scaling(sx: f64, sy: f64) -> Self {
        Self {
            a: sx,
            d: sy,
            ..Self::IDENTITY
        }
    }

    /// `self * rhs`: `rhs` is applied first, matching how canvas transforms compose.
    pub fn multiply(&self, rhs: &Affine) -> Self {
        Self {
            a: self.a * rhs.a + self.c * rhs.b,
            b: self.b * rhs.a + self.d * rhs.b,
            c: self.a * rhs.c + self.c * rhs.d,
            d: self.b * rhs.c + self.d * rhs.d,
            e: self.a * rhs.e + self.c * rhs.f + self.e,
            f: self.b * rhs.e + self.d * rhs.f + self.f,
        }
    }

    pub fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        (
            self.a * x + self.c * y + self.e,
            self.b * x + self.d * y + self.f,
        )
    }

    pub fn determinant(&self) -> f64 {
        self.a * self.d - self.b * self.c
    }

    /// `None` when the matrix is singular.
    pub fn inverse(&self) -> Option<Self> {
        let det = self.determinant();
        if det == 0.0 || !det.is_finite() {
            return None;
        }
        Some(Self {
            a: self.d / det,
            b: -self.b / det,
            c: -self.c / det,
            d: self.a / det,
            e: (self.c * self.f - self.d * self.e) / det,
            f: (self.b * self.e - self.a * self.f) / det,
        })
    }
}

impl Default for Affine {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Visible world rectangle of a canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldRect {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

/// Pan/zoom transform mapping world coordinates to screen pixels.
///
/// This is the source of truth for the drawing transform: every change that must also reach
/// the drawing surface goes through a method taking the surface, and `save`/`restore` keep
/// the saved-matrix stack in lock-step with the surface's own state stack.
#[derive(Debug, Clone, Default)]
pub struct AffineViewport {
    matrix: Affine,
    saved: Vec<Affine>,
}

impl AffineViewport {
    pub fn matrix(&self) -> Affine {
        self.matrix
    }

    /// Translate by `(dx, dy)` world units.
    pub fn translate(&mut self, dx: f64, dy: f64) {
        if !dx.is_finite() || !dy.is_finite() {
            return;
        }
        self.matrix = self.matrix.multiply(&Affine::translation(dx, dy));
    }

    /// Scale about the world origin. Non-positive or non-finite factors are ignored so the
    /// matrix stays invertible.
    pub fn scale(&mut self, sx: f64, sy: f64) {
        if !(sx > 0.0 && sy > 0.0 && sx.is_finite() && sy.is_finite()) {
            return;
        }
        let next = self.matrix.multiply(&Affine::scaling(sx, sy));
        if next.inverse().is_some() {
            self.matrix = next;
        }
    }

    pub fn reset(&mut self) {
        self.matrix = Affine::IDENTITY;
    }

    pub fn to_screen(&self, wx: f64, wy: f64) -> (f64, f64) {
        self.matrix.apply(wx, wy)
    }

    /// Screen pixel to world coordinates. `translate`/`scale` never admit a singular matrix,
    /// so the inverse always exists.
    pub fn to_world(&self, sx: f64, sy: f64) -> (f64, f64) {
        match self.matrix.inverse() {
            Some(inv) => inv.apply(sx, sy),
            None => (sx, sy),
        }
    }

    /// World distance between the points under screen `(0, 0)` and `(1, 1)`.
    pub fn zoom_factor(&self) -> f64 {
        let (x0, y0) = self.to_world(0.0, 0.0);
        let (x1, y1) = self.to_world(1.0, 1.0);
        ((x1 - x0).powi(2) + (y1 - y0).powi(2)).sqrt()
    }

    pub fn visible_rect(&self, width: f64, height: f64) -> WorldRect {
        let (min_x, min_y) = self.to_world(0.0, 0.0);
        let (max_x, max_y) = self.to_world(width, height);
        WorldRect {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Scale by `factor` about the world point under screen `(sx, sy)`, keeping it fixed on screen.
    pub fn zoom_at(&mut self, sx: f64, sy: f64, factor: f64) {
        let (wx, wy) = self.to_world(sx, sy);
        self.translate(wx, wy);
        self.scale(factor, factor);
        self.translate(-wx, -wy);
    }

    /// Reset and place world `(origin_x, origin_z)` at the canvas centre.
    pub fn center_on(&mut self, width: f64, height: f64, origin_x: f64, origin_z: f64) {
        self.reset();
        self.translate(width / 2.0 - origin_x, height / 2.0 - origin_z);
    }

    /// Pan so world `(wx, wz)` sits at the canvas centre, keeping the current zoom.
    pub fn focus(&mut self, width: f64, height: f64, wx: f64, wz: f64) {
        let (cx, cz) = self.to_world(width / 2.0, height / 2.0);
        self.translate(cx - wx, cz - wz);
    }

    pub fn save<S: Surface>(&mut self, surface: &mut S) {
        self.saved.push(self.matrix);
        surface.save();
    }

    /// Pops the matrix saved by the matching `save`. An unmatched restore leaves the matrix
    /// as is, mirroring canvas semantics.
    pub fn restore<S: Surface>(&mut self, surface: &mut S) {
        if let Some(matrix) = self.saved.pop() {
            self.matrix = matrix;
        }
        surface.restore();
    }

    pub fn set_transform<S: Surface>(&mut self, surface: &mut S, matrix: Affine) {
        if matrix.inverse().is_none() {
            return;
        }
        self.matrix = matrix;
        surface.set_transform(&matrix);
    }

    /// Push the tracked matrix to the surface.
    pub fn apply<S: Surface>(&self, surface: &mut S) {
        surface.set_transform(&self.matrix);
    }

    pub fn saved_depth(&self) -> usize {
        self.saved.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::testing::{Op, RecordingSurface};

    fn assert_close(actual: (f64, f64), expected: (f64, f64)) {
        let diff = (actual.0 - expected.0).abs().max((actual.1 - expected.1).abs());
        assert!(diff < 1e-9, "expected {expected:?}, got {actual:?}");
    }

    #[test]
    fn identity_maps_screen_to_world() {
        let vp = AffineViewport::default();
        assert_close(vp.to_world(12.0, -3.0), (12.0, -3.0));
        assert!((vp.zoom_factor() - 2f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn to_world_inverts_to_screen() {
        let mut vp = AffineViewport::default();
        vp.translate(40.0, -17.5);
        vp.scale(2.5, 2.5);
        vp.translate(-3.0, 9.0);
        vp.scale(0.3, 0.3);
        let screen = vp.to_screen(123.0, -456.0);
        assert_close(vp.to_world(screen.0, screen.1), (123.0, -456.0));
    }

    #[test]
    fn inverse_operations_round_trip() {
        let mut vp = AffineViewport::default();
        let steps = [(10.0, 5.0, 1.1), (-250.0, 33.0, 0.5), (0.25, -7.0, 3.0)];
        for &(dx, dy, s) in &steps {
            vp.translate(dx, dy);
            vp.scale(s, s);
        }
        for &(dx, dy, s) in steps.iter().rev() {
            vp.scale(1.0 / s, 1.0 / s);
            vp.translate(-dx, -dy);
        }
        assert_close(vp.to_world(77.0, 88.0), (77.0, 88.0));
    }

    #[test]
    fn degenerate_scale_is_ignored() {
        let mut vp = AffineViewport::default();
        vp.scale(2.0, 2.0);
        let before = vp.matrix();
        vp.scale(0.0, 1.0);
        vp.scale(-1.0, -1.0);
        vp.scale(f64::NAN, 1.0);
        vp.scale(f64::INFINITY, 1.0);
        assert_eq!(vp.matrix(), before);
        assert!(vp.matrix().inverse().is_some());
    }

    #[test]
    fn zoom_at_keeps_point_under_cursor() {
        let mut vp = AffineViewport::default();
        vp.translate(300.0, 200.0);
        vp.scale(0.7, 0.7);
        for factor in [1.1, 1.1f64.powi(-3), 2.0] {
            let before = vp.to_world(413.0, 97.0);
            vp.zoom_at(413.0, 97.0, factor);
            assert_close(vp.to_world(413.0, 97.0), before);
        }
    }

    #[test]
    fn save_restore_tracks_surface_stack() {
        let mut vp = AffineViewport::default();
        let mut surface = RecordingSurface::default();
        vp.translate(50.0, 60.0);
        vp.scale(2.0, 2.0);
        let before = vp.to_world(10.0, 10.0);

        vp.save(&mut surface);
        vp.set_transform(&mut surface, Affine::IDENTITY);
        assert_close(vp.to_world(10.0, 10.0), (10.0, 10.0));
        vp.restore(&mut surface);

        assert_close(vp.to_world(10.0, 10.0), before);
        assert_eq!(vp.saved_depth(), 0);
        assert_eq!(
            surface.ops,
            vec![Op::Save, Op::SetTransform(Affine::IDENTITY), Op::Restore]
        );
    }

    #[test]
    fn center_on_places_origin_mid_canvas() {
        let mut vp = AffineViewport::default();
        vp.scale(4.0, 4.0);
        vp.center_on(800.0, 600.0, 100.0, -50.0);
        assert_close(vp.to_world(400.0, 300.0), (100.0, -50.0));
    }

    #[test]
    fn focus_keeps_zoom() {
        let mut vp = AffineViewport::default();
        vp.scale(0.25, 0.25);
        let zoom = vp.zoom_factor();
        vp.focus(800.0, 600.0, -1234.0, 987.0);
        assert_close(vp.to_world(400.0, 300.0), (-1234.0, 987.0));
        assert!((vp.zoom_factor() - zoom).abs() < 1e-9);
    }

    #[test]
    fn visible_rect_spans_canvas() {
        let mut vp = AffineViewport::default();
        vp.scale(0.5, 0.5);
        let rect = vp.visible_rect(100.0, 50.0);
        assert_close((rect.min_x, rect.min_y), (0.0, 0.0));
        assert_close((rect.max_x, rect.max_y), (200.0, 100.0));
    }
}
