use web_sys::{CanvasRenderingContext2d, HtmlImageElement};

use crate::viewport::Affine;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Shadow {
    pub offset_x: f64,
    pub offset_y: f64,
    pub blur: f64,
    pub color: &'static str,
}

/// The drawing primitives the renderer needs. Coordinates are in the space of the current
/// transform, which callers manage through `AffineViewport`.
pub trait Surface {
    type Image;

    fn save(&mut self);
    fn restore(&mut self);
    fn set_transform(&mut self, matrix: &Affine);
    fn fill_rect(&mut self, rect: Rect, color: &str);
    fn draw_image(&mut self, image: &Self::Image, dst: Rect);
    /// Draw the `src` pixel region of `image` into `dst`.
    fn draw_image_region(&mut self, image: &Self::Image, src: Rect, dst: Rect);
    fn set_shadow(&mut self, shadow: &Shadow);
}

impl Surface for CanvasRenderingContext2d {
    type Image = HtmlImageElement;

    fn save(&mut self) {
        CanvasRenderingContext2d::save(self);
    }

    fn restore(&mut self) {
        CanvasRenderingContext2d::restore(self);
    }

    fn set_transform(&mut self, m: &Affine) {
        CanvasRenderingContext2d::set_transform(self, m.a, m.b, m.c, m.d, m.e, m.f).ok();
    }

    fn fill_rect(&mut self, rect: Rect, color: &str) {
        self.set_fill_style_str(color);
        CanvasRenderingContext2d::fill_rect(self, rect.x, rect.y, rect.w, rect.h);
    }

    fn draw_image(&mut self, image: &HtmlImageElement, dst: Rect) {
        self.draw_image_with_html_image_element_and_dw_and_dh(image, dst.x, dst.y, dst.w, dst.h)
            .ok();
    }

    fn draw_image_region(&mut self, image: &HtmlImageElement, src: Rect, dst: Rect) {
        self.draw_image_with_html_image_element_and_sw_and_sh_and_dx_and_dy_and_dw_and_dh(
            image, src.x, src.y, src.w, src.h, dst.x, dst.y, dst.w, dst.h,
        )
        .ok();
    }

    fn set_shadow(&mut self, shadow: &Shadow) {
        self.set_shadow_offset_x(shadow.offset_x);
        self.set_shadow_offset_y(shadow.offset_y);
        self.set_shadow_blur(shadow.blur);
        self.set_shadow_color(shadow.color);
    }
}
