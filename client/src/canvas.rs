#![cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use leptos::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, PointerEvent, WheelEvent};

use crate::app::{FocusTarget, Selection, Snapshot};
use crate::cache::{ChunkMetaCache, ImageCache, RedrawObserver};
use crate::config::MapConfig;
use crate::input::{InputController, PointerInput};
use crate::net::{HtmlImageLoader, HttpRegionFetcher};
use crate::render_loop::{RedrawHandle, RenderScheduler};
use crate::renderer::MapRenderer;
use crate::viewport::AffineViewport;

type BrowserRenderer = MapRenderer<HtmlImageLoader, HttpRegionFetcher>;

struct ResizeBinding {
    window: web_sys::Window,
    handler: Closure<dyn Fn()>,
}

thread_local! {
    static RESIZE_BINDING: RefCell<Option<ResizeBinding>> = const { RefCell::new(None) };
}

/// Canvas size for a window: the inner size minus the page chrome, at least 1x1.
pub fn fit_canvas(window_width: f64, window_height: f64, config: &MapConfig) -> (f64, f64) {
    let fit = |outer: f64, chrome: f64| {
        if outer.is_finite() {
            (outer - chrome).floor().max(1.0)
        } else {
            1.0
        }
    };
    (
        fit(window_width, config.chrome_width),
        fit(window_height, config.chrome_height),
    )
}

fn window_dimensions() -> (f64, f64) {
    let Some(window) = web_sys::window() else {
        return (1200.0, 800.0);
    };
    let w = window
        .inner_width()
        .ok()
        .and_then(|v| v.as_f64())
        .unwrap_or(1200.0);
    let h = window
        .inner_height()
        .ok()
        .and_then(|v| v.as_f64())
        .unwrap_or(800.0);
    (w, h)
}

/// Mutable per-canvas state shared by the render function and input handlers.
#[derive(Default)]
struct CanvasState {
    viewport: RefCell<AffineViewport>,
    size: Cell<(f64, f64)>,
    /// Reset the view onto the selection origin on the next frame.
    recentre: Cell<bool>,
    /// World point to bring to the centre on the next frame.
    pending_focus: Cell<Option<(f64, f64)>>,
}

fn bind_resize(handle: RedrawHandle) {
    let Some(window) = web_sys::window() else {
        return;
    };
    RESIZE_BINDING.with(|slot| {
        if let Some(old) = slot.borrow_mut().take() {
            let _ = old.window.remove_event_listener_with_callback(
                "resize",
                old.handler.as_ref().unchecked_ref(),
            );
        }
    });

    let handler = Closure::<dyn Fn()>::new(move || handle.request_redraw());
    if window
        .add_event_listener_with_callback("resize", handler.as_ref().unchecked_ref())
        .is_err()
    {
        return;
    }
    RESIZE_BINDING.with(|slot| {
        *slot.borrow_mut() = Some(ResizeBinding { window, handler });
    });
}

#[component]
pub fn MapCanvas() -> impl IntoView {
    let Selection(selection) = expect_context();
    let Snapshot(snapshot) = expect_context();
    let FocusTarget(focus) = expect_context();

    let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
    let config = MapConfig::default();

    let scheduler = Rc::new(RenderScheduler::new());
    let observer: Rc<dyn RedrawObserver> = Rc::new(scheduler.handle());
    let renderer: Rc<BrowserRenderer> = Rc::new(MapRenderer::new(
        config.clone(),
        ImageCache::new(HtmlImageLoader, observer.clone()),
        ImageCache::new(HtmlImageLoader, observer.clone()),
        ChunkMetaCache::new(HttpRegionFetcher, observer),
    ));
    let state = Rc::new(CanvasState::default());
    state.recentre.set(true);
    let input = Rc::new(RefCell::new(InputController::new(config.zoom_step)));

    scheduler.set_render({
        let state = state.clone();
        let renderer = renderer.clone();
        move || {
            let Some(canvas) = canvas_ref.get_untracked() else {
                return;
            };
            let (window_w, window_h) = window_dimensions();
            let (w, h) = fit_canvas(window_w, window_h, renderer.config());
            if state.size.get() != (w, h) {
                // Resizing clears the canvas state; the view restarts from the origin.
                canvas.set_width(w as u32);
                canvas.set_height(h as u32);
                state.size.set((w, h));
                state.recentre.set(true);
            }

            let (source, origin) = selection.with_untracked(|s| (s.source.clone(), s.origin));
            let mut viewport = state.viewport.borrow_mut();
            if state.recentre.replace(false) {
                viewport.center_on(w, h, origin.0, origin.1);
            }
            if let Some((x, z)) = state.pending_focus.take() {
                viewport.focus(w, h, x, z);
            }

            let Some(mut ctx) = canvas
                .get_context("2d")
                .ok()
                .flatten()
                .and_then(|ctx| ctx.dyn_into::<CanvasRenderingContext2d>().ok())
            else {
                return;
            };
            ctx.set_image_smoothing_enabled(false);

            snapshot.with_untracked(|snap| {
                let players = snap
                    .as_ref()
                    .filter(|snap| snap.is_for(&source))
                    .map(|snap| snap.meta.players.as_slice())
                    .unwrap_or(&[]);
                renderer.redraw(&mut ctx, &mut viewport, w, h, &source, players);
            });
        }
    });
    bind_resize(scheduler.handle());

    // A new source or origin restarts the view.
    Effect::new({
        let state = state.clone();
        let scheduler = scheduler.clone();
        move || {
            selection.track();
            state.recentre.set(true);
            scheduler.mark_dirty();
        }
    });

    Effect::new({
        let scheduler = scheduler.clone();
        move || {
            snapshot.track();
            scheduler.mark_dirty();
        }
    });

    Effect::new({
        let state = state.clone();
        let scheduler = scheduler.clone();
        move || {
            let Some(target) = focus.get() else {
                return;
            };
            state.pending_focus.set(Some(target));
            focus.set(None);
            scheduler.mark_dirty();
        }
    });

    let dispatch = {
        let state = state.clone();
        let scheduler = scheduler.clone();
        Rc::new(move |event: PointerInput| {
            let changed = input
                .borrow_mut()
                .handle(event, &mut state.viewport.borrow_mut());
            if changed {
                scheduler.mark_dirty();
            }
        })
    };

    let on_pointer_down = {
        let dispatch = dispatch.clone();
        move |e: PointerEvent| {
            if e.button() != 0 {
                return;
            }
            if let Some(target) = e.target()
                && let Ok(el) = target.dyn_into::<web_sys::HtmlElement>()
            {
                el.set_pointer_capture(e.pointer_id()).ok();
                el.style().set_property("cursor", "grabbing").ok();
            }
            dispatch(PointerInput::Down {
                x: e.offset_x() as f64,
                y: e.offset_y() as f64,
            });
        }
    };

    let on_pointer_move = {
        let dispatch = dispatch.clone();
        move |e: PointerEvent| {
            dispatch(PointerInput::Move {
                x: e.offset_x() as f64,
                y: e.offset_y() as f64,
            });
        }
    };

    let on_pointer_up = {
        let dispatch = dispatch.clone();
        move |e: PointerEvent| {
            if let Some(target) = e.target()
                && let Ok(el) = target.dyn_into::<web_sys::HtmlElement>()
            {
                el.style().set_property("cursor", "grab").ok();
            }
            dispatch(PointerInput::Up {
                x: e.offset_x() as f64,
                y: e.offset_y() as f64,
                zoom_out: e.shift_key(),
            });
        }
    };

    let on_pointer_cancel = {
        let dispatch = dispatch.clone();
        move |_: PointerEvent| dispatch(PointerInput::Cancel)
    };

    let on_pointer_leave = {
        let dispatch = dispatch.clone();
        move |_: PointerEvent| dispatch(PointerInput::Cancel)
    };

    let on_wheel = move |e: WheelEvent| {
        e.prevent_default();
        dispatch(PointerInput::Wheel {
            x: e.offset_x() as f64,
            y: e.offset_y() as f64,
            delta_y: e.delta_y(),
        });
    };

    view! {
        <canvas
            node_ref=canvas_ref
            style="display: block; touch-action: none; image-rendering: pixelated; cursor: grab;"
            on:pointerdown=on_pointer_down
            on:pointermove=on_pointer_move
            on:pointerup=on_pointer_up
            on:pointercancel=on_pointer_cancel
            on:pointerleave=on_pointer_leave
            on:wheel=on_wheel
        />
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canvas_fills_window_minus_chrome() {
        let config = MapConfig::default();
        assert_eq!(fit_canvas(1920.0, 1080.0, &config), (1900.0, 960.0));
        assert_eq!(fit_canvas(1000.5, 700.9, &config), (980.0, 580.0));
    }

    #[test]
    fn tiny_or_broken_windows_still_get_a_pixel() {
        let config = MapConfig::default();
        assert_eq!(fit_canvas(10.0, 50.0, &config), (1.0, 1.0));
        assert_eq!(fit_canvas(f64::NAN, f64::INFINITY, &config), (1.0, 1.0));
    }
}
