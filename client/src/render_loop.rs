use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use wasm_bindgen::prelude::*;

use crate::cache::RedrawObserver;

/// Batches redraw requests via `requestAnimationFrame`.
///
/// Input, cache completions and metadata polls all call `mark_dirty()`; the render
/// function runs at most once per frame however many marks arrived.
pub struct RenderScheduler {
    inner: Rc<Inner>,
}

struct Inner {
    window: Option<web_sys::Window>,
    dirty: Cell<bool>,
    scheduled: Cell<bool>,
    raf_id: Cell<Option<i32>>,
    render: RefCell<Option<Box<dyn Fn()>>>,
    callback: RefCell<Option<Closure<dyn FnMut()>>>,
}

impl Inner {
    fn mark_dirty(&self) {
        self.dirty.set(true);
        if self.scheduled.get() {
            return;
        }
        self.scheduled.set(true);
        let cb_ref = self.callback.borrow();
        let (Some(cb), Some(window)) = (cb_ref.as_ref(), self.window.as_ref()) else {
            self.scheduled.set(false);
            return;
        };
        match window.request_animation_frame(cb.as_ref().unchecked_ref()) {
            Ok(id) => self.raf_id.set(Some(id)),
            Err(_) => self.scheduled.set(false),
        }
    }
}

impl RenderScheduler {
    /// Create a scheduler with no render function yet; marks before `set_render` are kept
    /// and flushed on the first frame after it.
    pub fn new() -> Self {
        let inner = Rc::new(Inner {
            window: web_sys::window(),
            dirty: Cell::new(false),
            scheduled: Cell::new(false),
            raf_id: Cell::new(None),
            render: RefCell::new(None),
            callback: RefCell::new(None),
        });

        let weak = Rc::downgrade(&inner);
        let cb = Closure::<dyn FnMut()>::new(move || {
            let Some(inner) = weak.upgrade() else {
                return;
            };
            inner.scheduled.set(false);
            inner.raf_id.set(None);
            if !inner.dirty.get() {
                return;
            }
            let render = inner.render.borrow();
            if let Some(render) = render.as_ref() {
                inner.dirty.set(false);
                render();
            }
        });
        *inner.callback.borrow_mut() = Some(cb);

        Self { inner }
    }

    pub fn set_render(&self, render: impl Fn() + 'static) {
        *self.inner.render.borrow_mut() = Some(Box::new(render));
        if self.inner.dirty.get() {
            self.inner.mark_dirty();
        }
    }

    /// Mark the scene as needing a repaint. Just sets a flag and schedules one rAF if none
    /// is pending.
    pub fn mark_dirty(&self) {
        self.inner.mark_dirty();
    }

    /// A handle for the caches. It does not keep the scheduler alive, which avoids a
    /// scheduler -> render fn -> cache -> scheduler cycle.
    pub fn handle(&self) -> RedrawHandle {
        RedrawHandle {
            inner: Rc::downgrade(&self.inner),
        }
    }
}

impl Default for RenderScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for RenderScheduler {
    fn drop(&mut self) {
        if let Some(raf_id) = self.inner.raf_id.replace(None)
            && let Some(window) = self.inner.window.as_ref()
        {
            let _ = window.cancel_animation_frame(raf_id);
        }
        self.inner.scheduled.set(false);
        self.inner.dirty.set(false);
        self.inner.render.borrow_mut().take();
        self.inner.callback.borrow_mut().take();
    }
}

#[derive(Clone)]
pub struct RedrawHandle {
    inner: Weak<Inner>,
}

impl RedrawObserver for RedrawHandle {
    fn request_redraw(&self) {
        if let Some(inner) = self.inner.upgrade() {
            inner.mark_dirty();
        }
    }
}
