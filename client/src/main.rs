mod app;
mod cache;
mod canvas;
mod compositor;
mod config;
mod input;
mod net;
mod overlay;
mod poller;
mod render_loop;
mod renderer;
mod selection;
mod surface;
mod viewport;

use std::any::Any;
use std::cell::RefCell;

use leptos::mount::mount_to;
use wasm_bindgen::JsCast;
use web_sys::HtmlElement;

thread_local! {
    static MOUNT_HANDLE: RefCell<Option<Box<dyn Any>>> = RefCell::new(None);
}

/// The `#app` element carrying the map's `data-*` attributes, else `<body>`.
fn mount_target() -> Option<HtmlElement> {
    let document = web_sys::window()?.document()?;
    document
        .get_element_by_id(app::MOUNT_ID)
        .and_then(|el| el.dyn_into::<HtmlElement>().ok())
        .or_else(|| document.body())
}

fn main() {
    console_error_panic_hook::set_once();
    let Some(target) = mount_target() else {
        web_sys::console::warn_1(&"No mount point for the map viewer".into());
        return;
    };

    MOUNT_HANDLE.with(move |slot| {
        // A second mount replaces the first; dropping the old handle disposes its effects.
        drop(slot.borrow_mut().take());
        let handle = mount_to(target, app::App);
        *slot.borrow_mut() = Some(Box::new(handle));
    });
}
