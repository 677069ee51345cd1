#![cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]

use std::cell::RefCell;
use std::rc::Rc;

use js_sys::Reflect;
use serde::de::DeserializeOwned;
use wasm_bindgen::JsCast;
use wasm_bindgen::JsValue;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;
use web_sys::HtmlImageElement;

use webmap_shared::{ChunkMetaEntry, DimensionMeta, MapSource, MetaResponse, ServerMeta};

use crate::cache::{ImageLoader, LoadTicket, RegionFetcher, RegionReply};

const ONLOAD_HANDLE_KEY: &str = "__webmapImageOnload";
const ONERROR_HANDLE_KEY: &str = "__webmapImageOnerror";

/// Images at most this tall are error placeholders, not tiles.
const MIN_NATURAL_HEIGHT: u32 = 2;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FetchError {
    #[error("fetch error: {0}")]
    Network(String),
    #[error("HTTP {0}")]
    Status(u16),
    #[error("parse error: {0}")]
    Decode(String),
    #[error("image failed to load")]
    Image,
}

pub async fn fetch_json<T: DeserializeOwned>(url: &str) -> Result<T, FetchError> {
    let resp = gloo_net::http::Request::get(url)
        .send()
        .await
        .map_err(|e| FetchError::Network(e.to_string()))?;

    if !resp.ok() {
        return Err(FetchError::Status(resp.status()));
    }

    resp.json::<T>()
        .await
        .map_err(|e| FetchError::Decode(e.to_string()))
}

pub async fn fetch_dimension_meta(source: &MapSource) -> Result<DimensionMeta, FetchError> {
    fetch_json::<MetaResponse<DimensionMeta>>(&source.dimension_meta_path())
        .await
        .map(|resp| resp.meta)
}

pub async fn fetch_server_meta(source: &MapSource) -> Result<ServerMeta, FetchError> {
    fetch_json::<MetaResponse<ServerMeta>>(&source.server_meta_path())
        .await
        .map(|resp| resp.meta)
}

pub(crate) fn warn(context: &str, url: &str, err: &FetchError) {
    web_sys::console::warn_1(&format!("{context} {url}: {err}").into());
}

/// Loads tiles and avatars through `<img>` elements.
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlImageLoader;

impl ImageLoader for HtmlImageLoader {
    type Image = HtmlImageElement;

    fn load(&self, url: &str, ticket: LoadTicket) -> Option<HtmlImageElement> {
        let img = match HtmlImageElement::new() {
            Ok(img) => img,
            Err(_) => {
                ticket.settle(false);
                return None;
            }
        };

        // onload and onerror share the ticket; whichever fires first settles it.
        let ticket = Rc::new(RefCell::new(Some(ticket)));

        let img_for_load = img.clone();
        let ticket_load = ticket.clone();
        let url_load = url.to_string();
        let onload = Closure::<dyn FnMut()>::new(move || {
            clear_image_handlers(&img_for_load);
            let Some(ticket) = ticket_load.borrow_mut().take() else {
                return;
            };
            let ok = img_for_load.natural_height() > MIN_NATURAL_HEIGHT;
            if !ok {
                warn("Image rejected", &url_load, &FetchError::Image);
            }
            ticket.settle(ok);
        });

        let img_for_error = img.clone();
        let url_error = url.to_string();
        let onerror = Closure::<dyn FnMut()>::new(move || {
            clear_image_handlers(&img_for_error);
            if let Some(ticket) = ticket.borrow_mut().take() {
                warn("Image load failed", &url_error, &FetchError::Image);
                ticket.settle(false);
            }
        });

        let onload_js = onload.into_js_value();
        let onerror_js = onerror.into_js_value();
        img.set_onload(Some(onload_js.unchecked_ref()));
        img.set_onerror(Some(onerror_js.unchecked_ref()));
        let _ = Reflect::set(
            img.as_ref(),
            &JsValue::from_str(ONLOAD_HANDLE_KEY),
            &onload_js,
        );
        let _ = Reflect::set(
            img.as_ref(),
            &JsValue::from_str(ONERROR_HANDLE_KEY),
            &onerror_js,
        );
        img.set_src(url);
        Some(img)
    }
}

fn clear_image_handlers(img: &HtmlImageElement) {
    img.set_onload(None);
    img.set_onerror(None);
    let _ = Reflect::delete_property(img.as_ref(), &JsValue::from_str(ONLOAD_HANDLE_KEY));
    let _ = Reflect::delete_property(img.as_ref(), &JsValue::from_str(ONERROR_HANDLE_KEY));
}

/// Fetches chunk-metadata regions over HTTP.
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpRegionFetcher;

impl RegionFetcher for HttpRegionFetcher {
    fn fetch(&self, url: String, reply: RegionReply) {
        spawn_local(async move {
            match fetch_json::<Vec<ChunkMetaEntry>>(&url).await {
                Ok(entries) => reply.deliver(entries),
                Err(e) => {
                    warn("Chunk metadata fetch failed", &url, &e);
                    reply.fail();
                }
            }
        });
    }
}
