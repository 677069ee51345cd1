#![cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]

use chrono::{DateTime, TimeZone, Utc};
use gloo_timers::callback::Interval;
use leptos::prelude::*;
use wasm_bindgen_futures::spawn_local;

use webmap_shared::{DimensionMeta, MapSource};

use crate::net;
use crate::selection::SelectionContext;

/// The latest dimension metadata and when it arrived. Replaced wholesale on every poll.
#[derive(Debug, Clone, PartialEq)]
pub struct DimensionSnapshot {
    pub source: MapSource,
    pub meta: DimensionMeta,
    pub received_at: DateTime<Utc>,
}

impl DimensionSnapshot {
    pub fn new(source: MapSource, meta: DimensionMeta, received_at: DateTime<Utc>) -> Self {
        Self {
            source,
            meta,
            received_at,
        }
    }

    /// Whether this snapshot belongs to `source`. Responses that land after a dimension
    /// switch fail this and are dropped.
    pub fn is_for(&self, source: &MapSource) -> bool {
        &self.source == source
    }

    /// `updated HH:MM:SS` in the given zone.
    pub fn updated_label<Tz: TimeZone>(&self, tz: &Tz) -> String
    where
        Tz::Offset: std::fmt::Display,
    {
        self.received_at
            .with_timezone(tz)
            .format("updated %H:%M:%S")
            .to_string()
    }
}

/// Fetch the selected dimension's metadata once and publish it if the selection has not
/// moved on meanwhile. A source still waiting for its spawn takes it from this response.
/// Failures keep the previous snapshot.
pub fn poll_once(
    selection: RwSignal<SelectionContext>,
    snapshot: RwSignal<Option<DimensionSnapshot>>,
) {
    let source = selection.with_untracked(|s| s.source.clone());
    spawn_local(async move {
        match net::fetch_dimension_meta(&source).await {
            Ok(meta) => {
                let fresh = DimensionSnapshot::new(source, meta, Utc::now());
                if !selection.with_untracked(|s| fresh.is_for(&s.source)) {
                    return;
                }
                if selection.with_untracked(|s| s.follow_spawn) {
                    selection.update(|s| {
                        s.adopt_spawn(&fresh.meta);
                    });
                }
                snapshot.set(Some(fresh));
            }
            Err(e) => net::warn(
                "Dimension metadata fetch failed",
                &source.dimension_meta_path(),
                &e,
            ),
        }
    });
}

/// Poll immediately, then every `interval_ms` for the rest of the session.
pub fn start_polling(
    selection: RwSignal<SelectionContext>,
    snapshot: RwSignal<Option<DimensionSnapshot>>,
    interval_ms: u32,
) {
    poll_once(selection, snapshot);
    Interval::new(interval_ms, move || poll_once(selection, snapshot)).forget();
}
