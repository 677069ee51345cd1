#![cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]

use leptos::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;

use webmap_shared::{DimensionMeta, Player};

use crate::canvas::MapCanvas;
use crate::config::MapConfig;
use crate::net;
use crate::poller::{self, DimensionSnapshot};
use crate::selection::SelectionContext;

/// Newtype wrappers so each signal gets its own context slot.
#[derive(Clone, Copy)]
pub(crate) struct Selection(pub RwSignal<SelectionContext>);
#[derive(Clone, Copy)]
pub(crate) struct Snapshot(pub RwSignal<Option<DimensionSnapshot>>);
/// World point the canvas should centre on next.
#[derive(Clone, Copy)]
pub(crate) struct FocusTarget(pub RwSignal<Option<(f64, f64)>>);

pub(crate) const MOUNT_ID: &str = "app";

/// Read the map selection from the mount element's `data-*` attributes and the page URL.
fn resolve_selection() -> Option<SelectionContext> {
    let window = web_sys::window()?;
    let document = window.document()?;
    let mount = document.get_element_by_id(MOUNT_ID);
    let location = window.location();
    let path = location.pathname().unwrap_or_default();
    let query = location.search().unwrap_or_default();
    SelectionContext::resolve(
        |name| mount.as_ref().and_then(|el| el.get_attribute(name)),
        &path,
        &query,
    )
}

/// `day 12 | 14:30 | rain`, skipping fields the server did not send.
pub fn world_status(meta: &DimensionMeta) -> String {
    let mut parts = Vec::new();
    if let Some(day) = meta.day {
        parts.push(format!("day {day}"));
    }
    if let Some(clock) = meta.clock() {
        parts.push(clock);
    }
    if let Some(weather) = meta.weather.as_deref().filter(|w| !w.is_empty()) {
        parts.push(weather.to_string());
    }
    parts.join(" | ")
}

/// Players sorted by display name for the header list.
pub fn sorted_players(meta: &DimensionMeta) -> Vec<Player> {
    let mut players = meta.players.clone();
    players.sort_by(|a, b| {
        a.display_name()
            .to_lowercase()
            .cmp(&b.display_name().to_lowercase())
            .then_with(|| a.uuid.cmp(&b.uuid))
    });
    players
}

#[component]
pub fn App() -> impl IntoView {
    let Some(initial) = resolve_selection() else {
        web_sys::console::warn_1(&"No map selected: expected /map/{server}/{dimension}".into());
        return view! {
            <p style="padding: 16px; font-family: sans-serif;">"No map selected."</p>
        }
        .into_any();
    };
    web_sys::console::info_1(&format!("Showing {}", initial.source).into());

    let poll_ms = MapConfig::default().meta_poll_ms;
    let pending_player = StoredValue::new(initial.focus_player.clone());
    let selection = RwSignal::new(initial);
    let snapshot: RwSignal<Option<DimensionSnapshot>> = RwSignal::new(None);
    let focus: RwSignal<Option<(f64, f64)>> = RwSignal::new(None);
    let server_name: RwSignal<Option<String>> = RwSignal::new(None);

    provide_context(Selection(selection));
    provide_context(Snapshot(snapshot));
    provide_context(FocusTarget(focus));

    Effect::new(move || {
        poller::start_polling(selection, snapshot, poll_ms);
    });

    Effect::new(move || {
        let source = selection.with_untracked(|s| s.source.clone());
        spawn_local(async move {
            match net::fetch_server_meta(&source).await {
                Ok(meta) => server_name.set(meta.name),
                Err(e) => net::warn(
                    "Server metadata fetch failed",
                    &source.server_meta_path(),
                    &e,
                ),
            }
        });
    });

    // `?player=` focuses once, on the first snapshot that contains the player.
    Effect::new(move || {
        let Some(name) = pending_player.get_value() else {
            return;
        };
        snapshot.with(|snap| {
            if let Some(player) = snap.as_ref().and_then(|s| s.meta.player_named(&name)) {
                focus.set(Some((player.x, player.z)));
                pending_player.set_value(None);
            }
        });
    });

    let on_dimension_change = move |e: leptos::ev::Event| {
        let Some(target) = e.target() else {
            return;
        };
        let Ok(target) = target.dyn_into::<web_sys::HtmlSelectElement>() else {
            return;
        };
        let dimension = target.value();
        if selection.with_untracked(|s| s.source.dimension == dimension) {
            return;
        }
        selection.update(|s| {
            s.set_dimension(&dimension);
        });
        snapshot.set(None);
        poller::poll_once(selection, snapshot);
    };

    let title = move || {
        server_name
            .get()
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| format!("Server {}", selection.with(|s| s.source.server)))
    };

    let status = move || {
        snapshot.with(|snap| {
            snap.as_ref()
                .map(|s| {
                    let world = world_status(&s.meta);
                    let updated = s.updated_label(&chrono::Local);
                    if world.is_empty() {
                        updated
                    } else {
                        format!("{world} | {updated}")
                    }
                })
                .unwrap_or_else(|| "loading...".to_string())
        })
    };

    let players = move || {
        snapshot.with(|snap| {
            snap.as_ref()
                .map(|s| sorted_players(&s.meta))
                .unwrap_or_default()
        })
    };

    view! {
        <div style="font-family: sans-serif; padding: 8px 10px;">
            <header style="display: flex; gap: 12px; align-items: center; height: 40px;">
                <strong>{title}</strong>
                <select on:change=on_dimension_change>
                    {move || {
                        let (active, dimensions) =
                            selection.with(|s| (s.source.dimension.clone(), s.dimensions.clone()));
                        dimensions
                            .into_iter()
                            .map(|dimension| {
                                let selected = dimension == active;
                                view! {
                                    <option value=dimension.clone() selected=selected>
                                        {dimension.clone()}
                                    </option>
                                }
                            })
                            .collect::<Vec<_>>()
                    }}
                </select>
                <span style="color: #666; font-size: 0.85rem;">{status}</span>
            </header>
            <nav style="display: flex; flex-wrap: wrap; gap: 6px; height: 60px; overflow-y: auto;">
                <For
                    each=players
                    key=|player| player.uuid.clone()
                    children=move |player| {
                        let (x, z) = (player.x, player.z);
                        view! {
                            <button on:click=move |_| focus.set(Some((x, z)))>
                                {player.display_name().to_string()}
                            </button>
                        }
                    }
                />
            </nav>
            <MapCanvas />
        </div>
    }
    .into_any()
}
