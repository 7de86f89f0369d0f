// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Kandy desktop demo
//
// Entry point. Initialises logging, starts the simulated native shell, brings
// the plugin up with a demo widget set, and launches the Dioxus UI.

mod pages;
mod services;
mod state;

use dioxus::prelude::*;

use pages::events::Events;
use pages::widgets::Widgets;

use services::app_services::AppServices;
use state::AppState;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    tracing::info!("Kandy demo starting");

    dioxus::launch(app);
}

/// Top-level route enum.
#[derive(Debug, Clone, Routable, PartialEq)]
enum Route {
    #[layout(TabLayout)]
    #[route("/")]
    Widgets {},
    #[route("/events")]
    Events {},
}

/// Root component.
fn app() -> Element {
    let svc = use_hook(AppServices::init);

    use_context_provider(|| svc.clone());
    use_context_provider(|| Signal::new(AppState::default()));

    rsx! {
        Router::<Route> {}
    }
}

/// Persistent bottom tab layout wrapping all pages. Also owns the two pumps
/// that feed UI state: document revisions and UI events.
#[component]
fn TabLayout() -> Element {
    let svc = use_context::<AppServices>();
    let mut state = use_context::<Signal<AppState>>();

    let svc_events = svc.clone();
    let _events = use_resource(move || {
        let svc = svc_events.clone();
        async move {
            let Some(mut events) = svc.take_ui_events() else {
                return;
            };
            while let Some(event) = events.recv().await {
                state.write().record(event);
            }
        }
    });

    let _revisions = use_resource(move || {
        let svc = svc.clone();
        async move {
            let mut revisions = svc.plugin().host().subscribe();
            while revisions.changed().await.is_ok() {
                let revision = *revisions.borrow_and_update();
                state.write().revision = revision;
            }
        }
    });

    rsx! {
        div { class: "app-container",
            style: "display: flex; flex-direction: column; height: 100vh; font-family: system-ui, -apple-system, sans-serif;",

            div { class: "page-content",
                style: "flex: 1; overflow-y: auto; padding: 16px;",
                Outlet::<Route> {}
            }

            nav { class: "tab-bar",
                style: "display: flex; justify-content: space-around; padding: 8px 0; border-top: 1px solid #e0e0e0; background: #fafafa;",
                TabButton { to: Route::Widgets {}, label: "Widgets", icon: "W" }
                TabButton { to: Route::Events {}, label: "Events", icon: "E" }
            }
        }
    }
}

#[component]
fn TabButton(to: Route, label: &'static str, icon: &'static str) -> Element {
    rsx! {
        Link { to: to,
            style: "display: flex; flex-direction: column; align-items: center; text-decoration: none; color: #333; font-size: 12px;",
            span { style: "font-size: 20px;", "{icon}" }
            span { "{label}" }
        }
    }
}
