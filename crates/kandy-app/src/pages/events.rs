// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Events page: notifications, hook calls and alerts as they arrive.

use dioxus::prelude::*;

use crate::state::AppState;

#[component]
pub fn Events() -> Element {
    let mut state = use_context::<Signal<AppState>>();

    rsx! {
        div {
            div { style: "display: flex; justify-content: space-between; align-items: center;",
                h1 { "Events" }
                button {
                    style: "padding: 8px 16px; border-radius: 8px; border: 1px solid #ccc; background: white;",
                    onclick: move |_| {
                        state.write().events.clear();
                        state.write().status_message = None;
                    },
                    "Clear"
                }
            }

            if state.read().events.is_empty() {
                p { style: "text-align: center; color: #aaa; margin: 48px 0;",
                    "Nothing received yet."
                }
            } else {
                for event in state.read().events.iter() {
                    {
                        let at = event.at.format("%H:%M:%S").to_string();
                        rsx! {
                            div { style: "padding: 8px 0; border-bottom: 1px solid #f0f0f0;",
                                span { style: "color: #888; font-size: 12px; margin-right: 8px;", "{at}" }
                                strong { "{event.label}" }
                                p { style: "font-family: monospace; font-size: 12px; margin: 4px 0; color: #444;",
                                    "{event.detail}"
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}
