// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Widgets page: draws the materialized widget document and forwards input
// and clicks back to the widget host.

use dioxus::prelude::*;

use kandy_widgets::{Control, Element as WidgetElement, MessageEntry, WidgetNode};

use crate::services::app_services::AppServices;
use crate::state::AppState;

const FIELD_STYLE: &str = "padding: 8px; margin: 4px 4px 4px 0; border: 1px solid #ccc; border-radius: 6px;";
const BUTTON_STYLE: &str = "padding: 8px 16px; margin: 4px 4px 4px 0; border-radius: 8px; border: 1px solid #007aff; background: white; color: #007aff;";

#[component]
pub fn Widgets() -> Element {
    let state = use_context::<Signal<AppState>>();
    let svc = use_context::<AppServices>();

    // Reading the revision subscribes this page to document changes.
    let revision = state.read().revision;
    let document = svc.plugin().host().document();
    let platform = svc.plugin().services().platform_name().to_string();

    rsx! {
        div {
            h1 { "Kandy" }
            p { style: "color: #666;", "Platform: {platform} (revision {revision})" }

            if document.widgets().is_empty() {
                p { style: "color: #888;", "No widgets were materialized." }
            }
            for node in document.widgets().iter() {
                {
                    let elements: Vec<WidgetElement> = document.content(&node.id).into_iter().cloned().collect();
                    rsx! {
                        WidgetCard { key: "{node.id}", node: node.clone(), elements }
                    }
                }
            }

            if let Some(ref msg) = state.read().status_message {
                p { style: "color: #ff9500; font-size: 14px; margin-top: 12px;", "{msg}" }
            }
        }
    }
}

#[component]
fn WidgetCard(node: WidgetNode, elements: Vec<WidgetElement>) -> Element {
    rsx! {
        section {
            style: "padding: 12px; margin: 12px 0; border: 1px solid #e0e0e0; border-radius: 8px;",
            div { style: "font-size: 12px; color: #888; margin-bottom: 8px;",
                "{node.kind} \u{00B7} {node.id}"
            }
            for element in elements.into_iter() {
                ControlView { key: "{element.id}", element: element.clone() }
            }
        }
    }
}

#[component]
fn ControlView(element: WidgetElement) -> Element {
    let svc = use_context::<AppServices>();
    let host = svc.plugin().host().clone();
    let id = element.id.clone();

    match element.control {
        Control::Input {
            input_type,
            placeholder,
            value,
            max_length,
        } => {
            let target = id.clone();
            rsx! {
                input {
                    id: "{id}",
                    style: FIELD_STYLE,
                    r#type: input_type.as_str(),
                    placeholder: "{placeholder}",
                    value: "{value}",
                    maxlength: max_length.map(|m| m.to_string()),
                    oninput: move |evt: FormEvent| {
                        if let Err(e) = host.set_value(&target, &evt.value()) {
                            tracing::warn!(error = %e, "input rejected");
                        }
                    },
                }
            }
        }
        Control::Checkbox { label, checked } => {
            let target = id.clone();
            rsx! {
                label { style: "margin-right: 8px;",
                    input {
                        id: "{id}",
                        r#type: "checkbox",
                        checked,
                        onclick: move |_| {
                            if let Err(e) = host.set_checked(&target, !checked) {
                                tracing::warn!(error = %e, "checkbox rejected");
                            }
                        },
                    }
                    " {label}"
                }
            }
        }
        Control::Button { label } => {
            let target = id.clone();
            rsx! {
                button {
                    id: "{id}",
                    style: BUTTON_STYLE,
                    onclick: move |_| {
                        tracing::info!(control = %target, "clicked");
                        if let Err(e) = host.click(&target) {
                            tracing::warn!(error = %e, "click ignored");
                        }
                    },
                    "{label}"
                }
            }
        }
        Control::MessageList { entries } => rsx! {
            ul { id: "{id}", style: "list-style: none; padding: 0; margin-top: 8px;",
                if entries.is_empty() {
                    li { style: "color: #aaa; font-size: 14px;", "No messages yet." }
                }
                for entry in entries.into_iter() {
                    MessageRow { entry }
                }
            }
        },
    }
}

#[component]
fn MessageRow(entry: MessageEntry) -> Element {
    let svc = use_context::<AppServices>();
    let uuid = entry.id.clone();

    rsx! {
        li {
            style: "padding: 8px 0; border-bottom: 1px solid #f0f0f0; cursor: pointer;",
            onclick: move |_| {
                if let Some(ref uuid) = uuid {
                    spawn(svc.plugin().mark_message_as_received(uuid));
                }
            },
            h3 { style: "font-size: 14px; margin: 0;", "{entry.sender}" }
            p { style: "margin: 4px 0;",
                if entry.unread {
                    strong { "{entry.text}" }
                } else {
                    "{entry.text}"
                }
            }
            p { style: "color: #888; font-size: 12px; margin: 0;", "{entry.timestamp}" }
        }
    }
}
