// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Toolkit-agnostic widget document.
//
// The widget host renders into this tree; a UI layer (the Dioxus app, a web
// view, a test) draws it and reports input back by element id. Ids are unique
// across widget roots, their controls, host-provided elements, and message
// entries, so `contains` answers the same question `getElementById` would.

use std::collections::{HashMap, HashSet};
use std::fmt::Write as _;

use kandy_core::error::{KandyError, Result};
use kandy_core::types::WidgetKind;

/// Input flavour, mirrors the HTML `type` attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputType {
    Text,
    Tel,
    Password,
}

impl InputType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Tel => "tel",
            Self::Password => "password",
        }
    }
}

/// A rendered message in a chat list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageEntry {
    /// Message UUID for received messages; sent messages have none.
    pub id: Option<String>,
    pub sender: String,
    pub text: String,
    pub timestamp: String,
    /// Received and not yet marked as received with the SDK.
    pub unread: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Control {
    Input {
        input_type: InputType,
        placeholder: String,
        value: String,
        max_length: Option<usize>,
    },
    Checkbox {
        label: String,
        checked: bool,
    },
    Button {
        label: String,
    },
    /// Most recent entry first.
    MessageList {
        entries: Vec<MessageEntry>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub id: String,
    pub control: Control,
}

impl Element {
    pub fn input(id: impl Into<String>, input_type: InputType, placeholder: &str) -> Self {
        Self {
            id: id.into(),
            control: Control::Input {
                input_type,
                placeholder: placeholder.to_string(),
                value: String::new(),
                max_length: None,
            },
        }
    }

    pub fn button(id: impl Into<String>, label: &str) -> Self {
        Self {
            id: id.into(),
            control: Control::Button {
                label: label.to_string(),
            },
        }
    }

    pub fn checkbox(id: impl Into<String>, label: &str) -> Self {
        Self {
            id: id.into(),
            control: Control::Checkbox {
                label: label.to_string(),
                checked: false,
            },
        }
    }

    pub fn message_list(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            control: Control::MessageList {
                entries: Vec::new(),
            },
        }
    }

    /// Builder for inputs: initial value.
    pub fn with_value(mut self, initial: &str) -> Self {
        if let Control::Input { value, .. } = &mut self.control {
            *value = initial.to_string();
        }
        self
    }

    /// Builder for inputs: maximum length. Also truncates the current value.
    pub fn with_max_length(mut self, max: usize) -> Self {
        if let Control::Input {
            value, max_length, ..
        } = &mut self.control
        {
            *max_length = Some(max);
            *value = truncate(value, Some(max));
        }
        self
    }
}

/// A materialized widget: its root id, kind, and rendered content in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WidgetNode {
    pub id: String,
    pub kind: WidgetKind,
    pub content: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct Document {
    widgets: Vec<WidgetNode>,
    elements: HashMap<String, Element>,
    /// Elements owned by the host page rather than a widget.
    host_elements: HashSet<String>,
    /// Message entry id -> id of the list holding it.
    entries: HashMap<String, String>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.widgets.iter().any(|w| w.id == id)
            || self.elements.contains_key(id)
            || self.entries.contains_key(id)
    }

    pub fn widgets(&self) -> &[WidgetNode] {
        &self.widgets
    }

    pub fn widget(&self, id: &str) -> Option<&WidgetNode> {
        self.widgets.iter().find(|w| w.id == id)
    }

    pub fn element(&self, id: &str) -> Option<&Element> {
        self.elements.get(id)
    }

    /// Elements of a widget in render order.
    pub fn content(&self, widget_id: &str) -> Vec<&Element> {
        self.widget(widget_id)
            .map(|w| w.content.iter().filter_map(|id| self.elements.get(id)).collect())
            .unwrap_or_default()
    }

    /// Add an element that belongs to the host page, outside any widget.
    pub fn insert_host_element(&mut self, element: Element) -> Result<()> {
        if self.contains(&element.id) {
            return Err(KandyError::DuplicateId(element.id));
        }
        self.host_elements.insert(element.id.clone());
        self.elements.insert(element.id.clone(), element);
        Ok(())
    }

    /// Add an empty widget root.
    pub fn add_widget(&mut self, id: &str, kind: WidgetKind) -> Result<()> {
        if self.contains(id) {
            return Err(KandyError::DuplicateId(id.to_string()));
        }
        self.widgets.push(WidgetNode {
            id: id.to_string(),
            kind,
            content: Vec::new(),
        });
        Ok(())
    }

    /// Replace everything rendered inside a widget.
    ///
    /// Elements whose id is already taken elsewhere in the document are
    /// skipped, as a second element with the same id would be unreachable.
    pub fn replace_content(&mut self, widget_id: &str, content: Vec<Element>) -> Result<()> {
        let idx = self
            .widgets
            .iter()
            .position(|w| w.id == widget_id)
            .ok_or_else(|| KandyError::UnknownElement(widget_id.to_string()))?;

        for old in std::mem::take(&mut self.widgets[idx].content) {
            self.elements.remove(&old);
            self.entries.retain(|_, list| *list != old);
        }

        let mut ids = Vec::with_capacity(content.len());
        for element in content {
            if self.contains(&element.id) {
                tracing::warn!(widget = widget_id, id = %element.id, "element id already in use; skipped");
                continue;
            }
            ids.push(element.id.clone());
            self.elements.insert(element.id.clone(), element);
        }
        self.widgets[idx].content = ids;
        Ok(())
    }

    /// Drop a widget root with everything rendered inside it, freeing its ids.
    pub fn remove_widget(&mut self, widget_id: &str) -> Option<WidgetNode> {
        let idx = self.widgets.iter().position(|w| w.id == widget_id)?;
        let node = self.widgets.remove(idx);
        for id in &node.content {
            self.elements.remove(id);
            self.entries.retain(|_, list| list != id);
        }
        Some(node)
    }

    /// Current value of an input. `None` if there is no such input.
    pub fn value(&self, id: &str) -> Option<&str> {
        match &self.elements.get(id)?.control {
            Control::Input { value, .. } => Some(value),
            _ => None,
        }
    }

    pub fn set_value(&mut self, id: &str, new_value: &str) -> Result<()> {
        match self.elements.get_mut(id).map(|e| &mut e.control) {
            Some(Control::Input {
                value, max_length, ..
            }) => {
                *value = truncate(new_value, *max_length);
                Ok(())
            }
            _ => Err(KandyError::UnknownElement(id.to_string())),
        }
    }

    pub fn checked(&self, id: &str) -> Option<bool> {
        match &self.elements.get(id)?.control {
            Control::Checkbox { checked, .. } => Some(*checked),
            _ => None,
        }
    }

    pub fn set_checked(&mut self, id: &str, state: bool) -> Result<()> {
        match self.elements.get_mut(id).map(|e| &mut e.control) {
            Some(Control::Checkbox { checked, .. }) => {
                *checked = state;
                Ok(())
            }
            _ => Err(KandyError::UnknownElement(id.to_string())),
        }
    }

    /// Put `entry` at the top of the message list `list_id`.
    ///
    /// Returns `Ok(false)` without touching the list when the entry's id is
    /// already present in the document.
    pub fn prepend_entry(&mut self, list_id: &str, entry: MessageEntry) -> Result<bool> {
        if entry.id.as_deref().is_some_and(|id| self.contains(id)) {
            return Ok(false);
        }
        let Some(Control::MessageList { entries }) = self.elements.get_mut(list_id).map(|e| &mut e.control)
        else {
            return Err(KandyError::UnknownElement(list_id.to_string()));
        };
        if let Some(id) = &entry.id {
            self.entries.insert(id.clone(), list_id.to_string());
        }
        entries.insert(0, entry);
        Ok(true)
    }

    /// Clear the unread mark on a received message. Returns whether it was found.
    pub fn mark_read(&mut self, entry_id: &str) -> bool {
        let Some(list_id) = self.entries.get(entry_id) else {
            return false;
        };
        let Some(Control::MessageList { entries }) = self.elements.get_mut(list_id).map(|e| &mut e.control)
        else {
            return false;
        };
        match entries.iter_mut().find(|e| e.id.as_deref() == Some(entry_id)) {
            Some(entry) => {
                entry.unread = false;
                true
            }
            None => false,
        }
    }

    /// HTML rendering of one widget, in the markup the web plugin produced.
    pub fn markup(&self, widget_id: &str) -> Option<String> {
        let widget = self.widget(widget_id)?;
        let mut out = String::new();
        for element in self.content(&widget.id) {
            render_element(&mut out, element);
        }
        Some(out)
    }
}

fn truncate(value: &str, max: Option<usize>) -> String {
    match max {
        Some(max) => value.chars().take(max).collect(),
        None => value.to_string(),
    }
}

fn render_element(out: &mut String, element: &Element) {
    let id = escape(&element.id);
    // Writing into a String cannot fail.
    let _ = match &element.control {
        Control::Input {
            input_type,
            placeholder,
            value,
            max_length,
        } => {
            let _ = write!(
                out,
                r#"<input type="{}" id="{id}" placeholder="{}""#,
                input_type.as_str(),
                escape(placeholder)
            );
            if let Some(max) = max_length {
                let _ = write!(out, r#" maxlength="{max}""#);
            }
            if !value.is_empty() {
                let _ = write!(out, r#" value="{}""#, escape(value));
            }
            write!(out, "/>")
        }
        Control::Checkbox { label, checked } => write!(
            out,
            r#"<label><input type="checkbox" id="{id}"{}/>{}</label>"#,
            if *checked { " checked" } else { "" },
            escape(label)
        ),
        Control::Button { label } => write!(out, r#"<button id="{id}">{}</button>"#, escape(label)),
        Control::MessageList { entries } => {
            let _ = write!(out, r#"<div id="{id}">"#);
            for entry in entries {
                render_entry(out, entry);
            }
            write!(out, "</div>")
        }
    };
}

fn render_entry(out: &mut String, entry: &MessageEntry) {
    let text = if entry.unread {
        format!("<strong>{}</strong>", escape(&entry.text))
    } else {
        escape(&entry.text)
    };
    let _ = match &entry.id {
        Some(id) => write!(
            out,
            r#"<li><h3>{}</h3><p id="{}">{text}</p><p>{}</p></li>"#,
            escape(&entry.sender),
            escape(id),
            escape(&entry.timestamp)
        ),
        None => write!(
            out,
            "<li><h3>{}</h3><p>{text}</p><p>{}</p></li>",
            escape(&entry.sender),
            escape(&entry.timestamp)
        ),
    };
}

fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn received(id: &str, text: &str) -> MessageEntry {
        MessageEntry {
            id: Some(id.into()),
            sender: "alice@example.com".into(),
            text: text.into(),
            timestamp: String::new(),
            unread: true,
        }
    }

    fn chat_doc() -> Document {
        let mut doc = Document::new();
        doc.add_widget("w", WidgetKind::Chat).unwrap();
        doc.replace_content("w", vec![Element::message_list("w-messages")])
            .unwrap();
        doc
    }

    #[test]
    fn ids_are_unique_across_roots_elements_and_host() {
        let mut doc = Document::new();
        doc.add_widget("w", WidgetKind::Sms).unwrap();
        doc.replace_content("w", vec![Element::button("w-btn-send", "Send")])
            .unwrap();

        assert!(matches!(doc.add_widget("w", WidgetKind::Sms), Err(KandyError::DuplicateId(_))));
        assert!(doc.add_widget("w-btn-send", WidgetKind::Chat).is_err());
        assert!(doc
            .insert_host_element(Element::input("w", InputType::Text, ""))
            .is_err());
        assert!(doc
            .insert_host_element(Element::input("page-phone", InputType::Tel, ""))
            .is_ok());
        assert!(doc.contains("page-phone"));
    }

    #[test]
    fn replacing_content_drops_old_elements() {
        let mut doc = Document::new();
        doc.add_widget("a", WidgetKind::Access).unwrap();
        doc.replace_content("a", vec![Element::button("a-btn-login", "Login")])
            .unwrap();
        doc.replace_content("a", vec![Element::button("a-btn-logout", "bob")])
            .unwrap();

        assert!(!doc.contains("a-btn-login"));
        assert_eq!(doc.content("a").len(), 1);
        assert!(doc.replace_content("missing", vec![]).is_err());
    }

    #[test]
    fn removed_widget_frees_its_ids() {
        let mut doc = chat_doc();
        doc.prepend_entry("w-messages", received("m1", "hi")).unwrap();

        let node = doc.remove_widget("w").unwrap();
        assert_eq!(node.content, vec!["w-messages".to_string()]);
        assert!(!doc.contains("w"));
        assert!(!doc.contains("w-messages"));
        assert!(!doc.contains("m1"));
        assert!(doc.remove_widget("w").is_none());
        assert!(doc.add_widget("w", WidgetKind::Chat).is_ok());
    }

    #[test]
    fn inputs_respect_max_length() {
        let mut doc = Document::new();
        doc.add_widget("p", WidgetKind::Provisioning).unwrap();
        doc.replace_content(
            "p",
            vec![Element::input("p-region-code", InputType::Text, "").with_value("USA").with_max_length(2)],
        )
        .unwrap();
        assert_eq!(doc.value("p-region-code"), Some("US"));

        doc.set_value("p-region-code", "CAN").unwrap();
        assert_eq!(doc.value("p-region-code"), Some("CA"));
        assert!(doc.set_value("p", "x").is_err());
        assert_eq!(doc.checked("p-region-code"), None);
    }

    #[test]
    fn entries_dedupe_by_id_and_stack_newest_first() {
        let mut doc = chat_doc();
        assert!(doc.prepend_entry("w-messages", received("m1", "first")).unwrap());
        assert!(!doc.prepend_entry("w-messages", received("m1", "again")).unwrap());
        assert!(doc.prepend_entry("w-messages", received("m2", "second")).unwrap());

        let Some(Control::MessageList { entries }) = doc.element("w-messages").map(|e| &e.control) else {
            panic!("message list missing");
        };
        let texts: Vec<_> = entries.iter().map(|e| e.text.as_str()).collect();
        assert_eq!(texts, ["second", "first"]);
        assert!(doc.contains("m1"));
    }

    #[test]
    fn mark_read_clears_emphasis() {
        let mut doc = chat_doc();
        doc.prepend_entry("w-messages", received("m1", "hi")).unwrap();
        assert!(doc.markup("w").unwrap().contains("<strong>hi</strong>"));

        assert!(doc.mark_read("m1"));
        assert!(!doc.mark_read("m9"));
        let html = doc.markup("w").unwrap();
        assert!(html.contains(r#"<p id="m1">hi</p>"#));
    }

    #[test]
    fn markup_escapes_user_text() {
        let mut doc = chat_doc();
        doc.prepend_entry(
            "w-messages",
            MessageEntry {
                id: None,
                sender: "You: ".into(),
                text: "<script>\"x\"</script>".into(),
                timestamp: String::new(),
                unread: false,
            },
        )
        .unwrap();
        let html = doc.markup("w").unwrap();
        assert!(html.contains("&lt;script&gt;&quot;x&quot;&lt;/script&gt;"));
        assert!(!html.contains("<script>"));
    }
}
