// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Typed widget configuration records.
//
// A host application describes each widget it wants as a `WidgetConfig`
// (kind, optional id, free-form attributes) instead of leaving markup in a
// document to be scanned.

use std::collections::BTreeMap;

use kandy_core::error::Result;
use kandy_core::types::WidgetKind;
use serde::{Deserialize, Serialize};

/// One widget to materialize.
///
/// Serialized the way the markup attributes read:
/// `{"widget": "call", "id": "dialer", "call-type": "pstn"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WidgetConfig {
    #[serde(rename = "widget")]
    pub kind: WidgetKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(flatten)]
    pub attributes: BTreeMap<String, String>,
}

impl WidgetConfig {
    pub fn new(kind: WidgetKind) -> Self {
        Self {
            kind,
            id: None,
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Build from raw markup attributes. `widget` selects the kind and `id`
    /// the explicit id; everything else is kept as an attribute.
    pub fn from_attributes<I, K, V>(attributes: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut attributes: BTreeMap<String, String> = attributes
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        let kind = attributes
            .remove("widget")
            .unwrap_or_default()
            .parse::<WidgetKind>()?;
        let id = attributes.remove("id");
        Ok(Self {
            kind,
            id,
            attributes,
        })
    }

    /// The explicit id, if present and non-empty.
    pub fn explicit_id(&self) -> Option<&str> {
        self.id.as_deref().filter(|id| !id.is_empty())
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// The `action` attribute (provisioning widgets).
    pub fn action(&self) -> Option<&str> {
        self.attr("action")
    }

    /// Hook named by the `<action>-success` attribute.
    pub fn success_hook(&self, action: &str) -> Option<&str> {
        self.attr(&format!("{action}-success"))
    }

    /// Hook named by the `<action>-error` attribute.
    pub fn error_hook(&self, action: &str) -> Option<&str> {
        self.attr(&format!("{action}-error"))
    }
}
