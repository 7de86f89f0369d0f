// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>

//! Kandy: declarative widgets.
//!
//! A host passes typed [`WidgetConfig`] records to [`WidgetHost::materialize`];
//! each becomes a root in a toolkit-agnostic [`Document`] with its controls
//! bound to service facade calls. [`KandyPlugin`] ties the host, the service
//! facade and the notification dispatcher together behind `initialize`.

pub mod descriptor;
pub mod dom;
pub mod host;
pub mod plugin;
pub mod resources;

pub use descriptor::WidgetConfig;
pub use dom::{Control, Document, Element, InputType, MessageEntry, WidgetNode};
pub use host::{Continuation, WidgetHost};
pub use plugin::{Initialized, KandyPlugin};
pub use resources::{LogLoader, ResourceLoader};
