// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for notification routing in the kandy-bridge crate.

use std::sync::Arc;

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use serde_json::json;

use kandy_bridge::{BridgeContext, NotificationDispatcher};
use kandy_core::types::{Listener, NotificationChannel, NotificationEvent};

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

/// Resolve and run a bound listener, and drop an unknown action.
fn bench_dispatch(c: &mut Criterion) {
    let ctx = Arc::new(BridgeContext::default());
    for listener in Listener::ALL {
        ctx.listeners.set(listener, |v| {
            black_box(v);
        });
    }
    let dispatcher = NotificationDispatcher::new(ctx);

    let mut group = c.benchmark_group("dispatch");
    group.bench_function("bound listener", |b| {
        b.iter(|| {
            dispatcher.dispatch(NotificationEvent::new(
                black_box("onDeviceAddressBookChanged"),
                json!({"count": 3}),
            ))
        });
    });
    group.bench_function("unknown action", |b| {
        b.iter(|| dispatcher.dispatch(NotificationEvent::new(black_box("onUnknown"), json!(null))));
    });
    group.finish();
}

/// Full raw-payload path: JSON parse plus routing.
fn bench_route_raw(c: &mut Criterion) {
    let ctx = Arc::new(BridgeContext::default());
    ctx.listeners.set(Listener::CallStateChanged, |v| {
        black_box(v);
    });
    let dispatcher = NotificationDispatcher::new(ctx);
    let payload = json!({"action": "onCallStateChanged", "data": {"state": "TALKING", "callId": "c-1"}});

    c.bench_function("route raw call notification", |b| {
        b.iter(|| dispatcher.route(NotificationChannel::Call, black_box(payload.clone())));
    });
}

criterion_group!(benches, bench_dispatch, bench_route_raw);
criterion_main!(benches);
