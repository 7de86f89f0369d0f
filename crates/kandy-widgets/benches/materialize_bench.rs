// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for widget materialization and id generation.

use std::sync::Arc;

use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};

use kandy_bridge::{BridgeContext, Services, default_invoker};
use kandy_core::types::WidgetKind;
use kandy_widgets::{WidgetConfig, WidgetHost};

fn host() -> WidgetHost {
    let services = Services::new(default_invoker(), "KandyPlugin");
    WidgetHost::new(services, Arc::new(BridgeContext::default()), "kandy")
}

/// Id generation scans upward from zero, so a batch of one kind is quadratic.
fn bench_generated_ids(c: &mut Criterion) {
    let mut group = c.benchmark_group("materialize");
    for count in [8usize, 64] {
        group.bench_function(format!("{count} sms widgets"), |b| {
            b.iter_batched(
                || (host(), vec![WidgetConfig::new(WidgetKind::Sms); count]),
                |(host, configs)| black_box(host.materialize(configs)),
                BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

/// One of each kind, the shape a real page has.
fn bench_mixed_page(c: &mut Criterion) {
    let page = vec![
        WidgetConfig::new(WidgetKind::Provisioning).with_attr("country-code", "US"),
        WidgetConfig::new(WidgetKind::Access),
        WidgetConfig::new(WidgetKind::Call).with_attr("call-type", "pstn"),
        WidgetConfig::new(WidgetKind::Sms),
        WidgetConfig::new(WidgetKind::Chat),
    ];
    c.bench_function("materialize mixed page", |b| {
        b.iter_batched(
            || (host(), page.clone()),
            |(host, configs)| black_box(host.materialize(configs)),
            BatchSize::SmallInput,
        );
    });
}

criterion_group!(benches, bench_generated_ids, bench_mixed_page);
criterion_main!(benches);
