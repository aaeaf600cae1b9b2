// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for building wire payloads and relay emails from a
// report carrying a budget-sized photo.

use criterion::{Criterion, black_box, criterion_group, criterion_main};

use treasure_core::types::{CompressedImage, Coordinates, ReportId, TreasureReport};
use treasure_mail::payload::{ApiPayload, WidgetParams};
use treasure_mail::relay::compose_email;

/// A report whose image sits right at the default 35 KiB budget.
fn budget_report() -> TreasureReport {
    let data = "A".repeat(35 * 1024);
    TreasureReport {
        id: ReportId::new(),
        recipient: "finder@example.com".into(),
        description: "Tarnished brass compass under the pier".into(),
        coordinates: Some(Coordinates::new(37.422, -122.084)),
        image: Some(CompressedImage {
            encoded_size: data.len(),
            data,
            width: 600,
            height: 450,
            quality: 0.6,
        }),
    }
}

fn bench_api_payload(c: &mut Criterion) {
    let report = budget_report();
    c.bench_function("api payload to_string", |b| {
        b.iter(|| {
            let payload = ApiPayload::from_report(black_box(&report));
            serde_json::to_string(&payload).expect("serialize")
        });
    });
}

fn bench_widget_params(c: &mut Criterion) {
    let report = budget_report();
    c.bench_function("widget params + size", |b| {
        b.iter(|| WidgetParams::from_report(black_box(&report), "https://www.google.com/maps").payload_size());
    });
}

fn bench_compose_email(c: &mut Criterion) {
    let payload = ApiPayload::from_report(&budget_report());
    c.bench_function("compose relay email", |b| {
        b.iter(|| {
            compose_email(
                black_box(&payload),
                "Treasure Finder <onboarding@resend.dev>",
                "https://www.google.com/maps",
            )
            .expect("compose")
        });
    });
}

criterion_group!(benches, bench_api_payload, bench_widget_params, bench_compose_email);
criterion_main!(benches);
