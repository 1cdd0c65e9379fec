use std::hint::black_box;
use std::sync::Arc;

use checkout::{
    Brand, InMemoryServices, PaymentSessionController, ProviderKind, ProviderSettings, RawSignal,
    RedirectTemplates, SessionRequest, match_success_code,
};
use common::{Currency, Money};
use criterion::{Criterion, criterion_group, criterion_main};

const CODES: &[&str] = &[
    "000.000.000",
    "000.100.110",
    "000.400.110",
    "000.200.100",
    "000.100.202",
    "800.100.151",
    "100.396.101",
];

fn bench_match_success_code(c: &mut Criterion) {
    c.bench_function("result_codes/match_success_code", |b| {
        b.iter(|| {
            for code in CODES {
                black_box(match_success_code(black_box(code)));
            }
        });
    });
}

fn bench_classify_redirect(c: &mut Criterion) {
    let templates = RedirectTemplates::new(
        "https://checkout.example.com/bnpl/success",
        "https://checkout.example.com/bnpl/failure",
        "https://checkout.example.com/bnpl/cancel",
    );
    let urls = [
        "https://bnpl.example.com/session/42/otp",
        "https://checkout.example.com/bnpl/cancel",
        "https://checkout.example.com/bnpl/success?payment_id=p-1",
    ];

    c.bench_function("redirect/classify", |b| {
        b.iter(|| {
            for url in &urls {
                black_box(templates.classify(black_box(url)));
            }
        });
    });
}

fn bench_card_session(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let doubles = InMemoryServices::new();
    let settings = Arc::new(ProviderSettings::default());

    c.bench_function("controller/sync_card_session", |b| {
        b.iter(|| {
            rt.block_on(async {
                let request = SessionRequest::new(
                    Money::from_major(120),
                    Currency::new("SAR").unwrap(),
                    ProviderKind::Card,
                )
                .with_brand(Brand::Mada);
                let controller =
                    PaymentSessionController::new(request, doubles.services(), settings.clone())
                        .unwrap();
                controller.start().await.unwrap();
                controller
                    .handle(RawSignal::Completed {
                        resource_path: None,
                    })
                    .await;
            });
        });
    });
}

criterion_group!(
    benches,
    bench_match_success_code,
    bench_classify_redirect,
    bench_card_session
);
criterion_main!(benches);
