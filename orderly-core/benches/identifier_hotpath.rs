use criterion::{criterion_group, criterion_main, Criterion};
use orderly_core::{Identifier, ResolvedOrder, DEFAULT_SHORT_ID_LEN};
use serde_json::json;
use std::hint::black_box;

const INPUTS: [&str; 4] = [
    "a1b2c3d4-0000-4000-8000-000000000001",
    "A1B2C3D4",
    "INV-2024-0042",
    "  0000aaaa-0000-4000-8000-00000000000f  ",
];

fn bench_identifier_classification(c: &mut Criterion) {
    c.bench_function("identifier/parse_and_shape", |b| {
        b.iter(|| {
            for input in INPUTS {
                let id = Identifier::parse(black_box(input), DEFAULT_SHORT_ID_LEN)
                    .expect("parse identifier");
                black_box(id.shape());
            }
        });
    });
}

fn bench_order_decode(c: &mut Criterion) {
    let record = json!({
        "id": "a1b2c3d4-0000-4000-8000-000000000001",
        "reference_number": "INV-2024-0042",
        "status": "out_for_delivery",
        "total_amount": 120.5,
        "order_items": [
            {"id": "0000bbbb-0000-4000-8000-000000000001", "quantity": 3, "unit_price": 12.5}
        ],
        "delivery_assignments": [
            {
                "id": "0000cccc-0000-4000-8000-000000000001",
                "order_id": "a1b2c3d4-0000-4000-8000-000000000001",
                "delivery_partner_id": "0000dddd-0000-4000-8000-000000000001"
            }
        ]
    });
    let record = record.as_object().cloned().expect("object record");

    c.bench_function("order/decode_record", |b| {
        b.iter(|| {
            let order = ResolvedOrder::from_record("orders", black_box(record.clone()))
                .expect("decode order");
            black_box(order.short_id(DEFAULT_SHORT_ID_LEN));
        });
    });
}

criterion_group!(benches, bench_identifier_classification, bench_order_decode);
criterion_main!(benches);
