// benches/benchmarks.rs — Hot-path benchmarks: payload conversion, dispatch

use std::path::Path;

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use tideflow::engine::{Event, Payload};
use tideflow::script::{dynamic_to_json, json_to_dynamic};
use tideflow::workflows::{ScriptWorkflow, Workflow};

fn sample_payload() -> Payload {
    let value = serde_json::json!({
        "from": "alice@example.com",
        "subject": "nightly build",
        "body": "all 412 tests passed",
        "labels": ["ci", "nightly"],
        "attempt": 3
    });
    match value {
        serde_json::Value::Object(map) => map,
        _ => unreachable!(),
    }
}

fn bench_payload_conversion(c: &mut Criterion) {
    let payload = serde_json::Value::Object(sample_payload());

    c.bench_function("json_to_dynamic", |b| {
        b.iter(|| json_to_dynamic(black_box(&payload)))
    });

    let dynamic = json_to_dynamic(&payload);
    c.bench_function("dynamic_to_json", |b| {
        b.iter(|| dynamic_to_json(black_box(&dynamic)))
    });
}

fn bench_workflow_dispatch(c: &mut Criterion) {
    let workflow = ScriptWorkflow::load_str(
        Path::new("bench.rhai"),
        r#"
on("email", "mail");

fn mail(payload) {
    let tagged = payload.subject + " [seen]";
    tagged.len()
}
"#,
    )
    .unwrap();

    let event = Event::new("email", sample_payload());
    c.bench_function("workflow_run_matched", |b| {
        b.iter(|| workflow.run(black_box(&event)))
    });

    let tick = Event::tick("schedule");
    c.bench_function("workflow_run_unmatched", |b| {
        b.iter(|| workflow.run(black_box(&tick)))
    });
}

criterion_group!(benches, bench_payload_conversion, bench_workflow_dispatch);
criterion_main!(benches);
