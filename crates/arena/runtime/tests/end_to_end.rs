//! End-to-end arena runs: parse, interpret, adapt, bind, run, report.

use std::sync::Arc;
use std::time::Duration;

use arena_adapter::{AdaptationConfig, AdaptationEngine};
use arena_container::{
    CallRecorder, CodeUnit, DefaultContainerFactory, Fault, InstrumentedContainerFactory,
    NativeCodeUnit,
};
use arena_runtime::*;
use arena_ssn::{parse_lines, Outcome, StimulusSheet};
use arena_types::{InterfaceSpecification, MethodSignature, Value};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn stack_spec() -> Arc<InterfaceSpecification> {
    Arc::new(
        InterfaceSpecification::new(
            "Stack",
            vec![
                MethodSignature::new("push", ["String"], ["String"]),
                MethodSignature::new("size", Vec::<&str>::new(), ["int"]),
            ],
        )
        .unwrap(),
    )
}

const STACK_SHEET: &str = r#"
{"sheet": "stack", "header": "push then size", "cells": {"A1": null, "B1": "create", "C1": "Stack"}}
{"sheet": "stack", "cells": {"A2": null, "B2": "create", "C2": "java.lang.String", "D2": "'Hello World!'"}}
{"sheet": "stack", "cells": {"A3": null, "B3": "push", "C3": "A1", "D3": "A2"}}
{"sheet": "stack", "cells": {"A4": 1, "B4": "size", "C4": "A1"}}
"#;

fn stimulus(text: &str) -> StimulusSheet {
    let sheet = parse_lines(text).unwrap().into_iter().next().unwrap();
    StimulusSheet::new(sheet, [stack_spec()])
}

fn array_stack() -> NativeCodeUnit<Vec<String>> {
    NativeCodeUnit::new("ArrayStack")
        .constructor(Vec::<&str>::new(), |_, _| Ok(Vec::new()))
        .method("push", ["String"], "String", |items, args, _| {
            let item = args[0].as_str().unwrap_or_default().to_string();
            items.push(item.clone());
            Ok(Value::Str(item))
        })
        .method("size", Vec::<&str>::new(), "int", |items, _, _| {
            Ok(Value::Int(items.len() as i64))
        })
}

/// Same behaviour under different names.
fn linked_pile() -> NativeCodeUnit<Vec<String>> {
    NativeCodeUnit::new("LinkedPile")
        .constructor(Vec::<&str>::new(), |_, _| Ok(Vec::new()))
        .method("add", ["java.lang.String"], "String", |items, args, _| {
            let item = args[0].as_str().unwrap_or_default().to_string();
            items.insert(0, item.clone());
            Ok(Value::Str(item))
        })
        .method("count", Vec::<&str>::new(), "int", |items, _, _| {
            Ok(Value::Int(items.len() as i64))
        })
}

/// Forgets every push.
fn leaky_stack() -> NativeCodeUnit<()> {
    NativeCodeUnit::new("LeakyStack")
        .constructor(Vec::<&str>::new(), |_, _| Ok(()))
        .method("push", ["String"], "String", |_, args, _| Ok(args[0].clone()))
        .method("size", Vec::<&str>::new(), "int", |_, _, _| Ok(Value::Int(0)))
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[tokio::test]
async fn stack_example_size_is_one() {
    let spec = stack_spec();
    let arena = Arena::new(ArenaConfig::default());
    let pool: Vec<Arc<dyn CodeUnit>> = vec![Arc::new(array_stack())];

    let report = arena.evaluate(&spec, &stimulus(STACK_SHEET), &pool).await.unwrap();

    let candidate = &report.candidates[0];
    assert_eq!(candidate.status, CandidateStatus::Evaluated);
    assert_eq!(candidate.adapter_count(), 1);
    let run = &candidate.runs[0];
    assert_eq!(run.converters, 0);
    let actuation = &run.actuation;
    assert_eq!(actuation.len(), 4);
    assert_eq!(actuation.header.as_deref(), Some("push then size"));
    assert_eq!(
        actuation.operations[2].outcome.value(),
        Some(&Value::from("Hello World!"))
    );
    assert_eq!(actuation.row(4).unwrap().outcome.value(), Some(&Value::Int(1)));
    assert_eq!(actuation.matches_expected()[3], Some(true));
    assert!(candidate.passed());

    let cells = actuation.cells();
    assert!(cells.contains(&(3, 0, serde_json::json!(1))));
    assert!(cells.contains(&(1, 3, serde_json::json!("Hello World!"))));
}

#[tokio::test]
async fn candidates_are_ranked_by_oracle() {
    let spec = stack_spec();
    let arena = Arena::new(ArenaConfig::default());
    let pool: Vec<Arc<dyn CodeUnit>> = vec![
        Arc::new(leaky_stack()),
        Arc::new(linked_pile()),
        Arc::new(NativeCodeUnit::<()>::new("Unrelated")),
        Arc::new(array_stack()),
    ];

    let report = arena.evaluate(&spec, &stimulus(STACK_SHEET), &pool).await.unwrap();

    let units: Vec<&str> = report.candidates.iter().map(|c| c.unit.as_str()).collect();
    assert_eq!(units, vec!["LeakyStack", "LinkedPile", "Unrelated", "ArrayStack"]);
    assert!(!report.candidate("LeakyStack").unwrap().passed());
    assert!(report.candidate("LinkedPile").unwrap().passed());
    assert_eq!(
        report.candidate("Unrelated").unwrap().status,
        CandidateStatus::NoAdapter
    );

    let passed: Vec<&str> = report.passed().map(|c| c.unit.as_str()).collect();
    assert_eq!(passed, vec!["LinkedPile", "ArrayStack"]);
    let ranking: Vec<&str> = report.ranking().iter().map(|c| c.unit.as_str()).collect();
    assert_eq!(ranking, vec!["LinkedPile", "ArrayStack", "LeakyStack", "Unrelated"]);
}

#[tokio::test]
async fn closest_names_rank_first() {
    let spec = stack_spec();
    let unit: Arc<dyn CodeUnit> = Arc::new(
        NativeCodeUnit::<Vec<String>>::new("TwoWays")
            .constructor(Vec::<&str>::new(), |_, _| Ok(Vec::new()))
            .method("append", ["String"], "String", |items, args, _| {
                items.push(args[0].as_str().unwrap_or_default().to_string());
                Ok(args[0].clone())
            })
            .method("push", ["String"], "String", |items, args, _| {
                items.push(args[0].as_str().unwrap_or_default().to_string());
                Ok(args[0].clone())
            })
            .method("size", Vec::<&str>::new(), "int", |items, _, _| {
                Ok(Value::Int(items.len() as i64))
            }),
    );

    let config = ArenaConfig {
        adaptation: AdaptationConfig {
            limit: 2,
            ..Default::default()
        },
        ..Default::default()
    };
    let adapted = AdaptationEngine::new()
        .with_config(config.adaptation.clone())
        .adapt_default(&spec, Arc::clone(&unit));
    assert_eq!(adapted.len(), 2);
    assert_eq!(adapted[0].method_binding(0).unwrap().member.name, "push");
    assert_eq!(adapted[1].method_binding(0).unwrap().member.name, "append");
    drop(adapted);

    let report = Arena::new(config)
        .evaluate(&spec, &stimulus(STACK_SHEET), &[unit])
        .await
        .unwrap();
    let runs = &report.candidates[0].runs;
    assert_eq!(runs.len(), 2);
    assert_eq!(runs[0].adapter, "TwoWays#0");
    assert_eq!(runs[1].adapter, "TwoWays#1");
    assert!(runs.iter().all(|r| r.oracle.all_matched()));
}

#[tokio::test]
async fn timed_out_statement_does_not_stop_the_sheet() {
    let spec = stack_spec();
    let stuck: Arc<dyn CodeUnit> = Arc::new(
        NativeCodeUnit::<Vec<String>>::new("StuckStack")
            .constructor(Vec::<&str>::new(), |_, _| Ok(Vec::new()))
            .method("push", ["String"], "String", |items, args, _| {
                items.push(args[0].as_str().unwrap_or_default().to_string());
                Ok(args[0].clone())
            })
            .method("size", Vec::<&str>::new(), "int", |_, _, ctx| loop {
                ctx.checkpoint()?;
                std::thread::sleep(Duration::from_millis(2));
            }),
    );
    let text = format!(
        "{}{}\n",
        STACK_SHEET,
        r#"{"sheet": "stack", "cells": {"A5": "'again'", "B5": "push", "C5": "A1", "D5": "'again'"}}"#
    );
    let config = ArenaConfig {
        execution: ExecutionConfig {
            timeout_ms: 100,
            ..Default::default()
        },
        ..Default::default()
    };

    let report = Arena::new(config)
        .evaluate(&spec, &stimulus(&text), &[stuck])
        .await
        .unwrap();

    let actuation = &report.candidates[0].runs[0].actuation;
    assert_eq!(actuation.timeout_ms, 100);
    let size = actuation.row(4).unwrap();
    assert_eq!(size.outcome, Outcome::Timeout { deadline_ms: 100 });
    assert!(Duration::from_nanos(size.duration_nanos) < Duration::from_secs(2));
    assert_eq!(size.matches_expected(), Some(false));

    let again = actuation.row(5).unwrap();
    assert_eq!(again.outcome.value(), Some(&Value::from("again")));
    assert_eq!(again.matches_expected(), Some(true));
}

#[tokio::test]
async fn sandbox_violations_are_recorded() {
    let spec = stack_spec();
    let root = tempfile::tempdir().unwrap();
    let disk: Arc<dyn CodeUnit> = Arc::new(
        NativeCodeUnit::<usize>::new("DiskStack")
            .constructor(Vec::<&str>::new(), |_, _| Ok(0))
            .method("push", ["String"], "String", |n, args, ctx| {
                let item = args[0].as_str().unwrap_or_default().to_string();
                if item == "exit" {
                    return Err(ctx.exit(1));
                }
                ctx.write(format!("item-{}.txt", n), &item)?;
                *n += 1;
                Ok(Value::Str(item))
            })
            .method("size", Vec::<&str>::new(), "int", |n, _, ctx| {
                ctx.write("/etc/arena-escape", "x")?;
                Ok(Value::Int(*n as i64))
            }),
    );
    let text = r#"
{"sheet": "disk", "cells": {"A1": null, "B1": "create", "C1": "Stack"}}
{"sheet": "disk", "cells": {"A2": "'a'", "B2": "push", "C2": "A1", "D2": "'a'"}}
{"sheet": "disk", "cells": {"A3": null, "B3": "push", "C3": "A1", "D3": "'exit'"}}
{"sheet": "disk", "cells": {"A4": 1, "B4": "size", "C4": "A1"}}
"#;
    let config = ArenaConfig {
        sandbox: SandboxConfig {
            kind: SandboxKind::Sandboxed,
            root: Some(root.path().to_path_buf()),
            ..Default::default()
        },
        ..Default::default()
    };

    let report = Arena::new(config)
        .evaluate(&spec, &stimulus(text), &[disk])
        .await
        .unwrap();

    let actuation = &report.candidates[0].runs[0].actuation;
    assert_eq!(actuation.operations[1].outcome.value(), Some(&Value::from("a")));
    for row in [3, 4] {
        let fault = actuation.row(row).unwrap().outcome.fault().unwrap();
        assert!(fault.is_sandbox_violation(), "row {}: {}", row, fault);
    }
    assert!(!std::path::Path::new("/etc/arena-escape").exists());
    // work dirs are removed with their containers
    assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn instrumented_factory_sees_every_call() {
    let spec = stack_spec();
    let recorder = Arc::new(CallRecorder::new());
    let engine = AdaptationEngine::new().with_factory(Arc::new(
        InstrumentedContainerFactory::new(Arc::new(DefaultContainerFactory))
            .with_observer(recorder.clone()),
    ));
    let arena = Arena::new(ArenaConfig::default()).with_engine(engine);
    let pool: Vec<Arc<dyn CodeUnit>> = vec![Arc::new(array_stack())];

    arena.evaluate(&spec, &stimulus(STACK_SHEET), &pool).await.unwrap();

    assert_eq!(recorder.len(), 3);
    assert_eq!(recorder.calls_to("ArrayStack"), 1);
    assert_eq!(recorder.calls_to("push"), 1);
    assert_eq!(recorder.calls_to("size"), 1);
    assert!(recorder.records().iter().all(|r| r.succeeded()));
}

#[tokio::test]
async fn faulting_candidate_reports_fault_cells() {
    let spec = stack_spec();
    let failing: Arc<dyn CodeUnit> = Arc::new(
        NativeCodeUnit::<()>::new("EmptyStack")
            .constructor(Vec::<&str>::new(), |_, _| Ok(()))
            .method("push", ["String"], "String", |_, _, _| {
                Err(Fault::thrown("IllegalStateException", "full"))
            })
            .method("size", Vec::<&str>::new(), "int", |_, _, _| panic!("size exploded")),
    );

    let report = Arena::new(ArenaConfig::default())
        .evaluate(&spec, &stimulus(STACK_SHEET), &[failing])
        .await
        .unwrap();

    let actuation = &report.candidates[0].runs[0].actuation;
    assert_eq!(
        actuation.operations[2].outcome.to_cell(),
        serde_json::json!("!fault: IllegalStateException: full")
    );
    assert!(matches!(
        actuation.operations[3].outcome.fault(),
        Some(Fault::Panicked { .. })
    ));
    let records = actuation.to_records();
    assert_eq!(records.len(), 4);
    assert_eq!(records[0].sheet, "stack");
}
