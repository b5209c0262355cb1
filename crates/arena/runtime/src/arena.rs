//! The arena: one stimulus sheet against a pool of candidates.
//!
//! Each candidate is adapted, bound and run in its own tokio task; a
//! semaphore caps how many run at once. Within a candidate the adapted
//! implementations run one after another.

use std::sync::Arc;

use arena_adapter::AdaptationEngine;
use arena_container::CodeUnit;
use arena_ssn::{bind, Invocations, SheetRunner, StimulusSheet};
use arena_types::InterfaceSpecification;
use chrono::Utc;
use futures::future::join_all;
use tokio::sync::Semaphore;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::config::ArenaConfig;
use crate::error::ArenaResult;
use crate::executor::SheetExecutor;
use crate::report::{AdapterRun, ArenaReport, CandidateReport, CandidateStatus};

/// Evaluates candidates against stimulus sheets.
pub struct Arena {
    engine: Arc<AdaptationEngine>,
    executor: Arc<dyn SheetExecutor>,
    config: ArenaConfig,
}

impl Arena {
    /// Arena wired from `config`: factory and host from the sandbox
    /// section, a [`SheetRunner`] with the configured deadline.
    pub fn new(config: ArenaConfig) -> Self {
        let engine = AdaptationEngine::new()
            .with_factory(config.sandbox.factory())
            .with_host(config.sandbox.host())
            .with_config(config.adaptation.clone());
        let executor = Arc::new(SheetRunner::new(config.execution.timeout()));
        Self {
            engine: Arc::new(engine),
            executor,
            config,
        }
    }

    /// Replace the adaptation engine. The configured adaptation section is
    /// not applied to it.
    pub fn with_engine(mut self, engine: AdaptationEngine) -> Self {
        self.engine = Arc::new(engine);
        self
    }

    pub fn with_executor(mut self, executor: Arc<dyn SheetExecutor>) -> Self {
        self.executor = executor;
        self
    }

    pub fn config(&self) -> &ArenaConfig {
        &self.config
    }

    pub fn engine(&self) -> &AdaptationEngine {
        &self.engine
    }

    /// Run `stimulus` against every unit of `pool`, adapting each to `spec`.
    ///
    /// Fails only when the sheet cannot be interpreted. Reports come back
    /// in pool order.
    #[instrument(skip_all, fields(sheet = stimulus.name(), spec = spec.name(), candidates = pool.len()))]
    pub async fn evaluate(
        &self,
        spec: &Arc<InterfaceSpecification>,
        stimulus: &StimulusSheet,
        pool: &[Arc<dyn CodeUnit>],
    ) -> ArenaResult<ArenaReport> {
        let started_at = Utc::now();
        let invocations = Arc::new(stimulus.interpret()?);
        let permits = Arc::new(Semaphore::new(
            self.config.execution.max_concurrent_candidates.max(1),
        ));
        let limit = self.engine.config().limit;

        let tasks = pool.iter().enumerate().map(|(position, unit)| {
            let engine = Arc::clone(&self.engine);
            let executor = Arc::clone(&self.executor);
            let spec = Arc::clone(spec);
            let invocations = Arc::clone(&invocations);
            let unit = Arc::clone(unit);
            let permits = Arc::clone(&permits);
            let name = unit.name().to_string();
            let handle = tokio::spawn(async move {
                // the semaphore is never closed
                let _permit = permits.acquire_owned().await.ok();
                evaluate_candidate(position, engine, executor.as_ref(), &spec, &invocations, unit, limit)
                    .await
            });
            async move {
                match handle.await {
                    Ok(report) => report,
                    Err(e) => {
                        warn!(unit = %name, error = %e, "Candidate task failed");
                        CandidateReport::failed(position, name, e.to_string())
                    }
                }
            }
        });
        let candidates = join_all(tasks).await;

        let report = ArenaReport {
            id: Uuid::new_v4(),
            sheet: stimulus.name().to_string(),
            abstraction: spec.name().to_string(),
            started_at,
            finished_at: Utc::now(),
            candidates,
        };
        info!(
            report = %report.id,
            evaluated = report
                .candidates
                .iter()
                .filter(|c| c.status == CandidateStatus::Evaluated)
                .count(),
            passed = report.passed().count(),
            "Arena evaluation finished"
        );
        Ok(report)
    }
}

async fn evaluate_candidate(
    position: usize,
    engine: Arc<AdaptationEngine>,
    executor: &dyn SheetExecutor,
    spec: &Arc<InterfaceSpecification>,
    invocations: &Invocations,
    unit: Arc<dyn CodeUnit>,
    limit: usize,
) -> CandidateReport {
    let name = unit.name().to_string();
    // enumeration and container setup block
    let adapted = {
        let spec = Arc::clone(spec);
        tokio::task::spawn_blocking(move || engine.adapt(&spec, unit, limit)).await
    };
    let adapted = match adapted {
        Ok(adapted) => adapted,
        Err(e) => {
            warn!(unit = %name, error = %e, "Adaptation failed");
            return CandidateReport::failed(position, name, e.to_string());
        }
    };
    if adapted.is_empty() {
        return CandidateReport::no_adapter(position, name);
    }

    let mut runs = Vec::with_capacity(adapted.len());
    for implementation in adapted {
        let sheet = bind(invocations, &implementation);
        let actuation = executor.execute(&sheet).await;
        let oracle = actuation.oracle_summary();
        debug!(
            adapter = %sheet.adapter,
            executor = executor.name(),
            matched = oracle.matched,
            checked = oracle.checked,
            "Adapter run finished"
        );
        runs.push(AdapterRun {
            adapter: sheet.adapter.clone(),
            container: implementation.container_id().to_string(),
            converters: implementation.permutation().converter_count(),
            oracle,
            actuation,
        });
        implementation.dispose();
    }

    CandidateReport {
        position,
        unit: name,
        status: CandidateStatus::Evaluated,
        runs,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arena_container::NativeCodeUnit;
    use arena_ssn::parse_sheet;
    use arena_types::{MethodSignature, Value};
    use serde_json::json;

    fn spec() -> Arc<InterfaceSpecification> {
        Arc::new(
            InterfaceSpecification::new(
                "Flag",
                vec![MethodSignature::new("get", Vec::<&str>::new(), ["boolean"])],
            )
            .unwrap(),
        )
    }

    #[tokio::test]
    async fn reports_in_pool_order() {
        let spec = spec();
        let stimulus = StimulusSheet::new(
            parse_sheet(&[json!({"sheet": "flag", "cells": {
                "A1": null, "B1": "create", "C1": "Flag",
                "A2": true, "B2": "get", "C2": "A1"
            }})])
            .unwrap(),
            [Arc::clone(&spec)],
        );
        let pool: Vec<Arc<dyn CodeUnit>> = vec![
            Arc::new(
                NativeCodeUnit::<()>::new("Off")
                    .constructor(Vec::<&str>::new(), |_, _| Ok(()))
                    .method("get", Vec::<&str>::new(), "boolean", |_, _, _| Ok(Value::Bool(false))),
            ),
            Arc::new(NativeCodeUnit::<()>::new("Empty")),
            Arc::new(
                NativeCodeUnit::<()>::new("On")
                    .constructor(Vec::<&str>::new(), |_, _| Ok(()))
                    .method("get", Vec::<&str>::new(), "boolean", |_, _, _| Ok(Value::Bool(true))),
            ),
        ];

        let arena = Arena::new(ArenaConfig::default());
        let report = arena.evaluate(&spec, &stimulus, &pool).await.unwrap();

        let units: Vec<&str> = report.candidates.iter().map(|c| c.unit.as_str()).collect();
        assert_eq!(units, vec!["Off", "Empty", "On"]);
        assert_eq!(report.candidates[1].status, CandidateStatus::NoAdapter);
        assert!(!report.candidates[0].passed());
        assert!(report.candidates[2].passed());
        assert_eq!(report.ranking()[0].unit, "On");
        assert_eq!(report.abstraction, "Flag");
    }

    #[tokio::test]
    async fn uninterpretable_sheet_is_an_error() {
        let spec = spec();
        let stimulus = StimulusSheet::new(
            parse_sheet(&[json!({"sheet": "bad", "cells": {"A1": null, "B1": "fly", "C1": 1}})])
                .unwrap(),
            [Arc::clone(&spec)],
        );
        let arena = Arena::new(ArenaConfig::default());
        assert!(arena.evaluate(&spec, &stimulus, &[]).await.is_err());
    }

    struct Unreadable;

    impl CodeUnit for Unreadable {
        fn name(&self) -> &str {
            "Unreadable"
        }

        fn constructors(&self) -> Vec<arena_types::CandidateMember> {
            panic!("class file truncated")
        }

        fn methods(&self) -> Vec<arena_types::CandidateMember> {
            Vec::new()
        }

        fn load(
            &self,
            _env: &arena_container::ContainerEnvironment,
        ) -> arena_container::ContainerResult<Box<dyn arena_container::LoadedUnit>> {
            Err(arena_container::ContainerError::Load {
                unit: "Unreadable".into(),
                reason: "unreachable".into(),
            })
        }
    }

    #[tokio::test]
    async fn adaptation_panic_fails_only_that_candidate() {
        let spec = spec();
        let stimulus = StimulusSheet::new(
            parse_sheet(&[json!({"sheet": "flag", "cells": {
                "A1": null, "B1": "create", "C1": "Flag",
                "A2": true, "B2": "get", "C2": "A1"
            }})])
            .unwrap(),
            [Arc::clone(&spec)],
        );
        let pool: Vec<Arc<dyn CodeUnit>> = vec![
            Arc::new(Unreadable),
            Arc::new(
                NativeCodeUnit::<()>::new("On")
                    .constructor(Vec::<&str>::new(), |_, _| Ok(()))
                    .method("get", Vec::<&str>::new(), "boolean", |_, _, _| Ok(Value::Bool(true))),
            ),
        ];

        let report = Arena::new(ArenaConfig::default())
            .evaluate(&spec, &stimulus, &pool)
            .await
            .unwrap();
        assert!(matches!(report.candidates[0].status, CandidateStatus::Failed { .. }));
        assert!(report.candidates[1].passed());
    }
}
