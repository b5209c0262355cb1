//! Time-bounded execution of adapter sheets.
//!
//! Statements run in row order. Calls into the container run on the
//! blocking pool under a per-statement deadline; a call that misses it is
//! recorded as a timeout, its cancellation token is tripped and the runner
//! moves on. A statement whose input references a failed statement is
//! recorded as a fault without reaching the container.

use std::sync::Arc;
use std::time::{Duration, Instant};

use arena_container::{CancellationToken, Container, Fault};
use arena_types::Value;
use chrono::Utc;
use tracing::{debug, info, instrument, warn};

use crate::actuation::{ActuationSheet, ExecutedOperation, Outcome};
use crate::adapter_sheet::{AdapterSheet, BoundOperation, BoundStatement};
use crate::interpreter::Input;
use crate::literal::{create_builtin, decode_literal};

/// Per-statement deadline used when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(5_000);

/// Runs adapter sheets.
#[derive(Clone, Debug)]
pub struct SheetRunner {
    timeout: Duration,
}

impl Default for SheetRunner {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT)
    }
}

impl SheetRunner {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Run every statement of `sheet`. Never fails: per-statement failures
    /// are recorded in the returned sheet, index-aligned with the input.
    #[instrument(skip_all, fields(sheet = %sheet.sheet, adapter = %sheet.adapter))]
    pub async fn run(&self, sheet: &AdapterSheet) -> ActuationSheet {
        let executed_at = Utc::now();
        // `None` marks a statement without a usable output
        let mut outputs: Vec<Option<Value>> = Vec::with_capacity(sheet.len());
        let mut operations = Vec::with_capacity(sheet.len());

        for statement in &sheet.statements {
            let started = Instant::now();
            let invocation = &statement.invocation;
            let (inputs, outcome) = match resolve_inputs(statement, &sheet.statements, &outputs) {
                Ok(args) => {
                    let outcome = self
                        .execute(sheet.container(), statement, args.clone(), &mut outputs)
                        .await;
                    let inputs = invocation.input_columns.iter().copied().zip(args).collect();
                    (inputs, outcome)
                }
                Err(fault) => (Vec::new(), Outcome::Fault { fault }),
            };

            let duration_nanos = u64::try_from(started.elapsed().as_nanos()).unwrap_or(u64::MAX);
            debug!(
                row = invocation.row,
                operation = %invocation.operation,
                ok = outcome.is_value(),
                duration_nanos,
                "Executed statement"
            );
            outputs.push(outcome.value().cloned());
            operations.push(ExecutedOperation {
                index: invocation.index,
                row: invocation.row,
                operation: invocation.operation.clone(),
                inputs,
                outcome,
                expected: invocation.expected.clone(),
                duration_nanos,
            });
        }

        let actuation = ActuationSheet {
            sheet: sheet.sheet.clone(),
            header: sheet.header.clone(),
            adapter: sheet.adapter.clone(),
            unit: sheet.unit.clone(),
            executed_at,
            timeout_ms: u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX),
            operations,
        };
        info!(
            statements = actuation.len(),
            faults = actuation.faults(),
            timeouts = actuation.timeouts(),
            "Sheet executed"
        );
        actuation
    }

    async fn execute(
        &self,
        container: &Arc<dyn Container>,
        statement: &BoundStatement,
        args: Vec<Value>,
        outputs: &mut [Option<Value>],
    ) -> Outcome {
        match &statement.operation {
            BoundOperation::Value => Outcome::Value {
                value: args.into_iter().next().unwrap_or(Value::Null),
            },
            BoundOperation::ArraySet => array_set(statement, args, outputs).into(),
            BoundOperation::Builtin { type_name } => {
                create_builtin(type_name, &args, &statement.invocation.output).into()
            }
            BoundOperation::Unbound { reason } => Outcome::Fault {
                fault: Fault::dispatch(reason.clone()),
            },
            BoundOperation::Instantiate { .. } | BoundOperation::Call { .. } => {
                self.dispatch(container, statement, args).await
            }
        }
    }

    /// Run a container call on the blocking pool under the deadline.
    async fn dispatch(
        &self,
        container: &Arc<dyn Container>,
        statement: &BoundStatement,
        args: Vec<Value>,
    ) -> Outcome {
        let token = CancellationToken::new();
        let call_token = token.clone();
        let container = Arc::clone(container);
        let call: Box<dyn FnOnce() -> Result<Value, Fault> + Send> = match &statement.operation {
            BoundOperation::Instantiate { binding } => {
                let binding = binding.clone();
                Box::new(move || {
                    binding
                        .instantiate_in(&container, args, &call_token)
                        .map(Value::Object)
                })
            }
            BoundOperation::Call { binding } => {
                let mut args = args.into_iter();
                let receiver = match args.next() {
                    Some(Value::Object(receiver)) => receiver,
                    other => {
                        return Outcome::Fault {
                            fault: Fault::dispatch(format!(
                                "receiver of {} is not an object: {}",
                                binding.member.name,
                                other.unwrap_or(Value::Null)
                            )),
                        }
                    }
                };
                let binding = binding.clone();
                let rest: Vec<Value> = args.collect();
                Box::new(move || binding.invoke_in(&container, &receiver, rest, &call_token))
            }
            _ => return Outcome::Fault {
                fault: Fault::dispatch("statement does not dispatch"),
            },
        };

        let handle = tokio::task::spawn_blocking(call);
        match tokio::time::timeout(self.timeout, handle).await {
            Ok(Ok(result)) => result.into(),
            Ok(Err(join_error)) => Outcome::Fault {
                fault: Fault::Panicked {
                    message: join_error.to_string(),
                },
            },
            Err(_) => {
                token.cancel();
                warn!(
                    row = statement.invocation.row,
                    operation = %statement.invocation.operation,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Statement timed out"
                );
                Outcome::timeout(self.timeout)
            }
        }
    }
}

/// Run `sheet` with the given per-statement deadline.
pub async fn run(sheet: &AdapterSheet, timeout: Duration) -> ActuationSheet {
    SheetRunner::new(timeout).run(sheet).await
}

fn resolve_inputs(
    statement: &BoundStatement,
    statements: &[BoundStatement],
    outputs: &[Option<Value>],
) -> Result<Vec<Value>, Fault> {
    statement
        .invocation
        .inputs
        .iter()
        .enumerate()
        .map(|(position, input)| match input {
            Input::Literal(json) => Ok(decode_literal(
                json,
                statement.input_types.get(position).and_then(Option::as_ref),
            )),
            Input::Ref(index) => outputs.get(*index).cloned().flatten().ok_or_else(|| {
                let row = statements.get(*index).map_or(*index + 1, |s| s.invocation.row);
                Fault::dispatch(format!("upstream statement failed: row {}", row))
            }),
        })
        .collect()
}

/// `[array, index, value]`: store `value` into the array produced by an
/// earlier statement. The updated array is the statement's output.
fn array_set(
    statement: &BoundStatement,
    args: Vec<Value>,
    outputs: &mut [Option<Value>],
) -> Result<Value, Fault> {
    let target = match statement.invocation.inputs.first() {
        Some(Input::Ref(index)) => *index,
        _ => return Err(Fault::dispatch("arrayset target must reference an earlier array")),
    };
    let mut args = args.into_iter().skip(1);
    let index = args.next().unwrap_or(Value::Null);
    let value = args.next().unwrap_or(Value::Null);

    let array = outputs
        .get_mut(target)
        .and_then(Option::as_mut)
        .and_then(Value::as_array_mut)
        .ok_or_else(|| Fault::dispatch("arrayset target is not an array"))?;
    let len = array.len();
    let slot = index
        .as_int()
        .and_then(|i| usize::try_from(i).ok())
        .and_then(|i| array.get_mut(i))
        .ok_or_else(|| {
            Fault::thrown(
                "ArrayIndexOutOfBoundsException",
                format!("index {} out of bounds for length {}", index, len),
            )
        })?;
    *slot = value;
    Ok(Value::Array(array.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter_sheet::bind;
    use crate::parser::parse_sheet;
    use crate::sheet::StimulusSheet;
    use arena_adapter::{AdaptationEngine, AdaptedImplementation};
    use arena_container::NativeCodeUnit;
    use arena_types::{InterfaceSpecification, MethodSignature};
    use serde_json::json;

    fn spec() -> Arc<InterfaceSpecification> {
        Arc::new(
            InterfaceSpecification::new(
                "Counter",
                vec![
                    MethodSignature::new("add", ["int"], ["long"]),
                    MethodSignature::new("spin", Vec::<&str>::new(), ["long"]),
                    MethodSignature::new("hang", Vec::<&str>::new(), ["long"]),
                ],
            )
            .unwrap(),
        )
    }

    fn adapted() -> AdaptedImplementation {
        let unit = NativeCodeUnit::<i64>::new("Tally")
            .constructor(Vec::<&str>::new(), |_, _| Ok(0))
            .method("add", ["long"], "long", |n, args, _| {
                let by = args[0].as_int().unwrap_or(0);
                if by < 0 {
                    return Err(Fault::thrown("IllegalArgumentException", "negative"));
                }
                *n += by;
                Ok(Value::Int(*n))
            })
            .method("spin", Vec::<&str>::new(), "long", |_, _, ctx| loop {
                ctx.checkpoint()?;
                std::thread::sleep(Duration::from_millis(1));
            })
            .method("hang", Vec::<&str>::new(), "long", |n, _, _| {
                // ignores its cancellation token
                std::thread::sleep(Duration::from_millis(800));
                *n += 1_000;
                Ok(Value::Int(*n))
            });
        AdaptationEngine::new()
            .adapt(&spec(), Arc::new(unit), 1)
            .into_iter()
            .next()
            .unwrap()
    }

    fn sheet(cells: serde_json::Value, adapted: &AdaptedImplementation) -> AdapterSheet {
        let stimulus = StimulusSheet::new(
            parse_sheet(&[json!({"sheet": "t", "cells": cells})]).unwrap(),
            [spec()],
        );
        bind(&stimulus.interpret().unwrap(), adapted)
    }

    #[tokio::test]
    async fn runs_statements_in_order() {
        let adapted = adapted();
        let sheet = sheet(
            json!({
                "A1": null, "B1": "create", "C1": "Counter",
                "A2": 2, "B2": "add", "C2": "A1", "D2": 2,
                "A3": 5, "B3": "add", "C3": "A1", "D3": 3,
                "A4": null, "B4": "value", "C4": "A3"
            }),
            &adapted,
        );
        let actuation = SheetRunner::default().run(&sheet).await;

        assert_eq!(actuation.len(), 4);
        assert_eq!(actuation.timeout_ms, 5_000);
        assert!(matches!(actuation.operations[0].outcome.value(), Some(Value::Object(_))));
        assert_eq!(actuation.operations[1].outcome.value(), Some(&Value::Int(2)));
        assert_eq!(actuation.operations[1].inputs[1], (3, Value::Int(2)));
        assert_eq!(actuation.operations[3].outcome.value(), Some(&Value::Int(5)));
        assert!(actuation.oracle_summary().all_matched());
        for (i, op) in actuation.operations.iter().enumerate() {
            assert_eq!(op.index, i);
        }
    }

    #[tokio::test]
    async fn faults_propagate_to_dependents_only() {
        let adapted = adapted();
        let sheet = sheet(
            json!({
                "A1": null, "B1": "create", "C1": "Counter",
                "A2": null, "B2": "add", "C2": "A1", "D2": -1,
                "A3": null, "B3": "value", "C3": "A2",
                "A4": 4, "B4": "add", "C4": "A1", "D4": 4
            }),
            &adapted,
        );
        let actuation = run(&sheet, DEFAULT_TIMEOUT).await;

        assert_eq!(
            actuation.operations[1].outcome.fault(),
            Some(&Fault::thrown("IllegalArgumentException", "negative"))
        );
        let upstream = actuation.operations[2].outcome.fault().unwrap();
        assert!(upstream.to_string().contains("upstream statement failed"));
        assert!(actuation.operations[2].inputs.is_empty());
        assert_eq!(actuation.operations[3].outcome.value(), Some(&Value::Int(4)));
    }

    #[tokio::test]
    async fn timeout_is_recorded_and_run_continues() {
        let adapted = adapted();
        let sheet = sheet(
            json!({
                "A1": null, "B1": "create", "C1": "Counter",
                "A2": null, "B2": "spin", "C2": "A1",
                "A3": 1, "B3": "add", "C3": "A1", "D3": 1
            }),
            &adapted,
        );
        let actuation = SheetRunner::new(Duration::from_millis(50)).run(&sheet).await;

        assert_eq!(
            actuation.operations[1].outcome,
            Outcome::Timeout { deadline_ms: 50 }
        );
        assert_eq!(actuation.timeouts(), 1);
        // waits for the cancelled call to release the instance
        assert_eq!(actuation.operations[2].outcome.value(), Some(&Value::Int(1)));
    }

    #[tokio::test]
    async fn stalled_receiver_fails_fast_and_others_continue() {
        let adapted = adapted();
        let sheet = sheet(
            json!({
                "A1": null, "B1": "create", "C1": "Counter",
                "A2": null, "B2": "create", "C2": "Counter",
                "A3": null, "B3": "hang", "C3": "A1",
                "A4": 1, "B4": "add", "C4": "A1", "D4": 1,
                "A5": 5, "B5": "add", "C5": "A2", "D5": 5,
                "A6": 2, "B6": "add", "C6": "A1", "D6": 1,
                "A7": 7, "B7": "add", "C7": "A2", "D7": 2
            }),
            &adapted,
        );
        let started = Instant::now();
        let actuation = SheetRunner::new(Duration::from_millis(100)).run(&sheet).await;

        // well before the stalled call would have finished
        assert!(started.elapsed() < Duration::from_millis(600));
        assert_eq!(actuation.len(), 7);
        assert_eq!(
            actuation.operations[2].outcome,
            Outcome::Timeout { deadline_ms: 100 }
        );
        assert_eq!(actuation.timeouts(), 1);
        for row in [3, 5] {
            assert!(
                matches!(
                    actuation.operations[row].outcome.fault(),
                    Some(Fault::Abandoned { .. })
                ),
                "row {} should fail fast, got {:?}",
                row + 1,
                actuation.operations[row].outcome
            );
        }
        assert_eq!(actuation.operations[4].outcome.value(), Some(&Value::Int(5)));
        assert_eq!(actuation.operations[6].outcome.value(), Some(&Value::Int(7)));
    }

    #[tokio::test]
    async fn builtins_and_arrays() {
        let adapted = adapted();
        let sheet = sheet(
            json!({
                "A1": null, "B1": "create", "C1": "int[]", "D1": 2,
                "A2": null, "B2": "arrayset", "C2": "A1", "D2": 1, "E2": 9,
                "A3": null, "B3": "value", "C3": "A1",
                "A4": null, "B4": "arrayset", "C4": "A1", "D4": 2, "E4": 1,
                "A5": "'hi'", "B5": "create", "C5": "String", "D5": "'hi'",
                "A6": null, "B6": "create", "C6": "long[]", "D6": 9_223_372_036_854_775_807i64,
                "A7": null, "B7": "value", "C7": "A5"
            }),
            &adapted,
        );
        let actuation = run(&sheet, DEFAULT_TIMEOUT).await;

        let updated = Value::Array(vec![Value::Int(0), Value::Int(9)]);
        assert_eq!(actuation.operations[1].outcome.value(), Some(&updated));
        assert_eq!(actuation.operations[2].outcome.value(), Some(&updated));
        match actuation.operations[3].outcome.fault() {
            Some(Fault::Thrown { kind, .. }) => assert_eq!(kind, "ArrayIndexOutOfBoundsException"),
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(actuation.operations[4].outcome.value(), Some(&Value::from("hi")));
        assert_eq!(actuation.matches_expected()[4], Some(true));
        // an oversized array is a fault of its own row, not of the run
        assert_eq!(actuation.len(), 7);
        match actuation.operations[5].outcome.fault() {
            Some(Fault::Thrown { kind, .. }) => assert_eq!(kind, "OutOfMemoryError"),
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(actuation.operations[6].outcome.value(), Some(&Value::from("hi")));
    }

    #[tokio::test]
    async fn unbound_statement_is_a_fault() {
        let adapted = adapted();
        let sheet = sheet(
            json!({"A1": null, "B1": "create", "C1": "Counter", "D1": 3}),
            &adapted,
        );
        let actuation = run(&sheet, DEFAULT_TIMEOUT).await;
        assert!(matches!(
            actuation.operations[0].outcome.fault(),
            Some(Fault::Dispatch { .. })
        ));
    }
}
