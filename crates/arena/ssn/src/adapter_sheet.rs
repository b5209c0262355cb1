//! Binding resolved statements to one adapted implementation.

use std::sync::Arc;

use arena_adapter::{AdaptedImplementation, MemberBinding};
use arena_container::Container;
use arena_types::TypeName;
use tracing::debug;

use crate::interpreter::{Invocation, Invocations, StatementKind};
use crate::literal::builtin_input_type;

/// How a statement is carried out against the adapted implementation.
#[derive(Clone, Debug)]
pub enum BoundOperation {
    /// Construct the candidate through `binding`.
    Instantiate { binding: MemberBinding },
    /// Create a built-in value on the host.
    Builtin { type_name: TypeName },
    /// Call `binding`; input 0 is the receiver.
    Call { binding: MemberBinding },
    Value,
    ArraySet,
    /// The adapted implementation has nothing to bind this statement to.
    /// Running it records a fault.
    Unbound { reason: String },
}

impl BoundOperation {
    /// Whether running the statement reaches into the container.
    pub fn dispatches(&self) -> bool {
        matches!(self, Self::Instantiate { .. } | Self::Call { .. })
    }
}

/// One statement with its binding and the declared type of each input.
#[derive(Clone, Debug)]
pub struct BoundStatement {
    pub invocation: Invocation,
    pub operation: BoundOperation,
    /// Declared type per input, used to decode literals. `None` leaves the
    /// literal untyped.
    pub input_types: Vec<Option<TypeName>>,
}

/// A sheet bound to one adapted implementation.
#[derive(Clone)]
pub struct AdapterSheet {
    pub sheet: String,
    pub header: Option<String>,
    /// `Unit#rank` of the adapted implementation.
    pub adapter: String,
    pub unit: String,
    pub statements: Vec<BoundStatement>,
    container: Arc<dyn Container>,
}

impl AdapterSheet {
    pub fn container(&self) -> &Arc<dyn Container> {
        &self.container
    }

    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    /// Statements that could not be bound.
    pub fn unbound(&self) -> impl Iterator<Item = &BoundStatement> {
        self.statements
            .iter()
            .filter(|s| matches!(s.operation, BoundOperation::Unbound { .. }))
    }
}

impl std::fmt::Debug for AdapterSheet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdapterSheet")
            .field("sheet", &self.sheet)
            .field("header", &self.header)
            .field("adapter", &self.adapter)
            .field("unit", &self.unit)
            .field("statements", &self.statements)
            .field("container", self.container.id())
            .finish()
    }
}

/// Bind every statement of `invocations` to `adapted`.
///
/// Statements the implementation cannot serve (another abstraction, or a
/// constructor arity the candidate lacks) are bound as
/// [`BoundOperation::Unbound`] and fail individually when run.
pub fn bind(invocations: &Invocations, adapted: &AdaptedImplementation) -> AdapterSheet {
    let spec = adapted.spec();
    let statements: Vec<BoundStatement> = invocations
        .iter()
        .map(|invocation| {
            let arity = invocation.inputs.len();
            let (operation, input_types) = match &invocation.kind {
                StatementKind::Create { spec: name } if name == spec.name() => {
                    match adapted.constructor_for(arity) {
                        Some(binding) => {
                            let types = match spec.find_constructor(arity) {
                                Some((_, declared)) => declared.input_types.clone(),
                                None => binding.member.param_types.clone(),
                            };
                            (
                                BoundOperation::Instantiate { binding },
                                types.into_iter().map(Some).collect(),
                            )
                        }
                        None => unbound(
                            format!("{} has no constructor taking {} argument(s)", adapted.unit_name(), arity),
                            arity,
                        ),
                    }
                }
                StatementKind::Create { spec: name } => {
                    unbound(format!("abstraction {} is not adapted here", name), arity)
                }
                StatementKind::CreateBuiltin { type_name } => (
                    BoundOperation::Builtin {
                        type_name: type_name.clone(),
                    },
                    (0..arity)
                        .map(|i| builtin_input_type(type_name, i))
                        .collect(),
                ),
                StatementKind::Invoke {
                    spec: name,
                    method_index,
                    method,
                } if name == spec.name() => match adapted.method_binding(*method_index) {
                    Some(binding) => {
                        let declared = spec
                            .method(*method_index)
                            .map(|m| m.input_types.clone())
                            .unwrap_or_default();
                        let types = std::iter::once(None)
                            .chain(declared.into_iter().map(Some))
                            .collect();
                        (
                            BoundOperation::Call {
                                binding: binding.clone(),
                            },
                            types,
                        )
                    }
                    None => unbound(format!("no binding for {}", method), arity),
                },
                StatementKind::Invoke { spec: name, method, .. } => {
                    unbound(format!("{}.{} is not adapted here", name, method), arity)
                }
                StatementKind::Value => (BoundOperation::Value, vec![None; arity]),
                StatementKind::ArraySet => (
                    BoundOperation::ArraySet,
                    vec![None, Some(TypeName::new("int")), None],
                ),
            };
            BoundStatement {
                invocation: invocation.clone(),
                operation,
                input_types,
            }
        })
        .collect();

    let sheet = AdapterSheet {
        sheet: invocations.sheet.clone(),
        header: invocations.header.clone(),
        adapter: adapted.label(),
        unit: adapted.unit_name().to_string(),
        statements,
        container: Arc::clone(adapted.container()),
    };
    debug!(
        sheet = %sheet.sheet,
        adapter = %sheet.adapter,
        statements = sheet.len(),
        unbound = sheet.unbound().count(),
        "Bound sheet"
    );
    sheet
}

fn unbound(reason: String, arity: usize) -> (BoundOperation, Vec<Option<TypeName>>) {
    (BoundOperation::Unbound { reason }, vec![None; arity])
}
