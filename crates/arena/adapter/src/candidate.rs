//! Bindings of specification methods to candidate members.

use std::sync::Arc;

use arena_container::{CancellationToken, Container, Fault};
use arena_types::{CandidateMember, InterfaceSpecification, MemberId, MethodSignature, ObjectRef, Value};
use tracing::trace;

use crate::conversion::{Converter, TypeConversions};

/// A concrete member together with the converters needed to call it with
/// specification-typed arguments.
#[derive(Clone, Debug)]
pub struct MemberBinding {
    pub member_id: MemberId,
    pub member: CandidateMember,
    /// One slot per parameter; `None` where the types are identical.
    pub parameter_converters: Vec<Option<Converter>>,
    pub return_converter: Option<Converter>,
}

impl MemberBinding {
    /// Binding that needs no conversion.
    pub fn exact(member_id: MemberId, member: CandidateMember) -> Self {
        Self {
            parameter_converters: vec![None; member.arity()],
            member_id,
            member,
            return_converter: None,
        }
    }

    pub fn is_exact(&self) -> bool {
        self.return_converter.is_none() && self.parameter_converters.iter().all(Option::is_none)
    }

    pub fn convert_args(&self, args: Vec<Value>) -> Result<Vec<Value>, Fault> {
        if args.len() != self.member.arity() {
            return Err(Fault::dispatch(format!(
                "{} expects {} argument(s), got {}",
                self.member.display_signature(),
                self.member.arity(),
                args.len()
            )));
        }
        args.into_iter()
            .zip(self.parameter_converters.iter())
            .map(|(arg, conv)| match conv {
                Some(c) => c.convert(&arg),
                None => Ok(arg),
            })
            .collect()
    }

    pub fn convert_return(&self, value: Value) -> Result<Value, Fault> {
        match &self.return_converter {
            Some(c) => c.convert(&value),
            None => Ok(value),
        }
    }

    /// Convert `args`, run the constructor inside `container`.
    pub fn instantiate_in(
        &self,
        container: &Arc<dyn Container>,
        args: Vec<Value>,
        cancel: &CancellationToken,
    ) -> Result<ObjectRef, Fault> {
        let args = self.convert_args(args)?;
        container.instantiate(&self.member, args, cancel)
    }

    /// Convert `args`, invoke the method on `receiver`, convert the result.
    pub fn invoke_in(
        &self,
        container: &Arc<dyn Container>,
        receiver: &ObjectRef,
        args: Vec<Value>,
        cancel: &CancellationToken,
    ) -> Result<Value, Fault> {
        let args = self.convert_args(args)?;
        let result = container.invoke(receiver, &self.member, args, cancel)?;
        self.convert_return(result)
    }
}

/// One specification method bound to one candidate member.
#[derive(Clone, Debug)]
pub struct Candidate {
    pub method_index: usize,
    pub method_name: String,
    pub binding: MemberBinding,
}

impl Candidate {
    pub fn member(&self) -> &CandidateMember {
        &self.binding.member
    }

    pub fn member_id(&self) -> MemberId {
        self.binding.member_id
    }

    /// No converters at all.
    pub fn is_exact(&self) -> bool {
        self.binding.is_exact()
    }
}

/// Try to bind `method` to `member`. Returns `None` when kinds or arities
/// differ, or when a mismatched type has no conversion.
pub fn bind(
    method_index: usize,
    method: &MethodSignature,
    member_id: MemberId,
    member: &CandidateMember,
    conversions: &dyn TypeConversions,
) -> Option<Candidate> {
    if method.is_constructor != member.is_constructor || method.arity() != member.arity() {
        return None;
    }

    let mut parameter_converters = Vec::with_capacity(method.arity());
    for (spec_ty, member_ty) in method.input_types.iter().zip(&member.param_types) {
        if spec_ty == member_ty {
            parameter_converters.push(None);
        } else {
            parameter_converters.push(Some(conversions.find(spec_ty, member_ty)?));
        }
    }

    // a constructor yields the candidate's own type; only methods compare results
    let return_converter = if method.is_constructor {
        None
    } else {
        let spec_ret = method.return_type();
        if spec_ret == member.return_type {
            None
        } else {
            Some(conversions.find(&member.return_type, &spec_ret)?)
        }
    };

    Some(Candidate {
        method_index,
        method_name: method.name.clone(),
        binding: MemberBinding {
            member_id,
            member: member.clone(),
            parameter_converters,
            return_converter,
        },
    })
}

/// One arena of candidates per specification method, in specification order.
pub fn candidate_arenas(
    spec: &InterfaceSpecification,
    members: &[(MemberId, CandidateMember)],
    conversions: &dyn TypeConversions,
) -> Vec<Vec<Candidate>> {
    spec.methods()
        .iter()
        .enumerate()
        .map(|(index, method)| {
            let arena: Vec<Candidate> = members
                .iter()
                .filter_map(|(id, member)| bind(index, method, *id, member, conversions))
                .collect();
            trace!(
                spec = spec.name(),
                method = %method.display_signature(),
                candidates = arena.len(),
                "Bound candidate arena"
            );
            arena
        })
        .collect()
}
