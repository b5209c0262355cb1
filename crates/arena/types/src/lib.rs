//! # arena-types
//!
//! Shared data model for the Arena: the abstract interface a test sheet is
//! written against, the concrete members a candidate code unit exposes, and the
//! runtime values that cross the container boundary.
//!
//! No behaviour lives here beyond construction, normalisation and rendering.
//! Every other Arena crate depends on this one.

#![deny(unsafe_code)]

pub mod error;
pub mod ids;
pub mod member;
pub mod spec;
pub mod type_name;
pub mod value;

pub use error::{SpecError, SpecResult};
pub use ids::{ContainerId, InstanceId};
pub use member::{CandidateMember, MemberId, MemberKind};
pub use spec::{InterfaceSpecification, MethodSignature};
pub use type_name::TypeName;
pub use value::{ObjectRef, Value};
