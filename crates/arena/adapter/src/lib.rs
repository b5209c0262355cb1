//! # arena-adapter
//!
//! Adaptation engine for the Arena.
//!
//! Given an [`InterfaceSpecification`](arena_types::InterfaceSpecification)
//! and a candidate [`CodeUnit`](arena_container::CodeUnit), the engine finds
//! every consistent way of binding each specification method to a concrete
//! member of the candidate, discards invalid bindings, ranks the rest and
//! loads the best ones into fresh containers.
//!
//! ## Pipeline
//!
//! 1. **Filter** members through a [`FilterChain`] (AND semantics).
//! 2. **Bind** each specification method to every compatible member, exactly
//!    or through [`TypeConversions`].
//! 3. **Enumerate** permutations depth first, pruning repeated members early.
//! 4. **Validate** with a [`CompositeValidator`].
//! 5. **Rank** by converter count, then by aggregate [`NameSimilarity`]
//!    distance.
//! 6. **Materialise** the top `limit` as [`AdaptedImplementation`]s.

#![deny(unsafe_code)]

pub mod adapted;
pub mod candidate;
pub mod conversion;
pub mod engine;
pub mod error;
pub mod filter;
pub mod permutation;
pub mod ranking;
pub mod similarity;
pub mod validator;

pub use adapted::AdaptedImplementation;
pub use candidate::{bind, candidate_arenas, Candidate, MemberBinding};
pub use conversion::{Converter, NoConversions, StandardConversions, TypeConversions};
pub use engine::{AdaptationConfig, AdaptationEngine};
pub use error::{AdapterError, AdapterResult, SimilarityError};
pub use filter::{BlankNameFilter, FilterChain, MemberFilter, ObjectMethodFilter};
pub use permutation::{Enumeration, Permutation, PermutationEnumerator};
pub use ranking::PermutationRanker;
pub use similarity::{JaroWinkler, NameSimilarity};
pub use validator::{CompositeValidator, DistinctMemberValidator, PermutationValidator};
