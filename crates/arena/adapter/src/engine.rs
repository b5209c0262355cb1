//! The adaptation engine.
//!
//! ```text
//! members ─▶ FilterChain ─▶ candidate arenas ─▶ DFS enumeration
//!         ─▶ CompositeValidator ─▶ PermutationRanker ─▶ top `limit`
//!         ─▶ ContainerFactory::create + load ─▶ AdaptedImplementation
//! ```

use std::sync::Arc;

use arena_container::{CodeUnit, ContainerFactory, DefaultContainerFactory, HostEnvironment};
use arena_types::{CandidateMember, ContainerId, InterfaceSpecification, MemberId};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace, warn};

use crate::adapted::AdaptedImplementation;
use crate::candidate::candidate_arenas;
use crate::conversion::{StandardConversions, TypeConversions};
use crate::error::AdapterResult;
use crate::filter::{FilterChain, MemberFilter};
use crate::permutation::{Permutation, PermutationEnumerator};
use crate::ranking::PermutationRanker;
use crate::similarity::NameSimilarity;
use crate::validator::{CompositeValidator, PermutationValidator};

/// Tunables for adaptation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdaptationConfig {
    /// Adapted implementations materialised per candidate.
    #[serde(default = "default_limit")]
    pub limit: usize,

    /// Cap on completed permutations per candidate.
    #[serde(default = "default_max_permutations")]
    pub max_permutations: usize,
}

fn default_limit() -> usize {
    1
}

fn default_max_permutations() -> usize {
    10_000
}

impl Default for AdaptationConfig {
    fn default() -> Self {
        Self {
            limit: default_limit(),
            max_permutations: default_max_permutations(),
        }
    }
}

/// Matches interface specifications against candidate code units.
///
/// Holds no mutable state; one engine can adapt many candidates
/// concurrently.
pub struct AdaptationEngine {
    filters: FilterChain,
    conversions: Arc<dyn TypeConversions>,
    validator: CompositeValidator,
    ranker: PermutationRanker,
    factory: Arc<dyn ContainerFactory>,
    host: HostEnvironment,
    config: AdaptationConfig,
}

impl AdaptationEngine {
    /// Standard filters, conversions and validator, Jaro-Winkler ranking and
    /// in-process containers.
    pub fn new() -> Self {
        Self {
            filters: FilterChain::standard(),
            conversions: Arc::new(StandardConversions),
            validator: CompositeValidator::standard(),
            ranker: PermutationRanker::default(),
            factory: Arc::new(DefaultContainerFactory),
            host: HostEnvironment::new(),
            config: AdaptationConfig::default(),
        }
    }

    pub fn with_filters(mut self, filters: FilterChain) -> Self {
        self.filters = filters;
        self
    }

    /// Append a filter to the current chain.
    pub fn with_filter(mut self, filter: Arc<dyn MemberFilter>) -> Self {
        self.filters = self.filters.with(filter);
        self
    }

    pub fn with_conversions(mut self, conversions: Arc<dyn TypeConversions>) -> Self {
        self.conversions = conversions;
        self
    }

    pub fn with_validators(mut self, validator: CompositeValidator) -> Self {
        self.validator = validator;
        self
    }

    /// Append a validator to the current composite.
    pub fn with_validator(mut self, validator: Arc<dyn PermutationValidator>) -> Self {
        self.validator = self.validator.with(validator);
        self
    }

    pub fn with_similarity(mut self, similarity: Arc<dyn NameSimilarity>) -> Self {
        self.ranker = PermutationRanker::new(similarity);
        self
    }

    pub fn with_factory(mut self, factory: Arc<dyn ContainerFactory>) -> Self {
        self.factory = factory;
        self
    }

    pub fn with_host(mut self, host: HostEnvironment) -> Self {
        self.host = host;
        self
    }

    pub fn with_config(mut self, config: AdaptationConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &AdaptationConfig {
        &self.config
    }

    pub fn factory(&self) -> &Arc<dyn ContainerFactory> {
        &self.factory
    }

    /// Members of `unit` that pass the filter chain, with stable ids.
    pub fn surviving_members(
        &self,
        spec: &InterfaceSpecification,
        unit: &dyn CodeUnit,
    ) -> Vec<(MemberId, CandidateMember)> {
        let constructors = unit
            .constructors()
            .into_iter()
            .enumerate()
            .map(|(i, m)| (MemberId::constructor(i), m));
        let methods = unit
            .methods()
            .into_iter()
            .enumerate()
            .map(|(i, m)| (MemberId::method(i), m));
        constructors
            .chain(methods)
            .filter(|(_, m)| {
                let keep = self.filters.accept(spec, m);
                if !keep {
                    trace!(unit = unit.name(), member = %m.display_signature(), "Member filtered out");
                }
                keep
            })
            .collect()
    }

    /// Every valid permutation of `unit` against `spec`, best first.
    pub fn permutations(&self, spec: &InterfaceSpecification, unit: &dyn CodeUnit) -> Vec<Permutation> {
        let members = self.surviving_members(spec, unit);
        let mut arenas = candidate_arenas(spec, &members, self.conversions.as_ref());
        arenas.iter_mut().for_each(|arena| self.ranker.order_arena(arena));
        let enumeration = PermutationEnumerator::new(&arenas, self.config.max_permutations).enumerate();
        if enumeration.truncated {
            warn!(
                spec = spec.name(),
                unit = unit.name(),
                cap = self.config.max_permutations,
                "Permutation enumeration hit the cap"
            );
        }

        let enumerated = enumeration.permutations.len();
        let valid: Vec<Permutation> = enumeration
            .permutations
            .into_iter()
            .filter(|p| match self.validator.first_rejection(spec, p) {
                None => true,
                Some(validator) => {
                    trace!(unit = unit.name(), validator, "Permutation rejected");
                    false
                }
            })
            .collect();

        debug!(
            spec = spec.name(),
            unit = unit.name(),
            members = members.len(),
            enumerated,
            valid = valid.len(),
            "Enumerated permutations"
        );
        self.ranker.rank(valid)
    }

    /// Adapt `unit` to `spec`, returning at most `limit` implementations,
    /// best first. An empty result means no adapter was found.
    pub fn adapt(
        &self,
        spec: &Arc<InterfaceSpecification>,
        unit: Arc<dyn CodeUnit>,
        limit: usize,
    ) -> Vec<AdaptedImplementation> {
        let ranked = self.permutations(spec, unit.as_ref());
        if ranked.is_empty() {
            info!(spec = spec.name(), unit = unit.name(), "No adapter found");
            return Vec::new();
        }

        let mut adapted = Vec::with_capacity(limit.min(ranked.len()));
        for (rank, permutation) in ranked.into_iter().take(limit).enumerate() {
            match self.materialize(spec, &unit, permutation, rank) {
                Ok(implementation) => adapted.push(implementation),
                Err(e) => warn!(
                    spec = spec.name(),
                    unit = unit.name(),
                    rank,
                    error = %e,
                    "Skipping permutation that could not be materialised"
                ),
            }
        }
        adapted
    }

    /// [`adapt`](Self::adapt) with the configured limit.
    pub fn adapt_default(
        &self,
        spec: &Arc<InterfaceSpecification>,
        unit: Arc<dyn CodeUnit>,
    ) -> Vec<AdaptedImplementation> {
        self.adapt(spec, unit, self.config.limit)
    }

    fn materialize(
        &self,
        spec: &Arc<InterfaceSpecification>,
        unit: &Arc<dyn CodeUnit>,
        permutation: Permutation,
        rank: usize,
    ) -> AdapterResult<AdaptedImplementation> {
        let id = ContainerId::for_candidate(unit.name(), rank);
        let container = self.factory.create(id, &self.host)?;
        if let Err(e) = container.load(unit.as_ref()) {
            container.dispose();
            return Err(e.into());
        }
        debug!(
            unit = unit.name(),
            rank,
            container = %container.id(),
            factory = self.factory.kind(),
            "Materialised adapted implementation"
        );
        Ok(AdaptedImplementation::new(
            Arc::clone(unit),
            Arc::clone(spec),
            permutation,
            rank,
            container,
        ))
    }
}

impl Default for AdaptationEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for AdaptationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdaptationEngine")
            .field("filters", &self.filters)
            .field("validator", &self.validator)
            .field("factory", &self.factory.kind())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
