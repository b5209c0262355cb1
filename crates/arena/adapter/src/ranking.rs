//! Ranking of validated permutations.

use std::cmp::Ordering;
use std::sync::Arc;

use crate::candidate::Candidate;
use crate::permutation::Permutation;
use crate::similarity::{JaroWinkler, NameSimilarity};

/// Orders permutations best first: fewer converter-bearing bindings, then
/// smaller aggregate name distance. The sort is stable, so equal permutations
/// keep their enumeration order.
#[derive(Clone)]
pub struct PermutationRanker {
    similarity: Arc<dyn NameSimilarity>,
}

impl PermutationRanker {
    pub fn new(similarity: Arc<dyn NameSimilarity>) -> Self {
        Self { similarity }
    }

    pub fn similarity(&self) -> &dyn NameSimilarity {
        self.similarity.as_ref()
    }

    pub fn compare(&self, a: &Permutation, b: &Permutation) -> Ordering {
        a.converter_count().cmp(&b.converter_count()).then_with(|| {
            a.name_distance(self.similarity())
                .total_cmp(&b.name_distance(self.similarity()))
        })
    }

    /// Order one candidate arena best first: exact bindings before converted
    /// ones, then by name distance. Enumeration walks arenas in this order,
    /// so a capped enumeration keeps the best permutations.
    pub fn order_arena(&self, arena: &mut Vec<Candidate>) {
        let mut keyed: Vec<(bool, f64, Candidate)> = arena
            .drain(..)
            .map(|c| {
                let distance = self
                    .similarity
                    .distance(&c.method_name, &c.member().name)
                    .unwrap_or(1.0);
                (!c.is_exact(), distance, c)
            })
            .collect();
        keyed.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.total_cmp(&b.1)));
        arena.extend(keyed.into_iter().map(|(_, _, c)| c));
    }

    pub fn rank(&self, mut permutations: Vec<Permutation>) -> Vec<Permutation> {
        permutations.sort_by(|a, b| self.compare(a, b));
        permutations
    }
}

impl Default for PermutationRanker {
    fn default() -> Self {
        Self::new(Arc::new(JaroWinkler::default()))
    }
}

impl std::fmt::Debug for PermutationRanker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PermutationRanker").finish_non_exhaustive()
    }
}
