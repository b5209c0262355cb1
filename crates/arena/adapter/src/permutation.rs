//! Permutations and their enumeration.

use std::collections::HashSet;
use std::sync::OnceLock;

use arena_types::MemberId;

use crate::candidate::Candidate;
use crate::similarity::NameSimilarity;

/// One candidate per specification method, in specification order.
#[derive(Debug)]
pub struct Permutation {
    candidates: Vec<Candidate>,
    name_distance: OnceLock<f64>,
}

impl Clone for Permutation {
    fn clone(&self) -> Self {
        let name_distance = OnceLock::new();
        if let Some(d) = self.name_distance.get() {
            let _ = name_distance.set(*d);
        }
        Self {
            candidates: self.candidates.clone(),
            name_distance,
        }
    }
}

impl Permutation {
    pub fn new(candidates: Vec<Candidate>) -> Self {
        Self {
            candidates,
            name_distance: OnceLock::new(),
        }
    }

    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// The candidate bound to specification method `method_index`.
    pub fn candidate_for(&self, method_index: usize) -> Option<&Candidate> {
        self.candidates
            .iter()
            .find(|c| c.method_index == method_index)
    }

    /// Number of bindings that need at least one converter.
    pub fn converter_count(&self) -> usize {
        self.candidates.iter().filter(|c| !c.is_exact()).count()
    }

    pub fn members_distinct(&self) -> bool {
        let mut seen = HashSet::with_capacity(self.candidates.len());
        self.candidates.iter().all(|c| seen.insert(c.member_id()))
    }

    /// Aggregate name distance `Σ (1 - similarity(method, member))`, computed
    /// on first use and memoised. A binding whose names the similarity
    /// rejects counts as maximally distant.
    pub fn name_distance(&self, similarity: &dyn NameSimilarity) -> f64 {
        *self.name_distance.get_or_init(|| {
            self.candidates
                .iter()
                .map(|c| {
                    similarity
                        .distance(&c.method_name, &c.member().name)
                        .unwrap_or(1.0)
                })
                .sum()
        })
    }

    /// Memoised distance, if already computed.
    pub fn cached_name_distance(&self) -> Option<f64> {
        self.name_distance.get().copied()
    }
}

/// Result of enumerating the candidate arenas.
#[derive(Debug, Default)]
pub struct Enumeration {
    pub permutations: Vec<Permutation>,
    /// The cap was reached before the search space was exhausted.
    pub truncated: bool,
}

/// Depth-first construction over the per-method arenas.
///
/// Partial permutations that already bind the same member twice are pruned
/// as soon as the repeat appears, unless there is exactly one arena.
#[derive(Debug)]
pub struct PermutationEnumerator<'a> {
    arenas: &'a [Vec<Candidate>],
    max_permutations: usize,
}

impl<'a> PermutationEnumerator<'a> {
    pub fn new(arenas: &'a [Vec<Candidate>], max_permutations: usize) -> Self {
        Self {
            arenas,
            max_permutations,
        }
    }

    pub fn enumerate(&self) -> Enumeration {
        let mut out = Enumeration::default();
        if self.max_permutations == 0 {
            out.truncated = !self.arenas.iter().any(Vec::is_empty);
            return out;
        }
        let mut path: Vec<usize> = Vec::with_capacity(self.arenas.len());
        let mut used: HashSet<MemberId> = HashSet::with_capacity(self.arenas.len());
        self.descend(&mut path, &mut used, &mut out);
        out
    }

    fn descend(&self, path: &mut Vec<usize>, used: &mut HashSet<MemberId>, out: &mut Enumeration) {
        let depth = path.len();
        if depth == self.arenas.len() {
            let candidates = path
                .iter()
                .enumerate()
                .map(|(method, &i)| self.arenas[method][i].clone())
                .collect();
            out.permutations.push(Permutation::new(candidates));
            return;
        }

        let prune = self.arenas.len() > 1;
        for (i, candidate) in self.arenas[depth].iter().enumerate() {
            if out.permutations.len() >= self.max_permutations {
                out.truncated = true;
                return;
            }
            let id = candidate.member_id();
            if prune && used.contains(&id) {
                continue;
            }
            used.insert(id);
            path.push(i);
            self.descend(path, used, out);
            path.pop();
            used.remove(&id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candidate::MemberBinding;
    use crate::similarity::JaroWinkler;
    use arena_types::CandidateMember;

    fn cand(method_index: usize, method: &str, member_index: usize, member: &str) -> Candidate {
        Candidate {
            method_index,
            method_name: method.to_string(),
            binding: MemberBinding::exact(
                MemberId::method(member_index),
                CandidateMember::method(member, Vec::<&str>::new(), "int"),
            ),
        }
    }

    #[test]
    fn cartesian_product_without_repeats() {
        let arenas = vec![
            vec![cand(0, "a", 0, "x"), cand(0, "a", 1, "y")],
            vec![cand(1, "b", 0, "x"), cand(1, "b", 1, "y")],
        ];
        let e = PermutationEnumerator::new(&arenas, 100).enumerate();
        assert!(!e.truncated);
        assert_eq!(e.permutations.len(), 2);
        assert!(e.permutations.iter().all(Permutation::members_distinct));
    }

    #[test]
    fn single_arena_is_not_pruned() {
        let arenas = vec![vec![cand(0, "a", 0, "x"), cand(0, "a", 1, "y")]];
        let e = PermutationEnumerator::new(&arenas, 100).enumerate();
        assert_eq!(e.permutations.len(), 2);
    }

    #[test]
    fn empty_arena_yields_nothing() {
        let arenas = vec![vec![cand(0, "a", 0, "x")], vec![]];
        let e = PermutationEnumerator::new(&arenas, 100).enumerate();
        assert!(e.permutations.is_empty());
        assert!(!e.truncated);
    }

    #[test]
    fn no_methods_yields_one_empty_permutation() {
        let arenas: Vec<Vec<Candidate>> = vec![];
        let e = PermutationEnumerator::new(&arenas, 100).enumerate();
        assert_eq!(e.permutations.len(), 1);
        assert!(e.permutations[0].is_empty());
    }

    #[test]
    fn cap_bounds_output() {
        let arena: Vec<Candidate> = (0..10).map(|i| cand(0, "a", i, "m")).collect();
        let arenas = vec![arena.clone(), arena.clone(), arena];
        let e = PermutationEnumerator::new(&arenas, 25).enumerate();
        assert_eq!(e.permutations.len(), 25);
        assert!(e.truncated);
    }

    #[test]
    fn name_distance_is_memoised() {
        let p = Permutation::new(vec![cand(0, "size", 0, "size"), cand(1, "push", 1, "add")]);
        assert!(p.cached_name_distance().is_none());
        let d = p.name_distance(&JaroWinkler::default());
        assert!(d > 0.0 && d <= 1.0);
        assert_eq!(p.cached_name_distance(), Some(d));
        assert_eq!(p.clone().cached_name_distance(), Some(d));
    }

    #[test]
    fn converter_count_and_lookup() {
        let p = Permutation::new(vec![cand(0, "a", 0, "x"), cand(1, "b", 1, "y")]);
        assert_eq!(p.converter_count(), 0);
        assert_eq!(p.candidate_for(1).map(|c| c.member().name.as_str()), Some("y"));
        assert!(p.candidate_for(2).is_none());
    }
}
