//! Name similarity, used only to break ties between otherwise equal
//! permutations.

use crate::error::SimilarityError;

/// Normalised, symmetric string similarity in `[0, 1]`; `1.0` iff the inputs
/// are equal. Blank input is an error.
pub trait NameSimilarity: Send + Sync {
    fn similarity(&self, a: &str, b: &str) -> Result<f64, SimilarityError>;

    /// `1 - similarity`.
    fn distance(&self, a: &str, b: &str) -> Result<f64, SimilarityError> {
        self.similarity(a, b).map(|s| 1.0 - s)
    }
}

/// Jaro-Winkler similarity.
#[derive(Debug, Clone, Copy)]
pub struct JaroWinkler {
    prefix_scale: f64,
    max_prefix: usize,
}

impl JaroWinkler {
    pub const DEFAULT_PREFIX_SCALE: f64 = 0.1;
    pub const DEFAULT_MAX_PREFIX: usize = 4;

    /// `prefix_scale` is clamped so that `prefix_scale * max_prefix <= 1`.
    pub fn new(prefix_scale: f64, max_prefix: usize) -> Self {
        let ceiling = if max_prefix == 0 {
            0.0
        } else {
            1.0 / max_prefix as f64
        };
        Self {
            prefix_scale: prefix_scale.clamp(0.0, ceiling),
            max_prefix,
        }
    }
}

impl Default for JaroWinkler {
    fn default() -> Self {
        Self::new(Self::DEFAULT_PREFIX_SCALE, Self::DEFAULT_MAX_PREFIX)
    }
}

impl NameSimilarity for JaroWinkler {
    fn similarity(&self, a: &str, b: &str) -> Result<f64, SimilarityError> {
        if a.trim().is_empty() || b.trim().is_empty() {
            return Err(SimilarityError::BlankInput);
        }
        if a == b {
            return Ok(1.0);
        }
        // fixed argument order keeps the result bit-for-bit symmetric
        let (a, b) = if a <= b { (a, b) } else { (b, a) };
        let a: Vec<char> = a.chars().collect();
        let b: Vec<char> = b.chars().collect();

        let j = jaro(&a, &b);
        let prefix = a
            .iter()
            .zip(b.iter())
            .take(self.max_prefix)
            .take_while(|(x, y)| x == y)
            .count();
        let jw = j + prefix as f64 * self.prefix_scale * (1.0 - j);
        // distinct inputs never reach 1.0
        Ok(jw.min(1.0 - f64::EPSILON))
    }
}

fn jaro(a: &[char], b: &[char]) -> f64 {
    let window = (a.len().max(b.len()) / 2).saturating_sub(1);
    let mut a_matched = vec![false; a.len()];
    let mut b_matched = vec![false; b.len()];
    let mut matches = 0usize;

    for (i, ca) in a.iter().enumerate() {
        let lo = i.saturating_sub(window);
        let hi = (i + window + 1).min(b.len());
        for j in lo..hi {
            if !b_matched[j] && b[j] == *ca {
                a_matched[i] = true;
                b_matched[j] = true;
                matches += 1;
                break;
            }
        }
    }
    if matches == 0 {
        return 0.0;
    }

    let a_seq = a.iter().zip(&a_matched).filter(|(_, m)| **m).map(|(c, _)| c);
    let b_seq = b.iter().zip(&b_matched).filter(|(_, m)| **m).map(|(c, _)| c);
    let half_transpositions = a_seq.zip(b_seq).filter(|(x, y)| x != y).count();

    let m = matches as f64;
    let t = (half_transpositions / 2) as f64;
    (m / a.len() as f64 + m / b.len() as f64 + (m - t) / m) / 3.0
}
