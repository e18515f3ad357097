//! Ranking value object
//!
//! A [`Ranking`] is a voter's ballot: a total strict order over the
//! candidates of one election, most preferred first. Every constructor
//! enforces the permutation invariant, so any `Ranking` reaching the
//! tabulator is valid by construction.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;
use thiserror::Error;

/// Why a candidate ordering was rejected
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BallotError {
    #[error("expected {expected} entries, got {actual}")]
    WrongLength { expected: usize, actual: usize },

    #[error("entries are not a permutation of 0..{num_candidates}")]
    NotAPermutation { num_candidates: usize },
}

/// A total strict order over the candidates `0..K` of one election,
/// most preferred first (Value Object)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Ranking(Vec<usize>);

impl Ranking {
    /// Validate a zero-based candidate ordering
    pub fn new(order: Vec<usize>, num_candidates: usize) -> Result<Self, BallotError> {
        if order.len() != num_candidates {
            return Err(BallotError::WrongLength {
                expected: num_candidates,
                actual: order.len(),
            });
        }
        let mut seen = vec![false; num_candidates];
        for &candidate in &order {
            if candidate >= num_candidates || seen[candidate] {
                return Err(BallotError::NotAPermutation { num_candidates });
            }
            seen[candidate] = true;
        }
        Ok(Self(order))
    }

    /// Convert one-based candidate labels (as prompted for) to a ballot
    pub fn from_one_based(labels: &[i64], num_candidates: usize) -> Result<Self, BallotError> {
        if labels.len() != num_candidates {
            return Err(BallotError::WrongLength {
                expected: num_candidates,
                actual: labels.len(),
            });
        }
        let order = labels
            .iter()
            .map(|&label| {
                if label >= 1 && label <= num_candidates as i64 {
                    Ok(label as usize - 1)
                } else {
                    Err(BallotError::NotAPermutation { num_candidates })
                }
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(order, num_candidates)
    }

    /// A uniformly random permutation, used as the oracle fallback ballot
    pub fn random(num_candidates: usize, rng: &mut impl Rng) -> Self {
        let mut order: Vec<usize> = (0..num_candidates).collect();
        order.shuffle(rng);
        Self(order)
    }

    /// Candidate indices, most preferred first
    pub fn as_slice(&self) -> &[usize] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn new_accepts_permutation() {
        let r = Ranking::new(vec![2, 0, 1], 3).unwrap();
        assert_eq!(r.as_slice(), &[2, 0, 1]);
    }

    #[test]
    fn new_rejects_wrong_length() {
        assert_eq!(
            Ranking::new(vec![0, 1], 3),
            Err(BallotError::WrongLength {
                expected: 3,
                actual: 2
            })
        );
    }

    #[test]
    fn new_rejects_duplicates_and_out_of_range() {
        assert!(Ranking::new(vec![0, 0, 1], 3).is_err());
        assert!(Ranking::new(vec![0, 1, 3], 3).is_err());
    }

    #[test]
    fn from_one_based_converts() {
        let r = Ranking::from_one_based(&[2, 1, 3], 3).unwrap();
        assert_eq!(r.as_slice(), &[1, 0, 2]);
    }

    #[test]
    fn from_one_based_rejects_zero_label() {
        assert!(Ranking::from_one_based(&[0, 1, 2], 3).is_err());
    }

    #[test]
    fn random_is_a_permutation() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..20 {
            let r = Ranking::random(5, &mut rng);
            let mut sorted = r.as_slice().to_vec();
            sorted.sort_unstable();
            assert_eq!(sorted, vec![0, 1, 2, 3, 4]);
        }
    }

    #[test]
    fn random_is_seed_deterministic() {
        let a = Ranking::random(6, &mut StdRng::seed_from_u64(42));
        let b = Ranking::random(6, &mut StdRng::seed_from_u64(42));
        assert_eq!(a, b);
    }
}
