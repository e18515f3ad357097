//! Schulze tabulator
//!
//! A pure, deterministic implementation of the Schulze voting method:
//! pairwise preference counts, Floyd–Warshall strongest paths, and an
//! undominated winner with a lowest-index tiebreak. Satisfies the Condorcet
//! winner criterion and independence of clones.

use serde::Serialize;

use super::ranking::Ranking;

/// Result of tabulating one election
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tabulation {
    /// Winning candidate index
    pub winner: usize,
    /// `pairwise[i][j]` = number of voters preferring candidate i over j
    pub pairwise: Vec<Vec<u32>>,
    /// `strongest[i][j]` = strength of the strongest path from i to j
    pub strongest: Vec<Vec<u32>>,
}

/// Tabulate an election with the Schulze method.
///
/// Equal inputs always produce equal output. When several candidates are
/// undominated the lowest index wins; this tiebreak exists only for
/// determinism — positional bias is diffused upstream by shuffling the
/// opinions fed to candidate generation.
pub fn schulze(ballots: &[Ranking], num_candidates: usize) -> Tabulation {
    let mut pairwise = vec![vec![0u32; num_candidates]; num_candidates];

    for ballot in ballots {
        let order = ballot.as_slice();
        for i in 0..order.len() {
            for j in (i + 1)..order.len() {
                pairwise[order[i]][order[j]] += 1;
            }
        }
    }

    // Strongest paths, Floyd–Warshall over intermediate candidate k
    let mut strongest = vec![vec![0u32; num_candidates]; num_candidates];
    for i in 0..num_candidates {
        for j in 0..num_candidates {
            if i != j {
                strongest[i][j] = pairwise[i][j];
            }
        }
    }
    for k in 0..num_candidates {
        for i in 0..num_candidates {
            if i == k {
                continue;
            }
            for j in 0..num_candidates {
                if j != k && j != i {
                    strongest[i][j] =
                        strongest[i][j].max(strongest[i][k].min(strongest[k][j]));
                }
            }
        }
    }

    // Candidate i is undominated iff no j has a strictly stronger path to i
    let undominated: Vec<usize> = (0..num_candidates)
        .filter(|&i| (0..num_candidates).all(|j| j == i || strongest[j][i] <= strongest[i][j]))
        .collect();

    // Non-empty by the Schulze theorem; an empty set here means the
    // tabulation itself is broken, so fail loudly rather than pick 0.
    assert!(
        !undominated.is_empty(),
        "Schulze undominated set is empty for {num_candidates} candidates"
    );
    let winner = undominated[0];

    Tabulation {
        winner,
        pairwise,
        strongest,
    }
}

/// Number of pairwise path victories per candidate.
///
/// Candidate i defeats j when the strongest path i→j is strictly stronger
/// than the path j→i.
pub fn victories(strongest: &[Vec<u32>]) -> Vec<usize> {
    let k = strongest.len();
    (0..k)
        .map(|i| {
            (0..k)
                .filter(|&j| j != i && strongest[i][j] > strongest[j][i])
                .count()
        })
        .collect()
}

/// Full candidate ordering by victory count, ties broken by index.
pub fn rank_by_victories(strongest: &[Vec<u32>]) -> Vec<usize> {
    let wins = victories(strongest);
    let mut order: Vec<usize> = (0..strongest.len()).collect();
    order.sort_by_key(|&i| (std::cmp::Reverse(wins[i]), i));
    order
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ballots(orders: &[&[usize]], k: usize) -> Vec<Ranking> {
        orders
            .iter()
            .map(|o| Ranking::new(o.to_vec(), k).unwrap())
            .collect()
    }

    // The compulsory-voting rankings: four of five voters put candidate 1
    // first, making it the Condorcet winner.
    #[test]
    fn classic_five_voters() {
        let one_based: [[i64; 4]; 5] = [
            [2, 1, 3, 4],
            [2, 4, 3, 1],
            [2, 1, 3, 4],
            [1, 2, 3, 4],
            [2, 4, 3, 1],
        ];
        let ballots: Vec<Ranking> = one_based
            .iter()
            .map(|labels| Ranking::from_one_based(labels, 4).unwrap())
            .collect();

        let result = schulze(&ballots, 4);
        assert_eq!(result.winner, 1);
        assert_eq!(result.pairwise[1][0], 4);
        assert_eq!(result.pairwise[1][2], 5);
        assert_eq!(result.pairwise[1][3], 5);
    }

    #[test]
    fn condorcet_singleton_with_hand_checked_paths() {
        let ballots = ballots(&[&[0, 1, 2], &[0, 2, 1], &[1, 0, 2]], 3);
        let result = schulze(&ballots, 3);

        assert_eq!(result.winner, 0);
        assert_eq!(
            result.pairwise,
            vec![vec![0, 2, 3], vec![1, 0, 2], vec![0, 1, 0]]
        );
        assert_eq!(
            result.strongest,
            vec![vec![0, 2, 3], vec![1, 0, 2], vec![1, 1, 0]]
        );
    }

    #[test]
    fn three_cycle_breaks_tie_on_lowest_index() {
        let ballots = ballots(&[&[0, 1, 2], &[1, 2, 0], &[2, 0, 1]], 3);
        let result = schulze(&ballots, 3);

        // A perfect cycle leaves every candidate undominated
        assert_eq!(result.winner, 0);
        for i in 0..3 {
            for j in 0..3 {
                if i != j {
                    assert_eq!(result.strongest[i][j], 2);
                }
            }
        }
    }

    #[test]
    fn deterministic_across_runs() {
        let ballots = ballots(&[&[3, 1, 0, 2], &[2, 0, 3, 1], &[1, 2, 3, 0]], 4);
        let first = schulze(&ballots, 4);
        let second = schulze(&ballots, 4);
        assert_eq!(first, second);
    }

    // If some candidate beats every other head-to-head, it must win.
    #[test]
    fn condorcet_winner_criterion() {
        let ballots = ballots(
            &[&[2, 0, 1], &[2, 1, 0], &[0, 2, 1], &[1, 2, 0], &[2, 0, 1]],
            3,
        );
        let result = schulze(&ballots, 3);
        for j in 0..3 {
            if j != 2 {
                assert!(result.pairwise[2][j] > result.pairwise[j][2]);
            }
        }
        assert_eq!(result.winner, 2);
    }

    #[test]
    fn single_candidate_election() {
        let ballots = ballots(&[&[0], &[0]], 1);
        assert_eq!(schulze(&ballots, 1).winner, 0);
    }

    #[test]
    fn no_ballots_ties_everyone_to_lowest_index() {
        let result = schulze(&[], 3);
        assert_eq!(result.winner, 0);
    }

    #[test]
    fn victories_and_full_ordering() {
        let ballots = ballots(&[&[0, 1, 2], &[0, 2, 1], &[1, 0, 2]], 3);
        let result = schulze(&ballots, 3);
        assert_eq!(victories(&result.strongest), vec![2, 1, 0]);
        assert_eq!(rank_by_victories(&result.strongest), vec![0, 1, 2]);
    }
}
