//! Balanced group partitioning
//!
//! Splits deliberation items into groups no larger than a cap. Items are
//! shuffled before splitting so group membership is independent of input
//! order, which blunts manipulation via strategic submission order.

use rand::seq::SliceRandom;
use rand::Rng;

/// Partition `items` into `⌈n / max_group_size⌉` shuffled groups whose
/// sizes differ by at most one.
///
/// The first `n mod groups` groups receive one extra item. When everything
/// fits in a single group the shuffled items are returned as one group.
///
/// # Panics
///
/// Panics if `max_group_size` is zero.
pub fn partition<T>(mut items: Vec<T>, max_group_size: usize, rng: &mut impl Rng) -> Vec<Vec<T>> {
    assert!(max_group_size > 0, "max_group_size must be positive");

    items.shuffle(rng);

    let total = items.len();
    if total <= max_group_size {
        return vec![items];
    }

    let num_groups = total.div_ceil(max_group_size);
    let base = total / num_groups;
    let remainder = total % num_groups;

    let mut groups = Vec::with_capacity(num_groups);
    let mut rest = items;
    for group_index in 0..num_groups {
        let size = base + usize::from(group_index < remainder);
        let tail = rest.split_off(size);
        groups.push(rest);
        rest = tail;
    }
    groups
}
