use crate::list::{ranked, RankedList};
use std::collections::HashSet;

/// Proportion of shared members between the first `depth` elements of each list
///
/// Formula: A(d) = 2 * |a[..d] ∩ b[..d]| / (|a[..d]| + |b[..d]|)
///
/// Prefixes are truncated to the length of their list. Each distinct identifier is
/// counted once, so the result stays within [0, 1]. Two empty prefixes share nothing
/// and yield 0.
pub fn agreement<A, B>(a: &A, b: &B, depth: usize) -> f64
where
    A: RankedList + ?Sized,
    B: RankedList + ?Sized,
{
    OverlapProfile::new(a, b, depth).agreement(depth)
}

/// Agreement scaled back to a member count
///
/// Formula: X(d) = A(d) * min(d, |a|, |b|)
pub fn overlap<A, B>(a: &A, b: &B, depth: usize) -> f64
where
    A: RankedList + ?Sized,
    B: RankedList + ?Sized,
{
    OverlapProfile::new(a, b, depth).overlap(depth)
}

/// Intersection sizes of both prefixes for every depth up to a horizon.
///
/// Built in a single pass so the estimator can read A(d) for all depths without
/// rebuilding sets at each rank.
#[derive(Debug)]
pub(crate) struct OverlapProfile {
    len_a: usize,
    len_b: usize,
    /// `shared[d - 1]` is the intersection size at depth `d`
    shared: Vec<usize>,
}

impl OverlapProfile {
    pub(crate) fn new<A, B>(a: &A, b: &B, horizon: usize) -> Self
    where
        A: RankedList + ?Sized,
        B: RankedList + ?Sized,
    {
        let a = ranked(a);
        let b = ranked(b);
        // The intersection cannot grow once both lists are exhausted
        let horizon = horizon.min(a.len().max(b.len()));

        let mut seen_a: HashSet<&str> = HashSet::with_capacity(horizon);
        let mut seen_b: HashSet<&str> = HashSet::with_capacity(horizon);
        let mut shared = Vec::with_capacity(horizon);
        let mut count = 0;

        for d in 0..horizon {
            if let Some(member) = a.get(d) {
                if seen_a.insert(member.as_str()) && seen_b.contains(member.as_str()) {
                    count += 1;
                }
            }
            if let Some(member) = b.get(d) {
                if seen_b.insert(member.as_str()) && seen_a.contains(member.as_str()) {
                    count += 1;
                }
            }
            shared.push(count);
        }

        Self {
            len_a: a.len(),
            len_b: b.len(),
            shared,
        }
    }

    pub(crate) fn short(&self) -> usize {
        self.len_a.min(self.len_b)
    }

    pub(crate) fn long(&self) -> usize {
        self.len_a.max(self.len_b)
    }

    pub(crate) fn shared(&self, depth: usize) -> usize {
        if depth == 0 {
            return 0;
        }
        let index = depth.min(self.shared.len());
        if index == 0 {
            0
        } else {
            self.shared[index - 1]
        }
    }

    pub(crate) fn agreement(&self, depth: usize) -> f64 {
        let prefixes = depth.min(self.len_a) + depth.min(self.len_b);
        if prefixes == 0 {
            return 0.0;
        }
        (2 * self.shared(depth)) as f64 / prefixes as f64
    }

    pub(crate) fn overlap(&self, depth: usize) -> f64 {
        self.agreement(depth) * depth.min(self.short()) as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SimpleList;

    #[test]
    fn test_agreement_by_depth() {
        let a = SimpleList::new("a", ["a", "b", "c", "d", "e"]);
        let b = SimpleList::new("b", ["a", "b", "d", "c", "f"]);

        assert_eq!(agreement(&a, &b, 1), 1.0);
        assert_eq!(agreement(&a, &b, 3), 2.0 / 3.0);
        assert_eq!(agreement(&a, &b, 4), 1.0);
        assert_eq!(agreement(&a, &b, 5), 0.8);
    }

    #[test]
    fn test_agreement_rotated_prefix() {
        let a = SimpleList::new("a", ["a", "b", "c", "d"]);
        let b = SimpleList::new("b", ["c", "a", "b", "d"]);

        assert_eq!(agreement(&a, &b, 1), 0.0);
        assert_eq!(agreement(&a, &b, 4), 1.0);
    }

    #[test]
    fn test_agreement_with_self() {
        let a = SimpleList::new("a", ["q", "w", "e", "r"]);
        for depth in 1..8 {
            assert_eq!(agreement(&a, &a, depth), 1.0);
        }
    }

    #[test]
    fn test_agreement_bounds_with_duplicates() {
        let a = SimpleList::new("a", ["x"]);
        let b = SimpleList::new("b", ["x", "x", "x", "y"]);
        for depth in 1..6 {
            let value = agreement(&a, &b, depth);
            assert!((0.0..=1.0).contains(&value), "depth {depth}: {value}");
        }
        // {x} vs {x}: one shared member over prefixes of length 1 and 2
        assert_eq!(agreement(&a, &b, 2), 2.0 / 3.0);
    }

    #[test]
    fn test_agreement_empty_prefixes() {
        let a = SimpleList::new("a", Vec::<String>::new());
        let b = SimpleList::new("b", Vec::<String>::new());
        assert_eq!(agreement(&a, &b, 0), 0.0);
        assert_eq!(agreement(&a, &b, 3), 0.0);
    }

    #[test]
    fn test_overlap_past_list_end() {
        let a = SimpleList::new("a", ["a", "b", "c", "d"]);
        let b = SimpleList::new("b", ["a", "b", "c", "d"]);

        assert_eq!(overlap(&a, &b, 3), 3.0);
        assert_eq!(overlap(&a, &b, 5), 4.0);
    }

    #[test]
    fn test_profile_matches_single_depth() {
        let a = SimpleList::new("a", ["k", "l", "m", "n", "o", "p"]);
        let b = SimpleList::new("b", ["m", "z", "k", "o"]);
        let profile = OverlapProfile::new(&a, &b, 6);

        assert_eq!(profile.short(), 4);
        assert_eq!(profile.long(), 6);
        for depth in 1..=8 {
            assert_eq!(profile.agreement(depth), agreement(&a, &b, depth));
            assert_eq!(profile.overlap(depth), overlap(&a, &b, depth));
        }
    }

    #[test]
    fn test_same_member_at_same_rank_counts_once() {
        let a = SimpleList::new("a", ["x", "y"]);
        let b = SimpleList::new("b", ["x", "z"]);
        let profile = OverlapProfile::new(&a, &b, 2);
        assert_eq!(profile.shared(1), 1);
        assert_eq!(profile.shared(2), 1);
    }
}
