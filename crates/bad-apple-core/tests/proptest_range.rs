//! Property-based tests for line ranges and the bisection rule.
//!
//! Validates:
//! 1. Construction: new(start, end) is Some iff start < end
//! 2. Split halves are disjoint and contiguous
//! 3. Split halves cover exactly the parent range
//! 4. Split sizes are floor(k/2) for the lower half and ceil(k/2) for the upper
//! 5. Only minimal ranges refuse to split
//! 6. Repeated splitting always bottoms out in single lines

use proptest::prelude::*;

use bad_apple_core::range::LineRange;

// ────────────────────────────────────────────────────────────────────
// Strategies
// ────────────────────────────────────────────────────────────────────

fn arb_range() -> impl Strategy<Value = LineRange> {
    (0usize..100_000, 1usize..10_000)
        .prop_map(|(start, len)| LineRange::new(start, start + len).unwrap())
}

fn arb_splittable() -> impl Strategy<Value = LineRange> {
    (0usize..100_000, 2usize..10_000)
        .prop_map(|(start, len)| LineRange::new(start, start + len).unwrap())
}

// ────────────────────────────────────────────────────────────────────
// Properties
// ────────────────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn construction_requires_nonempty(start in 0usize..1000, end in 0usize..1000) {
        let range = LineRange::new(start, end);
        prop_assert_eq!(range.is_some(), start < end);
        if let Some(range) = range {
            prop_assert_eq!(range.len(), end - start);
        }
    }

    #[test]
    fn halves_are_disjoint_and_contiguous(range in arb_splittable()) {
        let [upper, lower] = range.split().unwrap();
        prop_assert_eq!(lower.end(), upper.start());
        prop_assert!(lower.start() < lower.end());
        prop_assert!(upper.start() < upper.end());
    }

    #[test]
    fn halves_cover_the_range(range in arb_splittable()) {
        let [upper, lower] = range.split().unwrap();
        prop_assert_eq!(lower.start(), range.start());
        prop_assert_eq!(upper.end(), range.end());
        prop_assert_eq!(lower.len() + upper.len(), range.len());
    }

    #[test]
    fn half_sizes_floor_and_ceil(range in arb_splittable()) {
        let k = range.len();
        let [upper, lower] = range.split().unwrap();
        prop_assert_eq!(lower.len(), k / 2);
        prop_assert_eq!(upper.len(), k.div_ceil(2));
    }

    #[test]
    fn only_minimal_ranges_refuse_to_split(range in arb_range()) {
        prop_assert_eq!(range.split().is_none(), range.is_minimal());
        prop_assert_eq!(range.is_minimal(), range.len() == 1);
    }

    #[test]
    fn splitting_bottoms_out_in_every_single_line(start in 0usize..1000, len in 1usize..300) {
        let root = LineRange::new(start, start + len).unwrap();
        let mut work = vec![root];
        let mut leaves = Vec::new();
        while let Some(range) = work.pop() {
            match range.split() {
                Some(halves) => work.extend(halves),
                None => leaves.push(range.start()),
            }
        }
        leaves.sort_unstable();
        prop_assert_eq!(leaves, (start..start + len).collect::<Vec<_>>());
    }
}
