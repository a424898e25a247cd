use proptest::prelude::*;

use curator_types::{Asset, PowerPercent, Tally, Timestamp, Verdict};

proptest! {
    /// Timestamp ordering: new(a) <= new(b) iff a <= b.
    #[test]
    fn timestamp_ordering(a in 0u64..u64::MAX, b in 0u64..u64::MAX) {
        let ta = Timestamp::new(a);
        let tb = Timestamp::new(b);
        prop_assert_eq!(ta <= tb, a <= b);
        prop_assert_eq!(ta == tb, a == b);
    }

    /// Asset display parses back to the same amount.
    #[test]
    fn asset_display_parses_back(milli in 0u64..1_000_000_000_000) {
        let asset = Asset::from_milli(milli, "GOLOS");
        let parsed: Asset = asset.to_string().parse().unwrap();
        prop_assert_eq!(parsed, asset);
    }

    /// Only 1..=100 are valid power percentages.
    #[test]
    fn power_percent_range(value in -1000i64..1000) {
        prop_assert_eq!(PowerPercent::new(value).is_ok(), (1..=100).contains(&value));
    }

    /// A tally is accepted iff strictly more approvals than rejections,
    /// and the total always equals the number of verdicts.
    #[test]
    fn tally_acceptance_is_strict_majority(verdicts in prop::collection::vec(any::<bool>(), 0..64)) {
        let verdicts: Vec<Verdict> = verdicts.into_iter().map(Verdict::from_positive).collect();
        let tally = Tally::from_verdicts(&verdicts);
        prop_assert_eq!(tally.total() as usize, verdicts.len());
        prop_assert_eq!(tally.is_accepted(), tally.positives > tally.negatives);
        prop_assert_eq!(tally.margin(), tally.positives as i64 - tally.negatives as i64);
    }
}
