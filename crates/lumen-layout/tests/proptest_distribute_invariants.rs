//! Property-based invariant tests for stack distribution.
//!
//! 1. One extent per child, in order
//! 2. Fixed children always get their natural extent
//! 3. Flexible shares differ by at most one, larger shares first
//! 4. With room to spare, the plan fills the available extent exactly
//! 5. Same input, same output

use lumen_layout::{AxisDemand, distribute};
use proptest::prelude::*;

fn demand() -> impl Strategy<Value = AxisDemand> {
    prop_oneof![
        (0u16..20).prop_map(AxisDemand::fixed),
        Just(AxisDemand::flexible(0)),
    ]
}

proptest! {
    #[test]
    fn distribution_invariants(
        available in 0u16..200,
        demands in proptest::collection::vec(demand(), 0..10),
        spacing in 0u16..4,
    ) {
        let sizes = distribute(available, &demands, spacing);
        prop_assert_eq!(sizes.len(), demands.len());

        let mut flex_shares = Vec::new();
        for (size, d) in sizes.iter().zip(&demands) {
            if d.flexible {
                flex_shares.push(*size);
            } else {
                prop_assert_eq!(*size, d.natural);
            }
        }

        for pair in flex_shares.windows(2) {
            prop_assert!(pair[0] >= pair[1]);
            prop_assert!(pair[0] - pair[1] <= 1);
        }

        let fixed: u32 = demands.iter().filter(|d| !d.flexible).map(|d| u32::from(d.natural)).sum();
        let gaps = u32::from(spacing) * demands.len().saturating_sub(1) as u32;
        let total: u32 = sizes.iter().map(|&s| u32::from(s)).sum::<u32>() + gaps;
        if !flex_shares.is_empty() && fixed + gaps <= u32::from(available) {
            prop_assert_eq!(total, u32::from(available));
        }

        prop_assert_eq!(distribute(available, &demands, spacing), sizes);
    }
}

#[test]
fn alignment_and_axis_parse_from_toml() {
    #[derive(serde::Deserialize)]
    struct Placement {
        alignment: lumen_layout::Alignment,
        axis: lumen_layout::Axis,
    }

    let parsed: Placement = toml::from_str("alignment = \"trailing\"\naxis = \"vertical\"").unwrap();
    assert_eq!(parsed.alignment, lumen_layout::Alignment::Trailing);
    assert_eq!(parsed.axis, lumen_layout::Axis::Vertical);
}
