//! Property-based tests for the pure identifier generators.

use std::cmp::Ordering;

use facility_codes::floors::{compare_floors, compare_floors_in, sorted_floors, FloorOrder};
use facility_codes::frequency::{most_frequent, UNKNOWN_FREQUENCY};
use facility_codes::orders::{OrderCodeFormat, OrderKind};
use facility_codes::tags::{category_prefix, generate_tag};
use facility_codes::text::normalize;
use proptest::prelude::*;

fn floor_label_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("Térreo".to_string()),
        Just("Pavimento Térreo".to_string()),
        (1i32..40).prop_map(|n| format!("{}º Andar", n)),
        (1i32..5).prop_map(|n| format!("Subsolo {}", n)),
        (-5i32..40).prop_map(|n| format!("Piso {}", n)),
        "[A-Za-z ]{1,12}",
    ]
}

fn free_text_strategy() -> impl Strategy<Value = String> {
    "[A-Za-zÀ-ÿ0-9 /._-]{0,40}"
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn normalize_output_stays_in_alphabet(input in free_text_strategy(), max_len in 1usize..30) {
        let out = normalize(&input, max_len);
        prop_assert!(out.len() <= max_len);
        prop_assert!(out.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '-'));
        prop_assert!(!out.starts_with('-') && !out.ends_with('-'));
        prop_assert!(!out.contains("--"), "collapsed separators expected in {:?}", out);
    }

    #[test]
    fn normalize_is_idempotent(input in free_text_strategy(), max_len in 1usize..30) {
        let once = normalize(&input, max_len);
        prop_assert_eq!(normalize(&once, max_len), once);
    }

    #[test]
    fn tags_are_deterministic(
        asset in "[A-Za-z ]{1,20}",
        floor in floor_label_strategy(),
        location in free_text_strategy(),
        count in 0u64..100_000,
    ) {
        let tag = generate_tag(&asset, &floor, &location, count);
        prop_assert_eq!(&tag, &generate_tag(&asset, &floor, &location, count));

        let expected_prefix = format!("{}-", category_prefix(&asset));
        let expected_suffix = format!("{:04}", count + 1);
        prop_assert!(tag.as_str().starts_with(&expected_prefix));
        prop_assert!(tag.as_str().ends_with(&expected_suffix));
    }

    #[test]
    fn floor_comparison_is_antisymmetric(a in floor_label_strategy(), b in floor_label_strategy()) {
        prop_assert_eq!(compare_floors(&a, &b), compare_floors(&b, &a).reverse());
        prop_assert_eq!(compare_floors(&a, &a), Ordering::Equal);
    }

    #[test]
    fn sorted_floors_are_ordered_permutations(
        labels in prop::collection::vec(floor_label_strategy(), 0..12),
        bottom_up in any::<bool>(),
    ) {
        let order = if bottom_up { FloorOrder::BottomUp } else { FloorOrder::TopDown };
        let sorted = sorted_floors(&labels, order);

        prop_assert_eq!(sorted.len(), labels.len());
        for pair in sorted.windows(2) {
            prop_assert_ne!(compare_floors_in(order, &pair[0], &pair[1]), Ordering::Greater);
        }

        let mut expected = labels.clone();
        let mut actual = sorted.clone();
        expected.sort();
        actual.sort();
        prop_assert_eq!(actual, expected);
    }

    #[test]
    fn most_frequent_picks_an_input_label(labels in prop::collection::vec("[A-Za-z ]{0,10}", 0..15)) {
        let winner = most_frequent(&labels);
        if labels.iter().all(|label| label.trim().is_empty()) {
            prop_assert_eq!(winner, UNKNOWN_FREQUENCY);
        } else {
            prop_assert!(labels.iter().any(|label| label.trim() == winner));
        }
    }

    #[test]
    fn rendered_order_numbers_parse_back(
        number in 1i64..10_000_000,
        corrective in any::<bool>(),
        acronym in "[A-Z]{2,5}[0-9]{0,2}",
        template in prop_oneof![
            Just("{marker}-{acronym}-{number}"),
            Just("{number}-{acronym}-{marker}"),
            Just("{acronym}/{number}.{marker}"),
        ],
    ) {
        let kind = if corrective { OrderKind::Corrective } else { OrderKind::Preventive };
        let format = OrderCodeFormat { template: template.to_string(), ..OrderCodeFormat::default() };
        let code = format.render(&acronym, kind, number);
        let pattern = format.pattern(&acronym, kind).unwrap();
        prop_assert_eq!(pattern.parse(code.as_str()), Some(number));
    }
}
