#[cfg(test)]
mod tests {
    use crate::logic::{available_slots, validate_phone};
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use proptest::prelude::*;
    use vetbook_common::Slot;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2030, 1, 1, 9, 0, 0).unwrap()
    }

    // (offset from now in minutes, booked)
    fn slots_from(seeds: &[(i64, bool)]) -> Vec<Slot> {
        seeds
            .iter()
            .enumerate()
            .map(|(i, (offset, booked))| Slot {
                id: i as i64,
                start_at: fixed_now() + Duration::minutes(*offset),
                duration_minutes: 30,
                booked: *booked,
                doctor: None,
            })
            .collect()
    }

    proptest! {
        // Every surviving slot is unbooked and strictly in the future
        #[test]
        fn test_filter_keeps_only_bookable(seeds in prop::collection::vec((-2000i64..2000, any::<bool>()), 0..40)) {
            let now = fixed_now();
            let available = available_slots(slots_from(&seeds), now);

            for slot in &available {
                prop_assert!(!slot.booked);
                prop_assert!(slot.start_at > now);
            }
        }

        // Nothing bookable is lost
        #[test]
        fn test_filter_drops_nothing_bookable(seeds in prop::collection::vec((-2000i64..2000, any::<bool>()), 0..40)) {
            let now = fixed_now();
            let expected = seeds.iter().filter(|(offset, booked)| !booked && *offset > 0).count();

            prop_assert_eq!(available_slots(slots_from(&seeds), now).len(), expected);
        }

        // Output is ordered by start time
        #[test]
        fn test_filter_output_sorted(seeds in prop::collection::vec((-2000i64..2000, any::<bool>()), 0..40)) {
            let available = available_slots(slots_from(&seeds), fixed_now());

            for pair in available.windows(2) {
                prop_assert!(pair[0].start_at <= pair[1].start_at);
            }
        }

        // Any ten digits pass, any other length fails
        #[test]
        fn test_phone_length(digits in "[0-9]{1,15}") {
            let result = validate_phone(&digits, 10);
            prop_assert_eq!(result.is_ok(), digits.len() == 10);
        }
    }
}
