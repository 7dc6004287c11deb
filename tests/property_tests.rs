/// Property-based tests using proptest
/// Tests invariants that should hold for all inputs
use chrono::NaiveDate;
use proptest::prelude::*;
use rust_nubix_client::candidates::generate_candidates;
use rust_nubix_client::deep_find::deep_find;
use rust_nubix_client::holidays::FixedHolidayCalendar;
use rust_nubix_client::models::{Address, IdentityQuery, PersonQuery, ReadingType};
use rust_nubix_client::reading_need::{effective_cutoff, needs_reading};
use rust_nubix_client::xml_tree::parse_xml;
use serde_json::{json, Value};

fn person_with(
    last_name: Option<String>,
    birth_date: Option<NaiveDate>,
    meter_no: Option<String>,
    street: Option<String>,
) -> IdentityQuery {
    IdentityQuery::Person(PersonQuery {
        last_name,
        first_name: None,
        birth_date,
        meter_no,
        address: Some(Address {
            address: street,
            postal_code: Some("0001".to_string()),
            city: None,
        }),
    })
}

fn any_date() -> impl Strategy<Value = NaiveDate> {
    (1950i32..2030, 1u32..=12, 1u32..=28)
        .prop_map(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d).unwrap())
}

// Property: tiers depend only on which fields are present, not on their values
proptest! {
    #[test]
    fn tiers_depend_only_on_field_presence(
        has_last in any::<bool>(),
        has_birth in any::<bool>(),
        has_meter in any::<bool>(),
        has_street in any::<bool>(),
        a_name in "[A-Z][a-z]{1,12}",
        b_name in "[A-Z][a-z]{1,12}",
        a_date in any_date(),
        b_date in any_date(),
        a_meter in "[0-9]{6,18}",
        b_meter in "[0-9]{6,18}",
        a_street in "[A-Z][a-z]{2,10} [0-9]{1,3}",
        b_street in "[A-Z][a-z]{2,10} [0-9]{1,3}",
    ) {
        let a = person_with(
            has_last.then_some(a_name),
            has_birth.then_some(a_date),
            has_meter.then_some(a_meter),
            has_street.then_some(a_street),
        );
        let b = person_with(
            has_last.then_some(b_name),
            has_birth.then_some(b_date),
            has_meter.then_some(b_meter),
            has_street.then_some(b_street),
        );

        let tiers = |q: &IdentityQuery| {
            generate_candidates(q).iter().map(|c| c.confidence_tier).collect::<Vec<_>>()
        };
        prop_assert_eq!(tiers(&a), tiers(&b));
    }

    #[test]
    fn candidates_never_exceed_table(
        has_last in any::<bool>(),
        has_birth in any::<bool>(),
        has_meter in any::<bool>(),
        has_street in any::<bool>(),
    ) {
        let query = person_with(
            has_last.then(|| "Olsen".to_string()),
            has_birth.then(|| NaiveDate::from_ymd_opt(1980, 1, 1).unwrap()),
            has_meter.then(|| "123456".to_string()),
            has_street.then(|| "Storgata 1".to_string()),
        );
        let candidates = generate_candidates(&query);
        prop_assert!(candidates.len() <= 6);
        prop_assert!(candidates.iter().all(|c| c.confidence_tier <= 2));
    }
}

// Property: the estimator only ever asks for readings on manual meters
proptest! {
    #[test]
    fn only_manual_meters_need_readings(
        today in any_date(),
        last in proptest::option::of(any_date()),
        code in prop::sample::select(vec!["Z50", "Z52", "XX", ""]),
    ) {
        let calendar = FixedHolidayCalendar::empty();
        let reading_type = ReadingType::from_code(code);
        prop_assert!(!needs_reading(last, reading_type, today, &calendar).unwrap());
        prop_assert!(!needs_reading(None, ReadingType::Manual, today, &calendar).unwrap());
    }

    #[test]
    fn cutoff_is_a_weekday_before_take_over(today in any_date()) {
        use chrono::{Datelike, Duration, Weekday};

        let cutoff = effective_cutoff(today, &FixedHolidayCalendar::empty()).unwrap();
        prop_assert!(!matches!(cutoff.weekday(), Weekday::Sat | Weekday::Sun));
        // 20 weekdays span exactly four weeks plus at most the weekend gap
        let span = (today + Duration::days(15) - cutoff).num_days();
        prop_assert!((26..=30).contains(&span), "span was {}", span);
    }

    #[test]
    fn reading_needed_exactly_before_cutoff(today in any_date(), offset in -40i64..40) {
        use chrono::Duration;

        let calendar = FixedHolidayCalendar::empty();
        let cutoff = effective_cutoff(today, &calendar).unwrap();
        let last = cutoff + Duration::days(offset);
        let needed = needs_reading(Some(last), ReadingType::Manual, today, &calendar).unwrap();
        prop_assert_eq!(needed, offset < 0);
    }
}

// Property: decoding and searching never panic
proptest! {
    #[test]
    fn xml_decoding_never_panics(xml in "\\PC*") {
        let _ = parse_xml(&xml);
    }

    #[test]
    fn deep_find_locates_nested_key(depth in 0usize..20, value in "[a-z0-9]{1,10}") {
        let mut tree = json!({"meteringpointid": value.clone()});
        for level in 0..depth {
            let mut wrapper = serde_json::Map::new();
            wrapper.insert(format!("level{}", level), json!([Value::Null, tree]));
            tree = Value::Object(wrapper);
        }
        let expected = Value::String(value);
        prop_assert_eq!(deep_find(&tree, "meteringpointid"), Some(&expected));
    }
}
