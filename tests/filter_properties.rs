use std::collections::BTreeSet;

use chrono::{Days, NaiveDate};
use proptest::prelude::*;

use pitchside::data::filter::{filter_dataset, View, Window};
use pitchside::data::roster::Position;
use pitchside::data::schema::LoadRecord;

fn base() -> NaiveDate {
    NaiveDate::from_ymd_opt(2020, 1, 1).unwrap()
}

fn position() -> impl Strategy<Value = Option<Position>> {
    prop_oneof![
        Just(None),
        Just(Some(Position::Forwards)),
        Just(Some(Position::Backs)),
    ]
}

fn record() -> impl Strategy<Value = LoadRecord> {
    (0u64..60, 0usize..6, position(), proptest::option::of(1.0f64..10.0)).prop_map(
        |(offset, who, position, rpe)| LoadRecord {
            athlete: format!("athlete-{who}"),
            date: base() + Days::new(offset),
            position,
            mental_fatigue: None,
            physical_rpe: rpe,
        },
    )
}

proptest! {
    #[test]
    fn rows_stay_inside_the_window(
        rows in prop::collection::vec(record(), 1..40),
        days in 0u32..40,
        group in position(),
    ) {
        let latest = rows.iter().map(|r| r.date).max().unwrap();
        let lower = latest - Days::new(days as u64);
        let view = filter_dataset(&rows, days, group);
        for r in view.iter() {
            prop_assert!(r.date >= lower && r.date <= latest);
            if let Some(p) = group {
                prop_assert_eq!(r.position, Some(p));
            }
        }
    }

    #[test]
    fn nothing_in_the_window_is_dropped(
        rows in prop::collection::vec(record(), 1..40),
        days in 0u32..40,
        group in position(),
    ) {
        let latest = rows.iter().map(|r| r.date).max().unwrap();
        let lower = latest - Days::new(days as u64);
        let expected = rows
            .iter()
            .filter(|r| r.date >= lower)
            .filter(|r| group.is_none() || r.position == group)
            .count();
        prop_assert_eq!(filter_dataset(&rows, days, group).len(), expected);
    }

    #[test]
    fn zero_days_keeps_only_the_latest_date(rows in prop::collection::vec(record(), 1..40)) {
        let latest = rows.iter().map(|r| r.date).max().unwrap();
        let dates: BTreeSet<_> = filter_dataset(&rows, 0, None).iter().map(|r| r.date).collect();
        prop_assert_eq!(dates, BTreeSet::from([latest]));
    }

    #[test]
    fn filtering_twice_changes_nothing(
        rows in prop::collection::vec(record(), 0..40),
        days in 0u32..40,
        group in position(),
    ) {
        let window = Window::new(days, group);
        let once = View::all(&rows).filter(window);
        let twice = once.filter(window);
        prop_assert_eq!(once.rows(), twice.rows());
    }
}
