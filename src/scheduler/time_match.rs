use chrono::{Datelike, NaiveDateTime, Timelike};

use crate::models::TimeSpecificNavigation;

/// `None` means the rule applies every day.
pub fn is_active_day(days: Option<&[u8]>, weekday: u8) -> bool {
    match days {
        None => true,
        Some(days) => days.contains(&weekday),
    }
}

/// Parses `HH:MM` (one or two digit fields) into `(hour, minute)`.
pub fn parse_time_of_day(value: &str) -> Option<(u32, u32)> {
    let (hour, minute) = value.trim().split_once(':')?;
    let hour: u32 = parse_field(hour)?;
    let minute: u32 = parse_field(minute)?;
    (hour < 24 && minute < 60).then_some((hour, minute))
}

fn parse_field(field: &str) -> Option<u32> {
    if field.is_empty() || field.len() > 2 || !field.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    field.parse().ok()
}

/// Minute granularity: matches for the whole minute. Unparseable times never match.
pub fn is_time_match(now: &impl Timelike, time: &str) -> bool {
    match parse_time_of_day(time) {
        Some((hour, minute)) => now.hour() == hour && now.minute() == minute,
        None => false,
    }
}

/// First enabled rule (in list order) matching `now`.
pub fn find_active_rule<'a>(
    rules: &'a [TimeSpecificNavigation],
    now: &NaiveDateTime,
) -> Option<&'a TimeSpecificNavigation> {
    let weekday = now.weekday().num_days_from_sunday() as u8;
    rules.iter().find(|rule| {
        rule.enabled && is_active_day(rule.days.as_deref(), weekday) && is_time_match(now, &rule.time)
    })
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    // 2026-10-17 is a Saturday.
    fn at(hour: u32, minute: u32, second: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 10, 17)
            .unwrap()
            .and_hms_opt(hour, minute, second)
            .unwrap()
    }

    fn rule(id: &str, time: &str, days: Option<Vec<u8>>) -> TimeSpecificNavigation {
        TimeSpecificNavigation {
            id: id.into(),
            enabled: true,
            screen: format!("/{id}"),
            time: time.into(),
            duration_minutes: 30,
            days,
        }
    }

    #[test]
    fn absent_days_means_every_day() {
        for weekday in 0..7 {
            assert!(is_active_day(None, weekday));
        }
    }

    #[test]
    fn listed_days_only() {
        let weekend: &[u8] = &[0, 6];
        assert!(is_active_day(Some(weekend), 6));
        assert!(!is_active_day(Some(weekend), 3));
        assert!(!is_active_day(Some(&[][..]), 0));
    }

    #[test]
    fn matches_for_the_whole_minute() {
        assert!(is_time_match(&at(7, 30, 0), "07:30"));
        assert!(is_time_match(&at(7, 30, 59), "07:30"));
        assert!(!is_time_match(&at(7, 31, 0), "07:30"));
        assert!(!is_time_match(&at(19, 30, 0), "07:30"));
        assert!(is_time_match(&at(7, 5, 10), "7:05"));
    }

    #[test]
    fn malformed_times_never_match() {
        for bad in ["", "0730", "7", "24:00", "12:60", "ab:cd", "12:3x", "-1:30", "123:00", "12:30:00"] {
            assert_eq!(parse_time_of_day(bad), None, "{bad:?}");
            assert!(!is_time_match(&at(12, 30, 0), bad), "{bad:?}");
        }
        assert_eq!(parse_time_of_day(" 23:59 "), Some((23, 59)));
    }

    #[test]
    fn first_matching_rule_in_list_order_wins() {
        let rules = vec![
            rule("breakfast", "08:00", Some(vec![1, 2, 3, 4, 5])),
            rule("first", "07:30", None),
            rule("second", "07:30", None),
        ];
        let found = find_active_rule(&rules, &at(7, 30, 15)).unwrap();
        assert_eq!(found.id, "first");

        let reversed: Vec<_> = rules.iter().rev().cloned().collect();
        assert_eq!(find_active_rule(&reversed, &at(7, 30, 15)).unwrap().id, "second");
    }

    #[test]
    fn disabled_and_off_day_rules_are_skipped() {
        let mut disabled = rule("disabled", "07:30", None);
        disabled.enabled = false;
        let rules = vec![
            disabled,
            rule("weekdays", "07:30", Some(vec![1, 2, 3, 4, 5])),
            rule("broken", "7h30", None),
        ];
        assert!(find_active_rule(&rules, &at(7, 30, 0)).is_none());

        let saturday = rule("saturday", "07:30", Some(vec![6]));
        let rules = [rules, vec![saturday]].concat();
        assert_eq!(find_active_rule(&rules, &at(7, 30, 0)).unwrap().id, "saturday");
    }
}
