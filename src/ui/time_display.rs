//! Countdown and date strings shown on the cards.
//!
//! Everything here is pure: the caller passes the current time and the target
//! timezone, so the same inputs always render the same text.
use chrono::{DateTime, Datelike, Timelike, Utc};
use chrono_tz::Tz;

pub const STARTED_LABEL: &str = "התחיל";
pub const BRAND_SUFFIX: &str = "טוטו טרנר";

/// Indexed by `num_days_from_monday`.
const WEEKDAYS: [&str; 7] = [
    "יום שני",
    "יום שלישי",
    "יום רביעי",
    "יום חמישי",
    "יום שישי",
    "יום שבת",
    "יום ראשון",
];

const MONTHS: [&str; 12] = [
    "בינואר",
    "בפברואר",
    "במרץ",
    "באפריל",
    "במאי",
    "ביוני",
    "ביולי",
    "באוגוסט",
    "בספטמבר",
    "באוקטובר",
    "בנובמבר",
    "בדצמבר",
];

const MONTHS_SHORT: [&str; 12] = [
    "בינו׳",
    "בפבר׳",
    "במרץ",
    "באפר׳",
    "במאי",
    "ביוני",
    "ביולי",
    "באוג׳",
    "בספט׳",
    "באוק׳",
    "בנוב׳",
    "בדצמ׳",
];

const MINUTE_MS: i64 = 60 * 1000;

/// Time left until kick-off: days+hours from 24h out, hours+minutes from 1h
/// out, minutes below that, and the "started" label once `target` has passed.
pub fn time_until_match(now: DateTime<Utc>, target: DateTime<Utc>) -> String {
    let diff_ms = (target - now).num_milliseconds();
    if diff_ms < 0 {
        return STARTED_LABEL.to_string();
    }

    let total_minutes = diff_ms / MINUTE_MS;
    let total_hours = total_minutes / 60;
    let minutes = total_minutes % 60;

    if total_hours >= 24 {
        format!("{} ימים {} שעות", total_hours / 24, total_hours % 24)
    } else if total_hours > 0 {
        format!("{total_hours} שעות {minutes} דקות")
    } else {
        format!("{minutes} דקות")
    }
}

/// `{weekday}, {day} {month} | {HH:MM} | {brand}` in `tz`.
pub fn format_localized_date(ts: DateTime<Utc>, tz: Tz) -> String {
    let local = ts.with_timezone(&tz);
    let weekday = WEEKDAYS[local.weekday().num_days_from_monday() as usize];
    let month = MONTHS[local.month0() as usize];
    format!(
        "{weekday}, {} {month} | {:02}:{:02} | {BRAND_SUFFIX}",
        local.day(),
        local.hour(),
        local.minute()
    )
}

/// Compact date for list rows. Input that is not RFC 3339 comes back as is.
pub fn format_short_date(raw: &str, tz: Tz) -> String {
    let Some(ts) = seatduty_api::parse_timestamp(raw) else {
        return raw.to_string();
    };
    let local = ts.with_timezone(&tz);
    format!(
        "{} {} {}, {:02}:{:02}",
        local.day(),
        MONTHS_SHORT[local.month0() as usize],
        local.year(),
        local.hour(),
        local.minute()
    )
}
