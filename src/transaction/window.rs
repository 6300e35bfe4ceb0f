//! Calendar-day date windows used to filter transactions.
//!
//! Days are interpreted in the server's local timezone and converted to
//! absolute instants before querying the store. Each boundary gets the offset
//! in effect at that boundary, so a day may be 23 or 25 hours long.

use std::ops::Bound;

use time::{Date, Duration, OffsetDateTime, PrimitiveDateTime, macros::format_description};
use time_tz::{
    Offset, OffsetDateTimeExt, OffsetResult, PrimitiveDateTimeExt, TimeZone, Tz, timezones,
};

use crate::Error;

/// A date range that can be passed to [super::query::TransactionQuery].
pub(crate) type DateWindow = (Bound<OffsetDateTime>, Bound<OffsetDateTime>);

/// Look up the timezone named `local_timezone`, e.g. "Pacific/Auckland".
///
/// # Errors
/// Returns [Error::InvalidTimezoneError] if `local_timezone` is not a known canonical timezone name.
pub(crate) fn local_timezone(local_timezone: &str) -> Result<&'static Tz, Error> {
    timezones::get_by_name(local_timezone).ok_or_else(|| {
        tracing::error!("Could not find timezone {local_timezone}");
        Error::InvalidTimezoneError(local_timezone.to_owned())
    })
}

/// Parse a calendar day in the format `YYYY-MM-DD`.
///
/// # Errors
/// Returns [Error::InvalidDate] if `date` is missing or is not a valid calendar day.
pub(crate) fn parse_day(date: Option<&str>) -> Result<Date, Error> {
    let date = date.ok_or_else(|| Error::InvalidDate("missing date".to_owned()))?;

    Date::parse(date, format_description!("[year]-[month]-[day]"))
        .map_err(|error| Error::InvalidDate(format!("{date}: {error}")))
}

/// The half-open window `[day 00:00:00.000, day + 1 00:00:00.000)` in `tz`.
pub(crate) fn day_window(day: Date, tz: &Tz) -> DateWindow {
    let start = assume_local(day.midnight(), tz);
    let end = match day.next_day() {
        Some(next_day) => Bound::Excluded(assume_local(next_day.midnight(), tz)),
        None => Bound::Unbounded,
    };

    (Bound::Included(start), end)
}

/// The closed window `[today 00:00:00.000, today 23:59:59.999]`, where today is the calendar day
/// of `now` in `tz`.
///
/// Unlike [day_window], the end of this window is inclusive.
pub(crate) fn today_window(now: OffsetDateTime, tz: &Tz) -> DateWindow {
    let today = now.to_timezone(tz).date();
    let start = assume_local(today.midnight(), tz);
    let end = match today.next_day() {
        Some(next_day) => {
            Bound::Included(assume_local(next_day.midnight(), tz) - Duration::milliseconds(1))
        }
        None => Bound::Unbounded,
    };

    (Bound::Included(start), end)
}

/// Attach the offset `tz` has at the wall-clock time `local`.
///
/// A repeated wall-clock time resolves to its first occurrence. A skipped one takes the offset
/// from before the clocks jumped forward, so a skipped midnight resolves to the jump itself.
fn assume_local(local: PrimitiveDateTime, tz: &Tz) -> OffsetDateTime {
    match local.assume_timezone(tz) {
        OffsetResult::Some(datetime) => datetime,
        OffsetResult::Ambiguous(earlier, _) => earlier,
        OffsetResult::None => {
            let offset_before_jump = tz.get_offset_utc(&(local.assume_utc() - Duration::days(1)));
            local.assume_offset(offset_before_jump.to_utc())
        }
    }
}

#[cfg(test)]
mod tests {
    use std::ops::Bound;

    use time::macros::{date, datetime};
    use time_tz::{Tz, timezones};

    use crate::Error;

    use super::{day_window, local_timezone, parse_day, today_window};

    fn utc() -> &'static Tz {
        timezones::get_by_name("Etc/UTC").unwrap()
    }

    fn auckland() -> &'static Tz {
        timezones::get_by_name("Pacific/Auckland").unwrap()
    }

    #[test]
    fn parse_day_accepts_iso_date() {
        assert_eq!(parse_day(Some("2024-03-05")), Ok(date!(2024 - 03 - 05)));
    }

    #[test]
    fn parse_day_rejects_missing_date() {
        assert!(matches!(parse_day(None), Err(Error::InvalidDate(_))));
    }

    #[test]
    fn parse_day_rejects_garbage() {
        for input in ["", "yesterday", "2024-13-01", "2024-02-30", "05/03/2024"] {
            assert!(
                matches!(parse_day(Some(input)), Err(Error::InvalidDate(_))),
                "{input:?} should not parse"
            );
        }
    }

    #[test]
    fn day_window_is_half_open() {
        let (start, end) = day_window(date!(2024 - 03 - 05), utc());

        assert_eq!(start, Bound::Included(datetime!(2024-03-05 00:00 UTC)));
        assert_eq!(end, Bound::Excluded(datetime!(2024-03-06 00:00 UTC)));
    }

    #[test]
    fn day_window_starts_at_local_midnight() {
        // NZDT, UTC+13.
        let (start, _) = day_window(date!(2024 - 03 - 05), auckland());

        assert_eq!(start, Bound::Included(datetime!(2024-03-04 11:00 UTC)));
    }

    #[test]
    fn day_window_uses_standard_time_offset_in_winter() {
        // NZST, UTC+12.
        let (start, end) = day_window(date!(2024 - 07 - 01), auckland());

        assert_eq!(start, Bound::Included(datetime!(2024-06-30 12:00 UTC)));
        assert_eq!(end, Bound::Excluded(datetime!(2024-07-01 12:00 UTC)));
    }

    #[test]
    fn day_window_is_25_hours_when_daylight_saving_ends() {
        // Clocks went back from 03:00 NZDT to 02:00 NZST on 2024-04-07.
        let (start, end) = day_window(date!(2024 - 04 - 07), auckland());

        assert_eq!(start, Bound::Included(datetime!(2024-04-06 11:00 UTC)));
        assert_eq!(end, Bound::Excluded(datetime!(2024-04-07 12:00 UTC)));
    }

    #[test]
    fn day_window_is_23_hours_when_daylight_saving_starts() {
        // Clocks went forward from 02:00 NZST to 03:00 NZDT on 2024-09-29.
        let (start, end) = day_window(date!(2024 - 09 - 29), auckland());

        assert_eq!(start, Bound::Included(datetime!(2024-09-28 12:00 UTC)));
        assert_eq!(end, Bound::Excluded(datetime!(2024-09-29 11:00 UTC)));
    }

    #[test]
    fn today_window_is_closed() {
        let (start, end) = today_window(datetime!(2024-03-05 15:30 UTC), utc());

        assert_eq!(start, Bound::Included(datetime!(2024-03-05 00:00 UTC)));
        assert_eq!(end, Bound::Included(datetime!(2024-03-05 23:59:59.999 UTC)));
    }

    #[test]
    fn today_window_uses_local_calendar_day() {
        // 20:00 UTC on the 5th is already the 6th in NZDT.
        let (start, end) = today_window(datetime!(2024-03-05 20:00 UTC), auckland());

        assert_eq!(start, Bound::Included(datetime!(2024-03-06 00:00 +13)));
        assert_eq!(end, Bound::Included(datetime!(2024-03-06 23:59:59.999 +13)));
    }

    #[test]
    fn today_window_ends_in_standard_time_when_daylight_saving_ends() {
        let (start, end) = today_window(datetime!(2024-04-07 05:00 UTC), auckland());

        assert_eq!(start, Bound::Included(datetime!(2024-04-07 00:00 +13)));
        assert_eq!(end, Bound::Included(datetime!(2024-04-07 23:59:59.999 +12)));
    }

    #[test]
    fn local_timezone_rejects_unknown_timezone() {
        assert!(matches!(
            local_timezone("Middle/Earth"),
            Err(Error::InvalidTimezoneError(name)) if name == "Middle/Earth"
        ));
    }

    #[test]
    fn local_timezone_finds_canonical_name() {
        assert_eq!(local_timezone("Pacific/Auckland"), Ok(auckland()));
    }
}
