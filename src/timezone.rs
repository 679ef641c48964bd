use time::{Date, OffsetDateTime, UtcOffset};
use time_tz::{Offset, TimeZone};

use crate::Error;

/// Get the current UTC offset of the timezone `canonical_timezone`, e.g. "Pacific/Auckland".
pub fn get_local_offset(canonical_timezone: &str) -> Option<UtcOffset> {
    time_tz::timezones::get_by_name(canonical_timezone)
        .map(|tz| tz.get_offset_utc(&OffsetDateTime::now_utc()).to_utc())
}

/// The current date and time in the timezone `canonical_timezone`.
///
/// # Errors
/// Returns an [Error::InvalidTimezoneError] if `canonical_timezone` is not a
/// known timezone.
pub(crate) fn local_now(canonical_timezone: &str) -> Result<OffsetDateTime, Error> {
    let offset = get_local_offset(canonical_timezone)
        .ok_or_else(|| Error::InvalidTimezoneError(canonical_timezone.to_owned()))?;

    Ok(OffsetDateTime::now_utc().to_offset(offset))
}

/// Today's date in the timezone `canonical_timezone`.
pub(crate) fn local_today(canonical_timezone: &str) -> Result<Date, Error> {
    local_now(canonical_timezone).map(|now| now.date())
}
