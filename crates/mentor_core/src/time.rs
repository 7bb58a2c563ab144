//! crates/mentor_core/src/time.rs
//!
//! Renders timestamps as `YYYY-MM-DD HH:MM:SS` in the server's local zone.

use chrono::{DateTime, Local, TimeZone};
use serde::Serializer;

const FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// The current local time.
pub fn now() -> String {
    time_string(&Local::now())
}

/// Formats any timestamp after converting it to local time.
pub fn time_string<Tz: TimeZone>(time: &DateTime<Tz>) -> String {
    time.with_timezone(&Local).format(FORMAT).to_string()
}

/// `serialize_with` adapter for timestamp fields.
pub fn serialize<S, Tz>(time: &DateTime<Tz>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
    Tz: TimeZone,
{
    serializer.serialize_str(&time_string(time))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};

    #[test]
    fn pads_single_digit_fields() {
        let local = Local
            .from_local_datetime(
                &NaiveDate::from_ymd_opt(2017, 3, 4)
                    .unwrap()
                    .and_hms_opt(5, 6, 7)
                    .unwrap(),
            )
            .single()
            .unwrap();
        assert_eq!(time_string(&local), "2017-03-04 05:06:07");
    }

    #[test]
    fn utc_input_is_shown_in_local_time() {
        let utc = Utc.with_ymd_and_hms(2017, 12, 31, 23, 59, 59).unwrap();
        let expected = utc.with_timezone(&Local).format(FORMAT).to_string();
        assert_eq!(time_string(&utc), expected);
    }

    #[test]
    fn now_has_fixed_width() {
        let s = now();
        assert_eq!(s.len(), 19);
        assert_eq!(&s[4..5], "-");
        assert_eq!(&s[10..11], " ");
        assert_eq!(&s[13..14], ":");
    }

    #[test]
    fn serializes_as_plain_string() {
        #[derive(serde::Serialize)]
        struct Row {
            #[serde(serialize_with = "serialize")]
            at: DateTime<Utc>,
        }
        let at = Utc.with_ymd_and_hms(2020, 1, 2, 3, 4, 5).unwrap();
        let json = serde_json::to_value(Row { at }).unwrap();
        assert_eq!(json["at"], time_string(&at));
    }
}
