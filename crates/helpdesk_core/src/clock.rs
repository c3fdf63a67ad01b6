use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

/// Time source injected into the repositories and the session manager
/// so tests can pin or advance the current instant.
pub trait Clock: Send + Sync {
    fn now(&self) -> OffsetDateTime;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}

/// Always reports the same instant.
pub struct FixedClock(pub OffsetDateTime);

impl Clock for FixedClock {
    fn now(&self) -> OffsetDateTime {
        self.0
    }
}

pub fn to_rfc3339(instant: OffsetDateTime) -> String {
    match instant.to_offset(time::UtcOffset::UTC).format(&Rfc3339) {
        Ok(formatted) => formatted,
        Err(err) => {
            tracing::error!(%err, "timestamp formatting failed");
            String::new()
        }
    }
}

pub fn parse_rfc3339(value: &str) -> Option<OffsetDateTime> {
    match OffsetDateTime::parse(value, &Rfc3339) {
        Ok(instant) => Some(instant),
        Err(err) => {
            tracing::warn!(%err, value, "timestamp failed to parse");
            None
        }
    }
}

/// The UTC calendar-day prefix (`YYYY-MM-DD`) of an instant. Same-day
/// activity checks compare stored RFC 3339 strings against this.
pub fn utc_day_prefix(instant: OffsetDateTime) -> String {
    let date = instant.to_offset(time::UtcOffset::UTC).date();
    format!(
        "{:04}-{:02}-{:02}",
        date.year(),
        u8::from(date.month()),
        date.day()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn rfc3339_round_trip() {
        let instant = datetime!(2024-01-01 12:30:00 UTC);
        let formatted = to_rfc3339(instant);
        assert_eq!(formatted, "2024-01-01T12:30:00Z");
        assert_eq!(parse_rfc3339(&formatted), Some(instant));
    }

    #[test]
    fn day_prefix_is_utc_even_for_offset_instants() {
        // 23:30 at -03:00 is already the next day in UTC.
        let instant = datetime!(2024-01-01 23:30:00 -3);
        assert_eq!(utc_day_prefix(instant), "2024-01-02");
    }

    #[test]
    fn malformed_timestamp_parses_to_none() {
        assert_eq!(parse_rfc3339("not a timestamp"), None);
    }
}
