use time::{format_description::well_known::Rfc3339, OffsetDateTime, PrimitiveDateTime, UtcOffset};

pub(crate) fn primitive_now_utc() -> PrimitiveDateTime {
    let now = OffsetDateTime::now_utc();
    PrimitiveDateTime::new(now.date(), now.time())
}

pub(crate) fn to_primitive_utc(value: OffsetDateTime) -> PrimitiveDateTime {
    let utc = value.to_offset(UtcOffset::UTC);
    PrimitiveDateTime::new(utc.date(), utc.time())
}

pub(crate) fn format_primitive(value: PrimitiveDateTime) -> String {
    value.assume_utc().format(&Rfc3339).unwrap_or_else(|_| value.assume_utc().to_string())
}

pub(crate) fn parse_rfc3339(value: &str) -> Option<PrimitiveDateTime> {
    OffsetDateTime::parse(value, &Rfc3339).ok().map(to_primitive_utc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::{Date, Time};

    #[test]
    fn format_primitive_outputs_utc_z() {
        let date = Date::from_calendar_date(2026, time::Month::February, 3).unwrap();
        let time = Time::from_hms(9, 30, 0).unwrap();
        let value = PrimitiveDateTime::new(date, time);
        assert_eq!(format_primitive(value), "2026-02-03T09:30:00Z");
    }

    #[test]
    fn parse_rfc3339_normalizes_to_utc() {
        let parsed = parse_rfc3339("2026-02-03T12:30:00+03:00").expect("parse");
        assert_eq!(format_primitive(parsed), "2026-02-03T09:30:00Z");
    }

    #[test]
    fn parse_rfc3339_rejects_garbage() {
        assert!(parse_rfc3339("next tuesday").is_none());
    }
}
