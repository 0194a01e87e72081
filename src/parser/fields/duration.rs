use std::sync::LazyLock;

use regex::Regex;

static ISO_DURATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^P(?:(\d+)Y)?(?:(\d+)M)?(?:(\d+)D)?(?:T(?:(\d+)H)?(?:(\d+)M)?(?:(\d+)(?:[.,]\d+)?S)?)?$",
    )
    .unwrap()
});

/// Integer components of an ISO-8601 duration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IsoDuration {
    pub years: u64,
    pub months: u64,
    pub days: u64,
    pub hours: u64,
    pub minutes: u64,
    pub seconds: u64,
}

/// Parse `P[nY][nM][nD][T[nH][nM][nS]]`. `None` for anything else, including
/// a bare `P`/`PT` or a dangling `T`. A fractional seconds part (`0.000S`) is
/// dropped.
pub fn parse_iso_duration(raw: &str) -> Option<IsoDuration> {
    let s = raw.trim();
    let caps = ISO_DURATION_RE.captures(s)?;

    let has_date = (1..=3).any(|i| caps.get(i).is_some());
    let has_time = (4..=6).any(|i| caps.get(i).is_some());
    let has_t = s[1..].to_ascii_uppercase().contains('T');
    if (!has_date && !has_time) || (has_t && !has_time) {
        return None;
    }

    let num = |i: usize| -> Option<u64> {
        match caps.get(i) {
            Some(m) => m.as_str().parse().ok(),
            None => Some(0),
        }
    };

    Some(IsoDuration {
        years: num(1)?,
        months: num(2)?,
        days: num(3)?,
        hours: num(4)?,
        minutes: num(5)?,
        seconds: num(6)?,
    })
}

impl IsoDuration {
    /// Non-zero components, largest first: `1 hr 30 min`. `None` when all are zero.
    pub fn humanize(&self) -> Option<String> {
        let units: [(u64, &str, &str); 6] = [
            (self.years, "yr", "yrs"),
            (self.months, "mo", "mos"),
            (self.days, "day", "days"),
            (self.hours, "hr", "hrs"),
            (self.minutes, "min", "min"),
            (self.seconds, "sec", "sec"),
        ];

        let parts: Vec<String> = units
            .iter()
            .filter(|(n, ..)| *n > 0)
            .map(|(n, one, many)| format!("{} {}", n, if *n == 1 { one } else { many }))
            .collect();

        if parts.is_empty() {
            None
        } else {
            Some(parts.join(" "))
        }
    }
}

/// Human-readable form of an ISO duration; absent or malformed input gives `None`.
pub fn format_duration(raw: Option<&str>) -> Option<String> {
    parse_iso_duration(raw?)?.humanize()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hours_and_minutes() {
        assert_eq!(format_duration(Some("PT1H30M")).as_deref(), Some("1 hr 30 min"));
        assert_eq!(format_duration(Some("PT45M")).as_deref(), Some("45 min"));
        assert_eq!(format_duration(Some("PT2H")).as_deref(), Some("2 hrs"));
    }

    #[test]
    fn date_components() {
        assert_eq!(format_duration(Some("P1DT2H")).as_deref(), Some("1 day 2 hrs"));
        assert_eq!(format_duration(Some("P2D")).as_deref(), Some("2 days"));
        assert_eq!(
            format_duration(Some("P1Y2M3DT4H5M6S")).as_deref(),
            Some("1 yr 2 mos 3 days 4 hrs 5 min 6 sec")
        );
    }

    #[test]
    fn months_vs_minutes() {
        let d = parse_iso_duration("P3M").unwrap();
        assert_eq!(d.months, 3);
        assert_eq!(d.minutes, 0);
        let d = parse_iso_duration("PT3M").unwrap();
        assert_eq!(d.months, 0);
        assert_eq!(d.minutes, 3);
    }

    #[test]
    fn zero_components_skipped() {
        assert_eq!(format_duration(Some("PT0H15M")).as_deref(), Some("15 min"));
        assert_eq!(format_duration(Some("P0DT1H0M")).as_deref(), Some("1 hr"));
    }

    #[test]
    fn all_zero_is_absent_but_well_formed() {
        assert!(parse_iso_duration("PT0M").is_some());
        assert_eq!(format_duration(Some("PT0M")), None);
    }

    #[test]
    fn fractional_seconds_truncated() {
        assert_eq!(format_duration(Some("PT0H35M0.000S")).as_deref(), Some("35 min"));
        assert_eq!(format_duration(Some("PT1M30.5S")).as_deref(), Some("1 min 30 sec"));
        assert_eq!(format_duration(Some("PT0.5S")), None);
        assert_eq!(format_duration(Some("PT.5S")), None);
    }

    #[test]
    fn lowercase_and_whitespace() {
        assert_eq!(format_duration(Some("  pt20m ")).as_deref(), Some("20 min"));
    }

    #[test]
    fn absent_and_malformed() {
        assert_eq!(format_duration(None), None);
        assert_eq!(format_duration(Some("not-a-duration")), None);
        assert_eq!(format_duration(Some("")), None);
        assert_eq!(format_duration(Some("P")), None);
        assert_eq!(format_duration(Some("PT")), None);
        assert_eq!(format_duration(Some("P1DT")), None);
        assert_eq!(format_duration(Some("PT1.5H")), None);
        assert_eq!(format_duration(Some("20 minutes")), None);
        assert_eq!(format_duration(Some("PT99999999999999999999M")), None);
    }
}
