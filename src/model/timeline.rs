use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Month abbreviations used in the roadmap header.
const MONTH_NAMES: [&str; 12] = [
    "JAN", "FEV", "MAR", "AVR", "MAI", "JUIN", "JUIL", "AOUT", "SEP", "OCT", "NOV", "DEC",
];

/// Number of days in the given month (1-based).
pub fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month >= 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|d| d.pred_opt())
        .map(|d| d.day())
        .unwrap_or(31)
}

/// A single entry of the month header row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthLabel {
    pub name: String,
    pub year: i32,
    /// Calendar month, 1-based.
    pub month: u32,
}

/// Fixed origin of the horizontal axis.
///
/// The first day of the origin month sits at position 0 and every calendar
/// month, whatever its length, spans exactly `month_width` pixels. Later dates
/// never map left of earlier ones.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeOrigin {
    /// First day of the origin month.
    pub date: NaiveDate,
    /// Pixels per calendar month.
    pub month_width: f64,
}

impl TimeOrigin {
    /// The origin is normalised to the first day of `date`'s month.
    pub fn new(date: NaiveDate, month_width: f64) -> Self {
        Self {
            date: date.with_day(1).unwrap_or(date),
            month_width,
        }
    }

    fn month_index(year: i32, month0: u32) -> i64 {
        year as i64 * 12 + month0 as i64
    }

    /// Convert a date to an x-pixel position.
    ///
    /// A start-of-day position covers `(day - 1) / days_in_month` of the month,
    /// an end-of-day position covers `day / days_in_month`, so a task starting
    /// and ending on the same day still spans that whole day. Positions are
    /// rounded to the nearest pixel and never negative.
    pub fn date_to_position(&self, date: NaiveDate, end_of_day: bool) -> f64 {
        let months = Self::month_index(date.year(), date.month0())
            - Self::month_index(self.date.year(), self.date.month0());
        let days = days_in_month(date.year(), date.month()) as f64;
        let day = date.day() as f64;
        let progress = if end_of_day {
            day / days
        } else {
            (day - 1.0) / days
        };
        ((months as f64 + progress) * self.month_width)
            .round()
            .max(0.0)
    }

    /// Convert an x-pixel position back to a date.
    ///
    /// This is only an approximate inverse of [`date_to_position`]: the
    /// fractional month progress is scaled by the real length of the target
    /// month and rounded, so the result may be one day off. Positions left of
    /// the origin resolve to the origin.
    ///
    /// [`date_to_position`]: Self::date_to_position
    pub fn position_to_date(&self, position: f64) -> NaiveDate {
        if self.month_width <= 0.0 {
            return self.date;
        }
        let months_f = position.max(0.0) / self.month_width;
        let whole = months_f.floor();
        let fraction = months_f - whole;

        let index = Self::month_index(self.date.year(), self.date.month0()) + whole as i64;
        let year = index.div_euclid(12) as i32;
        let month = index.rem_euclid(12) as u32 + 1;
        let days = days_in_month(year, month);
        let day = ((fraction * days as f64).round() as u32).clamp(1, days);

        NaiveDate::from_ymd_opt(year, month, day).unwrap_or(self.date)
    }

    /// Position of the "today" marker (start of the current day).
    pub fn today_position(&self, today: NaiveDate) -> f64 {
        self.date_to_position(today, false)
    }

    /// Number of header months needed so the header covers `max_end`, plus one
    /// trailing month.
    pub fn months_to_cover(&self, max_end: f64) -> usize {
        if self.month_width <= 0.0 {
            return 1;
        }
        (max_end.max(0.0) / self.month_width).ceil() as usize + 1
    }

    /// Month header labels starting at the origin month.
    pub fn months(&self, count: usize) -> Vec<MonthLabel> {
        let start = Self::month_index(self.date.year(), self.date.month0());
        (0..count as i64)
            .map(|offset| {
                let index = start + offset;
                let month0 = index.rem_euclid(12) as usize;
                MonthLabel {
                    name: MONTH_NAMES[month0].to_string(),
                    year: index.div_euclid(12) as i32,
                    month: month0 as u32 + 1,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn origin() -> TimeOrigin {
        TimeOrigin::new(NaiveDate::from_ymd_opt(2025, 12, 1).unwrap(), 150.0)
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn origin_maps_to_zero() {
        assert_eq!(origin().date_to_position(date(2025, 12, 1), false), 0.0);
    }

    #[test]
    fn end_of_day_covers_the_whole_day() {
        let o = origin();
        // 31 days in December: one day is ~4.84px.
        assert_eq!(o.date_to_position(date(2025, 12, 1), true), 5.0);
        assert_eq!(o.date_to_position(date(2025, 12, 31), true), 150.0);
        assert_eq!(o.date_to_position(date(2026, 1, 1), false), 150.0);
    }

    #[test]
    fn months_use_their_real_length() {
        let o = origin();
        // Mid-February 2026 (28 days): 2 months + 14/28.
        assert_eq!(o.date_to_position(date(2026, 2, 15), false), 375.0);
    }

    #[test]
    fn dates_before_origin_clamp_to_zero() {
        assert_eq!(origin().date_to_position(date(2025, 6, 10), true), 0.0);
    }

    #[test]
    fn mapping_is_monotonic_over_a_year() {
        let o = origin();
        let mut day = date(2025, 12, 1);
        let mut last = 0.0;
        while day < date(2027, 1, 1) {
            let pos = o.date_to_position(day, false);
            assert!(pos >= last, "{day} mapped left of its predecessor");
            last = pos;
            day = day.succ_opt().unwrap();
        }
    }

    #[test]
    fn round_trip_stays_within_one_day() {
        let o = origin();
        let mut day = date(2025, 12, 1);
        while day < date(2027, 3, 1) {
            for end_of_day in [false, true] {
                let back = o.position_to_date(o.date_to_position(day, end_of_day));
                let drift = (back - day).num_days().abs();
                assert!(drift <= 1, "{day} came back as {back}");
            }
            day = day.succ_opt().unwrap();
        }
    }

    #[test]
    fn position_to_date_clamps_day_into_month() {
        let o = origin();
        assert_eq!(o.position_to_date(0.0), date(2025, 12, 1));
        assert_eq!(o.position_to_date(-40.0), date(2025, 12, 1));
        assert_eq!(o.position_to_date(149.9), date(2025, 12, 31));
    }

    #[test]
    fn origin_is_normalised_to_first_of_month() {
        let o = TimeOrigin::new(date(2025, 12, 17), 150.0);
        assert_eq!(o.date, date(2025, 12, 1));
    }

    #[test]
    fn header_months_roll_over_years() {
        let months = origin().months(3);
        assert_eq!(months[0].name, "DEC");
        assert_eq!(months[0].year, 2025);
        assert_eq!(months[1].name, "JAN");
        assert_eq!(months[1].year, 2026);
        assert_eq!(months[2].month, 2);
    }

    #[test]
    fn months_to_cover_adds_trailing_month() {
        let o = origin();
        assert_eq!(o.months_to_cover(0.0), 1);
        assert_eq!(o.months_to_cover(150.0), 2);
        assert_eq!(o.months_to_cover(151.0), 3);
    }

    #[test]
    fn february_of_leap_year() {
        assert_eq!(days_in_month(2028, 2), 29);
        assert_eq!(days_in_month(2026, 2), 28);
        assert_eq!(days_in_month(2026, 12), 31);
    }
}
