//! Calendar age of a child.

use chrono::{Datelike, Months, NaiveDate};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Age {
    pub years: u32,
    pub months: u32,
    pub days: u32,
}

impl Age {
    /// Whole years, months and days from `born` to `on`. `None` if `on` is
    /// before `born`.
    ///
    /// A month is counted once the same day of the month is reached. When
    /// that day does not exist (born on the 31st, or on 29 February) the last
    /// day of the shorter month counts.
    pub fn between(born: NaiveDate, on: NaiveDate) -> Option<Age> {
        if on < born {
            return None;
        }
        let mut total_months =
            (on.year() - born.year()) * 12 + on.month() as i32 - born.month() as i32;
        let mut anchor = born.checked_add_months(Months::new(total_months as u32))?;
        if anchor > on {
            total_months -= 1;
            anchor = born.checked_add_months(Months::new(total_months as u32))?;
        }
        let days = (on - anchor).num_days();
        Some(Age {
            years: total_months as u32 / 12,
            months: total_months as u32 % 12,
            days: days as u32,
        })
    }

    pub fn total_months(&self) -> u32 {
        self.years * 12 + self.months
    }

    /// "12 days", "5 months", "1 year", "2 years, 3 months".
    pub fn label(&self) -> String {
        match (self.years, self.months) {
            (0, 0) => plural(self.days, "day"),
            (0, months) => plural(months, "month"),
            (years, 0) => plural(years, "year"),
            (years, months) => format!("{}, {}", plural(years, "year"), plural(months, "month")),
        }
    }
}

fn plural(count: u32, unit: &str) -> String {
    if count == 1 {
        format!("1 {}", unit)
    } else {
        format!("{} {}s", count, unit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn age(years: u32, months: u32, days: u32) -> Option<Age> {
        Some(Age {
            years,
            months,
            days,
        })
    }

    #[test]
    fn simple_spans() {
        assert_eq!(Age::between(date(2024, 1, 10), date(2024, 1, 10)), age(0, 0, 0));
        assert_eq!(Age::between(date(2024, 1, 10), date(2024, 1, 22)), age(0, 0, 12));
        assert_eq!(Age::between(date(2024, 1, 10), date(2024, 3, 9)), age(0, 1, 28));
        assert_eq!(Age::between(date(2022, 6, 1), date(2024, 9, 15)), age(2, 3, 14));
        assert_eq!(Age::between(date(2024, 1, 10), date(2024, 1, 9)), None);
    }

    #[test]
    fn month_ends() {
        // Born on the 31st: February's last day completes the first month.
        assert_eq!(Age::between(date(2024, 1, 31), date(2024, 2, 28)), age(0, 0, 28));
        assert_eq!(Age::between(date(2024, 1, 31), date(2024, 2, 29)), age(0, 1, 0));
        assert_eq!(Age::between(date(2024, 1, 31), date(2024, 3, 1)), age(0, 1, 1));
        assert_eq!(Age::between(date(2024, 1, 31), date(2024, 3, 31)), age(0, 2, 0));
    }

    #[test]
    fn leap_day_birthdays() {
        assert_eq!(Age::between(date(2024, 2, 29), date(2025, 2, 27)), age(0, 11, 29));
        assert_eq!(Age::between(date(2024, 2, 29), date(2025, 2, 28)), age(1, 0, 0));
        assert_eq!(Age::between(date(2024, 2, 29), date(2025, 3, 1)), age(1, 0, 1));
        assert_eq!(Age::between(date(2024, 2, 29), date(2028, 2, 29)), age(4, 0, 0));
    }

    #[test]
    fn labels() {
        let label = |born, on| Age::between(born, on).map(|age| age.label());
        assert_eq!(label(date(2024, 1, 10), date(2024, 1, 11)).as_deref(), Some("1 day"));
        assert_eq!(label(date(2024, 1, 10), date(2024, 1, 22)).as_deref(), Some("12 days"));
        assert_eq!(label(date(2024, 1, 10), date(2024, 6, 12)).as_deref(), Some("5 months"));
        assert_eq!(label(date(2023, 1, 10), date(2024, 1, 10)).as_deref(), Some("1 year"));
        assert_eq!(label(date(2022, 1, 10), date(2024, 4, 10)).as_deref(), Some("2 years, 3 months"));
        assert_eq!(Age::between(date(2022, 1, 10), date(2024, 4, 10)).map(|a| a.total_months()), Some(27));
    }
}
