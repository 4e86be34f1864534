use anyhow::Context;
use time::{macros::format_description, Date, Month, UtcOffset};

use crate::dashboard::aggregate::round1;
use crate::meals::repo_types::{MealRecord, TimeRange};

pub const HEADER: [&str; 10] = [
    "Date",
    "Time",
    "Food",
    "Calories",
    "Protein (g)",
    "Carbs (g)",
    "Fat (g)",
    "Food Score",
    "Health Benefits",
    "Health Negatives",
];

const LIST_SEPARATOR: &str = "; ";

/// `YYYY-MM-DD`, zero padding optional; anything else is `None` so the bound
/// is simply not applied.
pub fn parse_date_filter(raw: Option<&str>) -> Option<Date> {
    let mut parts = raw?.trim().splitn(3, '-');
    let year: i32 = parts.next()?.parse().ok()?;
    let month: u8 = parts.next()?.parse().ok()?;
    let day: u8 = parts.next()?.parse().ok()?;
    Date::from_calendar_date(year, Month::try_from(month).ok()?, day).ok()
}

/// Both bounds are whole UTC days; `end` is inclusive.
pub fn export_range(start: Option<Date>, end: Option<Date>) -> TimeRange {
    TimeRange {
        start: start.map(|d| d.midnight().assume_utc()),
        end: end.map(|d| match d.next_day() {
            Some(next) => next.midnight().assume_utc(),
            None => d.with_hms(23, 59, 59).unwrap_or(d.midnight()).assume_utc(),
        }),
    }
}

/// Renders meals in the order given. Times are UTC.
pub fn write_csv(meals: &[MealRecord]) -> anyhow::Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(HEADER).context("write csv header")?;

    for meal in meals {
        let at = meal.logged_at.to_offset(UtcOffset::UTC);
        writer
            .write_record([
                at.format(format_description!("[year]-[month]-[day]"))?,
                at.format(format_description!("[hour]:[minute]"))?,
                meal.food_name.clone(),
                format!("{:.1}", round1(meal.calories)),
                format!("{:.1}", round1(meal.protein)),
                format!("{:.1}", round1(meal.carbs)),
                format!("{:.1}", round1(meal.fat)),
                meal.food_score.to_string(),
                meal.health_benefits.join(LIST_SEPARATOR),
                meal.health_negatives.join(LIST_SEPARATOR),
            ])
            .with_context(|| format!("write csv row for meal {}", meal.id))?;
    }

    writer.into_inner().map_err(|e| e.into_error().into())
}
