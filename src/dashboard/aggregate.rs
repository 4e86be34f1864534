//! Day bucketing and nutrition rollups.
//!
//! Stored timestamps are UTC. A client's calendar day is recovered from a
//! UTC "now" and the minutes the client says it is behind UTC: shift back,
//! truncate to midnight, and read that midnight as a UTC instant. No timezone
//! database is involved.

use serde::Serialize;
use time::{Date, Duration, OffsetDateTime, UtcOffset, Weekday};

use crate::meals::repo_types::{MealRecord, TimeRange};

/// Largest accepted `tz_offset`, in minutes.
pub const MAX_TZ_OFFSET_MINUTES: i64 = 24 * 60;

pub const DAYS_PER_WEEK: i64 = 7;

time::serde::format_description!(iso_date, Date, "[year]-[month]-[day]");

/// Missing, negative or unparsable offsets count as 0; large ones are capped.
pub fn normalize_tz_offset(raw: Option<&str>) -> i64 {
    raw.and_then(|s| s.trim().parse::<i64>().ok())
        .unwrap_or(0)
        .clamp(0, MAX_TZ_OFFSET_MINUTES)
}

/// One local calendar day as a half-open UTC interval of exactly 24h.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayRange {
    pub date: Date,
    pub start: OffsetDateTime,
    pub end: OffsetDateTime,
}

impl DayRange {
    pub fn today(now: OffsetDateTime, tz_offset_minutes: i64) -> Self {
        Self::days_ago(now, tz_offset_minutes, 0)
    }

    /// Each call derives its bounds from the local date directly, so
    /// consecutive days never accumulate drift.
    pub fn days_ago(now: OffsetDateTime, tz_offset_minutes: i64, days: i64) -> Self {
        let local_now = now.to_offset(UtcOffset::UTC) - Duration::minutes(tz_offset_minutes);
        let date = local_now.date() - Duration::days(days);
        let start = date.midnight().assume_utc();
        Self {
            date,
            start,
            end: start + Duration::DAY,
        }
    }

    pub fn contains(&self, t: OffsetDateTime) -> bool {
        self.start <= t && t < self.end
    }

    pub fn time_range(&self) -> TimeRange {
        TimeRange::between(self.start, self.end)
    }
}

/// Unrounded sums; rounding happens once, at the output boundary.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
struct Totals {
    calories: f64,
    protein: f64,
    carbs: f64,
    fat: f64,
    meals: usize,
}

impl Totals {
    fn within(range: &DayRange, meals: &[MealRecord]) -> Self {
        meals
            .iter()
            .filter(|m| range.contains(m.logged_at))
            .fold(Self::default(), |acc, m| Self {
                calories: acc.calories + m.calories,
                protein: acc.protein + m.protein,
                carbs: acc.carbs + m.carbs,
                fat: acc.fat + m.fat,
                meals: acc.meals + 1,
            })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyBucket {
    #[serde(with = "iso_date")]
    pub date: Date,
    pub day_name: &'static str,
    pub total_calories: f64,
    pub total_protein: f64,
    pub total_carbs: f64,
    pub total_fat: f64,
    pub meal_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailySummary {
    pub total_calories: f64,
    pub total_protein: f64,
    pub total_carbs: f64,
    pub total_fat: f64,
    pub target: i32,
    pub remaining: f64,
    pub progress_pct: f64,
    pub meal_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeeklySummary {
    pub days: Vec<DailyBucket>,
    pub average_calories: f64,
    pub target: i32,
}

pub fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

pub fn bucket(range: &DayRange, meals: &[MealRecord]) -> DailyBucket {
    let totals = Totals::within(range, meals);
    DailyBucket {
        date: range.date,
        day_name: short_weekday(range.date.weekday()),
        total_calories: round1(totals.calories),
        total_protein: round1(totals.protein),
        total_carbs: round1(totals.carbs),
        total_fat: round1(totals.fat),
        meal_count: totals.meals,
    }
}

pub fn daily_summary(range: &DayRange, meals: &[MealRecord], target: i32) -> DailySummary {
    let totals = Totals::within(range, meals);
    let target_kcal = f64::from(target);
    let progress_pct = if target > 0 {
        round1(totals.calories / target_kcal * 100.0)
    } else {
        0.0
    };
    DailySummary {
        total_calories: round1(totals.calories),
        total_protein: round1(totals.protein),
        total_carbs: round1(totals.carbs),
        total_fat: round1(totals.fat),
        target,
        remaining: round1((target_kcal - totals.calories).max(0.0)),
        progress_pct,
        meal_count: totals.meals,
    }
}

/// The seven local days ending today, oldest first.
pub fn week_ranges(now: OffsetDateTime, tz_offset_minutes: i64) -> Vec<DayRange> {
    (0..DAYS_PER_WEEK)
        .rev()
        .map(|days| DayRange::days_ago(now, tz_offset_minutes, days))
        .collect()
}

pub fn weekly_summary(days: &[DayRange], meals: &[MealRecord], target: i32) -> WeeklySummary {
    let days: Vec<DailyBucket> = days.iter().map(|d| bucket(d, meals)).collect();
    let logged: Vec<f64> = days
        .iter()
        .map(|d| d.total_calories)
        .filter(|c| *c > 0.0)
        .collect();
    let average_calories = if logged.is_empty() {
        0.0
    } else {
        round1(logged.iter().sum::<f64>() / logged.len() as f64)
    };
    WeeklySummary {
        days,
        average_calories,
        target,
    }
}

fn short_weekday(day: Weekday) -> &'static str {
    match day {
        Weekday::Monday => "Mon",
        Weekday::Tuesday => "Tue",
        Weekday::Wednesday => "Wed",
        Weekday::Thursday => "Thu",
        Weekday::Friday => "Fri",
        Weekday::Saturday => "Sat",
        Weekday::Sunday => "Sun",
    }
}
