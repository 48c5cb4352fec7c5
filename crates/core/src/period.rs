use chrono::{Datelike, Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::expense::Expense;
use crate::money::Money;

/// Granularity used to bucket expenses for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupMode {
    #[default]
    Day,
    Week,
    Month,
}

impl fmt::Display for GroupMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupMode::Day => write!(f, "day"),
            GroupMode::Week => write!(f, "week"),
            GroupMode::Month => write!(f, "month"),
        }
    }
}

impl FromStr for GroupMode {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "day" => Ok(GroupMode::Day),
            "week" => Ok(GroupMode::Week),
            "month" => Ok(GroupMode::Month),
            other => Err(format!("Unknown group mode: '{other}'")),
        }
    }
}

/// Bucket key for `date`: `2024-05-20`, `2024-W21` or `2024-05`.
///
/// Week keys use the ISO-8601 week-year, so 2024-12-30 lands in `2025-W01`.
/// All three formats sort chronologically as plain strings.
pub fn bucket_key(date: NaiveDate, mode: GroupMode) -> String {
    match mode {
        GroupMode::Day => date.format("%Y-%m-%d").to_string(),
        GroupMode::Week => {
            let week = date.iso_week();
            format!("{:04}-W{:02}", week.year(), week.week())
        }
        GroupMode::Month => date.format("%Y-%m").to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseGroup {
    pub key: String,
    pub total: Money,
    pub expenses: Vec<Expense>,
}

/// Group expenses by bucket, newest bucket first. Expenses keep their input
/// order inside each group.
pub fn group_by(expenses: &[Expense], mode: GroupMode) -> Vec<ExpenseGroup> {
    let mut buckets: BTreeMap<String, Vec<Expense>> = BTreeMap::new();
    for expense in expenses {
        buckets
            .entry(bucket_key(expense.date, mode))
            .or_default()
            .push(expense.clone());
    }

    buckets
        .into_iter()
        .rev()
        .map(|(key, expenses)| ExpenseGroup {
            key,
            total: expenses.iter().map(|e| e.amount).sum(),
            expenses,
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {}", self.start, self.end)
    }
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        DateRange { start, end }
    }

    pub fn contains(self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }
}

/// Quick date-range choices offered by the expense list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DatePreset {
    Today,
    Yesterday,
    #[serde(rename = "last7days")]
    Last7Days,
    #[serde(rename = "last30days")]
    Last30Days,
    ThisWeek,
    LastWeek,
    ThisMonth,
    LastMonth,
    ThisYear,
    Custom,
    All,
}

impl DatePreset {
    /// Presets that resolve to a concrete range, in display order.
    pub const RANGED: [DatePreset; 9] = [
        DatePreset::Today,
        DatePreset::Yesterday,
        DatePreset::Last7Days,
        DatePreset::Last30Days,
        DatePreset::ThisWeek,
        DatePreset::LastWeek,
        DatePreset::ThisMonth,
        DatePreset::LastMonth,
        DatePreset::ThisYear,
    ];

    pub fn label(self) -> &'static str {
        match self {
            DatePreset::Today => "Today",
            DatePreset::Yesterday => "Yesterday",
            DatePreset::Last7Days => "Last 7 Days",
            DatePreset::Last30Days => "Last 30 Days",
            DatePreset::ThisWeek => "This Week",
            DatePreset::LastWeek => "Last Week",
            DatePreset::ThisMonth => "This Month",
            DatePreset::LastMonth => "Last Month",
            DatePreset::ThisYear => "This Year",
            DatePreset::Custom => "Custom",
            DatePreset::All => "All Time",
        }
    }

    /// Inclusive range relative to `today`. `None` for `Custom` and `All`,
    /// and for dates at the edge of chrono's calendar.
    pub fn range(self, today: NaiveDate) -> Option<DateRange> {
        let (start, end) = match self {
            DatePreset::Today => (today, today),
            DatePreset::Yesterday => {
                let d = today.checked_sub_days(Days::new(1))?;
                (d, d)
            }
            DatePreset::Last7Days => (today.checked_sub_days(Days::new(6))?, today),
            DatePreset::Last30Days => (today.checked_sub_days(Days::new(29))?, today),
            DatePreset::ThisWeek => week_of(today)?,
            DatePreset::LastWeek => week_of(today.checked_sub_days(Days::new(7))?)?,
            DatePreset::ThisMonth => month_of(today)?,
            DatePreset::LastMonth => {
                let first = today.with_day(1)?.checked_sub_months(Months::new(1))?;
                month_of(first)?
            }
            DatePreset::ThisYear => (NaiveDate::from_ymd_opt(today.year(), 1, 1)?, today),
            DatePreset::Custom | DatePreset::All => return None,
        };
        Some(DateRange::new(start, end))
    }

    /// Which preset a `(start, end)` pair corresponds to on `today`.
    pub fn detect(start: Option<NaiveDate>, end: Option<NaiveDate>, today: NaiveDate) -> DatePreset {
        let (start, end) = match (start, end) {
            (None, None) => return DatePreset::All,
            (Some(s), Some(e)) => (s, e),
            _ => return DatePreset::Custom,
        };
        DatePreset::RANGED
            .into_iter()
            .find(|p| p.range(today) == Some(DateRange::new(start, end)))
            .unwrap_or(DatePreset::Custom)
    }
}

/// Monday through Sunday containing `date`.
fn week_of(date: NaiveDate) -> Option<(NaiveDate, NaiveDate)> {
    let monday = date.checked_sub_days(Days::new(date.weekday().num_days_from_monday() as u64))?;
    Some((monday, monday.checked_add_days(Days::new(6))?))
}

fn month_of(date: NaiveDate) -> Option<(NaiveDate, NaiveDate)> {
    let first = date.with_day(1)?;
    let last = first.checked_add_months(Months::new(1))?.pred_opt()?;
    Some((first, last))
}
