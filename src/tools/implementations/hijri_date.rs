// ABOUTME: Tool converting dates between the Gregorian and Hijri calendars
// ABOUTME: Tabular (civil) Islamic calendar via Julian day number arithmetic
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Minaret

//! Tabular Islamic calendar conversion. The civil tabular calendar is an
//! arithmetic approximation; observed dates can differ by a day depending
//! on moon sighting, which the tool output notes.

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate};
use serde_json::{json, Value};

use crate::errors::{AppError, AppResult};
use crate::tools::context::ToolExecutionContext;
use crate::tools::result::ToolResult;
use crate::tools::schema::{JsonSchema, PropertySchema};
use crate::tools::traits::{AgentTool, ToolCapabilities};

const HIJRI_MONTHS: [&str; 12] = [
    "Muharram",
    "Safar",
    "Rabi al-Awwal",
    "Rabi al-Thani",
    "Jumada al-Awwal",
    "Jumada al-Thani",
    "Rajab",
    "Shaban",
    "Ramadan",
    "Shawwal",
    "Dhul-Qadah",
    "Dhul-Hijjah",
];

/// A date in the tabular Islamic calendar
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HijriDate {
    pub year: i64,
    pub month: u8,
    pub day: u8,
}

impl HijriDate {
    /// Month name, or empty for an out-of-range month
    #[must_use]
    pub fn month_name(&self) -> &'static str {
        HIJRI_MONTHS
            .get(usize::from(self.month).wrapping_sub(1))
            .copied()
            .unwrap_or("")
    }
}

// Julian day arithmetic below uses truncating integer division, which is
// what these classic formulas were derived for.

fn gregorian_to_jd(date: NaiveDate) -> i64 {
    let y = i64::from(date.year());
    let m = i64::from(date.month());
    let d = i64::from(date.day());

    (1461 * (y + 4800 + (m - 14) / 12)) / 4 + (367 * (m - 2 - 12 * ((m - 14) / 12))) / 12
        - (3 * ((y + 4900 + (m - 14) / 12) / 100)) / 4
        + d
        - 32075
}

fn jd_to_gregorian(jd: i64) -> Option<NaiveDate> {
    let mut l = jd + 68569;
    let n = (4 * l) / 146097;
    l -= (146097 * n + 3) / 4;
    let i = (4000 * (l + 1)) / 1461001;
    l = l - (1461 * i) / 4 + 31;
    let j = (80 * l) / 2447;
    let d = l - (2447 * j) / 80;
    l = j / 11;
    let m = j + 2 - 12 * l;
    let y = 100 * (n - 49) + i + l;

    NaiveDate::from_ymd_opt(i32::try_from(y).ok()?, u32::try_from(m).ok()?, u32::try_from(d).ok()?)
}

fn jd_to_hijri(jd: i64) -> HijriDate {
    let mut l = jd - 1948440 + 10632;
    let n = (l - 1) / 10631;
    l = l - 10631 * n + 354;
    let j = ((10985 - l) / 5316) * ((50 * l) / 17719) + (l / 5670) * ((43 * l) / 15238);
    l = l - ((30 - j) / 15) * ((17719 * j) / 50) - (j / 16) * ((15238 * j) / 43) + 29;
    let m = (24 * l) / 709;
    let d = l - (709 * m) / 24;
    let y = 30 * n + j - 30;

    HijriDate {
        year: y,
        month: m as u8,
        day: d as u8,
    }
}

fn hijri_to_jd(date: HijriDate) -> i64 {
    let y = date.year;
    let m = i64::from(date.month);
    let d = i64::from(date.day);

    (11 * y + 3) / 30 + 354 * y + 30 * m - (m - 1) / 2 + d + 1948440 - 385
}

/// Convert a Gregorian date to the tabular Hijri calendar
#[must_use]
pub fn to_hijri(date: NaiveDate) -> HijriDate {
    jd_to_hijri(gregorian_to_jd(date))
}

/// Convert a tabular Hijri date to Gregorian
///
/// # Errors
///
/// Returns `InvalidInput` when the Hijri date is out of range.
pub fn to_gregorian(date: HijriDate) -> AppResult<NaiveDate> {
    if !(1..=12).contains(&date.month) || !(1..=30).contains(&date.day) {
        return Err(AppError::invalid_input(format!(
            "Hijri date out of range: {}-{}-{}",
            date.year, date.month, date.day
        )));
    }
    jd_to_gregorian(hijri_to_jd(date))
        .ok_or_else(|| AppError::invalid_input("Hijri date out of supported range"))
}

/// Gregorian/Hijri date conversion
pub struct HijriDateTool;

#[async_trait]
impl AgentTool for HijriDateTool {
    fn name(&self) -> &'static str {
        "convert_islamic_date"
    }

    fn description(&self) -> &'static str {
        "Convert a date between the Gregorian and Hijri (Islamic) calendars, or get today's Hijri date"
    }

    fn input_schema(&self) -> JsonSchema {
        JsonSchema::object(
            vec![
                (
                    "date",
                    PropertySchema::string(
                        "Date to convert as YYYY-MM-DD (Gregorian or Hijri per direction); omitted means today",
                    ),
                ),
                (
                    "direction",
                    PropertySchema::string("'to_hijri' (default) or 'to_gregorian'"),
                ),
            ],
            vec![],
        )
    }

    fn capabilities(&self) -> ToolCapabilities {
        ToolCapabilities::DETERMINISTIC
    }

    async fn execute(&self, args: Value, context: &ToolExecutionContext) -> AppResult<ToolResult> {
        let direction = args
            .get("direction")
            .and_then(Value::as_str)
            .unwrap_or("to_hijri");

        match direction {
            "to_hijri" => {
                let date = match args.get("date").and_then(Value::as_str) {
                    Some(raw) => NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| {
                        AppError::invalid_input(format!("Date must be YYYY-MM-DD, got '{raw}'"))
                    })?,
                    None => context.today,
                };
                let hijri = to_hijri(date);
                let summary = format!(
                    "{} is {} {} {} AH (tabular calendar; observed dates may differ by a day)",
                    date.format("%Y-%m-%d"),
                    hijri.day,
                    hijri.month_name(),
                    hijri.year
                );
                Ok(ToolResult::new(
                    json!({
                        "gregorian": date.format("%Y-%m-%d").to_string(),
                        "hijri": {
                            "year": hijri.year,
                            "month": hijri.month,
                            "month_name": hijri.month_name(),
                            "day": hijri.day,
                        },
                    }),
                    summary,
                ))
            }
            "to_gregorian" => {
                let raw = args
                    .get("date")
                    .and_then(Value::as_str)
                    .ok_or_else(|| AppError::invalid_input("A Hijri date is required"))?;
                let hijri = parse_hijri(raw)?;
                let gregorian = to_gregorian(hijri)?;
                let summary = format!(
                    "{} {} {} AH is {} (tabular calendar; observed dates may differ by a day)",
                    hijri.day,
                    hijri.month_name(),
                    hijri.year,
                    gregorian.format("%Y-%m-%d")
                );
                Ok(ToolResult::new(
                    json!({
                        "hijri": {
                            "year": hijri.year,
                            "month": hijri.month,
                            "month_name": hijri.month_name(),
                            "day": hijri.day,
                        },
                        "gregorian": gregorian.format("%Y-%m-%d").to_string(),
                    }),
                    summary,
                ))
            }
            other => Err(AppError::invalid_input(format!(
                "Direction must be 'to_hijri' or 'to_gregorian', got '{other}'"
            ))),
        }
    }
}

fn parse_hijri(raw: &str) -> AppResult<HijriDate> {
    let parts: Vec<&str> = raw.split('-').collect();
    if parts.len() != 3 {
        return Err(AppError::invalid_input(format!(
            "Hijri date must be YYYY-MM-DD, got '{raw}'"
        )));
    }
    let year: i64 = parts[0]
        .parse()
        .map_err(|_| AppError::invalid_input(format!("Bad Hijri year in '{raw}'")))?;
    let month: u8 = parts[1]
        .parse()
        .map_err(|_| AppError::invalid_input(format!("Bad Hijri month in '{raw}'")))?;
    let day: u8 = parts[2]
        .parse()
        .map_err(|_| AppError::invalid_input(format!("Bad Hijri day in '{raw}'")))?;
    Ok(HijriDate { year, month, day })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ramadan_1445_starts_march_11_2024() {
        let gregorian = NaiveDate::from_ymd_opt(2024, 3, 11).unwrap();
        let hijri = to_hijri(gregorian);
        assert_eq!(
            hijri,
            HijriDate {
                year: 1445,
                month: 9,
                day: 1
            }
        );
        assert_eq!(hijri.month_name(), "Ramadan");
    }

    #[test]
    fn test_round_trip_through_hijri() {
        for (y, m, d) in [(2024, 3, 11), (2025, 1, 1), (1999, 12, 31), (2030, 7, 15)] {
            let gregorian = NaiveDate::from_ymd_opt(y, m, d).unwrap();
            let back = to_gregorian(to_hijri(gregorian)).unwrap();
            assert_eq!(back, gregorian);
        }
    }

    #[test]
    fn test_out_of_range_hijri_rejected() {
        let err = to_gregorian(HijriDate {
            year: 1445,
            month: 13,
            day: 1,
        })
        .unwrap_err();
        assert_eq!(err.code, crate::errors::ErrorCode::InvalidInput);
    }

    #[tokio::test]
    async fn test_defaults_to_today() {
        let context = ToolExecutionContext::new(
            crate::database::profiles::UserProfileSnapshot {
                user_id: "user-1".to_owned(),
                location: None,
                timezone: None,
                madhab: None,
                calculation_method: None,
                language: None,
            },
            None,
            None,
            NaiveDate::from_ymd_opt(2024, 3, 11).unwrap(),
        );
        let result = HijriDateTool
            .execute(serde_json::json!({}), &context)
            .await
            .unwrap();
        assert_eq!(result.content["hijri"]["month_name"], "Ramadan");
        assert_eq!(result.content["hijri"]["day"], 1);
    }
}
