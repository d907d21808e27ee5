use std::{path::Path, str::FromStr};

use miette::Diagnostic;
use thiserror::Error;
use time::{
    format_description::well_known::Iso8601, macros::format_description, Date, OffsetDateTime,
    PrimitiveDateTime,
};
use tracing::{debug, warn};

mod loader;

pub use loader::{load_rows, parse_number_or_keep_original, parse_rows, Field, LoadError, RawRow};

/// Suffix appended to every rendered temperature.
pub const DEGREE_CELSIUS: &str = "\u{00B0}C";

pub fn fahrenheit_to_celsius(fahrenheit: f64) -> f64 {
    (fahrenheit - 32.0) * 5.0 / 9.0
}

pub fn celsius_to_fahrenheit(celsius: f64) -> f64 {
    celsius * 9.0 / 5.0 + 32.0
}

/// Rounds to the nearest tenth, ties away from zero.
///
/// The summaries never call this: they render with `{:.1}` which rounds the
/// exact binary value and breaks ties to even.
pub fn round_to_1_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

pub fn format_temperature(value: f64) -> String {
    format!("{value:.1}{DEGREE_CELSIUS}")
}

#[derive(Debug, Error, Diagnostic)]
#[error("cannot compute the mean of an empty sequence")]
#[diagnostic(code(weather::empty_input))]
pub struct EmptyInputError;

pub fn mean(values: &[f64]) -> Result<f64, EmptyInputError> {
    if values.is_empty() {
        return Err(EmptyInputError);
    }
    Ok(values.iter().sum::<f64>() / values.len() as f64)
}

/// An extreme value of a sequence and the index of its *last* occurrence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extremum {
    pub value: f64,
    pub index: usize,
}

pub fn find_min(values: &[f64]) -> Option<Extremum> {
    find_extremum(values, |candidate, current| candidate < current)
}

pub fn find_max(values: &[f64]) -> Option<Extremum> {
    find_extremum(values, |candidate, current| candidate > current)
}

fn find_extremum(values: &[f64], better: fn(f64, f64) -> bool) -> Option<Extremum> {
    let (&first, rest) = values.split_first()?;
    let start = Extremum {
        value: first,
        index: 0,
    };

    Some(
        rest.iter()
            .enumerate()
            .fold(start, |current, (offset, &value)| {
                let index = offset + 1;
                if better(value, current.value) {
                    Extremum { value, index }
                } else if value == current.value {
                    // Ties move the index forward, never the value.
                    Extremum { index, ..current }
                } else {
                    current
                }
            }),
    )
}

#[derive(Debug, Error, Diagnostic)]
#[error("invalid ISO-8601 date: `{input}`")]
#[diagnostic(
    code(weather::date),
    help("dates must look like `2021-07-06` or `2021-07-06T07:00:00+08:00`")
)]
pub struct DateParseError {
    pub input: String,
    #[source]
    pub source: time::error::Parse,
}

/// Accepts a calendar date (`2021-07-06` or `20210706`) or a full ISO-8601
/// date-time, with `T` or a space between date and time.
///
/// For date-times the calendar date is taken as written, any offset is
/// ignored rather than applied.
pub fn parse_iso_date(input: &str) -> Result<Date, DateParseError> {
    let input = input.trim();
    let datetime = match input.as_bytes().get(10) {
        Some(b' ') => format!("{}T{}", &input[..10], &input[11..]),
        _ => input.to_string(),
    };

    Date::parse(input, format_description!("[year]-[month]-[day]"))
        .or_else(|_| Date::parse(input, format_description!("[year][month][day]")))
        .or_else(|_| OffsetDateTime::parse(&datetime, &Iso8601::DEFAULT).map(|dt| dt.date()))
        .or_else(|_| PrimitiveDateTime::parse(&datetime, &Iso8601::DEFAULT).map(|dt| dt.date()))
        .map_err(|source| DateParseError {
            input: input.to_string(),
            source,
        })
}

/// Renders a date as e.g. `Tuesday 06 July 2021`.
pub fn format_date(date: Date) -> Result<String, time::error::Format> {
    date.format(format_description!(
        "[weekday] [day] [month repr:long] [year]"
    ))
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeatherRecord {
    pub date: Date,
    pub low_temp_f: f64,
    pub high_temp_f: f64,
}

impl WeatherRecord {
    pub fn new(iso_date: &str, low_temp_f: f64, high_temp_f: f64) -> Result<Self, DateParseError> {
        Ok(Self {
            date: parse_iso_date(iso_date)?,
            low_temp_f,
            high_temp_f,
        })
    }

    pub fn low_temp_c(&self) -> f64 {
        fahrenheit_to_celsius(self.low_temp_f)
    }

    pub fn high_temp_c(&self) -> f64 {
        fahrenheit_to_celsius(self.high_temp_f)
    }
}

#[derive(Debug, Error, Diagnostic)]
pub enum RowError {
    #[error("line {line}: expected 3 fields, found {found}")]
    #[diagnostic(code(weather::row::shape))]
    FieldCount { line: usize, found: usize },
    #[error("line {line}: {column} temperature `{value}` is not a number")]
    #[diagnostic(code(weather::row::number))]
    NotANumber {
        line: usize,
        column: &'static str,
        value: String,
    },
    #[error(transparent)]
    #[diagnostic(transparent)]
    Date(#[from] DateParseError),
}

impl TryFrom<&RawRow> for WeatherRecord {
    type Error = RowError;

    fn try_from(row: &RawRow) -> Result<Self, Self::Error> {
        let [date, low, high] = row.fields.as_slice() else {
            return Err(RowError::FieldCount {
                line: row.line,
                found: row.fields.len(),
            });
        };

        let date = parse_iso_date(&date.to_string())?;
        let number = |field: &Field, column| {
            field.as_f64().ok_or_else(|| RowError::NotANumber {
                line: row.line,
                column,
                value: field.to_string(),
            })
        };
        let low_temp_f = number(low, "low")?;
        let high_temp_f = number(high, "high")?;

        Ok(Self {
            date,
            low_temp_f,
            high_temp_f,
        })
    }
}

#[derive(Debug, Error, Diagnostic)]
pub enum SummaryError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Load(#[from] LoadError),
    #[error(transparent)]
    #[diagnostic(transparent)]
    Date(#[from] DateParseError),
    #[error(transparent)]
    #[diagnostic(transparent)]
    EmptyInput(#[from] EmptyInputError),
    #[error("could not render a date: {0}")]
    #[diagnostic(code(weather::format))]
    Format(#[from] time::error::Format),
}

/// Records in input order. May be empty.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeatherDataset {
    pub records: Vec<WeatherRecord>,
}

impl WeatherDataset {
    pub fn new(records: Vec<WeatherRecord>) -> Self {
        Self { records }
    }

    /// Rows with the wrong number of fields or a non-numeric temperature
    /// are skipped. A bad date aborts the whole dataset, even on a row that
    /// also has a non-numeric temperature.
    pub fn from_rows(rows: &[RawRow]) -> Result<Self, DateParseError> {
        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            match WeatherRecord::try_from(row) {
                Ok(record) => records.push(record),
                Err(RowError::Date(e)) => return Err(e),
                Err(e) => warn!("skipping row: {e}"),
            }
        }
        debug!(
            rows = rows.len(),
            records = records.len(),
            "built weather dataset"
        );
        Ok(Self { records })
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, SummaryError> {
        let rows = load_rows(path)?;
        Ok(Self::from_rows(&rows)?)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn overview(&self) -> Result<String, SummaryError> {
        generate_overview_summary(&self.records)
    }

    pub fn daily(&self) -> Result<String, SummaryError> {
        generate_daily_summary(&self.records)
    }
}

impl FromStr for WeatherDataset {
    type Err = SummaryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let rows = parse_rows(s)?;
        Ok(Self::from_rows(&rows)?)
    }
}

impl FromIterator<WeatherRecord> for WeatherDataset {
    fn from_iter<I: IntoIterator<Item = WeatherRecord>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

pub fn generate_overview_summary(records: &[WeatherRecord]) -> Result<String, SummaryError> {
    let lows: Vec<f64> = records.iter().map(WeatherRecord::low_temp_c).collect();
    let highs: Vec<f64> = records.iter().map(WeatherRecord::high_temp_c).collect();

    let (Some(lowest), Some(highest)) = (find_min(&lows), find_max(&highs)) else {
        return Ok(String::from("No data available."));
    };

    let summary = format!(
        "{} Day Overview\n  \
         The lowest temperature will be {}, and will occur on {}.\n  \
         The highest temperature will be {}, and will occur on {}.\n  \
         The average low this week is {}.\n  \
         The average high this week is {}.\n",
        records.len(),
        format_temperature(lowest.value),
        format_date(records[lowest.index].date)?,
        format_temperature(highest.value),
        format_date(records[highest.index].date)?,
        format_temperature(mean(&lows)?),
        format_temperature(mean(&highs)?),
    );
    debug!(days = records.len(), "overview summary:\n{summary}");

    Ok(summary)
}

pub fn generate_daily_summary(records: &[WeatherRecord]) -> Result<String, SummaryError> {
    let mut summary = String::new();
    for (i, record) in records.iter().enumerate() {
        if i > 0 {
            summary.push_str("\n\n");
        }
        summary.push_str(&format!(
            "---- {} ----\n  Minimum Temperature: {}\n  Maximum Temperature: {}",
            format_date(record.date)?,
            format_temperature(record.low_temp_c()),
            format_temperature(record.high_temp_c()),
        ));
    }
    summary.push_str("\n\n");

    Ok(summary)
}

/// Both renderings of one dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summaries {
    pub overview: String,
    pub daily: String,
}

pub fn summarize_file(path: impl AsRef<Path>) -> Result<Summaries, SummaryError> {
    let dataset = WeatherDataset::load(path)?;
    Ok(Summaries {
        overview: dataset.overview()?,
        daily: dataset.daily()?,
    })
}
