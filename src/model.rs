// Core structs: Bar, Series, Lookback, Reading and the error taxonomy
use chrono::NaiveDate;
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A single daily close.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bar {
    pub date: NaiveDate,
    pub close: f64,
}

impl Bar {
    pub fn new(date: NaiveDate, close: f64) -> Self {
        Self { date, close }
    }
}

/// Daily bars sorted ascending by date, without duplicate dates.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Series {
    bars: Vec<Bar>,
}

impl Series {
    /// Builds a series from bars in any order. Non-finite closes are dropped,
    /// and for a repeated date the bar seen last wins.
    pub fn new(bars: Vec<Bar>) -> Self {
        let mut bars: Vec<Bar> = bars.into_iter().filter(|b| b.close.is_finite()).collect();
        // stable sort keeps input order among equal dates
        bars.sort_by_key(|b| b.date);

        let mut deduped: Vec<Bar> = Vec::with_capacity(bars.len());
        for bar in bars {
            match deduped.last_mut() {
                Some(last) if last.date == bar.date => *last = bar,
                _ => deduped.push(bar),
            }
        }

        Self { bars: deduped }
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.bars.iter().map(|b| b.date).collect()
    }

    pub fn first(&self) -> Option<&Bar> {
        self.bars.first()
    }

    pub fn last(&self) -> Option<&Bar> {
        self.bars.last()
    }
}

/// Historical range requested from a data source, in the `5d` / `6mo` / `1y` notation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub enum Lookback {
    Days(u32),
    Months(u32),
    Years(u32),
}

impl Default for Lookback {
    fn default() -> Self {
        Lookback::Months(6)
    }
}

impl fmt::Display for Lookback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Lookback::Days(n) => write!(f, "{}d", n),
            Lookback::Months(n) => write!(f, "{}mo", n),
            Lookback::Years(n) => write!(f, "{}y", n),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid lookback '{0}', expected e.g. 5d, 6mo or 1y")]
pub struct InvalidLookback(pub String);

impl FromStr for Lookback {
    type Err = InvalidLookback;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim().to_lowercase();
        let split = raw
            .find(|c: char| !c.is_ascii_digit())
            .ok_or_else(|| InvalidLookback(s.to_string()))?;
        let (count, unit) = raw.split_at(split);
        let count: u32 = count.parse().map_err(|_| InvalidLookback(s.to_string()))?;
        if count == 0 {
            return Err(InvalidLookback(s.to_string()));
        }

        match unit {
            "d" => Ok(Lookback::Days(count)),
            "mo" => Ok(Lookback::Months(count)),
            "y" => Ok(Lookback::Years(count)),
            _ => Err(InvalidLookback(s.to_string())),
        }
    }
}

impl TryFrom<String> for Lookback {
    type Error = InvalidLookback;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Outcome of one analysis stage. Consumers must handle the non-value cases
/// explicitly instead of formatting a missing number as zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Reading<T> {
    Value(T),
    /// Not enough history (or no overlap) to compute the value.
    InsufficientData,
    /// Inputs were present but the value is undefined (zero variance, zero base, ...).
    Indeterminate,
}

impl<T> Reading<T> {
    pub fn value(&self) -> Option<&T> {
        match self {
            Reading::Value(v) => Some(v),
            _ => None,
        }
    }

    #[cfg(test)]
    pub fn is_value(&self) -> bool {
        matches!(self, Reading::Value(_))
    }

    pub fn as_ref(&self) -> Reading<&T> {
        match self {
            Reading::Value(v) => Reading::Value(v),
            Reading::InsufficientData => Reading::InsufficientData,
            Reading::Indeterminate => Reading::Indeterminate,
        }
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Reading<U> {
        match self {
            Reading::Value(v) => Reading::Value(f(v)),
            Reading::InsufficientData => Reading::InsufficientData,
            Reading::Indeterminate => Reading::Indeterminate,
        }
    }

    pub fn and_then<U, F: FnOnce(T) -> Reading<U>>(self, f: F) -> Reading<U> {
        match self {
            Reading::Value(v) => f(v),
            Reading::InsufficientData => Reading::InsufficientData,
            Reading::Indeterminate => Reading::Indeterminate,
        }
    }
}

impl<T> From<Option<T>> for Reading<T> {
    /// A missing entry in an indicator line means its window has not filled.
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => Reading::Value(v),
            None => Reading::InsufficientData,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceError {
    #[error("symbol not found: {0}")]
    NotFound(String),
    #[error("rate limited by data provider")]
    RateLimited,
    #[error("network error: {0}")]
    Network(String),
    #[error("no price data returned")]
    Empty,
    #[error("malformed response: {0}")]
    Malformed(String),
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("API error: {0}")]
    ApiError(String),
    #[error("endpoint unreachable")]
    Unreachable,
    #[error("attachment unreadable: {0}")]
    Attachment(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum ChartError {
    #[error("nothing to plot")]
    NoData,
    #[error("drawing failed: {0}")]
    Draw(String),
}
