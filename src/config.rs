// ⚙️ Analysis Configuration
// Year window, ranking size and input location are explicit values,
// loaded from TOML and overridable from the command line.

use crate::error::{AnalysisError, Result};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

// ============================================================================
// YEAR RANGE
// ============================================================================

/// Widest window accepted, in years
pub const MAX_YEAR_SPAN: i64 = 10_000;

/// Inclusive range of calendar years covered by the revenue buckets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearRange {
    pub start: i32,
    pub end: i32,
}

impl YearRange {
    pub fn new(start: i32, end: i32) -> Result<Self> {
        if start > end {
            return Err(AnalysisError::Config(format!(
                "start_year {} is after end_year {}",
                start, end
            )));
        }

        // Bounds of a NaiveDate keep end + 1 and end - 2 in i32
        let (min, max) = (NaiveDate::MIN.year(), NaiveDate::MAX.year());
        if start < min || end >= max {
            return Err(AnalysisError::Config(format!(
                "years must lie within {}..{}, got {}..={}",
                min, max, start, end
            )));
        }

        let span = i64::from(end) - i64::from(start) + 1;
        if span > MAX_YEAR_SPAN {
            return Err(AnalysisError::Config(format!(
                "year range {}..={} spans {} years, at most {} allowed",
                start, end, span, MAX_YEAR_SPAN
            )));
        }

        Ok(YearRange { start, end })
    }

    pub fn contains(&self, year: i32) -> bool {
        year >= self.start && year <= self.end
    }

    /// Number of years in the range (never zero)
    pub fn len(&self) -> usize {
        let span = i64::from(self.end) - i64::from(self.start) + 1;
        usize::try_from(span).unwrap_or(0)
    }

    /// Bucket index of `year`, or OutOfRange
    pub fn index_of(&self, year: i32) -> Result<usize> {
        if !self.contains(year) {
            return Err(AnalysisError::OutOfRange {
                year,
                start: self.start,
                end: self.end,
            });
        }
        Ok((i64::from(year) - i64::from(self.start)) as usize)
    }

    pub fn years(&self) -> impl Iterator<Item = i32> {
        self.start..=self.end
    }
}

// ============================================================================
// ANALYSIS CONFIG
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Transactions CSV file
    pub input: PathBuf,

    /// First year of the revenue window
    pub start_year: i32,

    /// Last year of the revenue window; the forecast targets end_year + 1
    pub end_year: i32,

    /// How many growth/loss years to rank
    pub top_k: usize,

    /// Abort ingestion on the first malformed record
    pub strict_parsing: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        AnalysisConfig {
            input: PathBuf::from("./transactions.csv"),
            start_year: 1966,
            end_year: 2014,
            top_k: 10,
            strict_parsing: true,
        }
    }
}

impl AnalysisConfig {
    /// Load configuration from a TOML file; missing keys take defaults
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: AnalysisConfig =
            toml::from_str(content).map_err(|e| AnalysisError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let range = self.year_range()?;

        // Same error the ranker raises for an unusable k
        if self.top_k == 0 {
            return Err(AnalysisError::InvalidArgument(
                "top_k must be at least 1".to_string(),
            ));
        }

        if self.top_k > range.len() {
            return Err(AnalysisError::InvalidArgument(format!(
                "top_k {} exceeds the {} years in range",
                self.top_k,
                range.len()
            )));
        }

        Ok(())
    }

    pub fn year_range(&self) -> Result<YearRange> {
        YearRange::new(self.start_year, self.end_year)
    }

    /// Year the forecast is made for
    pub fn forecast_year(&self) -> Result<i32> {
        self.end_year.checked_add(1).ok_or_else(|| {
            AnalysisError::Config(format!("end_year {} has no following year", self.end_year))
        })
    }
}

// ============================================================================
// TESTS
// ============================================================================
