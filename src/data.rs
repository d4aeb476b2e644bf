//! Customer table loading and calendar feature derivation using Polars

use crate::dates::DateParser;
use anyhow::{anyhow, Context};
use chrono::{Datelike, NaiveDate};
use polars::prelude::*;
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// File read when no input is given on the command line
pub const DEFAULT_INPUT: &str = "customers-1000.csv";

pub const SUBSCRIPTION_DATE: &str = "Subscription Date";
pub const COUNTRY: &str = "Country";
pub const SUBSCRIPTION_YEAR: &str = "Subscription Year";
pub const SUBSCRIPTION_MONTH: &str = "Subscription Month";
pub const SUBSCRIPTION_YEAR_MONTH: &str = "Subscription Year-Month";

const COUNT: &str = "count";

/// Calendar month key, ordered chronologically
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        (1..=12).contains(&month).then_some(Self { year, month })
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for YearMonth {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (year, month) = s
            .rsplit_once('-')
            .ok_or_else(|| anyhow!("invalid year-month key: {:?}", s))?;
        let year: i32 = year.parse().context("invalid year in year-month key")?;
        let month: u32 = month.parse().context("invalid month in year-month key")?;
        YearMonth::new(year, month).ok_or_else(|| anyhow!("month out of range in {:?}", s))
    }
}

/// The loaded customer records plus derived subscription calendar columns
#[derive(Debug, Clone)]
pub struct CustomerTable {
    df: DataFrame,
}

impl CustomerTable {
    /// Parse the subscription date column and append year, month and
    /// year-month columns. Fails on the first date that cannot be parsed.
    pub fn from_dataframe(mut df: DataFrame) -> crate::Result<Self> {
        if df.height() == 0 {
            anyhow::bail!("No customer records found");
        }
        df.column(COUNTRY)
            .with_context(|| format!("missing required column {:?}", COUNTRY))?;

        let dates = df
            .column(SUBSCRIPTION_DATE)
            .with_context(|| format!("missing required column {:?}", SUBSCRIPTION_DATE))?
            .cast(&DataType::String)?;

        let n_rows = df.height();
        let mut years: Vec<i32> = Vec::with_capacity(n_rows);
        let mut months: Vec<u32> = Vec::with_capacity(n_rows);
        let mut periods: Vec<String> = Vec::with_capacity(n_rows);

        let mut parser = DateParser::new();
        for (row, value) in dates.str()?.into_iter().enumerate() {
            // Row numbers are 1-based data rows, header excluded
            let value = value
                .ok_or_else(|| anyhow!("row {}: missing {}", row + 1, SUBSCRIPTION_DATE))?;
            let date = parser
                .parse(value)
                .with_context(|| format!("row {}: invalid {}", row + 1, SUBSCRIPTION_DATE))?;

            years.push(date.year());
            months.push(date.month());
            periods.push(YearMonth::from_date(date).to_string());
        }

        df.with_column(Series::new(SUBSCRIPTION_YEAR, years))?;
        df.with_column(Series::new(SUBSCRIPTION_MONTH, months))?;
        df.with_column(Series::new(SUBSCRIPTION_YEAR_MONTH, periods))?;

        Ok(Self { df })
    }

    pub fn dataframe(&self) -> &DataFrame {
        &self.df
    }

    /// Number of customer records
    pub fn height(&self) -> usize {
        self.df.height()
    }

    pub fn years(&self) -> crate::Result<Vec<i32>> {
        Ok(self.df.column(SUBSCRIPTION_YEAR)?.i32()?.into_no_null_iter().collect())
    }

    pub fn months(&self) -> crate::Result<Vec<u32>> {
        Ok(self.df.column(SUBSCRIPTION_MONTH)?.u32()?.into_no_null_iter().collect())
    }

    /// Sorted set of subscription years present in the table
    pub fn distinct_years(&self) -> crate::Result<Vec<i32>> {
        let years: BTreeSet<i32> = self.years()?.into_iter().collect();
        Ok(years.into_iter().collect())
    }

    /// Row count per subscription year, in ascending year order
    pub fn counts_by_year(&self) -> crate::Result<Vec<(i32, u64)>> {
        let counts = self.count_by(SUBSCRIPTION_YEAR)?;
        let mut by_year: Vec<(i32, u64)> = counts
            .column(SUBSCRIPTION_YEAR)?
            .i32()?
            .into_no_null_iter()
            .zip(count_column(&counts)?)
            .collect();
        by_year.sort_unstable_by_key(|&(year, _)| year);
        Ok(by_year)
    }

    /// Row count per calendar month, in chronological order
    pub fn counts_by_year_month(&self) -> crate::Result<Vec<(YearMonth, u64)>> {
        let counts = self.count_by(SUBSCRIPTION_YEAR_MONTH)?;
        let keys = counts
            .column(SUBSCRIPTION_YEAR_MONTH)?
            .str()?
            .into_no_null_iter()
            .map(YearMonth::from_str)
            .collect::<crate::Result<Vec<_>>>()?;
        let mut by_month: Vec<(YearMonth, u64)> =
            keys.into_iter().zip(count_column(&counts)?).collect();
        by_month.sort_unstable_by_key(|&(period, _)| period);
        Ok(by_month)
    }

    /// The `n` countries with the most customers, by descending count.
    /// Equal counts keep the order in which the countries first appear.
    pub fn top_countries(&self, n: usize) -> crate::Result<Vec<(String, u64)>> {
        let counts = self.count_by(COUNTRY)?;
        let names = counts.column(COUNTRY)?.cast(&DataType::String)?;
        let mut ranked: Vec<(String, u64)> = names
            .str()?
            .into_no_null_iter()
            .map(str::to_string)
            .zip(count_column(&counts)?)
            .collect();
        // stable: ties stay in first-seen order
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked.truncate(n);
        Ok(ranked)
    }

    /// Subscription years of every customer in each of the `n` largest
    /// countries, in the ranking order of [`CustomerTable::top_countries`]
    pub fn year_distribution_by_country(&self, n: usize) -> crate::Result<Vec<(String, Vec<i32>)>> {
        let top = self.top_countries(n)?;
        let countries = self.df.column(COUNTRY)?.cast(&DataType::String)?;
        let years = self.df.column(SUBSCRIPTION_YEAR)?.i32()?;

        let mut buckets: HashMap<&str, Vec<i32>> =
            top.iter().map(|(name, _)| (name.as_str(), Vec::new())).collect();
        for (country, year) in countries.str()?.into_iter().zip(years.into_iter()) {
            if let (Some(country), Some(year)) = (country, year) {
                if let Some(bucket) = buckets.get_mut(country) {
                    bucket.push(year);
                }
            }
        }

        Ok(top
            .iter()
            .map(|(name, _)| (name.clone(), buckets.remove(name.as_str()).unwrap_or_default()))
            .collect())
    }

    /// Group by `key` with a row count per group, groups in first-seen order
    fn count_by(&self, key: &str) -> crate::Result<DataFrame> {
        let counts = self
            .df
            .clone()
            .lazy()
            .filter(col(key).is_not_null())
            .group_by_stable([col(key)])
            .agg([len().alias(COUNT)])
            .collect()?;
        Ok(counts)
    }
}

fn count_column(counts: &DataFrame) -> crate::Result<Vec<u64>> {
    Ok(counts
        .column(COUNT)?
        .cast(&DataType::UInt64)?
        .u64()?
        .into_no_null_iter()
        .collect())
}

/// Load the customer CSV and derive the subscription calendar columns
///
/// # Arguments
/// * `path` - Path to the CSV file; must contain `Subscription Date` and `Country`
///
/// # Returns
/// * `CustomerTable` on success; any read or date parse failure is an error
pub fn load_customers<P: AsRef<Path>>(path: P) -> crate::Result<CustomerTable> {
    let path = path.as_ref();
    tracing::debug!("reading customer records from {}", path.display());

    let df = CsvReadOptions::default()
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .with_context(|| format!("failed to open {}", path.display()))?
        .finish()
        .with_context(|| format!("failed to parse {}", path.display()))?;

    tracing::debug!("read {} rows, {} columns", df.height(), df.width());
    CustomerTable::from_dataframe(df)
}

/// Console line for a failed load: the whole context chain down to the
/// underlying I/O or parse error
pub fn load_failure_message(err: &anyhow::Error) -> String {
    format!("Error loading data: {:#}", err)
}

/// Load the customer CSV, reporting any failure on the console.
///
/// Returns `None` when the data could not be loaded; callers skip chart
/// generation in that case.
pub fn try_load_customers<P: AsRef<Path>>(path: P) -> Option<CustomerTable> {
    let path = path.as_ref();
    match load_customers(path) {
        Ok(table) => {
            println!(
                "✓ Data loaded: {} customers from {}",
                table.height(),
                path.display()
            );
            Some(table)
        }
        Err(err) => {
            eprintln!("{}", load_failure_message(&err));
            None
        }
    }
}
