//! Command-line interface definitions and argument parsing

use crate::data::DEFAULT_INPUT;
use crate::viz::{ReportOptions, DEFAULT_BOX_COUNTRIES, DEFAULT_TOP_COUNTRIES};
use clap::Parser;
use std::path::PathBuf;

/// Customer subscription report: renders distribution charts from a customer CSV
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the input CSV file
    #[arg(short, long, default_value = DEFAULT_INPUT)]
    pub input: PathBuf,

    /// Directory the PNG charts are written to
    #[arg(short, long, default_value = ".")]
    pub output_dir: PathBuf,

    /// Number of countries in the top-countries bar chart
    #[arg(long, default_value_t = DEFAULT_TOP_COUNTRIES)]
    pub top_countries: usize,

    /// Number of countries in the year-by-country box plot
    #[arg(long, default_value_t = DEFAULT_BOX_COUNTRIES)]
    pub box_countries: usize,

    /// Enable verbose (debug) logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    /// Validate argument values that clap cannot check on its own
    pub fn validate(&self) -> crate::Result<()> {
        if self.top_countries == 0 || self.box_countries == 0 {
            anyhow::bail!("Country counts must be at least 1");
        }
        Ok(())
    }

    pub fn report_options(&self) -> ReportOptions {
        ReportOptions {
            output_dir: self.output_dir.clone(),
            top_countries: self.top_countries,
            box_countries: self.box_countries,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_fixed_report() {
        let args = Args::parse_from(["customer-insights"]);
        assert_eq!(args.input, PathBuf::from("customers-1000.csv"));
        assert_eq!(args.output_dir, PathBuf::from("."));
        assert_eq!(args.top_countries, 15);
        assert_eq!(args.box_countries, 10);
        assert!(!args.verbose);
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_report_options_from_flags() {
        let args = Args::parse_from([
            "customer-insights",
            "--input",
            "data/customers.csv",
            "-o",
            "charts",
            "--top-countries",
            "5",
        ]);
        let options = args.report_options();
        assert_eq!(options.output_dir, PathBuf::from("charts"));
        assert_eq!(options.top_countries, 5);
        assert_eq!(options.box_countries, 10);
    }

    #[test]
    fn test_zero_countries_rejected() {
        let args = Args::parse_from(["customer-insights", "--box-countries", "0"]);
        assert!(args.validate().is_err());
    }
}
