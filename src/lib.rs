//! Customer Insights: subscription reporting over a customer records CSV
//!
//! Loads the customer table with Polars, derives subscription year, month
//! and year-month columns, and renders four PNG charts with Plotters.

pub mod cli;
pub mod data;
pub mod dates;
pub mod logging;
pub mod settings;
pub mod viz;

// Re-export public items for easier access
pub use cli::Args;
pub use data::{load_customers, load_failure_message, try_load_customers, CustomerTable, YearMonth};
pub use settings::{configure_plot_settings, plot_settings, PlotSettings};
pub use viz::{generate_report, ReportOptions};

/// Common result type used throughout the application
pub type Result<T> = anyhow::Result<T>;
