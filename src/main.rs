//! Customer Insights entrypoint: settings, load, then the four charts.

use anyhow::Result;
use clap::Parser;
use customer_insights::{configure_plot_settings, generate_report, logging, try_load_customers, Args};
use std::time::Instant;

fn main() -> Result<()> {
    let args = Args::parse();
    logging::init_logging(args.verbose)?;
    args.validate()?;

    println!("=== Customer Subscription Report ===\n");
    let start_time = Instant::now();

    configure_plot_settings();

    // A load failure has already been reported; finish without charts
    let Some(table) = try_load_customers(&args.input) else {
        return Ok(());
    };
    tracing::debug!("columns: {:?}", table.dataframe().get_column_names());

    generate_report(&table, &args.report_options())?;

    println!("\n=== Report Complete ===");
    println!(
        "Total processing time: {:.2}s",
        start_time.elapsed().as_secs_f64()
    );

    Ok(())
}
