//! Chart generation using Plotters for the customer subscription report

use crate::data::CustomerTable;
use crate::settings::{plot_settings, PlotSettings};
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use std::ops::Range;
use std::path::{Path, PathBuf};

pub const DISTRIBUTION_BY_YEAR_FILE: &str = "customer_distribution_by_year.png";
pub const MONTHLY_SUBSCRIPTIONS_FILE: &str = "monthly_subscriptions.png";
pub const TOP_COUNTRIES_FILE: &str = "top_countries.png";
pub const YEAR_BY_COUNTRY_FILE: &str = "year_distribution_by_country.png";

pub const DEFAULT_TOP_COUNTRIES: usize = 15;
pub const DEFAULT_BOX_COUNTRIES: usize = 10;

/// Upper bound on month labels along the trend axis
const MAX_MONTH_LABELS: usize = 12;

/// Categorical palette for bars and boxes
const PALETTE: [RGBColor; 10] = [
    RGBColor(76, 114, 176),
    RGBColor(221, 132, 82),
    RGBColor(85, 168, 104),
    RGBColor(196, 78, 82),
    RGBColor(129, 114, 179),
    RGBColor(147, 120, 96),
    RGBColor(218, 139, 195),
    RGBColor(140, 140, 140),
    RGBColor(204, 185, 116),
    RGBColor(100, 181, 205),
];

/// Where and how many countries the report draws
#[derive(Debug, Clone)]
pub struct ReportOptions {
    pub output_dir: PathBuf,
    pub top_countries: usize,
    pub box_countries: usize,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            top_countries: DEFAULT_TOP_COUNTRIES,
            box_countries: DEFAULT_BOX_COUNTRIES,
        }
    }
}

fn px(settings: &PlotSettings, points: f64) -> i32 {
    settings.px(points) as i32
}

/// Pixels needed for a column of tick labels at the y tick font size
fn label_area_for(settings: &PlotSettings, labels: impl Iterator<Item = usize>) -> i32 {
    let longest = labels.max().unwrap_or(4) as f64;
    (longest * settings.px(settings.ytick_label_size) as f64 * 0.6) as i32 + px(settings, 40.0)
}

/// Label of a segment in a categorical axis whose segment `i` is `labels[i]`
fn category_label(value: &SegmentValue<usize>, labels: &[String]) -> String {
    match value {
        SegmentValue::CenterOf(idx) if *idx < labels.len() => labels[*idx].clone(),
        _ => String::new(),
    }
}

/// Row holding the `rank`-th entry when rank 0 is drawn at the top
fn row_of(rank: usize, n_rows: usize) -> usize {
    n_rows - 1 - rank
}

/// Label of a row in a categorical axis drawn with rank 0 at the top
fn ranked_row_label(value: &SegmentValue<usize>, ranked: &[String]) -> String {
    match value {
        SegmentValue::CenterOf(row) if *row < ranked.len() => {
            ranked[row_of(*row, ranked.len())].clone()
        }
        _ => String::new(),
    }
}

/// Month label for an index position on the trend axis, blank between months
fn month_tick_label(x: f64, labels: &[String]) -> String {
    let idx = x.round();
    if (x - idx).abs() < 1e-6 && idx >= 0.0 && (idx as usize) < labels.len() {
        labels[idx as usize].clone()
    } else {
        String::new()
    }
}

/// Span of a year axis over sorted `years`, and the label budget that makes
/// the axis tick every whole year in that span
fn year_axis(years: &[i32]) -> Option<(Range<f32>, usize)> {
    let (first, last) = (*years.first()?, *years.last()?);
    let span = (last - first + 1) as usize;
    Some((first as f32 - 0.5..last as f32 + 0.5, 2 * span + 1))
}

/// Tick label on a year axis: only years present in sorted `years` are named
fn year_tick_label(value: f32, years: &[i32]) -> String {
    let rounded = value.round();
    if (value - rounded).abs() < 1e-3 && years.binary_search(&(rounded as i32)).is_ok() {
        format!("{}", rounded as i32)
    } else {
        String::new()
    }
}

/// Bar chart of customers per subscription year, each bar annotated
/// with its count
pub fn plot_distribution_by_year(table: &CustomerTable, output_dir: &Path) -> crate::Result<()> {
    let settings = plot_settings();
    let counts = table.counts_by_year()?;
    if counts.is_empty() {
        anyhow::bail!("No subscription years to plot");
    }
    let n_bars = counts.len();
    let max_count = counts.iter().map(|&(_, c)| c).max().unwrap_or(1) as f64;
    let labels: Vec<String> = counts.iter().map(|(year, _)| year.to_string()).collect();

    let output_path = output_dir.join(DISTRIBUTION_BY_YEAR_FILE);
    let root = BitMapBackend::new(&output_path, settings.figure_pixels()).into_drawing_area();
    root.fill(&settings.background)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Customer Distribution by Subscription Year", settings.title_font())
        .margin(px(settings, 12.0))
        .x_label_area_size(px(settings, 44.0))
        .y_label_area_size(px(settings, 60.0))
        .build_cartesian_2d((0..n_bars - 1).into_segmented(), 0f64..(max_count * 1.12))?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .bold_line_style(settings.grid_color.stroke_width(2))
        .light_line_style(&TRANSPARENT)
        .x_desc("Subscription Year")
        .y_desc("Number of Customers")
        .axis_desc_style(settings.label_font())
        .x_label_style(settings.xtick_font())
        .y_label_style(settings.ytick_font())
        .x_labels(n_bars)
        .x_label_formatter(&|x: &SegmentValue<usize>| category_label(x, &labels))
        .y_label_formatter(&|count: &f64| format!("{:.0}", count))
        .draw()?;

    chart.draw_series(
        Histogram::vertical(&chart)
            .style_func(|x: &SegmentValue<usize>, _| match x {
                SegmentValue::Exact(idx) => PALETTE[idx % PALETTE.len()].filled(),
                _ => PALETTE[0].filled(),
            })
            .margin(settings.px(8.0))
            .data(counts.iter().enumerate().map(|(idx, &(_, count))| (idx, count as f64))),
    )?;

    let value_style = TextStyle::from(settings.annotation_font().into_font())
        .color(&settings.text_color)
        .pos(Pos::new(HPos::Center, VPos::Bottom));
    chart.draw_series(counts.iter().enumerate().map(|(idx, &(_, count))| {
        Text::new(
            count.to_string(),
            (SegmentValue::CenterOf(idx), count as f64 + max_count * 0.01),
            value_style.clone(),
        )
    }))?;

    root.present()?;
    println!("Customer distribution by year saved to: {}", output_path.display());

    Ok(())
}

/// Line chart with markers of new subscriptions per calendar month
pub fn plot_monthly_trend(table: &CustomerTable, output_dir: &Path) -> crate::Result<()> {
    let settings = plot_settings();
    let counts = table.counts_by_year_month()?;
    if counts.is_empty() {
        anyhow::bail!("No subscription months to plot");
    }
    let n_periods = counts.len();
    let max_count = counts.iter().map(|&(_, c)| c).max().unwrap_or(1) as f64;
    let labels: Vec<String> = counts.iter().map(|(period, _)| period.to_string()).collect();

    let output_path = output_dir.join(MONTHLY_SUBSCRIPTIONS_FILE);
    let root = BitMapBackend::new(&output_path, settings.figure_pixels()).into_drawing_area();
    root.fill(&settings.background)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Monthly Customer Subscriptions", settings.title_font())
        .margin(px(settings, 12.0))
        .x_label_area_size(px(settings, 44.0))
        .y_label_area_size(px(settings, 60.0))
        .build_cartesian_2d(-0.5..n_periods as f64 - 0.5, 0f64..(max_count * 1.12))?;

    chart
        .configure_mesh()
        .bold_line_style(settings.grid_color.stroke_width(2))
        .light_line_style(&TRANSPARENT)
        .x_desc("Month")
        .y_desc("Number of New Subscriptions")
        .axis_desc_style(settings.label_font())
        .x_label_style(settings.xtick_font())
        .y_label_style(settings.ytick_font())
        .x_labels(MAX_MONTH_LABELS.min(n_periods).max(2))
        .x_label_formatter(&|x: &f64| month_tick_label(*x, &labels))
        .y_label_formatter(&|count: &f64| format!("{:.0}", count))
        .draw()?;

    let points: Vec<(f64, f64)> = counts
        .iter()
        .enumerate()
        .map(|(i, &(_, count))| (i as f64, count as f64))
        .collect();
    let line_color = PALETTE[0];

    chart.draw_series(LineSeries::new(
        points.iter().copied(),
        line_color.stroke_width(settings.px(2.0)),
    ))?;
    chart.draw_series(
        points
            .iter()
            .map(|&point| Circle::new(point, px(settings, 4.0), line_color.filled())),
    )?;

    root.present()?;
    println!("Monthly subscriptions chart saved to: {}", output_path.display());

    Ok(())
}

/// Horizontal bar chart of the `n` countries with the most customers,
/// largest at the top
pub fn plot_top_countries(table: &CustomerTable, n: usize, output_dir: &Path) -> crate::Result<()> {
    let settings = plot_settings();
    let top = table.top_countries(n)?;
    if top.is_empty() {
        anyhow::bail!("No countries to plot");
    }
    let n_bars = top.len();
    let max_count = top.iter().map(|&(_, c)| c).max().unwrap_or(1) as f64;
    let names: Vec<String> = top.iter().map(|(name, _)| name.clone()).collect();

    let output_path = output_dir.join(TOP_COUNTRIES_FILE);
    let root = BitMapBackend::new(&output_path, settings.figure_pixels()).into_drawing_area();
    root.fill(&settings.background)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(format!("Top {} Countries by Customer Count", n_bars), settings.title_font())
        .margin(px(settings, 12.0))
        .x_label_area_size(px(settings, 44.0))
        .y_label_area_size(label_area_for(settings, names.iter().map(|c| c.chars().count())))
        .build_cartesian_2d(0f64..(max_count * 1.1), (0..n_bars - 1).into_segmented())?;

    chart
        .configure_mesh()
        .disable_y_mesh()
        .bold_line_style(settings.grid_color.stroke_width(2))
        .light_line_style(&TRANSPARENT)
        .x_desc("Number of Customers")
        .y_desc("Country")
        .axis_desc_style(settings.label_font())
        .x_label_style(settings.xtick_font())
        .y_label_style(settings.ytick_font())
        .y_labels(n_bars)
        .x_label_formatter(&|count: &f64| format!("{:.0}", count))
        .y_label_formatter(&|y: &SegmentValue<usize>| ranked_row_label(y, &names))
        .draw()?;

    chart.draw_series(
        Histogram::horizontal(&chart)
            .style_func(|y: &SegmentValue<usize>, _| match y {
                SegmentValue::Exact(row) => {
                    PALETTE[row_of(*row, n_bars) % PALETTE.len()].filled()
                }
                _ => PALETTE[0].filled(),
            })
            .margin(settings.px(6.0))
            .data(
                top.iter()
                    .enumerate()
                    .map(|(rank, &(_, count))| (row_of(rank, n_bars), count as f64)),
            ),
    )?;

    root.present()?;
    println!("Top countries chart saved to: {}", output_path.display());

    Ok(())
}

/// Box-and-whisker chart of subscription years for the `n` largest
/// countries. The year axis is ticked at exactly the years present.
pub fn plot_year_distribution_by_country(
    table: &CustomerTable,
    n: usize,
    output_dir: &Path,
) -> crate::Result<()> {
    let settings = plot_settings();
    let distribution = table.year_distribution_by_country(n)?;
    let years = table.distinct_years()?;
    let (year_range, year_labels) = match year_axis(&years) {
        Some(axis) if !distribution.is_empty() => axis,
        _ => anyhow::bail!("No country year distribution to plot"),
    };
    let n_rows = distribution.len();
    let names: Vec<String> = distribution.iter().map(|(name, _)| name.clone()).collect();

    let (_, height) = settings.figure_pixels();
    let box_width = ((height as f64 * 0.7 / n_rows as f64) * 0.6).max(4.0) as u32;

    let output_path = output_dir.join(YEAR_BY_COUNTRY_FILE);
    let root = BitMapBackend::new(&output_path, settings.figure_pixels()).into_drawing_area();
    root.fill(&settings.background)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(
            format!("Subscription Year Distribution for Top {} Countries", n_rows),
            settings.title_font(),
        )
        .margin(px(settings, 12.0))
        .x_label_area_size(px(settings, 44.0))
        .y_label_area_size(label_area_for(settings, names.iter().map(|c| c.chars().count())))
        .build_cartesian_2d(year_range, (0..n_rows - 1).into_segmented())?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .bold_line_style(settings.grid_color.stroke_width(2))
        .light_line_style(&TRANSPARENT)
        .x_desc("Subscription Year")
        .y_desc("Country")
        .axis_desc_style(settings.label_font())
        .x_label_style(settings.xtick_font())
        .y_label_style(settings.ytick_font())
        .x_labels(year_labels)
        .y_labels(n_rows)
        .x_label_formatter(&|year: &f32| year_tick_label(*year, &years))
        .y_label_formatter(&|y: &SegmentValue<usize>| ranked_row_label(y, &names))
        .draw()?;

    // Vertical grid only at the labelled years
    for &year in &years {
        chart.draw_series(LineSeries::new(
            [
                (year as f32, SegmentValue::Exact(0)),
                (year as f32, SegmentValue::Last),
            ],
            settings.grid_color.stroke_width(2),
        ))?;
    }

    for (rank, (_, country_years)) in distribution.iter().enumerate() {
        if country_years.is_empty() {
            continue;
        }
        let color = PALETTE[rank % PALETTE.len()];
        let row = SegmentValue::CenterOf(row_of(rank, n_rows));
        let quartiles = Quartiles::new(country_years.as_slice());

        chart.draw_series(std::iter::once(
            Boxplot::new_horizontal(row.clone(), &quartiles)
                .width(box_width)
                .whisker_width(0.5)
                .style(color.stroke_width(settings.px(1.5))),
        ))?;

        // Points beyond the whiskers
        let [lower_fence, _, _, _, upper_fence] = quartiles.values();
        chart.draw_series(
            country_years
                .iter()
                .map(|&year| year as f32)
                .filter(|&year| year < lower_fence || year > upper_fence)
                .map(|year| Circle::new((year, row.clone()), px(settings, 3.0), color.filled())),
        )?;
    }

    root.present()?;
    println!("Year distribution by country chart saved to: {}", output_path.display());

    Ok(())
}

/// Render all four report charts in order
pub fn generate_report(table: &CustomerTable, options: &ReportOptions) -> crate::Result<()> {
    let output_dir = options.output_dir.as_path();
    tracing::info!("writing charts to {}", output_dir.display());

    plot_distribution_by_year(table, output_dir)?;
    plot_monthly_trend(table, output_dir)?;
    plot_top_countries(table, options.top_countries, output_dir)?;
    plot_year_distribution_by_country(table, options.box_countries, output_dir)?;

    Ok(())
}
