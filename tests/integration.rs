//! Integration tests for Customer Insights

use customer_insights::viz::{
    DISTRIBUTION_BY_YEAR_FILE, MONTHLY_SUBSCRIPTIONS_FILE, TOP_COUNTRIES_FILE, YEAR_BY_COUNTRY_FILE,
};
use customer_insights::{
    configure_plot_settings, generate_report, load_customers, load_failure_message,
    try_load_customers, ReportOptions,
};
use std::io::Write;
use tempfile::{tempdir, NamedTempFile};

const COUNTRIES: [&str; 20] = [
    "Chile", "Djibouti", "Antigua and Barbuda", "Dominican Republic", "Slovakia",
    "Bosnia and Herzegovina", "Pitcairn Islands", "Bulgaria", "Cyprus", "Timor-Leste",
    "Guernsey", "Vietnam", "Togo", "Sri Lanka", "Singapore", "Honduras", "Zambia",
    "Belarus", "Eritrea", "Fiji",
];

/// 1000 customers spread over 2015-2023 and 20 countries of uneven size
fn create_customers_csv() -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        "Index,Customer Id,First Name,Last Name,Company,City,Country,Phone 1,Phone 2,Email,Subscription Date,Website"
    )
    .unwrap();

    for i in 0..1000usize {
        let country = COUNTRIES[(i % 37) % COUNTRIES.len()];
        let year = 2015 + (i % 9);
        let month = 1 + (i * 7) % 12;
        let day = 1 + i % 28;
        writeln!(
            file,
            "{},{:015X},First{},Last{},Company {},City {},\"{}\",555-{:04},555-{:04},user{}@example.com,{}-{:02}-{:02},https://example.com/{}",
            i + 1,
            i * 7919,
            i,
            i,
            i % 50,
            i % 80,
            country,
            i,
            9999 - i,
            i,
            year,
            month,
            day,
            i
        )
        .unwrap();
    }

    file
}

#[test]
fn test_end_to_end_report() {
    let test_file = create_customers_csv();
    let output_dir = tempdir().unwrap();

    configure_plot_settings();
    let table = try_load_customers(test_file.path()).expect("customer data should load");
    assert_eq!(table.height(), 1000);

    let options = ReportOptions {
        output_dir: output_dir.path().to_path_buf(),
        ..ReportOptions::default()
    };
    generate_report(&table, &options).unwrap();

    for file_name in [
        DISTRIBUTION_BY_YEAR_FILE,
        MONTHLY_SUBSCRIPTIONS_FILE,
        TOP_COUNTRIES_FILE,
        YEAR_BY_COUNTRY_FILE,
    ] {
        let path = output_dir.path().join(file_name);
        assert!(path.exists(), "{} was not written", file_name);
        assert!(std::fs::metadata(&path).unwrap().len() > 0);
    }
}

#[test]
fn test_calendar_columns_match_dates() {
    let test_file = create_customers_csv();
    let table = load_customers(test_file.path()).unwrap();

    let years = table.years().unwrap();
    let months = table.months().unwrap();
    for i in 0..1000usize {
        assert_eq!(years[i], 2015 + (i % 9) as i32);
        assert_eq!(months[i], 1 + ((i * 7) % 12) as u32);
    }
    assert_eq!(table.distinct_years().unwrap(), (2015..=2023).collect::<Vec<_>>());
}

#[test]
fn test_top_countries_ranking() {
    let test_file = create_customers_csv();
    let table = load_customers(test_file.path()).unwrap();

    let top = table.top_countries(15).unwrap();
    assert_eq!(top.len(), 15);
    assert!(top.windows(2).all(|pair| pair[0].1 >= pair[1].1));

    // Equal counts keep first-seen order, which follows COUNTRIES here
    for pair in top.windows(2).filter(|pair| pair[0].1 == pair[1].1) {
        let first = COUNTRIES.iter().position(|c| *c == pair[0].0).unwrap();
        let second = COUNTRIES.iter().position(|c| *c == pair[1].0).unwrap();
        assert!(first < second);
    }

    // Asking for more countries than exist returns them all
    assert_eq!(table.top_countries(50).unwrap().len(), COUNTRIES.len());
}

#[test]
fn test_monthly_counts_cover_every_row() {
    let test_file = create_customers_csv();
    let table = load_customers(test_file.path()).unwrap();

    let by_month = table.counts_by_year_month().unwrap();
    let total: u64 = by_month.iter().map(|&(_, count)| count).sum();
    assert_eq!(total, 1000);
    assert!(by_month.windows(2).all(|pair| pair[0].0 < pair[1].0));

    let distinct: std::collections::HashSet<_> = table
        .years()
        .unwrap()
        .into_iter()
        .zip(table.months().unwrap())
        .collect();
    assert_eq!(by_month.len(), distinct.len());
}

#[test]
fn test_year_distribution_follows_country_ranking() {
    let test_file = create_customers_csv();
    let table = load_customers(test_file.path()).unwrap();

    let top = table.top_countries(10).unwrap();
    let distribution = table.year_distribution_by_country(10).unwrap();
    assert_eq!(distribution.len(), 10);
    for ((country, count), (dist_country, years)) in top.iter().zip(&distribution) {
        assert_eq!(country, dist_country);
        assert_eq!(*count as usize, years.len());
    }
}

#[test]
fn test_bad_date_produces_no_table() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "Index,Country,Subscription Date").unwrap();
    writeln!(file, "1,Chile,2020-08-24").unwrap();
    writeln!(file, "2,Peru,not-a-date").unwrap();
    writeln!(file, "3,Fiji,2021-01-02").unwrap();

    assert!(try_load_customers(file.path()).is_none());
}

#[test]
fn test_missing_file_produces_no_table() {
    let dir = tempdir().unwrap();
    assert!(try_load_customers(dir.path().join("customers-1000.csv")).is_none());
}

#[test]
fn test_load_failure_message_carries_reason() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "Index,Country,Subscription Date").unwrap();
    writeln!(file, "1,Chile,2020-08-24").unwrap();
    writeln!(file, "2,Peru,31/31/2020").unwrap();

    let err = load_customers(file.path()).unwrap_err();
    let message = load_failure_message(&err);
    assert!(message.contains("31/31/2020"));
    assert!(message.contains(&err.root_cause().to_string()));
}
