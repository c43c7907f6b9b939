use std::io;

use chrono::NaiveDate;
use ts_wrangler::{
    init_logging, log_app_start, logging_config_from_env, Column, TimeSeriesGapAnalyzer,
    TimeSeriesTable,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let logging_cfg = logging_config_from_env();
    init_logging(&logging_cfg)?;
    log_app_start("eda_demo", &logging_cfg);

    let as_json = std::env::args().skip(1).any(|arg| arg == "--json");
    let table = sample_table()?;
    let analyzer = TimeSeriesGapAnalyzer::new(&table);

    if as_json {
        println!("{}", analyzer.eda_report()?.to_json_pretty()?);
        return Ok(());
    }

    let mut stdout = io::stdout().lock();
    analyzer.perform_eda(&mut stdout)?;

    println!("\nForward filled (business days):");
    print!("{}", analyzer.fill_forward(true)?);
    println!("\nWeekdays only:");
    print!("{}", analyzer.remove_weekend_days());

    Ok(())
}

fn sample_table() -> Result<TimeSeriesTable, Box<dyn std::error::Error>> {
    let days = [
        (2022, 1, 3),
        (2022, 1, 4),
        (2022, 1, 5),
        (2022, 1, 8),
        (2022, 1, 11),
        (2022, 1, 12),
        (2022, 1, 13),
        (2022, 1, 19),
        (2022, 1, 20),
        (2022, 1, 21),
    ];
    let index = days
        .iter()
        .map(|&(y, m, d)| NaiveDate::from_ymd_opt(y, m, d).ok_or("invalid sample date"))
        .collect::<Result<Vec<_>, _>>()?;

    let close = [
        Some(101.2),
        Some(102.0),
        None,
        Some(103.1),
        Some(99.8),
        Some(100.4),
        Some(101.9),
        None,
        Some(104.2),
        Some(105.0),
    ];
    let volume = [1200i64, 980, 1100, 400, 1510, 1320, 1250, 900, 1480, 1610];

    Ok(TimeSeriesTable::new(
        index,
        vec![Column::new("close", close), Column::new("volume", volume)],
    )?)
}
