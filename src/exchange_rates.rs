// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

use anyhow::Result;
use chrono::{Local, NaiveDate};
use csv::Writer;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::models::{RateTable, BASE_CURRENCY};

/// Write a rate table as CSV rows: code, factor, base units per unit, date.
pub fn write_rates_csv<W: Write>(
    table: &RateTable,
    requested: Option<NaiveDate>,
    out: W,
) -> Result<()> {
    let mut writer = Writer::from_writer(out);

    writer.write_record([
        "Currency",
        "Factor",
        format!("{} per unit", BASE_CURRENCY).as_str(),
        "Date",
    ])?;

    let date = table
        .published()
        .or(requested)
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default();

    for (code, factor) in table.iter() {
        writer.write_record([
            code,
            factor.to_string().as_str(),
            (1.0 / factor).to_string().as_str(),
            date.as_str(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

/// Export to `output/exchange_rates_<timestamp>.csv`, returning the path.
pub fn export_rates_csv(
    table: &RateTable,
    requested: Option<NaiveDate>,
    output_dir: &Path,
) -> Result<PathBuf> {
    fs::create_dir_all(output_dir)?;

    let timestamp = Local::now().format("%Y%m%d_%H%M%S");
    let path = output_dir.join(format!("exchange_rates_{}.csv", timestamp));
    let file = fs::File::create(&path)?;
    write_rates_csv(table, requested, file)?;

    println!("✅ Exchange rates written to {}", path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::exchange_rates::fixtures::USD_ONLY;
    use tempfile::tempdir;

    #[test]
    fn test_csv_rows() -> Result<()> {
        let table = RateTable::parse(USD_ONLY)?;
        let mut out = Vec::new();
        write_rates_csv(&table, None, &mut out)?;

        let text = String::from_utf8(out)?;
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Currency,Factor,RUB per unit,Date");
        assert_eq!(lines[1], "RUB,1,1,2024-03-02");
        assert_eq!(lines[2], "USD,0.01,100,2024-03-02");
        assert_eq!(lines.len(), 3);
        Ok(())
    }

    #[test]
    fn test_requested_date_used_when_feed_has_none() -> Result<()> {
        let table = RateTable::from_factors(vec![("EUR".to_string(), 0.01)]);
        let mut out = Vec::new();
        write_rates_csv(&table, NaiveDate::from_ymd_opt(2023, 1, 9), &mut out)?;
        let text = String::from_utf8(out)?;
        assert!(text.contains("EUR,0.01,100,2023-01-09"));
        Ok(())
    }

    #[test]
    fn test_export_creates_file() -> Result<()> {
        let dir = tempdir()?;
        let table = RateTable::parse(USD_ONLY)?;
        let path = export_rates_csv(&table, None, &dir.path().join("output"))?;
        assert!(path.exists());
        assert!(fs::read_to_string(path)?.starts_with("Currency,"));
        Ok(())
    }
}
