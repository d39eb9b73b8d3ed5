// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

use anyhow::{anyhow, Result};
use plotters::prelude::*;
use std::path::Path;

use crate::models::{missing_dates, rate_bounds, SeriesPoint};

const COLOR_BLUE: RGBColor = RGBColor(59, 130, 246);
const COLOR_ROSE: RGBColor = RGBColor(244, 63, 94);

/// Value range for the y axis with some headroom; a flat series still gets a
/// visible band.
fn padded_range(lo: f64, hi: f64) -> (f64, f64) {
    let span = hi - lo;
    let pad = if span.abs() < f64::EPSILON {
        (hi.abs() * 0.01).max(0.01)
    } else {
        span * 0.05
    };
    (lo - pad, hi + pad)
}

/// Runs of consecutive known rates, so gaps break the line.
fn known_runs(points: &[SeriesPoint]) -> Vec<Vec<(i32, f64)>> {
    let mut runs = Vec::new();
    let mut current = Vec::new();
    for (i, point) in points.iter().enumerate() {
        match point.rate {
            Some(rate) => current.push((i as i32, rate)),
            None => {
                if !current.is_empty() {
                    runs.push(std::mem::take(&mut current));
                }
            }
        }
    }
    if !current.is_empty() {
        runs.push(current);
    }
    runs
}

/// Render a rate series as an SVG line chart, oldest date on the left.
/// Missing dates are marked with a cross on the x axis.
pub fn create_rate_chart(
    points: &[SeriesPoint],
    from_code: &str,
    to_code: &str,
    output_path: &Path,
) -> Result<()> {
    let (lo, hi) = rate_bounds(points).ok_or_else(|| anyhow!("No rates available to chart"))?;
    let (y_lo, y_hi) = padded_range(lo, hi);

    let mut ordered = points.to_vec();
    ordered.sort_by_key(|p| p.date);
    let labels: Vec<String> = ordered
        .iter()
        .map(|p| p.date.format("%d.%m.%Y").to_string())
        .collect();
    let missing = missing_dates(&ordered);

    let caption = if missing.is_empty() {
        format!("{} → {} exchange rate", from_code, to_code)
    } else {
        format!(
            "{} → {} exchange rate ({} of {} dates unavailable)",
            from_code,
            to_code,
            missing.len(),
            ordered.len()
        )
    };

    let root = SVGBackend::new(output_path, (1000, 600)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .margin(20)
        .caption(caption, ("sans-serif", 24))
        .x_label_area_size(60)
        .y_label_area_size(80)
        .build_cartesian_2d(-1i32..ordered.len() as i32, y_lo..y_hi)?;

    let label_for = |x: &i32| -> String {
        usize::try_from(*x)
            .ok()
            .and_then(|i| labels.get(i).cloned())
            .unwrap_or_default()
    };

    chart
        .configure_mesh()
        .x_labels(ordered.len().max(2))
        .x_label_formatter(&label_for)
        .x_desc("Date")
        .y_desc(format!("{} per 1 {}", to_code, from_code))
        .draw()?;

    for (i, run) in known_runs(&ordered).into_iter().enumerate() {
        let series = chart.draw_series(LineSeries::new(run.clone(), &COLOR_BLUE))?;
        if i == 0 {
            series
                .label(format!("{} → {}", from_code, to_code))
                .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], COLOR_BLUE));
        }
        chart.draw_series(
            run.into_iter()
                .map(|(x, y)| Circle::new((x, y), 4, COLOR_BLUE.filled())),
        )?;
    }

    chart.draw_series(
        ordered
            .iter()
            .enumerate()
            .filter(|(_, p)| p.rate.is_none())
            .map(|(i, _)| Cross::new((i as i32, y_lo), 6, COLOR_ROSE.stroke_width(2))),
    )?;

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    root.present()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn point(d: u32, rate: Option<f64>) -> SeriesPoint {
        SeriesPoint::new(NaiveDate::from_ymd_opt(2024, 3, d).unwrap(), rate)
    }

    #[test]
    fn test_padded_range() {
        let (lo, hi) = padded_range(90.0, 100.0);
        assert!((lo - 89.5).abs() < 1e-9);
        assert!((hi - 100.5).abs() < 1e-9);

        let (lo, hi) = padded_range(100.0, 100.0);
        assert!(lo < 100.0 && hi > 100.0);
    }

    #[test]
    fn test_known_runs_split_on_gaps() {
        let points = vec![
            point(1, Some(1.0)),
            point(2, Some(2.0)),
            point(3, None),
            point(4, Some(4.0)),
            point(5, None),
        ];
        assert_eq!(
            known_runs(&points),
            vec![vec![(0, 1.0), (1, 2.0)], vec![(3, 4.0)]]
        );
        assert!(known_runs(&[point(1, None)]).is_empty());
    }

    #[test]
    fn test_chart_without_rates_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = create_rate_chart(
            &[point(1, None), point(2, None)],
            "USD",
            "RUB",
            &dir.path().join("chart.svg"),
        );
        assert!(result.is_err());
    }
}
