// 🖨️ Text Report
// Plain-text rendering of an AnalysisReport: subscriptions, yearly revenue,
// growth/loss, rankings and the forecast. US-dollar amounts only.

use crate::report::AnalysisReport;
use std::fmt::{self, Write};

/// "$1,234.50", losses in parentheses: "($25.00)"
pub fn format_currency(amount: f64) -> String {
    let cents = (amount.abs() * 100.0).round() as u64;
    let dollars = group_thousands(cents / 100);
    let body = format!("${}.{:02}", dollars, cents % 100);

    if amount < 0.0 && cents > 0 {
        format!("({})", body)
    } else {
        body
    }
}

fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);

    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    grouped
}

/// Render the full report as the sections of the classic output
pub fn render_text(report: &AnalysisReport) -> String {
    let mut out = String::new();
    // Writing into a String never fails
    write_report(&mut out, report).map(|()| out).unwrap_or_default()
}

fn write_report(out: &mut String, report: &AnalysisReport) -> fmt::Result {
    writeln!(out, "Subscription ID, type (one-off, daily, monthly, yearly), and duration:")?;
    for sub in &report.subscriptions {
        writeln!(out, "{} {}:\t{}", sub.id, sub.cadence.code(), sub.duration)?;
    }

    writeln!(out, "\nYearly revenue:")?;
    for total in report.yearly_totals() {
        writeln!(out, "{}: {}", total.year, format_currency(total.total as f64))?;
    }

    writeln!(out, "\nYearly growth/loss (parentheses indicate a loss):")?;
    for delta in &report.deltas {
        writeln!(out, "{}: {}", delta.year, format_currency(delta.delta as f64))?;
    }

    writeln!(out, "\n{} years with highest growth:", report.growth_years.len())?;
    write_ranked(out, report, &report.growth_years)?;

    writeln!(out, "\n{} years with highest loss:", report.loss_years.len())?;
    write_ranked(out, report, &report.loss_years)?;

    writeln!(
        out,
        "\nExpected total revenue for {} is {}",
        report.forecast.year,
        format_currency(report.forecast_total())
    )?;

    if !report.errors.is_empty() {
        writeln!(out, "\nSkipped items ({}):", report.errors.len())?;
        for error in &report.errors {
            writeln!(out, "  {}", error)?;
        }
    }

    Ok(())
}

fn write_ranked(out: &mut String, report: &AnalysisReport, years: &[i32]) -> fmt::Result {
    for year in years {
        let delta = report.delta_of(*year).unwrap_or_default();
        writeln!(out, "{}: {}", year, format_currency(delta as f64))?;
    }
    Ok(())
}

// ============================================================================
// TESTS
// ============================================================================
