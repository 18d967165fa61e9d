//! Plain-text table rendering for the analysis reports
//!
//! Percentages print with two decimals; null cells (zero denominators,
//! missing transitions) render as `-`, never as zero.

use northstar_activity::ActiveUsersSummary;
use northstar_funnels::FunnelReport;
use northstar_retention::RetentionReport;

pub fn pct(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{v:.2}"),
        None => "-".to_string(),
    }
}

pub fn seconds(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{v:.1}"),
        None => "-".to_string(),
    }
}

pub fn print_funnel(report: &FunnelReport) {
    for segment in &report.segments {
        let label = segment.platform.as_deref().unwrap_or("(no segment)");
        println!("segment: {label}");
        println!(
            "  {:<16} {:>8} {:>12} {:>8} {:>10} {:>10}",
            "milestone", "users", "conv_next_%", "strict", "avg_s", "median_s"
        );
        for stage in &segment.stages {
            println!(
                "  {:<16} {:>8} {:>12} {:>8} {:>10} {:>10}",
                stage.milestone,
                stage.users_reached,
                pct(stage.conversion_rate_to_next),
                stage.strict_transitions_to_next,
                seconds(stage.avg_seconds_to_next),
                seconds(stage.median_seconds_to_next),
            );
        }
        println!("  overall: {}%", pct(segment.overall_conversion_rate));
        println!();
    }
    if report.users_with_conflicting_platform > 0 {
        println!(
            "data quality: {} user(s) observed under multiple platform values",
            report.users_with_conflicting_platform
        );
    }
}

pub fn print_retention(report: &RetentionReport) {
    print!("{:<12} {:>6}", "cohort", "users");
    for offset in 0..=report.max_offset {
        print!(" {:>8}", format!("week_{offset}"));
    }
    println!();
    for cohort in &report.cohorts {
        print!("{:<12} {:>6}", cohort.week_start, cohort.cohort_size);
        for value in &cohort.retention {
            print!(" {:>8}", format!("{value:.2}"));
        }
        println!();
    }
}

pub fn print_active_users(summary: &ActiveUsersSummary) {
    println!("as of {}", summary.at.to_rfc3339());
    println!("  dau: {}", summary.dau);
    println!("  wau: {}", summary.wau);
    println!("  mau: {}", summary.mau);
    println!("  stickiness: {}", pct(summary.stickiness));
}
