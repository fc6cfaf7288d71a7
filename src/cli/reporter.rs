// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! CLI output reporter with colored formatting

use crate::convert::RunSummary;
use crate::csg::RegionOutcome;
use colored::*;
use std::time::Duration;

/// CLI reporter for formatted output
pub struct Reporter;

impl Reporter {
    /// One line per region.
    pub fn report_region(path: &str, outcome: &RegionOutcome) {
        println!("{}", Self::region_line(path, outcome));
    }

    fn region_line(path: &str, outcome: &RegionOutcome) -> String {
        match outcome {
            RegionOutcome::Converted(report) => {
                let mut counts = format!("{} triangles", report.triangles);
                if report.quads > 0 {
                    counts.push_str(&format!(", {} quads", report.quads));
                }
                format!(
                    "  {} {} {} {}",
                    "ok   ".green().bold(),
                    path.cyan(),
                    counts.bright_black(),
                    format!("area {:.4}", report.surface_area).bright_black()
                )
            }
            RegionOutcome::Empty => format!(
                "  {} {} {}",
                "empty".yellow().bold(),
                path.cyan(),
                "0 triangles".bright_black()
            ),
            RegionOutcome::NothingRemains => format!(
                "  {} {} {}",
                "skip ".bright_black().bold(),
                path.cyan(),
                "nothing remains".bright_black()
            ),
            RegionOutcome::Faulted(fault) => format!(
                "  {} {} {}",
                "fault".red().bold(),
                path.cyan(),
                fault.to_string().red()
            ),
        }
    }

    /// Final counters, highlighted when anything went wrong.
    pub fn report_summary(summary: &RunSummary, duration: Duration) {
        println!("\n{}", "━".repeat(80).bright_black());
        let line = summary.to_string();
        if summary.is_clean() {
            println!("{} {}", "✅".green(), line.green());
        } else {
            println!("{} {}", "⚠️ ".yellow(), line.yellow());
        }
        println!(
            "  {} {}",
            "Time:".bright_black(),
            Self::format_duration(duration).yellow()
        );
        println!("{}", "━".repeat(80).bright_black());
    }

    /// Report error
    pub fn report_error(message: &str) {
        eprintln!("\n{} {}", "❌ Error:".red().bold(), message);
    }

    /// Report info
    pub fn report_info(message: &str) {
        println!("{} {}", "ℹ️".bright_blue(), message);
    }

    /// Format duration for display
    fn format_duration(duration: Duration) -> String {
        let micros = duration.as_micros();

        if micros < 1_000 {
            format!("{}µs", micros)
        } else if micros < 1_000_000 {
            format!("{:.2}ms", micros as f64 / 1_000.0)
        } else {
            format!("{:.2}s", micros as f64 / 1_000_000.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{EvaluationFault, RegionFault};

    #[test]
    fn test_format_duration() {
        assert_eq!(
            Reporter::format_duration(Duration::from_micros(500)),
            "500µs"
        );
        assert_eq!(
            Reporter::format_duration(Duration::from_millis(5)),
            "5.00ms"
        );
        assert_eq!(Reporter::format_duration(Duration::from_secs(2)), "2.00s");
    }

    #[test]
    fn test_region_line_mentions_fault() {
        colored::control::set_override(false);
        let line = Reporter::region_line(
            "part",
            &RegionOutcome::Faulted(RegionFault::Evaluation(EvaluationFault::Unbounded)),
        );
        assert!(line.contains("fault"));
        assert!(line.contains("part"));
        assert!(line.contains("unbounded"));
    }
}
