//! The `validate` command

use colored::Colorize;
use vendored_core::{CheckStatus, ValidationReport, Validator, auth};
use vendored_host::SourceHost;

use crate::error::{CliError, Result};

pub fn run_validate(host: &dyn SourceHost, repo: &str, reference: Option<&str>) -> Result<()> {
    println!("{} Validating {}", "=>".blue().bold(), repo.bold());

    let token = auth::validator_token();
    let report = Validator::new(host).validate(repo, reference, token.as_deref())?;
    print_report(&report);

    if report.all_passed() {
        Ok(())
    } else {
        Err(CliError::Reported {
            summary: format!("{repo}: {}", report.summary()),
        })
    }
}

fn print_report(report: &ValidationReport) {
    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "PASS".green().bold(),
            CheckStatus::Fail => "FAIL".red().bold(),
        };
        match &check.detail {
            Some(detail) => println!("  {marker} {} {}", check.name, format!("({detail})").dimmed()),
            None => println!("  {marker} {}", check.name),
        }
    }
    println!();
    let summary = report.summary();
    if report.all_passed() {
        println!("{}", summary.green().bold());
    } else {
        println!("{}", summary.red().bold());
    }
}
