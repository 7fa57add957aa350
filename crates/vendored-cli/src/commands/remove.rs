//! The `remove` command

use std::io::{BufRead, IsTerminal, Write};
use std::path::Path;

use colored::Colorize;
use dialoguer::Confirm;
use vendored_core::{RemovalPlan, Remover};

use crate::context;
use crate::error::Result;

pub fn run_remove(cwd: &Path, vendor: &str, force: bool) -> Result<()> {
    let layout = context::locate(cwd)?;
    let remover = Remover::new(layout);
    let plan = remover.plan(vendor)?;

    print_plan(&plan);

    if !force && !confirm(&format!("Remove {} and delete these files?", plan.vendor))? {
        println!("Aborted, nothing was removed");
        return Ok(());
    }

    let report = remover.execute(&plan)?;
    println!(
        "{} Removed {} ({} file(s), {} empty director{} pruned)",
        "=>".blue().bold(),
        report.vendor.bold(),
        report.removed_files,
        report.pruned_dirs.len(),
        if report.pruned_dirs.len() == 1 { "y" } else { "ies" }
    );
    Ok(())
}

fn print_plan(plan: &RemovalPlan) {
    println!(
        "{} Removing {} ({} file(s))",
        "=>".blue().bold(),
        plan.vendor.bold(),
        plan.files.len()
    );
    for file in &plan.files {
        println!("   {}", file.dimmed());
    }

    if !plan.reverse_deps.is_empty() {
        println!(
            "{} {} depend(s) on {}",
            "Warning:".yellow().bold(),
            plan.reverse_deps.join(", "),
            plan.vendor
        );
        println!(
            "   {}",
            "They may stop working until it is installed again".dimmed()
        );
    }
}

/// Ask on the terminal, or read a y/N answer from piped stdin.
fn confirm(prompt: &str) -> Result<bool> {
    if std::io::stdin().is_terminal() {
        return Ok(Confirm::new().with_prompt(prompt).default(false).interact()?);
    }

    print!("{prompt} [y/N] ");
    std::io::stdout().flush()?;
    let mut answer = String::new();
    std::io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(
        answer.trim().to_ascii_lowercase().as_str(),
        "y" | "yes"
    ))
}
