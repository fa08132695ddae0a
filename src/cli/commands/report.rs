use anyhow::Result;
use chrono::{Days, Local, NaiveDate};
use colored::Colorize;

use crate::cli::{ReportArgs, ReportMode};
use crate::config::{load_config, resolve_projects_dir, Config};
use crate::usage::report::{render_csv, render_summary, render_table};
use crate::usage::{scan_projects, ScanOptions};

/// Scan session logs and print the selected report view.
///
/// Unreadable files only show up in the error count; the command still
/// succeeds so partial data gets printed.
pub async fn run(args: ReportArgs) -> Result<()> {
    let config = load_config().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "ignoring config file");
        Config::default()
    });

    let root = resolve_projects_dir(args.dir.as_deref(), &config)?;
    let mode = args.mode();

    let min_date = args
        .days
        .or(config.default_days)
        .and_then(|days| cutoff_date(Local::now().date_naive(), days));

    let options = ScanOptions {
        project_filter: args.project.clone(),
        min_date,
    };

    // Keep stdout a clean CSV stream
    let status = |line: String| {
        if mode == ReportMode::Csv {
            eprintln!("{}", line.dimmed());
        } else {
            println!("{}", line.dimmed());
        }
    };

    status(format!("Scanning {} ...", root.display()));
    let result = scan_projects(&root, &options, &Local);
    status(format!(
        "Scanned {}/{} files, {} date×model combos, {} errors\n",
        result.files_scanned,
        result.files_discovered,
        result.usage.len(),
        result.file_errors
    ));

    match mode {
        ReportMode::Table => {
            print!("{}", render_table(&result.usage));
            print!("{}", render_summary(&result.usage));
        }
        ReportMode::Csv => print!("{}", render_csv(&result.usage)),
        ReportMode::Summary => print!("{}", render_summary(&result.usage)),
    }

    Ok(())
}

/// First local date included by a "last N days" filter, as "YYYY-MM-DD".
///
/// Zero days means no filter.
fn cutoff_date(today: NaiveDate, days: u32) -> Option<String> {
    if days == 0 {
        return None;
    }
    today
        .checked_sub_days(Days::new(u64::from(days)))
        .map(|d| d.format("%Y-%m-%d").to_string())
}
