//! Human-facing tables: effective configuration and per-stage results.

use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, Cell, Color, Table};

use bibweave_core::fmt_num;
use bibweave_pipeline::{PipelineContext, RunReport};

use crate::config::Config;

fn styled_table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(headers.iter().map(|h| Cell::new(h).fg(Color::Cyan)));
    table
}

pub fn print_config(config: &Config, cli: &crate::Cli) {
    let workers = cli.workers.unwrap_or(config.pipeline.workers);
    let output_dir = cli
        .output_dir
        .as_ref()
        .unwrap_or(&config.pipeline.output_dir);
    let cache_dir = cli.cache_dir.as_ref().unwrap_or(&config.pipeline.cache_dir);

    let mut table = styled_table(&["Setting", "Value"]);
    table.add_row(vec!["Workers", &workers.to_string()]);
    table.add_row(vec!["Output directory", &output_dir.display().to_string()]);
    table.add_row(vec!["Cache directory", &cache_dir.display().to_string()]);
    table.add_row(vec!["Max retries", &config.http.max_retries.to_string()]);
    table.add_row(vec![
        "Backoff factor",
        &config.http.backoff_factor.to_string(),
    ]);
    table.add_row(vec![
        "Author fallback",
        if config.pipeline.author_fallback {
            "enabled"
        } else {
            "disabled"
        },
    ]);
    table.add_row(vec![
        "S2 API key",
        if config.sources.s2_api_key.is_some() {
            "configured"
        } else {
            "not set"
        },
    ]);

    eprintln!("\n{table}");
}

pub fn print_report(ctx: &PipelineContext, report: &RunReport) {
    if report.summaries.is_empty() && report.failures.is_empty() {
        return;
    }

    let mut table = styled_table(&["Stage", "Conference", "Processed", "Enriched", "Failed"]);
    for s in &report.summaries {
        table.add_row(vec![
            s.stage.to_string(),
            s.conference.clone(),
            fmt_num(s.processed),
            fmt_num(s.enriched),
            fmt_num(s.failed),
        ]);
    }
    for (conference, stage, message) in &report.failures {
        table.add_row(vec![
            Cell::new(*stage).fg(Color::Red),
            Cell::new(conference).fg(Color::Red),
            Cell::new("-"),
            Cell::new("-"),
            Cell::new(message),
        ]);
    }

    ctx.progress.println(format!("\n{table}"));
}
