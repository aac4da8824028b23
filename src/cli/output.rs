//! Rendering of records, lists and metrics in the selected output format
//!
//! `auto` is for people: a table for lists, a detail view for single
//! records and a one-line confirmation after a change. `json` and `yaml`
//! always carry the full serialized record so scripts can chain commands.

use console::style;
use miette::{IntoDiagnostic, Result};
use serde::Serialize;
use std::io::Write;
use tabled::{builder::Builder, settings::Style};

use crate::cli::{GlobalOpts, OutputFormat};

/// A record that can be shown as one table row
pub trait Tabular {
    /// Column headers, in row order
    fn headers() -> &'static [&'static str];

    /// Full-width cell values, in header order
    fn row(&self) -> Vec<String>;

    /// Compact cells for the interactive table; defaults to [`Tabular::row`]
    fn display_row(&self) -> Vec<String> {
        self.row()
    }

    /// Value printed by `--format id`
    fn id_string(&self) -> String;
}

/// Print a list of records
pub fn print_list<T>(items: &[T], format: OutputFormat, noun_plural: &str) -> Result<()>
where
    T: Tabular + Serialize,
{
    match format {
        OutputFormat::Auto => {
            if items.is_empty() {
                println!("No {} found.", noun_plural);
                return Ok(());
            }
            let mut builder = Builder::default();
            builder.push_record(T::headers().iter().map(|h| h.to_string()));
            for item in items {
                builder.push_record(item.display_row());
            }
            println!("{}", builder.build().with(Style::rounded()));
            println!(
                "{}",
                style(format!("{} {} found", items.len(), noun_plural)).dim()
            );
        }
        OutputFormat::Tsv => {
            println!("{}", T::headers().join("\t"));
            for item in items {
                let cells: Vec<String> = item
                    .row()
                    .into_iter()
                    .map(|cell| cell.replace(['\t', '\n'], " "))
                    .collect();
                println!("{}", cells.join("\t"));
            }
        }
        OutputFormat::Csv => {
            let mut writer = csv::Writer::from_writer(std::io::stdout());
            writer.write_record(T::headers()).into_diagnostic()?;
            for item in items {
                writer.write_record(item.row()).into_diagnostic()?;
            }
            writer.flush().into_diagnostic()?;
        }
        OutputFormat::Json => print_json(&items)?,
        OutputFormat::Yaml => print_yaml(&items)?,
        OutputFormat::Id => {
            for item in items {
                println!("{}", item.id_string());
            }
        }
    }
    Ok(())
}

/// Print a single record; `detail` renders the human view
pub fn print_record<T, F>(item: &T, format: OutputFormat, detail: F) -> Result<()>
where
    T: Tabular + Serialize,
    F: FnOnce(&T),
{
    match format {
        OutputFormat::Json => print_json(item),
        OutputFormat::Yaml => print_yaml(item),
        OutputFormat::Id => {
            println!("{}", item.id_string());
            Ok(())
        }
        OutputFormat::Tsv | OutputFormat::Csv => print_list(std::slice::from_ref(item), format, ""),
        OutputFormat::Auto => {
            detail(item);
            Ok(())
        }
    }
}

/// Report the result of a state change
pub fn print_outcome<T>(item: &T, global: &GlobalOpts, message: &str) -> Result<()>
where
    T: Tabular + Serialize,
{
    match global.format {
        OutputFormat::Json => print_json(item),
        OutputFormat::Yaml => print_yaml(item),
        OutputFormat::Id => {
            println!("{}", item.id_string());
            Ok(())
        }
        _ => {
            if !global.quiet {
                println!("{} {}", style("✓").green(), message);
            }
            Ok(())
        }
    }
}

/// Print a metrics snapshot; `summary` renders the human view
pub fn print_metrics<T, F>(metrics: &T, format: OutputFormat, summary: F) -> Result<()>
where
    T: Serialize,
    F: FnOnce(&T),
{
    match format {
        OutputFormat::Yaml => print_yaml(metrics),
        OutputFormat::Auto => {
            summary(metrics);
            Ok(())
        }
        _ => print_json(metrics),
    }
}

/// Heading followed by a rule, used by detail views
pub fn print_heading(title: &str) {
    println!("{}", style(title).bold().cyan());
    println!("{}", style("─".repeat(60)).dim());
}

/// `label: value` line, skipped when the value is empty
pub fn print_field(label: &str, value: impl AsRef<str>) {
    let value = value.as_ref();
    if !value.is_empty() {
        println!("{:<18} {}", style(format!("{}:", label)).bold(), value);
    }
}

/// Counts keyed by category, one per line
pub fn print_breakdown(label: &str, counts: &std::collections::BTreeMap<String, u64>) {
    println!("{}", style(label).bold());
    for (key, count) in counts {
        println!("  {:<24} {}", key, count);
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).into_diagnostic()?;
    println!("{}", json);
    Ok(())
}

fn print_yaml<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let yaml = serde_yml::to_string(value).into_diagnostic()?;
    let mut out = std::io::stdout().lock();
    out.write_all(yaml.as_bytes()).into_diagnostic()?;
    Ok(())
}
