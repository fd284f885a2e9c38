//! # CLI Layer
//!
//! This module is **one possible UI client** for docmanager, not the application itself.
//!
//! The CLI layer is the **only** place in the codebase that:
//! - Knows about terminal I/O (stdout, stderr)
//! - Installs the tracing subscriber
//! - Handles argument parsing
//! - Formats output for human consumption
//!
//! ## Structure
//!
//! - `run()`: Main dispatch logic (called by `main.rs`), returns the exit classification
//! - `init_context()`: Builds the `Context` from the config file and global options
//! - `handle_*()`: Per-command handlers that call the API and format output

use super::print::{
    eprint_messages, print_messages, print_reports, render_attributes, render_properties,
    render_report, render_table, to_json,
};
use super::setup::{normalize_args, Cli, Commands, OutputFormat, PropertyShortcuts};
use clap::Parser;
use docmanager::api::{
    Action, AnalyzeOptions, CmdResult, ConfigAction, DocManagerApi, Filter, InitOptions,
};
use docmanager::commands::helpers::{
    check_value, parse_assignments, parse_conditions, parse_pairs, parse_properties, split_list,
};
use docmanager::commands::Context;
use docmanager::config::{DocManagerConfig, CONFIG_KEYS};
use docmanager::error::{DocManagerError, Result, ReturnCode};
use docmanager::model::PropertyPath;
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "DOCMANAGER_LOG";
const BUGTRACKER_PREFIX: &str = "bugtracker";

pub fn run() -> Result<ReturnCode> {
    let args = normalize_args(std::env::args_os().map(|a| a.to_string_lossy().into_owned()));
    let cli = Cli::parse_from(args);

    let ctx = init_context(&cli)?;
    let api = DocManagerApi::new(ctx);
    let format = cli.format;

    match cli.command {
        Commands::Get { properties, files } => handle_get(&api, format, &properties, &files),
        Commands::Set {
            properties,
            shortcuts,
            bugtracker,
            files,
        } => {
            let prefix = bugtracker.then_some(BUGTRACKER_PREFIX);
            let mut pairs = parse_assignments(&properties, prefix)?;
            pairs.extend(shortcut_pairs(&shortcuts)?);
            handle_change(&api, format, Action::Set { pairs }, &files)
        }
        Commands::Del { properties, files } => {
            let conditions = parse_conditions(&properties)?;
            handle_change(&api, format, Action::Delete { conditions }, &files)
        }
        Commands::SetAttr {
            property,
            attributes,
            files,
        } => {
            let action = Action::SetAttr {
                property: property.parse()?,
                attributes: parse_pairs(&attributes)?,
            };
            handle_change(&api, format, action, &files)
        }
        Commands::DelAttr {
            property,
            attributes,
            files,
        } => {
            let action = Action::DelAttr {
                property: property.parse()?,
                names: split_list(&attributes),
            };
            handle_change(&api, format, action, &files)
        }
        Commands::GetAttr {
            properties,
            attributes,
            files,
        } => handle_get_attr(&api, format, &properties, &attributes, &files),
        Commands::Init {
            force,
            with_bugtracker,
            shortcuts,
            files,
        } => {
            let options = InitOptions {
                force,
                with_bugtracker,
                values: shortcut_pairs(&shortcuts)?,
            };
            handle_change(&api, format, Action::Init(options), &files)
        }
        Commands::Analyze {
            queryformat,
            filters,
            sort,
            default_output,
            quiet,
            files,
        } => {
            let config = &api.context().config;
            let options = AnalyzeOptions {
                queryformat: queryformat
                    .or_else(|| config.queryformat.clone())
                    .unwrap_or_default(),
                filters: filters
                    .iter()
                    .map(|f| f.parse())
                    .collect::<Result<Vec<Filter>>>()?,
                sort,
                default_output: default_output.or_else(|| config.default_output.clone()),
                quiet,
            };
            handle_analyze(&api, format, options, &files)
        }
        Commands::Config { key, value } => handle_config(&api, format, key, value),
    }
}

/// Builds the command context: config file first, then global options on top.
fn init_context(cli: &Cli) -> Result<Context> {
    let config_path = cli.config.clone().or_else(DocManagerConfig::default_path);
    let mut config = match &config_path {
        Some(path) => DocManagerConfig::load(path)?,
        None => DocManagerConfig::default(),
    };

    init_logging(cli.verbose.max(config.verbosity));
    debug!(config = ?config_path, "configuration loaded");

    if let Some(jobs) = cli.jobs {
        if jobs == 0 {
            return Err(DocManagerError::InvalidInput(
                "--jobs must be at least 1".to_string(),
            ));
        }
        config.jobs = jobs;
    }
    if cli.stop_on_error {
        config.stop_on_error = true;
    }
    Ok(Context::new(config, config_path))
}

fn log_directive(level: u8) -> &'static str {
    match level {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Logs go to stderr; `DOCMANAGER_LOG` overrides the `-v` level.
fn init_logging(level: u8) {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(log_directive(level)));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn shortcut_pairs(shortcuts: &PropertyShortcuts) -> Result<Vec<(PropertyPath, String)>> {
    shortcuts
        .items()
        .into_iter()
        .map(|(name, value)| -> Result<(PropertyPath, String)> {
            let path: PropertyPath = name.parse()?;
            let value = check_value(&path, value)?;
            Ok((path, value))
        })
        .collect()
}

/// Per-file reports of a read command that did not go through.
fn print_failures(result: &CmdResult, format: OutputFormat) {
    let failures = result.reports.iter().filter(|r| !r.is_valid());
    match format {
        OutputFormat::Json => failures.for_each(|r| eprintln!("{}", render_report(r))),
        _ => print_reports(failures),
    }
}

fn handle_get(
    api: &DocManagerApi,
    format: OutputFormat,
    properties: &[String],
    files: &[PathBuf],
) -> Result<ReturnCode> {
    let properties = parse_properties(properties)?;
    let asked = properties.len();
    let result = api.run(&Action::Get { properties }, files)?;

    match format {
        OutputFormat::Text => {
            for line in render_properties(&result.properties, asked) {
                println!("{}", line);
            }
        }
        OutputFormat::Json => println!("{}", to_json(&result.properties)?),
        OutputFormat::Table => {
            let rows: Vec<Vec<String>> = result
                .properties
                .iter()
                .flat_map(|fp| {
                    fp.properties.iter().map(move |p| {
                        vec![
                            fp.file.display().to_string(),
                            p.name.clone(),
                            p.value.clone().unwrap_or_default(),
                        ]
                    })
                })
                .collect();
            print!("{}", render_table(&["File", "Property", "Value"], &rows));
        }
    }
    print_failures(&result, format);
    Ok(result.return_code())
}

fn handle_get_attr(
    api: &DocManagerApi,
    format: OutputFormat,
    properties: &[String],
    attributes: &[String],
    files: &[PathBuf],
) -> Result<ReturnCode> {
    let action = Action::GetAttr {
        properties: parse_properties(properties)?,
        names: split_list(attributes),
    };
    let result = api.run(&action, files)?;

    match format {
        OutputFormat::Text => {
            for line in render_attributes(&result.attributes) {
                println!("{}", line);
            }
        }
        OutputFormat::Json => println!("{}", to_json(&result.attributes)?),
        OutputFormat::Table => {
            let rows: Vec<Vec<String>> = result
                .attributes
                .iter()
                .flat_map(|pa| {
                    pa.attributes.iter().map(move |(name, value)| {
                        vec![
                            pa.file.display().to_string(),
                            pa.property.clone(),
                            name.clone(),
                            value.clone(),
                        ]
                    })
                })
                .collect();
            print!(
                "{}",
                render_table(&["File", "Property", "Attribute", "Value"], &rows)
            );
        }
    }
    print_failures(&result, format);
    Ok(result.return_code())
}

/// Shared output of the commands that write files.
fn handle_change(
    api: &DocManagerApi,
    format: OutputFormat,
    action: Action,
    files: &[PathBuf],
) -> Result<ReturnCode> {
    let result = api.run(&action, files)?;

    match format {
        OutputFormat::Text => {
            print_reports(&result.reports);
            print_messages(&result.messages);
        }
        OutputFormat::Json => {
            println!("{}", to_json(&result.reports)?);
            eprint_messages(&result.messages);
        }
        OutputFormat::Table => {
            let rows: Vec<Vec<String>> = result
                .reports
                .iter()
                .map(|r| {
                    vec![
                        r.file.display().to_string(),
                        format!("{:?}", r.status).to_lowercase(),
                        r.detail.clone().unwrap_or_default(),
                    ]
                })
                .collect();
            print!("{}", render_table(&["File", "Status", "Detail"], &rows));
            print_messages(&result.messages);
        }
    }
    Ok(result.return_code())
}

fn handle_analyze(
    api: &DocManagerApi,
    format: OutputFormat,
    options: AnalyzeOptions,
    files: &[PathBuf],
) -> Result<ReturnCode> {
    let result = api.run(&Action::Analyze(options), files)?;

    match format {
        OutputFormat::Json => {
            println!("{}", to_json(&result.lines)?);
            eprint_messages(&result.messages);
        }
        _ => {
            for line in &result.lines {
                println!("{}", line);
            }
            print_messages(&result.messages);
        }
    }
    print_failures(&result, format);
    Ok(result.return_code())
}

fn handle_config(
    api: &DocManagerApi,
    format: OutputFormat,
    key: Option<String>,
    value: Option<String>,
) -> Result<ReturnCode> {
    let show_all = key.is_none();
    let action = match (key, value) {
        (None, _) => ConfigAction::ShowAll,
        (Some(k), None) => ConfigAction::ShowKey(k),
        (Some(k), Some(v)) => ConfigAction::Set(k, v),
    };
    let result = api.config(action)?;

    match (format, &result.config) {
        (OutputFormat::Json, Some(config)) => println!("{}", to_json(config)?),
        (_, Some(config)) if show_all => {
            for key in CONFIG_KEYS {
                println!("{} = {}", key, config.get(key).unwrap_or_default());
            }
        }
        _ => {}
    }
    print_messages(&result.messages);
    Ok(ReturnCode::Ok)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_maps_to_levels() {
        assert_eq!(log_directive(0), "warn");
        assert_eq!(log_directive(1), "info");
        assert_eq!(log_directive(2), "debug");
        assert_eq!(log_directive(7), "trace");
    }

    #[test]
    fn shortcuts_are_checked() {
        let shortcuts = PropertyShortcuts {
            languages: Some("de_DE,fr,de_DE".into()),
            ..Default::default()
        };
        let pairs = shortcut_pairs(&shortcuts).unwrap();
        assert_eq!(pairs[0].0.to_string(), "languages");
        assert_eq!(pairs[0].1, "de_DE,fr");

        let shortcuts = PropertyShortcuts {
            priority: Some("11".into()),
            ..Default::default()
        };
        assert!(matches!(
            shortcut_pairs(&shortcuts),
            Err(DocManagerError::InvalidInput(_))
        ));
    }
}
