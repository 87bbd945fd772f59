//! # CLI
//!
//! Command-line front end: import cURL commands, inspect and reorganize a
//! project's endpoint tree, and generate or browse its test cases.

use std::io::Read;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand, ValueEnum};
use log::debug;
use serde::Serialize;

use crate::collections::{EndpointDescriptor, FolderNode, folder_suggestions};
use crate::http::client::RestBackend;
use crate::http::curl::{CurlBody, ParsedCurlRequest, parse_curl};
use crate::project::ProjectSession;
use crate::storage::Config;
use crate::testing::{Bucket, MAX_GENERATE, MIN_GENERATE, TestCasePage};

#[derive(Debug, Parser)]
#[command(name = "apitester")]
#[command(about = "Design and test HTTP APIs from the command line", long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text, global = true)]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Parse a cURL command (read from stdin when no argument is given)
    Curl {
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        command: Vec<String>,
        /// Print an endpoint draft filled from the command instead
        #[arg(long)]
        draft: bool,
        /// Folder of the endpoint draft
        #[arg(long, requires = "draft")]
        folder: Option<String>,
    },
    /// Show the endpoint folder tree of a project
    Tree { project: String },
    /// List every folder path in use, parents included
    Folders { project: String },
    /// Move an endpoint to another folder
    Move {
        project: String,
        endpoint: String,
        /// Target folder path, e.g. `users/admin`; empty moves to the root
        folder: String,
    },
    /// Browse a project's test cases
    Tests {
        project: String,
        #[arg(long, default_value_t = 1)]
        page: usize,
    },
    /// Generate test cases and show the new ones
    Generate {
        project: String,
        #[arg(long, default_value_t = 5, value_parser = clap::value_parser!(u32).range(MIN_GENERATE as i64..=MAX_GENERATE as i64))]
        count: u32,
        #[arg(long, default_value_t = 1)]
        page: usize,
    },
    /// Delete a test case
    DeleteTest { project: String, case: String },
    /// Delete an endpoint
    DeleteEndpoint { project: String, endpoint: String },
    /// Show the effective configuration, optionally updating it
    Config {
        #[arg(long)]
        api_url: Option<String>,
        #[arg(long)]
        timeout_ms: Option<u64>,
    },
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let format = cli.format;
    match cli.command {
        Command::Curl { command, draft, folder } => {
            let input = if command.is_empty() {
                let mut buf = String::new();
                std::io::stdin()
                    .read_to_string(&mut buf)
                    .context("Failed to read cURL command from stdin")?;
                buf
            } else {
                join_args(&command)
            };
            let parsed = parse_curl(&input);
            if draft {
                println!("{}", render_draft(&parsed, folder.as_deref().unwrap_or_default())?);
            } else {
                emit(format, &parsed, render_curl)?;
            }
        }
        Command::Config { api_url, timeout_ms } => {
            let mut config = Config::load()?;
            if api_url.is_some() || timeout_ms.is_some() {
                if let Some(url) = api_url {
                    config.api_url = url;
                }
                if let Some(ms) = timeout_ms {
                    config.timeout_ms = ms;
                }
                let path = config.save()?;
                println!("Saved {}", path.display());
            }
            let shown = Config {
                token: config.token.as_ref().map(|_| "********".to_string()),
                ..config
            };
            emit(format, &shown, |c| {
                format!(
                    "API URL: {}\nTimeout: {}ms\nToken: {}\n",
                    c.api_url,
                    c.timeout_ms,
                    c.token.as_deref().unwrap_or("(none)")
                )
            })?;
        }
        Command::Tree { project } => {
            let mut session = open_session(project)?;
            session.reload().await?;
            emit(format, &session.tree(), render_tree)?;
        }
        Command::Folders { project } => {
            let mut session = open_session(project)?;
            let project = session.reload().await?;
            emit(format, &folder_suggestions(&project.endpoints), |paths| {
                paths.iter().map(|p| format!("{p}\n")).collect()
            })?;
        }
        Command::Move { project, endpoint, folder } => {
            let mut session = open_session(project)?;
            session.reload().await?;
            if !session.move_endpoint(&endpoint, &folder).await? {
                bail!("Endpoint `{endpoint}` not found in project `{}`", session.project_id());
            }
            emit(format, &session.tree(), render_tree)?;
        }
        Command::Tests { project, page } => {
            let mut session = open_session(project)?;
            session.reload().await?;
            let partition = session.partition();
            emit(format, &partition.page(Bucket::Previous, page), render_page)?;
        }
        Command::Generate { project, count, page } => {
            let mut session = open_session(project)?;
            let created = session.generate_test_cases(count).await?;
            println!("Generated {created} test case(s)");
            let partition = session.partition();
            emit(format, &partition.page(Bucket::New, page), render_page)?;
        }
        Command::DeleteTest { project, case } => {
            let mut session = open_session(project)?;
            session.delete_test_case(&case).await?;
            println!("Deleted test case {case}");
        }
        Command::DeleteEndpoint { project, endpoint } => {
            let mut session = open_session(project)?;
            session.delete_endpoint(&endpoint).await?;
            println!("Deleted endpoint {endpoint}");
        }
    }
    Ok(())
}

fn open_session(project: String) -> anyhow::Result<ProjectSession<RestBackend>> {
    let config = Config::load()?;
    debug!("using backend {}", config.api_url);
    Ok(ProjectSession::new(RestBackend::new(&config)?, project))
}

fn emit<T: Serialize>(format: OutputFormat, value: &T, text: impl Fn(&T) -> String) -> anyhow::Result<()> {
    match format {
        OutputFormat::Text => print!("{}", text(value)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
    }
    Ok(())
}

/// Rebuilds a command line from shell-split arguments, quoting any argument
/// the cURL tokenizer would otherwise split or treat as an open quote.
pub fn join_args(args: &[String]) -> String {
    args.iter()
        .map(|arg| {
            let needs_quotes = arg.is_empty() || arg.chars().any(|c| c.is_whitespace() || c == '\'' || c == '"');
            if !needs_quotes {
                arg.clone()
            } else if arg.contains('\'') {
                format!("\"{arg}\"")
            } else {
                format!("'{arg}'")
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Endpoint draft in `folder` filled from a parsed command, as pretty JSON.
pub fn render_draft(parsed: &ParsedCurlRequest, folder: &str) -> anyhow::Result<String> {
    let mut endpoint = EndpointDescriptor::draft(folder);
    endpoint.apply_curl(parsed);
    let endpoint = endpoint.normalized()?;
    Ok(serde_json::to_string_pretty(&endpoint)?)
}

fn lines(rows: impl IntoIterator<Item = String>) -> String {
    rows.into_iter().map(|line| line + "\n").collect()
}

pub fn render_curl(parsed: &ParsedCurlRequest) -> String {
    let mut out = vec![
        format!("Method: {}", parsed.method),
        format!("URL: {}", parsed.url.as_deref().unwrap_or("(none)")),
    ];
    out.extend(parsed.headers.iter().map(|(name, value)| format!("Header: {name}: {value}")));
    match &parsed.body {
        Some(CurlBody::Json(value)) => out.push(format!("Body (JSON): {value}")),
        Some(CurlBody::Raw(raw)) => out.push(format!("Body (raw): {raw}")),
        None => {}
    }
    if !parsed.ignored.is_empty() {
        out.push(format!("Ignored: {}", parsed.ignored.join(" ")));
    }
    lines(out)
}

pub fn render_tree(tree: &FolderNode<'_>) -> String {
    let mut out = Vec::new();
    for entry in tree.walk() {
        if entry.depth > 0 {
            out.push(format!("{}{}/", "  ".repeat(entry.depth - 1), entry.name));
        }
        out.extend(entry.node.items.iter().map(|ep| {
            format!(
                "{}{:<6} {}  [{}]",
                "  ".repeat(entry.depth),
                ep.method.to_string(),
                ep.label(),
                ep.id
            )
        }));
    }
    lines(out)
}

pub fn render_page(page: &TestCasePage<'_>) -> String {
    let title = match page.bucket {
        Bucket::New => "New test cases",
        Bucket::Previous => "Previous test cases",
    };
    let header = format!(
        "{title}: page {} of {} ({} total)",
        page.page, page.total_pages, page.total
    );
    let rows = page.items.iter().map(|case| {
        format!(
            "{:<7} {}  [{}]  {}",
            case.status.to_string(),
            case.name,
            case.id,
            case.created_at.format("%Y-%m-%d %H:%M")
        )
    });
    lines(std::iter::once(header).chain(rows))
}
