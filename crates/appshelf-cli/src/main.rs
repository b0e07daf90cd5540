// AppShelf CLI - command-line collaborator for the AppShelf gallery server

mod client;
mod input;

use std::path::PathBuf;

use anyhow::{Context, Result};
use appshelf_core::Artifact;
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;

use client::{ApiClient, StoreStatus, DEFAULT_SERVER};

/// AppShelf - browse, share and preview small web apps
#[derive(Parser)]
#[command(name = "appshelf")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Server base URL
    #[arg(long, global = true, env = "APPSHELF_SERVER", default_value = DEFAULT_SERVER)]
    server: String,

    /// Session token printed by `appshelf login`
    #[arg(long, global = true, env = "APPSHELF_SESSION")]
    session: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List artifacts, newest first
    List {
        /// Only show artifacts whose title or tags contain this term
        #[arg(short, long)]
        search: Option<String>,
    },
    /// Show one artifact including its code
    Show {
        id: String,
    },
    /// Submit a new artifact
    Submit {
        /// File containing the code, or "-" for stdin
        #[arg(long, value_name = "PATH")]
        code_file: String,

        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        author: Option<String>,

        /// Comma-separated tags, e.g. "demo, ui"
        #[arg(long)]
        tags: Option<String>,
    },
    /// Show which backend the server is using
    Status,
    /// Download the sandboxed preview page of an artifact
    Preview {
        id: String,

        #[arg(long, value_enum, default_value_t = Mode::Detail)]
        mode: Mode,

        /// Write to a file instead of stdout
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Sign in as a user; submissions made with the printed token are stamped with this id
    Login {
        user_id: String,
    },
    /// End the session given by --session
    Logout,
}

#[derive(Clone, Copy, ValueEnum)]
enum Mode {
    Tile,
    Detail,
}

impl Mode {
    fn as_str(self) -> &'static str {
        match self {
            Mode::Tile => "tile",
            Mode::Detail => "detail",
        }
    }
}

fn main() {
    let cli = Cli::parse();
    let client = ApiClient::new(&cli.server, cli.session);

    let result = match cli.command {
        Commands::List { search } => handle_list(&client, search.as_deref()),
        Commands::Show { id } => handle_show(&client, &id),
        Commands::Submit {
            code_file,
            title,
            author,
            tags,
        } => handle_submit(&client, &code_file, title, author, tags.as_deref()),
        Commands::Status => handle_status(&client),
        Commands::Preview { id, mode, out } => handle_preview(&client, &id, mode, out),
        Commands::Login { user_id } => handle_login(&client, &user_id),
        Commands::Logout => handle_logout(&client),
    };

    if let Err(e) = result {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn handle_list(client: &ApiClient, search: Option<&str>) -> Result<()> {
    let list = client.list(search)?;
    if list.artifacts.is_empty() {
        match search {
            Some(term) => println!("No apps match '{}'.", term),
            None => println!("No apps yet."),
        }
        return Ok(());
    }

    for artifact in &list.artifacts {
        println!("{}", summary_line(artifact));
    }
    println!();
    println!("{} app(s)", list.count);
    Ok(())
}

fn handle_show(client: &ApiClient, id: &str) -> Result<()> {
    let artifact = client.get(id)?;
    println!("{}", artifact.title.bold());
    println!("  Id:      {}", artifact.id);
    println!("  Author:  {}", artifact.author);
    println!("  Owner:   {}", artifact.owner_id);
    println!("  Created: {}", artifact.created_at.format("%Y-%m-%d %H:%M"));
    if !artifact.tags.is_empty() {
        println!("  Tags:    {}", format_tags(&artifact.tags));
    }
    println!();
    println!("{}", artifact.code);
    Ok(())
}

fn handle_submit(
    client: &ApiClient,
    code_file: &str,
    title: Option<String>,
    author: Option<String>,
    tags: Option<&str>,
) -> Result<()> {
    let code = input::read_code(code_file)?;
    let draft = input::build_draft(code, title, author, tags);
    if draft.is_blank() {
        anyhow::bail!("Please provide code for the app");
    }

    let created = client.submit(&draft)?;
    println!("{} {}", "✓".green().bold(), "App saved".green());
    println!("  Id:  {}", created.id);
    println!("  URL: {}", created.url);
    Ok(())
}

fn handle_status(client: &ApiClient) -> Result<()> {
    let status = client.status()?;
    for line in status_lines(&status) {
        println!("{}", line);
    }
    Ok(())
}

fn handle_preview(client: &ApiClient, id: &str, mode: Mode, out: Option<PathBuf>) -> Result<()> {
    let document = client.preview(id, mode.as_str())?;
    match out {
        Some(path) => {
            std::fs::write(&path, document)
                .with_context(|| format!("Failed to write '{}'", path.display()))?;
            println!("Preview written to {}", path.display());
        }
        None => print!("{}", document),
    }
    Ok(())
}

fn handle_login(client: &ApiClient, user_id: &str) -> Result<()> {
    let session = client.sign_in(user_id)?;
    match session.user {
        Some(user) => println!("{} Signed in as {}", "✓".green(), user.id.cyan()),
        None => println!("{} Signed in", "✓".green()),
    }
    if let Some(token) = session.token {
        println!("  Session: {}", token);
        println!("  export APPSHELF_SESSION={}", token);
    }
    Ok(())
}

fn handle_logout(client: &ApiClient) -> Result<()> {
    client.sign_out()?;
    println!("Signed out");
    Ok(())
}

fn format_tags(tags: &[String]) -> String {
    tags.iter()
        .map(|t| format!("#{}", t))
        .collect::<Vec<_>>()
        .join(" ")
}

/// One line per artifact: id, title, author and tags.
fn summary_line(artifact: &Artifact) -> String {
    let mut line = format!(
        "{:<10} {}  {}",
        artifact.id.as_str().dimmed(),
        artifact.title.bold(),
        format!("by {}", artifact.author).dimmed()
    );
    if !artifact.tags.is_empty() {
        line.push_str("  ");
        line.push_str(&format_tags(&artifact.tags).cyan().to_string());
    }
    line
}

fn status_lines(status: &StoreStatus) -> Vec<String> {
    let mut lines = Vec::new();
    if status.initialized_remote {
        lines.push(format!("{} Connected to remote database", "✓".green().bold()));
    } else {
        lines.push(format!(
            "{} {}",
            "⚠".yellow().bold(),
            "Demo mode: the remote database is not configured. Apps are kept in memory and lost on restart."
                .yellow()
        ));
        if let Some(reason) = &status.fallback_reason {
            lines.push(format!("  Reason: {}", reason));
        }
    }
    lines.push(format!("  Mode:   {}", status.mode));
    if let Some(error) = &status.last_error {
        lines.push(format!("  {} {}", "Last error:".red(), error));
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use appshelf_core::{ArtifactId, Owner};

    fn plain() {
        colored::control::set_override(false);
    }

    #[test]
    fn test_cli_parses_submit() {
        let cli = Cli::try_parse_from([
            "appshelf",
            "submit",
            "--code-file",
            "-",
            "--tags",
            "demo, ui",
        ])
        .unwrap();
        match cli.command {
            Commands::Submit { code_file, tags, title, .. } => {
                assert_eq!(code_file, "-");
                assert_eq!(tags.as_deref(), Some("demo, ui"));
                assert!(title.is_none());
            }
            _ => panic!("expected submit"),
        }
    }

    #[test]
    fn test_preview_mode_defaults_to_detail() {
        let cli = Cli::try_parse_from(["appshelf", "preview", "demo1"]).unwrap();
        match cli.command {
            Commands::Preview { mode, out, .. } => {
                assert_eq!(mode.as_str(), "detail");
                assert!(out.is_none());
            }
            _ => panic!("expected preview"),
        }
    }

    #[test]
    fn test_status_banner_in_demo_mode() {
        plain();
        let lines = status_lines(&StoreStatus {
            initialized_remote: false,
            mode: "fallback".to_string(),
            last_error: None,
            fallback_reason: Some("no database configured".to_string()),
        });
        assert!(lines[0].contains("Demo mode"));
        assert_eq!(lines[1], "  Reason: no database configured");
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn test_status_when_remote() {
        plain();
        let lines = status_lines(&StoreStatus {
            initialized_remote: true,
            mode: "remote".to_string(),
            last_error: Some("Failed to load artifacts: timeout".to_string()),
            fallback_reason: None,
        });
        assert!(lines[0].contains("Connected"));
        assert!(lines.iter().all(|l| !l.contains("Demo mode")));
        assert!(lines[2].contains("timeout"));
    }

    #[test]
    fn test_summary_line_includes_tags() {
        plain();
        let artifact = Artifact {
            id: ArtifactId::new("demo1"),
            title: "Counter".to_string(),
            code: "x".to_string(),
            tags: vec!["demo".to_string(), "counter".to_string()],
            author: "Demo".to_string(),
            created_at: chrono::Utc::now(),
            owner_id: Owner::Anonymous,
        };
        let line = summary_line(&artifact);
        assert!(line.contains("Counter"));
        assert!(line.contains("by Demo"));
        assert!(line.ends_with("#demo #counter"));
    }
}
