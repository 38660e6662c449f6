mod commands;
mod core;
mod metadata;
mod release;
mod ui;
mod utils;
mod validation;

use clap::{Parser, Subcommand};
use core::error::{MpError, print_error};
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Build, validate and package marketplace integrations
#[derive(Parser)]
#[command(name = "mp")]
#[command(version, about, long_about = None)]
#[command(styles = get_styles())]
struct Cli {
  /// Debug logging (overrides RUST_LOG)
  #[arg(long, global = true)]
  verbose: bool,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Build non-built integration sources into deployable artifacts
  Build {
    /// Integrations to build (directory names under the source root)
    names: Vec<String>,
    /// Build every integration
    #[arg(long, conflicts_with = "names")]
    all: bool,
  },

  /// Turn a built integration back into non-built sources
  Deconstruct {
    /// Built integration to deconstruct
    name: String,
    /// Output directory (default: the integration's source directory)
    #[arg(long)]
    out: Option<PathBuf>,
  },

  /// Validate integrations and their version bumps
  Validate {
    /// Integrations to validate
    names: Vec<String>,
    /// Validate every integration
    #[arg(long, conflicts_with_all = ["names", "changed"])]
    all: bool,
    /// Validate integrations changed relative to the base ref
    #[arg(long, conflicts_with = "names")]
    changed: bool,
    /// Base ref for the version bump check (default: git.base_ref from mp.toml, or main)
    #[arg(long)]
    base: Option<String>,
    /// Output results in JSON format
    #[arg(long)]
    json: bool,
  },

  /// Rebuild the archive of a released integration version from git history
  Package {
    /// Integration identifier
    #[arg(short, long)]
    integration: String,
    /// Released version, e.g. 12.0
    #[arg(short, long)]
    version: String,
    /// Directory the archive is written to (must exist; default: repository root)
    #[arg(short, long)]
    dir: Option<PathBuf>,
    /// Require release notes in the packaged version
    #[arg(long)]
    raise_python_migration_rn: bool,
    /// Output the package report in JSON format
    #[arg(long)]
    json: bool,
  },
}

fn get_styles() -> clap::builder::Styles {
  clap::builder::Styles::styled()
    .usage(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow))),
    )
    .header(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow))),
    )
    .literal(anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))))
    .invalid(
      anstyle::Style::new()
        .bold()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))),
    )
    .error(
      anstyle::Style::new()
        .bold()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))),
    )
    .valid(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))),
    )
    .placeholder(anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::White))))
}

/// Logs go to stderr so stdout stays clean for summaries and `--json`
fn init_tracing(verbose: bool) {
  let directives = if verbose {
    "mp=debug".to_string()
  } else {
    std::env::var("RUST_LOG").unwrap_or_else(|_| "mp=info".into())
  };

  tracing_subscriber::registry()
    .with(EnvFilter::new(directives))
    .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
    .init();
}

fn main() {
  let cli = Cli::parse();
  init_tracing(cli.verbose);

  let result = match cli.command {
    Commands::Build { names, all } => commands::run_build(names, all),
    Commands::Deconstruct { name, out } => commands::run_deconstruct(name, out),
    Commands::Validate {
      names,
      all,
      changed,
      base,
      json,
    } => commands::run_validate(names, all, changed, base, json),
    Commands::Package {
      integration,
      version,
      dir,
      raise_python_migration_rn,
      json,
    } => commands::run_package(integration, version, dir, raise_python_migration_rn, json),
  };

  if let Err(err) = result {
    handle_error(err);
  }
}

fn handle_error(err: MpError) -> ! {
  print_error(&err);
  std::process::exit(err.exit_code().as_i32());
}
