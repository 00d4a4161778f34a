//! EMAT scope CLI
//!
//! Command-line interface for:
//! - Validating scope files (structure, bounds, categories)
//! - Printing human-readable summaries and variable name lists
//! - Writing canonical dumps (optionally filtering measures)
//! - Exporting effective defaults as JSON

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use emat_scope::digest::scope_digest_v1;
use emat_scope::{dump_scope, dump_scope_to_file, DumpOptions, Scope};

mod report;

#[derive(Parser)]
#[command(name = "emat-scope")]
#[command(author, version, about = "EMAT scope definitions: validate, inspect, dump")]
struct Cli {
    /// Log at debug level (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a scope file and print a summary
    Validate {
        /// Input scope YAML
        input: PathBuf,
        /// Emit the summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the multi-line scope summary
    Info {
        /// Input scope YAML
        input: PathBuf,
    },

    /// List variable names, one per line
    Names {
        /// Input scope YAML
        input: PathBuf,
        /// Which variables to list
        #[arg(long, value_enum, default_value_t = NameGroup::All)]
        group: NameGroup,
    },

    /// Write the canonical YAML dump
    Dump {
        /// Input scope YAML
        input: PathBuf,
        /// Output file (must not exist); stdout when omitted
        #[arg(short, long)]
        out: Option<PathBuf>,
        /// Drop measure transforms
        #[arg(long)]
        strip_transforms: bool,
        /// Only keep these measures (repeatable)
        #[arg(long = "include")]
        include: Vec<String>,
        /// Skip these measures (repeatable)
        #[arg(long = "exclude")]
        exclude: Vec<String>,
    },

    /// Print effective parameter defaults as a JSON object
    Defaults {
        /// Input scope YAML
        input: PathBuf,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum NameGroup {
    All,
    Parameters,
    Uncertainties,
    Levers,
    Constants,
    Measures,
}

fn init_tracing(verbose: bool) {
    let filter = if verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .without_time()
                .with_writer(std::io::stderr),
        )
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Validate { input, json } => cmd_validate(&input, json),
        Commands::Info { input } => {
            let scope = load(&input)?;
            print!("{}", scope.info());
            Ok(())
        }
        Commands::Names { input, group } => cmd_names(&input, group),
        Commands::Dump {
            input,
            out,
            strip_transforms,
            include,
            exclude,
        } => cmd_dump(&input, out.as_deref(), strip_transforms, include, exclude),
        Commands::Defaults { input } => {
            let scope = load(&input)?;
            let defaults = report::effective_defaults(&scope);
            println!("{}", serde_json::to_string_pretty(&defaults)?);
            Ok(())
        }
    }
}

fn load(input: &Path) -> Result<Scope> {
    let scope = Scope::from_yaml_file(input)
        .with_context(|| format!("invalid scope file {}", input.display()))?;
    tracing::debug!(scope = %scope, "loaded");
    Ok(scope)
}

fn cmd_validate(input: &Path, json: bool) -> Result<()> {
    let scope = load(input)?;
    let digest = scope_digest_v1(&scope)?;

    if json {
        let summary = report::ScopeSummaryV1::new(&scope, digest);
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("{} {}", "Validating".green().bold(), input.display());
    println!("  Scope: {}", scope.name().cyan());
    println!("  Constants: {}", scope.constants().len());
    println!("  Uncertainties: {}", scope.uncertainties().len());
    println!("  Levers: {}", scope.levers().len());
    println!("  Measures: {}", scope.measures().len());
    println!("  Digest: {}", digest.yellow());
    println!("{}", "Valid.".green());
    Ok(())
}

fn cmd_names(input: &Path, group: NameGroup) -> Result<()> {
    let scope = load(input)?;
    let names = match group {
        NameGroup::All => scope.all_names(),
        NameGroup::Parameters => scope.parameter_names(),
        NameGroup::Uncertainties => scope.uncertainty_names(),
        NameGroup::Levers => scope.lever_names(),
        NameGroup::Constants => scope.constant_names(),
        NameGroup::Measures => scope.measure_names(),
    };
    for name in names {
        println!("{name}");
    }
    Ok(())
}

fn cmd_dump(
    input: &Path,
    out: Option<&Path>,
    strip_transforms: bool,
    include: Vec<String>,
    exclude: Vec<String>,
) -> Result<()> {
    let scope = load(input)?;
    let options = DumpOptions {
        strip_measure_transforms: strip_transforms,
        include_measures: (!include.is_empty()).then(|| include.into_iter().collect::<BTreeSet<_>>()),
        exclude_measures: (!exclude.is_empty()).then(|| exclude.into_iter().collect::<BTreeSet<_>>()),
    };

    match out {
        Some(path) => {
            dump_scope_to_file(&scope, path, &options)?;
            eprintln!("{} {}", "Wrote".green().bold(), path.display());
        }
        None => print!("{}", dump_scope(&scope, &options)?),
    }
    Ok(())
}
