//! @ai:module:intent CLI entry point for compiling annotated API docs and their changelog
//! @ai:module:layer presentation
//! @ai:module:public_api main
//! @ai:module:depends_on compiler, changelog, source, config, output

use anyhow::{Context, Result};
use apidoc_compiler::{
    output, Changelog, CompileOptions, Compiler, Config, FileDocSource, OutputFormat, Version,
};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "apidoc")]
#[command(author, version, about = "Compile versioned API documentation from annotated doc comments")]
struct Cli {
    /// Path to the project configuration
    #[arg(long, short, global = true, default_value = "apidoc.toml")]
    config: PathBuf,

    /// Log compiler progress to stderr
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile every configured controller for each version
    Compile {
        #[command(flatten)]
        filters: Filters,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: Format,
    },

    /// Show what changed between consecutive versions
    Changelog {
        #[command(flatten)]
        filters: Filters,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: Format,

        /// Fail with exit code 1 if two error responses cannot be told apart
        #[arg(long, default_value = "false")]
        fail_on_duplicates: bool,
    },

    /// Show the annotations built from one class or method docblock
    Parse {
        /// Controller or representation class
        class: String,

        /// Method name; omit for the class docblock
        method: Option<String>,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: Format,
    },
}

#[derive(Args)]
struct Filters {
    /// Include annotations marked private
    #[arg(long)]
    private: bool,

    /// Only include items whose vendor tags are all in this list (repeatable)
    #[arg(long = "vendor-tag")]
    vendor_tags: Vec<String>,

    /// Exclude every vendor-tagged item
    #[arg(long, conflicts_with = "vendor_tags")]
    no_vendor_tags: bool,

    /// Only compile versions matching this constraint, e.g. `1.1` or `1.1 - 1.2`
    #[arg(long = "api-version")]
    api_version: Option<String>,
}

impl Filters {
    fn options(&self) -> Result<CompileOptions> {
        let vendor_tags = if self.no_vendor_tags {
            Some(Vec::new())
        } else if self.vendor_tags.is_empty() {
            None
        } else {
            Some(self.vendor_tags.clone())
        };
        let version = self
            .api_version
            .as_deref()
            .map(Version::parse)
            .transpose()
            .context("Invalid --api-version")?;

        Ok(CompileOptions {
            load_private: self.private,
            vendor_tags,
            version,
        })
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Json,
    JsonPretty,
}

impl From<Format> for OutputFormat {
    fn from(f: Format) -> Self {
        match f {
            Format::Text => OutputFormat::Text,
            Format::Json => OutputFormat::Json,
            Format::JsonPretty => OutputFormat::JsonPretty,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(format!("apidoc_compiler={}", level))),
        )
        .init();

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(2)
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    let config = Config::load(&cli.config)
        .with_context(|| format!("Failed to load {}", cli.config.display()))?;
    let root = config.source_dir.clone().unwrap_or_else(|| {
        cli.config
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .unwrap_or(Path::new("."))
            .to_path_buf()
    });
    let source = FileDocSource::open(&root)
        .with_context(|| format!("Failed to index sources under {}", root.display()))?;

    match cli.command {
        Commands::Compile { filters, format } => {
            let compiled = Compiler::new(&config, &source)
                .with_options(filters.options()?)
                .compile()?;
            println!("{}", output::format_compiled(&compiled, format.into()));
            Ok(ExitCode::SUCCESS)
        }

        Commands::Changelog {
            filters,
            format,
            fail_on_duplicates,
        } => {
            let compiled = Compiler::new(&config, &source)
                .with_options(filters.options()?)
                .compile()?;
            let changelog = Changelog::build(&compiled, &config);
            println!("{}", output::format_changelog(&changelog, format.into()));

            if fail_on_duplicates && !changelog.duplicate_error_responses().is_empty() {
                Ok(ExitCode::from(1))
            } else {
                Ok(ExitCode::SUCCESS)
            }
        }

        Commands::Parse {
            class,
            method,
            format,
        } => {
            let blocks = Compiler::new(&config, &source).parse(&class, method.as_deref())?;
            println!("{}", output::format_blocks(&blocks, format.into()));
            Ok(ExitCode::SUCCESS)
        }
    }
}
