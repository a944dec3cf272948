//! beheader CLI
//!
//! Preprocesses a C source file and prints the result.

use std::{fs, io::Write, path::PathBuf};

use anyhow::{Context, Result};
use beheader::{Config, MacroDefinition, Preprocessor};
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "beheader")]
#[command(author, version, about = "A C preprocessor", long_about = None)]
struct Cli {
    /// Source file to preprocess
    #[arg(value_name = "FILE")]
    file: PathBuf,

    /// Add a directory to the #include search path
    #[arg(short = 'I', value_name = "DIR")]
    include: Vec<PathBuf>,

    /// Define a macro, as NAME or NAME=VALUE
    #[arg(short = 'D', value_name = "NAME[=VALUE]")]
    define: Vec<MacroDefinition>,

    /// Undefine a macro
    #[arg(short = 'U', value_name = "NAME")]
    undefine: Vec<String>,

    /// Do not replace trigraphs
    #[arg(long)]
    no_trigraphs: bool,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = Config::default().trigraphs(!cli.no_trigraphs);
    config.include_dirs = cli.include;
    config.defines = cli.define;
    config.undefines = cli.undefine;

    let mut preprocessor = Preprocessor::new(config)?;
    let output = preprocessor
        .preprocess_file(&cli.file)
        .with_context(|| format!("failed to preprocess {}", cli.file.display()))?;

    match cli.output {
        Some(path) => fs::write(&path, output.to_string())
            .with_context(|| format!("failed to write {}", path.display()))?,
        None => std::io::stdout().write_all(output.to_string().as_bytes())?,
    }

    Ok(())
}
