use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use rayon::prelude::*;
use sat_ast::{ExpressionKind, Options, PrintMode};
use sat_rewrite::{transform_file, TransformOutput};
use walkdir::WalkDir;

mod logging;

#[derive(Parser)]
#[command(
    name = "tsat",
    about = "tsat: rewrite TypeScript `as` casts and annotated literals to `satisfies`"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rewrite files in place.
    Rewrite {
        /// Files or directories (searched for .ts/.tsx).
        #[arg(required = true)]
        paths: Vec<PathBuf>,
        #[command(flatten)]
        options: OptionArgs,
        /// Report what would change without writing.
        #[arg(long)]
        dry_run: bool,
    },
    /// List every site that would be rewritten.
    Check {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
        #[command(flatten)]
        options: OptionArgs,
    },
    /// Transform one file and emit the result.
    Print {
        input: PathBuf,
        /// Output file (stdout if omitted).
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[command(flatten)]
        options: OptionArgs,
    },
}

#[derive(Args)]
struct OptionArgs {
    /// Only rewrite sites whose type references one of these names.
    #[arg(long, value_delimiter = ',')]
    types: Option<Vec<String>>,
    /// Only rewrite these expression kinds: `declaration`, `cast`.
    #[arg(long, value_delimiter = ',')]
    expressions: Option<Vec<ExpressionKind>>,
    /// Reprint whole files with the code generator instead of splicing edits.
    #[arg(long)]
    reprint: bool,
    /// JSON options file; command-line flags take precedence.
    #[arg(long)]
    config: Option<PathBuf>,
}

impl OptionArgs {
    fn resolve(&self) -> Result<Options> {
        let mut options = match &self.config {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .with_context(|| format!("failed to read config {}", path.display()))?;
                serde_json::from_str(&text)
                    .with_context(|| format!("invalid config {}", path.display()))?
            }
            None => Options::default(),
        };
        if let Some(types) = &self.types {
            options = options.with_types(types.iter().cloned());
        }
        if let Some(kinds) = &self.expressions {
            options = options.with_expressions(kinds.iter().copied());
        }
        if self.reprint {
            options = options.with_print(PrintMode::Reprint);
        }
        tracing::debug!(?options, "resolved options");
        Ok(options)
    }
}

/// Expand directories into the TypeScript files below them.
fn discover(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for path in paths {
        if !path.is_dir() {
            files.push(path.clone());
            continue;
        }
        let entries = WalkDir::new(path)
            .into_iter()
            .filter_entry(|entry| entry.file_name() != "node_modules")
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file());
        for entry in entries {
            if is_typescript(entry.path()) {
                files.push(entry.into_path());
            }
        }
    }
    files.sort();
    files.dedup();
    files
}

fn is_typescript(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    (name.ends_with(".ts") || name.ends_with(".tsx")) && !name.ends_with(".d.ts")
}

fn process(path: &Path, options: &Options) -> Result<TransformOutput> {
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    transform_file(&source, &path.display().to_string(), options)
}

/// Transform all files in parallel, keeping input order.
fn process_all(files: &[PathBuf], options: &Options) -> Vec<(PathBuf, Result<TransformOutput>)> {
    files
        .par_iter()
        .map(|path| (path.clone(), process(path, options)))
        .collect()
}

fn main() -> Result<()> {
    logging::init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Rewrite {
            paths,
            options,
            dry_run,
        } => {
            let options = options.resolve()?;
            let files = discover(&paths);

            let mut changed = 0;
            let mut failed = 0;
            for (path, result) in process_all(&files, &options) {
                match result {
                    Ok(output) if output.changed() => {
                        if !dry_run {
                            std::fs::write(&path, &output.code)
                                .with_context(|| format!("failed to write {}", path.display()))?;
                        }
                        println!("{}: {} rewrite(s)", path.display(), output.rewrites.len());
                        changed += 1;
                    }
                    Ok(_) => {}
                    Err(e) => {
                        eprintln!("{}: {e:#}", path.display());
                        failed += 1;
                    }
                }
            }

            let verb = if dry_run { "would change" } else { "changed" };
            eprintln!(
                "{} file(s) scanned, {changed} {verb}, {failed} failed",
                files.len()
            );
            if failed > 0 {
                bail!("{failed} file(s) could not be processed");
            }
        }
        Commands::Check { paths, options } => {
            let options = options.resolve()?;
            let files = discover(&paths);

            let mut sites = 0;
            let mut failed = 0;
            for (path, result) in process_all(&files, &options) {
                match result {
                    Ok(output) => {
                        for rewrite in &output.rewrites {
                            println!(
                                "{}:{}: {} satisfies {}",
                                path.display(),
                                rewrite.line,
                                rewrite.kind,
                                rewrite.type_text
                            );
                        }
                        sites += output.rewrites.len();
                    }
                    Err(e) => {
                        eprintln!("{}: {e:#}", path.display());
                        failed += 1;
                    }
                }
            }

            eprintln!("{sites} site(s) in {} file(s)", files.len());
            if failed > 0 {
                bail!("{failed} file(s) could not be processed");
            }
        }
        Commands::Print {
            input,
            output,
            options,
        } => {
            let options = options.resolve()?;
            let transformed = process(&input, &options)?;

            match &output {
                Some(path) => std::fs::write(path, &transformed.code)
                    .with_context(|| format!("failed to write {}", path.display()))?,
                None => print!("{}", transformed.code),
            }
        }
    }

    Ok(())
}
