//! `docmeta` compiles document class declarations into a metadata descriptor.

use clap::{ArgAction, Parser, Subcommand};
use docmeta_config::{Config, ConfigError, DEFAULT_CONFIG_FILE};
use docmeta_schema::{MetadataFactory, Schema};
use std::{
    fs, io,
    path::{Path, PathBuf},
    process,
};
use thiserror::Error as ThisError;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Debug, Parser)]
#[command(name = "docmeta", version, about = "Resolve document class metadata")]
struct Cli {
    /// Raise log verbosity (-v info, -vv debug); RUST_LOG overrides
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Compile the configured classes and write the metadata descriptor
    Compile {
        #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
        config: PathBuf,

        /// Write here instead of the configured output (stdout if neither)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Compile the configured classes and report the first error, if any
    Check {
        #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
        config: PathBuf,
    },
}

///
/// CliError
///

#[derive(Debug, ThisError)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to render descriptor: {0}")]
    Render(#[from] serde_json::Error),

    #[error("failed to write '{}': {source}", .path.display())]
    Write { path: PathBuf, source: io::Error },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Command::Compile { config, output } => run_compile(&config, output),
        Command::Check { config } => run_check(&config),
    };

    if let Err(err) = result {
        error!("{err}");
        process::exit(1);
    }
}

// init_logging
// logs go to stderr so the descriptor can be piped from stdout
fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn run_compile(config_path: &Path, output: Option<PathBuf>) -> Result<(), CliError> {
    let config = Config::load(config_path)?;
    let schema = config.compile()?;

    let factory = MetadataFactory::new(config.factory_name(), &schema);
    let rendered = factory.to_json_pretty()?;

    match output.or_else(|| config.output_path()) {
        Some(path) => {
            if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
                fs::create_dir_all(dir).map_err(|source| CliError::Write {
                    path: dir.to_path_buf(),
                    source,
                })?;
            }
            fs::write(&path, rendered).map_err(|source| CliError::Write {
                path: path.clone(),
                source,
            })?;
            info!(
                path = %path.display(),
                factory = factory.name(),
                classes = factory.classes().len(),
                "descriptor written"
            );
        }
        None => println!("{rendered}"),
    }

    Ok(())
}

fn run_check(config_path: &Path) -> Result<(), CliError> {
    let config = Config::load(config_path)?;
    let schema = config.compile()?;

    println!("{}", summary(&schema));

    Ok(())
}

fn summary(schema: &Schema) -> String {
    let persistable = schema.persistable().count();
    let embedded = schema.embedded().count();

    let mut lines = vec![format!(
        "ok: {} classes ({persistable} persistable, {embedded} embedded)",
        schema.len()
    )];

    // one line per inheritance tree, subclasses nested under their parent
    for (name, class) in schema.classes() {
        if class.inheritable.is_some() && !class.is_subclass() {
            push_tree(schema, name, 1, &mut lines);
        }
    }

    lines.join("\n")
}

fn push_tree(schema: &Schema, name: &str, depth: usize, lines: &mut Vec<String>) {
    lines.push(format!("{}{name}", "  ".repeat(depth)));

    for (subclass, _) in schema.subclasses_of(name) {
        push_tree(schema, subclass, depth + 1, lines);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docmeta_schema::{NameRegistry, RawSchema, compile};
    use serde_json::{Value, json};

    fn schema(value: Value) -> Schema {
        let Value::Object(map) = value else {
            panic!("test input must be a map");
        };
        let raw: RawSchema = map.into_iter().collect();

        compile(
            &raw,
            &NameRegistry::builtin_types(),
            &NameRegistry::builtin_id_generators(),
        )
        .expect("valid schema")
    }

    #[test]
    fn summary_counts_classes_and_nests_subclasses() {
        let schema = schema(json!({
            "Article": { "inheritable": { "type": "single" } },
            "News": {
                "inheritable": { "type": "single" },
                "inheritance": { "class": "Article", "value": "news" },
            },
            "Flash": { "inheritance": { "class": "News", "value": "flash" } },
            "Review": { "inheritance": { "class": "Article", "value": "review" } },
            "Address": { "isEmbedded": true },
        }));

        assert_eq!(
            summary(&schema),
            "ok: 5 classes (4 persistable, 1 embedded)\n  Article\n    News\n      Flash\n    Review"
        );
    }

    #[test]
    fn verbosity_flags_are_counted() {
        let cli = Cli::try_parse_from(["docmeta", "-vv", "check"]).expect("valid args");

        assert_eq!(cli.verbose, 2);
        let Command::Check { config } = cli.command else {
            panic!("expected the check command");
        };
        assert_eq!(config, PathBuf::from(DEFAULT_CONFIG_FILE));
    }
}
