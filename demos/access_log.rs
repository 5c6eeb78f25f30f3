use std::io;

use streamsketch::access_log::load_field_from_path;
use streamsketch::comparison::compare;
use streamsketch::{Error, Result};
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

const DEFAULT_LOG_PATH: &str = "lms-stage-access.log";
const DEFAULT_FIELD: &str = "remote_addr";
const DEFAULT_RELATIVE_ERROR: f64 = 0.01;

/// Comparison settings, from `--log`, `--field` and `--error` arguments
/// or `LOG_PATH`, `LOG_FIELD` and `RELATIVE_ERROR` environment variables.
#[derive(Debug, PartialEq)]
struct Config {
    log_path: String,
    field: String,
    relative_error: f64,
}

impl Config {
    fn from_env(args: &[String]) -> Result<Self> {
        Self::from_lookup(args, |var| std::env::var(var).ok())
    }

    /// Arguments win over variables, defaults apply only when both are absent
    fn from_lookup(args: &[String], var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let lookup = |flag: &'static str, name: &str| -> Result<Option<String>> {
            match args.iter().position(|a| a == flag) {
                Some(pos) => match args.get(pos + 1) {
                    Some(value) => Ok(Some(value.clone())),
                    None => Err(Error::InvalidParameter {
                        name: flag,
                        reason: "missing value".to_string(),
                    }),
                },
                None => Ok(var(name)),
            }
        };

        let relative_error = match lookup("--error", "RELATIVE_ERROR")? {
            Some(value) => value.parse().map_err(|e| Error::InvalidParameter {
                name: "relative_error",
                reason: format!("`{value}`: {e}"),
            })?,
            None => DEFAULT_RELATIVE_ERROR,
        };

        Ok(Config {
            log_path: lookup("--log", "LOG_PATH")?.unwrap_or_else(|| DEFAULT_LOG_PATH.into()),
            field: lookup("--field", "LOG_FIELD")?.unwrap_or_else(|| DEFAULT_FIELD.into()),
            relative_error,
        })
    }
}

fn run(args: &[String]) -> Result<()> {
    let config = Config::from_env(args)?;
    let values = load_field_from_path(&config.log_path, &config.field)?;
    println!(
        "{} values of `{}` loaded from {}.",
        values.len(),
        config.field,
        config.log_path
    );

    let comparison = compare(&values, config.relative_error)?;
    info!(
        relative_error = comparison.relative_error(),
        "estimate compared against exact count"
    );

    println!();
    println!("{}", comparison.to_table());
    Ok(())
}

fn main() {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_writer(io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber");

    let args: Vec<String> = std::env::args().collect();
    if let Err(e) = run(&args) {
        error!("Comparison failed: {}", e);
        std::process::exit(1);
    }
}
