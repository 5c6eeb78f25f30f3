use std::fmt::Display;
use std::io;
use std::str::FromStr;

use serde_json::{json, Value};
use streamsketch::{classify, Error, MembershipFilter, Result};
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

const DEFAULT_BITS: usize = 1000;
const DEFAULT_HASHES: u32 = 3;

/// Parse the value following `flag`, `None` when the flag is not given
fn arg<T>(args: &[String], flag: &'static str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: Display,
{
    let Some(pos) = args.iter().position(|a| a == flag) else {
        return Ok(None);
    };
    let value = args.get(pos + 1).ok_or_else(|| Error::InvalidParameter {
        name: flag,
        reason: "missing value".to_string(),
    })?;
    value.parse().map(Some).map_err(|e| Error::InvalidParameter {
        name: flag,
        reason: format!("`{value}`: {e}"),
    })
}

fn run(args: &[String]) -> Result<()> {
    let num_bits = arg(args, "--bits")?.unwrap_or(DEFAULT_BITS);
    let num_hashes = arg(args, "--hashes")?.unwrap_or(DEFAULT_HASHES);

    let mut filter = MembershipFilter::new(num_bits, num_hashes)?;
    for password in ["password123", "admin123", "qwerty123"] {
        filter.add(password);
    }
    info!(?filter, "loaded existing passwords");

    let candidates = vec![
        json!("password123"),
        json!("newpassword"),
        json!("admin123"),
        json!("guest"),
        json!(""),
        Value::Null,
        json!("  "),
    ];

    for (password, status) in classify(&mut filter, &candidates) {
        println!("password {} - {}", password, status);
    }

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
        error!("Password check failed: {}", e);
        std::process::exit(1);
    }
}
