//! Line-delimited JSON record source.
//!
//! Each line of an access log is expected to be one JSON object. Only the requested
//! field is kept; lines that fail to parse (including lines that are not valid UTF-8)
//! or do not carry the field as a string are skipped.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use serde_json::Value;
use tracing::{debug, trace};

use crate::error::Result;

/// Extract `field` from every JSON line of `reader`
pub fn load_field<R: BufRead>(reader: R, field: &str) -> Result<Vec<String>> {
    let mut values = Vec::new();
    let mut malformed = 0usize;
    let mut missing = 0usize;

    for (line_no, line) in reader.split(b'\n').enumerate() {
        let line = line?;
        let mut entry = match serde_json::from_slice::<Value>(&line) {
            Ok(entry) => entry,
            Err(err) => {
                trace!(line = line_no + 1, %err, "skipping malformed record");
                malformed += 1;
                continue;
            }
        };

        match entry.get_mut(field).map(Value::take) {
            Some(Value::String(value)) => values.push(value),
            _ => missing += 1,
        }
    }

    debug!(
        field,
        loaded = values.len(),
        malformed,
        missing,
        "loaded records"
    );

    Ok(values)
}

/// Extract `field` from every JSON line of the file at `path`
pub fn load_field_from_path(path: impl AsRef<Path>, field: &str) -> Result<Vec<String>> {
    let file = File::open(path.as_ref())?;
    load_field(BufReader::new(file), field)
}
