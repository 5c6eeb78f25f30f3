//! Side by side run of the exact baseline and the cardinality estimator over the same values.

use std::time::{Duration, Instant};

use tabled::settings::{Settings, Style};
use tabled::{Table, Tabled};
use tracing::debug;

use crate::counter::{Counter, DistinctCounter};
use crate::error::Result;
use crate::estimator::CardinalityEstimator;
use crate::exact::ExactCardinality;

/// Outcome of running one counter over all values
#[derive(Debug, Clone, PartialEq)]
pub struct Measurement {
    pub counter: &'static str,
    pub unique: f64,
    pub elapsed: Duration,
    pub size: usize,
}

/// Exact and estimated counts of the same values
#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    pub values: usize,
    pub exact: Measurement,
    pub estimated: Measurement,
}

#[derive(Tabled)]
struct Record {
    counter: &'static str,
    unique_items: String,
    elapsed_secs: String,
    size_bytes: usize,
}

impl From<&Measurement> for Record {
    fn from(m: &Measurement) -> Self {
        Record {
            counter: m.counter,
            unique_items: format!("{:.1}", m.unique),
            elapsed_secs: format!("{:.6}", m.elapsed.as_secs_f64()),
            size_bytes: m.size,
        }
    }
}

/// Feed every value into `counter` and time it
pub fn measure<S: AsRef<str>>(mut counter: Counter, values: &[S]) -> Measurement {
    let start = Instant::now();
    for value in values {
        counter.insert_str(value.as_ref());
    }
    let unique = counter.estimate();
    let elapsed = start.elapsed();

    debug!(counter = counter.name(), unique, ?elapsed, "counted values");

    Measurement {
        counter: counter.name(),
        unique,
        elapsed,
        size: counter.size_of(),
    }
}

/// Count distinct `values` exactly and with a `relative_error` cardinality estimator
pub fn compare<S: AsRef<str>>(values: &[S], relative_error: f64) -> Result<Comparison> {
    let estimator = CardinalityEstimator::new(relative_error)?;
    let exact = measure(ExactCardinality::<String>::new().into(), values);
    let estimated = measure(estimator.into(), values);

    Ok(Comparison {
        values: values.len(),
        exact,
        estimated,
    })
}

impl Comparison {
    /// Relative error of the estimate against the exact count
    pub fn relative_error(&self) -> f64 {
        if self.exact.unique == 0.0 {
            return 0.0;
        }
        (self.estimated.unique - self.exact.unique).abs() / self.exact.unique
    }

    /// Render both measurements as a markdown table
    pub fn to_table(&self) -> String {
        let records = [Record::from(&self.exact), Record::from(&self.estimated)];
        let table_config = Settings::default().with(Style::markdown());
        Table::new(records).with(table_config).to_string()
    }
}
