use enum_dispatch::enum_dispatch;

use crate::estimator::CardinalityEstimator;
use crate::exact::ExactCardinality;

/// Distinct counters driven side by side by the comparison harness
#[enum_dispatch]
pub trait DistinctCounter {
    fn insert_str(&mut self, item: &str);
    fn estimate(&self) -> f64;
    fn size_of(&self) -> usize;
    fn name(&self) -> &'static str;
    fn to_string(&self) -> String {
        format!("{}: estimate: {:.1}, size: {}", self.name(), self.estimate(), self.size_of())
    }
}

/// Counter types supported by the comparison harness
#[derive(Debug)]
#[enum_dispatch(DistinctCounter)]
pub enum Counter {
    Exact(ExactCardinality<String>),
    Estimated(CardinalityEstimator),
}

impl DistinctCounter for ExactCardinality<String> {
    #[inline]
    fn insert_str(&mut self, item: &str) {
        ExactCardinality::insert_str(self, item);
    }

    fn estimate(&self) -> f64 {
        self.count() as f64
    }

    fn size_of(&self) -> usize {
        ExactCardinality::size_of(self)
    }

    fn name(&self) -> &'static str {
        "exact"
    }
}

impl DistinctCounter for CardinalityEstimator {
    #[inline]
    fn insert_str(&mut self, item: &str) {
        self.insert(item);
    }

    fn estimate(&self) -> f64 {
        CardinalityEstimator::estimate(self)
    }

    fn size_of(&self) -> usize {
        CardinalityEstimator::size_of(self)
    }

    fn name(&self) -> &'static str {
        "hyperloglog"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatch() {
        let mut counters: Vec<Counter> = vec![
            ExactCardinality::<String>::new().into(),
            CardinalityEstimator::new(0.01).unwrap().into(),
        ];
        for counter in counters.iter_mut() {
            for ip in ["10.0.0.1", "10.0.0.2", "10.0.0.1"] {
                counter.insert_str(ip);
            }
        }

        assert_eq!(counters[0].name(), "exact");
        assert_eq!(counters[0].estimate(), 2.0);
        assert_eq!(counters[1].name(), "hyperloglog");
        assert_eq!(counters[1].estimate().round(), 2.0);
        assert_eq!(
            DistinctCounter::to_string(&counters[0]),
            "exact: estimate: 2.0, size: ".to_string() + &counters[0].size_of().to_string()
        );
    }
}
