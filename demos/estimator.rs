use streamsketch::{CardinalityEstimator, Result};

fn main() -> Result<()> {
    let mut estimator = CardinalityEstimator::new(0.01)?;
    for i in 0..10 {
        estimator.insert(&i);
    }
    println!("estimate after 10 items = {:.1}", estimator.estimate());

    for i in 0..100_000 {
        estimator.insert(&(i % 50_000));
    }
    println!(
        "estimate after 50000 distinct items = {:.1} ({} registers, standard error {:.4})",
        estimator.estimate(),
        estimator.register_count(),
        estimator.standard_error()
    );

    Ok(())
}
