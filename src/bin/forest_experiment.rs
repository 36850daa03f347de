//! Trains a stump, tree, or forest from an experiment file and writes the
//! purity report for its data corpus.
//!
//! Usage: `forest_experiment [experiment.toml]`

use anyhow::{Context, Result};
use decision_forest::config::DEFAULT_EXPERIMENT_FILE;
use decision_forest::io::{
    habitable_planet_rule, save_forest, save_tree, write_filtered_indices_file,
    write_purity_report_file,
};
use decision_forest::metrics::evaluate;
use decision_forest::{
    Classifier, DataSet, DataSetLoader, DecisionStump, ExperimentConfig, ExperimentKind, Forest,
    ForestError, SampleWeights, SplitFinderConfig, Tree,
};
use std::path::PathBuf;

fn main() -> Result<()> {
    let path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_EXPERIMENT_FILE));

    let mut experiment = ExperimentConfig::load_from_file(&path)
        .with_context(|| format!("loading experiment {}", path.display()))?;
    experiment.forest.apply_environment_overrides()?;
    experiment.validate()?;

    let level = experiment.forest.verbosity.level_filter().to_string();
    // A RUST_LOG setting takes precedence over the configured verbosity.
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .try_init();
    decision_forest::init()?;

    let loader = DataSetLoader::default().with_delimiter(experiment.delimiter);
    let load = |path: &PathBuf| {
        loader
            .load_path(path)
            .with_context(|| format!("loading corpus {}", path.display()))
    };
    let signal = load(&experiment.signal_path)?;
    let background = load(&experiment.background_path)?;
    let data = load(&experiment.data_path)?;
    log::info!(
        "Loaded {} signal, {} background and {} data points",
        signal.len(),
        background.len(),
        data.len()
    );

    match experiment.kind {
        ExperimentKind::Stump => {
            let stump = DecisionStump::train(&signal, &background)?;
            log::info!(
                "Stump cuts feature {} at {} (score {:.4})",
                stump.feature,
                stump.threshold,
                stump.score
            );
            report(&stump, &experiment, &signal, &background, &data)?;
        }
        ExperimentKind::Tree => {
            let weights = SampleWeights::from_datasets(&signal, &background);
            let mut tree = Tree::train(
                &signal,
                &background,
                &weights,
                SplitFinderConfig::from(&experiment.forest),
            )?;
            let terminals = tree.prune(&signal, &background, experiment.forest.alpha)?;
            log::info!(
                "Tree has {} nodes, {} terminals after pruning ({} nodes suppressed)",
                tree.num_nodes(),
                terminals,
                tree.num_suppressed()
            );
            report(&tree, &experiment, &signal, &background, &data)?;
            if let Some(model_path) = &experiment.model_path {
                save_tree(&tree, model_path)?;
            }
        }
        ExperimentKind::Forest => {
            let mut forest = Forest::new(experiment.forest.clone())?;
            match forest.train(&signal, &background) {
                Ok(()) => {}
                // Keep the rounds completed before the degenerate one.
                Err(err @ ForestError::DegenerateRound { .. }) if !forest.is_empty() => {
                    log::warn!("Stopping after {} trees: {}", forest.len(), err);
                }
                Err(err) => return Err(err.into()),
            }
            report(&forest, &experiment, &signal, &background, &data)?;
            if let Some(filtered_path) = &experiment.filtered_output_path {
                write_filtered_indices_file(&forest, &data, habitable_planet_rule, filtered_path)?;
            }
            if let Some(model_path) = &experiment.model_path {
                save_forest(&forest, model_path)?;
            }
        }
    }

    Ok(())
}

fn report<C: Classifier>(
    model: &C,
    experiment: &ExperimentConfig,
    signal: &DataSet,
    background: &DataSet,
    data: &DataSet,
) -> Result<()> {
    let counts = evaluate(model, signal, background)?;
    log::info!(
        "{} training accuracy {:.4} ({} of {})",
        model.name(),
        counts.accuracy(),
        counts.correct(),
        counts.total()
    );
    write_purity_report_file(model, data, &experiment.output_path)?;
    Ok(())
}
