//! Train the stemness classifier and write SHAP interpretation tables.
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::{debug, info, warn};

use stemscape_classifiers::data_handling::{FeatureMatrix, SampleTable, TableRole};
use stemscape_classifiers::explain::{PositiveClassShap, TreeExplainer};
use stemscape_classifiers::io::load_sample_table;
use stemscape_classifiers::models::{ClassifierModel, RandomForestClassifier};
use stemscape_classifiers::preprocessing::{FeatureEncoder, LabelEncoder};
use stemscape_classifiers::report::{
    build_importance_table, write_importance_table, write_shap_table, FEATURE_IMPORTANCE_FILE,
    TESTING_SHAP_FILE, TRAINING_SHAP_FILE,
};
use stemscape_classifiers::stats;

use crate::stemness::input::StemnessConfig;

/// Tolerance for `baseline + sum(attributions)` against the predicted probability.
pub const ADDITIVITY_TOLERANCE: f64 = 1e-6;

/// Outcome of a completed run.
#[derive(Debug, Clone)]
pub struct PipelineSummary {
    pub output_dir: PathBuf,
    pub n_train: usize,
    pub n_test: usize,
    pub n_features: usize,
    pub baseline: f64,
    pub files: Vec<PathBuf>,
}

/// Run load -> encode -> train -> explain -> write for one configuration.
///
/// Both tables are loaded and encoded before the output directory is
/// created, so configuration errors leave nothing behind.
pub fn run_pipeline(config: &StemnessConfig) -> Result<PipelineSummary> {
    let columns = config.table_columns();
    let mut label_encoder = LabelEncoder::new();

    let train_table = load_sample_table(
        &config.train_data,
        &columns,
        TableRole::Training,
        &mut label_encoder,
    )
    .with_context(|| format!("Failed to load training data: {}", config.train_data.display()))?;

    let test_table = load_sample_table(
        &config.test_data,
        &columns,
        TableRole::Scoring,
        &mut label_encoder,
    )
    .with_context(|| format!("Failed to load testing data: {}", config.test_data.display()))?;

    let (feature_encoder, x_train) = FeatureEncoder::fit_transform(&train_table)
        .with_context(|| format!("Failed to encode features of '{}'", train_table.source))?;
    let x_test = feature_encoder
        .transform(&test_table)
        .with_context(|| format!("Failed to encode features of '{}'", test_table.source))?;

    log_input_summary(&train_table, &test_table, &label_encoder, &feature_encoder);

    // `load_sample_table` guarantees labels for the training role.
    let y_train = train_table
        .labels
        .as_deref()
        .context("Training table has no labels")?;

    let model = RandomForestClassifier::fit(&config.settings.forest, &x_train, y_train)
        .context("Failed to fit random forest")?;

    let explainer = TreeExplainer::new(&model);

    fs::create_dir_all(&config.output_dir).with_context(|| {
        format!(
            "Failed to create output directory: {}",
            config.output_dir.display()
        )
    })?;

    let train_path = config.output_dir.join(TRAINING_SHAP_FILE);
    let (_, train_shap) =
        explain_and_write(&model, &explainer, &train_table, &x_train, &train_path)?;

    let test_path = config.output_dir.join(TESTING_SHAP_FILE);
    let (test_predictions, test_shap) =
        explain_and_write(&model, &explainer, &test_table, &x_test, &test_path)?;
    debug_assert_eq!(train_shap.baseline, test_shap.baseline);

    if let Some(y_test) = test_table.labels.as_deref() {
        log_evaluation(&test_predictions, y_test);
    }

    let importance_rows = build_importance_table(
        x_train.schema(),
        &model.feature_importances(),
        &train_shap.mean_abs(),
    )?;
    let importance_path = config.output_dir.join(FEATURE_IMPORTANCE_FILE);
    write_importance_table(&importance_path, &importance_rows)
        .with_context(|| format!("Failed to write {}", importance_path.display()))?;
    info!("Wrote {}", importance_path.display());

    Ok(PipelineSummary {
        output_dir: config.output_dir.clone(),
        n_train: train_table.n_samples(),
        n_test: test_table.n_samples(),
        n_features: x_train.ncols(),
        baseline: train_shap.baseline,
        files: vec![train_path, test_path, importance_path],
    })
}

/// Score `x`, compute its positive-class attributions, and write them to `path`.
///
/// Returns the positive-class probabilities alongside the attributions.
fn explain_and_write(
    model: &RandomForestClassifier,
    explainer: &TreeExplainer<'_>,
    table: &SampleTable,
    x: &FeatureMatrix,
    path: &Path,
) -> Result<(Vec<f64>, PositiveClassShap)> {
    let predictions = model
        .predict_positive_probability(x)
        .with_context(|| format!("Failed to score '{}'", table.source))?;
    let shap = explainer
        .shap_values(x)
        .with_context(|| format!("Failed to compute SHAP values for '{}'", table.source))?
        .positive_class();

    let deviation = shap.max_additivity_error(&predictions);
    if deviation > ADDITIVITY_TOLERANCE {
        warn!(
            "SHAP values for '{}' deviate from predictions by up to {:e}",
            table.source, deviation
        );
    } else {
        debug!(
            "SHAP additivity for '{}' holds (max deviation {:e})",
            table.source, deviation
        );
    }

    write_shap_table(path, &table.sample_ids, &predictions, &shap, x.schema())
        .with_context(|| format!("Failed to write {}", path.display()))?;
    info!("Wrote {} ({} samples)", path.display(), table.n_samples());

    Ok((predictions, shap))
}

fn log_input_summary(
    train: &SampleTable,
    test: &SampleTable,
    label_encoder: &LabelEncoder,
    feature_encoder: &FeatureEncoder,
) {
    info!("----- Input Data Summary -----");
    info!(
        "Training '{}': {} samples; testing '{}': {} samples ({})",
        train.source,
        train.n_samples(),
        test.source,
        test.n_samples(),
        if test.has_labels() { "labelled" } else { "unlabelled" }
    );
    if let Some(labels) = train.labels.as_deref() {
        let counts = stats::class_counts(labels, label_encoder.classes().len());
        for (class, count) in label_encoder.classes().iter().zip(counts) {
            info!("Class '{}': {} training samples", class, count);
        }
    }
    let n_categorical = feature_encoder.n_categorical();
    info!(
        "{} features ({} numeric, {} categorical)",
        train.n_features(),
        train.n_features() - n_categorical,
        n_categorical
    );
}

fn log_evaluation(scores: &[f64], labels: &[usize]) {
    info!(
        "Testing accuracy at 0.5: {:.4}",
        stats::accuracy(scores, labels, 0.5)
    );
    match stats::roc_auc(scores, labels) {
        Some(auc) => info!("Testing ROC AUC: {:.4}", auc),
        None => info!("Testing ROC AUC undefined: labels contain a single class"),
    }
}
