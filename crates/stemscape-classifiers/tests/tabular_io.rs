//! Integration tests for reading sample tables, encoding them, and writing reports.

use std::fs;

use stemscape_classifiers::config::ForestConfig;
use stemscape_classifiers::data_handling::{TableColumns, TableRole};
use stemscape_classifiers::explain::TreeExplainer;
use stemscape_classifiers::io::load_sample_table;
use stemscape_classifiers::models::{ClassifierModel, RandomForestClassifier};
use stemscape_classifiers::preprocessing::{FeatureEncoder, LabelEncoder};
use stemscape_classifiers::report::{
    build_importance_table, write_importance_table, write_shap_table,
};

const TRAIN: &str = "\
id\tage\ttissue\tstem
S1\t30\tliver\tyes
S2\t45\tlung\tno
S3\t52\tliver\tyes
S4\t61\tlung\tno
S5\t38\tkidney\tyes
S6\t70\tlung\tno
";

const TEST: &str = "\
id\tage\ttissue
T1\t40\tlung
T2\t55\tkidney
";

#[test]
fn categorical_codes_are_shared_between_tables() {
    let dir = tempfile::tempdir().unwrap();
    let train_path = dir.path().join("train.tsv");
    let test_path = dir.path().join("test.tsv");
    fs::write(&train_path, TRAIN).unwrap();
    fs::write(&test_path, TEST).unwrap();

    let cols = TableColumns::new("stem", Some("id".to_string()));
    let mut le = LabelEncoder::new();
    let train = load_sample_table(&train_path, &cols, TableRole::Training, &mut le).unwrap();
    let test = load_sample_table(&test_path, &cols, TableRole::Scoring, &mut le).unwrap();

    let (encoder, x_train) = FeatureEncoder::fit_transform(&train).unwrap();
    let x_test = encoder.transform(&test).unwrap();

    // kidney=0, liver=1, lung=2
    assert_eq!(
        x_train.values().column(1).to_vec(),
        vec![1.0, 2.0, 1.0, 2.0, 0.0, 2.0]
    );
    assert_eq!(x_test.values().column(1).to_vec(), vec![2.0, 0.0]);
    assert_eq!(x_test.values().column(0).to_vec(), vec![40.0, 55.0]);
}

#[test]
fn reports_have_expected_shape() {
    let dir = tempfile::tempdir().unwrap();
    let train_path = dir.path().join("train.tsv");
    fs::write(&train_path, TRAIN).unwrap();

    let cols = TableColumns::new("stem", Some("id".to_string()));
    let mut le = LabelEncoder::new();
    let train = load_sample_table(&train_path, &cols, TableRole::Training, &mut le).unwrap();
    let (_, x) = FeatureEncoder::fit_transform(&train).unwrap();

    let cfg = ForestConfig {
        n_estimators: 10,
        ..ForestConfig::default()
    };
    let model = RandomForestClassifier::fit(&cfg, &x, train.labels.as_deref().unwrap()).unwrap();
    let shap = TreeExplainer::new(&model)
        .shap_values(&x)
        .unwrap()
        .positive_class();
    let predictions = model.predict_positive_probability(&x).unwrap();

    let shap_path = dir.path().join("training_shap.tsv");
    write_shap_table(&shap_path, &train.sample_ids, &predictions, &shap, x.schema()).unwrap();

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .from_path(&shap_path)
        .unwrap();
    let header: Vec<String> = reader.headers().unwrap().iter().map(str::to_string).collect();
    assert_eq!(
        header,
        vec!["SampleID", "baseline_value", "StemSCAPE-SI", "age", "tissue"]
    );
    let rows: Vec<csv::StringRecord> = reader.records().map(Result::unwrap).collect();
    assert_eq!(rows.len(), 6);
    assert_eq!(&rows[0][0], "S1");
    for row in &rows {
        let baseline: f64 = row[1].parse().unwrap();
        let si: f64 = row[2].parse().unwrap();
        let sum: f64 = (3..5).map(|i| row[i].parse::<f64>().unwrap()).sum();
        assert!((baseline + sum - si).abs() < 1e-6);
    }

    let importance = build_importance_table(
        x.schema(),
        &model.feature_importances(),
        &shap.mean_abs(),
    )
    .unwrap();
    let importance_path = dir.path().join("feature_importance_vs_shap.tsv");
    write_importance_table(&importance_path, &importance).unwrap();

    let content = fs::read_to_string(&importance_path).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines[0], "Feature\tRF_FeatureImportance\tMeanAbsSHAP");
    assert_eq!(lines.len(), 3);
    let mut features: Vec<&str> = lines[1..]
        .iter()
        .map(|l| l.split('\t').next().unwrap())
        .collect();
    features.sort_unstable();
    assert_eq!(features, vec!["age", "tissue"]);
}
