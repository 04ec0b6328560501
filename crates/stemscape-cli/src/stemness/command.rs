use std::path::PathBuf;

use clap::{Arg, Command, ValueHint};

/// Argument definitions of the `stemscape-si` binary.
///
/// Argument ids are the keys read by
/// [`StemnessConfig::from_arguments`](crate::stemness::input::StemnessConfig::from_arguments).
pub fn build_command() -> Command {
    Command::new("stemscape-si")
        .version(clap::crate_version!())
        .about("Random Forest classification and SHAP interpretation for stemness prediction")
        .arg(
            Arg::new("train")
                .short('i')
                .long("train")
                .help("Path to the training data file (tab-separated).")
                .required(true)
                .value_parser(clap::value_parser!(PathBuf))
                .value_hint(ValueHint::FilePath),
        )
        .arg(
            Arg::new("test")
                .short('e')
                .long("test")
                .help(
                    "Path to the testing/prediction data file (tab-separated). \
                     The label column is optional.",
                )
                .required(true)
                .value_parser(clap::value_parser!(PathBuf))
                .value_hint(ValueHint::FilePath),
        )
        .arg(
            Arg::new("label")
                .short('l')
                .long("label")
                .help("Column name of the target label. Required in the training data.")
                .required(true)
                .value_parser(clap::builder::NonEmptyStringValueParser::new()),
        )
        .arg(
            Arg::new("sample")
                .short('s')
                .long("sample")
                .help("Column name of the sample ID. Defaults to synthesized sample_<row> IDs.")
                .value_parser(clap::builder::NonEmptyStringValueParser::new()),
        )
        .arg(
            Arg::new("outdir")
                .short('o')
                .long("outdir")
                .help("Path to the output directory. Created if absent.")
                .required(true)
                .value_parser(clap::value_parser!(PathBuf))
                .value_hint(ValueHint::DirPath),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .help("JSON file with forest settings and thread count.")
                .value_parser(clap::value_parser!(PathBuf))
                .value_hint(ValueHint::FilePath),
        )
        .arg(
            Arg::new("seed")
                .long("seed")
                .help("Random seed for the forest. Overrides the config file.")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new("n_estimators")
                .long("n-estimators")
                .help("Number of trees. Overrides the config file.")
                .value_parser(clap::value_parser!(usize)),
        )
        .arg(
            Arg::new("threads")
                .long("threads")
                .help("Number of worker threads. Overrides the config file.")
                .value_parser(clap::value_parser!(usize)),
        )
}
