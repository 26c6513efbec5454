use anyhow::{Context, Result};
use clap::{Arg, ArgAction, ArgMatches, Command, ValueHint};
use log::LevelFilter;
use std::path::PathBuf;

use phisheye_classifiers::config::{load_pipeline_config, PipelineConfig};
use phisheye_cli::classifiers::predict::{run_prediction, PredictArgs};
use phisheye_cli::classifiers::train::{resolve_train_config, run_training};

fn main() -> Result<()> {
    env_logger::Builder::default()
        .filter_level(LevelFilter::Error)
        .parse_env(env_logger::Env::default().filter_or("PHISHEYE_LOG", "error,phisheye=info"))
        .init();

    let matches = Command::new("phisheye")
        .version(clap::crate_version!())
        .about("\u{1F3A3} PhishEye CLI - Train and apply phishing website classifiers")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("train")
                .about("Train and compare every configured classifier, then save the best one")
                .arg(
                    Arg::new("config")
                        .help("Path to the pipeline JSON configuration file")
                        .required(false)
                        .value_parser(clap::value_parser!(PathBuf))
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("data")
                        .short('d')
                        .long("data")
                        .help(
                            "Path to the training dataset (*.csv or *.tsv). \
                             Overrides data_path from the configuration file.",
                        )
                        .value_parser(clap::value_parser!(PathBuf))
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("target")
                        .short('t')
                        .long("target")
                        .help("Name of the target column (default: status)")
                        .value_parser(clap::builder::NonEmptyStringValueParser::new()),
                )
                .arg(
                    Arg::new("output")
                        .short('o')
                        .long("output")
                        .help("File the best model is written to (default: phishing_detection_model.pkl)")
                        .value_parser(clap::value_parser!(PathBuf))
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("models")
                        .long("models")
                        .help(
                            "Comma separated subset of classifiers to train: random_forest, gbdt, \
                             svm, knn, logistic_regression, decision_tree, naive_bayes",
                        )
                        .value_parser(clap::builder::NonEmptyStringValueParser::new()),
                )
                .arg(
                    Arg::new("test_size")
                        .long("test-size")
                        .help("Fraction of rows held out for testing (default: 0.3)")
                        .value_parser(clap::value_parser!(f64)),
                )
                .arg(
                    Arg::new("seed")
                        .long("seed")
                        .help("Random seed for the train/test split (default: 42)")
                        .value_parser(clap::value_parser!(u64)),
                )
                .arg(
                    Arg::new("metrics_out")
                        .long("metrics-out")
                        .help("Write the comparison table to this CSV file")
                        .value_parser(clap::value_parser!(PathBuf))
                        .value_hint(ValueHint::FilePath),
                ),
        )
        .subcommand(
            Command::new("predict")
                .about("Apply a saved model to new data")
                .arg(
                    Arg::new("model")
                        .short('m')
                        .long("model")
                        .help("Path to the saved model artifact")
                        .required(true)
                        .value_parser(clap::value_parser!(PathBuf))
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("data")
                        .short('d')
                        .long("data")
                        .help("Path to the new dataset (*.csv or *.tsv)")
                        .required(true)
                        .value_parser(clap::value_parser!(PathBuf))
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("has_target")
                        .long("has-target")
                        .help("The new data contains the target column; report metrics instead of writing predictions")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("output")
                        .short('o')
                        .long("output")
                        .help("Predictions CSV for unlabeled data (default: phishing_predictions.csv)")
                        .value_parser(clap::value_parser!(PathBuf))
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("unseen")
                        .long("unseen")
                        .help("How to treat categorical values not seen during training")
                        .value_parser(["reject", "drop", "unknown"])
                        .value_hint(ValueHint::Other),
                ),
        )
        .subcommand(
            Command::new("run")
                .about("Train from a configuration file, then apply the model to its inference data")
                .arg(
                    Arg::new("config")
                        .help("Path to the pipeline JSON configuration file")
                        .required(true)
                        .value_parser(clap::value_parser!(PathBuf))
                        .value_hint(ValueHint::FilePath),
                ),
        )
        .help_template(
            "{usage-heading} {usage}\n\n\
             {about-with-newline}\n\
             Version {version}\n\n\
             {all-args}{after-help}",
        )
        .get_matches();

    match matches.subcommand() {
        Some(("train", sub_m)) => handle_train(sub_m),
        Some(("predict", sub_m)) => handle_predict(sub_m),
        Some(("run", sub_m)) => handle_run(sub_m),
        _ => unreachable!("Subcommand is required by CLI configuration"),
    }
}

fn handle_train(matches: &ArgMatches) -> Result<()> {
    let config_path: Option<&PathBuf> = matches.get_one("config");
    match config_path {
        Some(path) => log::info!("[PhishEye::Train] Using config: {:?}", path),
        None => eprintln!("[PhishEye::Train] No config file provided; using defaults."),
    }

    let config = resolve_train_config(config_path, matches)?;
    if config_path.is_none() {
        let default_json = serde_json::to_string_pretty(&config).unwrap_or_default();
        eprintln!("[PhishEye::Train] Default config:\n{}", default_json);
    }

    match run_training(&config) {
        Ok(summary) => {
            if summary.failures > 0 {
                log::warn!("{} classifiers failed; see the table above", summary.failures);
            }
            Ok(())
        }
        Err(e) => {
            log::error!("Training failed: {:#}", e);
            std::process::exit(1)
        }
    }
}

fn handle_predict(matches: &ArgMatches) -> Result<()> {
    let args = PredictArgs::from_arguments(matches)?;
    log::info!(
        "[PhishEye::Predict] Applying {:?} to {:?}",
        args.model_path,
        args.data_path
    );

    match run_prediction(&args) {
        Ok(_) => Ok(()),
        Err(e) => {
            log::error!("Prediction failed: {:#}", e);
            std::process::exit(1)
        }
    }
}

fn handle_run(matches: &ArgMatches) -> Result<()> {
    let config_path: &PathBuf = matches
        .get_one("config")
        .context("a configuration file is required")?;
    log::info!("[PhishEye::Run] Using config: {:?}", config_path);

    let config: PipelineConfig = load_pipeline_config(config_path)
        .with_context(|| format!("Failed to load config: {}", config_path.display()))?;

    let summary = match run_training(&config) {
        Ok(summary) => summary,
        Err(e) => {
            log::error!("Training failed: {:#}", e);
            std::process::exit(1)
        }
    };

    let Some(inference) = &config.inference else {
        log::info!("No inference section in the config; done.");
        return Ok(());
    };

    let args = PredictArgs::from_config(summary.artifact_path, inference);
    match run_prediction(&args) {
        Ok(_) => Ok(()),
        Err(e) => {
            log::error!("Prediction failed: {:#}", e);
            std::process::exit(1)
        }
    }
}
