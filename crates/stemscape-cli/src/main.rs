use anyhow::Result;
use clap::ArgMatches;
use log::LevelFilter;

use stemscape_cli::stemness::command::build_command;
use stemscape_cli::stemness::input::StemnessConfig;
use stemscape_cli::stemness::pipeline::run_pipeline;

fn main() -> Result<()> {
    env_logger::Builder::default()
        .filter_level(LevelFilter::Error)
        .parse_env(env_logger::Env::default().filter_or("STEMSCAPE_LOG", "error,stemscape=info"))
        .init();

    let matches = build_command().get_matches();

    handle_run(&matches)
}

fn handle_run(matches: &ArgMatches) -> Result<()> {
    let config = StemnessConfig::from_arguments(matches)?;
    log::info!(
        "[StemSCAPE-SI] Training on {:?}, scoring {:?}",
        config.train_data,
        config.test_data
    );

    if let Some(threads) = config.settings.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()?;
    }

    match run_pipeline(&config) {
        Ok(summary) => {
            println!("--- Analysis Complete ---");
            println!(
                "Results successfully saved to: {}",
                summary.output_dir.display()
            );
            Ok(())
        }
        Err(e) => {
            log::error!("Analysis failed: {:#}", e);
            std::process::exit(1)
        }
    }
}
