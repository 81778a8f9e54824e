use clap::Parser;

use log::{error, info};
use std::process::ExitCode;

use carrier_prep::io::require_program;
use carrier_prep::{
    convert_dataset, detect_and_crop, detector_for, run_ocr, write_profile_files, Cli, Command,
    CommandOcrEngine, Result,
};

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Convert(args) => {
            info!("Starting the conversion process...");
            let stats = convert_dataset(&args)?;
            stats.print_summary();
        }
        Command::DetectAndCrop(args) => {
            // Resolve the detector before any output directory is created
            let mut detector = detector_for(&args.model, args.detector.as_deref())?;
            info!("Starting detection with model {}...", args.model);
            let run = detect_and_crop(&args, detector.as_mut())?;
            run.stats.print_summary();
        }
        Command::Ocr(args) => {
            require_program(&args.engine, "OCR program")?;
            let mut engine = CommandOcrEngine::new(&args.engine, &args.lang);
            info!("Starting OCR with language '{}'...", engine.lang());
            let results = run_ocr(&args, &mut engine)?;
            info!("Recognized {} images.", results.len());
        }
        Command::InitProfile(args) => {
            let files = write_profile_files(args.profile, &args.out_dir)?;
            info!(
                "Created {} with {} classes",
                files.vocabulary.display(),
                args.profile.classes().len()
            );
            info!("Created {}", files.labelme_config.display());
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    // Initialize the logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
