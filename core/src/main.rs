use clap::Parser;
use dicomcat_core::cli::report::{ConversionSummary, MetadataReport};
use dicomcat_core::cli::{convert_file, inspect_file, Cli, Command, OutputFormat};
use dicomcat_core::server;
use log::{error, info};
use std::fs::OpenOptions;
use std::path::Path;
use std::process;

fn main() {
    let cli = Cli::parse();

    // Setup logging
    if let Err(e) = setup_logging(cli.verbose, cli.log_file.as_deref()) {
        eprintln!("Error: Failed to open log file: {}", e);
        process::exit(1);
    }

    match cli.command {
        Command::Serve(config) => {
            info!("Application started");
            if let Err(e) = server::run(config) {
                error!("Server stopped: {}", e);
                eprintln!("Error: {}", e);
                process::exit(1);
            }
        }
        Command::Metadata { file, tag, format } => {
            let answer = match inspect_file(&file, tag.as_deref()) {
                Ok(answer) => answer,
                Err(e) => {
                    eprintln!("Error: {}", e);
                    process::exit(1);
                }
            };
            match format {
                OutputFormat::Text => print!("{}", MetadataReport::new(&answer)),
                OutputFormat::Json => match serde_json::to_string_pretty(&answer.to_json()) {
                    Ok(json) => println!("{}", json),
                    Err(e) => {
                        eprintln!("Error: Failed to serialize to JSON: {}", e);
                        process::exit(1);
                    }
                },
            }
        }
        Command::Convert { file, output } => match convert_file(&file, &output) {
            Ok(report) => {
                print!("{}", ConversionSummary::new(&report));
                println!("Archive written to {}", output.display());
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                process::exit(1);
            }
        },
    }
}

fn setup_logging(verbose: bool, log_file: Option<&Path>) -> std::io::Result<()> {
    let level = if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    let mut builder = env_logger::Builder::from_default_env();
    builder.filter_level(level);
    if let Some(path) = log_file {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }
    builder.init();
    Ok(())
}
