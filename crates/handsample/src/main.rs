//! `handsample` - CLI for the handwriting sample intake service
//!
//! This binary runs the web server and provides commands for inspecting the
//! recorded submissions and the active configuration.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use anyhow::Context;
use clap::Parser;

use handsample::cli::{Cli, Command, ConfigCommand, RecordsCommand, ServeCommand};
use handsample::{init_logging, Config, Intake, SubmissionRecord};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    // Load configuration
    let config = Config::load_from(cli.config.clone())?;

    // Execute the command
    match cli.command {
        Command::Serve(serve_cmd) => handle_serve(config, serve_cmd),
        Command::Status(status_cmd) => handle_status(&config, status_cmd.json),
        Command::Records(records_cmd) => handle_records(&config, records_cmd),
        Command::Config(config_cmd) => handle_config(&config, config_cmd),
    }
}

fn handle_serve(mut config: Config, cmd: ServeCommand) -> anyhow::Result<()> {
    if let Some(host) = cmd.host {
        config.server.host = host;
    }
    if let Some(port) = cmd.port {
        config.server.port = port;
    }
    config.validate()?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start the async runtime")?;
    runtime.block_on(handsample::server::serve(&config))?;
    Ok(())
}

fn handle_status(config: &Config, json: bool) -> anyhow::Result<()> {
    let intake = Intake::from_config(config)?;
    let stats = intake.stats()?;

    if json {
        let status = serde_json::json!({
            "data_dir": config.data_dir(),
            "metadata_path": intake.store().path(),
            "uploads_dir": intake.uploads().path(),
            "total_records": stats.total_records,
            "newest_timestamp": stats.newest_timestamp,
            "document_size_bytes": stats.document_size_bytes,
            "uploaded_files": intake.uploads().file_count()?,
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        println!("handsample status");
        println!("-----------------");
        println!("Data dir:      {}", config.data_dir().display());
        println!("Metadata:      {}", intake.store().path().display());
        println!("Uploads:       {}", intake.uploads().path().display());
        println!("Records:       {}", stats.total_records);
        println!("Files:         {}", intake.uploads().file_count()?);
        println!(
            "Newest:        {}",
            stats.newest_timestamp.as_deref().unwrap_or("-")
        );
        println!("Document size: {} bytes", stats.document_size_bytes);
    }
    Ok(())
}

fn handle_records(config: &Config, cmd: RecordsCommand) -> anyhow::Result<()> {
    let intake = Intake::from_config(config)?;

    match cmd {
        RecordsCommand::Count => {
            println!("{}", intake.contribution_count()?);
        }
        RecordsCommand::List { json, limit } => {
            let records = intake.store().load()?;
            let skip = limit.map_or(0, |n| records.len().saturating_sub(n));
            let shown = &records[skip..];

            if json {
                println!("{}", serde_json::to_string_pretty(shown)?);
            } else if shown.is_empty() {
                println!("No records.");
            } else {
                for record in shown {
                    print_record(record);
                }
            }
        }
    }
    Ok(())
}

fn print_record(record: &SubmissionRecord) {
    println!(
        "{}  {}  ({})  style={} hand={} age={} gender={}",
        record.timestamp,
        record.filename,
        record.original_name,
        record.answers.writing_style,
        record.answers.handedness,
        record.answers.age_group,
        record.answers.gender,
    );
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> anyhow::Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Server]");
                println!("  Host:               {}", config.server.host);
                println!("  Port:               {}", config.server.port);
                println!();
                println!("[Storage]");
                println!("  Data dir:           {}", config.data_dir().display());
                println!();
                println!("[Upload]");
                println!("  File prefix:        {}", config.upload.file_prefix);
                println!();
                println!("[Session]");
                println!("  Cookie name:        {}", config.session.cookie_name);
                println!(
                    "  Idle timeout (min): {}",
                    config.session.idle_timeout_minutes
                );
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path = file.unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => println!("Configuration error: {e}"),
            }
        }
    }
    Ok(())
}
