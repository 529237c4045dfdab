//! cam-batch - CLI tool to batch-process part files through the CAM add-in.

use anyhow::{Context, Result};
use clap::Parser;
use std::io::{BufRead, Write};
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use cam_batch_rs::{run_simulated, ProcessOptions};

/// Synchronize, calculate and post-process every CAM part in a directory.
#[derive(Parser, Debug)]
#[command(name = "cam-batch")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Directory holding the part files (prompted for when omitted)
    #[arg(short, long)]
    dir: Option<PathBuf>,

    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Path to the CAM add-in module
    #[arg(long)]
    addin: Option<PathBuf>,

    /// Part-file extension to match
    #[arg(long)]
    extension: Option<String>,

    /// Skip operation calculation (also disables G-code generation)
    #[arg(long)]
    no_calculate: bool,

    /// Skip G-code generation
    #[arg(long)]
    no_gcode: bool,

    /// Print the batch summary as JSON
    #[arg(long)]
    summary_json: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn options(&self) -> Result<ProcessOptions> {
        let mut options = match &self.config {
            Some(path) => ProcessOptions::from_json_file(path)
                .with_context(|| format!("Failed to read config {}", path.display()))?,
            None => ProcessOptions::default(),
        };
        if let Some(addin) = &self.addin {
            options.addin_path = addin.clone();
        }
        if let Some(extension) = &self.extension {
            options.part_extension = extension.clone();
        }
        if self.no_calculate {
            options.calculate_operations = false;
        }
        if self.no_gcode {
            options.generate_gcode = false;
        }
        Ok(options)
    }
}

fn prompt_directory() -> Result<PathBuf> {
    print!("Please provide a directory to process: ");
    std::io::stdout().flush()?;
    let mut line = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read directory from stdin")?;
    Ok(PathBuf::from(line.trim()))
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let filter = if args.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let options = args.options()?;
    let directory = match &args.dir {
        Some(dir) => dir.clone(),
        None => prompt_directory()?,
    };

    info!("Processing directory: {}", directory.display());

    let summary = match run_simulated(&directory, &options) {
        Ok(summary) => summary,
        Err(e) => {
            // Input problems are reported, not treated as a failed run.
            error!("{}", e);
            return Ok(());
        }
    };

    if args.summary_json {
        let json = serde_json::to_string_pretty(&summary)?;
        println!("{}", json);
    }

    Ok(())
}
