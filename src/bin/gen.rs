//! subnet-lists-gen: CLI tool for generating prefix lists and RouterOS scripts.

use clap::{Parser, Subcommand};
use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use subnet_lists::feed::cidr_lines;
use subnet_lists::{normalize, AddressFamily, Config, Generator, HttpFeed};

#[derive(Parser)]
#[command(name = "subnet-lists-gen")]
#[command(version)]
#[command(about = "Generate minimal IPv4 prefix lists from BGP and CIDR feeds", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Download feeds and write all configured lists
    Run {
        /// YAML configuration file
        #[arg(short, long, default_value = "config.yaml")]
        config: PathBuf,

        /// Write a JSON run report to this path
        #[arg(short, long)]
        report: Option<PathBuf>,
    },

    /// Normalize prefixes read from a file or stdin
    Normalize {
        /// Input file, one prefix per line (stdin when omitted)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Print a JSON array instead of one prefix per line
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run { config, report } => run(&config, report.as_ref()),
        Commands::Normalize { input, json } => normalize_input(input.as_ref(), json),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(config_path: &PathBuf, report_path: Option<&PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load(config_path)?;
    let feed = HttpFeed::from_config(&config)?;

    let report = Generator::new(config, feed).run()?;

    if let Some(path) = report_path {
        report.save(path)?;
        log::info!("Report written to {:?}", path);
    }

    if report.failed() > 0 {
        log::warn!("{} of {} groups failed", report.failed(), report.groups.len());
    }
    Ok(())
}

fn normalize_input(input: Option<&PathBuf>, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let text = match input {
        Some(path) => fs::read_to_string(path)?,
        None => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };

    let out = normalize(cidr_lines(&text), AddressFamily::Ipv4)?;

    for e in &out.errors {
        log::warn!("Skipping invalid line: {}", e);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&out.set)?);
    } else {
        for line in out.set.to_lines() {
            println!("{}", line);
        }
    }
    Ok(())
}
