use clap::Parser;
use common::hardware::HostRecord;
use inventory::config::{loader, Config};
use inventory::netbox::{NetboxClient, SyncResult};
use inventory::scanner::Scanner;
use log::{warn, LevelFilter};
use simplelog::{ColorChoice, Config as LogConfig, TermLogger, TerminalMode};
use tokio_util::sync::CancellationToken;

mod output;

#[derive(Parser)]
#[clap(name = "rackscan", version, about = "Redfish fleet hardware inventory", long_about = None)]
struct Args {
    /// Path to the TOML configuration file
    #[clap(short, long, default_value = "rackscan.toml")]
    config: String,

    /// Scan a single host (overrides the config file)
    #[clap(long)]
    host: Option<String>,

    /// Username for single-host mode
    #[clap(long)]
    user: Option<String>,

    /// Password for single-host mode
    #[clap(long)]
    pass: Option<String>,

    /// Output format: aggregated, console, table, json, csv, markdown
    #[clap(short, long, default_value = "aggregated")]
    output: String,

    /// Show every component in console output
    #[clap(short, long)]
    verbose: bool,

    /// Disable icons and ANSI styling
    #[clap(long)]
    no_color: bool,

    /// Sync results to the configured asset system
    #[clap(long)]
    sync: bool,

    /// Only verify reachability and credentials, no inventory collection
    #[clap(long)]
    validate: bool,

    /// Log level: debug, info, warn, error
    #[clap(long, default_value = "warn")]
    log_level: String,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    init_logging(&args.log_level);

    let config = match load_configuration(&args) {
        Ok(result) => result,
        Err(err) => {
            eprintln!("[rackscan] Configuration error: {err}");
            std::process::exit(1);
        }
    };

    let cancel = CancellationToken::new();
    let canceller = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("[rackscan] Interrupt received, cancelling");
            canceller.cancel();
        }
    });

    if let Err(code) = run(&args, &config, &cancel).await {
        std::process::exit(code);
    }
}

fn init_logging(level: &str) {
    let filter = match level {
        "debug" => LevelFilter::Debug,
        "info" => LevelFilter::Info,
        "error" => LevelFilter::Error,
        _ => LevelFilter::Warn,
    };
    let _ = TermLogger::init(
        filter,
        LogConfig::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    );
}

fn load_configuration(args: &Args) -> Result<Config, String> {
    // Single-host mode wins over the config file
    if let Some(host) = &args.host {
        let (Some(user), Some(pass)) = (&args.user, &args.pass) else {
            return Err(String::from("single-host mode requires --user and --pass"));
        };
        return Ok(Config::single_host(host, user, pass));
    }

    loader::load(&args.config).map_err(|err| err.to_string())
}

async fn run(args: &Args, config: &Config, cancel: &CancellationToken) -> Result<(), i32> {
    let scanner = match Scanner::new(config) {
        Ok(result) => result,
        Err(err) => {
            eprintln!("[rackscan] Failed to initialise scanner: {err}");
            return Err(1);
        }
    };

    if args.validate {
        return run_validate(&scanner, cancel).await;
    }

    let (records, stats) = scanner.scan_all(cancel).await;

    if let Err(err) = output::render(&args.output, &records, &stats, args.verbose, args.no_color) {
        eprintln!("[rackscan] Failed to render output: {err}");
        return Err(1);
    }

    let mut exit_code = 0;

    if args.sync {
        if !config.netbox.is_enabled() {
            warn!("[rackscan] Sync requested but no asset system is configured");
        } else if run_sync(config, cancel, &records).await.is_err() {
            exit_code = 1;
        }
    }

    if stats.failed_count > 0 {
        eprintln!(
            "[rackscan] {} of {} hosts failed",
            stats.failed_count, stats.total_hosts
        );
        exit_code = 1;
    }

    if exit_code != 0 {
        return Err(exit_code);
    }
    Ok(())
}

async fn run_validate(scanner: &Scanner, cancel: &CancellationToken) -> Result<(), i32> {
    let results = scanner.validate_connections(cancel).await;

    let mut hosts: Vec<&String> = results.keys().collect();
    hosts.sort();

    let mut failures = 0;
    for host in &hosts {
        match &results[*host] {
            None => println!("✅ {host}: OK"),
            Some(err) => {
                println!("❌ {host}: {err}");
                failures += 1;
            }
        }
    }

    println!(
        "\nValidation complete: {}/{} successful",
        hosts.len() - failures,
        hosts.len()
    );

    if failures > 0 {
        return Err(1);
    }
    Ok(())
}

async fn run_sync(
    config: &Config,
    cancel: &CancellationToken,
    records: &[HostRecord],
) -> Result<(), ()> {
    let client = match NetboxClient::new(&config.netbox) {
        Ok(result) => result,
        Err(err) => {
            eprintln!("[rackscan] Failed to initialise asset-system client: {err}");
            return Err(());
        }
    };

    if let Err(err) = client.test_connection(cancel).await {
        eprintln!("[rackscan] Asset-system connection failed: {err}");
        return Err(());
    }

    let results = client.sync_all(cancel, records).await;

    println!("\nAsset-system sync results:");
    let failures = print_sync_results(&results);

    if failures > 0 {
        eprintln!(
            "[rackscan] {failures} of {} hosts failed to sync",
            results.len()
        );
        return Err(());
    }
    Ok(())
}

fn print_sync_results(results: &[SyncResult]) -> usize {
    let mut failures = 0;
    for result in results {
        if result.success {
            println!("  ✅ {}: synced", result.host);
        } else {
            println!(
                "  ❌ {}: {}",
                result.host,
                result.error.as_deref().unwrap_or("unknown error")
            );
            failures += 1;
        }
    }
    failures
}
