// SPDX-License-Identifier: GPL-3.0-only

//! Main entry point: parses the command line and either runs the daemon or
//! executes a one-shot client command.

use crate::cli;
use crate::config::DaemonConfig;
use crate::daemon::types::LexfixDaemon;
use anyhow::{Context, Result, anyhow};
use lexfix_shared::daemon::client;
use lexfix_shared::scoring::{PronunciationScore, evaluate_phrase_with, score_with};
use lexfix_shared::validation::generate_secure_client_id;
use log::{error, info};
use std::path::{Path, PathBuf};

/// Main entry point
///
/// # Errors
///
/// Returns an error if the daemon fails to start or a client command fails.
pub async fn run() -> Result<()> {
    let matches = cli::build().get_matches();

    init_logging(matches.get_flag("verbose"));

    let config_path = matches
        .get_one::<PathBuf>("config")
        .cloned()
        .unwrap_or_else(DaemonConfig::default_path);

    match matches.subcommand() {
        Some(("score", sub)) => return handle_score_command(sub, &config_path).await,
        Some(("evaluate", sub)) => return handle_evaluate_command(sub, &config_path).await,
        Some(("ping", sub)) => return handle_ping_command(sub).await,
        Some(("status", sub)) => return handle_status_command(sub).await,
        _ => {}
    }

    // Standard daemon mode
    let socket_path = socket_path_from(&matches);
    let pass_threshold = matches.get_one::<u8>("pass-threshold").copied();

    info!("Starting Lexfix Daemon");
    info!("Socket path: {}", socket_path.display());
    info!("Config path: {}", config_path.display());

    let daemon = LexfixDaemon::new(socket_path, config_path, pass_threshold);
    {
        let config = daemon.config.read().await;
        info!("Pass threshold: {}", config.scoring.pass_threshold);
    }

    info!("Daemon initialized successfully");

    let shutdown_daemon = daemon.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, initiating shutdown..."),
            Err(e) => error!("Failed to listen for Ctrl+C: {e}"),
        }
        shutdown_daemon.shutdown();
    });

    daemon.start().await?;

    info!("Daemon stopped gracefully");

    Ok(())
}

/// Respect `RUST_LOG` when set, otherwise Info (Debug with `--verbose`)
fn init_logging(verbose: bool) {
    if std::env::var("RUST_LOG").is_ok() {
        env_logger::init();
    } else {
        let log_level = if verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        };
        env_logger::Builder::from_default_env()
            .filter_level(log_level)
            .init();
    }
}

fn socket_path_from(matches: &clap::ArgMatches) -> PathBuf {
    matches
        .get_one::<PathBuf>("socket")
        .cloned()
        .unwrap_or_else(|| cli::DEFAULT_SOCKET_PATH.clone())
}

/// Handle the score subcommand - score locally or through the daemon
async fn handle_score_command(matches: &clap::ArgMatches, config_path: &Path) -> Result<()> {
    let spoken = required(matches, "spoken")?;
    let target = required(matches, "target")?;
    let confidence = matches.get_one::<f64>("confidence").copied().unwrap_or(1.0);

    let result = if matches.get_flag("daemon") {
        let socket_path = socket_path_from(matches);
        let client_id = generate_secure_client_id("lexfix-cli");
        client::request_score(&socket_path, &client_id, spoken, target, Some(confidence))
            .await
            .map_err(|e| anyhow!(e))
            .context("Daemon scoring failed")?
    } else {
        let config = DaemonConfig::load_from(config_path);
        score_with(&config.scoring, spoken, target, confidence)
    };

    print_score(&result);
    Ok(())
}

/// Handle the evaluate subcommand - print the evaluation as JSON
async fn handle_evaluate_command(matches: &clap::ArgMatches, config_path: &Path) -> Result<()> {
    let spoken = required(matches, "spoken")?;
    let expected = required(matches, "expected")?;

    let evaluation = if matches.get_flag("daemon") {
        let socket_path = socket_path_from(matches);
        let client_id = generate_secure_client_id("lexfix-cli");
        client::request_evaluation(&socket_path, &client_id, spoken, expected)
            .await
            .map_err(|e| anyhow!(e))
            .context("Daemon evaluation failed")?
    } else {
        let config = DaemonConfig::load_from(config_path);
        evaluate_phrase_with(&config.scoring, spoken, expected)
    };

    println!("{}", serde_json::to_string_pretty(&evaluation)?);
    Ok(())
}

/// Handle the ping command - exit status tells whether the daemon answered
async fn handle_ping_command(matches: &clap::ArgMatches) -> Result<()> {
    let socket_path = socket_path_from(matches);
    let client_id = generate_secure_client_id("lexfix-cli");

    match client::ping_daemon(&socket_path, &client_id).await {
        Ok(message) => {
            info!("Daemon replied: {message}");
            Ok(())
        }
        Err(e) => {
            error!("❌ {e}");
            std::process::exit(1);
        }
    }
}

/// Handle the status command - get daemon status information
async fn handle_status_command(matches: &clap::ArgMatches) -> Result<()> {
    let socket_path = socket_path_from(matches);
    let client_id = generate_secure_client_id("lexfix-cli");

    let response = match client::fetch_status(&socket_path, &client_id).await {
        Ok(response) => response,
        Err(e) => {
            error!("❌ Error getting status: {e}");
            std::process::exit(1);
        }
    };

    println!("Daemon Status:");
    if let Some(started_at) = response.started_at {
        println!("  Started: {started_at}");
    }
    println!("  Uptime: {}s", response.uptime_seconds.unwrap_or_default());
    println!(
        "  Requests served: {}",
        response.requests_served.unwrap_or_default()
    );
    println!(
        "  Active clients: {}",
        response.active_connections.unwrap_or_default()
    );
    if let Some(policy) = response.scoring_policy {
        println!("  Pass threshold: {}", policy.pass_threshold);
    }

    Ok(())
}

fn required<'a>(matches: &'a clap::ArgMatches, name: &str) -> Result<&'a str> {
    matches
        .get_one::<String>(name)
        .map(String::as_str)
        .with_context(|| format!("Missing argument: {name}"))
}

fn print_score(result: &PronunciationScore) {
    let verdict = if result.passed { "PASS" } else { "TRY AGAIN" };
    println!(
        "{}/100 [{}] {verdict} - {}",
        result.score,
        result.feedback.pretty_name(),
        result.feedback.message()
    );
}
