//! `turtleweb-cli` – turtlesim web control panel
//!
//! This binary is the entry point for the turtleweb stack.  It:
//!
//! 1. Loads `~/.turtleweb/config.toml` (writing a default one on first
//!    run) and applies `TURTLEWEB_*` environment overrides.
//! 2. Connects to the rosbridge WebSocket server.
//! 3. Starts the control panel core and the web UI server.
//! 4. Intercepts **Ctrl-C** to stop a still-running simulation process
//!    and release middleware resources before exiting.

mod config;

use colored::Colorize;
use std::sync::Arc;
use tracing::{error, info, warn};

use turtleweb_client::{Ros2Run, RosbridgeClient};
use turtleweb_panel::{LaunchTarget, TurtlePanel};
use turtleweb_server::PanelServer;

#[tokio::main]
async fn main() {
    // ── Structured logging ────────────────────────────────────────────────
    // Initialise tracing-subscriber using RUST_LOG (defaults to "info").
    // Set TURTLEWEB_LOG_FORMAT=json to emit newline-delimited JSON logs
    // suitable for log aggregators.  The CLI's user-facing output still
    // uses println! for UX consistency.
    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level));

    if std::env::var("TURTLEWEB_LOG_FORMAT").as_deref() == Ok("json") {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .compact()
            .init();
    }

    print_banner();

    // ── Configuration ─────────────────────────────────────────────────────
    let cfg = match config::load() {
        Ok(Some(cfg)) => {
            println!(
                "  Config loaded from {}",
                config::config_path().display().to_string().bold()
            );
            cfg
        }
        Ok(None) => {
            let cfg = config::Config::default();
            match config::save(&cfg) {
                Ok(()) => println!(
                    "  {} Default config written to {}",
                    "✓".green().bold(),
                    config::config_path().display().to_string().bold()
                ),
                Err(e) => println!("{}: {}", "Error saving config".red(), e),
            }
            cfg
        }
        Err(e) => {
            println!("{}: {}", "Config error".red(), e);
            println!("  Using default configuration.");
            config::Config::default()
        }
    };

    // ── rosbridge connection ──────────────────────────────────────────────
    print!("\n  Connecting to rosbridge at {} … ", cfg.rosbridge_url.dimmed());
    let client = match RosbridgeClient::connect(&cfg.rosbridge_url).await {
        Ok(client) => {
            println!("{}", "connected".green());
            Arc::new(client)
        }
        Err(e) => {
            println!("{}", "failed".red());
            println!(
                "  {}  Start it with `{}`.",
                "No rosbridge server detected.".dimmed(),
                "ros2 launch rosbridge_server rosbridge_websocket_launch.xml".bold()
            );
            error!(error = %e, "rosbridge connection failed");
            std::process::exit(1);
        }
    };

    // ── Panel core ────────────────────────────────────────────────────────
    let panel = Arc::new(TurtlePanel::new(
        client,
        Arc::new(Ros2Run::new()),
        LaunchTarget {
            package: cfg.launch_package.clone(),
            executable: cfg.launch_executable.clone(),
            node_name: cfg.node_name.clone(),
        },
    ));
    if let Err(e) = panel.on_startup().await {
        error!(error = %e, "panel startup failed");
        std::process::exit(1);
    }

    // ── Ctrl-C handler ────────────────────────────────────────────────────
    let (shutdown_tx, mut shutdown_rx) = tokio::sync::mpsc::channel::<()>(1);
    if let Err(e) = ctrlc::set_handler(move || {
        println!();
        println!(
            "{}",
            "⚠  Ctrl-C received – shutting the panel down …".yellow().bold()
        );
        let _ = shutdown_tx.try_send(());
    }) {
        warn!(error = %e, "Failed to install Ctrl-C handler; graceful shutdown on Ctrl-C will not be available");
    }

    // ── Web UI server ─────────────────────────────────────────────────────
    let server = PanelServer::new(Arc::clone(&panel)).with_port(cfg.panel_port);
    println!(
        "\n  Control panel at {}\n",
        format!("http://localhost:{}", cfg.panel_port).bold().cyan()
    );

    tokio::select! {
        result = server.run() => {
            if let Err(e) = result {
                error!(error = %e, "panel server exited");
            }
        }
        _ = shutdown_rx.recv() => {
            info!("shutdown requested");
        }
    }

    if let Err(e) = panel.on_shutdown().await {
        warn!(error = %e, "panel shutdown incomplete");
    }
    println!("{}", "  ✓ Exiting turtleweb.".green());
}

// ─────────────────────────────────────────────────────────────────────────────
// Banner
// ─────────────────────────────────────────────────────────────────────────────

fn print_banner() {
    println!();
    println!("{}", r#"  __             __  __                 __   "#.bold().cyan());
    println!("{}", r#" / /___ _________/ /_/ /__ _    _____  / /_  "#.bold().cyan());
    println!("{}", r#"/ __/ // / __/ __/ / / -_) |/|/ / -_) / __ \ "#.bold().cyan());
    println!("{}", r#"\__/\_,_/_/  \__/_/_/\__/|__,__/\__/ /_,__/  "#.bold().cyan());
    println!();
    println!(
        "  {} {}",
        "turtleweb".bold(),
        format!("v{}", env!("CARGO_PKG_VERSION")).dimmed()
    );
    println!("  Web control panel for turtlesim");
    println!();
}
