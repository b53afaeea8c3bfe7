//! Rotel Launch CLI
//!
//! Usage:
//!   rotel_launch --fluent-bit-config /fluent-bit/etc/fluent-bit.conf --rotel-path /rotel
//!   rotel_launch --fluent-bit-config fluent-bit.conf --rotel-path ./rotel --dry-run

use rotel_launch::{exit_code, LaunchArgs, Launcher};
use std::io::Write;
use tokio::sync::watch;

#[tokio::main]
async fn main() {
    let args: LaunchArgs = argh::from_env();

    // Initialize logging
    let env = env_logger::Env::default().default_filter_or(args.log_filter());
    env_logger::Builder::from_env(env)
        .target(env_logger::Target::Stdout)
        .format(|buf, record| writeln!(buf, "{}: {}", record.level(), record.args()))
        .init();

    let launcher = Launcher::new(args.launcher_config());

    // Dry run mode
    if args.dry_run {
        match launcher.plan() {
            Ok(plan) => println!("{}", plan),
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
        return;
    }

    // Create shutdown channel
    let (shutdown_tx, shutdown_rx) = watch::channel(());

    // SIGINT/SIGTERM abort the launch, or are forwarded to rotel once it runs
    if let Err(e) = ctrlc::set_handler(move || {
        log::info!("Received shutdown signal, stopping rotel...");
        let _ = shutdown_tx.send(());
    }) {
        log::warn!("Failed to install signal handler: {}", e);
    }

    match launcher.run(shutdown_rx).await {
        Ok(status) => {
            let code = exit_code(&status);
            if code != 0 {
                log::error!("rotel exited with code {}", code);
            }
            std::process::exit(code);
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
