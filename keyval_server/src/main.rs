use std::error::Error;
use std::sync::Arc;

use keyval_core::{log, Cluster, Config, HttpServer, Storage};

mod client;


#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let args: Vec<String> = std::env::args().collect();

    let mut config_path: Option<String> = None;
    let mut port: Option<u16> = None;
    let mut count: Option<usize> = None;
    let mut interval_ms: Option<u64> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "client" => {
                // everything after the subcommand is an optional host
                return client::run_client(args.get(i + 1).cloned()).await;
            }
            "-p" | "--port" => {
                port = Some(next_arg(&args, &mut i, "--port")?.parse()?);
            }
            "-c" | "--count" => {
                count = Some(next_arg(&args, &mut i, "--count")?.parse()?);
            }
            "-i" | "--interval" => {
                interval_ms = Some(next_arg(&args, &mut i, "--interval")?.parse()?);
            }
            "--config" => {
                config_path = Some(next_arg(&args, &mut i, "--config")?);
            }
            "--help" => {
                print_usage();
                return Ok(());
            }
            other => {
                eprintln!("Unknown argument: {}", other);
                print_usage();
                return Err("unknown argument".into());
            }
        }
        i += 1;
    }

    let mut config = match &config_path {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    if let Some(port) = port {
        config.server.port = port;
    }
    if let Some(count) = count {
        config.storage.shards = count;
    }
    if let Some(ms) = interval_ms {
        config.storage.clean_interval_ms = ms;
    }
    config.validate()?;

    log::init_logging(&config.logging);

    let cluster = Arc::new(Cluster::new(
        config.storage.shards,
        config.storage.clean_interval(),
    )?);
    tracing::info!(
        shards = config.storage.shards,
        clean_interval_ms = config.storage.clean_interval_ms,
        "cluster created"
    );

    let server = HttpServer::new(
        config.server.bind_address.clone(),
        config.server.port,
        cluster.clone(),
    );
    server.start_with_shutdown(shutdown_signal()).await?;

    cluster.shutdown().await?;
    tracing::info!("shut down cleanly");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {}", err);
    }
}

fn next_arg(args: &[String], i: &mut usize, flag: &str) -> Result<String, Box<dyn Error>> {
    *i += 1;
    args.get(*i)
        .cloned()
        .ok_or_else(|| Box::<dyn Error>::from(format!("{} requires a value", flag)))
}

fn print_usage() {
    println!("keyval - sharded in-memory key-value store with TTL expiration");
    println!();
    println!("Usage:");
    println!("  keyval_server [options]            # run the server");
    println!("  keyval_server client [host]        # run the interactive client");
    println!();
    println!("Options:");
    println!("  -p, --port <port>        listening port (default: 8000)");
    println!("  -c, --count <n>          cluster shard count (default: 100)");
    println!("  -i, --interval <ms>      sweep interval in milliseconds, 0 = lazy only (default: 1000)");
    println!("      --config <path>      TOML configuration file");
    println!("      --help               show this help");
}
