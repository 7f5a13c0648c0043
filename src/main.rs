use std::net::Ipv4Addr;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use solodhcp::{Config, DhcpServer, MacAddress, PartialConfig, Result, ServerPolicy};

#[derive(Parser)]
#[command(name = "solodhcp")]
#[command(author, version, about = "Hands one IPv4 address to one MAC address", long_about = None)]
struct Cli {
    /// JSON config file; command-line flags override its values
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// MAC address of the only client to answer (aa:bb:cc:dd:ee:ff)
    #[arg(short, long)]
    mac: Option<MacAddress>,

    /// Local address to send replies from
    #[arg(short, long)]
    bind: Option<Ipv4Addr>,

    /// Address to offer to the client
    #[arg(short, long)]
    ip: Option<Ipv4Addr>,

    #[arg(short, long)]
    subnet: Option<Ipv4Addr>,

    #[arg(short, long)]
    gateway: Option<Ipv4Addr>,

    /// Boot filename; a trailing '/' adds an explicit NUL terminator
    #[arg(short, long)]
    file: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    Run,
    ShowConfig,
}

impl Cli {
    fn load_config(&self) -> Result<Config> {
        let file_layer = match &self.config {
            Some(path) => PartialConfig::from_file(path)?,
            None => PartialConfig::default(),
        };

        let flag_layer = PartialConfig {
            mac_address: self.mac,
            bind_address: self.bind,
            offered_address: self.ip,
            subnet_mask: self.subnet,
            gateway: self.gateway,
            boot_file: self.file.clone(),
        };

        file_layer.overlay(flag_layer).build()
    }
}

fn log_policy(policy: &ServerPolicy) {
    info!("MAC address...: {}", policy.mac_address);
    info!("IP address....: {}", policy.offered_address);
    info!("Bind address..: {}", policy.server_address);
    info!("Subnet mask...: {}", policy.subnet_mask);
    match policy.gateway {
        Some(gateway) => info!("Gateway.......: {}", gateway),
        None => info!("Gateway.......: (none)"),
    }
    if let Some(boot_file) = &policy.boot_file {
        info!(
            "Boot file.....: {}{}",
            boot_file.name(),
            if boot_file.is_terminated() { " (NUL terminated)" } else { "" }
        );
    }

    if !policy.offer_on_server_subnet() {
        warn!(
            "Offered address {} is outside {}/{}",
            policy.offered_address, policy.server_address, policy.subnet_mask
        );
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level)),
        )
        .init();

    let config = cli.load_config()?;

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => {
            let policy = ServerPolicy::from_config(&config)?;
            log_policy(&policy);

            let server = DhcpServer::new(policy).await?;

            let (shutdown_tx, shutdown_rx) = watch::channel(false);
            tokio::spawn(async move {
                match tokio::signal::ctrl_c().await {
                    Ok(()) => {
                        info!("Received shutdown signal, stopping server...");
                        let _ = shutdown_tx.send(true);
                    }
                    Err(error) => {
                        // Keep the sender alive; dropping it would stop the server.
                        warn!("Cannot listen for Ctrl-C: {}", error);
                        std::future::pending::<()>().await;
                    }
                }
            });

            server.run(shutdown_rx).await
        }
        Commands::ShowConfig => {
            println!("{}", serde_json::to_string_pretty(&config)?);
            Ok(())
        }
    }
}
