use clap::{Parser, Subcommand};
use rst_common::with_tokio::tokio;

use prople_heraldd::errors::HeraldError;
use prople_heraldd::svc::logger;
use prople_heraldd::svc::provision::{ProvisionOptions, Provisioner};
use prople_heraldd::svc::serve::Server;

#[derive(Parser)]
#[command(name = "heraldd")]
#[command(version = "0.1.0")]
#[command(long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(name = "provision")]
    #[command(about = "Provision a new agent and persist its context")]
    Provision {
        #[arg(long, value_name = "URL")]
        agent_url: String,

        #[arg(long)]
        wallet_name: String,

        #[arg(long)]
        wallet_key: String,

        #[arg(long, value_name = "URL")]
        endpoint_url: Option<String>,

        #[arg(long)]
        token: Option<String>,

        /// Defaults to ~/.herald/context.json
        #[arg(short, long, value_name = "FILE")]
        output: Option<String>,
    },

    #[command(name = "serve")]
    #[command(about = "Running the inbound webhook server")]
    Serve {
        #[arg(short, long, value_name = "FILE")]
        config: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), HeraldError> {
    logger::init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Provision {
            agent_url,
            wallet_name,
            wallet_key,
            endpoint_url,
            token,
            output,
        } => {
            let provisioner = Provisioner::new(ProvisionOptions {
                agent_url,
                wallet_name,
                wallet_key,
                endpoint_url,
                token,
                output,
            });

            let path = provisioner.run().await?;
            println!("context saved to {}", path);
        }
        Commands::Serve { config } => {
            Server::new(config).run().await?;
        }
    }

    Ok(())
}
