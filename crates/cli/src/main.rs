mod commands;

use clap::{CommandFactory, Parser};
use clap_complete::{Shell, generate};
use std::io;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sitedrop")]
#[command(version, about = "Relay single-page static sites to Vercel", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Parser)]
enum Command {
    /// Run the deploy relay HTTP server
    ///
    /// Accepts multipart uploads on POST /deploy with fields:
    ///   file      the HTML page to publish as index.html
    ///   siteName  Vercel project name
    ///   token     optional bearer token (defaults to VERCEL_TOKEN)
    Serve {
        /// Port to listen on (overrides PORT and the config file)
        #[arg(short, long)]
        port: Option<u16>,

        /// Path to config file (default: ./sitedrop.toml if present)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Directory served as the upload frontend
        #[arg(long)]
        public: Option<PathBuf>,
    },

    /// Deploy a local HTML file directly, without running the server
    Deploy {
        /// HTML file to publish as index.html
        file: PathBuf,

        /// Vercel project name
        #[arg(short, long)]
        site_name: String,

        /// Bearer token (defaults to VERCEL_TOKEN)
        #[arg(short, long)]
        token: Option<String>,

        /// Path to config file (default: ./sitedrop.toml if present)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Print the result as JSON instead of a summary
        #[arg(long)]
        json: bool,
    },

    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn init_tracing(default_directives: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Serve {
            port,
            config,
            public,
        } => {
            init_tracing("sitedrop=info,sitedrop_deployer=info,tower_http=info");
            commands::serve::run(commands::serve::ServeOptions {
                port,
                config,
                public,
            })
            .await
        }
        Command::Deploy {
            file,
            site_name,
            token,
            config,
            json,
        } => {
            init_tracing("warn");
            commands::deploy::run(commands::deploy::DeployOptions {
                file,
                site_name,
                token,
                config,
                json,
            })
            .await
        }
        Command::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "sitedrop", &mut io::stdout());
            Ok(())
        }
    }
}
