use {
    clap::{Parser, Subcommand},
    tracing::info,
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

#[derive(Parser)]
#[command(name = "carbot", about = "Carbot — conversational car chatbot gateway")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    /// Address to bind to (overrides config value).
    #[arg(long, global = true)]
    bind: Option<String>,
    /// Port to listen on (overrides config value).
    #[arg(long, global = true)]
    port: Option<u16>,
    /// Custom config directory (overrides default ~/.config/carbot/).
    #[arg(long, global = true, env = "CARBOT_CONFIG_DIR")]
    config_dir: Option<std::path::PathBuf>,
    /// Custom data directory (overrides default data dir).
    #[arg(long, global = true, env = "CARBOT_DATA_DIR")]
    data_dir: Option<std::path::PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the gateway server (default when no subcommand is provided).
    Gateway,
    /// Resolve one message against a running gateway and print the answer.
    Resolve {
        #[arg(short, long)]
        message: String,
        /// Gateway base URL.
        #[arg(long, default_value = "http://127.0.0.1:5000")]
        gateway_url: String,
    },
}

fn init_telemetry(cli: &Cli) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    if cli.json_logs {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_target(true).with_thread_ids(false))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer())
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_telemetry(&cli);

    info!(version = env!("CARGO_PKG_VERSION"), "carbot starting");

    match cli.command {
        None | Some(Commands::Gateway) => {
            carbot_gateway::server::start_gateway(cli.bind, cli.port, cli.config_dir, cli.data_dir)
                .await
        },
        Some(Commands::Resolve {
            message,
            gateway_url,
        }) => {
            let resp: serde_json::Value = reqwest::Client::new()
                .post(format!("{gateway_url}/resolve"))
                .json(&serde_json::json!({ "text": message }))
                .send()
                .await?
                .error_for_status()?
                .json()
                .await?;
            println!("{}", resp["response"].as_str().unwrap_or_default());
            Ok(())
        },
    }
}
