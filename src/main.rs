use rsketch::{
    logger::{self, LoggerConfig},
    LightXClient, LightXConfig, Orchestrator, ServerConfig,
};
use std::process;
use std::sync::Arc;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let dotenv_loaded = dotenv::dotenv().is_ok();
    let server_config = ServerConfig::from_env();

    let logger_config = if server_config.json_logs {
        LoggerConfig::production()
    } else {
        LoggerConfig::development()
    };
    if let Err(e) = logger::init_with_config(logger_config) {
        eprintln!("{}", e);
    }

    if dotenv_loaded {
        log::info!("✅ .env file loaded successfully");
    } else {
        log::warn!("⚠️  No .env file found, using system environment variables");
    }

    let config = match LightXConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            log::error!("❌ {}", e);
            process::exit(1);
        }
    };
    logger::log_config_info(&config);

    let client = match LightXClient::new(&config) {
        Ok(client) => client,
        Err(e) => {
            log::error!("❌ Failed to initialize LightX client: {}", e);
            process::exit(1);
        }
    };
    let orchestrator = Orchestrator::new(Arc::new(client), config.poll.clone());

    logger::log_startup_info(
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
        &server_config,
    );
    rsketch::server::run(orchestrator, &server_config).await
}
