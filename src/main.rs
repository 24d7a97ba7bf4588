use clap::Parser;
use product_autocomplete::core::ConfigProvider;
use product_autocomplete::utils::{logger, validation::Validate};
use product_autocomplete::{CliConfig, Server, ServerConfig, TomlConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    // 有 --config 時以 TOML 檔為準
    let toml = match &cli.config {
        Some(path) => match TomlConfig::from_file(path) {
            Ok(config) => Some(config),
            Err(e) => {
                eprintln!("❌ Failed to load config file '{}': {}", path, e);
                eprintln!("💡 Make sure the file exists and is valid TOML format");
                std::process::exit(1);
            }
        },
        None => None,
    };

    let (verbose, json_logs) = match &toml {
        Some(config) => (cli.verbose || config.verbose(), cli.json_logs || config.json_logs()),
        None => (cli.verbose, cli.json_logs),
    };
    logger::init_logger(verbose, json_logs);

    tracing::info!("Starting product-autocomplete");

    let validation = match &toml {
        Some(config) => config.validate(),
        None => cli.validate(),
    };
    if let Err(e) = validation {
        tracing::error!("❌ Configuration validation failed: {}", e);
        eprintln!("❌ {}", e);
        std::process::exit(1);
    }

    let provider: &dyn ConfigProvider = match &toml {
        Some(config) => config,
        None => &cli,
    };
    let config = ServerConfig::from_provider(provider)?;
    tracing::info!(
        project = %config.project_id,
        endpoint = %config.datastore_endpoint,
        kind = %config.kind,
        field = %config.search_field,
        page_size = config.page_size,
        "Datastore settings"
    );

    Server::new(config)?.run().await?;

    Ok(())
}
