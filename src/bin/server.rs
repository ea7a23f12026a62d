use adforge::{logger, server, BedrockCampaignService, Config};
use std::sync::Arc;

#[actix_web::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let env_file = dotenv::dotenv();
    logger::init()?;
    match env_file {
        Ok(path) => log::info!("✅ .env file loaded from {}", path.display()),
        Err(_) => log::warn!("⚠️  No .env file found"),
    }

    let config = Config::from_env();
    logger::log_config_info(&config);

    let service = BedrockCampaignService::new(config.bedrock.clone().unwrap_or_default()).await?;
    server::run(Arc::new(service), config.port()).await?;
    Ok(())
}
