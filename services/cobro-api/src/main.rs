//! cobro-api service entry point

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config_dir = std::env::var("CONFIG_DIR").unwrap_or_else(|_| "config".to_string());
    cobro_bootstrap::run(&config_dir, cobro_api::build_router).await
}
