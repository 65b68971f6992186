use azure_vnet_provisioner::{logging, ApiServer, Settings};
use std::error::Error;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // Do as little as possible in main.rs as it can't contain any tests
    dotenv::dotenv().ok();
    logging::init("log4rs.yml")?;
    log::info!("#Start main()");

    let settings = Settings::from_env()?;
    let server = ApiServer::from_settings(&settings)?;
    server.run_with_shutdown(shutdown_signal()).await?;

    log::info!("#Stop main()");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    log::info!("Shutdown signal received");
}
