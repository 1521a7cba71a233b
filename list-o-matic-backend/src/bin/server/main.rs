mod telemetry;

use list_o_matic_backend::error::AppError;
use list_o_matic_backend::run_server;
use list_o_matic_config::get_config;
use telemetry::setup_logging;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    setup_logging();

    let config = get_config()?;
    run_server(config).await?.await
}
