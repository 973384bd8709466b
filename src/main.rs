use std::env;

use anyhow::Context;
use radio_resolver::{
    app_state::AppState,
    config::Config,
    http,
    logging::{init_logger, DEFAULT_SERVICE},
};
use serde_json::json;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let logger = init_logger(DEFAULT_SERVICE);

    let config = Config::load().context("failed to load configuration")?;

    if matches!(env::args().nth(1).as_deref(), Some("check-config")) {
        logger.info(
            "config.check_passed",
            serde_json::to_value(&config).unwrap_or_else(|_| json!({ "status": "ok" })),
        );
        return Ok(());
    }

    let state = AppState::initialize(config.clone())
        .context("failed to initialize application state")?;

    logger.info(
        "server.initialized",
        json!({
            "port": config.port,
            "defaultCountry": config.default_country,
            "strategies": state.strategy_labels(),
            "sourceTimeoutMs": config.http.timeout_ms,
        }),
    );

    http::serve(state).await.context("http server failed")
}
