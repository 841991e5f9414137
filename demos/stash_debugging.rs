use std::sync::Arc;

use qlog::diagnostics::{init_diagnostics, DiagnosticsConfig};
use qlog::{LogTo, MemoryListStore, QLogConfig, QLogger};
use serde_json::json;

/// Log a small request flow into the stash and print what was captured,
/// the way a developer would when debugging a single request.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_diagnostics(&DiagnosticsConfig {
        filter: "qlog=debug".to_string(),
        ..DiagnosticsConfig::default()
    })?;

    let config = QLogConfig::new("qlog_demo").debugging(Some(LogTo::Both));
    let store = MemoryListStore::new();
    let mut logger = QLogger::new(Arc::new(store.clone()), config)?;

    logger
        .in_req()
        .info("GET /cars/7", json!({"ip": "10.0.0.1"}))
        .await?;
    logger
        .id_by("car_id", "7")?
        .in_sql()
        .debug("select * from cars where id = '7'", json!({}))
        .await?;
    logger.warning("car is sold", json!({"sold_at": "2024-01-02"})).await?;
    logger.in_resp().info("200 OK", json!({})).await?;

    for record in logger.stashed() {
        println!("{}", serde_json::to_string(&record)?);
    }

    let sold = logger.stashed_by(|record| record["level"] == json!(300));
    println!("{} warning(s), session {}", sold.len(), logger.session());
    Ok(())
}
