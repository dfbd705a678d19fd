use serde_json::{json, Map, Value};
use sqlx::PgPool;

use crate::database::models::NewToolRun;
use crate::database::repository::insert_json;

/// Appends a row to `tool_run_history`. Failures are logged and never reach
/// the caller; the tool response does not depend on the audit trail.
pub async fn record(pool: &PgPool, run: NewToolRun) {
    let tool = run.tool_name.as_str();
    if let Err(e) = insert_json(pool, "tool_run_history", &history_row(&run)).await {
        tracing::error!("[HistoryLogging] Failed to log run for {}: {}", tool, e);
    }
}

fn history_row(run: &NewToolRun) -> Map<String, Value> {
    let mut row = Map::new();
    row.insert("user_id".into(), json!(run.user_id));
    row.insert("tool_name".into(), json!(run.tool_name.as_str()));
    row.insert("inputs".into(), run.inputs.clone());
    row.insert("outputs".into(), run.outputs.clone());
    row.insert("status".into(), json!(run.status.as_str()));
    row.insert("error_message".into(), json!(run.error_message));
    row.insert("brand_id".into(), json!(run.brand_id));
    row
}
