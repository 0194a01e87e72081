use anyhow::{Context, Result};
use serde_json::{json, Value};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, info, warn};

use crate::fetch::PageFetcher;
use crate::tools::{tool_definitions, Toolbox};

pub const PROTOCOL_VERSION: &str = "2024-11-05";
pub const SERVER_NAME: &str = "simpler-recipes";

const PARSE_ERROR: i64 = -32700;
const INVALID_REQUEST: i64 = -32600;
const METHOD_NOT_FOUND: i64 = -32601;
const INVALID_PARAMS: i64 = -32602;

/// Serve line-delimited JSON-RPC on stdin/stdout until stdin closes.
pub async fn serve_stdio<F: PageFetcher>(toolbox: Toolbox<F>) -> Result<()> {
    info!("{} {} listening on stdio", SERVER_NAME, env!("CARGO_PKG_VERSION"));
    let stdin = BufReader::new(tokio::io::stdin());
    let stdout = tokio::io::stdout();
    run(&toolbox, stdin, stdout).await
}

/// One JSON message per line in, one response per line out.
pub async fn run<F, R, W>(toolbox: &Toolbox<F>, reader: R, mut writer: W) -> Result<()>
where
    F: PageFetcher,
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = reader.lines();
    while let Some(line) = lines.next_line().await.context("Failed to read request")? {
        if line.trim().is_empty() {
            continue;
        }
        if let Some(response) = handle_line(toolbox, &line).await {
            let mut out = serde_json::to_string(&response)?;
            out.push('\n');
            writer
                .write_all(out.as_bytes())
                .await
                .context("Failed to write response")?;
            writer.flush().await?;
        }
    }
    info!("stdin closed, shutting down");
    Ok(())
}

/// Returns `None` for notifications and stray responses.
pub async fn handle_line<F: PageFetcher>(toolbox: &Toolbox<F>, line: &str) -> Option<Value> {
    let msg: Value = match serde_json::from_str(line) {
        Ok(v) => v,
        Err(e) => {
            warn!("Unparseable message: {}", e);
            return Some(error_response(Value::Null, PARSE_ERROR, "Parse error"));
        }
    };

    // Batches and bare values are not served.
    if !msg.is_object() {
        warn!("Message is not a JSON-RPC object");
        return Some(error_response(Value::Null, INVALID_REQUEST, "Invalid Request"));
    }

    let id = msg.get("id").cloned();
    let Some(method) = msg.get("method").and_then(Value::as_str) else {
        return id
            .filter(|_| msg.get("result").is_none() && msg.get("error").is_none())
            .map(|id| error_response(id, INVALID_REQUEST, "Invalid Request"));
    };

    let Some(id) = id else {
        debug!("notification {}", method);
        return None;
    };

    let params = msg.get("params").cloned().unwrap_or(Value::Null);
    Some(match method {
        "initialize" => result_response(
            id,
            json!({
                "protocolVersion": PROTOCOL_VERSION,
                "capabilities": { "tools": {} },
                "serverInfo": {
                    "name": SERVER_NAME,
                    "version": env!("CARGO_PKG_VERSION"),
                }
            }),
        ),
        "ping" => result_response(id, json!({})),
        "tools/list" => result_response(id, json!({ "tools": tool_definitions() })),
        "tools/call" => {
            let Some(name) = params.get("name").and_then(Value::as_str) else {
                return Some(error_response(id, INVALID_PARAMS, "Missing tool name"));
            };
            let args = params.get("arguments").cloned().unwrap_or_else(|| json!({}));
            let result = toolbox.call(name, &args).await;
            match serde_json::to_value(result) {
                Ok(v) => result_response(id, v),
                Err(e) => error_response(id, INVALID_PARAMS, &e.to_string()),
            }
        }
        other => {
            warn!("Unknown method {}", other);
            error_response(id, METHOD_NOT_FOUND, &format!("Method not found: {}", other))
        }
    })
}

fn result_response(id: Value, result: Value) -> Value {
    json!({ "jsonrpc": "2.0", "id": id, "result": result })
}

fn error_response(id: Value, code: i64, message: &str) -> Value {
    json!({ "jsonrpc": "2.0", "id": id, "error": { "code": code, "message": message } })
}

// ── Tests ──
