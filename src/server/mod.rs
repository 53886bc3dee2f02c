//! MCP server loop over stdio.
//!
//! Frames are newline-delimited JSON-RPC 2.0 messages. Stdout carries
//! protocol frames only; every diagnostic goes to stderr via tracing.
//! The loop serves until stdin reaches EOF, handling one frame at a time;
//! per-call state never outlives its frame.

pub mod wire;

use std::sync::Arc;

use anyhow::{Context, Result};
use serde_json::{json, Value};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, info};

use crate::registry::ToolRegistry;
use wire::{CallToolParams, Request, Response, ToolDescriptor};

/// The MCP server: a read-only registry plus the frame loop.
pub struct Server {
    registry: Arc<ToolRegistry>,
}

impl Server {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self { registry }
    }

    /// Serve over the process stdio until EOF.
    pub async fn run_stdio(&self) -> Result<()> {
        let stdin = BufReader::new(tokio::io::stdin());
        let stdout = tokio::io::stdout();
        self.run(stdin, stdout).await
    }

    /// Serve frames from `reader`, writing responses to `writer`.
    pub async fn run<R, W>(&self, reader: R, mut writer: W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        info!("serving {} tools", self.registry.len());

        let mut lines = reader.lines();
        while let Some(line) = lines.next_line().await.context("Failed to read frame")? {
            if line.trim().is_empty() {
                continue;
            }
            if let Some(response) = self.handle_frame(&line).await {
                writer
                    .write_all(response.as_bytes())
                    .await
                    .context("Failed to write frame")?;
                writer.write_all(b"\n").await.context("Failed to write frame")?;
                writer.flush().await.context("Failed to flush frame")?;
            }
        }

        info!("stdin closed, shutting down");
        Ok(())
    }

    /// Process one frame. Returns the serialized response, or None for
    /// notifications.
    async fn handle_frame(&self, line: &str) -> Option<String> {
        let request: Request = match serde_json::from_str(line) {
            Ok(request) => request,
            Err(err) => {
                let response =
                    Response::failure(Value::Null, wire::PARSE_ERROR, format!("parse error: {err}"));
                return serde_json::to_string(&response).ok();
            }
        };

        debug!(method = %request.method, "frame received");

        // Notifications get processed (nothing to do for the ones we
        // receive) but never answered.
        let id = request.id?;

        let response = match request.method.as_str() {
            "initialize" => Response::success(id, wire::initialize_result()),
            "ping" => Response::success(id, json!({})),
            "tools/list" => Response::success(id, json!({"tools": self.descriptors()})),
            "tools/call" => self.handle_call(id, request.params).await,
            method => Response::failure(
                id,
                wire::METHOD_NOT_FOUND,
                format!("method not found: {method}"),
            ),
        };

        serde_json::to_string(&response).ok()
    }

    async fn handle_call(&self, id: Value, params: Option<Value>) -> Response {
        let params: CallToolParams = match serde_json::from_value(params.unwrap_or(Value::Null)) {
            Ok(params) => params,
            Err(err) => {
                return Response::failure(
                    id,
                    wire::INVALID_PARAMS,
                    format!("invalid tools/call params: {err}"),
                )
            }
        };

        let result = self.registry.execute(&params.name, &params.arguments).await;
        let outbound = result.normalize(&params.name);
        Response::success(id, wire::text_result(&outbound.content, outbound.is_error))
    }

    fn descriptors(&self) -> Vec<ToolDescriptor> {
        self.registry
            .tools()
            .iter()
            .map(|tool| ToolDescriptor {
                name: tool.name().to_string(),
                description: tool.description().to_string(),
                input_schema: tool.schema().json_schema(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Tool;
    use crate::schema::{Field, FieldKind, ParamSchema};
    use async_trait::async_trait;
    use serde_json::Map;

    struct UpperTool {
        schema: ParamSchema,
    }

    impl UpperTool {
        fn new() -> Self {
            Self {
                schema: ParamSchema::new().field(Field::required("text", FieldKind::Str)),
            }
        }
    }

    #[async_trait]
    impl Tool for UpperTool {
        fn name(&self) -> &str {
            "upper"
        }

        fn description(&self) -> &str {
            "Uppercase the input"
        }

        fn schema(&self) -> &ParamSchema {
            &self.schema
        }

        async fn invoke(&self, args: Map<String, Value>) -> Result<Value> {
            let text = args["text"].as_str().unwrap_or_default();
            Ok(json!(text.to_uppercase()))
        }
    }

    fn server() -> Server {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(UpperTool::new())).unwrap();
        Server::new(Arc::new(registry))
    }

    async fn roundtrip(frame: Value) -> Option<Value> {
        let response = server().handle_frame(&frame.to_string()).await?;
        serde_json::from_str(&response).ok()
    }

    #[tokio::test]
    async fn initialize_reports_server_info() {
        let frame = roundtrip(json!({
            "jsonrpc": "2.0", "id": 1, "method": "initialize", "params": {}
        }))
        .await
        .unwrap();
        assert_eq!(frame["result"]["protocolVersion"], wire::PROTOCOL_VERSION);
        assert_eq!(frame["result"]["serverInfo"]["name"], "evalgate");
    }

    #[tokio::test]
    async fn tools_list_publishes_descriptors() {
        let frame = roundtrip(json!({
            "jsonrpc": "2.0", "id": 2, "method": "tools/list"
        }))
        .await
        .unwrap();
        let tools = frame["result"]["tools"].as_array().unwrap();
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0]["name"], "upper");
        assert_eq!(tools[0]["inputSchema"]["type"], "object");
    }

    #[tokio::test]
    async fn tools_call_round_trips() {
        let frame = roundtrip(json!({
            "jsonrpc": "2.0", "id": 3, "method": "tools/call",
            "params": {"name": "upper", "arguments": {"text": "hi"}}
        }))
        .await
        .unwrap();
        assert_eq!(frame["result"]["isError"], false);
        assert_eq!(frame["result"]["content"][0]["text"], "HI");
    }

    #[tokio::test]
    async fn unknown_tool_is_an_error_result_not_a_fault() {
        let frame = roundtrip(json!({
            "jsonrpc": "2.0", "id": 4, "method": "tools/call",
            "params": {"name": "nonexistent", "arguments": {}}
        }))
        .await
        .unwrap();
        assert_eq!(frame["result"]["isError"], true);
        let text = frame["result"]["content"][0]["text"].as_str().unwrap();
        assert!(text.starts_with("Error executing tool nonexistent:"));
    }

    #[tokio::test]
    async fn validation_failure_is_an_error_result() {
        let frame = roundtrip(json!({
            "jsonrpc": "2.0", "id": 5, "method": "tools/call",
            "params": {"name": "upper", "arguments": {}}
        }))
        .await
        .unwrap();
        assert_eq!(frame["result"]["isError"], true);
        let text = frame["result"]["content"][0]["text"].as_str().unwrap();
        assert!(text.contains("missing required parameter 'text'"));
    }

    #[tokio::test]
    async fn notifications_get_no_response() {
        let response = server()
            .handle_frame(&json!({"jsonrpc": "2.0", "method": "notifications/initialized"}).to_string())
            .await;
        assert!(response.is_none());
    }

    #[tokio::test]
    async fn malformed_frame_answers_parse_error() {
        let frame: Value =
            serde_json::from_str(&server().handle_frame("{not json").await.unwrap()).unwrap();
        assert_eq!(frame["error"]["code"], wire::PARSE_ERROR);
    }

    #[tokio::test]
    async fn unknown_method_answers_method_not_found() {
        let frame = roundtrip(json!({
            "jsonrpc": "2.0", "id": 6, "method": "resources/list"
        }))
        .await
        .unwrap();
        assert_eq!(frame["error"]["code"], wire::METHOD_NOT_FOUND);
    }

    #[tokio::test]
    async fn loop_serves_frames_until_eof() {
        let input = format!(
            "{}\n{}\n",
            json!({"jsonrpc": "2.0", "id": 1, "method": "ping"}),
            json!({"jsonrpc": "2.0", "id": 2, "method": "tools/call",
                   "params": {"name": "upper", "arguments": {"text": "eof"}}}),
        );
        let mut output = Vec::new();

        server()
            .run(BufReader::new(input.as_bytes()), &mut output)
            .await
            .unwrap();

        let text = String::from_utf8(output).unwrap();
        let frames: Vec<Value> = text
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0]["id"], 1);
        assert_eq!(frames[1]["result"]["content"][0]["text"], "EOF");
    }
}
