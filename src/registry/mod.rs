//! Tool registry, dispatcher, and result normalizer.
//!
//! The registry is built once at startup and read-only afterwards; every
//! call flows lookup -> validate -> dispatch -> normalize and always ends
//! in exactly one [`OutboundResponse`].

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::error;

use crate::schema::{validate, ParamSchema, ValidationError};

// ---------------------------------------------------------------------------
// Tool trait
// ---------------------------------------------------------------------------

/// A named, schema-described remotely invocable operation.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Tool name (used in call routing; unique within the registry).
    fn name(&self) -> &str;

    /// Human-readable description.
    fn description(&self) -> &str;

    /// Typed input contract, interpreted by the generic validator.
    fn schema(&self) -> &ParamSchema;

    /// Execute the tool with validated arguments.
    async fn invoke(&self, args: Map<String, Value>) -> Result<Value>;
}

// ---------------------------------------------------------------------------
// Errors and per-call values
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RegistryError {
    #[error("tool '{0}' is already registered")]
    DuplicateTool(String),

    #[error("unknown tool: {0}")]
    UnknownTool(String),
}

/// Why a call failed before or during handler execution.
#[derive(Debug, Clone, Error)]
pub enum CallError {
    #[error(transparent)]
    UnknownTool(#[from] RegistryError),

    #[error(transparent)]
    Invalid(#[from] ValidationError),
}

/// A call that passed schema validation in full. This is the only path by
/// which a call may proceed to dispatch.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedCall {
    tool: String,
    args: Map<String, Value>,
}

impl ValidatedCall {
    pub fn tool(&self) -> &str {
        &self.tool
    }

    pub fn args(&self) -> &Map<String, Value> {
        &self.args
    }
}

/// What a dispatch produced: exactly one of success or failure.
#[derive(Debug, Clone)]
pub enum InvocationResult {
    Success(Value),
    Failure { kind: ErrorKind, message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    UnknownTool,
    Validation,
    Handler,
}

/// The uniform shape sent over the wire for every tool call.
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundResponse {
    pub content: String,
    pub is_error: bool,
}

impl InvocationResult {
    /// Fold into the outbound shape. Total: every result maps to exactly
    /// one response. Structured success payloads serialize to JSON text;
    /// textual payloads pass through unchanged.
    pub fn normalize(self, tool: &str) -> OutboundResponse {
        match self {
            Self::Success(Value::String(text)) => OutboundResponse {
                content: text,
                is_error: false,
            },
            Self::Success(payload) => OutboundResponse {
                content: serde_json::to_string(&payload)
                    .unwrap_or_else(|_| String::from("null")),
                is_error: false,
            },
            Self::Failure { message, .. } => OutboundResponse {
                content: format!("Error executing tool {tool}: {message}"),
                is_error: true,
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Name-keyed set of tools. Registration happens once at startup; after
/// that the registry is shared immutably, so concurrent reads need no
/// synchronization.
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool. Fails if the name is already taken.
    pub fn register(&mut self, tool: Arc<dyn Tool>) -> Result<(), RegistryError> {
        let name = tool.name().to_string();
        if self.index.contains_key(&name) {
            return Err(RegistryError::DuplicateTool(name));
        }
        self.index.insert(name, self.tools.len());
        self.tools.push(tool);
        Ok(())
    }

    /// Look up a tool by name.
    pub fn lookup(&self, name: &str) -> Result<&Arc<dyn Tool>, RegistryError> {
        self.index
            .get(name)
            .map(|&i| &self.tools[i])
            .ok_or_else(|| RegistryError::UnknownTool(name.to_string()))
    }

    /// Registered tools in registration order.
    pub fn tools(&self) -> &[Arc<dyn Tool>] {
        &self.tools
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Resolve the schema for `name` and validate `raw_args` against it.
    pub fn validate(&self, name: &str, raw_args: &Value) -> Result<ValidatedCall, CallError> {
        let tool = self.lookup(name)?;
        let args = validate(tool.schema(), raw_args)?;
        Ok(ValidatedCall {
            tool: name.to_string(),
            args,
        })
    }

    /// Invoke the handler bound to a validated call.
    ///
    /// Handler failures are caught here and folded into a `Failure`; no
    /// error escapes to the transport layer. Each call is attempted
    /// exactly once, with no retries.
    pub async fn dispatch(&self, call: ValidatedCall) -> InvocationResult {
        let tool = match self.lookup(&call.tool) {
            Ok(tool) => tool,
            Err(err) => {
                return InvocationResult::Failure {
                    kind: ErrorKind::UnknownTool,
                    message: err.to_string(),
                }
            }
        };

        match tool.invoke(call.args).await {
            Ok(payload) => InvocationResult::Success(payload),
            Err(err) => {
                error!(tool = %call.tool, "handler failed: {err:#}");
                InvocationResult::Failure {
                    kind: ErrorKind::Handler,
                    message: err.to_string(),
                }
            }
        }
    }

    /// Full per-call pipeline: validate, dispatch, and classify failures.
    /// Always returns a result; never panics or propagates.
    pub async fn execute(&self, name: &str, raw_args: &Value) -> InvocationResult {
        match self.validate(name, raw_args) {
            Ok(call) => self.dispatch(call).await,
            Err(CallError::UnknownTool(err)) => InvocationResult::Failure {
                kind: ErrorKind::UnknownTool,
                message: err.to_string(),
            },
            Err(CallError::Invalid(err)) => InvocationResult::Failure {
                kind: ErrorKind::Validation,
                message: err.to_string(),
            },
        }
    }
}
