//! Protection-evaluator adapter: rule checks against a single input.

use anyhow::Result;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

use super::client::PlatformClient;

const PROTECT: &str = "/api/v1/protect";

/// Extra slack on the HTTP deadline so the vendor can report a timeout
/// verdict itself instead of the transport cutting it off first.
const TIMEOUT_MARGIN_MS: u64 = 2_000;

/// Client for the vendor protection evaluator.
#[derive(Debug, Clone)]
pub struct ProtectApi {
    client: PlatformClient,
}

#[derive(Debug, Serialize)]
struct ProtectRequest<'a> {
    inputs: &'a str,
    protect_rules: &'a [Value],
    action: &'a str,
    reason: bool,
    timeout: u64,
}

impl ProtectApi {
    pub fn new(client: PlatformClient) -> Self {
        Self { client }
    }

    /// Run the given rules against one input string.
    ///
    /// `timeout_ms` is forwarded in the request body and also applied as
    /// the HTTP deadline for this call (with a small margin).
    pub async fn check(
        &self,
        inputs: &str,
        rules: &[Value],
        action: &str,
        reason: bool,
        timeout_ms: u64,
    ) -> Result<Value> {
        self.client
            .post_json_with_timeout(
                PROTECT,
                &ProtectRequest {
                    inputs,
                    protect_rules: rules,
                    action,
                    reason,
                    timeout: timeout_ms,
                },
                Duration::from_millis(timeout_ms + TIMEOUT_MARGIN_MS),
            )
            .await
    }
}
