//! Handler Registry
//!
//! Dispatches JSON-RPC requests to the theme and preview handlers.

pub mod common;
pub mod preview;
pub mod themes;

use serde_json::{json, Value};
use std::sync::Arc;
use tracing::debug;
use vitrine::ThemeService;

use crate::protocol::{JsonRpcRequest, JsonRpcResponse};

pub struct HandlerRegistry {
    service: Arc<ThemeService>,
}

impl HandlerRegistry {
    pub fn new(service: Arc<ThemeService>) -> Self {
        Self { service }
    }

    /// Handle a JSON-RPC request
    pub async fn handle(&self, request: &JsonRpcRequest) -> JsonRpcResponse {
        let id = request.id.clone().unwrap_or(Value::Null);

        if let Err(message) = request.validate() {
            return JsonRpcResponse::invalid_request(id, message);
        }

        debug!("Handling method: {}", request.method);

        let (namespace, action) = request.parse_method();
        match namespace {
            "themes" => themes::handle(&self.service, action, &request.params, id).await,
            "preview" => preview::handle(&self.service, action, &request.params, id).await,
            "server" => self.handle_server(action, id),
            _ => JsonRpcResponse::method_not_found(id, &request.method),
        }
    }

    /// Handle every request in order, dropping responses to notifications.
    pub async fn handle_all(&self, requests: &[JsonRpcRequest]) -> Vec<JsonRpcResponse> {
        let mut responses = Vec::with_capacity(requests.len());
        for request in requests {
            let response = self.handle(request).await;
            if !request.is_notification() {
                responses.push(response);
            }
        }
        responses
    }

    fn handle_server(&self, action: &str, id: Value) -> JsonRpcResponse {
        match action {
            "status" => {
                let config = self.service.config();
                JsonRpcResponse::success(
                    id,
                    json!({
                        "status": "running",
                        "version": env!("CARGO_PKG_VERSION"),
                        "pluginsRoot": config.plugins_root.display().to_string(),
                        "defaultTheme": config.default_theme,
                    }),
                )
            }
            _ => JsonRpcResponse::method_not_found(id, &format!("server.{}", action)),
        }
    }
}
