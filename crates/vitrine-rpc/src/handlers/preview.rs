//! Preview Handler
//!
//! Issues and checks theme preview tokens, and renders previews.

use serde_json::{json, Value};
use vitrine::ThemeService;

use super::common::{ok, optional_value, require_string, string_with_default, theme_error};
use crate::protocol::JsonRpcResponse;

pub async fn handle(service: &ThemeService, action: &str, params: &Value, id: Value) -> JsonRpcResponse {
    match action {
        "issue" => handle_issue(service, params, id).await,
        "validate" => handle_validate(service, params, id).await,
        "render" => handle_render(service, params, id).await,
        "purge" => handle_purge(service, id).await,
        _ => JsonRpcResponse::method_not_found(id, &format!("preview.{}", action)),
    }
}

/// Params:
///   - theme: theme the token grants
///   - issuedBy (optional): identity of the requesting admin, default "admin"
async fn handle_issue(service: &ThemeService, params: &Value, id: Value) -> JsonRpcResponse {
    let theme = match require_string(params, "theme", &id) {
        Ok(t) => t,
        Err(response) => return response,
    };
    let issued_by = string_with_default(params, "issuedBy", "admin");

    match service.issue_preview_token(theme, issued_by).await {
        Ok(token) => ok(id, &token),
        Err(e) => theme_error(id, e),
    }
}

async fn handle_validate(service: &ThemeService, params: &Value, id: Value) -> JsonRpcResponse {
    let token = match require_string(params, "token", &id) {
        Ok(t) => t,
        Err(response) => return response,
    };
    let theme = match require_string(params, "theme", &id) {
        Ok(t) => t,
        Err(response) => return response,
    };

    match service.validate_preview_token(token, theme).await {
        Ok(grant) => ok(id, &grant),
        Err(e) => theme_error(id, e),
    }
}

/// Params:
///   - token, theme: as for validate
///   - draft (optional): unsaved config to render instead of the saved one
async fn handle_render(service: &ThemeService, params: &Value, id: Value) -> JsonRpcResponse {
    let token = match require_string(params, "token", &id) {
        Ok(t) => t,
        Err(response) => return response,
    };
    let theme = match require_string(params, "theme", &id) {
        Ok(t) => t,
        Err(response) => return response,
    };
    let draft = optional_value(params, "draft");

    match service.render_preview(token, theme, draft).await {
        Ok(rendering) => ok(
            id,
            &json!({
                "themeName": rendering.theme_name,
                "component": rendering.component.theme_name,
                "config": rendering.config,
                "html": rendering.render(),
            }),
        ),
        Err(e) => theme_error(id, e),
    }
}

async fn handle_purge(service: &ThemeService, id: Value) -> JsonRpcResponse {
    match service.purge_expired_previews().await {
        Ok(purged) => ok(id, &json!({ "purged": purged })),
        Err(e) => theme_error(id, e),
    }
}
