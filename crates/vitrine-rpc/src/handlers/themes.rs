//! Themes Handler
//!
//! Admin operations over installed themes plus the public-site render.

use serde_json::{json, Value};
use vitrine::ThemeService;

use super::common::{ok, require_bool, require_string, require_value, simple_success, theme_error};
use crate::protocol::JsonRpcResponse;

pub async fn handle(service: &ThemeService, action: &str, params: &Value, id: Value) -> JsonRpcResponse {
    match action {
        "list" => handle_list(service, id).await,
        "activate" => handle_activate(service, params, id).await,
        "setEnabled" => handle_set_enabled(service, params, id).await,
        "getConfig" => handle_get_config(service, params, id).await,
        "updateConfig" => handle_update_config(service, params, id).await,
        "active" => handle_active(service, id).await,
        _ => JsonRpcResponse::method_not_found(id, &format!("themes.{}", action)),
    }
}

async fn handle_list(service: &ThemeService, id: Value) -> JsonRpcResponse {
    let themes = service.list_themes().await;
    let count = themes.len();
    ok(id, &json!({ "themes": themes, "count": count }))
}

/// Params:
///   - name: theme to make active
async fn handle_activate(service: &ThemeService, params: &Value, id: Value) -> JsonRpcResponse {
    let name = match require_string(params, "name", &id) {
        Ok(n) => n,
        Err(response) => return response,
    };

    match service.activate_theme(name).await {
        Ok(()) => ok(id, &json!({ "success": true, "activeTheme": name })),
        Err(e) => theme_error(id, e),
    }
}

/// Params:
///   - name: theme to change
///   - enabled: new operator flag
async fn handle_set_enabled(service: &ThemeService, params: &Value, id: Value) -> JsonRpcResponse {
    let name = match require_string(params, "name", &id) {
        Ok(n) => n,
        Err(response) => return response,
    };
    let enabled = match require_bool(params, "enabled", &id) {
        Ok(e) => e,
        Err(response) => return response,
    };

    match service.set_theme_enabled(name, enabled).await {
        Ok(()) => simple_success(id),
        Err(e) => theme_error(id, e),
    }
}

async fn handle_get_config(service: &ThemeService, params: &Value, id: Value) -> JsonRpcResponse {
    let name = match require_string(params, "name", &id) {
        Ok(n) => n,
        Err(response) => return response,
    };

    match service.theme_config(name).await {
        Ok(config) => ok(id, &json!({ "name": name, "config": config })),
        Err(e) => theme_error(id, e),
    }
}

/// Params:
///   - name: theme to configure
///   - config: raw value, stored as given; the response carries the resolved form
async fn handle_update_config(service: &ThemeService, params: &Value, id: Value) -> JsonRpcResponse {
    let name = match require_string(params, "name", &id) {
        Ok(n) => n,
        Err(response) => return response,
    };
    let config = match require_value(params, "config", &id) {
        Ok(c) => c.clone(),
        Err(response) => return response,
    };

    match service.update_theme_config(name, config).await {
        Ok(resolved) => ok(id, &json!({ "name": name, "config": resolved })),
        Err(e) => theme_error(id, e),
    }
}

async fn handle_active(service: &ThemeService, id: Value) -> JsonRpcResponse {
    match service.get_active_theme_for_rendering().await {
        Ok(rendering) => ok(
            id,
            &json!({
                "themeName": rendering.theme_name,
                "component": rendering.component.theme_name,
                "fallback": rendering.component.is_fallback,
                "config": rendering.config,
                "html": rendering.render(),
            }),
        ),
        Err(e) => theme_error(id, e),
    }
}
