//! Built-in render components.
//!
//! Two plain HTML layouts so the bridge can render something without any
//! site-specific components registered. Both understand the common config
//! keys (`siteTitle`, `tagline`, `accentColor`, `links`, `showSidebar`) and
//! ignore anything else.

use serde_json::Value;
use vitrine::{RenderContext, RendererRegistry};

pub const CLASSIC: &str = "classic";
pub const MINIMAL: &str = "minimal";

/// Registry holding the built-in components, falling back to `fallback`.
pub fn builtin(fallback: &str) -> RendererRegistry {
    let mut registry = RendererRegistry::new(fallback);
    registry.register_render(CLASSIC, render_classic);
    registry.register_render(MINIMAL, render_minimal);
    registry
}

fn render_classic(ctx: &RenderContext<'_>) -> String {
    let accent = text(ctx, "accentColor").unwrap_or("#2563eb");
    let mut html = String::new();

    html.push_str(&format!(
        "<body class=\"theme-{}\" style=\"--accent: {}\">",
        escape(ctx.theme_name),
        escape(accent)
    ));
    if ctx.preview {
        html.push_str("<div class=\"preview-banner\">Preview</div>");
    }
    html.push_str(&format!(
        "<header><h1>{}</h1>",
        escape(text(ctx, "siteTitle").unwrap_or(ctx.theme_name))
    ));
    if let Some(tagline) = text(ctx, "tagline").filter(|t| !t.is_empty()) {
        html.push_str(&format!("<p class=\"tagline\">{}</p>", escape(tagline)));
    }
    html.push_str("</header>");

    let nav = links(ctx);
    if !nav.is_empty() {
        html.push_str("<nav>");
        html.push_str(&nav);
        html.push_str("</nav>");
    }
    html.push_str("<main></main>");
    if ctx.config.get("showSidebar") == Some(&Value::Bool(true)) {
        html.push_str("<aside></aside>");
    }
    html.push_str("</body>");
    html
}

fn render_minimal(ctx: &RenderContext<'_>) -> String {
    let title = text(ctx, "siteTitle").unwrap_or(ctx.theme_name);
    let banner = if ctx.preview { "<small>preview</small>" } else { "" };
    format!(
        "<body class=\"theme-{}\">{}<h1>{}</h1>{}<main></main></body>",
        escape(ctx.theme_name),
        banner,
        escape(title),
        links(ctx)
    )
}

fn text<'a>(ctx: &RenderContext<'a>, key: &str) -> Option<&'a str> {
    ctx.config.get(key).and_then(Value::as_str)
}

/// `links` is a list of `{label, href}` items; malformed items are skipped.
fn links(ctx: &RenderContext<'_>) -> String {
    let Some(items) = ctx.config.get("links").and_then(Value::as_array) else {
        return String::new();
    };

    items
        .iter()
        .filter_map(|item| {
            let href = item.get("href")?.as_str()?;
            let label = item.get("label").and_then(Value::as_str).unwrap_or(href);
            Some(format!("<a href=\"{}\">{}</a>", escape(href), escape(label)))
        })
        .collect()
}

fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use vitrine::ThemeConfig;

    fn config(value: Value) -> ThemeConfig {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_classic_renders_config() {
        let config = config(json!({
            "siteTitle": "Notes & Things",
            "accentColor": "#ff0000",
            "links": [{"label": "Home", "href": "/"}, {"label": "broken"}],
            "showSidebar": true
        }));
        let html = render_classic(&RenderContext {
            theme_name: "classic",
            config: &config,
            preview: false,
        });

        assert!(html.contains("<h1>Notes &amp; Things</h1>"));
        assert!(html.contains("--accent: #ff0000"));
        assert!(html.contains("<a href=\"/\">Home</a>"));
        assert!(!html.contains("broken"));
        assert!(html.contains("<aside>"));
        assert!(!html.contains("preview-banner"));
    }

    #[test]
    fn test_minimal_marks_previews() {
        let config = ThemeConfig::new();
        let html = render_minimal(&RenderContext {
            theme_name: "minimal",
            config: &config,
            preview: true,
        });
        assert!(html.contains("<small>preview</small>"));
        assert!(html.contains("<h1>minimal</h1>"));
    }

    #[test]
    fn test_builtin_registry() {
        let registry = builtin(CLASSIC);
        assert_eq!(registry.theme_names(), vec![CLASSIC, MINIMAL]);
        let component = registry.resolve("custom").unwrap();
        assert!(component.is_fallback);
    }

    #[test]
    fn test_escape() {
        assert_eq!(escape("<a href=\"x\">'&'</a>"), "&lt;a href=&quot;x&quot;&gt;&#39;&amp;&#39;&lt;/a&gt;");
    }
}
