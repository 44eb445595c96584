//! Component Registry
//!
//! Render components are registered in code against a theme name. Loading is a
//! factory call that may fail; a failed or missing component falls back to the
//! configured fallback theme exactly once.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::common::{ThemeError, ThemeResult};
use crate::themes::ThemeConfig;

/// Input handed to a render component
#[derive(Debug, Clone, Copy)]
pub struct RenderContext<'a> {
    pub theme_name: &'a str,
    pub config: &'a ThemeConfig,
    /// True when rendering through a preview token rather than the live site
    pub preview: bool,
}

pub type RenderFn = Arc<dyn Fn(&RenderContext<'_>) -> String + Send + Sync>;

/// Produces a render component, or the reason it could not be loaded
pub type ComponentFactory = Arc<dyn Fn() -> Result<RenderFn, String> + Send + Sync>;

#[derive(Clone)]
pub struct ResolvedComponent {
    /// Theme whose component was actually loaded
    pub theme_name: String,
    pub is_fallback: bool,
    render: RenderFn,
}

impl ResolvedComponent {
    pub fn render(&self, ctx: &RenderContext<'_>) -> String {
        (self.render)(ctx)
    }
}

impl fmt::Debug for ResolvedComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedComponent")
            .field("theme_name", &self.theme_name)
            .field("is_fallback", &self.is_fallback)
            .finish_non_exhaustive()
    }
}

pub struct RendererRegistry {
    components: HashMap<String, ComponentFactory>,
    fallback: String,
}

impl RendererRegistry {
    pub fn new(fallback: impl Into<String>) -> Self {
        Self {
            components: HashMap::new(),
            fallback: fallback.into(),
        }
    }

    pub fn fallback_theme(&self) -> &str {
        &self.fallback
    }

    /// Register a factory for `theme_name`, replacing any previous one.
    pub fn register(&mut self, theme_name: impl Into<String>, factory: ComponentFactory) {
        let theme_name = theme_name.into();
        debug!("Registered component for theme '{}'", theme_name);
        self.components.insert(theme_name, factory);
    }

    /// Register a component that always loads.
    pub fn register_render<F>(&mut self, theme_name: impl Into<String>, render: F)
    where
        F: Fn(&RenderContext<'_>) -> String + Send + Sync + 'static,
    {
        let render: RenderFn = Arc::new(render);
        let factory: ComponentFactory =
            Arc::new(move || -> Result<RenderFn, String> { Ok(render.clone()) });
        self.register(theme_name, factory);
    }

    pub fn contains(&self, theme_name: &str) -> bool {
        self.components.contains_key(theme_name)
    }

    pub fn theme_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.components.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn resolve(&self, theme_name: &str) -> ThemeResult<ResolvedComponent> {
        let reason = match self.load(theme_name) {
            Ok(render) => {
                return Ok(ResolvedComponent {
                    theme_name: theme_name.to_string(),
                    is_fallback: false,
                    render,
                })
            }
            Err(reason) => reason,
        };

        if theme_name == self.fallback {
            return Err(ThemeError::ComponentLoadFailure {
                theme: theme_name.to_string(),
                reason,
            });
        }

        warn!(
            "Component for theme '{}' unavailable ({}), falling back to '{}'",
            theme_name, reason, self.fallback
        );
        match self.load(&self.fallback) {
            Ok(render) => Ok(ResolvedComponent {
                theme_name: self.fallback.clone(),
                is_fallback: true,
                render,
            }),
            Err(fallback_reason) => Err(ThemeError::ComponentLoadFailure {
                theme: theme_name.to_string(),
                reason: format!(
                    "{}; fallback '{}' also failed: {}",
                    reason, self.fallback, fallback_reason
                ),
            }),
        }
    }

    fn load(&self, theme_name: &str) -> Result<RenderFn, String> {
        let factory = self
            .components
            .get(theme_name)
            .ok_or_else(|| "no component registered".to_string())?;
        factory()
    }
}

impl fmt::Debug for RendererRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RendererRegistry")
            .field("components", &self.theme_names())
            .field("fallback", &self.fallback)
            .finish()
    }
}
