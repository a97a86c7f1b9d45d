//! Dispatch from top-level schematic keywords to construct renderers.

use crate::error::RenderError;
use crate::schematic::{
    ComponentRenderer, JunctionRenderer, LineRenderer, NoConnectRenderer, SheetRenderer,
    SkipBlockRenderer, SkipLineRenderer, TextRenderer,
};
use crate::session::RenderSession;
use async_trait::async_trait;
use schsvg_lexer::Token;
use std::collections::HashMap;
use std::sync::Arc;

/// Renders one top-level construct.
///
/// The keyword token has already been consumed. An implementation reads the
/// rest of its construct, including the trailing line break, and leaves
/// format errors to propagate.
#[async_trait]
pub trait ConstructRenderer: Send + Sync {
    async fn render(
        &self,
        session: &mut RenderSession<'_>,
        keyword: &Token,
    ) -> Result<(), RenderError>;
}

/// Maps normalized keywords to renderers.
#[derive(Clone)]
pub struct ConstructRegistry {
    renderers: HashMap<String, Arc<dyn ConstructRenderer>>,
}

impl std::fmt::Debug for ConstructRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut keywords: Vec<_> = self.renderers.keys().collect();
        keywords.sort();
        f.debug_struct("ConstructRegistry")
            .field("keywords", &keywords)
            .finish()
    }
}

/// Lowercases `text` and drops anything after the first `:`.
pub fn normalize_keyword(text: &str) -> String {
    let head = text.split_once(':').map_or(text, |(head, _)| head);
    head.to_ascii_lowercase()
}

impl ConstructRegistry {
    /// Creates a new, empty registry.
    pub fn new() -> Self {
        Self {
            renderers: HashMap::new(),
        }
    }

    /// Registers a renderer, replacing any previous one for the keyword.
    pub fn register(&mut self, keyword: &str, renderer: Arc<dyn ConstructRenderer>) {
        self.renderers.insert(normalize_keyword(keyword), renderer);
    }

    /// Finds a renderer by keyword (case-insensitive).
    pub fn get(&self, keyword: &str) -> Option<Arc<dyn ConstructRenderer>> {
        self.renderers.get(&normalize_keyword(keyword)).cloned()
    }

    pub fn contains(&self, keyword: &str) -> bool {
        self.renderers.contains_key(&normalize_keyword(keyword))
    }
}

impl Default for ConstructRegistry {
    /// Creates a registry populated with every built-in construct.
    fn default() -> Self {
        let mut registry = Self::new();
        let line: Arc<dyn ConstructRenderer> = Arc::new(LineRenderer);
        registry.register("Wire", line.clone());
        registry.register("Entry", line);
        registry.register("Connection", Arc::new(JunctionRenderer));
        registry.register("NoConn", Arc::new(NoConnectRenderer));
        registry.register("Text", Arc::new(TextRenderer));
        registry.register("$Comp", Arc::new(ComponentRenderer));
        registry.register("$Sheet", Arc::new(SheetRenderer));
        registry.register("$Bitmap", Arc::new(SkipBlockRenderer::new("$EndBitmap")));
        registry.register("Kmarker", Arc::new(SkipLineRenderer));
        registry
    }
}
