//! Per-request rendering state shared by every construct renderer.

use crate::environment::RenderEnvironment;
use crate::error::RenderError;
use crate::library::{Symbol, SymbolLibrary, parse_library};
use crate::settings::RenderSettings;
use log::{debug, warn};
use schsvg_lexer::{GrammarMode, Tokenizer};
use schsvg_svg::{SvgWriter, WriterStack};
use schsvg_traits::Cancellation;
use std::collections::HashMap;
use std::sync::Arc;

/// State of one render request: the active tokenizer and writer, the
/// settings, and the libraries declared by the schematic.
///
/// The root tokenizer and the base writer are always present. Nested
/// tokenizers (libraries) and redirected writers (captures) are pushed on
/// top and popped when done.
pub struct RenderSession<'a> {
    environment: &'a dyn RenderEnvironment,
    root: Tokenizer,
    nested: Vec<Tokenizer>,
    writers: WriterStack,
    settings: RenderSettings,
    cancel: Cancellation,
    declared_libraries: Vec<String>,
    libraries: Option<Vec<SymbolLibrary>>,
    symbols: HashMap<String, Option<Arc<Symbol>>>,
}

impl std::fmt::Debug for RenderSession<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderSession")
            .field("document", &self.root.name())
            .field("nested", &self.nested.len())
            .field("writers", &self.writers)
            .field("libraries", &self.declared_libraries)
            .finish_non_exhaustive()
    }
}

impl<'a> RenderSession<'a> {
    pub fn new(
        environment: &'a dyn RenderEnvironment,
        root: Tokenizer,
        writer: SvgWriter,
        settings: RenderSettings,
        cancel: Cancellation,
    ) -> Self {
        Self {
            environment,
            root,
            nested: Vec::new(),
            writers: WriterStack::new(writer),
            settings,
            cancel,
            declared_libraries: Vec::new(),
            libraries: None,
            symbols: HashMap::new(),
        }
    }

    /// The tokenizer of the document currently being walked.
    pub fn tokenizer(&mut self) -> &mut Tokenizer {
        self.nested.last_mut().unwrap_or(&mut self.root)
    }

    pub fn push_tokenizer(&mut self, tokenizer: Tokenizer) {
        self.nested.push(tokenizer);
    }

    /// Drops the most recently pushed tokenizer. The root is never popped.
    pub fn pop_tokenizer(&mut self) -> Option<Tokenizer> {
        self.nested.pop()
    }

    /// The active writer.
    pub fn writer(&mut self) -> &mut SvgWriter {
        self.writers.current_mut()
    }

    pub fn writers(&mut self) -> &mut WriterStack {
        &mut self.writers
    }

    pub fn settings(&self) -> &RenderSettings {
        &self.settings
    }

    pub fn cancellation(&self) -> &Cancellation {
        &self.cancel
    }

    pub fn check_cancelled(&self) -> Result<(), RenderError> {
        if self.cancel.is_cancelled() {
            return Err(RenderError::Cancelled);
        }
        Ok(())
    }

    pub fn declare_library(&mut self, name: impl Into<String>) {
        let name = name.into();
        debug!("declared library {name}");
        self.declared_libraries.push(name);
    }

    pub fn declared_libraries(&self) -> &[String] {
        &self.declared_libraries
    }

    /// Splits the session into its base writer, for failure handling.
    pub fn into_base_writer(self) -> SvgWriter {
        self.writers.into_base()
    }

    pub fn base_writer(&mut self) -> &mut SvgWriter {
        self.writers.base_mut()
    }

    /// Looks a symbol up by name in the declared libraries, in declaration
    /// order. A `nickname:` prefix is ignored. Libraries are loaded on the
    /// first lookup.
    pub async fn find_symbol(&mut self, name: &str) -> Result<Option<Arc<Symbol>>, RenderError> {
        let name = name.rsplit_once(':').map_or(name, |(_, symbol)| symbol);
        if let Some(cached) = self.symbols.get(name) {
            return Ok(cached.clone());
        }
        if self.libraries.is_none() {
            let loaded = self.load_libraries().await?;
            self.libraries = Some(loaded);
        }
        let found = self
            .libraries
            .iter()
            .flatten()
            .find_map(|library| library.get(name));
        if found.is_none() {
            warn!("symbol '{name}' not found in any declared library");
        }
        self.symbols.insert(name.to_string(), found.clone());
        Ok(found)
    }

    async fn load_libraries(&mut self) -> Result<Vec<SymbolLibrary>, RenderError> {
        let mut loaded = Vec::new();
        for name in self.declared_libraries.clone() {
            self.check_cancelled()?;
            let file_name = format!("{name}.lib");
            let source = match self
                .environment
                .create_library_source(&file_name, &self.cancel)
                .await
            {
                Ok(source) => source,
                Err(err) => {
                    self.check_cancelled()?;
                    warn!("skipping library {file_name}: {err}");
                    continue;
                }
            };

            self.push_tokenizer(Tokenizer::new(
                source,
                GrammarMode::Library,
                self.cancel.clone(),
            ));
            let parsed = parse_library(self.tokenizer(), &name).await;
            self.pop_tokenizer();
            let library = parsed?;
            debug!("loaded library {name} with {} symbols", library.len());
            loaded.push(library);
        }
        Ok(loaded)
    }
}
