//! Generation pipeline: configuration block in, artifacts out

pub mod form;
pub mod lookup;
pub mod registry;

pub use form::*;
pub use lookup::*;
pub use registry::*;

use serde_yaml::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::config::tree::{has_key, load_block};
use crate::config::{FormConfig, GeneratorConfig, APP_DIR_TAG, DEFAULT_IDENTIFIER};
use crate::debug::{DebugLog, DebugLogger};
use crate::error::{GenerateError, Result};
use crate::filter::TableFilter;
use crate::resolve::{block_variables, substitute_block};
use crate::schema::{CommonMatchFinder, SchemaInfoProvider};
use crate::writer::{form_file, lookup_file, ArtifactWriter};

/// Extension point run against the resolved configuration block
pub trait BlockHook {
    fn name(&self) -> &str;
    fn run(&mut self, block: &Value, writer: &mut dyn ArtifactWriter) -> Result<()>;
}

/// What a run produced
#[derive(Debug, Default)]
pub struct GenerationReport {
    pub forms: Vec<FormDefinition>,
    pub lookups: Vec<LookupDefinition>,
    /// Written artifact paths, in write order
    pub written: Vec<PathBuf>,
}

/// Runs the list hook, the form generator and the after-generate hooks for
/// one configuration block
pub struct Pipeline<'a, P: SchemaInfoProvider + ?Sized> {
    provider: &'a P,
    app_dir: PathBuf,
    filter: TableFilter,
    debug: Box<dyn DebugLog + 'a>,
    list_generator: Option<Box<dyn BlockHook + 'a>>,
    after_hooks: Vec<Box<dyn BlockHook + 'a>>,
}

impl<'a, P: SchemaInfoProvider + ?Sized> Pipeline<'a, P> {
    pub fn new(provider: &'a P, app_dir: impl Into<PathBuf>) -> Self {
        Self {
            provider,
            app_dir: app_dir.into(),
            filter: TableFilter::All,
            debug: Box::new(DebugLogger::disabled()),
            list_generator: None,
            after_hooks: Vec::new(),
        }
    }

    pub fn with_debug(self, debug: impl DebugLog + 'a) -> Self {
        Self {
            debug: Box::new(debug),
            ..self
        }
    }

    pub fn with_filter(self, filter: TableFilter) -> Self {
        Self { filter, ..self }
    }

    /// Generator run when the block has a `list` section
    pub fn with_list_generator(self, hook: impl BlockHook + 'a) -> Self {
        Self {
            list_generator: Some(Box::new(hook)),
            ..self
        }
    }

    /// Hook run after every generator
    pub fn with_after_hook(mut self, hook: impl BlockHook + 'a) -> Self {
        self.after_hooks.push(Box::new(hook));
        self
    }

    /// Load the block `identifier` (default `main`) from `file` and generate it
    pub fn generate_file(
        &mut self,
        file: &Path,
        identifier: Option<&str>,
        writer: &mut dyn ArtifactWriter,
    ) -> Result<GenerationReport> {
        let identifier = identifier.unwrap_or(DEFAULT_IDENTIFIER);
        self.debug.log(&format!(
            "Launching real_generator with identifier=\"{}\" and file=\"{}\".",
            identifier,
            file.display()
        ));

        let block = load_block(file, identifier).map_err(|e| self.fail(e))?;
        self.generate_block(block, writer)
    }

    /// Generate from an already selected configuration block
    pub fn generate_block(&mut self, mut block: Value, writer: &mut dyn ArtifactWriter) -> Result<GenerationReport> {
        let vars = block_variables(&block);
        substitute_block(&mut block, &vars).map_err(|e| self.fail(e))?;

        let mut report = GenerationReport::default();

        if has_key(&block, "list") {
            self.debug.log("List configuration found.");
            if let Some(list) = self.list_generator.as_mut() {
                debug!(hook = list.name(), "running list generator");
                list.run(&block, writer).map_err(|e| {
                    self.debug.log(&format!("Error: {}", e));
                    e
                })?;
            }
        } else {
            self.debug.log("No list configuration found.");
        }

        if has_key(&block, "form") {
            self.debug.log("Form configuration found.");
            let config = GeneratorConfig::from_block(&block).map_err(|e| self.fail(e))?;
            let form = config.form.clone().unwrap_or_default();
            self.run_form(&config, &form, writer, &mut report)
                .map_err(|e| self.fail(e))?;
        } else {
            self.debug.log("No form configuration found.");
        }

        for hook in &mut self.after_hooks {
            debug!(hook = hook.name(), "running after-generate hook");
            hook.run(&block, writer).map_err(|e| {
                self.debug.log(&format!("Error: {}", e));
                e
            })?;
        }

        Ok(report)
    }

    fn fail(&self, error: GenerateError) -> GenerateError {
        self.debug.log(&format!("Error: {}", error));
        error
    }

    /// Build every form, then every lookup, then write them all
    fn run_form(
        &self,
        config: &GeneratorConfig,
        form: &FormConfig,
        writer: &mut dyn ArtifactWriter,
        report: &mut GenerationReport,
    ) -> Result<()> {
        let tables = self.target_tables(config)?;
        info!("Generating forms for {} tables", tables.len());

        let builder = FormBuilder::new(config, form, self.provider, self.debug.as_ref());
        let (forms, registry) = builder.build_all(&tables)?;
        debug!(lookups = registry.len(), "foreign key pickers registered");

        let finder = CommonMatchFinder::new(self.provider)
            .with_common_matches(config.list.common_representative_matches.clone());
        let emitter = LookupEmitter::new(
            &finder,
            form.table_list(),
            config.database_name.as_deref(),
            self.debug.as_ref(),
        );
        let lookups = emitter.emit(registry)?;

        let form_dir = self.expand_dir(form.target_dir());
        for def in &forms {
            let path = form_dir.join(def.file_name());
            writer.write_file(&path, &form_file(def)?)?;
            info!("Wrote form {}", path.display());
            report.written.push(path);
        }

        let lookup_dir = self.expand_dir(form.table_list().target_dir());
        for lookup in &lookups {
            let path = lookup_dir.join(lookup.key.relative_path());
            writer.write_file(&path, &lookup_file(lookup)?)?;
            info!("Wrote table list {}", path.display());
            report.written.push(path);
        }

        report.forms.extend(forms);
        report.lookups.extend(lookups);
        Ok(())
    }

    fn target_tables(&self, config: &GeneratorConfig) -> Result<Vec<String>> {
        let tables = if config.tables.is_empty() {
            self.provider.table_names(config.database_name.as_deref())?
        } else {
            config.tables.clone()
        };
        self.filter.apply(tables)
    }

    /// Substitute the application root in a configured directory
    fn expand_dir(&self, dir: &str) -> PathBuf {
        PathBuf::from(dir.replace(APP_DIR_TAG, &self.app_dir.to_string_lossy()))
    }
}
