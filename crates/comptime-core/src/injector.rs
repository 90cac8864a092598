//! The comptime injector plugin
//!
//! Redirects imports matching a pattern (by default the literal module name
//! `$COMPTIME$`) into a private namespace and serves a synthesized module
//! there, exporting every registry entry as a constant.
//!
//! # Example
//!
//! ```rust
//! use comptime_core::{ComptimeInjector, ComptimeRegistry};
//!
//! let registry = ComptimeRegistry::new();
//! registry.register("answer", 42).unwrap();
//!
//! let injector = ComptimeInjector::new(registry);
//! assert_eq!(injector.synthesize().unwrap(), "export const answer = 42;\n");
//! ```

use regex::Regex;
use std::sync::{Arc, LazyLock};
use tracing::{debug, info};

use crate::config::{ComptimeOptions, SnapshotMode};
use crate::errors::{InjectorError, SynthesisError};
use crate::plugin::{
    Loader, OnLoadArgs, OnLoadOptions, OnLoadResult, OnResolveArgs, OnResolveOptions,
    OnResolveResult, Plugin, PluginBuild,
};
use crate::registry::{ComptimeRegistry, Snapshot};
use crate::synthesis::synthesize_module;

/// Name the injector registers under
pub const PLUGIN_NAME: &str = "comptime";

/// Private namespace that matching imports are moved into
pub const NAMESPACE: &str = "comptime_injected";

/// Conventional import path of the virtual module
pub const DEFAULT_MODULE: &str = "$COMPTIME$";

/// Pattern matching exactly [`DEFAULT_MODULE`]
pub const DEFAULT_PATTERN: &str = r"^\$COMPTIME$";

static DEFAULT_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(DEFAULT_PATTERN).expect("default pattern is a valid regex"));

static ANY_PATH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(".*").expect("'.*' is a valid regex"));

/// Where the load hook takes its entries from
#[derive(Debug, Clone)]
enum EntrySource {
    Live(ComptimeRegistry),
    Frozen(Arc<Snapshot>),
}

impl EntrySource {
    fn snapshot(&self) -> Snapshot {
        match self {
            EntrySource::Live(registry) => registry.snapshot(),
            EntrySource::Frozen(snapshot) => Snapshot::clone(snapshot),
        }
    }
}

/// Build extension that serves registry entries as a virtual module
#[derive(Debug, Clone)]
pub struct ComptimeInjector {
    registry: ComptimeRegistry,
    pattern: Regex,
    loader: Loader,
    snapshot_mode: SnapshotMode,
}

impl ComptimeInjector {
    /// Injector for the default `$COMPTIME$` module
    pub fn new(registry: ComptimeRegistry) -> Self {
        Self::builder(registry).build()
    }

    /// Injector for imports matching `pattern`
    pub fn with_pattern(registry: ComptimeRegistry, pattern: Regex) -> Self {
        Self::builder(registry).pattern(pattern).build()
    }

    pub fn from_options(
        registry: ComptimeRegistry,
        options: &ComptimeOptions,
    ) -> Result<Self, InjectorError> {
        Ok(Self::builder(registry).options(options)?.build())
    }

    pub fn builder(registry: ComptimeRegistry) -> ComptimeInjectorBuilder {
        ComptimeInjectorBuilder::new(registry)
    }

    pub fn pattern(&self) -> &Regex {
        &self.pattern
    }

    pub fn loader(&self) -> Loader {
        self.loader
    }

    pub fn snapshot_mode(&self) -> SnapshotMode {
        self.snapshot_mode
    }

    pub fn registry(&self) -> &ComptimeRegistry {
        &self.registry
    }

    /// Whether an import path would be redirected
    pub fn matches(&self, path: &str) -> bool {
        self.pattern.is_match(path)
    }

    /// Render the module from the registry's current entries
    pub fn synthesize(&self) -> Result<String, SynthesisError> {
        synthesize_module(&self.registry.snapshot())
    }
}

impl Plugin for ComptimeInjector {
    fn name(&self) -> &str {
        PLUGIN_NAME
    }

    fn setup(&self, build: &mut dyn PluginBuild) {
        let pattern = self.pattern.clone();
        build.on_resolve(
            OnResolveOptions::new(self.pattern.clone()),
            Box::new(move |args: &OnResolveArgs| {
                if !pattern.is_match(&args.path) {
                    return Ok(None);
                }
                debug!("Redirecting '{}' into {}", args.path, NAMESPACE);
                Ok(Some(OnResolveResult {
                    path: args.path.clone(),
                    namespace: NAMESPACE.to_string(),
                }))
            }),
        );

        let source = match self.snapshot_mode {
            SnapshotMode::AtLoad => EntrySource::Live(self.registry.clone()),
            SnapshotMode::AtSetup => EntrySource::Frozen(Arc::new(self.registry.snapshot())),
        };
        let loader = self.loader;
        build.on_load(
            OnLoadOptions::new(ANY_PATH.clone()).with_namespace(NAMESPACE),
            Box::new(move |args: &OnLoadArgs| {
                let snapshot = source.snapshot();
                let contents = synthesize_module(&snapshot)?;
                debug!(
                    "Synthesized {}:{} with {} export(s)",
                    args.namespace,
                    args.path,
                    snapshot.len()
                );
                Ok(Some(OnLoadResult {
                    contents,
                    loader,
                    plugin_name: Some(PLUGIN_NAME.to_string()),
                }))
            }),
        );

        info!(
            "Installed {} plugin for /{}/ ({:?} snapshots)",
            PLUGIN_NAME,
            self.pattern.as_str(),
            self.snapshot_mode
        );
    }
}

/// Builder for configuring a [`ComptimeInjector`].
///
/// Defaults: pattern `^\$COMPTIME$`, loader `ts`, snapshots taken at load.
#[derive(Debug, Clone)]
pub struct ComptimeInjectorBuilder {
    registry: ComptimeRegistry,
    pattern: Regex,
    loader: Loader,
    snapshot_mode: SnapshotMode,
}

impl ComptimeInjectorBuilder {
    pub fn new(registry: ComptimeRegistry) -> Self {
        Self {
            registry,
            pattern: DEFAULT_REGEX.clone(),
            loader: Loader::Ts,
            snapshot_mode: SnapshotMode::AtLoad,
        }
    }

    pub fn pattern(mut self, pattern: Regex) -> Self {
        self.pattern = pattern;
        self
    }

    /// Compile and set the import pattern
    pub fn pattern_str(self, pattern: &str) -> Result<Self, InjectorError> {
        let pattern = Regex::new(pattern)?;
        Ok(self.pattern(pattern))
    }

    pub fn loader(mut self, loader: Loader) -> Self {
        self.loader = loader;
        self
    }

    pub fn snapshot_mode(mut self, mode: SnapshotMode) -> Self {
        self.snapshot_mode = mode;
        self
    }

    /// Apply pattern, loader and snapshot mode from options
    pub fn options(self, options: &ComptimeOptions) -> Result<Self, InjectorError> {
        Ok(self
            .pattern_str(&options.pattern)?
            .loader(options.loader)
            .snapshot_mode(options.snapshot_mode))
    }

    pub fn build(self) -> ComptimeInjector {
        ComptimeInjector {
            registry: self.registry,
            pattern: self.pattern,
            loader: self.loader,
            snapshot_mode: self.snapshot_mode,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugin::{LoadCallback, ResolveCallback, FILE_NAMESPACE};
    use std::path::PathBuf;

    /// Captures installed hooks so they can be called directly
    #[derive(Default)]
    struct RecordingBuild {
        resolve: Vec<(OnResolveOptions, ResolveCallback)>,
        load: Vec<(OnLoadOptions, LoadCallback)>,
    }

    impl PluginBuild for RecordingBuild {
        fn on_resolve(&mut self, options: OnResolveOptions, callback: ResolveCallback) {
            self.resolve.push((options, callback));
        }

        fn on_load(&mut self, options: OnLoadOptions, callback: LoadCallback) {
            self.load.push((options, callback));
        }
    }

    fn resolve_args(path: &str) -> OnResolveArgs {
        OnResolveArgs {
            path: path.to_string(),
            importer: Some("/project/index.ts".to_string()),
            namespace: FILE_NAMESPACE.to_string(),
            resolve_dir: PathBuf::from("/project"),
        }
    }

    fn load_args() -> OnLoadArgs {
        OnLoadArgs {
            path: DEFAULT_MODULE.to_string(),
            namespace: NAMESPACE.to_string(),
        }
    }

    #[test]
    fn test_name_is_fixed() {
        let injector = ComptimeInjector::new(ComptimeRegistry::new());
        assert_eq!(injector.name(), "comptime");
    }

    #[test]
    fn test_setup_installs_one_hook_each() {
        let injector = ComptimeInjector::new(ComptimeRegistry::new());
        let mut build = RecordingBuild::default();
        injector.setup(&mut build);

        assert_eq!(build.resolve.len(), 1);
        assert_eq!(build.load.len(), 1);
        assert_eq!(build.resolve[0].0.filter.as_str(), DEFAULT_PATTERN);
        assert_eq!(build.load[0].0.namespace.as_deref(), Some(NAMESPACE));
    }

    #[test]
    fn test_resolve_hook_claims_only_matching_paths() {
        let injector = ComptimeInjector::new(ComptimeRegistry::new());
        let mut build = RecordingBuild::default();
        injector.setup(&mut build);
        let (_, resolve) = &build.resolve[0];

        let claimed = resolve(&resolve_args("$COMPTIME$")).unwrap().unwrap();
        assert_eq!(claimed.path, "$COMPTIME$");
        assert_eq!(claimed.namespace, NAMESPACE);

        assert!(resolve(&resolve_args("./$COMPTIME$")).unwrap().is_none());
        assert!(resolve(&resolve_args("$COMPTIME$.ts")).unwrap().is_none());
    }

    #[test]
    fn test_load_hook_snapshots_at_load_time() {
        let registry = ComptimeRegistry::new();
        let injector = ComptimeInjector::new(registry.clone());
        let mut build = RecordingBuild::default();
        injector.setup(&mut build);

        registry.register("late", "value").unwrap();

        let (_, load) = &build.load[0];
        let result = load(&load_args()).unwrap().unwrap();
        assert_eq!(result.contents, "export const late = \"value\";\n");
        assert_eq!(result.loader, Loader::Ts);
        assert_eq!(result.plugin_name.as_deref(), Some(PLUGIN_NAME));
    }

    #[test]
    fn test_setup_snapshot_mode_freezes_entries() {
        let registry = ComptimeRegistry::new();
        registry.register("early", 1).unwrap();

        let injector = ComptimeInjector::builder(registry.clone())
            .snapshot_mode(SnapshotMode::AtSetup)
            .build();
        let mut build = RecordingBuild::default();
        injector.setup(&mut build);

        registry.register("late", 2).unwrap();

        let (_, load) = &build.load[0];
        let result = load(&load_args()).unwrap().unwrap();
        assert_eq!(result.contents, "export const early = 1;\n");
    }

    #[test]
    fn test_custom_pattern_and_loader() {
        let injector = ComptimeInjector::builder(ComptimeRegistry::new())
            .pattern_str(r"^virtual:build-info$")
            .unwrap()
            .loader(Loader::Js)
            .build();

        assert!(injector.matches("virtual:build-info"));
        assert!(!injector.matches("$COMPTIME$"));
        assert_eq!(injector.loader(), Loader::Js);
    }

    #[test]
    fn test_invalid_pattern() {
        let result = ComptimeInjector::builder(ComptimeRegistry::new()).pattern_str("([");
        assert!(matches!(result, Err(InjectorError::InvalidPattern(_))));
    }

    #[test]
    fn test_from_options() {
        let options = ComptimeOptions {
            pattern: "^@consts$".to_string(),
            snapshot_mode: SnapshotMode::AtSetup,
            ..ComptimeOptions::default()
        };
        let injector = ComptimeInjector::from_options(ComptimeRegistry::new(), &options).unwrap();

        assert!(injector.matches("@consts"));
        assert_eq!(injector.snapshot_mode(), SnapshotMode::AtSetup);
    }
}
