//! A minimal sequential plugin host
//!
//! [`PluginHost`] drives plugins the way a bundler would, without building a
//! module graph: it installs plugins, resolves import paths through their
//! resolution hooks, and loads modules through their load hooks. Paths no
//! plugin claims are served from a [`FileSystem`]. Hook failures are
//! reported to the [`DiagnosticHandler`] attributed to the module being
//! resolved or loaded.

use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::diagnostics::{ConsoleDiagnosticHandler, Diagnostic, DiagnosticHandler, ModuleLocation};
use crate::errors::BuildError;
use crate::fs::{FileSystem, RealFileSystem};
use crate::plugin::{
    HookError, LoadCallback, Loader, OnLoadArgs, OnLoadOptions, OnResolveArgs, OnResolveOptions,
    Plugin, PluginBuild, ResolveCallback, FILE_NAMESPACE,
};

struct ResolveHook {
    plugin: String,
    options: OnResolveOptions,
    callback: ResolveCallback,
}

struct LoadHook {
    plugin: String,
    options: OnLoadOptions,
    callback: LoadCallback,
}

/// A resolved import: a path inside a namespace
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedModule {
    pub path: String,
    pub namespace: String,
}

impl ResolvedModule {
    pub fn file(path: &Path) -> Self {
        Self {
            path: path.to_string_lossy().into_owned(),
            namespace: FILE_NAMESPACE.to_string(),
        }
    }

    pub fn is_file(&self) -> bool {
        self.namespace == FILE_NAMESPACE
    }

    fn location(&self) -> ModuleLocation {
        ModuleLocation::new(&self.namespace, &self.path)
    }
}

impl fmt::Display for ResolvedModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace, self.path)
    }
}

/// A module with its contents and the loader to compile them with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedModule {
    pub module: ResolvedModule,
    pub contents: String,
    pub loader: Loader,
    /// Plugin that supplied the contents, `None` for plain files
    pub plugin: Option<String>,
}

pub struct PluginHost {
    root: PathBuf,
    plugins: Vec<String>,
    installing: Option<String>,
    resolve_hooks: Vec<ResolveHook>,
    load_hooks: Vec<LoadHook>,
    diagnostics: Arc<dyn DiagnosticHandler>,
    file_system: Arc<dyn FileSystem>,
}

impl PluginHost {
    /// Create a host over the real filesystem that prints diagnostics
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_dependencies(
            root,
            Arc::new(ConsoleDiagnosticHandler::new(true)),
            Arc::new(RealFileSystem::new()),
        )
    }

    /// Create a host with custom dependencies (for testing)
    pub fn with_dependencies(
        root: impl Into<PathBuf>,
        diagnostics: Arc<dyn DiagnosticHandler>,
        file_system: Arc<dyn FileSystem>,
    ) -> Self {
        Self {
            root: root.into(),
            plugins: Vec::new(),
            installing: None,
            resolve_hooks: Vec::new(),
            load_hooks: Vec::new(),
            diagnostics,
            file_system,
        }
    }

    pub fn diagnostics(&self) -> &Arc<dyn DiagnosticHandler> {
        &self.diagnostics
    }

    /// Names of installed plugins, in installation order
    pub fn plugins(&self) -> &[String] {
        &self.plugins
    }

    /// Install a plugin. Plugins are identified by name; installing a
    /// second plugin with the same name fails.
    pub fn add_plugin(&mut self, plugin: &dyn Plugin) -> Result<(), BuildError> {
        let name = plugin.name().to_string();
        if self.plugins.contains(&name) {
            return Err(self.fail(BuildError::DuplicatePlugin { name }, None));
        }

        self.installing = Some(name.clone());
        plugin.setup(self);
        self.installing = None;

        debug!("Installed plugin '{}'", name);
        self.plugins.push(name);
        Ok(())
    }

    /// Resolve an import path.
    ///
    /// Resolution hooks run in installation order; the first one to claim
    /// the path wins and no later hook sees it.
    pub fn resolve(
        &self,
        path: &str,
        importer: Option<&ResolvedModule>,
    ) -> Result<ResolvedModule, BuildError> {
        let args = OnResolveArgs {
            path: path.to_string(),
            importer: importer.map(|m| m.path.clone()),
            namespace: importer.map_or(FILE_NAMESPACE.to_string(), |m| m.namespace.clone()),
            resolve_dir: self.resolve_dir(importer),
        };

        for hook in &self.resolve_hooks {
            if !hook.options.matches(&args.path, &args.namespace) {
                continue;
            }
            match (hook.callback)(&args) {
                Ok(Some(result)) => {
                    debug!(
                        "Plugin '{}' resolved '{}' to {}:{}",
                        hook.plugin, path, result.namespace, result.path
                    );
                    return Ok(ResolvedModule {
                        path: result.path,
                        namespace: result.namespace,
                    });
                }
                Ok(None) => {}
                Err(err) => {
                    let location = ModuleLocation::new(&args.namespace, path);
                    return Err(self.plugin_failure(&hook.plugin, location, err));
                }
            }
        }

        let candidate = normalize(&args.resolve_dir.join(path));
        if self.file_system.exists(&candidate) {
            debug!("Resolved '{}' to {}", path, candidate.display());
            return Ok(ResolvedModule::file(&candidate));
        }

        let importer = importer.map_or_else(|| "<entry>".to_string(), |m| m.to_string());
        Err(self.fail(
            BuildError::Unresolved {
                path: path.to_string(),
                importer,
            },
            None,
        ))
    }

    /// Load a resolved module.
    ///
    /// Load hooks scoped to the module's namespace run in installation
    /// order; the first one to return contents wins. Unclaimed files are
    /// read from the filesystem.
    pub fn load(&self, module: &ResolvedModule) -> Result<LoadedModule, BuildError> {
        let args = OnLoadArgs {
            path: module.path.clone(),
            namespace: module.namespace.clone(),
        };

        for hook in &self.load_hooks {
            if !hook.options.matches(&args.path, &args.namespace) {
                continue;
            }
            match (hook.callback)(&args) {
                Ok(Some(result)) => {
                    debug!("Plugin '{}' loaded {}", hook.plugin, module);
                    return Ok(LoadedModule {
                        module: module.clone(),
                        contents: result.contents,
                        loader: result.loader,
                        plugin: Some(result.plugin_name.unwrap_or_else(|| hook.plugin.clone())),
                    });
                }
                Ok(None) => {}
                Err(err) => return Err(self.plugin_failure(&hook.plugin, module.location(), err)),
            }
        }

        if !module.is_file() {
            return Err(self.fail(
                BuildError::NoLoader {
                    namespace: module.namespace.clone(),
                    path: module.path.clone(),
                },
                Some(module.location()),
            ));
        }

        let path = Path::new(&module.path);
        let contents = self.file_system.read_file(path).map_err(|source| {
            self.fail(
                BuildError::Io {
                    path: path.to_path_buf(),
                    source,
                },
                Some(module.location()),
            )
        })?;

        Ok(LoadedModule {
            module: module.clone(),
            contents,
            loader: Loader::from_path(path).unwrap_or(Loader::Js),
            plugin: None,
        })
    }

    /// Resolve and load in one step
    pub fn import(
        &self,
        path: &str,
        importer: Option<&ResolvedModule>,
    ) -> Result<LoadedModule, BuildError> {
        let module = self.resolve(path, importer)?;
        self.load(&module)
    }

    fn resolve_dir(&self, importer: Option<&ResolvedModule>) -> PathBuf {
        importer
            .filter(|m| m.is_file())
            .and_then(|m| Path::new(&m.path).parent().map(Path::to_path_buf))
            .unwrap_or_else(|| self.root.clone())
    }

    fn plugin_failure(&self, plugin: &str, location: ModuleLocation, err: HookError) -> BuildError {
        let diagnostic = Diagnostic::error(Some(location.clone()), err.to_string()).with_plugin(plugin);
        warn!("{}", diagnostic);
        self.diagnostics.report(diagnostic);

        BuildError::Plugin {
            plugin: plugin.to_string(),
            namespace: location.namespace,
            path: location.path,
            message: err.to_string(),
        }
    }

    fn fail(&self, error: BuildError, location: Option<ModuleLocation>) -> BuildError {
        self.diagnostics
            .report(Diagnostic::error(location, error.to_string()));
        error
    }
}

impl PluginBuild for PluginHost {
    fn on_resolve(&mut self, options: OnResolveOptions, callback: ResolveCallback) {
        self.resolve_hooks.push(ResolveHook {
            plugin: self.installing.clone().unwrap_or_default(),
            options,
            callback,
        });
    }

    fn on_load(&mut self, options: OnLoadOptions, callback: LoadCallback) {
        self.load_hooks.push(LoadHook {
            plugin: self.installing.clone().unwrap_or_default(),
            options,
            callback,
        });
    }
}

/// Drop `.` components and fold `..` without touching the filesystem
fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other),
        }
    }
    normalized
}
