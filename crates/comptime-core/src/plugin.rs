//! Build-pipeline extension interface
//!
//! A host pipeline exposes two extension points to plugins: resolution
//! hooks, which may claim an import path and move it into a namespace, and
//! load hooks, which may supply the contents of a module in a namespace.
//! Plugins receive a [`PluginBuild`] in [`Plugin::setup`] and install their
//! hooks on it.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Namespace of modules that live on the filesystem
pub const FILE_NAMESPACE: &str = "file";

pub type HookError = Box<dyn std::error::Error + Send + Sync>;
pub type HookResult<T> = Result<T, HookError>;

/// Returns `Some` to claim the path, `None` to let other resolvers try
pub type ResolveCallback =
    Box<dyn Fn(&OnResolveArgs) -> HookResult<Option<OnResolveResult>> + Send + Sync>;

/// Returns `Some` with the module contents, `None` to let other loaders try
pub type LoadCallback = Box<dyn Fn(&OnLoadArgs) -> HookResult<Option<OnLoadResult>> + Send + Sync>;

/// A build extension
pub trait Plugin: Send + Sync {
    /// Stable name used by hosts to identify and dedupe the plugin
    fn name(&self) -> &str;

    /// Install hooks on the host
    fn setup(&self, build: &mut dyn PluginBuild);
}

/// The hook-registration facility a host hands to [`Plugin::setup`]
pub trait PluginBuild {
    fn on_resolve(&mut self, options: OnResolveOptions, callback: ResolveCallback);
    fn on_load(&mut self, options: OnLoadOptions, callback: LoadCallback);
}

/// Language hint telling the host how to compile loaded contents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Loader {
    Js,
    Jsx,
    Ts,
    Tsx,
    Json,
    Text,
}

impl Default for Loader {
    fn default() -> Self {
        Loader::Ts
    }
}

impl Loader {
    pub fn as_str(&self) -> &'static str {
        match self {
            Loader::Js => "js",
            Loader::Jsx => "jsx",
            Loader::Ts => "ts",
            Loader::Tsx => "tsx",
            Loader::Json => "json",
            Loader::Text => "text",
        }
    }

    /// Infer the loader from a file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        let loader = match path.extension()?.to_str()? {
            "js" | "mjs" | "cjs" => Loader::Js,
            "jsx" => Loader::Jsx,
            "ts" | "mts" | "cts" => Loader::Ts,
            "tsx" => Loader::Tsx,
            "json" => Loader::Json,
            "txt" => Loader::Text,
            _ => return None,
        };
        Some(loader)
    }
}

impl fmt::Display for Loader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which paths a resolution hook is called for
#[derive(Debug, Clone)]
pub struct OnResolveOptions {
    pub filter: Regex,
    /// Only call the hook for imports coming from this namespace
    pub namespace: Option<String>,
}

impl OnResolveOptions {
    pub fn new(filter: Regex) -> Self {
        Self {
            filter,
            namespace: None,
        }
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn matches(&self, path: &str, namespace: &str) -> bool {
        namespace_matches(self.namespace.as_deref(), namespace) && self.filter.is_match(path)
    }
}

/// Which modules a load hook is called for
#[derive(Debug, Clone)]
pub struct OnLoadOptions {
    pub filter: Regex,
    pub namespace: Option<String>,
}

impl OnLoadOptions {
    pub fn new(filter: Regex) -> Self {
        Self {
            filter,
            namespace: None,
        }
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn matches(&self, path: &str, namespace: &str) -> bool {
        namespace_matches(self.namespace.as_deref(), namespace) && self.filter.is_match(path)
    }
}

fn namespace_matches(expected: Option<&str>, actual: &str) -> bool {
    expected.map_or(true, |ns| ns == actual)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OnResolveArgs {
    /// The import path as written
    pub path: String,
    /// Path of the importing module, `None` for entry points
    pub importer: Option<String>,
    /// Namespace of the importing module
    pub namespace: String,
    pub resolve_dir: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OnResolveResult {
    pub path: String,
    pub namespace: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OnLoadArgs {
    pub path: String,
    pub namespace: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OnLoadResult {
    pub contents: String,
    pub loader: Loader,
    /// Plugin the contents are attributed to in diagnostics
    pub plugin_name: Option<String>,
}
