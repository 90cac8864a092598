//! Compile-time constants for build pipelines
//!
//! Register named values in a [`ComptimeRegistry`], hand a
//! [`ComptimeInjector`] to the build, and any module importing `$COMPTIME$`
//! receives a synthesized module exporting those values:
//!
//! ```rust
//! use comptime_core::{ComptimeInjector, ComptimeRegistry};
//!
//! let registry = ComptimeRegistry::new();
//! registry.register("foo", [("bar", "baz")].into_iter().collect::<comptime_core::ComptimeValue>()).unwrap();
//! registry
//!     .register_with("version", || Ok::<_, std::io::Error>(format!("{}-dev", "1.0")))
//!     .unwrap();
//!
//! let injector = ComptimeInjector::new(registry);
//! assert!(injector.matches("$COMPTIME$"));
//! assert_eq!(
//!     injector.synthesize().unwrap(),
//!     "export const foo = {\"bar\":\"baz\"};\nexport const version = \"1.0-dev\";\n"
//! );
//! ```
//!
//! The `host` feature adds `PluginHost`, a small sequential pipeline that
//! drives any [`Plugin`] over a pluggable filesystem.

pub mod config;
pub mod diagnostics;
pub mod errors;
#[cfg(feature = "host")]
pub mod fs;
#[cfg(feature = "host")]
pub mod host;
pub mod identifier;
pub mod injector;
pub mod plugin;
pub mod registry;
pub mod synthesis;
pub mod value;

pub use config::{ComptimeOptions, DuplicatePolicy, SnapshotMode};
pub use diagnostics::{Diagnostic, DiagnosticHandler, DiagnosticLevel, ModuleLocation};
#[cfg(feature = "host")]
pub use errors::BuildError;
pub use errors::{ConfigError, InjectorError, RegistryError, SynthesisError, ValueError};
#[cfg(feature = "host")]
pub use host::{LoadedModule, PluginHost, ResolvedModule};
pub use injector::{
    ComptimeInjector, ComptimeInjectorBuilder, DEFAULT_MODULE, DEFAULT_PATTERN, NAMESPACE,
    PLUGIN_NAME,
};
pub use plugin::{Loader, Plugin, PluginBuild};
pub use registry::{ComptimeRegistry, Snapshot};
pub use synthesis::synthesize_module;
pub use value::ComptimeValue;
