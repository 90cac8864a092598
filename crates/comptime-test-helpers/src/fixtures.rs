//! Test fixtures - registries and hosts for testing

use std::sync::Arc;

use comptime_core::diagnostics::CollectingDiagnosticHandler;
use comptime_core::fs::MockFileSystem;
use comptime_core::{ComptimeRegistry, ComptimeValue, PluginHost};

/// Project root used by [`host_with_files`]
pub const PROJECT_ROOT: &str = "/project";

/// A registry with one value of every kind
pub fn sample_registry() -> ComptimeRegistry {
    let registry = ComptimeRegistry::new();
    registry
        .register("foo", [("bar", "baz")].into_iter().collect::<ComptimeValue>())
        .expect("valid id");
    registry.register("version", "1.0").expect("valid id");
    registry.register("buildNumber", 42).expect("valid id");
    registry.register("debug", false).expect("valid id");
    registry.register("targets", vec!["web", "node"]).expect("valid id");
    registry
        .register("license", ComptimeValue::Null)
        .expect("valid id");
    registry
}

/// An entry module importing the virtual module
pub fn entry_source() -> &'static str {
    r#"import { foo, version } from "$COMPTIME$";
console.log(foo.bar, version);
"#
}

/// A host over an in-memory project with collecting diagnostics
pub fn host_with_files(files: &[(&str, &str)]) -> (PluginHost, Arc<CollectingDiagnosticHandler>) {
    let mut fs = MockFileSystem::new();
    for (path, contents) in files {
        fs.add_file(format!("{}/{}", PROJECT_ROOT, path), *contents);
    }

    let diagnostics = Arc::new(CollectingDiagnosticHandler::new());
    let host = PluginHost::with_dependencies(PROJECT_ROOT, diagnostics.clone(), Arc::new(fs));
    (host, diagnostics)
}
