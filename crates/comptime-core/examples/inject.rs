//! Drives the comptime injector through the reference host.
//!
//! Run with `RUST_LOG=debug` to see resolution and load decisions.

use comptime_core::{ComptimeInjector, ComptimeRegistry, ComptimeValue, PluginHost};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let registry = ComptimeRegistry::new();
    registry.register(
        "foo",
        [("bar", "baz")].into_iter().collect::<ComptimeValue>(),
    )?;
    registry.register_with("version", || {
        let manifest = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("Cargo.toml");
        let bytes = std::fs::metadata(manifest)?.len();
        Ok::<_, std::io::Error>(format!("{}+{}", env!("CARGO_PKG_VERSION"), bytes))
    })?;

    let mut host = PluginHost::new(env!("CARGO_MANIFEST_DIR"));
    host.add_plugin(&ComptimeInjector::new(registry))?;

    let module = host.import("$COMPTIME$", None)?;
    println!("// {} (loader: {})", module.module, module.loader);
    print!("{}", module.contents);

    Ok(())
}
