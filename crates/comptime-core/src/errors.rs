use thiserror::Error;

/// Boxed error returned by a registration producer
pub type ProducerError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum ValueError {
    #[error("Number {0} is not finite and has no literal representation")]
    NonFiniteNumber(f64),

    #[error("Value cannot be represented as plain data: {0}")]
    Unrepresentable(#[source] serde_json::Error),

    #[error("Map key '__proto__' would set the prototype instead of a property")]
    PrototypeKey,
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("'{id}' is not a valid export identifier")]
    InvalidIdentifier { id: String },

    #[error("A value is already registered under '{id}'")]
    DuplicateId { id: String },

    #[error("Producer for '{id}' failed: {source}")]
    Producer {
        id: String,
        #[source]
        source: ProducerError,
    },

    #[error("Value for '{id}' is not plain data: {source}")]
    Value {
        id: String,
        #[source]
        source: ValueError,
    },
}

#[derive(Debug, Error)]
pub enum SynthesisError {
    #[error("Cannot export '{id}': not a valid identifier")]
    InvalidIdentifier { id: String },

    #[error("Cannot export '{id}': a map key '__proto__' would be dropped")]
    PrototypeKey { id: String },

    #[error("Cannot serialize value of '{id}': {source}")]
    Serialize {
        id: String,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Error)]
pub enum InjectorError {
    #[error("Invalid import pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to parse options: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Errors raised by [`crate::host::PluginHost`]
#[cfg(feature = "host")]
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("Plugin '{name}' is already installed")]
    DuplicatePlugin { name: String },

    #[error("Could not resolve '{path}' from {importer}")]
    Unresolved { path: String, importer: String },

    #[error("No loader claimed {namespace}:{path}")]
    NoLoader { namespace: String, path: String },

    #[error("[plugin {plugin}] {namespace}:{path}: {message}")]
    Plugin {
        plugin: String,
        namespace: String,
        path: String,
        message: String,
    },

    #[error("Failed to read {path}: {source}")]
    Io {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T, E = RegistryError> = std::result::Result<T, E>;
