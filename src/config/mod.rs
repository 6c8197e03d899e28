//! Configuration loaded from `.mimavault.toml`.

mod settings;

pub use settings::{GeneratorSettings, Settings};
