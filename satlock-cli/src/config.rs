//! Session configuration from files and command line options.
use std::fs;

use anyhow::Error;
use toml::value::{Table, Value};

use satlock::SessionConfig;

/// Collects configuration sources, later ones overriding earlier ones key by key.
#[derive(Default)]
pub struct ConfigBuilder {
    table: Table,
}

impl ConfigBuilder {
    pub fn new() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Merge a TOML document, e.g. `verbosity = 2`.
    pub fn merge_str(&mut self, source: &str) -> Result<(), Error> {
        let table: Table = toml::from_str(source)?;
        self.table.extend(table);
        Ok(())
    }

    pub fn merge_file(&mut self, path: &str) -> Result<(), Error> {
        let contents = fs::read_to_string(path)?;
        self.merge_str(&contents)
    }

    /// Force a single option regardless of the merged sources.
    pub fn set(&mut self, key: &str, value: impl Into<Value>) {
        self.table.insert(key.to_owned(), value.into());
    }

    pub fn build(self) -> Result<SessionConfig, Error> {
        Ok(Value::Table(self.table).try_into()?)
    }
}
