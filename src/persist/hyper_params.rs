use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

const SEPARATOR: &str = ": ";

/// File name used when a hyper-parameter set lives inside its own directory.
pub const HYPER_PARAMS_FILE: &str = "hyper-params.txt";

/// A type discriminator plus `name: value` pairs.
///
/// On disk the first line is the discriminator and every following
/// non-empty line is one `name: value` pair:
///
/// ```text
/// AdamGradientDescender
/// learning rate: 0.001
/// step: 12
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HyperParams {
    type_name: String,
    entries: Vec<(String, String)>,
    /// Where the set was read from, for error messages.
    source: PathBuf,
}

impl HyperParams {
    pub fn new(type_name: &str) -> HyperParams {
        HyperParams {
            type_name: type_name.to_owned(),
            ..HyperParams::default()
        }
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn entries(&self) -> &[(String, String)] {
        &self.entries
    }

    /// Floats are written with `{:?}` so that they read back bit-identical.
    pub fn with_f64(mut self, name: &str, value: f64) -> HyperParams {
        self.entries.push((name.to_owned(), format!("{value:?}")));
        self
    }

    pub fn with_u64(mut self, name: &str, value: u64) -> HyperParams {
        self.entries.push((name.to_owned(), value.to_string()));
        self
    }

    fn raw(&self, name: &str) -> Result<&str> {
        let mut matches = self.entries.iter().filter(|(n, _)| n == name);
        match (matches.next(), matches.next()) {
            (Some((_, value)), None) => Ok(value),
            (None, _) => Err(self.error(format!("missing hyper-parameter `{name}`"))),
            (Some(_), Some(_)) => Err(self.error(format!("hyper-parameter `{name}` appears more than once"))),
        }
    }

    pub fn get_f64(&self, name: &str) -> Result<f64> {
        let raw = self.raw(name)?;
        raw.parse()
            .map_err(|_| self.error(format!("`{name}` is not a number: {raw}")))
    }

    pub fn get_u64(&self, name: &str) -> Result<u64> {
        let raw = self.raw(name)?;
        raw.parse()
            .map_err(|_| self.error(format!("`{name}` is not an integer: {raw}")))
    }

    pub fn error(&self, message: impl Into<String>) -> Error {
        Error::format(&self.source, message)
    }

    pub fn encode(&self) -> String {
        let mut text = format!("{}\n", self.type_name);
        for (name, value) in &self.entries {
            text.push_str(&format!("{name}{SEPARATOR}{value}\n"));
        }
        text
    }

    pub fn decode(text: &str) -> Result<HyperParams> {
        HyperParams::decode_from(text, PathBuf::new())
    }

    fn decode_from(text: &str, source: PathBuf) -> Result<HyperParams> {
        let mut lines = text.lines();
        let type_name = lines
            .next()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .ok_or_else(|| Error::format(&source, "missing type name on first line"))?;

        let mut entries = Vec::new();
        for line in lines.filter(|line| !line.trim().is_empty()) {
            let (name, value) = line
                .split_once(SEPARATOR)
                .ok_or_else(|| Error::format(&source, format!("expected `name: value`, got `{line}`")))?;
            entries.push((name.trim().to_owned(), value.trim().to_owned()));
        }

        Ok(HyperParams {
            type_name: type_name.to_owned(),
            entries,
            source,
        })
    }

    pub fn write_file(&self, path: &Path) -> Result<()> {
        fs::write(path, self.encode()).map_err(|e| Error::io(path, e))
    }

    pub fn read_file(path: &Path) -> Result<HyperParams> {
        if !path.is_file() {
            return Err(Error::NotFound(path.to_path_buf()));
        }
        let text = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        HyperParams::decode_from(&text, path.to_path_buf())
    }
}
