use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::error::{PrepError, Result};

/// Ordered list of class names; a class id is its 0-based position.
///
/// Label files only store the integer id, so reordering the class file
/// between runs silently changes the meaning of every label file written
/// before. Keep the file append-only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassVocabulary {
    names: Vec<String>,
    ids: HashMap<String, usize>,
}

impl ClassVocabulary {
    /// Build from names in id order. Fails on an empty list or a repeated name.
    pub fn new<I, S>(names: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        if names.is_empty() {
            return Err(PrepError::config("class vocabulary is empty"));
        }

        let mut ids = HashMap::with_capacity(names.len());
        for (id, name) in names.iter().enumerate() {
            if ids.insert(name.clone(), id).is_some() {
                return Err(PrepError::config(format!(
                    "class '{}' is listed more than once",
                    name
                )));
            }
        }

        Ok(Self { names, ids })
    }

    /// Parse the class file format: one name per line, surrounding
    /// whitespace trimmed, blank lines ignored.
    pub fn parse(content: &str) -> Result<Self> {
        Self::new(
            content
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty()),
        )
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            PrepError::config(format!(
                "cannot read class file {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::parse(&content).map_err(|e| match e {
            PrepError::Config(msg) => PrepError::config(format!("{}: {}", path.display(), msg)),
            other => other,
        })
    }

    pub fn id_of(&self, name: &str) -> Option<usize> {
        self.ids.get(name).copied()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Serialize back to the class file format.
    pub fn to_file_contents(&self) -> String {
        let mut out = String::with_capacity(self.names.iter().map(|n| n.len() + 1).sum());
        for name in &self.names {
            out.push_str(name);
            out.push('\n');
        }
        out
    }
}
