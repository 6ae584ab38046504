//! Named values usable in place of folder specifications.

use serde::Serialize;
use serde_json::{Map, Value};

/// Value bound to a constant: a path string or a folder object.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ConstantValue {
    Path(String),
    Folder(Map<String, Value>),
}
impl ConstantValue {
    pub fn to_value(&self) -> Value {
        match self {
            Self::Path(path) => Value::String(path.clone()),
            Self::Folder(folder) => Value::Object(folder.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Constant {
    pub name: String,
    pub value: ConstantValue,
}
impl Constant {
    pub fn new(name: impl Into<String>, value: ConstantValue) -> Self {
        Self { name: name.into(), value }
    }
}

/// Ordered constants table, immutable once parsed.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Constants(Vec<Constant>);
impl Constants {
    pub fn get(&self, name: &str) -> Option<&ConstantValue> {
        self.0.iter().find(|constant| constant.name == name).map(|constant| &constant.value)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
impl FromIterator<Constant> for Constants {
    fn from_iter<I: IntoIterator<Item = Constant>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
