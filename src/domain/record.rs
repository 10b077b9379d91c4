//! Named values a strategy records on a tick for later analysis.

use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RecordValue {
    Float(f64),
    Bool(bool),
}

impl RecordValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            RecordValue::Float(v) => Some(*v),
            RecordValue::Bool(_) => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            RecordValue::Bool(v) => Some(*v),
            RecordValue::Float(_) => None,
        }
    }
}

impl From<f64> for RecordValue {
    fn from(v: f64) -> Self {
        RecordValue::Float(v)
    }
}

impl From<bool> for RecordValue {
    fn from(v: bool) -> Self {
        RecordValue::Bool(v)
    }
}

impl fmt::Display for RecordValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordValue::Float(v) => write!(f, "{}", v),
            RecordValue::Bool(v) => write!(f, "{}", v),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub date: NaiveDate,
    pub values: BTreeMap<String, RecordValue>,
}

impl Record {
    pub fn get(&self, name: &str) -> Option<RecordValue> {
        self.values.get(name).copied()
    }
}
