//! Types for recording and managing training metrics.
//!
//! A [`Record`] is a string-keyed container of values obtained during
//! training, typically one per epoch. A [`Recorder`] writes records to an
//! output destination.
use crate::error::QlearnError;
use chrono::prelude::{DateTime, Local};
use std::collections::{
    hash_map::{Iter, Keys},
    HashMap,
};

/// Represents possible types of values in a [`Record`].
#[derive(Debug, Clone)]
pub enum RecordValue {
    /// A single floating-point value, typically used for metrics.
    Scalar(f32),

    /// A timestamp with local timezone.
    DateTime(DateTime<Local>),

    /// A 1-dimensional array of floating-point values.
    Array1(Vec<f32>),

    /// A text value.
    String(String),
}

/// A container of key-value pairs obtained during training.
#[derive(Debug, Clone, Default)]
pub struct Record(HashMap<String, RecordValue>);

impl Record {
    /// Creates an empty record.
    pub fn empty() -> Self {
        Self(HashMap::new())
    }

    /// Creates a record containing a single scalar value.
    pub fn from_scalar(name: impl Into<String>, value: f32) -> Self {
        Self(HashMap::from([(name.into(), RecordValue::Scalar(value))]))
    }

    /// Creates a record from a slice of key-value pairs.
    pub fn from_slice<K: Into<String> + Clone>(s: &[(K, RecordValue)]) -> Self {
        Self(
            s.iter()
                .map(|(k, v)| (k.clone().into(), v.clone()))
                .collect(),
        )
    }

    /// Returns an iterator over the keys in the record.
    pub fn keys(&self) -> Keys<'_, String, RecordValue> {
        self.0.keys()
    }

    /// Inserts a key-value pair into the record.
    pub fn insert(&mut self, k: impl Into<String>, v: RecordValue) {
        self.0.insert(k.into(), v);
    }

    /// Returns an iterator over the key-value pairs in the record.
    pub fn iter(&self) -> Iter<'_, String, RecordValue> {
        self.0.iter()
    }

    /// Gets the value associated with the given key.
    pub fn get(&self, k: &str) -> Option<&RecordValue> {
        self.0.get(k)
    }

    /// Returns `true` if the record holds no values.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Merges two records, consuming both.
    ///
    /// On key collisions the value of `record` wins.
    pub fn merge(self, record: Record) -> Self {
        Record(self.0.into_iter().chain(record.0).collect())
    }

    /// Gets a scalar value from the record.
    pub fn get_scalar(&self, k: &str) -> Result<f32, QlearnError> {
        if let Some(v) = self.0.get(k) {
            match v {
                RecordValue::Scalar(v) => Ok(*v),
                _ => Err(QlearnError::RecordValueType("Scalar".to_string())),
            }
        } else {
            Err(QlearnError::RecordKey(k.to_string()))
        }
    }

    /// Gets a string value from the record.
    pub fn get_string(&self, k: &str) -> Result<String, QlearnError> {
        if let Some(v) = self.0.get(k) {
            match v {
                RecordValue::String(v) => Ok(v.clone()),
                _ => Err(QlearnError::RecordValueType("String".to_string())),
            }
        } else {
            Err(QlearnError::RecordKey(k.to_string()))
        }
    }
}

/// Writes a record to an output destination.
pub trait Recorder {
    /// Write a record to the [`Recorder`].
    fn write(&mut self, record: Record);
}

/// A recorder that keeps records in memory.
///
/// Used in tests and to inspect training progress programmatically.
#[derive(Debug, Default)]
pub struct BufferedRecorder(Vec<Record>);

impl BufferedRecorder {
    /// Constructs the recorder.
    pub fn new() -> Self {
        Self(Vec::default())
    }

    /// Returns an iterator over the stored records.
    pub fn iter(&self) -> std::slice::Iter<Record> {
        self.0.iter()
    }

    /// The number of stored records.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if no record has been written yet.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Recorder for BufferedRecorder {
    fn write(&mut self, record: Record) {
        self.0.push(record);
    }
}

/// A recorder that ignores any record.
pub struct NullRecorder {}

impl Recorder for NullRecorder {
    /// Discard the given record.
    fn write(&mut self, _record: Record) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_and_get() {
        let mut record = Record::from_scalar("loss", 0.5);
        record.insert("datetime", RecordValue::DateTime(Local::now()));
        record.insert("note", RecordValue::String("warmup".to_string()));

        assert_eq!(record.get_scalar("loss").unwrap(), 0.5);
        assert_eq!(record.get_string("note").unwrap(), "warmup");
        assert!(record.get_scalar("datetime").is_err());
        assert!(record.get_scalar("missing").is_err());
    }

    #[test]
    fn merge_overwrites() {
        let a = Record::from_scalar("x", 1.0);
        let b = Record::from_slice(&[("x", RecordValue::Scalar(2.0)), ("y", RecordValue::Scalar(3.0))]);
        let merged = a.merge(b);
        assert_eq!(merged.get_scalar("x").unwrap(), 2.0);
        assert_eq!(merged.get_scalar("y").unwrap(), 3.0);
    }

    #[test]
    fn buffered_recorder_stores_records() {
        let mut recorder = BufferedRecorder::new();
        assert!(recorder.is_empty());
        recorder.write(Record::from_scalar("r", 1.0));
        recorder.write(Record::from_scalar("r", 2.0));
        assert_eq!(recorder.len(), 2);
    }
}
