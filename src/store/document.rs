//! In-memory form of the persisted document.

use std::fmt;

use chrono::{Duration, Local, NaiveDateTime, SubsecRound};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::form::FormFields;

/// Receipt time of a submission, to the microsecond.
///
/// Rendered as `YYYY-MM-DD HH:MM:SS.ffffff` in local time; that string is
/// the entry's key in the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(NaiveDateTime);

impl Timestamp {
    /// Current local wall-clock time.
    pub fn now() -> Self {
        Self::from_naive(Local::now().naive_local())
    }

    /// Wrap a naive local time, dropping anything below a microsecond.
    pub fn from_naive(time: NaiveDateTime) -> Self {
        Self(time.trunc_subsecs(6))
    }

    /// The following microsecond.
    pub fn next(self) -> Self {
        Self(self.0 + Duration::microseconds(1))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d %H:%M:%S%.6f"))
    }
}

/// The whole store: timestamp key → submitted fields, in insertion order.
///
/// Existing entries are kept as raw JSON so a rewrite never alters them,
/// whatever shape they have.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document {
    entries: Map<String, Value>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Add an entry at the end and return its key.
    ///
    /// If `stamp` is already taken the stamp moves forward one microsecond
    /// at a time until it is free, so no prior entry is ever replaced.
    pub fn insert(&mut self, stamp: Timestamp, fields: FormFields) -> String {
        let mut stamp = stamp;
        let mut key = stamp.to_string();
        while self.entries.contains_key(&key) {
            stamp = stamp.next();
            key = stamp.to_string();
        }
        self.entries.insert(key.clone(), fields.into());
        key
    }
}
