//! Per-surrogate access history
//!
//! Provides [`Report`], an append-only log of [`AccessRecord`]s, and the
//! typed record structs it is made of.

use crate::value::{PropertyName, Value};
use serde::{Deserialize, Serialize};

/// Report query errors
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    /// The last call was requested but no call was ever recorded
    #[error("object was not called")]
    NotCalled,

    /// History could not be serialized
    #[error("failed to serialize history: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Kind of a recorded access
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessKind {
    /// Property read
    Get,
    /// Property write
    Set,
    /// Property removal
    Delete,
    /// Call as a function
    Apply,
    /// Construction as a type
    Construct,
}

/// A property was read
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyGet {
    /// Name of the property
    pub property: PropertyName,
    /// Value returned by the read
    pub value: Value,
    /// Whether the property existed before the read
    pub was_defined: bool,
}

/// A property was written
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertySet {
    /// Name of the property
    pub property: PropertyName,
    /// Value written
    pub value: Value,
    /// Value held before the write
    pub old_value: Value,
    /// Whether the property was present when the write happened
    pub created: bool,
}

/// A property was removed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyDelete {
    /// Name of the property
    pub property: PropertyName,
}

/// The surrogate was called
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Call {
    /// Call arguments
    pub arguments: Vec<Value>,
    /// Value the call produced
    pub return_value: Value,
}

/// The surrogate was constructed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Construct {
    /// Constructor arguments
    pub arguments: Vec<Value>,
}

/// One entry of a [`Report`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AccessRecord {
    /// Property read
    Get(PropertyGet),
    /// Property write
    Set(PropertySet),
    /// Property removal
    Delete(PropertyDelete),
    /// Call
    Apply(Call),
    /// Construction
    Construct(Construct),
}

impl AccessRecord {
    /// Kind of the access
    #[must_use]
    pub fn kind(&self) -> AccessKind {
        match self {
            Self::Get(_) => AccessKind::Get,
            Self::Set(_) => AccessKind::Set,
            Self::Delete(_) => AccessKind::Delete,
            Self::Apply(_) => AccessKind::Apply,
            Self::Construct(_) => AccessKind::Construct,
        }
    }

    /// Property name for get/set/delete records
    #[must_use]
    pub fn property(&self) -> Option<&str> {
        match self {
            Self::Get(r) => Some(&r.property),
            Self::Set(r) => Some(&r.property),
            Self::Delete(r) => Some(&r.property),
            Self::Apply(_) | Self::Construct(_) => None,
        }
    }

    /// Call payload, if this is an `apply` record
    #[must_use]
    pub fn as_call(&self) -> Option<&Call> {
        match self {
            Self::Apply(c) => Some(c),
            _ => None,
        }
    }
}

impl From<PropertyGet> for AccessRecord {
    fn from(r: PropertyGet) -> Self {
        Self::Get(r)
    }
}

impl From<PropertySet> for AccessRecord {
    fn from(r: PropertySet) -> Self {
        Self::Set(r)
    }
}

impl From<PropertyDelete> for AccessRecord {
    fn from(r: PropertyDelete) -> Self {
        Self::Delete(r)
    }
}

impl From<Call> for AccessRecord {
    fn from(r: Call) -> Self {
        Self::Apply(r)
    }
}

impl From<Construct> for AccessRecord {
    fn from(r: Construct) -> Self {
        Self::Construct(r)
    }
}

/// Ordered, append-only history of accesses to one surrogate
///
/// The called flag flips on the first `apply` record and stays set until
/// [`Report::clear`].
#[derive(Debug, Clone, Default, Serialize)]
pub struct Report {
    history: Vec<AccessRecord>,
    called: bool,
}

impl Report {
    /// Create empty report
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record
    pub fn add_access_record(&mut self, record: impl Into<AccessRecord>) {
        let record = record.into();
        if record.kind() == AccessKind::Apply {
            self.called = true;
        }
        self.history.push(record);
    }

    /// Complete history in append order
    #[inline]
    #[must_use]
    pub fn history(&self) -> &[AccessRecord] {
        &self.history
    }

    /// True once at least one call has been recorded
    #[inline]
    #[must_use]
    pub fn is_called(&self) -> bool {
        self.called
    }

    /// Most recent call
    ///
    /// # Errors
    /// [`ReportError::NotCalled`] if no call was recorded
    pub fn last_call(&self) -> Result<&Call, ReportError> {
        if !self.called {
            return Err(ReportError::NotCalled);
        }
        self.history
            .iter()
            .rev()
            .find_map(AccessRecord::as_call)
            .ok_or(ReportError::NotCalled)
    }

    /// All calls in order
    #[must_use]
    pub fn calls(&self) -> Vec<&Call> {
        self.history.iter().filter_map(AccessRecord::as_call).collect()
    }

    /// Number of recorded calls
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.history
            .iter()
            .filter(|r| r.kind() == AccessKind::Apply)
            .count()
    }

    /// All constructions in order
    #[must_use]
    pub fn constructs(&self) -> Vec<&Construct> {
        self.history
            .iter()
            .filter_map(|r| match r {
                AccessRecord::Construct(c) => Some(c),
                _ => None,
            })
            .collect()
    }

    /// All property reads in order
    #[must_use]
    pub fn property_gets(&self) -> Vec<&PropertyGet> {
        self.history
            .iter()
            .filter_map(|r| match r {
                AccessRecord::Get(g) => Some(g),
                _ => None,
            })
            .collect()
    }

    /// All property writes in order
    #[must_use]
    pub fn property_sets(&self) -> Vec<&PropertySet> {
        self.history
            .iter()
            .filter_map(|r| match r {
                AccessRecord::Set(s) => Some(s),
                _ => None,
            })
            .collect()
    }

    /// All property removals in order
    #[must_use]
    pub fn property_deletes(&self) -> Vec<&PropertyDelete> {
        self.history
            .iter()
            .filter_map(|r| match r {
                AccessRecord::Delete(d) => Some(d),
                _ => None,
            })
            .collect()
    }

    /// Get, set and delete records touching `property`, in order
    #[must_use]
    pub fn property_access(&self, property: &str) -> Vec<&AccessRecord> {
        self.filter(|r| r.property() == Some(property))
    }

    /// Records matching `predicate`, in order
    pub fn filter<P>(&self, mut predicate: P) -> Vec<&AccessRecord>
    where
        P: FnMut(&AccessRecord) -> bool,
    {
        self.history.iter().filter(|r| predicate(*r)).collect()
    }

    /// Drop the history and reset the called flag
    pub fn clear(&mut self) {
        self.history.clear();
        self.called = false;
    }

    /// Number of records
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.history.len()
    }

    /// True if nothing was recorded
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    /// Pretty JSON rendering of the history, for assertion failure output
    ///
    /// # Errors
    /// [`ReportError::Serialize`] if a record cannot be encoded
    pub fn to_json(&self) -> Result<String, ReportError> {
        Ok(serde_json::to_string_pretty(&self.history)?)
    }
}
