use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{DimensionId, LocationId, Metadata, ParameterId, TsError, TsResult};

pub const MAX_NAME_CHARS: usize = 128;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DimensionKind {
    Location,
    Parameter,
}

impl DimensionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            DimensionKind::Location => "location",
            DimensionKind::Parameter => "parameter",
        }
    }
}

impl fmt::Display for DimensionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub trait DictionaryEntry: Clone + fmt::Debug + Send + Sync + 'static {
    type Id: DimensionId;
    const KIND: DimensionKind;

    fn id(&self) -> Self::Id;
    fn name(&self) -> &str;
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub id: LocationId,
    pub name: String,
    pub details: Metadata,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub id: ParameterId,
    pub name: String,
    pub unit: Option<String>,
    pub details: Metadata,
}

impl DictionaryEntry for Location {
    type Id = LocationId;
    const KIND: DimensionKind = DimensionKind::Location;

    fn id(&self) -> LocationId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl DictionaryEntry for Parameter {
    type Id = ParameterId;
    const KIND: DimensionKind = DimensionKind::Parameter;

    fn id(&self) -> ParameterId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }
}

pub fn validate_name(kind: DimensionKind, name: &str) -> TsResult<()> {
    if name.is_empty() {
        return Err(TsError::invalid(format!("{kind} name must not be empty")));
    }
    let chars = name.chars().count();
    if chars > MAX_NAME_CHARS {
        return Err(TsError::invalid(format!(
            "{kind} name has {chars} characters, limit is {MAX_NAME_CHARS}"
        )));
    }
    Ok(())
}

/// Every entry of one dictionary keyed by exact (case-sensitive) name, ordered by name.
#[derive(Clone, Debug, PartialEq)]
pub struct Snapshot<E> {
    entries: BTreeMap<String, E>,
}

impl<E: DictionaryEntry> Snapshot<E> {
    pub fn from_entries(entries: impl IntoIterator<Item = E>) -> Self {
        let entries = entries
            .into_iter()
            .map(|entry| (entry.name().to_string(), entry))
            .collect();
        Self { entries }
    }

    pub fn get(&self, name: &str) -> Option<&E> {
        self.entries.get(name)
    }

    pub fn resolve(&self, name: &str) -> TsResult<&E> {
        self.get(name)
            .ok_or_else(|| TsError::not_found(E::KIND, name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &E> {
        self.entries.values()
    }

    pub fn ids(&self) -> Vec<E::Id> {
        self.entries.values().map(DictionaryEntry::id).collect()
    }

    pub fn name_of(&self, id: E::Id) -> Option<&str> {
        self.entries
            .values()
            .find(|entry| entry.id() == id)
            .map(DictionaryEntry::name)
    }
}

impl<E> Default for Snapshot<E> {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{validate_name, DimensionKind, Location, Snapshot, MAX_NAME_CHARS};
    use crate::{LocationId, Metadata, TsError};

    fn location(id: i64, name: &str) -> Location {
        Location {
            id: LocationId(id),
            name: name.to_string(),
            details: Metadata::new(),
        }
    }

    #[test]
    fn snapshot_orders_by_name() {
        let snapshot = Snapshot::from_entries([location(1, "there"), location(2, "here")]);
        let names: Vec<_> = snapshot.names().collect();
        assert_eq!(names, vec!["here", "there"]);
        assert_eq!(snapshot.ids(), vec![LocationId(2), LocationId(1)]);
    }

    #[test]
    fn resolve_is_case_sensitive() {
        let snapshot = Snapshot::from_entries([location(1, "here")]);
        assert_eq!(snapshot.resolve("here").unwrap().id, LocationId(1));
        let err = snapshot.resolve("Here").expect_err("case differs");
        match err {
            TsError::NotFound { kind, name } => {
                assert_eq!(kind, DimensionKind::Location);
                assert_eq!(name, "Here");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn names_are_limited_to_128_characters() {
        let exact = "é".repeat(MAX_NAME_CHARS);
        assert!(validate_name(DimensionKind::Parameter, &exact).is_ok());
        let long = "x".repeat(MAX_NAME_CHARS + 1);
        assert!(validate_name(DimensionKind::Parameter, &long).is_err());
        assert!(validate_name(DimensionKind::Location, "").is_err());
    }
}
