use serde::{Deserialize, Serialize};

use crate::{DictionaryEntry, Snapshot, TsResult};

/// Names requested for one dimension of a query.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NameFilter {
    #[default]
    All,
    One(String),
    Many(Vec<String>),
}

impl NameFilter {
    pub fn one(name: impl Into<String>) -> Self {
        NameFilter::One(name.into())
    }

    pub fn many<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        NameFilter::Many(names.into_iter().map(Into::into).collect())
    }

    pub fn is_all(&self) -> bool {
        matches!(self, NameFilter::All)
    }

    fn requested(&self) -> &[String] {
        match self {
            NameFilter::All => &[],
            NameFilter::One(name) => std::slice::from_ref(name),
            NameFilter::Many(names) => names.as_slice(),
        }
    }
}

impl From<&str> for NameFilter {
    fn from(value: &str) -> Self {
        NameFilter::One(value.to_string())
    }
}

impl From<String> for NameFilter {
    fn from(value: String) -> Self {
        NameFilter::One(value)
    }
}

impl From<Vec<String>> for NameFilter {
    fn from(value: Vec<String>) -> Self {
        NameFilter::Many(value)
    }
}

impl From<Vec<&str>> for NameFilter {
    fn from(value: Vec<&str>) -> Self {
        NameFilter::many(value)
    }
}

impl<T: Into<NameFilter>> From<Option<T>> for NameFilter {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or_default()
    }
}

/// Identity set produced from a [`NameFilter`].
///
/// `All` carries every id known to the snapshot; query builders may drop the
/// predicate entirely for it. An empty `Subset` must match nothing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResolvedSet<I> {
    All(Vec<I>),
    Subset(Vec<I>),
}

impl<I: Copy> ResolvedSet<I> {
    pub fn ids(&self) -> &[I] {
        match self {
            ResolvedSet::All(ids) | ResolvedSet::Subset(ids) => ids,
        }
    }

    pub fn is_unrestricted(&self) -> bool {
        matches!(self, ResolvedSet::All(_))
    }

    pub fn matches_nothing(&self) -> bool {
        matches!(self, ResolvedSet::Subset(ids) if ids.is_empty())
    }
}

/// Resolves requested names against a snapshot.
///
/// With `fail_silently` unknown names are skipped; otherwise the first unknown
/// name aborts with `NotFound`.
pub fn resolve_filter<E: DictionaryEntry>(
    filter: &NameFilter,
    snapshot: &Snapshot<E>,
    fail_silently: bool,
) -> TsResult<ResolvedSet<E::Id>> {
    if filter.is_all() {
        return Ok(ResolvedSet::All(snapshot.ids()));
    }
    let mut ids = Vec::new();
    for name in filter.requested() {
        match snapshot.get(name) {
            Some(entry) => {
                let id = entry.id();
                if !ids.contains(&id) {
                    ids.push(id);
                }
            }
            None if fail_silently => continue,
            None => return Err(crate::TsError::not_found(E::KIND, name.as_str())),
        }
    }
    Ok(ResolvedSet::Subset(ids))
}

#[cfg(test)]
mod tests {
    use super::{resolve_filter, NameFilter, ResolvedSet};
    use crate::{Metadata, Parameter, ParameterId, Snapshot, TsError};

    fn parameters() -> Snapshot<Parameter> {
        Snapshot::from_entries(["aaa", "bbb", "ccc"].iter().enumerate().map(|(idx, name)| {
            Parameter {
                id: ParameterId(idx as i64 + 1),
                name: name.to_string(),
                unit: None,
                details: Metadata::new(),
            }
        }))
    }

    #[test]
    fn unset_filter_yields_every_id() {
        let resolved = resolve_filter(&NameFilter::All, &parameters(), false).unwrap();
        assert!(resolved.is_unrestricted());
        assert_eq!(
            resolved.ids(),
            &[ParameterId(1), ParameterId(2), ParameterId(3)]
        );
    }

    #[test]
    fn lenient_mode_skips_unknown_names() {
        let filter = NameFilter::many(["bbb", "unknown"]);
        let resolved = resolve_filter(&filter, &parameters(), true).unwrap();
        assert_eq!(resolved, ResolvedSet::Subset(vec![ParameterId(2)]));
    }

    #[test]
    fn strict_mode_fails_on_first_unknown_name() {
        let filter = NameFilter::many(["bbb", "unknown", "other"]);
        let err = resolve_filter(&filter, &parameters(), false).expect_err("strict");
        match err {
            TsError::NotFound { name, .. } => assert_eq!(name, "unknown"),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn all_unknown_names_leave_an_empty_set() {
        let resolved = resolve_filter(&NameFilter::one("nope"), &parameters(), true).unwrap();
        assert!(resolved.matches_nothing());
        let resolved = resolve_filter(&NameFilter::Many(Vec::new()), &parameters(), false).unwrap();
        assert!(resolved.matches_nothing());
    }

    #[test]
    fn duplicates_collapse() {
        let filter = NameFilter::many(["aaa", "aaa"]);
        let resolved = resolve_filter(&filter, &parameters(), false).unwrap();
        assert_eq!(resolved.ids(), &[ParameterId(1)]);
    }

    #[test]
    fn optional_filters_convert() {
        assert_eq!(NameFilter::from(None::<&str>), NameFilter::All);
        assert_eq!(NameFilter::from(Some("here")), NameFilter::one("here"));
        assert_eq!(
            NameFilter::from(vec!["a", "b"]),
            NameFilter::Many(vec!["a".to_string(), "b".to_string()])
        );
    }
}
