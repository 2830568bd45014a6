use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use sea_orm::sea_query::{Alias, OnConflict, Order, Query, SimpleExpr};
use sea_orm::{ConnectionTrait, QueryResult, Value as SeaValue};

use relts_core::{
    validate_name, DictionaryEntry, DimensionId, Location, LocationId, Metadata, Parameter,
    ParameterId, Snapshot, TsResult, UpsertLocationInput, UpsertParameterInput,
};

use crate::db::{col_name, exec, query_all, DictColumn};

/// Row mapping for a dictionary table.
pub(crate) trait StoredEntry: DictionaryEntry {
    type Input: Send + Sync;

    fn columns() -> &'static [DictColumn];
    fn from_row(row: &QueryResult) -> TsResult<Self>;
    fn input_name(input: &Self::Input) -> &str;
    /// Columns written next to `name`; all of them are overwritten on conflict.
    fn upsert_values(input: &Self::Input) -> TsResult<Vec<(DictColumn, SeaValue)>>;
}

impl StoredEntry for Location {
    type Input = UpsertLocationInput;

    fn columns() -> &'static [DictColumn] {
        &[DictColumn::Id, DictColumn::Name, DictColumn::Details]
    }

    fn from_row(row: &QueryResult) -> TsResult<Self> {
        let id: i64 = row.try_get("", &col_name(DictColumn::Id))?;
        let name: String = row.try_get("", &col_name(DictColumn::Name))?;
        let details: Option<String> = row.try_get("", &col_name(DictColumn::Details))?;
        Ok(Location {
            id: LocationId::from_raw(id),
            name,
            details: Metadata::from_json(details.as_deref())?,
        })
    }

    fn input_name(input: &UpsertLocationInput) -> &str {
        &input.name
    }

    fn upsert_values(input: &UpsertLocationInput) -> TsResult<Vec<(DictColumn, SeaValue)>> {
        Ok(vec![(DictColumn::Details, details_value(&input.details)?)])
    }
}

impl StoredEntry for Parameter {
    type Input = UpsertParameterInput;

    fn columns() -> &'static [DictColumn] {
        &[
            DictColumn::Id,
            DictColumn::Name,
            DictColumn::Unit,
            DictColumn::Details,
        ]
    }

    fn from_row(row: &QueryResult) -> TsResult<Self> {
        let id: i64 = row.try_get("", &col_name(DictColumn::Id))?;
        let name: String = row.try_get("", &col_name(DictColumn::Name))?;
        let unit: Option<String> = row.try_get("", &col_name(DictColumn::Unit))?;
        let details: Option<String> = row.try_get("", &col_name(DictColumn::Details))?;
        Ok(Parameter {
            id: ParameterId::from_raw(id),
            name,
            unit,
            details: Metadata::from_json(details.as_deref())?,
        })
    }

    fn input_name(input: &UpsertParameterInput) -> &str {
        &input.name
    }

    fn upsert_values(input: &UpsertParameterInput) -> TsResult<Vec<(DictColumn, SeaValue)>> {
        Ok(vec![
            (DictColumn::Unit, SeaValue::from(input.unit.clone())),
            (DictColumn::Details, details_value(&input.details)?),
        ])
    }
}

fn details_value(details: &Metadata) -> TsResult<SeaValue> {
    if details.is_empty() {
        return Ok(SeaValue::String(None));
    }
    Ok(SeaValue::from(details.to_json()?))
}

/// One dictionary table plus its optional in-process snapshot.
///
/// `generation` moves on every invalidation; a load that started before the move
/// is returned to its caller but never cached.
pub(crate) struct Dictionary<E> {
    table: Alias,
    cache_enabled: bool,
    generation: AtomicU64,
    cache: RwLock<Option<Arc<Snapshot<E>>>>,
}

impl<E: StoredEntry> Dictionary<E> {
    pub fn new(table: Alias, cache_enabled: bool) -> Self {
        Self {
            table,
            cache_enabled,
            generation: AtomicU64::new(0),
            cache: RwLock::new(None),
        }
    }

    pub fn invalidate(&self) {
        let mut guard = self
            .cache
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        self.generation.fetch_add(1, Ordering::AcqRel);
        *guard = None;
    }

    fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Caches `snapshot` unless an invalidation happened since `loaded_at`.
    fn publish(&self, loaded_at: u64, snapshot: Arc<Snapshot<E>>) -> bool {
        let mut guard = self
            .cache
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if self.generation.load(Ordering::Acquire) != loaded_at {
            return false;
        }
        *guard = Some(snapshot);
        true
    }

    fn cached(&self) -> Option<Arc<Snapshot<E>>> {
        if !self.cache_enabled {
            return None;
        }
        self.cache
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub async fn all<C: ConnectionTrait>(&self, conn: &C) -> TsResult<Arc<Snapshot<E>>> {
        if let Some(snapshot) = self.cached() {
            return Ok(snapshot);
        }
        let loaded_at = self.generation();
        let snapshot = Arc::new(self.load(conn).await?);
        if self.cache_enabled && self.publish(loaded_at, snapshot.clone()) {
            log::debug!(
                "relts: reloaded {} dictionary ({} entries)",
                E::KIND,
                snapshot.len()
            );
        }
        Ok(snapshot)
    }

    pub async fn resolve<C: ConnectionTrait>(&self, conn: &C, name: &str) -> TsResult<E> {
        let snapshot = self.all(conn).await?;
        snapshot.resolve(name).cloned()
    }

    pub async fn upsert<C: ConnectionTrait>(&self, conn: &C, input: &E::Input) -> TsResult<()> {
        let name = E::input_name(input);
        validate_name(E::KIND, name)?;

        let mut columns = vec![DictColumn::Name];
        let mut values: Vec<SimpleExpr> = vec![name.to_string().into()];
        for (column, value) in E::upsert_values(input)? {
            columns.push(column);
            values.push(value.into());
        }
        let updated = columns[1..].to_vec();
        let insert = Query::insert()
            .into_table(self.table.clone())
            .columns(columns)
            .values_panic(values)
            .on_conflict(
                OnConflict::column(DictColumn::Name)
                    .update_columns(updated)
                    .to_owned(),
            )
            .to_owned();
        let result = exec(conn, &format!("upsert {}", E::KIND), &insert).await;
        self.invalidate();
        result.map(|_| ())
    }

    async fn load<C: ConnectionTrait>(&self, conn: &C) -> TsResult<Snapshot<E>> {
        let select = Query::select()
            .columns(E::columns().iter().copied())
            .from(self.table.clone())
            .order_by(DictColumn::Name, Order::Asc)
            .to_owned();
        let rows = query_all(conn, &format!("load {} dictionary", E::KIND), &select).await?;
        let mut entries = Vec::with_capacity(rows.len());
        for row in rows {
            entries.push(E::from_row(&row).map_err(|err| err.during("read dictionary row"))?);
        }
        Ok(Snapshot::from_entries(entries))
    }
}
