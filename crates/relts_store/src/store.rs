use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use sea_orm::sea_query::{Alias, Expr, Func, OnConflict, Order, Query, SimpleExpr};
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseBackend, DatabaseConnection, QueryResult,
    TransactionTrait,
};
use sea_orm_migration::MigratorTrait;

use crate::db::*;
use crate::dict_cache::Dictionary;
use crate::migration::Migrator;
use crate::provision::{create_series_tables, drop_series_tables};
use crate::TsConfig;
use relts_core::{
    resolve_filter, DictionaryApi, DimensionId, InsertValueInput, LatestQuery, Location,
    LocationId, Parameter, ParameterId, RangeQuery, ResolvedSet, Scalar, Snapshot, TsError,
    TsResult, UpsertLocationInput, UpsertParameterInput, ValueKind, ValueQueryApi, ValueRow,
    ValueSchema, ValueWriteApi,
};

pub(crate) struct SeriesDictionaries {
    locations: Dictionary<Location>,
    parameters: Dictionary<Parameter>,
}

impl SeriesDictionaries {
    fn new(tables: &SeriesTables, cache_enabled: bool) -> Self {
        Self {
            locations: Dictionary::new(tables.locations.clone(), cache_enabled),
            parameters: Dictionary::new(tables.parameters.clone(), cache_enabled),
        }
    }

    fn invalidate(&self) {
        self.locations.invalidate();
        self.parameters.invalidate();
    }
}

type SharedDictionaries = Arc<Mutex<HashMap<String, Arc<SeriesDictionaries>>>>;

/// A registered namespace and the value column it was provisioned with.
#[derive(Clone, Debug, PartialEq)]
pub struct SeriesInfo {
    pub name: String,
    pub schema: ValueSchema,
}

/// Connection to the backing database plus the per-process state shared by every
/// namespace handle opened through it.
#[derive(Clone)]
pub struct TimeSeriesStore {
    conn: DatabaseConnection,
    cache_enabled: bool,
    atomic_inserts: bool,
    failpoints: Arc<HashSet<String>>,
    dictionaries: SharedDictionaries,
}

impl TimeSeriesStore {
    pub async fn connect(config: &TsConfig, base_dir: &Path) -> TsResult<Self> {
        config.validate()?;
        let mut options = ConnectOptions::new(config.connection_url(base_dir)?);
        if let Some(pool) = &config.pool {
            pool.apply(&mut options);
        }
        options.sqlx_logging(false);
        let conn = Database::connect(options)
            .await
            .map_err(|err| TsError::from(err).during("connect"))?;
        let store = Self {
            conn,
            cache_enabled: config.cache_enabled(),
            atomic_inserts: config.atomic_inserts_enabled(),
            failpoints: Arc::new(config.failpoint_set()),
            dictionaries: Arc::new(Mutex::new(HashMap::new())),
        };
        Migrator::up(&store.conn, None)
            .await
            .map_err(|err| TsError::from(err).during("migrate"))?;
        log::debug!("relts: connected to {} store", config.backend_name());
        Ok(store)
    }

    pub async fn connect_sqlite(path: &Path) -> TsResult<Self> {
        let config = TsConfig::default_sqlite(path.to_string_lossy());
        Self::connect(&config, path.parent().unwrap_or_else(|| Path::new("."))).await
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.conn
    }

    /// Creates the namespace tables if needed and registers the namespace.
    ///
    /// Provisioning an already registered namespace again is a no-op as long as the
    /// value kind matches.
    pub async fn provision_series(
        &self,
        name: &str,
        schema: ValueSchema,
        create_info_view: bool,
    ) -> TsResult<TimeSeries> {
        let name = sanitize_series_name(name)?;
        if let Some(existing) = self.read_registry(&name).await? {
            if existing.kind != schema.kind {
                return Err(TsError::invalid(format!(
                    "time series '{name}' already holds {} values",
                    existing.kind
                )));
            }
        }
        let tables = SeriesTables::for_series(&name);
        create_series_tables(&self.conn, &tables, &schema, create_info_view).await?;
        if self.read_registry(&name).await?.is_none() {
            let insert = Query::insert()
                .into_table(ReltsSeries::Table)
                .columns([
                    ReltsSeries::Name,
                    ReltsSeries::ValueKind,
                    ReltsSeries::ValueSqlType,
                ])
                .values_panic([
                    name.clone().into(),
                    schema.kind.as_str().into(),
                    schema.sql_type.clone().into(),
                ])
                .to_owned();
            exec(&self.conn, "register time series", &insert).await?;
            log::info!(
                "relts: provisioned time series '{name}' ({} values)",
                schema.kind
            );
        }
        Ok(self.handle(tables, schema))
    }

    /// Opens a namespace that was provisioned earlier.
    pub async fn open_series(&self, name: &str) -> TsResult<TimeSeries> {
        let name = sanitize_series_name(name)?;
        let schema = self
            .read_registry(&name)
            .await?
            .ok_or_else(|| TsError::unknown_series(name.as_str()))?;
        Ok(self.handle(SeriesTables::for_series(&name), schema))
    }

    pub async fn list_series(&self) -> TsResult<Vec<SeriesInfo>> {
        let select = Query::select()
            .columns([
                ReltsSeries::Name,
                ReltsSeries::ValueKind,
                ReltsSeries::ValueSqlType,
            ])
            .from(ReltsSeries::Table)
            .order_by(ReltsSeries::Name, Order::Asc)
            .to_owned();
        let rows = query_all(&self.conn, "list time series", &select).await?;
        let mut series = Vec::with_capacity(rows.len());
        for row in rows {
            let name: String = row.try_get("", &col_name(ReltsSeries::Name))?;
            let schema = read_schema(&row)?;
            series.push(SeriesInfo { name, schema });
        }
        Ok(series)
    }

    async fn read_registry(&self, name: &str) -> TsResult<Option<ValueSchema>> {
        let select = Query::select()
            .columns([ReltsSeries::ValueKind, ReltsSeries::ValueSqlType])
            .from(ReltsSeries::Table)
            .and_where(Expr::col(ReltsSeries::Name).eq(name))
            .to_owned();
        match query_one(&self.conn, "read time series registry", &select).await? {
            Some(row) => Ok(Some(read_schema(&row)?)),
            None => Ok(None),
        }
    }

    fn handle(&self, tables: SeriesTables, schema: ValueSchema) -> TimeSeries {
        let dictionaries = {
            let mut shared = self
                .dictionaries
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            shared
                .entry(tables.name.clone())
                .or_insert_with(|| Arc::new(SeriesDictionaries::new(&tables, self.cache_enabled)))
                .clone()
        };
        TimeSeries {
            conn: self.conn.clone(),
            tables,
            schema,
            dictionaries,
            shared: self.dictionaries.clone(),
            atomic_inserts: self.atomic_inserts,
            failpoints: self.failpoints.clone(),
        }
    }
}

/// One provisioned namespace: its dictionaries, facts and latest-value index.
#[derive(Clone)]
pub struct TimeSeries {
    conn: DatabaseConnection,
    tables: SeriesTables,
    schema: ValueSchema,
    dictionaries: Arc<SeriesDictionaries>,
    shared: SharedDictionaries,
    atomic_inserts: bool,
    failpoints: Arc<HashSet<String>>,
}

impl TimeSeries {
    pub fn name(&self) -> &str {
        &self.tables.name
    }

    pub fn value_schema(&self) -> &ValueSchema {
        &self.schema
    }

    pub fn value_kind(&self) -> ValueKind {
        self.schema.kind
    }

    pub fn invalidate_caches(&self) {
        self.dictionaries.invalidate();
    }

    /// Drops the view, all four tables and the registry row of this namespace.
    pub async fn drop_tables(&self) -> TsResult<()> {
        drop_series_tables(&self.conn, &self.tables).await?;
        let delete = Query::delete()
            .from_table(ReltsSeries::Table)
            .and_where(Expr::col(ReltsSeries::Name).eq(self.tables.name.as_str()))
            .to_owned();
        exec(&self.conn, "unregister time series", &delete).await?;
        self.invalidate_caches();
        self.shared
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(&self.tables.name);
        log::info!("relts: dropped time series '{}'", self.tables.name);
        Ok(())
    }

    fn maybe_failpoint(&self, key: &str) -> TsResult<()> {
        if self.failpoints.contains(key) {
            log::warn!("relts: failpoint {key} triggered");
            Err(TsError::storage(key, format!("failpoint {key}")))
        } else {
            Ok(())
        }
    }

    async fn write_value<C: ConnectionTrait>(
        &self,
        conn: &C,
        location: LocationId,
        parameter: ParameterId,
        timestamp: i64,
        value: Scalar,
    ) -> TsResult<()> {
        let fact = Query::insert()
            .into_table(self.tables.values.clone())
            .columns([
                ValueColumn::Timestamp,
                ValueColumn::LocationId,
                ValueColumn::ParameterId,
                ValueColumn::Val,
            ])
            .values_panic([
                timestamp.into(),
                location.raw().into(),
                parameter.raw().into(),
                scalar_expr(&value),
            ])
            .on_conflict(
                OnConflict::columns([
                    ValueColumn::Timestamp,
                    ValueColumn::LocationId,
                    ValueColumn::ParameterId,
                ])
                .update_column(ValueColumn::Val)
                .to_owned(),
            )
            .to_owned();
        exec(conn, "upsert value", &fact).await?;
        self.maybe_failpoint("insert.after_fact")?;

        let latest = Query::insert()
            .into_table(self.tables.latest_values.clone())
            .columns([
                ValueColumn::LocationId,
                ValueColumn::ParameterId,
                ValueColumn::Timestamp,
                ValueColumn::Val,
            ])
            .values_panic([
                location.raw().into(),
                parameter.raw().into(),
                timestamp.into(),
                scalar_expr(&value),
            ])
            .on_conflict(latest_on_conflict(
                conn.get_database_backend(),
                &self.tables.latest_values,
            ))
            .to_owned();
        exec(conn, "upsert latest value", &latest).await?;
        Ok(())
    }

    async fn resolve_or_skip<E, F>(&self, lookup: F, fail_silently: bool) -> TsResult<Option<E>>
    where
        F: std::future::Future<Output = TsResult<E>>,
    {
        match lookup.await {
            Ok(entry) => Ok(Some(entry)),
            Err(err) if fail_silently && err.is_not_found() => {
                log::debug!("relts: skipped insert into '{}': {err}", self.tables.name);
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    fn value_select(&self, table: &Alias) -> sea_orm::sea_query::SelectStatement {
        let locations = self.tables.locations.clone();
        let parameters = self.tables.parameters.clone();
        Query::select()
            .column((table.clone(), ValueColumn::Timestamp))
            .expr_as(Expr::col((locations.clone(), DictColumn::Name)), ViewColumn::Loc)
            .expr_as(
                Expr::col((parameters.clone(), DictColumn::Name)),
                ViewColumn::Par,
            )
            .expr_as(
                value_expr(table, self.schema.kind, self.conn.get_database_backend()),
                ValueColumn::Val,
            )
            .from(table.clone())
            .inner_join(
                locations.clone(),
                Expr::col((table.clone(), ValueColumn::LocationId))
                    .equals((locations, DictColumn::Id)),
            )
            .inner_join(
                parameters.clone(),
                Expr::col((table.clone(), ValueColumn::ParameterId))
                    .equals((parameters, DictColumn::Id)),
            )
            .to_owned()
    }

    async fn resolved_sets(
        &self,
        locations: &relts_core::NameFilter,
        parameters: &relts_core::NameFilter,
        fail_silently: bool,
    ) -> TsResult<(ResolvedSet<LocationId>, ResolvedSet<ParameterId>)> {
        let location_snapshot = self.dictionaries.locations.all(&self.conn).await?;
        let parameter_snapshot = self.dictionaries.parameters.all(&self.conn).await?;
        let locations = resolve_filter(locations, &location_snapshot, fail_silently)?;
        let parameters = resolve_filter(parameters, &parameter_snapshot, fail_silently)?;
        Ok((locations, parameters))
    }

    fn read_rows(&self, rows: Vec<QueryResult>) -> TsResult<Vec<ValueRow>> {
        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let timestamp: i64 = row.try_get("", &col_name(ValueColumn::Timestamp))?;
            let location: String = row.try_get("", &col_name(ViewColumn::Loc))?;
            let parameter: String = row.try_get("", &col_name(ViewColumn::Par))?;
            let value = read_scalar(&row, self.schema.kind)?;
            out.push(ValueRow {
                timestamp,
                location,
                parameter,
                value,
            });
        }
        Ok(out)
    }
}

#[async_trait]
impl DictionaryApi for TimeSeries {
    async fn upsert_location(&self, input: UpsertLocationInput) -> TsResult<()> {
        self.dictionaries.locations.upsert(&self.conn, &input).await
    }

    async fn upsert_parameter(&self, input: UpsertParameterInput) -> TsResult<()> {
        self.dictionaries.parameters.upsert(&self.conn, &input).await
    }

    async fn locations(&self) -> TsResult<Arc<Snapshot<Location>>> {
        self.dictionaries.locations.all(&self.conn).await
    }

    async fn parameters(&self) -> TsResult<Arc<Snapshot<Parameter>>> {
        self.dictionaries.parameters.all(&self.conn).await
    }

    async fn resolve_location(&self, name: &str) -> TsResult<Location> {
        self.dictionaries.locations.resolve(&self.conn, name).await
    }

    async fn resolve_parameter(&self, name: &str) -> TsResult<Parameter> {
        self.dictionaries.parameters.resolve(&self.conn, name).await
    }
}

#[async_trait]
impl ValueWriteApi for TimeSeries {
    async fn insert_value(&self, input: InsertValueInput) -> TsResult<bool> {
        let Some(location) = self
            .resolve_or_skip(
                self.dictionaries.locations.resolve(&self.conn, &input.location),
                input.fail_silently,
            )
            .await?
        else {
            return Ok(false);
        };
        let Some(parameter) = self
            .resolve_or_skip(
                self.dictionaries
                    .parameters
                    .resolve(&self.conn, &input.parameter),
                input.fail_silently,
            )
            .await?
        else {
            return Ok(false);
        };
        let value = self.schema.kind.coerce(input.value)?;

        if self.atomic_inserts {
            let txn = self
                .conn
                .begin()
                .await
                .map_err(|err| TsError::from(err).during("begin insert"))?;
            self.write_value(&txn, location.id, parameter.id, input.timestamp, value)
                .await?;
            txn.commit()
                .await
                .map_err(|err| TsError::from(err).during("commit insert"))?;
        } else {
            self.write_value(
                &self.conn,
                location.id,
                parameter.id,
                input.timestamp,
                value,
            )
            .await?;
        }
        Ok(true)
    }

    async fn delete_values_older_than(&self, timestamp: i64) -> TsResult<u64> {
        let delete = Query::delete()
            .from_table(self.tables.values.clone())
            .and_where(Expr::col(ValueColumn::Timestamp).lt(timestamp))
            .to_owned();
        let result = exec(&self.conn, "delete old values", &delete).await?;
        log::debug!(
            "relts: deleted {} values older than {timestamp} from '{}'",
            result.rows_affected(),
            self.tables.name
        );
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl ValueQueryApi for TimeSeries {
    async fn range(&self, query: RangeQuery) -> TsResult<Vec<ValueRow>> {
        let (locations, parameters) = self
            .resolved_sets(&query.locations, &query.parameters, query.fail_silently)
            .await?;
        let values = self.tables.values.clone();
        let select = self
            .value_select(&values)
            .and_where_option(id_condition(&values, ValueColumn::LocationId, &locations))
            .and_where_option(id_condition(&values, ValueColumn::ParameterId, &parameters))
            .and_where_option(
                query
                    .start
                    .map(|start| Expr::col((values.clone(), ValueColumn::Timestamp)).gte(start)),
            )
            .and_where_option(
                query
                    .end
                    .map(|end| Expr::col((values.clone(), ValueColumn::Timestamp)).lte(end)),
            )
            .order_by((values.clone(), ValueColumn::Timestamp), Order::Asc)
            .order_by((self.tables.locations.clone(), DictColumn::Name), Order::Asc)
            .order_by((self.tables.parameters.clone(), DictColumn::Name), Order::Asc)
            .to_owned();
        let rows = query_all(&self.conn, "query range", &select).await?;
        self.read_rows(rows)
    }

    async fn latest(&self, query: LatestQuery) -> TsResult<Vec<ValueRow>> {
        let (locations, parameters) = self
            .resolved_sets(&query.locations, &query.parameters, query.fail_silently)
            .await?;
        let latest = self.tables.latest_values.clone();
        let select = self
            .value_select(&latest)
            .and_where_option(id_condition(&latest, ValueColumn::LocationId, &locations))
            .and_where_option(id_condition(&latest, ValueColumn::ParameterId, &parameters))
            .and_where_option(
                query
                    .min_timestamp
                    .map(|min| Expr::col((latest.clone(), ValueColumn::Timestamp)).gte(min)),
            )
            .order_by((self.tables.locations.clone(), DictColumn::Name), Order::Asc)
            .order_by((self.tables.parameters.clone(), DictColumn::Name), Order::Asc)
            .to_owned();
        let rows = query_all(&self.conn, "query latest", &select).await?;
        self.read_rows(rows)
    }
}

/// Keeps the stored entry unless the incoming timestamp is at least as new.
fn latest_on_conflict(backend: DatabaseBackend, table: &Alias) -> OnConflict {
    let mut on_conflict =
        OnConflict::columns([ValueColumn::LocationId, ValueColumn::ParameterId]);
    match backend {
        DatabaseBackend::MySql => {
            // Assignments run left to right, so `val` must read the old timestamp.
            on_conflict.values([
                (
                    ValueColumn::Val,
                    Expr::cust("IF(VALUES(`timestamp`) >= `timestamp`, VALUES(`val`), `val`)"),
                ),
                (
                    ValueColumn::Timestamp,
                    Expr::cust("GREATEST(VALUES(`timestamp`), `timestamp`)"),
                ),
            ]);
        }
        _ => {
            on_conflict
                .update_columns([ValueColumn::Timestamp, ValueColumn::Val])
                .action_and_where(
                    Expr::col((table.clone(), ValueColumn::Timestamp))
                        .lte(Expr::col((Alias::new("excluded"), ValueColumn::Timestamp))),
                );
        }
    }
    on_conflict
}

fn id_condition<I: DimensionId>(
    table: &Alias,
    column: ValueColumn,
    set: &ResolvedSet<I>,
) -> Option<SimpleExpr> {
    match set {
        ResolvedSet::All(_) => None,
        ResolvedSet::Subset(ids) if ids.is_empty() => Some(Expr::cust("1 = 0")),
        ResolvedSet::Subset(ids) => Some(
            Expr::col((table.clone(), column)).is_in(ids.iter().map(|id| id.raw())),
        ),
    }
}

fn scalar_expr(value: &Scalar) -> SimpleExpr {
    match value {
        Scalar::Integer(value) => (*value).into(),
        Scalar::Float(value) => (*value).into(),
        Scalar::Text(value) => value.clone().into(),
    }
}

/// Reads `val` as the type `read_scalar` decodes, whatever raw column type the
/// series was provisioned with.
fn value_expr(table: &Alias, kind: ValueKind, backend: DatabaseBackend) -> SimpleExpr {
    let column = Expr::col((table.clone(), ValueColumn::Val));
    let cast_to = match (backend, kind) {
        (DatabaseBackend::Sqlite, _) => return column.into(),
        (DatabaseBackend::Postgres, ValueKind::Integer) => "BIGINT",
        (DatabaseBackend::Postgres, ValueKind::Float) => "DOUBLE PRECISION",
        (DatabaseBackend::Postgres, ValueKind::Text) => "TEXT",
        (DatabaseBackend::MySql, ValueKind::Integer) => "SIGNED",
        (DatabaseBackend::MySql, ValueKind::Float) => "DOUBLE",
        (DatabaseBackend::MySql, ValueKind::Text) => "CHAR",
    };
    Func::cast_as(column, Alias::new(cast_to)).into()
}

fn read_scalar(row: &QueryResult, kind: ValueKind) -> TsResult<Scalar> {
    let column = col_name(ValueColumn::Val);
    let value = match kind {
        ValueKind::Integer => row
            .try_get::<Option<i64>>("", &column)?
            .map(Scalar::Integer),
        ValueKind::Float => match row.try_get::<Option<f64>>("", &column) {
            Ok(value) => value.map(Scalar::Float),
            Err(_) => row
                .try_get::<Option<i64>>("", &column)?
                .map(|value| Scalar::Float(value as f64)),
        },
        ValueKind::Text => row
            .try_get::<Option<String>>("", &column)?
            .map(Scalar::Text),
    };
    value.ok_or_else(|| TsError::storage("read value", "stored value is null"))
}

fn read_schema(row: &QueryResult) -> TsResult<ValueSchema> {
    let raw_kind: String = row.try_get("", &col_name(ReltsSeries::ValueKind))?;
    let sql_type: Option<String> = row.try_get("", &col_name(ReltsSeries::ValueSqlType))?;
    let kind = ValueKind::parse(&raw_kind).ok_or_else(|| {
        TsError::storage(
            "read time series registry",
            format!("unknown value kind '{raw_kind}'"),
        )
    })?;
    Ok(ValueSchema { kind, sql_type })
}

#[cfg(test)]
mod tests {
    use sea_orm::sea_query::{MysqlQueryBuilder, PostgresQueryBuilder, Query, SqliteQueryBuilder};
    use sea_orm::DatabaseBackend;

    use super::{id_condition, latest_on_conflict, value_expr};
    use crate::db::{SeriesTables, ValueColumn};
    use relts_core::{LocationId, ResolvedSet, ValueKind};

    #[test]
    fn value_reads_are_cast_to_the_decoded_type_per_backend() {
        let tables = SeriesTables::for_series("demo");
        let select = |backend, kind| {
            Query::select()
                .expr_as(value_expr(&tables.values, kind, backend), ValueColumn::Val)
                .from(tables.values.clone())
                .to_owned()
        };

        let sql = select(DatabaseBackend::Sqlite, ValueKind::Float).to_string(SqliteQueryBuilder);
        assert_eq!(
            sql,
            r#"SELECT "relts_demo_values"."val" AS "val" FROM "relts_demo_values""#
        );

        let sql =
            select(DatabaseBackend::Postgres, ValueKind::Float).to_string(PostgresQueryBuilder);
        assert!(sql.contains(r#"CAST("relts_demo_values"."val" AS DOUBLE PRECISION) AS "val""#));
        let sql =
            select(DatabaseBackend::Postgres, ValueKind::Integer).to_string(PostgresQueryBuilder);
        assert!(sql.contains(r#"CAST("relts_demo_values"."val" AS BIGINT)"#));

        let sql = select(DatabaseBackend::MySql, ValueKind::Float).to_string(MysqlQueryBuilder);
        assert!(sql.contains("CAST(`relts_demo_values`.`val` AS DOUBLE) AS `val`"));
        let sql = select(DatabaseBackend::MySql, ValueKind::Integer).to_string(MysqlQueryBuilder);
        assert!(sql.contains("CAST(`relts_demo_values`.`val` AS SIGNED)"));
    }

    #[test]
    fn latest_upsert_only_moves_forward_in_time() {
        let tables = SeriesTables::for_series("demo");
        let sql = Query::insert()
            .into_table(tables.latest_values.clone())
            .columns([
                ValueColumn::LocationId,
                ValueColumn::ParameterId,
                ValueColumn::Timestamp,
                ValueColumn::Val,
            ])
            .values_panic([1i64.into(), 2i64.into(), 3i64.into(), 4.5f64.into()])
            .on_conflict(latest_on_conflict(
                DatabaseBackend::Sqlite,
                &tables.latest_values,
            ))
            .to_string(SqliteQueryBuilder);
        assert!(sql.contains("ON CONFLICT (\"location_id\", \"parameter_id\") DO UPDATE SET"));
        assert!(sql.contains(
            "WHERE \"relts_demo_latest_values\".\"timestamp\" <= \"excluded\".\"timestamp\""
        ));
    }

    #[test]
    fn empty_subset_matches_nothing_and_all_adds_no_predicate() {
        let tables = SeriesTables::for_series("demo");
        let all: ResolvedSet<LocationId> = ResolvedSet::All(vec![LocationId(1)]);
        assert!(id_condition(&tables.values, ValueColumn::LocationId, &all).is_none());

        let none: ResolvedSet<LocationId> = ResolvedSet::Subset(Vec::new());
        let sql = Query::select()
            .column(ValueColumn::Val)
            .from(tables.values.clone())
            .and_where_option(id_condition(&tables.values, ValueColumn::LocationId, &none))
            .to_string(SqliteQueryBuilder);
        assert!(sql.ends_with("WHERE 1 = 0"));
    }
}
