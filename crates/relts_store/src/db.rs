use sea_orm::sea_query;
use sea_orm::sea_query::{
    Alias, MysqlQueryBuilder, PostgresQueryBuilder, QueryStatementWriter, SqliteQueryBuilder,
};
use sea_orm::{ConnectionTrait, DatabaseBackend, ExecResult, QueryResult, Statement};
use sea_orm::DeriveIden;

use relts_core::{TsError, TsResult};

#[derive(DeriveIden, Clone, Copy)]
pub enum ReltsSeries {
    Table,
    Name,
    ValueKind,
    ValueSqlType,
}

/// Columns shared by the location and parameter tables; only parameters carry `Unit`.
#[derive(DeriveIden, Clone, Copy)]
pub enum DictColumn {
    Id,
    Name,
    Unit,
    Details,
}

/// Columns shared by the value table and the latest-value table.
#[derive(DeriveIden, Clone, Copy)]
pub enum ValueColumn {
    Timestamp,
    LocationId,
    ParameterId,
    Val,
}

#[derive(DeriveIden, Clone, Copy)]
pub enum ViewColumn {
    Loc,
    Par,
}

/// Keeps `[A-Za-z0-9_-]` and drops everything else.
pub fn sanitize_series_name(name: &str) -> TsResult<String> {
    let cleaned: String = name
        .chars()
        .filter(|ch| ch.is_ascii_alphanumeric() || *ch == '_' || *ch == '-')
        .collect();
    if cleaned.is_empty() {
        return Err(TsError::invalid(format!(
            "time series name '{name}' is empty after sanitizing"
        )));
    }
    Ok(cleaned)
}

#[derive(Clone, Debug)]
pub(crate) struct SeriesTables {
    pub name: String,
    pub locations: Alias,
    pub parameters: Alias,
    pub values: Alias,
    pub latest_values: Alias,
}

impl SeriesTables {
    pub fn for_series(name: &str) -> Self {
        let table = |suffix: &str| Alias::new(format!("relts_{name}_{suffix}"));
        Self {
            name: name.to_string(),
            locations: table("locations"),
            parameters: table("parameters"),
            values: table("values"),
            latest_values: table("latest_values"),
        }
    }

    pub fn view_name(&self) -> String {
        format!("relts_{}_view", self.name)
    }

    pub fn fk_name(&self, table: &str, column: &str) -> String {
        format!("fk_relts_{}_{table}_{column}", self.name)
    }
}

pub(crate) fn col_name(column: impl sea_query::Iden) -> String {
    column.to_string()
}

pub(crate) fn build_stmt<S: QueryStatementWriter>(
    backend: DatabaseBackend,
    stmt: &S,
) -> (String, sea_orm::sea_query::Values) {
    match backend {
        DatabaseBackend::Sqlite => stmt.build(SqliteQueryBuilder),
        DatabaseBackend::Postgres => stmt.build(PostgresQueryBuilder),
        DatabaseBackend::MySql => stmt.build(MysqlQueryBuilder),
    }
}

pub(crate) async fn exec<C, S>(conn: &C, operation: &str, stmt: &S) -> TsResult<ExecResult>
where
    C: ConnectionTrait,
    S: QueryStatementWriter,
{
    let backend = conn.get_database_backend();
    let (sql, values) = build_stmt(backend, stmt);
    conn.execute(Statement::from_sql_and_values(backend, sql, values))
        .await
        .map_err(|err| TsError::from(err).during(operation))
}

pub(crate) async fn query_all<C, S>(
    conn: &C,
    operation: &str,
    stmt: &S,
) -> TsResult<Vec<QueryResult>>
where
    C: ConnectionTrait,
    S: QueryStatementWriter,
{
    let backend = conn.get_database_backend();
    let (sql, values) = build_stmt(backend, stmt);
    conn.query_all(Statement::from_sql_and_values(backend, sql, values))
        .await
        .map_err(|err| TsError::from(err).during(operation))
}

pub(crate) async fn query_one<C, S>(
    conn: &C,
    operation: &str,
    stmt: &S,
) -> TsResult<Option<QueryResult>>
where
    C: ConnectionTrait,
    S: QueryStatementWriter,
{
    let backend = conn.get_database_backend();
    let (sql, values) = build_stmt(backend, stmt);
    conn.query_one(Statement::from_sql_and_values(backend, sql, values))
        .await
        .map_err(|err| TsError::from(err).during(operation))
}

#[cfg(test)]
mod tests {
    use sea_orm::sea_query::Iden;

    use super::{sanitize_series_name, SeriesTables};

    #[test]
    fn strips_everything_but_word_characters_and_dashes() {
        let cleaned =
            sanitize_series_name("Test of a time-series, name cleaned up! 123").expect("name");
        assert_eq!(cleaned, "Testofatime-seriesnamecleanedup123");
        assert_eq!(sanitize_series_name("a`b;c d_e").unwrap(), "abcd_e");
    }

    #[test]
    fn rejects_names_that_sanitize_to_nothing() {
        assert!(sanitize_series_name(" ;`! ").is_err());
    }

    #[test]
    fn tables_are_prefixed_per_series() {
        let tables = SeriesTables::for_series("weather");
        assert_eq!(Iden::to_string(&tables.locations), "relts_weather_locations");
        assert_eq!(
            Iden::to_string(&tables.latest_values),
            "relts_weather_latest_values"
        );
        assert_eq!(tables.view_name(), "relts_weather_view");
    }
}
