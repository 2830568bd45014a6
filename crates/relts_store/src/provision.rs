use sea_orm::sea_query::{
    Alias, ColumnDef, Expr, ForeignKey, Iden, Index, MysqlQueryBuilder, Order,
    PostgresQueryBuilder, Query, SelectStatement, SqliteQueryBuilder, Table,
};
use sea_orm::{ConnectionTrait, DatabaseBackend, DatabaseConnection};
use sea_orm_migration::SchemaManager;

use relts_core::{TsError, TsResult, ValueKind, ValueSchema};

use crate::db::{DictColumn, SeriesTables, ValueColumn, ViewColumn};

pub(crate) async fn create_series_tables(
    conn: &DatabaseConnection,
    tables: &SeriesTables,
    schema: &ValueSchema,
    create_info_view: bool,
) -> TsResult<()> {
    let backend = conn.get_database_backend();
    let manager = SchemaManager::new(conn);

    manager
        .create_table(
            Table::create()
                .table(tables.locations.clone())
                .if_not_exists()
                .col(&mut surrogate_key_col(backend))
                .col(
                    ColumnDef::new(DictColumn::Name)
                        .string_len(128)
                        .not_null()
                        .unique_key(),
                )
                .col(ColumnDef::new(DictColumn::Details).text().null())
                .to_owned(),
        )
        .await
        .map_err(|err| TsError::from(err).during("create locations table"))?;

    manager
        .create_table(
            Table::create()
                .table(tables.parameters.clone())
                .if_not_exists()
                .col(&mut surrogate_key_col(backend))
                .col(
                    ColumnDef::new(DictColumn::Name)
                        .string_len(128)
                        .not_null()
                        .unique_key(),
                )
                .col(ColumnDef::new(DictColumn::Unit).string_len(128).null())
                .col(ColumnDef::new(DictColumn::Details).text().null())
                .to_owned(),
        )
        .await
        .map_err(|err| TsError::from(err).during("create parameters table"))?;

    manager
        .create_table(
            Table::create()
                .table(tables.values.clone())
                .if_not_exists()
                .col(
                    ColumnDef::new(ValueColumn::Timestamp)
                        .big_integer()
                        .not_null(),
                )
                .col(&mut reference_col(backend, ValueColumn::LocationId))
                .col(&mut reference_col(backend, ValueColumn::ParameterId))
                .col(&mut value_col(schema))
                .primary_key(
                    Index::create()
                        .name(format!("pk_relts_{}_values", tables.name))
                        .col(ValueColumn::Timestamp)
                        .col(ValueColumn::LocationId)
                        .col(ValueColumn::ParameterId),
                )
                .foreign_key(
                    ForeignKey::create()
                        .name(tables.fk_name("values", "location"))
                        .from(tables.values.clone(), ValueColumn::LocationId)
                        .to(tables.locations.clone(), DictColumn::Id),
                )
                .foreign_key(
                    ForeignKey::create()
                        .name(tables.fk_name("values", "parameter"))
                        .from(tables.values.clone(), ValueColumn::ParameterId)
                        .to(tables.parameters.clone(), DictColumn::Id),
                )
                .to_owned(),
        )
        .await
        .map_err(|err| TsError::from(err).during("create values table"))?;

    manager
        .create_table(
            Table::create()
                .table(tables.latest_values.clone())
                .if_not_exists()
                .col(&mut reference_col(backend, ValueColumn::LocationId))
                .col(&mut reference_col(backend, ValueColumn::ParameterId))
                .col(
                    ColumnDef::new(ValueColumn::Timestamp)
                        .big_integer()
                        .not_null(),
                )
                .col(&mut value_col(schema))
                .primary_key(
                    Index::create()
                        .name(format!("pk_relts_{}_latest_values", tables.name))
                        .col(ValueColumn::LocationId)
                        .col(ValueColumn::ParameterId),
                )
                .foreign_key(
                    ForeignKey::create()
                        .name(tables.fk_name("latest_values", "location"))
                        .from(tables.latest_values.clone(), ValueColumn::LocationId)
                        .to(tables.locations.clone(), DictColumn::Id),
                )
                .foreign_key(
                    ForeignKey::create()
                        .name(tables.fk_name("latest_values", "parameter"))
                        .from(tables.latest_values.clone(), ValueColumn::ParameterId)
                        .to(tables.parameters.clone(), DictColumn::Id),
                )
                .to_owned(),
        )
        .await
        .map_err(|err| TsError::from(err).during("create latest values table"))?;

    if create_info_view {
        let sql = create_view_sql(backend, tables);
        conn.execute_unprepared(&sql)
            .await
            .map_err(|err| TsError::from(err).during("create info view"))?;
    }
    Ok(())
}

pub(crate) async fn drop_series_tables(
    conn: &DatabaseConnection,
    tables: &SeriesTables,
) -> TsResult<()> {
    let backend = conn.get_database_backend();
    let drop_view = format!("DROP VIEW IF EXISTS {}", quote(backend, &tables.view_name()));
    conn.execute_unprepared(&drop_view)
        .await
        .map_err(|err| TsError::from(err).during("drop info view"))?;

    let manager = SchemaManager::new(conn);
    for table in [
        &tables.latest_values,
        &tables.values,
        &tables.parameters,
        &tables.locations,
    ] {
        manager
            .drop_table(Table::drop().table(table.clone()).if_exists().to_owned())
            .await
            .map_err(|err| TsError::from(err).during("drop series table"))?;
    }
    Ok(())
}

fn surrogate_key_col(backend: DatabaseBackend) -> ColumnDef {
    let mut col_def = ColumnDef::new(DictColumn::Id);
    match backend {
        // AUTOINCREMENT is only accepted on a plain INTEGER primary key.
        DatabaseBackend::Sqlite => {
            col_def.integer();
        }
        _ => {
            col_def.big_integer();
        }
    }
    col_def.not_null().auto_increment().primary_key();
    col_def
}

fn reference_col(backend: DatabaseBackend, col: impl Iden + 'static) -> ColumnDef {
    let mut col_def = ColumnDef::new(col);
    match backend {
        DatabaseBackend::Sqlite => {
            col_def.integer();
        }
        _ => {
            col_def.big_integer();
        }
    }
    col_def.not_null();
    col_def
}

fn value_col(schema: &ValueSchema) -> ColumnDef {
    let mut col_def = ColumnDef::new(ValueColumn::Val);
    match (&schema.sql_type, schema.kind) {
        (Some(raw), _) => {
            col_def.custom(Alias::new(raw.clone()));
        }
        (None, ValueKind::Integer) => {
            col_def.big_integer();
        }
        (None, ValueKind::Float) => {
            col_def.double();
        }
        (None, ValueKind::Text) => {
            col_def.text();
        }
    }
    col_def.null();
    col_def
}

fn view_select(tables: &SeriesTables) -> SelectStatement {
    Query::select()
        .column((tables.values.clone(), ValueColumn::Timestamp))
        .expr_as(
            Expr::col((tables.locations.clone(), DictColumn::Name)),
            ViewColumn::Loc,
        )
        .expr_as(
            Expr::col((tables.parameters.clone(), DictColumn::Name)),
            ViewColumn::Par,
        )
        .column((tables.values.clone(), ValueColumn::Val))
        .from(tables.values.clone())
        .inner_join(
            tables.locations.clone(),
            Expr::col((tables.values.clone(), ValueColumn::LocationId))
                .equals((tables.locations.clone(), DictColumn::Id)),
        )
        .inner_join(
            tables.parameters.clone(),
            Expr::col((tables.values.clone(), ValueColumn::ParameterId))
                .equals((tables.parameters.clone(), DictColumn::Id)),
        )
        .order_by((tables.values.clone(), ValueColumn::Timestamp), Order::Desc)
        .order_by((tables.locations.clone(), DictColumn::Name), Order::Asc)
        .order_by((tables.parameters.clone(), DictColumn::Name), Order::Asc)
        .to_owned()
}

fn create_view_sql(backend: DatabaseBackend, tables: &SeriesTables) -> String {
    let select = view_select(tables);
    let view = quote(backend, &tables.view_name());
    match backend {
        DatabaseBackend::Postgres => format!(
            "CREATE OR REPLACE VIEW {view} AS {}",
            select.to_string(PostgresQueryBuilder)
        ),
        DatabaseBackend::MySql => format!(
            "CREATE OR REPLACE VIEW {view} AS {}",
            select.to_string(MysqlQueryBuilder)
        ),
        _ => format!(
            "CREATE VIEW IF NOT EXISTS {view} AS {}",
            select.to_string(SqliteQueryBuilder)
        ),
    }
}

fn quote(backend: DatabaseBackend, ident: &str) -> String {
    match backend {
        DatabaseBackend::MySql => format!("`{}`", ident.replace('`', "``")),
        _ => format!("\"{}\"", ident.replace('"', "\"\"")),
    }
}
