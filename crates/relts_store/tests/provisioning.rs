use relts_store::{
    sanitize_series_name, DictionaryApi, InsertValueInput, LatestQuery, RangeQuery, Scalar,
    TimeSeriesStore, TsError, TsResult, UpsertLocationInput, UpsertParameterInput,
    ValueKind, ValueQueryApi, ValueRow, ValueSchema, ValueWriteApi,
};
use sea_orm::{ConnectionTrait, DatabaseBackend, Statement};
use tempfile::tempdir;

#[tokio::test]
async fn provisioned_series_can_be_reopened() -> TsResult<()> {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("ts.sqlite");
    {
        let store = TimeSeriesStore::connect_sqlite(&path).await?;
        let series = store
            .provision_series("Test of a time-series, name cleaned up! 123", ValueSchema::default(), false)
            .await?;
        assert_eq!(series.name(), "Testofatime-seriesnamecleanedup123");
        series.upsert_location(UpsertLocationInput::new("here")).await?;
        series.upsert_parameter(UpsertParameterInput::new("aaa")).await?;
        series
            .insert_value(InsertValueInput::new("here", "aaa", 10, 1.5))
            .await?;
    }

    let store = TimeSeriesStore::connect_sqlite(&path).await?;
    let listed = store.list_series().await?;
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].name, "Testofatime-seriesnamecleanedup123");
    assert_eq!(listed[0].schema.kind, ValueKind::Float);

    let series = store
        .open_series("Testofatime-seriesnamecleanedup123")
        .await?;
    assert_eq!(
        series.latest(LatestQuery::default()).await?,
        vec![ValueRow::new(10, "here", "aaa", 1.5)]
    );
    Ok(())
}

#[tokio::test]
async fn opening_an_unregistered_series_fails() -> TsResult<()> {
    let dir = tempdir().expect("tempdir");
    let store = TimeSeriesStore::connect_sqlite(&dir.path().join("ts.sqlite")).await?;
    let err = store.open_series("missing").await.err().expect("error");
    assert!(matches!(err, TsError::UnknownSeries { ref name } if name == "missing"));
    assert!(sanitize_series_name("!!!").is_err());
    Ok(())
}

#[tokio::test]
async fn provisioning_twice_is_idempotent_but_kind_is_fixed() -> TsResult<()> {
    let dir = tempdir().expect("tempdir");
    let store = TimeSeriesStore::connect_sqlite(&dir.path().join("ts.sqlite")).await?;
    let series = store
        .provision_series("weather", ValueSchema::default(), true)
        .await?;
    series.upsert_location(UpsertLocationInput::new("here")).await?;

    let again = store
        .provision_series("weather", ValueSchema::default(), true)
        .await?;
    assert!(again.locations().await?.contains("here"));

    let err = store
        .provision_series("weather", ValueSchema::new(ValueKind::Text), false)
        .await
        .err()
        .expect("error");
    assert!(matches!(err, TsError::Validation { .. }));
    assert_eq!(store.list_series().await?.len(), 1);
    Ok(())
}

#[tokio::test]
async fn info_view_joins_names() -> TsResult<()> {
    let dir = tempdir().expect("tempdir");
    let store = TimeSeriesStore::connect_sqlite(&dir.path().join("ts.sqlite")).await?;
    let series = store
        .provision_series("weather", ValueSchema::default(), true)
        .await?;
    series.upsert_location(UpsertLocationInput::new("here")).await?;
    series.upsert_parameter(UpsertParameterInput::new("aaa")).await?;
    series
        .insert_value(InsertValueInput::new("here", "aaa", 1, 0.5))
        .await?;
    series
        .insert_value(InsertValueInput::new("here", "aaa", 2, 0.75))
        .await?;

    let rows = store
        .connection()
        .query_all(Statement::from_string(
            DatabaseBackend::Sqlite,
            "SELECT timestamp, loc, par, val FROM relts_weather_view",
        ))
        .await?;
    assert_eq!(rows.len(), 2);
    let newest: i64 = rows[0].try_get("", "timestamp")?;
    let location: String = rows[0].try_get("", "loc")?;
    assert_eq!(newest, 2);
    assert_eq!(location, "here");
    Ok(())
}

#[tokio::test]
async fn dropping_removes_tables_and_registration() -> TsResult<()> {
    let dir = tempdir().expect("tempdir");
    let store = TimeSeriesStore::connect_sqlite(&dir.path().join("ts.sqlite")).await?;
    let series = store
        .provision_series("weather", ValueSchema::default(), true)
        .await?;
    series.upsert_location(UpsertLocationInput::new("here")).await?;
    series.drop_tables().await?;

    assert!(store.list_series().await?.is_empty());
    assert!(matches!(
        store.open_series("weather").await.err(),
        Some(TsError::UnknownSeries { .. })
    ));
    let tables = store
        .connection()
        .query_all(Statement::from_string(
            DatabaseBackend::Sqlite,
            "SELECT name FROM sqlite_master WHERE name LIKE 'relts_weather_%'",
        ))
        .await?;
    assert!(tables.is_empty());

    let fresh = store
        .provision_series("weather", ValueSchema::default(), false)
        .await?;
    assert!(fresh.locations().await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn integer_and_text_series_keep_their_kind() -> TsResult<()> {
    let dir = tempdir().expect("tempdir");
    let store = TimeSeriesStore::connect_sqlite(&dir.path().join("ts.sqlite")).await?;

    let counts = store
        .provision_series("counts", ValueSchema::new(ValueKind::Integer), false)
        .await?;
    counts.upsert_location(UpsertLocationInput::new("gate")).await?;
    counts.upsert_parameter(UpsertParameterInput::new("visitors")).await?;
    counts
        .insert_value(InsertValueInput::new("gate", "visitors", 5, 42))
        .await?;
    let err = counts
        .insert_value(InsertValueInput::new("gate", "visitors", 6, 4.2))
        .await
        .unwrap_err();
    assert!(matches!(err, TsError::Validation { .. }));
    let rows = counts.range(RangeQuery::default()).await?;
    assert_eq!(rows[0].value, Scalar::Integer(42));

    let notes = store
        .provision_series(
            "notes",
            ValueSchema::with_sql_type(ValueKind::Text, "VARCHAR(64)"),
            false,
        )
        .await?;
    notes.upsert_location(UpsertLocationInput::new("desk")).await?;
    notes.upsert_parameter(UpsertParameterInput::new("memo")).await?;
    notes
        .insert_value(InsertValueInput::new("desk", "memo", 1, "first"))
        .await?;
    notes
        .insert_value(InsertValueInput::new("desk", "memo", 2, "second"))
        .await?;
    let latest = notes.latest(LatestQuery::default()).await?;
    assert_eq!(latest, vec![ValueRow::new(2, "desk", "memo", "second")]);
    assert_eq!(
        notes.value_schema().sql_type.as_deref(),
        Some("VARCHAR(64)")
    );
    Ok(())
}
