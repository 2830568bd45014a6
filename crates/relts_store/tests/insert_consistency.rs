use relts_store::{
    DictionaryApi, InsertValueInput, LatestQuery, RangeQuery, TimeSeries, TimeSeriesStore,
    TsConfig, TsError, TsResult, UpsertLocationInput, UpsertParameterInput, ValueQueryApi,
    ValueSchema, ValueWriteApi,
};
use tempfile::{tempdir, TempDir};

async fn failing_series(atomic_inserts: bool) -> TsResult<(TempDir, TimeSeries)> {
    let dir = tempdir().expect("tempdir");
    let base = dir.path();
    let mut config = TsConfig::default_sqlite(base.join("ts.sqlite").to_string_lossy());
    config.atomic_inserts = Some(atomic_inserts);
    config.failpoints = Some(vec!["insert.after_fact".to_string()]);
    let store = TimeSeriesStore::connect(&config, base).await?;
    let series = store
        .provision_series("weather", ValueSchema::default(), false)
        .await?;
    series.upsert_location(UpsertLocationInput::new("here")).await?;
    series.upsert_parameter(UpsertParameterInput::new("aaa")).await?;
    Ok((dir, series))
}

#[tokio::test]
async fn crash_between_statements_leaves_latest_behind() -> TsResult<()> {
    let (_dir, series) = failing_series(false).await?;

    let err = series
        .insert_value(InsertValueInput::new("here", "aaa", 100, 1.0))
        .await
        .unwrap_err();
    assert!(matches!(err, TsError::Storage { .. }));

    assert_eq!(series.range(RangeQuery::default()).await?.len(), 1);
    assert!(series.latest(LatestQuery::default()).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn atomic_inserts_roll_back_the_fact() -> TsResult<()> {
    let (_dir, series) = failing_series(true).await?;

    let err = series
        .insert_value(InsertValueInput::new("here", "aaa", 100, 1.0))
        .await
        .unwrap_err();
    assert!(matches!(err, TsError::Storage { ref operation, .. } if operation == "insert.after_fact"));

    assert!(series.range(RangeQuery::default()).await?.is_empty());
    assert!(series.latest(LatestQuery::default()).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn atomic_inserts_write_both_tables() -> TsResult<()> {
    let dir = tempdir().expect("tempdir");
    let base = dir.path();
    let mut config = TsConfig::default_sqlite(base.join("ts.sqlite").to_string_lossy());
    config.atomic_inserts = Some(true);
    let store = TimeSeriesStore::connect(&config, base).await?;
    let series = store
        .provision_series("weather", ValueSchema::default(), false)
        .await?;
    series.upsert_location(UpsertLocationInput::new("here")).await?;
    series.upsert_parameter(UpsertParameterInput::new("aaa")).await?;

    series
        .insert_value(InsertValueInput::new("here", "aaa", 200, 2.0))
        .await?;
    series
        .insert_value(InsertValueInput::new("here", "aaa", 100, 1.0))
        .await?;
    assert_eq!(series.range(RangeQuery::default()).await?.len(), 2);
    let latest = series.latest(LatestQuery::default()).await?;
    assert_eq!(latest.len(), 1);
    assert_eq!(latest[0].timestamp, 200);
    Ok(())
}
