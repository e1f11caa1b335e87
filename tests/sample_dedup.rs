//! Writer and query behaviour against a real Postgres database.

mod helpers;

use chrono::NaiveTime;
use crowdpulse::data::samples::{count_by_zone, list_by_time_of_day, list_by_zone};
use crowdpulse::data::store::PgSampleStore;
use crowdpulse::ingest::writer::{SampleWriter, WriteError};
use crowdpulse::zones::{self, Zone};
use helpers::{at, make_sample};
use sqlx::PgPool;
use std::sync::Arc;

fn gangnam() -> &'static Zone {
    zones::by_code("POI014").unwrap()
}

fn writer(pool: &PgPool) -> SampleWriter {
    SampleWriter::new(Arc::new(PgSampleStore::new(pool.clone())))
}

#[sqlx::test]
async fn test_rewriting_same_batch_inserts_nothing(pool: PgPool) {
    let writer = writer(&pool);
    let batch = vec![
        make_sample("POI014", at(12, 0)),
        make_sample("POI014", at(12, 5)),
    ];

    let first = writer.write(gangnam(), &batch).await.unwrap();
    assert_eq!((first.inserted, first.skipped), (2, 0));

    let second = writer.write(gangnam(), &batch).await.unwrap();
    assert_eq!((second.inserted, second.skipped), (0, 2));
    assert_eq!(count_by_zone(&pool, "POI014").await.unwrap(), 2);
}

#[sqlx::test]
async fn test_existing_row_is_never_overwritten(pool: PgPool) {
    let writer = writer(&pool);
    writer
        .write(gangnam(), &[make_sample("POI014", at(9, 0))])
        .await
        .unwrap();

    let mut revised = make_sample("POI014", at(9, 0));
    revised.congestion_level = "붐빔".to_owned();
    revised.max_population = Some(9000);
    let counts = writer.write(gangnam(), &[revised]).await.unwrap();
    assert_eq!(counts.skipped, 1);

    let rows = list_by_zone(&pool, "POI014", 10, 0).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].congestion_level, "보통");
    assert_eq!(rows[0].max_population, Some(3500));
}

#[sqlx::test]
async fn test_duplicate_within_batch_counts_as_skip(pool: PgPool) {
    let batch = vec![
        make_sample("POI014", at(10, 0)),
        make_sample("POI014", at(10, 0)),
    ];
    let counts = writer(&pool).write(gangnam(), &batch).await.unwrap();
    assert_eq!((counts.inserted, counts.skipped), (1, 1));
}

#[sqlx::test]
async fn test_failed_sample_rolls_back_whole_batch(pool: PgPool) {
    let mut oversized = make_sample("POI014", at(11, 5));
    oversized.congestion_level = "x".repeat(64);
    let batch = vec![make_sample("POI014", at(11, 0)), oversized];

    let err = writer(&pool).write(gangnam(), &batch).await.unwrap_err();
    assert!(matches!(err, WriteError::Sample { .. }));
    assert_eq!(count_by_zone(&pool, "POI014").await.unwrap(), 0);
}

#[sqlx::test]
async fn test_time_of_day_window_wraps_midnight(pool: PgPool) {
    let batch = vec![
        make_sample("POI014", at(23, 30)),
        make_sample("POI014", at(0, 15)),
        make_sample("POI014", at(12, 0)),
    ];
    writer(&pool).write(gangnam(), &batch).await.unwrap();

    let t = |h, m| NaiveTime::from_hms_opt(h, m, 0).unwrap();
    let rows = list_by_time_of_day(&pool, "POI014", t(23, 0), t(1, 0), 50)
        .await
        .unwrap();
    let mut minutes: Vec<_> = rows.iter().map(|r| r.timestamp.time()).collect();
    minutes.sort();
    assert_eq!(minutes, vec![t(0, 15), t(23, 30)]);
}

#[sqlx::test]
async fn test_list_by_zone_is_newest_first_and_paged(pool: PgPool) {
    let batch: Vec<_> = (0..5)
        .map(|i| make_sample("POI014", at(8, i * 5)))
        .collect();
    writer(&pool).write(gangnam(), &batch).await.unwrap();

    let page = list_by_zone(&pool, "POI014", 2, 1).await.unwrap();
    let stamps: Vec<_> = page.iter().map(|r| r.timestamp).collect();
    assert_eq!(stamps, vec![at(8, 15), at(8, 10)]);
}
