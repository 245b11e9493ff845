use super::*;
use crate::sim::{AuthorizationOutcome, ScriptedHealthStore};
use chrono::{Duration, FixedOffset, Timelike};

fn source(store: &Arc<ScriptedHealthStore>) -> HeartRateSource {
    HeartRateSource::new(Arc::clone(store) as Arc<dyn HealthStore>)
}

// ============================================================================
// average_bpm
// ============================================================================

#[test]
fn test_average_of_samples() {
    let now = Utc::now();
    let samples = [
        HeartRateSample::new(60.0, now),
        HeartRateSample::new(70.0, now),
        HeartRateSample::new(80.0, now),
    ];
    let avg = average_bpm(&samples).unwrap();
    assert!((avg - 70.0).abs() < f64::EPSILON);
}

#[test]
fn test_average_of_empty_set_is_none() {
    assert_eq!(average_bpm(&[]), None);
}

// ============================================================================
// start_of_day
// ============================================================================

#[test]
fn test_start_of_day_utc() {
    let now = Utc.with_ymd_and_hms(2024, 3, 9, 17, 42, 11).unwrap();
    let start = start_of_day(&now);
    assert_eq!(start, Utc.with_ymd_and_hms(2024, 3, 9, 0, 0, 0).unwrap());
}

#[test]
fn test_start_of_day_keeps_offset() {
    let tz = FixedOffset::east_opt(9 * 3600).unwrap();
    let now = tz.with_ymd_and_hms(2024, 3, 9, 1, 30, 0).unwrap();
    let start = start_of_day(&now);
    assert_eq!(start.hour(), 0);
    assert_eq!(start.date_naive(), now.date_naive());
    // 2024-03-08 15:00 UTC
    assert_eq!(
        start.with_timezone(&Utc),
        Utc.with_ymd_and_hms(2024, 3, 8, 15, 0, 0).unwrap()
    );
}

// ============================================================================
// HeartRateSource
// ============================================================================

#[tokio::test]
async fn test_fetch_average_of_today() {
    let store = Arc::new(ScriptedHealthStore::new(vec![vec![60.0, 64.0, 68.0]]));
    let avg = source(&store).fetch_average().await.unwrap();
    assert!((avg - 64.0).abs() < 1e-9);
}

#[tokio::test]
async fn test_empty_sample_set_is_no_data() {
    let store = Arc::new(ScriptedHealthStore::new(vec![vec![]]));
    let hr = source(&store);

    assert_eq!(hr.fetch_average().await, Err(HeartRateError::EmptySampleSet));
    assert_eq!(hr.fetch_reading().await, None);
}

#[tokio::test]
async fn test_denied_authorization_is_no_data() {
    let store = Arc::new(
        ScriptedHealthStore::new(vec![vec![70.0]]).with_authorization(AuthorizationOutcome::Denied),
    );
    let hr = source(&store);

    assert_eq!(hr.fetch_average().await, Err(HeartRateError::AuthorizationDenied));
    assert_eq!(hr.fetch_reading().await, None);
    assert_eq!(hr.authorization(), Some(false));
    assert_eq!(store.queries(), 0);
}

#[tokio::test]
async fn test_authorization_error_is_cached_as_denied() {
    let store = Arc::new(
        ScriptedHealthStore::new(vec![vec![70.0]]).with_authorization(AuthorizationOutcome::Error),
    );
    let hr = source(&store);

    assert_eq!(hr.fetch_reading().await, None);
    assert_eq!(hr.fetch_reading().await, None);
    assert_eq!(store.authorization_requests(), 1);
    assert_eq!(hr.authorization(), Some(false));
}

#[tokio::test]
async fn test_authorization_requested_once() {
    let store = Arc::new(ScriptedHealthStore::new(vec![vec![70.0]]));
    let hr = source(&store);
    assert_eq!(hr.authorization(), None);

    for _ in 0..5 {
        assert!(hr.fetch_reading().await.is_some());
    }
    assert_eq!(store.authorization_requests(), 1);
    assert_eq!(store.queries(), 5);
    assert_eq!(hr.authorization(), Some(true));
}

#[tokio::test]
async fn test_concurrent_fetches_share_authorization() {
    let store = Arc::new(ScriptedHealthStore::new(vec![vec![70.0]]));
    let hr = Arc::new(source(&store));

    let a = tokio::spawn({
        let hr = Arc::clone(&hr);
        async move { hr.fetch_reading().await }
    });
    let b = tokio::spawn({
        let hr = Arc::clone(&hr);
        async move { hr.fetch_reading().await }
    });

    assert!(a.await.unwrap().is_some());
    assert!(b.await.unwrap().is_some());
    assert_eq!(store.authorization_requests(), 1);
}

#[tokio::test]
async fn test_samples_before_range_are_excluded() {
    let now = Utc::now();
    let store = Arc::new(
        ScriptedHealthStore::new(vec![vec![60.0]])
            .with_history(vec![HeartRateSample::new(180.0, now - Duration::days(2))]),
    );
    let avg = source(&store)
        .query_average_heart_rate(now - Duration::hours(1), now)
        .await
        .unwrap();
    assert!((avg - 60.0).abs() < f64::EPSILON);
}

#[tokio::test]
async fn test_query_error_is_no_data() {
    let store = Arc::new(ScriptedHealthStore::new(vec![vec![70.0]]));
    store.fail_queries("store locked");
    let hr = source(&store);

    assert_eq!(
        hr.fetch_average().await,
        Err(HeartRateError::Query(String::from("store locked")))
    );
    assert_eq!(hr.fetch_reading().await, None);
}
