mod common;

use std::sync::Arc;

use nflscope::aggregator::StatsAggregator;
use nflscope::errors::EngineError;
use nflscope::profile::ProfileSnapshot;
use nflscope::provider::TrackingKind;
use nflscope::season_stats::{GameContext, StatFamily};

use common::{MemoryProvider, josh_allen_qb, weekly_row};

fn sample_weekly() -> Vec<nflscope::provider::RawRow> {
    vec![
        weekly_row(
            "00-0034857",
            "Josh Allen",
            2020,
            1,
            "REG",
            &[("passing_yards", 312.0), ("passing_tds", 2.0), ("attempts", 35.0)],
        ),
        weekly_row(
            "00-0034857",
            "Josh Allen",
            2020,
            2,
            "REG",
            &[("passing_yards", 288.0), ("passing_tds", 4.0), ("attempts", 33.0)],
        ),
        weekly_row(
            "00-0034857",
            "Josh Allen",
            2020,
            19,
            "POST",
            &[("passing_yards", 206.0), ("attempts", 30.0)],
        ),
        weekly_row(
            "00-0034857",
            "Josh Allen",
            2021,
            1,
            "REG",
            &[("passing_yards", 270.0), ("passing_tds", 1.0), ("attempts", 32.0)],
        ),
        // Another player's rows must never leak into the aggregates.
        weekly_row(
            "00-0099999",
            "Someone Else",
            2020,
            1,
            "REG",
            &[("passing_yards", 999.0)],
        ),
    ]
}

fn aggregator_with(provider: Arc<MemoryProvider>) -> StatsAggregator {
    let profile = ProfileSnapshot::from_row(&josh_allen_qb()).unwrap();
    StatsAggregator::new(provider, profile)
}

fn sample_provider() -> Arc<MemoryProvider> {
    Arc::new(MemoryProvider::new(vec![josh_allen_qb()], Vec::new()).with_weekly(sample_weekly()))
}

#[test]
fn out_of_range_seasons_fail_all_or_nothing() {
    let provider = sample_provider();
    let mut stats = aggregator_with(provider.clone());

    match stats.fetch_seasons(&[1990, 1999, 2000], StatFamily::Basic) {
        Err(EngineError::SeasonNotAvailable {
            invalid, earliest, ..
        }) => {
            assert_eq!(invalid, vec![1990]);
            assert_eq!(earliest, 1999);
        }
        other => panic!("expected season validation failure, got {other:?}"),
    }
    // The failed call must not have touched the provider.
    assert_eq!(provider.stats_calls(), 0);
}

#[test]
fn tracking_range_starts_later_than_basic() {
    let provider = sample_provider();
    let mut stats = aggregator_with(provider.clone());

    match stats.fetch_seasons(&[2015, 2016], StatFamily::Tracking(TrackingKind::Passing)) {
        Err(EngineError::SeasonNotAvailable {
            invalid, earliest, ..
        }) => {
            assert_eq!(invalid, vec![2015]);
            assert_eq!(earliest, 2016);
        }
        other => panic!("expected season validation failure, got {other:?}"),
    }
}

#[test]
fn fetch_aggregates_weekly_rows_per_season_and_context() {
    let provider = sample_provider();
    let mut stats = aggregator_with(provider);

    let records = stats.fetch_seasons(&[2020, 2021], StatFamily::Basic).unwrap();
    assert_eq!(records.len(), 3);

    let reg_2020 = records
        .iter()
        .find(|r| r.season == 2020 && r.context == GameContext::RegularSeason)
        .unwrap();
    assert_eq!(reg_2020.games_played, 2);
    assert_eq!(reg_2020.value("passing_yards"), Some(600.0));
    assert_eq!(reg_2020.value("passing_tds"), Some(6.0));

    let post_2020 = records
        .iter()
        .find(|r| r.season == 2020 && r.context == GameContext::Postseason)
        .unwrap();
    assert_eq!(post_2020.value("passing_yards"), Some(206.0));
    // The postseason week had no TD cell: null, not zero.
    assert_eq!(post_2020.value("passing_tds"), None);
}

#[test]
fn identical_calls_hit_the_cache() {
    let provider = sample_provider();
    let mut stats = aggregator_with(provider.clone());

    let first = stats.fetch_seasons(&[2020], StatFamily::Basic).unwrap();
    let second = stats.fetch_seasons(&[2020], StatFamily::Basic).unwrap();
    assert_eq!(first, second);
    assert_eq!(provider.stats_calls(), 1);

    // Season sets are keys, not sequences: order must not matter.
    stats.fetch_seasons(&[2021, 2020], StatFamily::Basic).unwrap();
    stats.fetch_seasons(&[2020, 2021], StatFamily::Basic).unwrap();
    assert_eq!(provider.stats_calls(), 2);
}

#[test]
fn refresh_replaces_the_cached_entry_wholesale() {
    let provider = sample_provider();
    let mut stats = aggregator_with(provider.clone());

    let before = stats.fetch_seasons(&[2021], StatFamily::Basic).unwrap();
    assert_eq!(before[0].value("passing_yards"), Some(270.0));

    provider.replace_weekly(vec![weekly_row(
        "00-0034857",
        "Josh Allen",
        2021,
        1,
        "REG",
        &[("passing_yards", 305.0)],
    )]);

    // A plain fetch keeps serving the cached aggregate.
    let cached = stats.fetch_seasons(&[2021], StatFamily::Basic).unwrap();
    assert_eq!(cached[0].value("passing_yards"), Some(270.0));

    let refreshed = stats.refresh_seasons(&[2021], StatFamily::Basic).unwrap();
    assert_eq!(refreshed[0].value("passing_yards"), Some(305.0));
    assert_eq!(provider.stats_calls(), 2);

    // And the replacement is what later fetches see.
    let after = stats.fetch_seasons(&[2021], StatFamily::Basic).unwrap();
    assert_eq!(after[0].value("passing_yards"), Some(305.0));
    assert_eq!(provider.stats_calls(), 2);
}

#[test]
fn failed_loads_never_poison_the_cache() {
    let provider = sample_provider();
    let mut stats = aggregator_with(provider.clone());

    let good = stats.fetch_seasons(&[2020], StatFamily::Basic).unwrap();

    provider.set_fail_stats(true);
    assert!(matches!(
        stats.refresh_seasons(&[2020], StatFamily::Basic),
        Err(EngineError::Provider(_))
    ));
    assert!(matches!(
        stats.fetch_seasons(&[2021], StatFamily::Basic),
        Err(EngineError::Provider(_))
    ));

    // The good entry is still served, without another provider call.
    provider.set_fail_stats(false);
    let calls_before = provider.stats_calls();
    let still_cached = stats.fetch_seasons(&[2020], StatFamily::Basic).unwrap();
    assert_eq!(still_cached, good);
    assert_eq!(provider.stats_calls(), calls_before);
}

#[test]
fn tracking_rows_match_by_display_name() {
    let provider = Arc::new(
        MemoryProvider::new(vec![josh_allen_qb()], Vec::new()).with_tracking(vec![
            common::tracking_row("Josh Allen", 2021, 1, &[("avg_time_to_throw", 2.9), ("attempts", 34.0)]),
            common::tracking_row("Josh Allen", 2021, 2, &[("avg_time_to_throw", 3.1), ("attempts", 30.0)]),
            common::tracking_row("Different Player", 2021, 1, &[("avg_time_to_throw", 2.1)]),
        ]),
    );
    let mut stats = aggregator_with(provider);

    let records = stats
        .fetch_seasons(&[2021], StatFamily::Tracking(TrackingKind::Passing))
        .unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].games_played, 2);
    assert_eq!(records[0].value("attempts"), Some(64.0));
    let avg = records[0].value("avg_time_to_throw").unwrap();
    assert!((avg - 3.0).abs() < 1e-9);
}
