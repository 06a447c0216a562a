//! End-to-end flow: feed decoding, ingestion, scoring, tranching, matching
//! and JSON-lines reporting through one engine.

use std::io::BufRead;

use chrono::{DateTime, Duration, Utc};
use fry_engine::adapter::inbound::feed;
use fry_engine::adapter::outbound::JsonLinesSink;
use fry_engine::application::engine::FryEngine;
use fry_engine::domain::{LossRecord, PoolKind, Rating, Segment, TrancheStatus};
use fry_engine::port::ReportSink;
use fry_engine::testkit::config;
use fry_engine::testkit::domain::{loss_record_at, record_at};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

mod support;

use support::feed::{line, mixed_lines};

/// Engine whose score starts at `initial` and moves by `alpha` per cycle.
fn engine(initial: f64, alpha: f64) -> FryEngine {
    let mut config = config::config();
    config.scoring.initial_score = initial;
    config.scoring.smoothing_alpha = alpha;
    config.validate().expect("valid test config");
    config.build_engine().expect("engine")
}

fn mixed_records(now: DateTime<Utc>) -> Vec<LossRecord> {
    vec![
        record_at("alice", dec!(1000), now),
        record_at("bob", dec!(20000), now),
        loss_record_at("carol", dec!(9000), dec!(25), true, now),
    ]
}

#[test]
fn feed_to_matches_in_a_calm_market() {
    let now = Utc::now();
    let batch = feed::parse_feed(&mixed_lines(now).join("\n")).expect("feed");
    assert_eq!(batch.undecodable(), 0);

    let engine = engine(0.0, 0.3);
    let summary = engine.ingest_entries(batch.entries);
    assert_eq!(summary.events_processed, 3);
    assert_eq!(summary.events_rejected, 0);
    assert_eq!(summary.total_loss, dec!(30000));
    assert_eq!(summary.total_minted, dec!(243500));

    let report = engine.cycle(now);
    assert_eq!(report.score.sample_size, 3);
    assert!(report.score.score.score <= 30.0);
    assert_eq!(report.knocked_out, 0);

    let notional = |rating: Rating| {
        report
            .tranches
            .iter()
            .find(|t| t.rating() == rating)
            .map(|t| t.notional())
    };
    assert_eq!(notional(Rating::Aaa), Some(dec!(600)));
    assert_eq!(notional(Rating::Aa), Some(dec!(400)));
    assert_eq!(notional(Rating::A), None, "empty mezzanine yields no tranche");
    assert_eq!(notional(Rating::Bb), Some(dec!(40000)));
    assert_eq!(notional(Rating::B), Some(dec!(101250)));
    assert_eq!(notional(Rating::Ccc), Some(dec!(101250)));
    assert!(report.total_notional() <= report.total_minted);

    // Only the high-appetite buyer clears the threshold, and only on the
    // risky tranches large enough for its minimum ticket.
    let matched: Vec<(Rating, &str)> = report
        .matches
        .iter()
        .map(|m| (m.rating, m.buyer_id.as_str()))
        .collect();
    assert_eq!(
        matched,
        vec![
            (Rating::Bb, "volterra-capital"),
            (Rating::B, "volterra-capital"),
            (Rating::Ccc, "volterra-capital"),
        ]
    );
    assert!(report.matches.iter().all(|m| m.fit_score > 50));
    for tranche in &report.tranches {
        let expected = if matches!(tranche.segment(), Segment::Senior) {
            TrancheStatus::Available
        } else {
            TrancheStatus::Matched
        };
        assert_eq!(tranche.status(), expected, "{}", tranche.rating());
    }
}

#[test]
fn stressed_market_knocks_out_before_matching() {
    let now = Utc::now();
    let engine = engine(100.0, 0.01);
    engine.ingest(mixed_records(now));

    let report = engine.cycle(now);
    assert!(report.score.score.score > 95.0);
    assert_eq!(report.knocked_out, 3);
    assert!(report.matches.is_empty());

    for tranche in &report.tranches {
        match tranche.knockout_score() {
            Some(_) => assert_eq!(tranche.status(), TrancheStatus::KnockedOut),
            None => assert_eq!(tranche.status(), TrancheStatus::Available),
        }
    }
}

#[test]
fn coupons_rise_with_the_score() {
    let now = Utc::now();
    let calm = engine(0.0, 0.3);
    let stressed = engine(100.0, 0.01);
    calm.ingest(mixed_records(now));
    stressed.ingest(mixed_records(now));

    let calm_report = calm.cycle(now);
    let stressed_report = stressed.cycle(now);
    let coupon = |report: &fry_engine::domain::CycleReport| {
        report
            .tranches
            .iter()
            .find(|t| t.rating() == Rating::Aaa)
            .map(|t| t.coupon())
            .unwrap_or_default()
    };
    assert!(coupon(&calm_report) >= dec!(0.04));
    assert!(coupon(&stressed_report) > coupon(&calm_report));
}

#[test]
fn invalid_records_are_rejected_not_fatal() {
    let now = Utc::now();
    let engine = engine(0.0, 0.3);
    let mut records = mixed_records(now);
    records.push(LossRecord {
        trader_id: Some("dave".into()),
        loss_amount: Some(dec!(-5)),
        ..loss_record_at("dave", dec!(1), dec!(1), false, now)
    });
    records.push(LossRecord {
        liquidation: None,
        ..record_at("erin", dec!(10), now)
    });

    let summary = engine.ingest(records);
    assert_eq!(summary.events_processed, 3);
    assert_eq!(summary.events_rejected, 2);
    assert_eq!(
        summary.rejections.iter().map(|r| r.index).collect::<Vec<_>>(),
        vec![3, 4]
    );
    assert_eq!(engine.snapshot().unique_events().len(), 3);
}

#[test]
fn every_feed_entry_is_either_processed_or_rejected() {
    let now = Utc::now();
    let mut lines = mixed_lines(now);
    lines.push(r#"{"trader_id":"mallory","loss":"abc"}"#.to_string());
    lines.push("not json at all".to_string());
    lines.push(line("", 100, 1, false, now));
    let batch = feed::parse_feed(&lines.join("\n")).expect("feed");
    let entries = batch.len();
    assert_eq!(batch.undecodable(), 2);

    let engine = engine(0.0, 0.3);
    let summary = engine.ingest_entries(batch.entries);
    assert_eq!(summary.events_processed + summary.events_rejected, entries);
    assert_eq!(summary.events_rejected, 3);
    assert_eq!(
        summary.rejections.iter().map(|r| r.index).collect::<Vec<_>>(),
        vec![3, 4, 5]
    );
}

#[test]
fn oversized_losses_are_rejected_without_stopping_the_batch() {
    let now = Utc::now();
    let engine = engine(0.0, 0.3);
    let mut records = mixed_records(now);
    records.insert(
        0,
        loss_record_at("big", dec!(10000000000000000000000000000), dec!(15), true, now),
    );

    let summary = engine.ingest(records);
    assert_eq!(summary.events_processed, 3);
    assert_eq!(summary.events_rejected, 1);
    assert_eq!(summary.rejections[0].index, 0);
    assert_eq!(summary.total_minted, dec!(243500));
}

#[test]
fn pools_hide_trader_identities() {
    let now = Utc::now();
    let engine = engine(0.0, 0.3);
    engine.ingest(mixed_records(now));

    let snapshot = engine.snapshot();
    for event in snapshot.unique_events() {
        let pseudonym = event.trader().as_str();
        for name in ["alice", "bob", "carol"] {
            assert!(!pseudonym.contains(name));
        }
    }
    let liquidation = snapshot.pool(PoolKind::Liquidation).expect("liquidation pool");
    assert_eq!(liquidation.len(), 1);
    assert_eq!(liquidation.total_minted(), dec!(202500));
}

#[test]
fn salt_rotation_changes_future_pseudonyms_only() {
    let now = Utc::now();
    let engine = engine(0.0, 0.3);
    engine.ingest(vec![record_at("alice", dec!(100), now)]);
    engine.rotate_salt("rotated-salt").expect("rotate");
    engine.ingest(vec![record_at("alice", dec!(100), now)]);

    let snapshot = engine.snapshot();
    let events = snapshot.unique_events();
    assert_eq!(events.len(), 2);
    assert_ne!(events[0].trader(), events[1].trader());
    assert!(engine.rotate_salt("").is_err());
}

#[test]
fn old_losses_fall_out_of_the_window() {
    let now = Utc::now();
    let engine = engine(0.0, 0.3);
    engine.ingest(vec![record_at("old", dec!(5000), now - Duration::hours(3))]);

    let report = engine.cycle(now);
    assert_eq!(report.score.sample_size, 0);
    assert_eq!(report.score.score.raw, 0.0);
    // Pool value still backs tranches even when the window is quiet.
    assert!(report.total_notional() > Decimal::ZERO);
}

#[test]
fn cycles_are_reported_as_json_lines() {
    let now = Utc::now();
    let engine = engine(0.0, 0.3);
    let sink = JsonLinesSink::new(Vec::new());

    sink.record_ingestion(&engine.ingest(mixed_records(now)));
    sink.record_cycle(&engine.cycle(now));

    let bytes = sink.into_inner();
    let lines: Vec<serde_json::Value> = bytes
        .as_slice()
        .lines()
        .map(|line| serde_json::from_str(&line.expect("utf8 line")).expect("json line"))
        .collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["type"], "ingestion");
    assert_eq!(lines[0]["payload"]["events_processed"], 3);
    assert_eq!(lines[1]["type"], "cycle");
    assert_eq!(lines[1]["payload"]["matches"].as_array().map(Vec::len), Some(3));
    assert_eq!(lines[1]["payload"]["snapshot_version"], 1);
}

#[test]
fn prediction_follows_the_history() {
    let now = Utc::now();
    let engine = engine(0.0, 0.5);
    engine.ingest(mixed_records(now));
    for _ in 0..4 {
        engine.cycle(now);
    }

    let history = engine.history();
    assert_eq!(history.len(), 4);
    assert!(history.windows(2).all(|w| w[1].score >= w[0].score));
    let predicted = engine.predict(1);
    assert!((0.0..=100.0).contains(&predicted));
    assert!(predicted >= engine.current_score());
}
