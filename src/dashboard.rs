//! Dashboard aggregation over reservations, commissions and quotations.
//!
//! Plain grouping and summing over rows already fetched for one year.

use std::collections::HashMap;

use chrono::{DateTime, Datelike, TimeZone, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::models::ActivityEvent;

/// Totals for one calendar month
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyPoint {
    /// 1 = January
    pub month: u32,
    pub count: u64,
    #[serde(with = "rust_decimal::serde::str")]
    pub amount_uf: Decimal,
}

/// One row of a top-N ranking
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankingEntry {
    pub name: String,
    pub count: u64,
    #[serde(with = "rust_decimal::serde::str")]
    pub amount_uf: Decimal,
}

/// Monthly series plus yearly totals for one activity kind
#[derive(Debug, Clone, Serialize)]
pub struct SeriesSummary {
    pub monthly: Vec<MonthlyPoint>,
    pub total_count: u64,
    #[serde(with = "rust_decimal::serde::str")]
    pub total_uf: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardSummary {
    pub year: i32,
    pub reservations: SeriesSummary,
    pub commissions: SeriesSummary,
    pub quotations: SeriesSummary,
    /// Brokers by reserved UF
    pub top_brokers: Vec<RankingEntry>,
    /// Projects by reserved UF
    pub top_projects: Vec<RankingEntry>,
    /// Brokers by commission paid
    pub top_commissions: Vec<RankingEntry>,
}

/// `[Jan 1, Jan 1 of next year)` in UTC, or `None` for an out-of-range year.
pub fn year_bounds(year: i32) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let from = Utc.with_ymd_and_hms(year, 1, 1, 0, 0, 0).single()?;
    let to = Utc.with_ymd_and_hms(year.checked_add(1)?, 1, 1, 0, 0, 0).single()?;
    Some((from, to))
}

/// Twelve monthly buckets for `year`; events from other years are ignored.
pub fn monthly_series(events: &[ActivityEvent], year: i32) -> Vec<MonthlyPoint> {
    let mut series: Vec<MonthlyPoint> = (1..=12)
        .map(|month| MonthlyPoint {
            month,
            count: 0,
            amount_uf: Decimal::ZERO,
        })
        .collect();

    for event in events.iter().filter(|e| e.occurred_at.year() == year) {
        let point = &mut series[event.occurred_at.month0() as usize];
        point.count += 1;
        point.amount_uf += event.amount_uf;
    }

    series
}

/// Group by `key`, sum amounts, keep the `limit` largest.
///
/// Ordered by amount, then count, then name so ties are stable.
pub fn rank_by<F>(events: &[ActivityEvent], key: F, limit: usize) -> Vec<RankingEntry>
where
    F: Fn(&ActivityEvent) -> &str,
{
    let mut groups: HashMap<&str, (u64, Decimal)> = HashMap::new();
    for event in events {
        let entry = groups.entry(key(event)).or_insert((0, Decimal::ZERO));
        entry.0 += 1;
        entry.1 += event.amount_uf;
    }

    let mut ranking: Vec<RankingEntry> = groups
        .into_iter()
        .map(|(name, (count, amount_uf))| RankingEntry {
            name: name.to_string(),
            count,
            amount_uf,
        })
        .collect();

    ranking.sort_by(|a, b| {
        b.amount_uf
            .cmp(&a.amount_uf)
            .then(b.count.cmp(&a.count))
            .then_with(|| a.name.cmp(&b.name))
    });
    ranking.truncate(limit);
    ranking
}

fn series_summary(events: &[ActivityEvent], year: i32) -> SeriesSummary {
    let monthly = monthly_series(events, year);
    SeriesSummary {
        total_count: monthly.iter().map(|p| p.count).sum(),
        total_uf: monthly.iter().map(|p| p.amount_uf).sum(),
        monthly,
    }
}

/// Build the whole dashboard for a year.
pub fn summarize(
    year: i32,
    reservations: &[ActivityEvent],
    commissions: &[ActivityEvent],
    quotations: &[ActivityEvent],
    limit: usize,
) -> DashboardSummary {
    DashboardSummary {
        year,
        reservations: series_summary(reservations, year),
        commissions: series_summary(commissions, year),
        quotations: series_summary(quotations, year),
        top_brokers: rank_by(reservations, |e| e.broker.as_str(), limit),
        top_projects: rank_by(reservations, |e| e.project.as_str(), limit),
        top_commissions: rank_by(commissions, |e| e.broker.as_str(), limit),
    }
}
