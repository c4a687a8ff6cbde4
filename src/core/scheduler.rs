//! Recurring fetch-and-save driver.
//!
//! [`Scheduler::run`] performs one fetch at startup, then sleeps until the
//! next slot of its [`Schedule`] and fetches again, until the shutdown signal
//! flips. A failed scheduled cycle is logged and the loop carries on; the
//! next slot is the retry.

use crate::core::currency::CurrencyCode;
use crate::core::error::PipelineError;
use crate::core::pipeline::RatePipeline;
use chrono::{DateTime, Duration as ChronoDuration, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{info, warn};

/// Longest accepted `every_minutes` interval: one year.
pub const MAX_EVERY_MINUTES: u64 = 525_600;

/// When the recurring fetch runs.
///
/// Written in config as a map with exactly one key:
/// `daily_at: "HH:MM:SS"` or `every_minutes: N`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ScheduleRepr", into = "ScheduleRepr")]
pub enum Schedule {
    /// Once a day at this UTC time.
    DailyAt(NaiveTime),
    EveryMinutes(u64),
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct ScheduleRepr {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    daily_at: Option<NaiveTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    every_minutes: Option<u64>,
}

impl TryFrom<ScheduleRepr> for Schedule {
    type Error = String;

    fn try_from(repr: ScheduleRepr) -> Result<Self, Self::Error> {
        match (repr.daily_at, repr.every_minutes) {
            (Some(at), None) => Ok(Schedule::DailyAt(at)),
            (None, Some(minutes)) if (1..=MAX_EVERY_MINUTES).contains(&minutes) => {
                Ok(Schedule::EveryMinutes(minutes))
            }
            (None, Some(minutes)) => Err(format!(
                "every_minutes must be between 1 and {MAX_EVERY_MINUTES}, got {minutes}"
            )),
            _ => Err("schedule needs exactly one of daily_at or every_minutes".to_string()),
        }
    }
}

impl From<Schedule> for ScheduleRepr {
    fn from(schedule: Schedule) -> Self {
        match schedule {
            Schedule::DailyAt(at) => ScheduleRepr {
                daily_at: Some(at),
                ..Default::default()
            },
            Schedule::EveryMinutes(minutes) => ScheduleRepr {
                every_minutes: Some(minutes),
                ..Default::default()
            },
        }
    }
}

impl Default for Schedule {
    // 12:00 Moscow time.
    fn default() -> Self {
        Schedule::DailyAt(NaiveTime::from_hms_opt(9, 0, 0).unwrap_or_default())
    }
}

impl Schedule {
    /// First slot strictly after `now`. Intervals are clamped to
    /// `1..=MAX_EVERY_MINUTES`.
    pub fn next_after(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        match *self {
            Schedule::DailyAt(at) => {
                let today = now.date_naive().and_time(at).and_utc();
                if today > now {
                    today
                } else {
                    today
                        .checked_add_signed(ChronoDuration::days(1))
                        .unwrap_or(DateTime::<Utc>::MAX_UTC)
                }
            }
            Schedule::EveryMinutes(minutes) => {
                let step = ChronoDuration::minutes(minutes.clamp(1, MAX_EVERY_MINUTES) as i64);
                now.checked_add_signed(step)
                    .unwrap_or(DateTime::<Utc>::MAX_UTC)
            }
        }
    }
}

/// Sender half of the shared shutdown signal.
#[derive(Clone)]
pub struct Shutdown {
    tx: Arc<watch::Sender<bool>>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }

    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

async fn wait_for_shutdown(rx: &mut watch::Receiver<bool>) {
    // An error means every sender is gone, which also ends the loop.
    let _ = rx.wait_for(|stop| *stop).await;
}

pub struct Scheduler {
    pipeline: Arc<RatePipeline>,
    pivot: CurrencyCode,
    symbols: Vec<CurrencyCode>,
    schedule: Schedule,
}

impl Scheduler {
    pub fn new(
        pipeline: Arc<RatePipeline>,
        pivot: CurrencyCode,
        symbols: Vec<CurrencyCode>,
        schedule: Schedule,
    ) -> Self {
        Self {
            pipeline,
            pivot,
            symbols,
            schedule,
        }
    }

    /// Runs until `shutdown` is triggered. Only the startup fetch can fail the
    /// loop; an in-flight cycle is dropped on shutdown, which never leaves a
    /// partial batch behind: a started store commit always runs to completion.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) -> Result<usize, PipelineError> {
        let resp = tokio::select! {
            res = self.pipeline.fetch_and_save(self.pivot, &self.symbols) => res?,
            _ = wait_for_shutdown(&mut shutdown) => return Ok(0),
        };
        info!(base = %resp.base, date = %resp.date, "Startup fetch done");

        let mut cycles = 0;
        loop {
            let now = Utc::now();
            let next = self.schedule.next_after(now);
            let wait = (next - now).to_std().unwrap_or_default();
            info!(next = %next, "Next scheduled fetch");

            tokio::select! {
                _ = tokio::time::sleep(wait) => {}
                _ = wait_for_shutdown(&mut shutdown) => break,
            }

            tokio::select! {
                res = self.pipeline.fetch_and_save(self.pivot, &self.symbols) => {
                    cycles += 1;
                    match res {
                        Ok(resp) => info!(base = %resp.base, date = %resp.date, "Scheduled fetch done"),
                        Err(e) => warn!(error = %e, transient = e.is_transient(), "Scheduled fetch failed"),
                    }
                }
                _ = wait_for_shutdown(&mut shutdown) => break,
            }
        }

        info!(cycles, "Scheduler stopped");
        Ok(cycles)
    }
}
