//! Once-a-day trigger for [`RefreshController::daily_sync`].

use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, Local, TimeZone};

use crate::core::{InsiderError, PipelineConfig};
use crate::refresh::RefreshController;
use crate::store::TransactionStore;

/// Fires a daily sync at a fixed local hour.
///
/// A run that wakes more than `misfire_grace` after its slot (suspend, clock jump) is
/// skipped rather than run late.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailySchedule {
    hour: u32,
    misfire_grace: Duration,
}

impl DailySchedule {
    /// # Errors
    ///
    /// Returns [`InsiderError::InvalidParams`] if `hour` is not in `0..=23`.
    pub fn new(hour: u32, misfire_grace: Duration) -> Result<Self, InsiderError> {
        if hour > 23 {
            return Err(InsiderError::InvalidParams(format!(
                "sync hour must be 0-23, got {hour}"
            )));
        }
        Ok(Self {
            hour,
            misfire_grace,
        })
    }

    pub fn from_config(cfg: &PipelineConfig) -> Result<Self, InsiderError> {
        Self::new(cfg.daily_sync_hour, cfg.misfire_grace)
    }

    pub const fn hour(&self) -> u32 {
        self.hour
    }

    pub const fn misfire_grace(&self) -> Duration {
        self.misfire_grace
    }

    /// The first slot strictly after `now`, in `now`'s time zone.
    ///
    /// A slot that falls in a DST gap is skipped. `None` only past the end of the
    /// representable calendar.
    pub fn next_run_after<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> Option<DateTime<Tz>> {
        let tz = now.timezone();
        now.date_naive().iter_days().find_map(|day| {
            let slot = tz
                .from_local_datetime(&day.and_hms_opt(self.hour, 0, 0)?)
                .earliest()?;
            (slot > *now).then_some(slot)
        })
    }

    /// Whether a slot scheduled for `scheduled` may still run at `now`.
    pub fn should_fire<Tz: TimeZone>(&self, scheduled: &DateTime<Tz>, now: &DateTime<Tz>) -> bool {
        if now < scheduled {
            return false;
        }
        (now.clone() - scheduled.clone())
            .to_std()
            .is_ok_and(|late| late <= self.misfire_grace)
    }

    /// The most recent slot at or before `now`, if it is still inside the misfire grace.
    ///
    /// A scheduler starting at `now` runs this slot immediately: it was missed while the
    /// process was down.
    pub fn missed_slot<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> Option<DateTime<Tz>> {
        let tz = now.timezone();
        let today = now.date_naive();
        [Some(today), today.pred_opt()]
            .into_iter()
            .flatten()
            .find_map(|day| {
                let slot = tz
                    .from_local_datetime(&day.and_hms_opt(self.hour, 0, 0)?)
                    .earliest()?;
                (slot <= *now).then_some(slot)
            })
            .filter(|slot| self.should_fire(slot, now))
    }

    /// Run `controller.daily_sync()` every day until `shutdown` resolves.
    ///
    /// A slot missed shortly before startup runs first. A failed sync is logged and the loop
    /// waits for the next slot.
    pub async fn run<S, F>(
        &self,
        controller: RefreshController<S>,
        shutdown: F,
    ) -> Result<(), InsiderError>
    where
        S: TransactionStore + ?Sized,
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        let started = Local::now();
        if let Some(missed) = self.missed_slot(&started) {
            tracing::warn!(%missed, %started, "running daily sync missed during downtime");
            tokio::select! {
                () = &mut shutdown => {
                    tracing::info!("scheduler stopping");
                    return Ok(());
                }
                () = sync_once(&controller) => {}
            }
        }

        loop {
            let now = Local::now();
            let next = self
                .next_run_after(&now)
                .ok_or_else(|| InsiderError::Data("no next sync slot".into()))?;
            let wait = (next - now).to_std().unwrap_or_default();
            tracing::info!(%next, "next daily sync scheduled");

            tokio::select! {
                () = &mut shutdown => {
                    tracing::info!("scheduler stopping");
                    return Ok(());
                }
                () = tokio::time::sleep(wait) => {}
            }

            let woke = Local::now();
            if !self.should_fire(&next, &woke) {
                tracing::warn!(%next, %woke, grace = ?self.misfire_grace, "missed daily sync slot; skipping");
                continue;
            }

            sync_once(&controller).await;
        }
    }
}

async fn sync_once<S>(controller: &RefreshController<S>)
where
    S: TransactionStore + ?Sized,
{
    match controller.daily_sync().await {
        Ok(summary) => tracing::info!(
            imported = summary.records_imported,
            failed_windows = summary.windows_failed,
            "scheduled daily sync done"
        ),
        Err(e) => tracing::error!(error = %e, "scheduled daily sync failed"),
    }
}
