//! Cron trigger state.
//!
//! Expressions use the `cron` crate's syntax: six or seven fields,
//! `second minute hour day_of_month month day_of_week [year]`.
//!
//! - `"0 0 * * * *"` - Every hour at minute 0
//! - `"0 */5 * * * *"` - Every 5 minutes
//! - `"0 0 9 * * MON-FRI"` - 9 AM on weekdays

use std::str::FromStr;

use chrono::{DateTime, Utc};
use cron::Schedule;

use jobplane_protocols::engine::{TriggerInfo, TriggerState};
use jobplane_protocols::error::EngineError;
use jobplane_protocols::job::JobKey;

/// Parse a cron expression.
pub(crate) fn parse_schedule(expression: &str) -> Result<Schedule, EngineError> {
    Schedule::from_str(expression.trim()).map_err(|e| EngineError::InvalidSchedule {
        expression: expression.to_string(),
        reason: e.to_string(),
    })
}

/// Check that a cron expression is accepted by the engine.
pub fn validate_cron_expression(expression: &str) -> Result<(), EngineError> {
    parse_schedule(expression).map(|_| ())
}

/// Schedule and fire-time bookkeeping for one registered job.
///
/// `state` only ever holds `Normal`, `Paused`, `Complete`, or `Error`;
/// `Blocked` is derived from the in-flight count by the engine.
#[derive(Debug, Clone)]
pub struct CronTrigger {
    schedule: Schedule,
    cron_expression: String,
    pub(crate) state: TriggerState,
    pub(crate) next_fire_time: Option<DateTime<Utc>>,
    pub(crate) previous_fire_time: Option<DateTime<Utc>>,
    revision: u64,
}

impl CronTrigger {
    /// Build a trigger whose first fire time is computed from `now`.
    pub fn new(cron_expression: &str, now: DateTime<Utc>) -> Result<Self, EngineError> {
        let schedule = parse_schedule(cron_expression)?;
        let next_fire_time = schedule.after(&now).next();
        let state = if next_fire_time.is_some() {
            TriggerState::Normal
        } else {
            TriggerState::Complete
        };

        Ok(Self {
            schedule,
            cron_expression: cron_expression.to_string(),
            state,
            next_fire_time,
            previous_fire_time: None,
            revision: 0,
        })
    }

    pub fn cron_expression(&self) -> &str {
        &self.cron_expression
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Whether the trigger should fire at `now`.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.state == TriggerState::Normal
            && self.next_fire_time.is_some_and(|next| next <= now)
    }

    /// Consume the current fire time and move to the first one after `now`.
    ///
    /// Fire times missed between the two are dropped. Returns the consumed
    /// fire time. A schedule with nothing left becomes `Complete`.
    pub fn advance(&mut self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let fired = self.next_fire_time?;
        self.previous_fire_time = Some(fired);
        self.next_fire_time = self.schedule.after(&now).next();
        if self.next_fire_time.is_none() && self.state == TriggerState::Normal {
            self.state = TriggerState::Complete;
        }
        Some(fired)
    }

    /// Swap in a new schedule, keeping state and fire history.
    pub fn replace(&mut self, cron_expression: &str, now: DateTime<Utc>) -> Result<(), EngineError> {
        let schedule = parse_schedule(cron_expression)?;
        self.next_fire_time = schedule.after(&now).next();
        self.schedule = schedule;
        self.cron_expression = cron_expression.to_string();
        self.revision += 1;

        match (self.state, self.next_fire_time) {
            (TriggerState::Normal, None) => self.state = TriggerState::Complete,
            (TriggerState::Complete, Some(_)) => self.state = TriggerState::Normal,
            _ => {}
        }
        Ok(())
    }

    pub fn pause(&mut self) {
        if self.state != TriggerState::Complete {
            self.state = TriggerState::Paused;
        }
    }

    /// Leave `Paused` or `Error`, recomputing the next fire time from `now`.
    pub fn resume(&mut self, now: DateTime<Utc>) {
        if !matches!(self.state, TriggerState::Paused | TriggerState::Error) {
            return;
        }
        self.next_fire_time = self.schedule.after(&now).next();
        self.state = if self.next_fire_time.is_some() {
            TriggerState::Normal
        } else {
            TriggerState::Complete
        };
    }

    /// Snapshot with the engine-derived state.
    pub fn info(&self, key: &JobKey, state: TriggerState) -> TriggerInfo {
        TriggerInfo {
            key: key.clone(),
            cron_expression: self.cron_expression.clone(),
            state,
            next_fire_time: self.next_fire_time,
            previous_fire_time: self.previous_fire_time,
            revision: self.revision,
        }
    }
}
