//! Live link between a device session and host-owned outputs
//!
//! Each tick runs the whole pipeline in a fixed order, so reconciliation always
//! sees the samples of the same tick:
//!
//! ```text
//! DeviceSession::poll ──► PropertyBag ──► compute_desired_set ──► RebuildPlan
//!                         (overwrite)      (scalar controller_*)   (if stale)
//! ```
//!
//! [`LiveLink::run`] drives ticks from a tokio interval on the caller's task.
//! It never spawns threads of its own.

pub mod status;

use crate::controller::session::{DeviceSession, Live, SessionStatus};
use crate::outputs::property::{apply_samples, PropertyBag};
use crate::outputs::reconcile::{compute_desired_set, OutputStructure, RebuildPlan};
use chrono::{DateTime, Local};
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info};

/// Outcome of one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickReport {
    pub samples: usize,
    pub rebuilt: bool,
}

/// Copy of the link state taken after a tick
#[derive(Debug, Clone)]
pub struct LinkSnapshot {
    pub tick: u64,
    pub status: SessionStatus,
    pub properties: PropertyBag,
    pub taken_at: DateTime<Local>,
}

impl Default for LinkSnapshot {
    fn default() -> Self {
        Self {
            tick: 0,
            status: SessionStatus::NoController,
            properties: PropertyBag::default(),
            taken_at: Local::now(),
        }
    }
}

pub struct LiveLink<S: OutputStructure> {
    session: DeviceSession<Live>,
    properties: PropertyBag,
    structure: S,
    ticks: u64,
}

impl<S: OutputStructure> LiveLink<S> {
    pub fn new(session: DeviceSession<Live>, structure: S) -> Self {
        Self::with_properties(session, PropertyBag::new(), structure)
    }

    /// Starts from an existing property store, e.g. one restored by the host
    pub fn with_properties(
        session: DeviceSession<Live>,
        properties: PropertyBag,
        structure: S,
    ) -> Self {
        info!("Live link ready: {}", session.status());
        Self {
            session,
            properties,
            structure,
            ticks: 0,
        }
    }

    pub fn session(&self) -> &DeviceSession<Live> {
        &self.session
    }

    pub fn properties(&self) -> &PropertyBag {
        &self.properties
    }

    pub fn structure(&self) -> &S {
        &self.structure
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Polls, stores the samples, then rebuilds the outputs if they went stale
    pub fn tick(&mut self) -> TickReport {
        let samples = self.session.poll();
        apply_samples(&mut self.properties, &samples);

        let desired = compute_desired_set(&self.properties);
        let rebuilt = match RebuildPlan::for_structure(&self.structure, &desired) {
            Some(plan) => {
                plan.apply(&mut self.structure);
                true
            }
            None => false,
        };

        self.ticks += 1;
        debug!(
            "Tick {}: {} samples, rebuilt={}",
            self.ticks,
            samples.len(),
            rebuilt
        );

        TickReport {
            samples: samples.len(),
            rebuilt,
        }
    }

    pub fn snapshot(&self) -> LinkSnapshot {
        LinkSnapshot {
            tick: self.ticks,
            status: self.session.status(),
            properties: self.properties.clone(),
            taken_at: Local::now(),
        }
    }

    /// Ticks every `period` until `stop` turns true or its sender goes away
    ///
    /// Publishes a snapshot after every tick and tears the session down on
    /// exit. Returns the number of ticks run.
    pub async fn run(
        mut self,
        period: Duration,
        mut stop: watch::Receiver<bool>,
        snapshots: watch::Sender<LinkSnapshot>,
    ) -> u64 {
        info!("Starting live link with {:?} period", period);
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        while !*stop.borrow() {
            tokio::select! {
                _ = ticker.tick() => {
                    self.tick();
                    snapshots.send_replace(self.snapshot());
                }
                changed = stop.changed() => {
                    if changed.is_err() {
                        debug!("Stop channel closed");
                        break;
                    }
                }
            }
        }

        self.stop()
    }

    /// Releases the device and discards all link state
    pub fn stop(self) -> u64 {
        let ticks = self.ticks;
        self.session.stop();
        info!("Live link stopped after {} ticks", ticks);
        ticks
    }
}
