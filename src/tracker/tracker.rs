use std::sync::{Arc, Mutex as StdMutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::controller::{Readings, TrackingController};
use super::error::TrackerError;
use super::types::Command;
use crate::devices::{apply_radio, Radio, Rotor};
use crate::predict::DopplerSource;

pub type SharedController = Arc<StdMutex<TrackingController>>;

/// Hardware the scheduler talks to. Only the worker touches it.
pub struct Devices {
    pub radio: Box<dyn Radio>,
    pub rotor: Option<Box<dyn Rotor>>,
}

struct WorkerHandle {
    stop_tx: oneshot::Sender<()>,
    join: JoinHandle<Devices>,
}

/// Periodic task driving the controller: read devices, tick, write devices.
pub struct Tracker {
    controller: SharedController,
    worker: Option<WorkerHandle>,
}

pub fn lock(controller: &StdMutex<TrackingController>) -> MutexGuard<'_, TrackingController> {
    controller.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Tracker {
    pub fn new(controller: SharedController) -> Self {
        Self {
            controller,
            worker: None,
        }
    }

    pub fn controller(&self) -> SharedController {
        self.controller.clone()
    }

    pub fn is_running(&self) -> bool {
        self.worker.is_some()
    }

    /// Spawn the tick loop. Needs a multi-threaded runtime since device I/O
    /// runs in place on the worker thread.
    pub fn start(
        &mut self,
        devices: Devices,
        source: Arc<dyn DopplerSource + Send + Sync>,
        period: Duration,
    ) -> Result<(), TrackerError> {
        if self.worker.is_some() {
            return Err(TrackerError::AlreadyRunning);
        }

        let controller = self.controller.clone();
        let (stop_tx, stop_rx) = oneshot::channel();
        let join = tokio::spawn(run_loop(controller, devices, source, period, stop_rx));
        self.worker = Some(WorkerHandle { stop_tx, join });
        log::info!("Tracker started, tick every {}", humantime::format_duration(period));
        Ok(())
    }

    /// Stop the loop and hand the devices back.
    pub async fn stop(&mut self) -> Option<Devices> {
        let worker = self.worker.take()?;
        let _ = worker.stop_tx.send(());
        match worker.join.await {
            Ok(devices) => Some(devices),
            Err(e) => {
                log::error!("Tracker worker failed: {}", e);
                None
            }
        }
    }
}

async fn run_loop(
    controller: SharedController,
    mut devices: Devices,
    source: Arc<dyn DopplerSource + Send + Sync>,
    period: Duration,
    mut stop_rx: oneshot::Receiver<()>,
) -> Devices {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                tokio::task::block_in_place(|| {
                    run_tick(&controller, &mut devices, source.as_ref(), Utc::now())
                });
            }
            _ = &mut stop_rx => break,
        }
    }

    log::info!("Tracker stopped");
    devices
}

/// One scheduler cycle. The controller lock is never held during device I/O.
pub fn run_tick(
    controller: &StdMutex<TrackingController>,
    devices: &mut Devices,
    source: &dyn DopplerSource,
    now: DateTime<Utc>,
) {
    let plan = lock(controller).read_plan();

    let radio_active = devices.radio.is_active();
    let downlink_dial_hz = match (&plan, radio_active) {
        (Some(plan), true) => match devices.radio.frequency(plan.downlink_vfo) {
            Ok(hz) => Some(hz),
            Err(e) => {
                log::warn!("Radio read failed: {}", e);
                None
            }
        },
        _ => None,
    };

    let rotor_position = devices.rotor.as_mut().and_then(|rotor| {
        if !rotor.is_active() {
            return None;
        }
        match rotor.position() {
            Ok(pos) => Some(pos),
            Err(e) => {
                log::warn!("Rotor read failed: {}", e);
                None
            }
        }
    });

    let readings = Readings {
        observation: plan.as_ref().map(|p| source.observe(&p.satellite, now)),
        radio_active,
        downlink_dial_hz,
        rotor_position,
    };

    let commands = lock(controller).tick(now, readings);

    for command in &commands {
        let result = match command {
            Command::Radio(radio) => apply_radio(devices.radio.as_mut(), radio),
            Command::Rotor(target) => match devices.rotor.as_mut() {
                Some(rotor) => rotor.set_position(*target),
                None => Ok(()),
            },
        };
        if let Err(e) = result {
            log::warn!("Failed to apply {:?}: {}", command, e);
        }
    }
}
