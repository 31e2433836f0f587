//! The polling loop
//!
//! A [Scheduler] owns an [Obd2Device] on a background thread and, once per tick, runs the
//! commands for the current [PollMode], sending the results to the consumer as [Event]s. The
//! consumer steers it through a [Controller]: mode and custom scan set are plain shared values
//! read at the top of every tick.

use log::{debug, error, info, warn};
use std::collections::BTreeMap;
use std::sync::{
    atomic::{AtomicU8, Ordering},
    mpsc::Sender,
    Arc, Mutex, PoisonError,
};
use std::thread::{self, JoinHandle};

use crate::{
    cancel::CancelToken,
    commands::{Command, Dtc, Pid, PidDescriptor, Reading},
    fuel::{FuelEstimator, FuelReading},
    Config, Error, Obd2Device, Result,
};

/// What the loop does on each tick
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PollMode {
    /// Do nothing but wait
    #[default]
    Idle = 0,
    /// Speed and RPM, continuously
    Dashboard = 1,
    /// Speed, mass air flow and fuel level folded into a fuel economy estimate, continuously
    FuelStats = 2,
    /// Read stored trouble codes once
    DtcScan = 3,
    /// Clear trouble codes, then read them back once
    DtcClear = 4,
    /// Every PID of the custom scan set, continuously
    CustomScan = 5,
}

impl PollMode {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => PollMode::Dashboard,
            2 => PollMode::FuelStats,
            3 => PollMode::DtcScan,
            4 => PollMode::DtcClear,
            5 => PollMode::CustomScan,
            _ => PollMode::Idle,
        }
    }

    /// Modes that go back to [PollMode::Idle] after a single tick
    pub fn is_one_shot(self) -> bool {
        matches!(self, PollMode::DtcScan | PollMode::DtcClear)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DashboardReading {
    pub speed_kmh: i32,
    pub rpm: i32,
}

/// Results sent to the consumer
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Dashboard(DashboardReading),
    Fuel(FuelReading),
    /// Codes stored after a scan or a clear, in reply order
    DtcResult(Vec<Dtc>),
    /// Request code to formatted result, for every PID of the custom scan set
    CustomScanResult(BTreeMap<String, String>),
    /// The adapter stopped answering; the loop has exited and will not resume
    ConnectionLost(String),
    /// The handshake found something other than an OBD-II adapter
    InvalidDevice(String),
}

struct Control {
    mode: AtomicU8,
    custom_pids: Mutex<Vec<PidDescriptor>>,
    cancel: CancelToken,
}

/// Steers a running [Scheduler] from another thread
#[derive(Clone)]
pub struct Controller {
    control: Arc<Control>,
}

impl Controller {
    fn new(cancel: CancelToken) -> Self {
        Controller {
            control: Arc::new(Control {
                mode: AtomicU8::new(PollMode::Idle as u8),
                custom_pids: Mutex::new(Vec::new()),
                cancel,
            }),
        }
    }

    pub fn set_mode(&self, mode: PollMode) {
        info!("Switching to {:?}", mode);
        self.control.mode.store(mode as u8, Ordering::SeqCst);
    }

    pub fn mode(&self) -> PollMode {
        PollMode::from_u8(self.control.mode.load(Ordering::SeqCst))
    }

    /// Replace the custom scan set and switch to [PollMode::CustomScan]
    ///
    /// An empty set sends the loop back to [PollMode::Idle] on its next tick.
    pub fn set_custom_scan_pids(&self, pids: Vec<PidDescriptor>) {
        *self
            .control
            .custom_pids
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = pids;
        self.set_mode(PollMode::CustomScan);
    }

    pub fn custom_scan_pids(&self) -> Vec<PidDescriptor> {
        self.control
            .custom_pids
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Stop the loop; it closes the transport on its way out
    pub fn cancel(&self) {
        self.control.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.control.cancel.is_cancelled()
    }

    /// Leave `from` for Idle unless the consumer picked another mode in the meantime
    fn finish(&self, from: PollMode) {
        if self
            .control
            .mode
            .compare_exchange(
                from as u8,
                PollMode::Idle as u8,
                Ordering::SeqCst,
                Ordering::SeqCst,
            )
            .is_ok()
        {
            debug!("{:?} done, back to Idle", from);
        }
    }
}

enum Flow {
    Continue,
    Stop,
}

/// The polling loop over one adapter session
pub struct Scheduler<D: Obd2Device> {
    device: D,
    controller: Controller,
    events: Sender<Event>,
    fuel: FuelEstimator,
    config: Config,
    last_mode: PollMode,
    timeouts: u32,
}

impl<D: Obd2Device> Scheduler<D> {
    /// Create a scheduler in [PollMode::Idle]
    ///
    /// `cancel` must be the token the device waits on, so that cancelling cuts a frame read
    /// short as well as the inter-tick delay.
    pub fn new(device: D, config: &Config, events: Sender<Event>, cancel: CancelToken) -> Self {
        Scheduler {
            device,
            controller: Controller::new(cancel),
            events,
            fuel: FuelEstimator::new(config.fuel.clone()),
            config: config.clone(),
            last_mode: PollMode::Idle,
            timeouts: 0,
        }
    }

    pub fn controller(&self) -> Controller {
        self.controller.clone()
    }

    /// Run the loop on its own thread
    pub fn spawn(self) -> Result<SchedulerHandle>
    where
        D: Send + 'static,
    {
        let controller = self.controller();
        let thread = thread::Builder::new()
            .name("obd2-poller".to_owned())
            .spawn(move || self.run())
            .map_err(|e| Error::Other(format!("failed to spawn polling thread: {}", e)))?;

        Ok(SchedulerHandle {
            controller,
            thread: Some(thread),
        })
    }

    /// Poll until cancelled, the connection is lost or the consumer hangs up
    ///
    /// The device is closed exactly once on the way out.
    pub fn run(mut self) {
        info!("Polling started");
        while !self.controller.is_cancelled() {
            match self.tick() {
                Ok(Flow::Continue) => {}
                Ok(Flow::Stop) => break,
                Err(e) if e.is_cancelled() => break,
                Err(e) => {
                    error!("Polling stopped: {}", e);
                    // nobody to tell if the consumer is gone
                    let _ = self.events.send(Event::ConnectionLost(e.to_string()));
                    break;
                }
            }
        }
        self.device.close();
        info!("Polling stopped, transport closed");
    }

    fn tick(&mut self) -> Result<Flow> {
        let mode = self.controller.mode();
        if mode != self.last_mode {
            info!("Mode {:?} -> {:?}", self.last_mode, mode);
            if mode == PollMode::FuelStats {
                self.fuel.reset();
            }
            self.last_mode = mode;
        }

        match mode {
            PollMode::Idle => {
                self.device.pause(self.config.idle_delay())?;
            }
            PollMode::Dashboard => {
                let speed_kmh = self.number(Pid::Speed)?;
                let rpm = self.number(Pid::Rpm)?;
                if !self.emit(Event::Dashboard(DashboardReading { speed_kmh, rpm })) {
                    return Ok(Flow::Stop);
                }
                self.device.pause(self.config.dashboard_delay())?;
            }
            PollMode::FuelStats => {
                let speed = self.number(Pid::Speed)?;
                let maf = self
                    .query(&Pid::Maf.into())?
                    .maf_grams_per_sec()
                    .unwrap_or(0.0);
                let level = self.number(Pid::FuelLevel)?;

                let reading = self.fuel.update(f64::from(speed), maf, level);
                if !self.emit(Event::Fuel(reading)) {
                    return Ok(Flow::Stop);
                }
                self.device.pause(self.config.fuel_delay())?;
            }
            PollMode::DtcScan | PollMode::DtcClear => {
                let codes = self.read_codes(mode == PollMode::DtcClear);
                // back to Idle even when the read failed
                self.controller.finish(mode);
                if !self.emit(Event::DtcResult(codes?)) {
                    return Ok(Flow::Stop);
                }
            }
            PollMode::CustomScan => {
                let pids = self.controller.custom_scan_pids();
                if pids.is_empty() {
                    debug!("Custom scan set is empty");
                    self.controller.finish(mode);
                    return Ok(Flow::Continue);
                }

                let mut results = BTreeMap::new();
                for pid in &pids {
                    let reading = self.query(&Command::from_request_code(&pid.code))?;
                    results.insert(pid.code.clone(), reading.formatted_result());
                }
                if !self.emit(Event::CustomScanResult(results)) {
                    return Ok(Flow::Stop);
                }
                self.device.pause(self.config.custom_scan_delay())?;
            }
        }
        Ok(Flow::Continue)
    }

    /// Read stored codes, optionally clearing them and letting the ECU settle first
    fn read_codes(&mut self, clear_first: bool) -> Result<Vec<Dtc>> {
        if clear_first {
            let cleared = self.query(&Command::ClearDtcs)?;
            info!("{}", cleared.formatted_result());
            self.device.pause(self.config.clear_settle())?;
        }
        Ok(self.query(&Command::ReadDtcs)?.codes().to_vec())
    }

    fn number(&mut self, pid: Pid) -> Result<i32> {
        Ok(self.query(&pid.into())?.number().unwrap_or(0))
    }

    /// Run one command, absorbing frame timeouts until `timeout_limit` of them come in a row
    fn query(&mut self, command: &Command) -> Result<Reading> {
        match self.device.run(command) {
            Ok(reading) => {
                self.timeouts = 0;
                Ok(reading)
            }
            Err(e) if e.is_timeout() => {
                self.timeouts += 1;
                let limit = self.config.timeout_limit;
                if limit > 0 && self.timeouts >= limit {
                    return Err(Error::ConnectionLost(format!(
                        "{} consecutive frame timeouts",
                        self.timeouts
                    )));
                }
                warn!(
                    "{} timed out ({} in a row), using default",
                    command.name(),
                    self.timeouts
                );
                Ok(Reading::default_for(command))
            }
            Err(e) => Err(e),
        }
    }

    fn emit(&self, event: Event) -> bool {
        debug!("Emitting {:?}", event);
        if self.events.send(event).is_err() {
            info!("Event receiver dropped");
            return false;
        }
        true
    }
}

/// A running [Scheduler]
///
/// Dropping the handle cancels the loop and waits for it to exit.
pub struct SchedulerHandle {
    controller: Controller,
    thread: Option<JoinHandle<()>>,
}

impl SchedulerHandle {
    pub fn controller(&self) -> Controller {
        self.controller.clone()
    }

    pub fn set_mode(&self, mode: PollMode) {
        self.controller.set_mode(mode)
    }

    pub fn mode(&self) -> PollMode {
        self.controller.mode()
    }

    pub fn set_custom_scan_pids(&self, pids: Vec<PidDescriptor>) {
        self.controller.set_custom_scan_pids(pids)
    }

    pub fn cancel(&self) {
        self.controller.cancel()
    }

    /// Whether the loop has exited
    pub fn is_finished(&self) -> bool {
        self.thread.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Wait for the loop to exit without cancelling it
    pub fn join(mut self) -> Result<()> {
        self.join_thread()
    }

    fn join_thread(&mut self) -> Result<()> {
        match self.thread.take() {
            Some(thread) => thread
                .join()
                .map_err(|_| Error::Other("polling thread panicked".to_owned())),
            None => Ok(()),
        }
    }
}

impl Drop for SchedulerHandle {
    fn drop(&mut self) {
        self.controller.cancel();
        if let Err(e) = self.join_thread() {
            warn!("{}", e);
        }
    }
}
