use log::{info, warn};
use std::sync::mpsc::Sender;

use crate::{
    cancel::CancelToken,
    device::Transport,
    scheduler::{Event, Scheduler, SchedulerHandle},
    Config, Error, Obd2, Obd2Device, Result,
};

/// Open a polling session over `transport`
///
/// Runs the handshake on the calling thread, then hands the transport to a [Scheduler] on its
/// own thread, starting in [Idle](crate::PollMode::Idle). If the adapter fails the handshake,
/// [Event::InvalidDevice] is sent, the transport is closed and no scheduler is started.
pub fn connect<T>(transport: T, config: Config, events: Sender<Event>) -> Result<SchedulerHandle>
where
    T: Transport + Send + 'static,
{
    config.validate()?;

    let cancel = CancelToken::new();
    let mut device = Obd2::with_cancel_token(transport, config.clone(), cancel.clone());

    if let Err(e) = device.handshake() {
        if let Error::InvalidDevice { response } = &e {
            // the caller still gets the error if nobody listens
            let _ = events.send(Event::InvalidDevice(response.clone()));
        } else {
            warn!("Handshake failed: {}", e);
        }
        device.close();
        return Err(e);
    }

    info!("Handshake complete, starting poller");
    Scheduler::new(device, &config, events, cancel).spawn()
}
