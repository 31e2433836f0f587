use log::{debug, trace, warn};
use std::time::{Duration, Instant};

use super::{Error, Result, Transport};
use crate::{cancel::CancelToken, Config};

/// Most bytes [Elm327::execute_simple] takes from a device that keeps talking
const MAX_SIMPLE_RESPONSE: usize = 256;

/// An ELM327 OBD-II adapter
///
/// Commands to the device itself are indicated by sending "AT" followed by the command, while
/// plain strings of hex data indicate OBD-II requests to be sent to the vehicle. Every reply is
/// terminated by the `>` prompt, which signals that the adapter is ready for another command.
///
/// This is the only type that touches the [Transport]; everything above it works on the cleaned
/// ASCII response returned by [execute](Self::execute).
///
/// [Datasheet for v1.4b](https://www.elmelectronics.com/products/dsheets/)
pub struct Elm327<T: Transport> {
    transport: T,
    poll_interval: Duration,
    simple_settle: Duration,
    cancel: CancelToken,
    closed: bool,
}

impl<T: Transport> Elm327<T> {
    pub fn new(transport: T, config: &Config, cancel: CancelToken) -> Self {
        Elm327 {
            transport,
            poll_interval: config.poll_interval(),
            simple_settle: config.simple_settle(),
            cancel,
            closed: false,
        }
    }

    /// Send `request` and read the reply up to the `>` prompt
    ///
    /// The reply has all whitespace, control characters and `SEARCHING...` removed, and a
    /// leading echo of `request` stripped. If no prompt is seen within `timeout`,
    /// [Error::Timeout] is returned and the partial reply is discarded.
    pub fn execute(&mut self, request: &str, timeout: Duration) -> Result<String> {
        self.send_serial_str(request)?;
        let raw = self.get_until_prompt(timeout)?;
        let response = clean_response(&String::from_utf8_lossy(&raw), request);
        debug!("execute: {:?} -> {:?}", request, response);
        Ok(response)
    }

    /// Send `request`, wait a fixed settle delay and take whatever the adapter has sent
    ///
    /// Only suitable for handshake commands without numeric payloads: there is no prompt
    /// detection and no echo stripping, just whitespace removal. At most
    /// `MAX_SIMPLE_RESPONSE` bytes are read, the rest is left on the line.
    pub fn execute_simple(&mut self, request: &str) -> Result<String> {
        self.send_serial_str(request)?;
        if self.cancel.sleep(self.simple_settle) {
            return Err(Error::Cancelled);
        }

        let mut raw = Vec::new();
        while raw.len() < MAX_SIMPLE_RESPONSE && self.transport.bytes_available()? > 0 {
            raw.push(self.transport.read_byte()?);
        }
        if raw.len() == MAX_SIMPLE_RESPONSE {
            warn!(
                "execute_simple: {:?} still talking after {} bytes, cutting reply short",
                request, MAX_SIMPLE_RESPONSE
            );
        }

        let response: String = String::from_utf8_lossy(&raw)
            .chars()
            .filter(|c| !c.is_whitespace() && !c.is_control() && *c != '>')
            .collect();
        debug!("execute_simple: {:?} -> {:?}", request, response);
        Ok(response)
    }

    /// Close the transport
    ///
    /// Only the first call reaches the transport; later calls do nothing.
    pub fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        debug!("close: closing transport");
        self.transport.close()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Function for sending a raw string followed by the carriage return the adapter expects
    fn send_serial_str(&mut self, data: &str) -> Result<()> {
        if self.closed {
            return Err(Error::Communication("transport is closed".to_owned()));
        }

        trace!("send_serial_str: sending {:?}", data);
        self.transport.write_all(data.as_bytes())?;
        self.transport.write_all(b"\r")?;
        self.transport.flush()
    }

    fn get_until_prompt(&mut self, timeout: Duration) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        let start = Instant::now();
        while start.elapsed() < timeout {
            if self.cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }

            if self.transport.bytes_available()? > 0 {
                match self.transport.read_byte()? {
                    b'>' => {
                        trace!(
                            "get_until_prompt: got {:?}",
                            String::from_utf8_lossy(&buf)
                        );
                        return Ok(buf);
                    }
                    b => buf.push(b),
                }
            } else if self.cancel.sleep(self.poll_interval) {
                return Err(Error::Cancelled);
            }
        }

        warn!(
            "get_until_prompt: no prompt after {:?}, dropping partial response {:?}",
            timeout,
            String::from_utf8_lossy(&buf)
        );
        Err(Error::Timeout(timeout))
    }
}

impl<T: Transport> Drop for Elm327<T> {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            debug!("drop: failed to close transport: {}", e);
        }
    }
}

/// Normalise a raw adapter reply
///
/// Removes whitespace, control characters and the `SEARCHING...` banner the adapter prints
/// while it negotiates a protocol, then strips a leading echo of `request`.
pub fn clean_response(raw: &str, request: &str) -> String {
    let cleaned: String = raw
        .chars()
        .filter(|c| !c.is_whitespace() && !c.is_control())
        .collect::<String>()
        .replace("SEARCHING...", "");

    match cleaned.strip_prefix(request) {
        Some(rest) if !request.is_empty() => rest.to_owned(),
        _ => cleaned,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::mock::ScriptedTransport;

    fn reader(transport: ScriptedTransport) -> Elm327<ScriptedTransport> {
        Elm327::new(transport, &Config::for_tests(), CancelToken::new())
    }

    #[test]
    fn clean_response_strips_whitespace_banner_and_echo() {
        assert_eq!(clean_response("41 0C 1A F8\r\r", "010C"), "410C1AF8");
        assert_eq!(
            clean_response("SEARCHING...\r41 0D 28\r\r", "010D"),
            "410D28"
        );
        assert_eq!(clean_response("010C\r410C1AF8\r\r", "010C"), "410C1AF8");
        assert_eq!(clean_response("03\r43 01 33 01 71\r", "03"), "4301330171");
    }

    #[test]
    fn execute_reads_up_to_prompt() {
        let transport = ScriptedTransport::new().reply("010C", "41 0C 1A F8\r\r>");
        let probe = transport.probe();
        let mut elm = reader(transport);

        let response = elm
            .execute("010C", Duration::from_millis(200))
            .unwrap();
        assert_eq!(response, "410C1AF8");
        assert_eq!(probe.written(), vec!["010C".to_owned()]);
    }

    #[test]
    fn execute_strips_echo() {
        let transport = ScriptedTransport::new()
            .with_echo()
            .reply("0105", "41 05 28\r\r>");
        let mut elm = reader(transport);

        assert_eq!(
            elm.execute("0105", Duration::from_millis(200)).unwrap(),
            "410528"
        );
    }

    #[test]
    fn execute_times_out_without_prompt() {
        let transport = ScriptedTransport::new().dribbling();
        let mut elm = reader(transport);

        let result = elm.execute("010C", Duration::from_millis(60));
        assert!(matches!(result, Err(Error::Timeout(_))));
    }

    #[test]
    fn execute_times_out_on_silence() {
        let transport = ScriptedTransport::new().silent();
        let mut elm = reader(transport);

        let result = elm.execute("010C", Duration::from_millis(30));
        assert!(matches!(result, Err(Error::Timeout(_))));
    }

    #[test]
    fn execute_reports_write_failure() {
        let transport = ScriptedTransport::new().fail_writes_after(0);
        let mut elm = reader(transport);

        let result = elm.execute("010C", Duration::from_millis(30));
        assert!(matches!(result, Err(Error::IO(_))));
    }

    #[test]
    fn execute_aborts_when_cancelled() {
        let cancel = CancelToken::new();
        let mut elm = Elm327::new(
            ScriptedTransport::new().silent(),
            &Config::for_tests(),
            cancel.clone(),
        );
        cancel.cancel();

        let result = elm.execute("010C", Duration::from_secs(5));
        assert!(matches!(result, Err(Error::Cancelled)));
    }

    #[test]
    fn execute_simple_takes_everything_available() {
        let transport = ScriptedTransport::new().reply("0100", "41 00 BE 3F A8 13\r\r>");
        let mut elm = reader(transport);

        assert_eq!(elm.execute_simple("0100").unwrap(), "4100BE3FA813");
    }

    #[test]
    fn execute_simple_stops_on_endless_reply() {
        let mut elm = reader(ScriptedTransport::new().dribbling());

        let response = elm.execute_simple("0100").unwrap();
        assert_eq!(response.len(), MAX_SIMPLE_RESPONSE);
        assert!(response.bytes().all(|b| b == b'4'));
    }

    #[test]
    fn close_is_idempotent() {
        let transport = ScriptedTransport::new();
        let probe = transport.probe();
        let mut elm = reader(transport);

        elm.close().unwrap();
        elm.close().unwrap();
        assert!(elm.is_closed());
        drop(elm);
        assert_eq!(probe.close_count(), 1);
    }

    #[test]
    fn execute_after_close_fails() {
        let mut elm = reader(ScriptedTransport::new());
        elm.close().unwrap();

        assert!(matches!(
            elm.execute("010C", Duration::from_millis(10)),
            Err(Error::Communication(_))
        ));
    }
}
