//! Scripted adapter used by the unit tests

use std::collections::{HashMap, VecDeque};
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
};

use super::{Result, Transport};

const UNKNOWN_REPLY: &str = "?\r\r>";

/// Answers each request with a scripted ELM327 reply
///
/// Replies registered for the same request are used in order; the last one keeps repeating.
/// Requests without a script get `?`, like a real adapter.
pub(crate) struct ScriptedTransport {
    replies: HashMap<String, VecDeque<String>>,
    pending: VecDeque<u8>,
    line: Vec<u8>,
    echo: bool,
    dribble: bool,
    silent: bool,
    fail_writes_after: Option<usize>,
    probe: Probe,
}

/// Shared view of what a [ScriptedTransport] saw, usable after it moved into a session
#[derive(Clone, Default)]
pub(crate) struct Probe {
    written: Arc<Mutex<Vec<String>>>,
    closes: Arc<AtomicUsize>,
}

impl Probe {
    pub fn written(&self) -> Vec<String> {
        self.written.lock().unwrap().clone()
    }

    pub fn close_count(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

impl ScriptedTransport {
    pub fn new() -> Self {
        ScriptedTransport {
            replies: HashMap::new(),
            pending: VecDeque::new(),
            line: Vec::new(),
            echo: false,
            dribble: false,
            silent: false,
            fail_writes_after: None,
            probe: Probe::default(),
        }
    }

    pub fn reply(mut self, request: &str, response: &str) -> Self {
        self.replies
            .entry(request.to_owned())
            .or_default()
            .push_back(response.to_owned());
        self
    }

    /// Echo each request back before the reply, as with `ATE1`
    pub fn with_echo(mut self) -> Self {
        self.echo = true;
        self
    }

    /// Emit an endless stream of hex digits without ever sending the prompt
    pub fn dribbling(mut self) -> Self {
        self.dribble = true;
        self
    }

    /// Never answer anything
    pub fn silent(mut self) -> Self {
        self.silent = true;
        self
    }

    /// Fail every write once `count` requests were accepted
    pub fn fail_writes_after(mut self, count: usize) -> Self {
        self.fail_writes_after = Some(count);
        self
    }

    pub fn probe(&self) -> Probe {
        self.probe.clone()
    }

    fn finish_request(&mut self) {
        let request = String::from_utf8_lossy(&self.line).trim().to_owned();
        self.line.clear();
        if request.is_empty() {
            return;
        }
        self.probe.written.lock().unwrap().push(request.clone());

        if self.silent || self.dribble {
            return;
        }
        if self.echo {
            self.pending.extend(request.as_bytes());
            self.pending.push_back(b'\r');
        }

        let reply = match self.replies.get_mut(&request) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap_or_default(),
            Some(queue) => queue.front().cloned().unwrap_or_default(),
            None => UNKNOWN_REPLY.to_owned(),
        };
        self.pending.extend(reply.as_bytes());
    }
}

impl Transport for ScriptedTransport {
    fn write_all(&mut self, data: &[u8]) -> Result<()> {
        if let Some(limit) = self.fail_writes_after {
            if self.probe.written.lock().unwrap().len() >= limit {
                return Err(std::io::Error::new(
                    std::io::ErrorKind::BrokenPipe,
                    "scripted write failure",
                )
                .into());
            }
        }

        for &b in data {
            if b == b'\r' {
                self.finish_request();
            } else {
                self.line.push(b);
            }
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }

    fn bytes_available(&mut self) -> Result<usize> {
        if self.dribble {
            return Ok(1);
        }
        Ok(self.pending.len())
    }

    fn read_byte(&mut self) -> Result<u8> {
        if self.dribble {
            return Ok(b'4');
        }
        self.pending.pop_front().ok_or_else(|| {
            super::Error::Communication("read_byte with nothing available".to_owned())
        })
    }

    fn close(&mut self) -> Result<()> {
        self.probe.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
