//! HTTP task ↔ control loop bridge.
//!
//! Uses `embassy-sync` bounded channels so the HTTP server task never
//! touches light state.  Handlers submit a request and poll for the
//! response carrying the same sequence number; the control loop drains
//! requests at the top of each iteration.
//!
//! ```text
//! ┌──────────────┐ ControlRequest ┌──────────────┐
//! │  HTTP task   │──────────────▶│ Control Loop │
//! │  (handlers)  │◀──────────────│  (sync)      │
//! └──────────────┘ (seq, HttpResp)└──────────────┘
//! ```

use core::sync::atomic::{AtomicU32, Ordering};

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::{Channel, TrySendError};
use log::{debug, warn};

use super::request::{ControlRequest, HttpResponse};

/// Channel depth for inbound requests.
const REQ_DEPTH: usize = 4;

/// Channel depth for outbound responses.
const RESP_DEPTH: usize = 4;

/// How long a handler waits for the loop before answering `503`.
pub const RESPONSE_TIMEOUT_MS: u32 = 2000;

/// Poll interval while waiting for a response.
pub const POLL_INTERVAL_MS: u32 = 5;

pub struct RequestBridge {
    requests: Channel<CriticalSectionRawMutex, ControlRequest, REQ_DEPTH>,
    responses: Channel<CriticalSectionRawMutex, (u32, HttpResponse), RESP_DEPTH>,
    next_seq: AtomicU32,
}

impl RequestBridge {
    pub const fn new() -> Self {
        Self {
            requests: Channel::new(),
            responses: Channel::new(),
            next_seq: AtomicU32::new(1),
        }
    }

    // ── HTTP task side ────────────────────────────────────────

    /// Stamp and enqueue `req`.  Returns the sequence number, or `None`
    /// when the loop is backed up.
    pub fn submit(&self, mut req: ControlRequest) -> Option<u32> {
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        req.seq = seq;
        match self.requests.try_send(req) {
            Ok(()) => Some(seq),
            Err(TrySendError::Full(_)) => {
                warn!("bridge: request queue full");
                None
            }
        }
    }

    /// Take the response for `seq` if it has arrived.  Responses for
    /// earlier sequence numbers belong to timed-out requests and are
    /// dropped.
    pub fn take_response(&self, seq: u32) -> Option<HttpResponse> {
        while let Ok((got, resp)) = self.responses.try_receive() {
            if got == seq {
                return Some(resp);
            }
            debug!("bridge: dropping stale response #{got} (waiting for #{seq})");
        }
        None
    }

    /// Submit `req` and wait up to `timeout_ms` for its response, pausing
    /// with `sleep` between polls.  Times out to `503`.
    pub fn round_trip(&self, req: ControlRequest, timeout_ms: u32, mut sleep: impl FnMut(u32)) -> HttpResponse {
        let Some(seq) = self.submit(req) else {
            return HttpResponse::service_unavailable();
        };
        let mut waited = 0;
        loop {
            if let Some(resp) = self.take_response(seq) {
                return resp;
            }
            if waited >= timeout_ms {
                warn!("bridge: request #{seq} timed out after {timeout_ms} ms");
                return HttpResponse::service_unavailable();
            }
            sleep(POLL_INTERVAL_MS);
            waited += POLL_INTERVAL_MS;
        }
    }

    // ── Control loop side ─────────────────────────────────────

    /// Next pending request, if any.  Never blocks.
    pub fn next_request(&self) -> Option<ControlRequest> {
        self.requests.try_receive().ok()
    }

    /// Post the response for `seq`.  If the queue is full the oldest
    /// response (whose handler has given up) is evicted.
    pub fn respond(&self, seq: u32, resp: HttpResponse) {
        let mut msg = (seq, resp);
        loop {
            match self.responses.try_send(msg) {
                Ok(()) => return,
                Err(TrySendError::Full(back)) => {
                    msg = back;
                    if let Ok((stale, _)) = self.responses.try_receive() {
                        debug!("bridge: evicting stale response #{stale}");
                    }
                }
            }
        }
    }

    pub fn has_pending(&self) -> bool {
        !self.requests.is_empty()
    }
}

impl Default for RequestBridge {
    fn default() -> Self {
        Self::new()
    }
}
