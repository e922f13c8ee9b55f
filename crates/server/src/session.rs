//! Per-connection protocol state machine.
//!
//! The machine is pure: it consumes the bytes of one socket read and returns
//! the [`Effect`]s the connection driver must carry out. Filesystem and
//! socket work never happens here.

use greatwire_protocol::{CHUNK_SIZE, ControlFrame, Payload, Response, classify_payload};
use greatwire_transfer::ChunkTracker;

/// An upload in progress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferState {
    filename: String,
    tracker: ChunkTracker,
    accumulated: Vec<u8>,
}

impl TransferState {
    pub fn new(filename: String, declared_size: u64) -> Self {
        Self {
            filename,
            tracker: ChunkTracker::new(declared_size),
            accumulated: Vec::new(),
        }
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn tracker(&self) -> &ChunkTracker {
        &self.tracker
    }
}

/// Where a connection stands between two reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// The next read is parsed as a control frame.
    Idle { empty_reads: u32 },
    /// The next reads are raw upload bytes.
    Receiving(TransferState),
    /// The connection is closed.
    Terminated,
}

/// Work the driver performs after a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Send a bare response token.
    Reply(Response),
    /// Send `ok`, the size message and the content of `filename`, or `abort`
    /// if it does not exist.
    Serve { filename: String },
    /// Persist a completed upload, then acknowledge it.
    Store { filename: String, payload: Payload },
    /// Close the socket.
    Close,
}

/// Protocol state for one accepted connection.
#[derive(Debug)]
pub struct Session {
    state: SessionState,
    max_empty_reads: u32,
}

impl Session {
    pub fn new(max_empty_reads: u32) -> Self {
        Self {
            state: SessionState::Idle { empty_reads: 0 },
            max_empty_reads,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn is_terminated(&self) -> bool {
        matches!(self.state, SessionState::Terminated)
    }

    /// Upper bound for the next socket read.
    ///
    /// While receiving, reads never cross the end of the upload so that a
    /// following control frame is left on the socket.
    pub fn next_read_len(&self) -> usize {
        match &self.state {
            SessionState::Receiving(transfer) => transfer.tracker.next_read_len().max(1),
            _ => CHUNK_SIZE,
        }
    }

    /// Feeds the bytes of one read into the machine.
    pub fn on_read(&mut self, data: &[u8]) -> Vec<Effect> {
        let state = std::mem::replace(&mut self.state, SessionState::Terminated);
        let (next, effects) = match state {
            SessionState::Idle { empty_reads } => on_idle(empty_reads, self.max_empty_reads, data),
            SessionState::Receiving(transfer) => on_receiving(transfer, data),
            SessionState::Terminated => (SessionState::Terminated, Vec::new()),
        };
        self.state = next;
        effects
    }
}

fn idle() -> SessionState {
    SessionState::Idle { empty_reads: 0 }
}

fn on_idle(empty_reads: u32, max_empty_reads: u32, data: &[u8]) -> (SessionState, Vec<Effect>) {
    if data.is_empty() {
        if empty_reads >= max_empty_reads {
            return (SessionState::Terminated, vec![Effect::Close]);
        }
        let state = SessionState::Idle {
            empty_reads: empty_reads + 1,
        };
        return (state, Vec::new());
    }

    let frame = match ControlFrame::decode(data) {
        Ok(frame) => frame,
        Err(e) => {
            tracing::warn!("rejecting control frame: {e}");
            return (idle(), vec![Effect::Reply(Response::Abort)]);
        }
    };

    match frame {
        ControlFrame::Exit => (SessionState::Terminated, vec![Effect::Close]),
        ControlFrame::Download { filename } => (idle(), vec![Effect::Serve { filename }]),
        ControlFrame::Upload { filename, size } => {
            let transfer = TransferState::new(filename, size);
            let accept = Effect::Reply(Response::Ok);
            if transfer.tracker.is_complete() {
                // Zero chunks: nothing will follow on the wire.
                let (state, mut effects) = finish(transfer);
                effects.insert(0, accept);
                (state, effects)
            } else {
                (SessionState::Receiving(transfer), vec![accept])
            }
        }
    }
}

fn on_receiving(mut transfer: TransferState, data: &[u8]) -> (SessionState, Vec<Effect>) {
    transfer.accumulated.extend_from_slice(data);
    transfer.tracker = transfer.tracker.record(data.len());

    if transfer.tracker.is_complete() {
        finish(transfer)
    } else {
        (SessionState::Receiving(transfer), Vec::new())
    }
}

fn finish(transfer: TransferState) -> (SessionState, Vec<Effect>) {
    let TransferState {
        filename,
        tracker,
        accumulated,
    } = transfer;

    if tracker.bytes_received() != tracker.declared_size() {
        tracing::warn!(
            %filename,
            declared = tracker.declared_size(),
            received = tracker.bytes_received(),
            "upload ended short of its declared size"
        );
    }

    let payload = classify_payload(accumulated);
    (idle(), vec![Effect::Store { filename, payload }])
}
