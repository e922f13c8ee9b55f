use greatwire_protocol::CHUNK_SIZE;

const CHUNK: u64 = CHUNK_SIZE as u64;

/// Number of chunks needed to carry `size` bytes: `ceil(size / CHUNK_SIZE)`.
pub fn total_chunks(size: u64) -> u64 {
    size.div_ceil(CHUNK)
}

/// Length of chunk `index` within a transfer of `size` bytes.
///
/// Every chunk is full except possibly the last; indexes past the end are 0.
pub fn chunk_len(index: u64, size: u64) -> usize {
    let start = index.saturating_mul(CHUNK);
    if start >= size {
        return 0;
    }
    (size - start).min(CHUNK) as usize
}

/// Percentage of `done` out of `total` chunks. An empty transfer is 100%.
pub fn progress_percent(done: u64, total: u64) -> f64 {
    if total == 0 {
        return 100.0;
    }
    (done.min(total) as f64 / total as f64) * 100.0
}

/// Progress of one transfer, counted in chunks.
///
/// A chunk is complete once all of its bytes have arrived, so a short read
/// never counts as a whole chunk. An empty read always counts as one chunk,
/// which lets a transfer from a vanished peer still terminate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkTracker {
    declared_size: u64,
    total_chunks: u64,
    bytes_received: u64,
    empty_reads: u64,
}

impl ChunkTracker {
    pub fn new(declared_size: u64) -> Self {
        Self {
            declared_size,
            total_chunks: total_chunks(declared_size),
            bytes_received: 0,
            empty_reads: 0,
        }
    }

    /// Returns the tracker after a read of `n` bytes.
    #[must_use]
    pub fn record(self, n: usize) -> Self {
        let mut next = self;
        if n == 0 {
            next.empty_reads += 1;
        } else {
            next.bytes_received = next.bytes_received.saturating_add(n as u64);
        }
        next
    }

    pub fn declared_size(&self) -> u64 {
        self.declared_size
    }

    pub fn total_chunks(&self) -> u64 {
        self.total_chunks
    }

    pub fn bytes_received(&self) -> u64 {
        self.bytes_received
    }

    /// Completed chunks, never more than [`total_chunks`](Self::total_chunks).
    pub fn chunks_received(&self) -> u64 {
        let by_bytes = if self.bytes_received >= self.declared_size {
            self.total_chunks
        } else {
            self.bytes_received / CHUNK
        };
        (by_bytes + self.empty_reads).min(self.total_chunks)
    }

    pub fn is_complete(&self) -> bool {
        self.chunks_received() == self.total_chunks
    }

    /// Largest read that stays inside the current chunk.
    pub fn next_read_len(&self) -> usize {
        let remaining = self.declared_size.saturating_sub(self.bytes_received);
        let into_chunk = self.bytes_received % CHUNK;
        remaining.min(CHUNK - into_chunk) as usize
    }

    pub fn percent(&self) -> f64 {
        progress_percent(self.chunks_received(), self.total_chunks)
    }

    /// Progress bucket in tens of percent (0..=10), for throttled logging.
    pub fn decile(&self) -> u8 {
        (self.percent() / 10.0).floor() as u8
    }
}
