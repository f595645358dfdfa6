use parking_lot::Mutex;

use super::record::Record;
use crate::error::{Result, SortError};

/// The node's in-memory record buffer.
///
/// Appended to concurrently during the exchange phase (one writer per inbound
/// connection plus the local retention path), then sealed once and handed to the
/// sort. Every append goes through the same lock, so growth is never unsynchronized.
pub struct RecordStore {
    state: Mutex<StoreState>,
}

struct StoreState {
    records: Vec<Record>,
    sealed: bool,
}

impl RecordStore {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(StoreState {
                records: Vec::new(),
                sealed: false,
            }),
        }
    }

    pub fn append(&self, record: Record) -> Result<()> {
        let mut state = self.state.lock();
        if state.sealed {
            return Err(SortError::StoreSealed);
        }
        state.records.push(record);
        Ok(())
    }

    pub fn extend<I>(&self, records: I) -> Result<usize>
    where
        I: IntoIterator<Item = Record>,
    {
        let mut state = self.state.lock();
        if state.sealed {
            return Err(SortError::StoreSealed);
        }
        let before = state.records.len();
        state.records.extend(records);
        Ok(state.records.len() - before)
    }

    pub fn len(&self) -> usize {
        self.state.lock().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Closes the store to further writes and takes its contents.
    /// Sealing twice yields an empty vector the second time.
    pub fn seal(&self) -> Vec<Record> {
        let mut state = self.state.lock();
        state.sealed = true;
        std::mem::take(&mut state.records)
    }
}

impl Default for RecordStore {
    fn default() -> Self {
        Self::new()
    }
}
