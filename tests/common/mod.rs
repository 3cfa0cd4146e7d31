//! Shared test listener.

use std::sync::{Arc, Mutex};

use streampump::reader::{Listener, ReaderError};

/// One recorded listener callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Start,
    Read(Vec<u8>),
    Fault,
    Finish,
}

/// Listener that records every callback; clones share the record.
#[derive(Debug, Clone, Default)]
pub struct Recorder(Arc<Mutex<Vec<Call>>>);

impl Recorder {
    pub fn calls(&self) -> Vec<Call> {
        self.0.lock().unwrap().clone()
    }

    pub fn chunks(&self) -> Vec<Vec<u8>> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Read(chunk) => Some(chunk),
                _ => None,
            })
            .collect()
    }

    pub fn started(&self) -> bool {
        self.calls().contains(&Call::Start)
    }

    /// Checks start-first, finish-last, exactly once each.
    pub fn assert_well_formed(&self) {
        let calls = self.calls();
        assert_eq!(calls.first(), Some(&Call::Start), "calls: {calls:?}");
        assert_eq!(calls.last(), Some(&Call::Finish), "calls: {calls:?}");
        assert_eq!(calls.iter().filter(|c| **c == Call::Start).count(), 1);
        assert_eq!(calls.iter().filter(|c| **c == Call::Finish).count(), 1);
    }
}

impl Listener for Recorder {
    fn on_start(&mut self) {
        self.0.lock().unwrap().push(Call::Start);
    }

    fn on_read(&mut self, chunk: Vec<u8>) {
        self.0.lock().unwrap().push(Call::Read(chunk));
    }

    fn on_fault(&mut self, _error: &ReaderError) {
        self.0.lock().unwrap().push(Call::Fault);
    }

    fn on_finish(&mut self) {
        self.0.lock().unwrap().push(Call::Finish);
    }
}
