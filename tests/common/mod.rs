//! Shared utilities for integration testing.

use std::collections::HashMap;
use std::sync::Mutex;

use graceful_serve::Diagnostics;

/// Diagnostics implementation that records every event for assertions.
///
/// Info events render as `"message: key:value,key:value"` with no trailing
/// separator, matching the log shape the tests assert on.
#[derive(Default)]
pub struct RecordingDiagnostics {
    logs: Mutex<Vec<String>>,
    startups: Mutex<u32>,
    shutdowns: Mutex<u32>,
}

impl RecordingDiagnostics {
    #[allow(dead_code)]
    pub fn logs(&self) -> Vec<String> {
        self.logs.lock().unwrap().clone()
    }

    #[allow(dead_code)]
    pub fn startups(&self) -> u32 {
        *self.startups.lock().unwrap()
    }

    #[allow(dead_code)]
    pub fn shutdowns(&self) -> u32 {
        *self.shutdowns.lock().unwrap()
    }
}

impl Diagnostics for RecordingDiagnostics {
    fn on_start_up(&self) {
        *self.startups.lock().unwrap() += 1;
    }

    fn on_shutdown(&self) {
        *self.shutdowns.lock().unwrap() += 1;
    }

    fn info(&self, message: &str, attributes: HashMap<String, String>) {
        let mut rendered: Vec<String> = attributes
            .into_iter()
            .map(|(key, value)| format!("{key}:{value}"))
            .collect();
        rendered.sort();
        self.logs
            .lock()
            .unwrap()
            .push(format!("{message}: {}", rendered.join(",")));
    }

    fn write_diagnostic(&self, bytes: &[u8]) {
        self.logs
            .lock()
            .unwrap()
            .push(String::from_utf8_lossy(bytes).into_owned());
    }
}
