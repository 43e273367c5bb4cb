//! Capture `LEVEL: message` log output for assertions
#![allow(dead_code)]

use std::io;
use std::sync::{Arc, Mutex};

use impress_tei::logging;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::EnvFilter;

#[derive(Clone, Default)]
pub struct LogCapture(Arc<Mutex<Vec<u8>>>);

impl LogCapture {
    pub fn contents(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }

    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(str::to_string).collect()
    }
}

impl io::Write for LogCapture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogCapture {
    type Writer = LogCapture;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Run `f` with an info-level subscriber scoped to this thread.
pub fn with_captured_logs<T>(f: impl FnOnce() -> T) -> (T, LogCapture) {
    let capture = LogCapture::default();
    let subscriber = logging::subscriber(EnvFilter::new("info"), capture.clone());
    let value = tracing::subscriber::with_default(subscriber, f);
    (value, capture)
}
