//! In-memory batch sinks that can be switched into failure.

use std::io::{self, Write};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use evb_core::batch::{BatchSink, SinkOpener};

#[derive(Default)]
pub(crate) struct SinkSwitch {
    failing: AtomicBool,
}

impl SinkSwitch {
    pub(crate) fn fail(&self, on: bool) {
        self.failing.store(on, Ordering::SeqCst);
    }

    fn check(&self) -> io::Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(io::Error::other("device unavailable"));
        }
        Ok(())
    }
}

pub(crate) struct FlakyOpener(pub Arc<SinkSwitch>);

struct FlakySink(Arc<SinkSwitch>);

impl Write for FlakySink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.check()?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.0.check()
    }
}

impl BatchSink for FlakySink {
    fn sync(&mut self) -> io::Result<()> {
        self.0.check()
    }
}

impl SinkOpener for FlakyOpener {
    fn open_new(&self, _path: &Path) -> io::Result<Box<dyn BatchSink>> {
        Ok(Box::new(FlakySink(Arc::clone(&self.0))))
    }
}
