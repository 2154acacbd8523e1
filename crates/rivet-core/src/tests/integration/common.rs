#![cfg(test)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use log::Level;

use crate::kernel::constants::{BASELINE_UNIT, SERVER_UNIT};
use crate::kernel::error::{Error, Result};
use crate::unit_system::{Logger, Server, Unit, UnitDescriptor, UnitRegistry};

/// Shared record of hook calls, e.g. `construct:storage`, `close:storage`
pub type Journal = Arc<Mutex<Vec<String>>>;

pub fn journal() -> Journal {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn record(journal: &Journal, entry: impl Into<String>) {
    journal.lock().unwrap().push(entry.into());
}

pub fn entries(journal: &Journal) -> Vec<String> {
    journal.lock().unwrap().clone()
}

/// Entries starting with `prefix:`, prefix stripped
pub fn entries_for(journal: &Journal, prefix: &str) -> Vec<String> {
    let prefix = format!("{}:", prefix);
    entries(journal)
        .into_iter()
        .filter_map(|e| e.strip_prefix(&prefix).map(str::to_string))
        .collect()
}

// ===== MOCK UNITS =====

#[derive(Debug)]
pub struct RecordingUnit {
    pub name: String,
    journal: Journal,
    fail_close: bool,
}

impl Unit for RecordingUnit {
    fn close(&self) -> Result<()> {
        record(&self.journal, format!("close:{}", self.name));
        if self.fail_close {
            return Err(Error::from(format!("{} refused to close", self.name)));
        }
        Ok(())
    }
}

#[derive(Debug)]
pub struct TestLogger {
    pub messages: Mutex<Vec<(Level, String)>>,
    journal: Journal,
}

impl Unit for TestLogger {
    fn close(&self) -> Result<()> {
        record(&self.journal, format!("close:{}", BASELINE_UNIT));
        Ok(())
    }

    fn as_logger(&self) -> Option<&(dyn Logger + 'static)> {
        Some(self)
    }
}

impl Logger for TestLogger {
    fn log(&self, level: Level, message: &str) {
        self.messages.lock().unwrap().push((level, message.to_string()));
    }

    fn is_debug(&self) -> bool {
        false
    }
}

/// Server whose `serve` returns as soon as it is called
#[derive(Debug)]
pub struct TestServer {
    journal: Journal,
    fail_serve: bool,
    pub served: AtomicBool,
}

impl Unit for TestServer {
    fn close(&self) -> Result<()> {
        record(&self.journal, format!("close:{}", SERVER_UNIT));
        Ok(())
    }

    fn as_server(&self) -> Option<&(dyn Server + 'static)> {
        Some(self)
    }
}

#[async_trait]
impl Server for TestServer {
    async fn serve(&self) -> Result<()> {
        record(&self.journal, "serve");
        self.served.store(true, Ordering::SeqCst);
        if self.fail_serve {
            return Err(Error::from("listener died"));
        }
        Ok(())
    }

    fn shutdown(&self) {}
}

// ===== DESCRIPTORS =====

fn recording_unit(name: &str, deps: &[&str], journal: &Journal, fail_close: bool) -> UnitDescriptor {
    let unit_name = name.to_string();
    let journal = Arc::clone(journal);
    UnitDescriptor::new(name)
        .depends_on(deps.iter().copied())
        .on_construct(move |_ctx| {
            record(&journal, format!("construct:{}", unit_name));
            let unit: Arc<dyn Unit> = Arc::new(RecordingUnit {
                name: unit_name.clone(),
                journal: Arc::clone(&journal),
                fail_close,
            });
            Ok(Some(unit))
        })
}

/// Unit that records construction and close
pub fn recording(name: &str, deps: &[&str], journal: &Journal) -> UnitDescriptor {
    recording_unit(name, deps, journal, false)
}

/// Unit whose close fails
pub fn failing_close(name: &str, deps: &[&str], journal: &Journal) -> UnitDescriptor {
    recording_unit(name, deps, journal, true)
}

/// Unit whose construct hook fails after recording the attempt
pub fn failing_construct(name: &str, deps: &[&str], journal: &Journal) -> UnitDescriptor {
    let unit_name = name.to_string();
    let journal = Arc::clone(journal);
    UnitDescriptor::new(name)
        .depends_on(deps.iter().copied())
        .on_construct(move |_ctx| {
            record(&journal, format!("construct:{}", unit_name));
            Err(Error::from("disk unavailable"))
        })
}

/// Baseline unit providing a [`TestLogger`]
pub fn test_logger(journal: &Journal) -> UnitDescriptor {
    let journal = Arc::clone(journal);
    UnitDescriptor::new(BASELINE_UNIT).on_construct(move |_ctx| {
        record(&journal, format!("construct:{}", BASELINE_UNIT));
        let unit: Arc<dyn Unit> = Arc::new(TestLogger {
            messages: Mutex::new(Vec::new()),
            journal: Arc::clone(&journal),
        });
        Ok(Some(unit))
    })
}

/// `server` unit providing a [`TestServer`]
pub fn test_server(journal: &Journal, fail_serve: bool) -> UnitDescriptor {
    let journal = Arc::clone(journal);
    UnitDescriptor::new(SERVER_UNIT)
        .depends_on([BASELINE_UNIT])
        .on_construct(move |_ctx| {
            record(&journal, format!("construct:{}", SERVER_UNIT));
            let unit: Arc<dyn Unit> = Arc::new(TestServer {
                journal: Arc::clone(&journal),
                fail_serve,
                served: AtomicBool::new(false),
            });
            Ok(Some(unit))
        })
}

/// Registry holding the test logger plus `descriptors`
pub fn registry_with(journal: &Journal, descriptors: Vec<UnitDescriptor>) -> Arc<UnitRegistry> {
    let mut registry = UnitRegistry::new();
    registry.register(test_logger(journal)).unwrap();
    for descriptor in descriptors {
        registry.register(descriptor).unwrap();
    }
    Arc::new(registry)
}
