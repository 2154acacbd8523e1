//! # Core Server
//!
//! The `server` unit a [`ServerTool`](rivet_core::kernel::ServerTool) blocks on.
//!
//! `serve()` returns on the first of: an interrupt (ctrl-c), a call to
//! `shutdown()` (which closing the unit also does), or the optional
//! `--shutdown-after` timer.
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rivet_core::kernel::constants::{BASELINE_UNIT, SERVER_UNIT};
use rivet_core::kernel::error::{Error, Result};
use rivet_core::{FlagSet, Logger, Server, Unit, UnitContext, UnitDescriptor};
use tokio::sync::Notify;

pub const FLAG_SHUTDOWN_AFTER: &str = "shutdown-after";

#[derive(Debug)]
pub struct SignalServer {
    shutdown_after: Option<Duration>,
    shutdown: Notify,
}

impl SignalServer {
    /// `None` waits for an interrupt or an explicit shutdown
    pub fn new(shutdown_after: Option<Duration>) -> Self {
        Self {
            shutdown_after,
            shutdown: Notify::new(),
        }
    }

    pub fn shutdown_after(&self) -> Option<Duration> {
        self.shutdown_after
    }

    async fn timer(&self) {
        match self.shutdown_after {
            Some(duration) => tokio::time::sleep(duration).await,
            None => std::future::pending().await,
        }
    }
}

impl Unit for SignalServer {
    fn close(&self) -> Result<()> {
        self.shutdown();
        Ok(())
    }

    fn as_server(&self) -> Option<&(dyn Server + 'static)> {
        Some(self)
    }
}

#[async_trait]
impl Server for SignalServer {
    async fn serve(&self) -> Result<()> {
        log::info!("Server started");
        tokio::select! {
            _ = self.shutdown.notified() => log::info!("Server shutdown requested"),
            _ = self.timer() => log::info!("Server shutdown timer elapsed"),
            signal = tokio::signal::ctrl_c() => match signal {
                Ok(()) => log::info!("Interrupt received, stopping server"),
                Err(e) => return Err(Error::Io(e)),
            },
        }
        log::info!("Server stopped");
        Ok(())
    }

    // A permit is stored when nobody is waiting, so a shutdown before
    // `serve` makes the next `serve` return at once
    fn shutdown(&self) {
        self.shutdown.notify_one();
    }
}

pub fn configure(flags: &mut FlagSet) -> Result<()> {
    flags.flag_uint(
        FLAG_SHUTDOWN_AFTER,
        0,
        "Stop the server after this many seconds (0 waits for an interrupt)",
    )?;
    Ok(())
}

pub fn construct(ctx: &UnitContext<'_>) -> Result<Option<Arc<dyn Unit>>> {
    let seconds = ctx.flags().get_uint(FLAG_SHUTDOWN_AFTER)?;
    let shutdown_after = (seconds > 0).then(|| Duration::from_secs(seconds));

    let logger = ctx.capability::<dyn Logger>(BASELINE_UNIT)?;
    match shutdown_after {
        Some(duration) => logger.debug(&format!("Server will stop after {:?}", duration)),
        None => logger.debug("Server will run until interrupted"),
    }

    let unit: Arc<dyn Unit> = Arc::new(SignalServer::new(shutdown_after));
    Ok(Some(unit))
}

/// Descriptor for the `server` unit
pub fn descriptor() -> UnitDescriptor {
    UnitDescriptor::new(SERVER_UNIT)
        .depends_on([BASELINE_UNIT])
        .on_configure(configure)
        .on_construct(construct)
}
