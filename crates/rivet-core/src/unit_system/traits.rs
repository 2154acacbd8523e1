use std::fmt;

use async_trait::async_trait;
use log::Level;

use crate::kernel::error::Result;

/// A live unit instance produced by a construct hook.
///
/// Instances are shared as `Arc<dyn Unit>`, so any state that changes after
/// construction needs interior mutability. Capabilities are exposed through
/// the `as_*` views instead of downcasting.
pub trait Unit: Send + Sync + fmt::Debug {
    /// Release resources held by the instance. Called once, in reverse
    /// construction order, during the close phase.
    fn close(&self) -> Result<()> {
        Ok(())
    }

    /// Logger view of this instance, if it is one
    fn as_logger(&self) -> Option<&(dyn Logger + 'static)> {
        None
    }

    /// Server view of this instance, if it is one
    fn as_server(&self) -> Option<&(dyn Server + 'static)> {
        None
    }
}

/// A named interface that can be requested from a [`Unit`] instance
pub trait Capability {
    /// Name used in lookup errors
    const NAME: &'static str;

    /// View `unit` as this capability, or `None` when unsupported
    fn view(unit: &dyn Unit) -> Option<&Self>;
}

/// Levelled diagnostic sink, provided by the baseline unit
pub trait Logger: Send + Sync {
    fn log(&self, level: Level, message: &str);

    /// Whether debug output is enabled
    fn is_debug(&self) -> bool;

    fn error(&self, message: &str) {
        self.log(Level::Error, message);
    }

    fn warn(&self, message: &str) {
        self.log(Level::Warn, message);
    }

    fn info(&self, message: &str) {
        self.log(Level::Info, message);
    }

    fn debug(&self, message: &str) {
        self.log(Level::Debug, message);
    }
}

impl Capability for dyn Logger {
    const NAME: &'static str = "Logger";

    fn view(unit: &dyn Unit) -> Option<&Self> {
        unit.as_logger()
    }
}

/// A long-running service the application blocks on
#[async_trait]
pub trait Server: Send + Sync {
    /// Serve until shut down
    async fn serve(&self) -> Result<()>;

    /// Ask a running `serve` call to return
    fn shutdown(&self);
}

impl Capability for dyn Server {
    const NAME: &'static str = "Server";

    fn view(unit: &dyn Unit) -> Option<&Self> {
        unit.as_server()
    }
}
