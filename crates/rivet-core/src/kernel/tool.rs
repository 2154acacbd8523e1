use std::ffi::OsString;
use std::io;

use crate::kernel::bootstrap::Application;
use crate::kernel::constants::{EXIT_SUCCESS, SERVER_UNIT};
use crate::kernel::error::Result;
use crate::unit_system::traits::Server;

/// Runs a main function between start and close.
#[derive(Debug)]
pub struct CommandTool {
    app: Application,
    units: Vec<String>,
}

impl CommandTool {
    pub fn new<I, S>(app: Application, units: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            app,
            units: units.into_iter().map(Into::into).collect(),
        }
    }

    pub fn application(&self) -> &Application {
        &self.app
    }

    /// Initialize, start, call `main` and close. Returns the exit status.
    pub fn run<I, T, F>(&mut self, args: I, main: F) -> i32
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
        F: FnOnce(&Application) -> Result<()>,
    {
        if let Err(status) = prepare(&mut self.app, &self.units, args) {
            return status;
        }
        let status = match main(&self.app) {
            Ok(()) => EXIT_SUCCESS,
            Err(e) => self.app.report(&e, &mut io::stderr()),
        };
        finish(&mut self.app, status)
    }
}

/// Starts the requested units plus the `server` unit and blocks on it.
#[derive(Debug)]
pub struct ServerTool {
    app: Application,
    units: Vec<String>,
}

impl ServerTool {
    pub fn new<I, S>(app: Application, units: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut units: Vec<String> = units.into_iter().map(Into::into).collect();
        if !units.iter().any(|unit| unit == SERVER_UNIT) {
            units.push(SERVER_UNIT.to_string());
        }
        Self { app, units }
    }

    pub fn application(&self) -> &Application {
        &self.app
    }

    /// Initialize, start, serve until shut down and close. Returns the exit status.
    pub async fn run<I, T>(&mut self, args: I) -> i32
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        if let Err(status) = prepare(&mut self.app, &self.units, args) {
            return status;
        }

        let handle = match self.app.instances().lookup(SERVER_UNIT) {
            Ok(handle) => handle,
            Err(e) => {
                let status = self.app.report(&e, &mut io::stderr());
                return finish(&mut self.app, status);
            }
        };
        let served = match handle.capability::<dyn Server>() {
            Ok(server) => {
                log::info!("Serving with {}", handle.unit());
                server.serve().await
            }
            Err(e) => Err(e),
        };

        let status = match served {
            Ok(()) => EXIT_SUCCESS,
            Err(e) => {
                log::error!("Server failed: {}", e);
                self.app.report(&e, &mut io::stderr())
            }
        };
        finish(&mut self.app, status)
    }
}

/// Init and start, closing whatever was built when either fails
fn prepare<I, T>(app: &mut Application, units: &[String], args: I) -> std::result::Result<(), i32>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let started = app.init(units).and_then(|()| app.start(args));
    match started {
        Ok(()) => Ok(()),
        Err(e) => {
            let status = app.report(&e, &mut io::stderr());
            if let Err(close) = app.close() {
                log::error!("Error closing {} after a failed start: {}", app.name(), close);
            }
            Err(status)
        }
    }
}

/// Close the application. A close failure only changes a successful status.
fn finish(app: &mut Application, status: i32) -> i32 {
    match app.close() {
        Ok(()) => status,
        Err(e) => {
            let close_status = app.report(&e, &mut io::stderr());
            if status == EXIT_SUCCESS {
                close_status
            } else {
                status
            }
        }
    }
}
