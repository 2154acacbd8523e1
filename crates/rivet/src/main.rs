use std::env;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use rivet_core::kernel::constants::{APP_NAME, DEFAULTS_FILE_ENV, EXIT_FAILURE};
use rivet_core::kernel::{Application, ServerTool};
use rivet_core::UnitRegistry;

/// Register the units built into the binary
fn registry() -> Result<UnitRegistry, rivet_core::KernelError> {
    let mut registry = UnitRegistry::new();
    registry.register(core_logging::descriptor())?;
    registry.register(core_server::descriptor())?;
    Ok(registry)
}

fn status(code: i32) -> ExitCode {
    ExitCode::from(u8::try_from(code).unwrap_or(1))
}

#[tokio::main]
async fn main() -> ExitCode {
    let registry = match registry() {
        Ok(registry) => Arc::new(registry),
        Err(e) => {
            eprintln!("{}: {}", APP_NAME, e);
            return status(EXIT_FAILURE);
        }
    };

    let mut app = Application::new(APP_NAME, registry)
        .with_about("Rivet unit runtime: resolves, constructs and serves a set of units");

    // Flag defaults may come from a file named in the environment
    if let Some(path) = env::var_os(DEFAULTS_FILE_ENV).map(PathBuf::from) {
        app = match app.with_defaults_file(&path) {
            Ok(app) => app,
            Err(e) => {
                eprintln!("{}: {}", APP_NAME, e);
                return status(EXIT_FAILURE);
            }
        };
    }

    let mut tool = ServerTool::new(app, Vec::<String>::new());
    let code = tool.run(env::args_os()).await;
    log::debug!("{} exiting with status {}", APP_NAME, code);
    status(code)
}
