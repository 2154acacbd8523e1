/// Application name
pub const APP_NAME: &str = "rivet";

/// Application version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Name of the unit implicitly required by every plan
pub const BASELINE_UNIT: &str = "logger";

/// Name of the unit a server application blocks on
pub const SERVER_UNIT: &str = "server";

/// Environment variable naming a flag defaults file
pub const DEFAULTS_FILE_ENV: &str = "RIVET_CONFIG";

/// Exit status for a successful run
pub const EXIT_SUCCESS: i32 = 0;

/// Exit status for any configure, parse, construct or internal failure
pub const EXIT_FAILURE: i32 = 1;

/// Exit status after printing usage
pub const EXIT_HELP: i32 = 2;

/// Exit status after printing the version
pub const EXIT_VERSION: i32 = 3;
