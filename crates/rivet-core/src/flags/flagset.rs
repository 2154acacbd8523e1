use std::collections::HashMap;
use std::ffi::OsString;
use std::fmt;

use clap::error::ErrorKind;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};

use crate::flags::defaults::FlagDefaults;
use crate::flags::error::FlagError;

/// Id of the positional argument collecting everything that is not a flag
const ARGS_ID: &str = "__args";

/// Names clap reserves for its own flags
const RESERVED_NAMES: &[&str] = &["help", "version", ARGS_ID];

/// The value type of a flag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlagKind {
    Bool,
    String,
    Int,
    Uint,
    Float,
}

impl fmt::Display for FlagKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FlagKind::Bool => "bool",
            FlagKind::String => "string",
            FlagKind::Int => "int",
            FlagKind::Uint => "uint",
            FlagKind::Float => "float",
        };
        write!(f, "{}", name)
    }
}

/// A typed flag value
#[derive(Debug, Clone, PartialEq)]
pub enum FlagValue {
    Bool(bool),
    String(String),
    Int(i64),
    Uint(u64),
    Float(f64),
}

impl FlagValue {
    pub fn kind(&self) -> FlagKind {
        match self {
            FlagValue::Bool(_) => FlagKind::Bool,
            FlagValue::String(_) => FlagKind::String,
            FlagValue::Int(_) => FlagKind::Int,
            FlagValue::Uint(_) => FlagKind::Uint,
            FlagValue::Float(_) => FlagKind::Float,
        }
    }

    /// Convert a scalar from a defaults file into a value of `kind`
    pub fn from_json(kind: FlagKind, value: &serde_json::Value) -> Option<Self> {
        use serde_json::Value;
        match (kind, value) {
            (FlagKind::Bool, Value::Bool(b)) => Some(FlagValue::Bool(*b)),
            (FlagKind::String, Value::String(s)) => Some(FlagValue::String(s.clone())),
            (FlagKind::String, Value::Number(n)) => Some(FlagValue::String(n.to_string())),
            (FlagKind::Int, Value::Number(n)) => n.as_i64().map(FlagValue::Int),
            (FlagKind::Uint, Value::Number(n)) => n.as_u64().map(FlagValue::Uint),
            (FlagKind::Float, Value::Number(n)) => n.as_f64().map(FlagValue::Float),
            _ => None,
        }
    }
}

impl fmt::Display for FlagValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlagValue::Bool(v) => write!(f, "{}", v),
            FlagValue::String(v) => write!(f, "{}", v),
            FlagValue::Int(v) => write!(f, "{}", v),
            FlagValue::Uint(v) => write!(f, "{}", v),
            FlagValue::Float(v) => write!(f, "{}", v),
        }
    }
}

/// A registered flag definition
#[derive(Debug, Clone)]
pub struct Flag {
    pub name: String,
    pub usage: String,
    pub default: FlagValue,
}

impl Flag {
    pub fn kind(&self) -> FlagKind {
        self.default.kind()
    }

    fn to_arg(&self) -> Arg {
        let arg = Arg::new(self.name.clone())
            .long(self.name.clone())
            .help(self.usage.clone())
            .default_value(self.default.to_string());
        match self.kind() {
            // `--debug` and `--debug=false` are both accepted
            FlagKind::Bool => arg
                .num_args(0..=1)
                .require_equals(true)
                .default_missing_value("true")
                .value_parser(value_parser!(bool))
                .action(ArgAction::Set),
            FlagKind::String => arg.value_parser(value_parser!(String)).action(ArgAction::Set),
            FlagKind::Int => arg
                .allow_negative_numbers(true)
                .value_parser(value_parser!(i64))
                .action(ArgAction::Set),
            FlagKind::Uint => arg.value_parser(value_parser!(u64)).action(ArgAction::Set),
            FlagKind::Float => arg
                .allow_negative_numbers(true)
                .value_parser(value_parser!(f64))
                .action(ArgAction::Set),
        }
    }

    fn read(&self, matches: &ArgMatches) -> FlagValue {
        let id = self.name.as_str();
        let parsed = match self.kind() {
            FlagKind::Bool => matches.get_one::<bool>(id).copied().map(FlagValue::Bool),
            FlagKind::String => matches.get_one::<String>(id).cloned().map(FlagValue::String),
            FlagKind::Int => matches.get_one::<i64>(id).copied().map(FlagValue::Int),
            FlagKind::Uint => matches.get_one::<u64>(id).copied().map(FlagValue::Uint),
            FlagKind::Float => matches.get_one::<f64>(id).copied().map(FlagValue::Float),
        };
        parsed.unwrap_or_else(|| self.default.clone())
    }
}

/// Command-line flag surface shared by every unit of an application.
///
/// Flags are registered before [`parse`](FlagSet::parse); getters return the
/// parsed value afterwards and the default before.
#[derive(Debug, Clone)]
pub struct FlagSet {
    name: String,
    version: Option<String>,
    about: Option<String>,
    /// Registered flags, in registration order
    flags: Vec<Flag>,
    /// Parsed values, present once `parse` succeeded
    values: Option<HashMap<String, FlagValue>>,
    /// Positional arguments
    args: Vec<String>,
}

impl FlagSet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: None,
            about: None,
            flags: Vec::new(),
            values: None,
            args: Vec::new(),
        }
    }

    /// Enable `--version`, printing `version`
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn with_about(mut self, about: impl Into<String>) -> Self {
        self.about = Some(about.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_parsed(&self) -> bool {
        self.values.is_some()
    }

    pub fn has_flag(&self, name: &str) -> bool {
        self.flag(name).is_some()
    }

    /// Registered flags, in registration order
    pub fn flags(&self) -> &[Flag] {
        &self.flags
    }

    pub fn flag_bool(&mut self, name: &str, default: bool, usage: &str) -> Result<(), FlagError> {
        self.register(name, FlagValue::Bool(default), usage)
    }

    pub fn flag_string(&mut self, name: &str, default: &str, usage: &str) -> Result<(), FlagError> {
        self.register(name, FlagValue::String(default.to_string()), usage)
    }

    pub fn flag_int(&mut self, name: &str, default: i64, usage: &str) -> Result<(), FlagError> {
        self.register(name, FlagValue::Int(default), usage)
    }

    pub fn flag_uint(&mut self, name: &str, default: u64, usage: &str) -> Result<(), FlagError> {
        self.register(name, FlagValue::Uint(default), usage)
    }

    pub fn flag_float(&mut self, name: &str, default: f64, usage: &str) -> Result<(), FlagError> {
        self.register(name, FlagValue::Float(default), usage)
    }

    fn register(&mut self, name: &str, default: FlagValue, usage: &str) -> Result<(), FlagError> {
        if self.is_parsed() {
            return Err(FlagError::AlreadyParsed(self.name.clone()));
        }
        validate_name(name)?;
        if self.has_flag(name) {
            return Err(FlagError::DuplicateFlag(name.to_string()));
        }
        log::trace!("Registering flag --{} ({}, default {})", name, default.kind(), default);
        self.flags.push(Flag {
            name: name.to_string(),
            usage: usage.to_string(),
            default,
        });
        Ok(())
    }

    /// Override the defaults of registered flags. Keys without a matching flag
    /// are skipped with a warning.
    pub fn apply_defaults(&mut self, defaults: &FlagDefaults) -> Result<(), FlagError> {
        if self.is_parsed() {
            return Err(FlagError::AlreadyParsed(self.name.clone()));
        }
        for (key, value) in defaults.iter() {
            let Some(flag) = self.flags.iter_mut().find(|f| f.name == *key) else {
                log::warn!("Ignoring default for unknown flag '--{}'", key);
                continue;
            };
            let converted = FlagValue::from_json(flag.kind(), value).ok_or_else(|| FlagError::InvalidValue {
                name: key.clone(),
                reason: format!("expected a {} value, found {}", flag.kind(), value),
            })?;
            log::debug!("Default for --{} set to {}", key, converted);
            flag.default = converted;
        }
        Ok(())
    }

    /// Parse the command line. The first element is the program name.
    pub fn parse<I, T>(&mut self, args: I) -> Result<(), FlagError>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        if self.is_parsed() {
            return Err(FlagError::AlreadyParsed(self.name.clone()));
        }
        let matches = match self.command().try_get_matches_from(args) {
            Ok(matches) => matches,
            Err(err) => {
                return Err(match err.kind() {
                    ErrorKind::DisplayHelp | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
                        FlagError::HelpRequested
                    }
                    ErrorKind::DisplayVersion => FlagError::VersionRequested,
                    _ => FlagError::Parse(err.to_string().trim_end().to_string()),
                });
            }
        };

        let values = self
            .flags
            .iter()
            .map(|flag| (flag.name.clone(), flag.read(&matches)))
            .collect();
        self.args = matches
            .get_many::<String>(ARGS_ID)
            .map(|values| values.cloned().collect())
            .unwrap_or_default();
        self.values = Some(values);
        Ok(())
    }

    /// Positional arguments left after the flags
    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn get(&self, name: &str) -> Result<&FlagValue, FlagError> {
        if let Some(values) = &self.values {
            if let Some(value) = values.get(name) {
                return Ok(value);
            }
        }
        self.flag(name)
            .map(|flag| &flag.default)
            .ok_or_else(|| FlagError::UnknownFlag(name.to_string()))
    }

    pub fn get_bool(&self, name: &str) -> Result<bool, FlagError> {
        match self.get(name)? {
            FlagValue::Bool(value) => Ok(*value),
            other => Err(mismatch(name, FlagKind::Bool, other)),
        }
    }

    pub fn get_string(&self, name: &str) -> Result<&str, FlagError> {
        match self.get(name)? {
            FlagValue::String(value) => Ok(value),
            other => Err(mismatch(name, FlagKind::String, other)),
        }
    }

    pub fn get_int(&self, name: &str) -> Result<i64, FlagError> {
        match self.get(name)? {
            FlagValue::Int(value) => Ok(*value),
            other => Err(mismatch(name, FlagKind::Int, other)),
        }
    }

    pub fn get_uint(&self, name: &str) -> Result<u64, FlagError> {
        match self.get(name)? {
            FlagValue::Uint(value) => Ok(*value),
            other => Err(mismatch(name, FlagKind::Uint, other)),
        }
    }

    pub fn get_float(&self, name: &str) -> Result<f64, FlagError> {
        match self.get(name)? {
            FlagValue::Float(value) => Ok(*value),
            other => Err(mismatch(name, FlagKind::Float, other)),
        }
    }

    /// Rendered usage text
    pub fn usage(&self) -> String {
        self.command().render_help().to_string()
    }

    /// Rendered version line, when a version was set
    pub fn version(&self) -> Option<String> {
        self.version.as_ref().map(|_| self.command().render_version())
    }

    fn flag(&self, name: &str) -> Option<&Flag> {
        self.flags.iter().find(|f| f.name == name)
    }

    fn command(&self) -> Command {
        let mut command = Command::new(self.name.clone());
        command = match &self.version {
            Some(version) => command.version(version.clone()),
            None => command.disable_version_flag(true),
        };
        if let Some(about) = &self.about {
            command = command.about(about.clone());
        }
        for flag in &self.flags {
            command = command.arg(flag.to_arg());
        }
        command.arg(
            Arg::new(ARGS_ID)
                .value_name("ARGS")
                .num_args(0..)
                .action(ArgAction::Append)
                .value_parser(value_parser!(String)),
        )
    }
}

fn mismatch(name: &str, expected: FlagKind, actual: &FlagValue) -> FlagError {
    FlagError::TypeMismatch {
        name: name.to_string(),
        expected,
        actual: actual.kind(),
    }
}

fn validate_name(name: &str) -> Result<(), FlagError> {
    let invalid = |reason: &str| FlagError::InvalidName {
        name: name.to_string(),
        reason: reason.to_string(),
    };
    if name.is_empty() {
        return Err(invalid("name is empty"));
    }
    if name.starts_with('-') {
        return Err(invalid("name must not start with '-'"));
    }
    if RESERVED_NAMES.contains(&name) {
        return Err(invalid("name is reserved"));
    }
    if !name.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')) {
        return Err(invalid("only ASCII letters, digits, '-', '_' and '.' are allowed"));
    }
    Ok(())
}
