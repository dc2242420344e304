//! Session configuration.
use std::fmt;

use serde::{Deserialize, Serialize};

/// Where the engine writes its progress messages.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Output {
    /// Emit messages through the `log` facade at info level.
    Log,
    Stdout,
    Stderr,
}

impl Default for Output {
    fn default() -> Output {
        Output::Log
    }
}

/// Options fixed when a [`Session`](crate::Session) is created.
///
/// Deserializable so that it can be read from a configuration file; missing keys keep their
/// defaults.
#[derive(Clone, Eq, PartialEq, Debug, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionConfig {
    /// Bound on the work of each solve call; the call reports `Unknown` when exhausted.
    /// (Default: 0, no limit)
    pub propagation_limit: u64,

    /// Destination of engine messages. (Default: log)
    pub output: Output,

    /// Engine message verbosity, 0 is silent. (Default: 0)
    pub verbosity: u32,

    /// Prefix of every engine message line. (Default: "c ")
    pub prefix: String,

    /// Count the time of every session call, not only solve calls. (Default: false)
    pub measure_all_calls: bool,

    /// Keep what the engine needs to write clausal cores and proof traces. (Default: false)
    pub enable_trace_generation: bool,
}

impl Default for SessionConfig {
    fn default() -> SessionConfig {
        SessionConfig {
            propagation_limit: 0,
            output: Output::default(),
            verbosity: 0,
            prefix: "c ".to_owned(),
            measure_all_calls: false,
            enable_trace_generation: false,
        }
    }
}

impl SessionConfig {
    /// Help text listing all options and their defaults.
    pub fn help() -> impl fmt::Display {
        struct Help;

        impl fmt::Display for Help {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                let defaults = SessionConfig::default();
                writeln!(f, "Session options (TOML syntax, e.g. -C 'verbosity = 1'):")?;
                writeln!(
                    f,
                    "  propagation_limit = {}  work bound per solve call, 0 for none",
                    defaults.propagation_limit
                )?;
                writeln!(
                    f,
                    "  output = \"log\"  engine messages to \"log\", \"stdout\" or \"stderr\""
                )?;
                writeln!(f, "  verbosity = {}  engine message detail", defaults.verbosity)?;
                writeln!(f, "  prefix = {:?}  engine message prefix", defaults.prefix)?;
                writeln!(
                    f,
                    "  measure_all_calls = {}  time every call instead of only solve",
                    defaults.measure_all_calls
                )?;
                writeln!(
                    f,
                    "  enable_trace_generation = {}  allow cores and traces",
                    defaults.enable_trace_generation
                )
            }
        }

        Help
    }
}
