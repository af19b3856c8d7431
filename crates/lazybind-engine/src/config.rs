//! Binder configuration
//!
//! The recognized option record. Hosts may deserialize it from their own
//! settings format; everything defaults to the conservative production
//! values.

use serde::{Deserialize, Serialize};

/// Log verbosity floor; messages below the configured level are skipped.
///
/// Ordering follows the original gate: `Info` lets everything through,
/// `Error` only failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Informational, including per-binding install/evict traces
    Info = 0,
    /// Resolution step traces
    Debug = 1,
    /// Unusual but recoverable situations
    Warn = 2,
    /// Failures only
    Error = 3,
}

/// Recognized configuration options for a binder
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BinderConfig {
    /// Resolve nested types lazily instead of at class import
    pub inner_class_lazy: bool,
    /// Track touched classes so `clear`/`dump` can enumerate bindings
    pub track_evictions: bool,
    /// Recognize the `$name` simplified generic-call convention
    pub simplified_generic_calls: bool,
    /// Memoize instantiated generic callables per signature
    pub cache_generic_methods: bool,
    /// Accumulate resolution wall time into the binder's profile counter
    pub profile_resolution: bool,
    /// Record member names on installed method slots
    pub preserve_binding_names: bool,
    /// Log verbosity floor
    pub log_level: LogLevel,
}

impl Default for BinderConfig {
    fn default() -> Self {
        Self {
            inner_class_lazy: true,
            track_evictions: true,
            simplified_generic_calls: false,
            cache_generic_methods: true,
            profile_resolution: false,
            preserve_binding_names: false,
            log_level: LogLevel::Error,
        }
    }
}
