//! Eviction and dump engine
//!
//! Bindings accumulate until the host explicitly clears them; `clear`
//! removes everything this engine installed on the touched classes and
//! resets the caches, `dump` emits a replay script that would
//! re-register the current binding set eagerly.

use std::fs;
use std::io;
use std::path::Path;

use tracing::info;

use lazybind_sdk::NativeReflector;

use crate::binder::{is_reserved_static, Binder};
use crate::class::{ClassId, CONSTRUCTOR_SLOT};
use crate::config::LogLevel;

/// One replay statement; generic-arity class names (backtick marker)
/// are not valid identifiers on the script side, so they are emitted as
/// comments.
fn replay_line(class_name: &str, member: &str, is_static: bool) -> String {
    let stmt = format!("AddAPI(CSharp.{class_name}, '{member}', {is_static})");
    if class_name.contains('`') {
        format!("// {stmt}")
    } else {
        stmt
    }
}

impl<R: NativeReflector> Binder<R> {
    /// Remove every binding installed since the last clear and reset the
    /// caches. Returns a human-readable log of the removals; an empty
    /// string when eviction tracking is disabled.
    ///
    /// Classes the host registered without lazy participation only lose
    /// their recorded extension methods; everything else keeps its
    /// pre-registered (non-configurable) members untouched.
    pub fn clear(&mut self) -> String {
        if !self.config.track_evictions {
            return String::new();
        }
        let mut lines = Vec::new();
        let mut touched: Vec<ClassId> = self.touched.iter().copied().collect();
        touched.sort_unstable();

        for class_id in touched {
            let Some(class) = self.registry.get_mut(class_id) else {
                continue;
            };
            let class_name = class.name.clone();

            if !class.lazy_enabled {
                for member in std::mem::take(&mut class.extension_methods) {
                    class.instance_members.remove(&member);
                    lines.push(format!("{class_name}::{member} instance cleared"));
                }
                class.negative_cache.clear();
                continue;
            }

            let mut static_names: Vec<String> = class
                .static_members
                .iter()
                .filter(|(name, slot)| slot.configurable && !is_reserved_static(name))
                .map(|(name, _)| name.clone())
                .collect();
            static_names.sort_unstable();
            for member in static_names {
                class.static_members.remove(&member);
                lines.push(format!("{class_name}::{member} static cleared"));
            }

            let mut instance_names: Vec<String> = class
                .instance_members
                .iter()
                .filter(|(name, slot)| slot.configurable && name.as_str() != CONSTRUCTOR_SLOT)
                .map(|(name, _)| name.clone())
                .collect();
            instance_names.sort_unstable();
            for member in instance_names {
                class.instance_members.remove(&member);
                lines.push(format!("{class_name}::{member} instance cleared"));
            }

            class.negative_cache.clear();
            class.generic_cache.clear();
        }

        self.reflector.discard_callback_state();
        self.touched.clear();
        if self.log_on(LogLevel::Info) {
            info!(count = lines.len(), "cleared lazy bindings");
        }
        lines.push(format!("cleared bindings total: {}", lines.len()));
        lines.join("\n")
    }

    /// Non-destructively enumerate the current binding set as a replay
    /// script: one `AddAPI` statement per installed member. Empty when
    /// eviction tracking is disabled.
    pub fn dump(&self) -> String {
        if !self.config.track_evictions {
            return String::new();
        }
        let mut lines = Vec::new();
        let mut touched: Vec<ClassId> = self.touched.iter().copied().collect();
        touched.sort_unstable();

        for class_id in touched {
            let Some(class) = self.registry.get(class_id) else {
                continue;
            };
            if !class.lazy_enabled {
                continue;
            }
            let mut static_names: Vec<&String> = class
                .static_members
                .iter()
                .filter(|(name, slot)| slot.configurable && !is_reserved_static(name))
                .map(|(name, _)| name)
                .collect();
            static_names.sort_unstable();
            for member in static_names {
                lines.push(replay_line(&class.name, member, true));
            }
            let mut instance_names: Vec<&String> = class
                .instance_members
                .iter()
                .filter(|(name, slot)| slot.configurable && name.as_str() != CONSTRUCTOR_SLOT)
                .map(|(name, _)| name)
                .collect();
            instance_names.sort_unstable();
            for member in instance_names {
                lines.push(replay_line(&class.name, member, false));
            }
        }
        lines.join("\n")
    }

    /// Write the replay script to a file for warm-start precomputation
    pub fn dump_to_file(&self, path: &Path) -> io::Result<()> {
        fs::write(path, self.dump())
    }
}
