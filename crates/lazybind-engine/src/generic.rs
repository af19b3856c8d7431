//! Generic-call dispatch and the instantiation cache
//!
//! A generic dispatch slot carries only the base method name; the
//! concrete callable is produced per call from the leading type
//! arguments, memoized per class under a signature key so repeated calls
//! with the same arguments skip the instantiation primitive.

use tracing::debug;

use lazybind_sdk::{Callable, NativeError, NativeReflector, NativeResult, NativeTypeId};

use crate::binder::Binder;
use crate::class::ClassId;
use crate::config::LogLevel;

impl<R: NativeReflector> Binder<R> {
    /// Signature key for one instantiation: method name plus the type
    /// arguments' class names, e.g. `$map[Int32,String]`.
    pub(crate) fn generic_signature(&self, method: &str, type_args: &[NativeTypeId]) -> String {
        let names: Vec<String> = type_args
            .iter()
            .map(|ty| self.reflector.type_name(*ty))
            .collect();
        format!("${method}[{}]", names.join(","))
    }

    /// The concrete callable for a generic method bound to these type
    /// arguments, served from the per-class cache when enabled.
    pub(crate) fn dispatch_generic(
        &mut self,
        class_id: ClassId,
        method: &str,
        type_args: &[NativeTypeId],
    ) -> NativeResult<Callable> {
        let native_type = self
            .registry
            .get(class_id)
            .map(|c| c.native_type)
            .ok_or_else(|| NativeError::Resolution("unknown class".to_string()))?;
        let signature = self.generic_signature(method, type_args);

        if self.config.cache_generic_methods {
            if let Some(cached) = self
                .registry
                .get(class_id)
                .and_then(|c| c.generic_cache.get(&signature))
            {
                if self.log_on(LogLevel::Debug) {
                    debug!(%signature, "generic cache hit");
                }
                return Ok(cached.clone());
            }
        }

        let callable = self
            .reflector
            .instantiate_generic_method(native_type, method, type_args)?;
        if self.config.cache_generic_methods {
            if let Some(class) = self.registry.get_mut(class_id) {
                class.generic_cache.insert(signature, callable.clone());
            }
        }
        Ok(callable)
    }
}
