//! Modifier registry for annotation-driven field normalization.
//!
//! This module provides the [`ModifierRegistry`] type that maps annotation
//! tags (such as `"trim"`) to the [`Modifier`] that handles them.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::ConfigError;
use crate::preprocessing::{Modifier, TrimModifier};

/// Type alias for the modifier storage map.
type ModifierMap = Arc<RwLock<HashMap<&'static str, Arc<dyn Modifier>>>>;

/// A thread-safe registry of modifiers keyed by annotation tag.
///
/// # Thread Safety
///
/// The registry uses `Arc<RwLock<...>>` for thread-safe access:
/// - Multiple threads can look modifiers up concurrently (read-only access)
/// - Registration operations are serialized (write access)
///
/// Clones share the same underlying map.
///
/// # Example
///
/// ```rust
/// use pinpoint::{ModifierRegistry, TrimModifier};
///
/// let registry = ModifierRegistry::new();
/// registry.register(TrimModifier).unwrap();
///
/// assert!(registry.contains("trim"));
///
/// // Duplicate registration fails
/// assert!(registry.register(TrimModifier).is_err());
/// ```
pub struct ModifierRegistry {
    modifiers: ModifierMap,
}

impl ModifierRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            modifiers: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Creates a registry with the built-in modifiers (`trim`).
    pub fn with_defaults() -> Self {
        let registry = Self::new();
        registry
            .modifiers
            .write()
            .insert(TrimModifier::TAG, Arc::new(TrimModifier));
        registry
    }

    /// Registers a modifier under its tag.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::DuplicateModifier`] if the tag is already
    /// registered.
    pub fn register<M>(&self, modifier: M) -> Result<(), ConfigError>
    where
        M: Modifier + 'static,
    {
        let tag = modifier.tag();
        let mut modifiers = self.modifiers.write();

        if modifiers.contains_key(tag) {
            return Err(ConfigError::DuplicateModifier(tag.to_string()));
        }

        modifiers.insert(tag, Arc::new(modifier));
        Ok(())
    }

    /// Retrieves the modifier for a tag.
    pub fn get(&self, tag: &str) -> Option<Arc<dyn Modifier>> {
        self.modifiers.read().get(tag).cloned()
    }

    /// Returns true if a modifier is registered under `tag`.
    pub fn contains(&self, tag: &str) -> bool {
        self.modifiers.read().contains_key(tag)
    }

    /// Returns the registered tags, sorted.
    pub fn tags(&self) -> Vec<&'static str> {
        let mut tags: Vec<_> = self.modifiers.read().keys().copied().collect();
        tags.sort_unstable();
        tags
    }
}

impl Default for ModifierRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl Clone for ModifierRegistry {
    fn clone(&self) -> Self {
        Self {
            modifiers: Arc::clone(&self.modifiers),
        }
    }
}

impl std::fmt::Debug for ModifierRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModifierRegistry")
            .field("tags", &self.tags())
            .finish()
    }
}
