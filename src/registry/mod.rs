//! Registries consulted during the transform walks: per-type transform
//! routines ([`StrategyRegistry`]) and typed constructors
//! ([`ConstructorRegistry`]).
//!
//! Both are plain objects passed into [`Pipeline`](crate::Pipeline) by
//! reference. Registration takes `&mut`, resolution takes `&`; a host that
//! mutates a registry while another thread serializes must wrap it in its
//! own lock.

use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::Arc;

use core::{error, fmt};

use crate::reflection::ExpandError;
use crate::transform::Expanded;
use crate::value::Value;

mod construct;

pub use construct::{ConstructFn, ConstructorRegistry, RegisteredConstructor};

// -----------------------------------------------------------------------------
// Namespace

/// Scope a strategy is registered under.
///
/// Resolution searches the calling scope first and [`Namespace::Global`]
/// second; the first namespace holding an entry for the type identity wins
/// and entries are never merged across namespaces.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Namespace {
    Global,
    Scoped(Cow<'static, str>),
}

impl Namespace {
    pub fn scoped(namespace: impl Into<Cow<'static, str>>) -> Self {
        Self::Scoped(namespace.into())
    }
}

// -----------------------------------------------------------------------------
// Strategy

/// Collapse routine: replaces a node during serialization.
///
/// Receives the resolved type identity and the node with its marker entry
/// already stripped; the returned value substitutes the node verbatim (it
/// is not tagged or walked again).
pub type CollapseFn = Arc<dyn Fn(&str, &Value) -> Value + Send + Sync>;

/// Expand routine: post-processes a node during deserialization.
///
/// For tagged mappings the routine runs after the constructor, receiving
/// the freshly built instance.
pub type ExpandFn =
    Arc<dyn Fn(&str, Expanded) -> Result<Expanded, ExpandError> + Send + Sync>;

/// A per-type routine set: a collapse routine, an expand routine, or both.
///
/// An empty set is rejected at registration — silently registering a
/// strategy that can never fire is a programmer error.
#[derive(Clone, Default)]
pub struct Strategy {
    collapse: Option<CollapseFn>,
    expand: Option<ExpandFn>,
}

impl Strategy {
    pub fn collapse<F>(routine: F) -> Self
    where
        F: Fn(&str, &Value) -> Value + Send + Sync + 'static,
    {
        Self {
            collapse: Some(Arc::new(routine)),
            expand: None,
        }
    }

    pub fn expand<F>(routine: F) -> Self
    where
        F: Fn(&str, Expanded) -> Result<Expanded, ExpandError> + Send + Sync + 'static,
    {
        Self {
            collapse: None,
            expand: Some(Arc::new(routine)),
        }
    }

    pub fn and_expand<F>(mut self, routine: F) -> Self
    where
        F: Fn(&str, Expanded) -> Result<Expanded, ExpandError> + Send + Sync + 'static,
    {
        self.expand = Some(Arc::new(routine));
        self
    }

    pub fn and_collapse<F>(mut self, routine: F) -> Self
    where
        F: Fn(&str, &Value) -> Value + Send + Sync + 'static,
    {
        self.collapse = Some(Arc::new(routine));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.collapse.is_none() && self.expand.is_none()
    }

    pub(crate) fn collapse_routine(&self) -> Option<&CollapseFn> {
        self.collapse.as_ref()
    }

    pub(crate) fn expand_routine(&self) -> Option<&ExpandFn> {
        self.expand.as_ref()
    }
}

impl fmt::Debug for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Strategy")
            .field("collapse", &self.collapse.is_some())
            .field("expand", &self.expand.is_some())
            .finish()
    }
}

// -----------------------------------------------------------------------------
// RegistryError

/// A enumeration of all error outcomes of strategy registration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RegistryError {
    /// The strategy supplies neither a collapse nor an expand routine.
    EmptyStrategy,
    /// The type identity is the empty string.
    EmptyTypeIdentity,
    /// A scoped namespace is the empty string.
    EmptyNamespace,
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyStrategy => {
                f.write_str("strategy must supply a collapse or an expand routine")
            }
            Self::EmptyTypeIdentity => f.write_str("type identity must not be empty"),
            Self::EmptyNamespace => f.write_str("scoped namespace must not be empty"),
        }
    }
}

impl error::Error for RegistryError {}

// -----------------------------------------------------------------------------
// StrategyRegistry

/// The (namespace, type identity) → [`Strategy`] table.
///
/// # Example
///
/// ```
/// use remold::registry::{Namespace, Strategy, StrategyRegistry};
/// use remold::Value;
///
/// let mut registry = StrategyRegistry::new();
/// registry
///     .register(
///         Namespace::Global,
///         "Stamp",
///         Strategy::collapse(|_, node| {
///             let unix = node
///                 .as_mapping()
///                 .and_then(|attrs| attrs.get("unix"))
///                 .and_then(|attr| attr.as_integer())
///                 .unwrap_or(0);
///             Value::from(format!("@{unix}"))
///         }),
///     )
///     .unwrap();
/// ```
#[derive(Debug, Default)]
pub struct StrategyRegistry {
    entries: HashMap<Namespace, HashMap<String, Strategy>>,
}

impl StrategyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `strategy` for `type_identity` under `namespace`.
    ///
    /// The entry persists for the registry's lifetime; registering again for
    /// the same (namespace, identity) pair overwrites the previous entry.
    pub fn register(
        &mut self,
        namespace: Namespace,
        type_identity: impl Into<String>,
        strategy: Strategy,
    ) -> Result<(), RegistryError> {
        let identity = type_identity.into();
        if strategy.is_empty() {
            return Err(RegistryError::EmptyStrategy);
        }
        if identity.is_empty() {
            return Err(RegistryError::EmptyTypeIdentity);
        }
        if matches!(&namespace, Namespace::Scoped(scope) if scope.is_empty()) {
            return Err(RegistryError::EmptyNamespace);
        }
        self.entries
            .entry(namespace)
            .or_default()
            .insert(identity, strategy);
        Ok(())
    }

    /// Find the strategy for `type_identity`, searching `chain` in order.
    ///
    /// The first namespace holding *any* entry for the identity ends the
    /// search, even when that entry lacks the routine the caller is about
    /// to use — a later namespace is never consulted as a per-direction
    /// fallback. Long-standing behavior that callers rely on; pinned by
    /// `tests::entry_without_direction_blocks_fallback`.
    pub fn resolve(&self, chain: &[Namespace], type_identity: &str) -> Option<&Strategy> {
        chain
            .iter()
            .find_map(|namespace| self.entries.get(namespace)?.get(type_identity))
    }
}

// -----------------------------------------------------------------------------
// Tests
