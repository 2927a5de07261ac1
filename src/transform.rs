//! The recursive tree walks behind both transform directions.
//!
//! Collapse walks a generic [`Value`] tree child-first and substitutes
//! tagged (and strategy-matched untagged) nodes on the way back up. Expand
//! walks the same tree and rebuilds typed instances at every tagged
//! mapping, yielding an [`Expanded`] union of generic nodes and instances.

use core::fmt;

use indexmap::IndexMap;

use crate::reflection::{ExpandError, Reflect};
use crate::registry::{ConstructorRegistry, Namespace, StrategyRegistry};
use crate::value::{AttrMap, Value};

// -----------------------------------------------------------------------------
// Expanded

/// Output of the expand direction: a generic node, a reconstructed
/// instance, or a container mixing both.
pub enum Expanded {
    Value(Value),
    Instance(Box<dyn Reflect>),
    Sequence(Vec<Expanded>),
    Mapping(IndexMap<String, Expanded>),
}

impl Expanded {
    pub fn downcast_ref<T: Reflect>(&self) -> Option<&T> {
        match self {
            Self::Instance(instance) => instance.downcast_ref::<T>(),
            _ => None,
        }
    }

    /// Move the concrete instance out, if this is an instance of `T`.
    pub fn take<T: Reflect>(self) -> Option<T> {
        match self {
            Self::Instance(instance) => instance.take::<T>().ok(),
            _ => None,
        }
    }

    pub fn into_instance(self) -> Option<Box<dyn Reflect>> {
        match self {
            Self::Instance(instance) => Some(instance),
            _ => None,
        }
    }

    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Self::Value(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_instance(&self) -> bool {
        matches!(self, Self::Instance(_))
    }
}

impl fmt::Debug for Expanded {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Self::Instance(instance) => {
                write!(f, "Instance({})", instance.reflect_identity())
            }
            Self::Sequence(items) => f.debug_list().entries(items).finish(),
            Self::Mapping(map) => f.debug_map().entries(map).finish(),
        }
    }
}

// -----------------------------------------------------------------------------
// Transformer

/// One walk's worth of context: the registries, the namespace chain, and
/// the marker key used for tag detection on the expand side.
pub(crate) struct Transformer<'a> {
    pub strategies: &'a StrategyRegistry,
    pub constructors: &'a ConstructorRegistry,
    pub chain: &'a [Namespace],
    pub marker: &'a str,
}

impl Transformer<'_> {
    /// Serialize-direction walk.
    ///
    /// Children are transformed before their parent is considered, so a
    /// collapse routine sees fully collapsed attributes. A tagged mapping
    /// without a matching collapse routine passes through with its marker
    /// reattached (hoisted to the first slot).
    pub fn collapse(&self, node: &Value, marker: Option<&str>) -> Value {
        match node {
            Value::Sequence(items) => {
                let items = items
                    .iter()
                    .map(|item| self.collapse(item, marker))
                    .collect();
                self.collapse_untagged(Value::Sequence(items))
            }
            Value::Mapping(map) => {
                let tag = marker.and_then(|key| {
                    let identity = map.get(key)?.as_str()?;
                    Some((key, identity.to_owned()))
                });
                match tag {
                    Some((key, identity)) => {
                        let mut attrs = AttrMap::with_capacity(map.len());
                        for (name, child) in map {
                            if name != key {
                                attrs.insert(name.clone(), self.collapse(child, marker));
                            }
                        }
                        match self
                            .strategies
                            .resolve(self.chain, &identity)
                            .and_then(|strategy| strategy.collapse_routine())
                        {
                            Some(routine) => routine(&identity, &Value::Mapping(attrs)),
                            None => {
                                let mut tagged = AttrMap::with_capacity(attrs.len() + 1);
                                tagged.insert(key.to_owned(), Value::String(identity));
                                tagged.extend(attrs);
                                Value::Mapping(tagged)
                            }
                        }
                    }
                    None => {
                        let map = map
                            .iter()
                            .map(|(name, child)| (name.clone(), self.collapse(child, marker)))
                            .collect();
                        self.collapse_untagged(Value::Mapping(map))
                    }
                }
            }
            scalar => self.collapse_untagged(scalar.clone()),
        }
    }

    // Untagged nodes still get a registry lookup, keyed by runtime tag.
    fn collapse_untagged(&self, node: Value) -> Value {
        let tag = node.type_tag();
        match self
            .strategies
            .resolve(self.chain, tag)
            .and_then(|strategy| strategy.collapse_routine())
        {
            Some(routine) => routine(tag, &node),
            None => node,
        }
    }

    /// Deserialize-direction walk.
    ///
    /// A tagged mapping is rebuilt through the constructor registry; its
    /// attributes are handed over raw, because the typed constructor
    /// recurses through its own fields (nested tagged mappings included).
    /// Failure to reconstruct is fatal, not a pass-through.
    pub fn expand(&self, node: &Value) -> Result<Expanded, ExpandError> {
        match node {
            Value::Sequence(items) => {
                let items = items
                    .iter()
                    .map(|item| self.expand(item))
                    .collect::<Result<Vec<_>, _>>()?;
                self.expand_untagged(Expanded::Sequence(items), "SEQUENCE")
            }
            Value::Mapping(map) => match map.get(self.marker) {
                Some(tag_value) => {
                    let identity = tag_value.as_str().ok_or(ExpandError::MalformedTag {
                        found: tag_value.type_tag(),
                    })?;
                    let mut attrs = AttrMap::with_capacity(map.len());
                    for (name, child) in map {
                        if name != self.marker {
                            attrs.insert(name.clone(), child.clone());
                        }
                    }
                    let instance = self.constructors.construct(identity, &attrs)?;
                    match self
                        .strategies
                        .resolve(self.chain, identity)
                        .and_then(|strategy| strategy.expand_routine())
                    {
                        Some(routine) => routine(identity, Expanded::Instance(instance)),
                        None => Ok(Expanded::Instance(instance)),
                    }
                }
                None => {
                    let map = map
                        .iter()
                        .map(|(name, child)| Ok((name.clone(), self.expand(child)?)))
                        .collect::<Result<IndexMap<_, _>, ExpandError>>()?;
                    self.expand_untagged(Expanded::Mapping(map), "MAPPING")
                }
            },
            scalar => self.expand_untagged(Expanded::Value(scalar.clone()), scalar.type_tag()),
        }
    }

    fn expand_untagged(
        &self,
        node: Expanded,
        tag: &'static str,
    ) -> Result<Expanded, ExpandError> {
        match self
            .strategies
            .resolve(self.chain, tag)
            .and_then(|strategy| strategy.expand_routine())
        {
            Some(routine) => routine(tag, node),
            None => Ok(node),
        }
    }
}

// -----------------------------------------------------------------------------
// Tests
