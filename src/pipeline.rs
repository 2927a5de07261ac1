use std::borrow::Cow;

use crate::reflection::{ExpandError, Reflect};
use crate::registry::{ConstructorRegistry, Namespace, StrategyRegistry};
use crate::transform::{Expanded, Transformer};
use crate::value::{CLASS_MARKER, Value};

// -----------------------------------------------------------------------------
// Options

/// Marker policy for a single `serialize` call.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Tagging {
    /// Use the pipeline's marker key.
    #[default]
    Inherit,
    /// Tag under a custom key for this call only.
    Custom(Cow<'static, str>),
    /// Emit no markers at all. The output is smaller but cannot be
    /// deserialized back into typed instances.
    Disabled,
}

/// Options recognized at the `serialize` boundary.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SerializeOptions {
    pub marker: Tagging,
}

impl SerializeOptions {
    /// Tag under `key` instead of the pipeline's marker.
    pub fn tagged_with(key: impl Into<Cow<'static, str>>) -> Self {
        Self {
            marker: Tagging::Custom(key.into()),
        }
    }

    /// Disable tagging for this call.
    pub fn untagged() -> Self {
        Self {
            marker: Tagging::Disabled,
        }
    }
}

// -----------------------------------------------------------------------------
// Pipeline

/// The serialize/deserialize entry points, bound to a pair of registries.
///
/// A pipeline is cheap to build: it borrows its registries and carries only
/// the calling scope and the marker key. Strategy resolution searches the
/// scope's namespace first and the global namespace second.
///
/// Both entry points are no-ops on null input: `serialize` returns `None`
/// for a value that snapshots to null, `deserialize` returns `Ok(None)` for
/// a null tree. Cyclic inputs are the caller's responsibility to break —
/// the walk recurses without bound.
///
/// # Example
///
/// ```
/// use remold::derive::Reflect;
/// use remold::registry::{ConstructorRegistry, StrategyRegistry};
/// use remold::{Pipeline, SerializeOptions};
///
/// #[derive(Reflect, Debug, PartialEq)]
/// struct Point { x: i64, y: i64 }
///
/// let strategies = StrategyRegistry::new();
/// let constructors = ConstructorRegistry::new();
/// let pipeline = Pipeline::new(&strategies, &constructors);
///
/// let tree = pipeline.serialize(&Point { x: 10, y: 10 }).unwrap();
/// assert_eq!(tree.class_of("__CLASS__"), Some("Point"));
///
/// let bare = pipeline
///     .serialize_with(&Point { x: 10, y: 10 }, &SerializeOptions::untagged())
///     .unwrap();
/// assert_eq!(bare.class_of("__CLASS__"), None);
/// ```
pub struct Pipeline<'r> {
    strategies: &'r StrategyRegistry,
    constructors: &'r ConstructorRegistry,
    scope: Option<Cow<'static, str>>,
    marker: Cow<'static, str>,
}

impl<'r> Pipeline<'r> {
    pub fn new(strategies: &'r StrategyRegistry, constructors: &'r ConstructorRegistry) -> Self {
        Self {
            strategies,
            constructors,
            scope: None,
            marker: Cow::Borrowed(CLASS_MARKER),
        }
    }

    /// Resolve strategies under `namespace` before the global fallback.
    pub fn scoped(mut self, namespace: impl Into<Cow<'static, str>>) -> Self {
        self.scope = Some(namespace.into());
        self
    }

    /// Use `marker` as the default marker key for both directions.
    pub fn with_marker(mut self, marker: impl Into<Cow<'static, str>>) -> Self {
        self.marker = marker.into();
        self
    }

    fn chain(&self) -> Vec<Namespace> {
        match &self.scope {
            Some(scope) => vec![Namespace::Scoped(scope.clone()), Namespace::Global],
            None => vec![Namespace::Global],
        }
    }

    fn transformer<'a>(&'a self, chain: &'a [Namespace]) -> Transformer<'a> {
        Transformer {
            strategies: self.strategies,
            constructors: self.constructors,
            chain,
            marker: self.marker.as_ref(),
        }
    }

    /// Snapshot `instance` and collapse the resulting tree.
    ///
    /// Returns `None` when the snapshot is null (nothing to do).
    pub fn serialize(&self, instance: &dyn Reflect) -> Option<Value> {
        self.serialize_with(instance, &SerializeOptions::default())
    }

    /// [`serialize`](Self::serialize) with per-call options.
    pub fn serialize_with(
        &self,
        instance: &dyn Reflect,
        options: &SerializeOptions,
    ) -> Option<Value> {
        let marker = match &options.marker {
            Tagging::Inherit => Some(self.marker.as_ref()),
            Tagging::Custom(key) => Some(key.as_ref()),
            Tagging::Disabled => None,
        };
        let reflected = instance.reflect(marker);
        if reflected.is_null() {
            return None;
        }
        let chain = self.chain();
        Some(self.transformer(&chain).collapse(&reflected, marker))
    }

    /// Expand a generic tree back into typed instances.
    ///
    /// Reflection is idempotent on generic input, so the walk runs directly
    /// on `data`. Returns `Ok(None)` for a null tree; reconstruction
    /// failures are hard errors.
    pub fn deserialize(&self, data: &Value) -> Result<Option<Expanded>, ExpandError> {
        if data.is_null() {
            return Ok(None);
        }
        let chain = self.chain();
        self.transformer(&chain).expand(data).map(Some)
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::{Pipeline, SerializeOptions};
    use crate::derive::Reflect;
    use crate::registry::{ConstructorRegistry, Namespace, Strategy, StrategyRegistry};
    use crate::transform::Expanded;
    use crate::value::{AttrMap, CLASS_MARKER, Value};

    #[derive(Reflect, Debug, PartialEq)]
    struct Point {
        x: i64,
        y: i64,
    }

    #[derive(Reflect, Debug, PartialEq)]
    struct Stamp {
        unix: i64,
    }

    #[derive(Reflect, Debug, PartialEq)]
    struct Event {
        label: String,
        at: Stamp,
    }

    #[derive(Reflect, Debug, PartialEq)]
    struct Pair(i64, i64);

    #[derive(Reflect, Debug, PartialEq)]
    struct Sentinel;

    #[derive(Reflect, Debug, PartialEq)]
    #[reflect(identity = "geo.Spot")]
    struct Spot {
        x: i64,
    }

    fn assert_no_key(node: &Value, key: &str) {
        match node {
            Value::Mapping(map) => {
                assert!(!map.contains_key(key));
                for child in map.values() {
                    assert_no_key(child, key);
                }
            }
            Value::Sequence(items) => {
                for item in items {
                    assert_no_key(item, key);
                }
            }
            _ => {}
        }
    }

    #[test]
    fn point_serializes_with_the_class_marker() {
        let strategies = StrategyRegistry::new();
        let constructors = ConstructorRegistry::empty();
        let pipeline = Pipeline::new(&strategies, &constructors);

        let mut expected = AttrMap::new();
        expected.insert(CLASS_MARKER.to_owned(), Value::from("Point"));
        expected.insert("x".to_owned(), Value::Integer(10));
        expected.insert("y".to_owned(), Value::Integer(10));

        assert_eq!(
            pipeline.serialize(&Point { x: 10, y: 10 }),
            Some(Value::Mapping(expected))
        );
    }

    // List-like internals carry no attribute names, so the snapshot is an
    // untagged sequence and the type identity is lost on the wire.
    #[test]
    fn tuple_structs_serialize_as_untagged_sequences() {
        let strategies = StrategyRegistry::new();
        let constructors = ConstructorRegistry::empty();
        let pipeline = Pipeline::new(&strategies, &constructors);

        let tree = pipeline.serialize(&Pair(1, 2)).unwrap();
        assert_eq!(
            tree,
            Value::Sequence(vec![Value::Integer(1), Value::Integer(2)])
        );
        assert_no_key(&tree, CLASS_MARKER);
    }

    #[test]
    fn unit_structs_round_trip_as_empty_tagged_mappings() {
        let strategies = StrategyRegistry::new();
        let mut constructors = ConstructorRegistry::empty();
        constructors.register::<Sentinel>();
        let pipeline = Pipeline::new(&strategies, &constructors);

        let tree = pipeline.serialize(&Sentinel).unwrap();
        assert_eq!(tree.class_of(CLASS_MARKER), Some("Sentinel"));
        assert_eq!(tree.as_mapping().unwrap().len(), 1);

        let back = pipeline.deserialize(&tree).unwrap().unwrap();
        assert_eq!(back.downcast_ref::<Sentinel>(), Some(&Sentinel));
    }

    #[test]
    fn identity_override_tags_and_resolves_under_the_custom_name() {
        let strategies = StrategyRegistry::new();
        let mut constructors = ConstructorRegistry::empty();
        constructors.register::<Spot>();
        let pipeline = Pipeline::new(&strategies, &constructors);

        let tree = pipeline.serialize(&Spot { x: 7 }).unwrap();
        assert_eq!(tree.class_of(CLASS_MARKER), Some("geo.Spot"));
        assert!(constructors.contains("geo.Spot"));

        let back = pipeline.deserialize(&tree).unwrap().unwrap();
        assert_eq!(back.downcast_ref::<Spot>(), Some(&Spot { x: 7 }));
    }

    #[test]
    fn round_trip_rebuilds_the_typed_graph() {
        let strategies = StrategyRegistry::new();
        let mut constructors = ConstructorRegistry::empty();
        constructors.register::<Event>();
        let pipeline = Pipeline::new(&strategies, &constructors);

        let event = Event {
            label: "boot".to_owned(),
            at: Stamp { unix: 1000 },
        };
        let tree = pipeline.serialize(&event).unwrap();
        let back = pipeline.deserialize(&tree).unwrap().unwrap();

        assert_eq!(back.downcast_ref::<Event>(), Some(&event));
    }

    #[test]
    fn instances_inside_plain_containers_are_rebuilt() {
        let strategies = StrategyRegistry::new();
        let mut constructors = ConstructorRegistry::empty();
        constructors.register::<Point>();
        let pipeline = Pipeline::new(&strategies, &constructors);

        let points = vec![Point { x: 1, y: 2 }, Point { x: 3, y: 4 }];
        let tree = pipeline.serialize(&points).unwrap();

        let Some(Expanded::Sequence(items)) = pipeline.deserialize(&tree).unwrap() else {
            panic!("expected a sequence");
        };
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].downcast_ref::<Point>(), Some(&Point { x: 1, y: 2 }));
        assert_eq!(items[1].downcast_ref::<Point>(), Some(&Point { x: 3, y: 4 }));
    }

    #[test]
    fn disabled_marker_suppresses_tags_at_every_depth() {
        let strategies = StrategyRegistry::new();
        let constructors = ConstructorRegistry::empty();
        let pipeline = Pipeline::new(&strategies, &constructors);

        let event = Event {
            label: "boot".to_owned(),
            at: Stamp { unix: 1000 },
        };
        let tree = pipeline
            .serialize_with(&event, &SerializeOptions::untagged())
            .unwrap();
        assert_no_key(&tree, CLASS_MARKER);
    }

    #[test]
    fn custom_marker_applies_to_one_call_only() {
        let strategies = StrategyRegistry::new();
        let constructors = ConstructorRegistry::empty();
        let pipeline = Pipeline::new(&strategies, &constructors);

        let tree = pipeline
            .serialize_with(
                &Point { x: 1, y: 2 },
                &SerializeOptions::tagged_with("__TYPE__"),
            )
            .unwrap();
        assert_eq!(tree.class_of("__TYPE__"), Some("Point"));
        assert_no_key(&tree, CLASS_MARKER);

        let tree = pipeline.serialize(&Point { x: 1, y: 2 }).unwrap();
        assert_eq!(tree.class_of(CLASS_MARKER), Some("Point"));
    }

    #[test]
    fn pipeline_marker_covers_both_directions() {
        let strategies = StrategyRegistry::new();
        let mut constructors = ConstructorRegistry::empty();
        constructors.register::<Point>();
        let pipeline = Pipeline::new(&strategies, &constructors).with_marker("__TYPE__");

        let tree = pipeline.serialize(&Point { x: 1, y: 2 }).unwrap();
        assert_eq!(tree.class_of("__TYPE__"), Some("Point"));

        let back = pipeline.deserialize(&tree).unwrap().unwrap();
        assert_eq!(back.downcast_ref::<Point>(), Some(&Point { x: 1, y: 2 }));
    }

    #[test]
    fn nested_collapse_strategy_replaces_the_attribute() {
        let mut strategies = StrategyRegistry::new();
        strategies
            .register(
                Namespace::Global,
                "Stamp",
                Strategy::collapse(|_, node| {
                    let unix = node
                        .as_mapping()
                        .and_then(|attrs| attrs.get("unix"))
                        .and_then(|attr| attr.as_integer())
                        .unwrap_or(0);
                    Value::from(format!("@{unix}"))
                }),
            )
            .unwrap();
        let constructors = ConstructorRegistry::empty();
        let pipeline = Pipeline::new(&strategies, &constructors);

        let event = Event {
            label: "boot".to_owned(),
            at: Stamp { unix: 1000 },
        };
        let tree = pipeline.serialize(&event).unwrap();
        let map = tree.as_mapping().unwrap();

        assert_eq!(map.get("at"), Some(&Value::from("@1000")));
        assert_eq!(tree.class_of(CLASS_MARKER), Some("Event"));
    }

    #[test]
    fn scoped_strategy_wins_over_global() {
        let mut strategies = StrategyRegistry::new();
        strategies
            .register(
                Namespace::Global,
                "Stamp",
                Strategy::collapse(|_, _| Value::from("global")),
            )
            .unwrap();
        strategies
            .register(
                Namespace::scoped("audit"),
                "Stamp",
                Strategy::collapse(|_, _| Value::from("scoped")),
            )
            .unwrap();
        let constructors = ConstructorRegistry::empty();
        let pipeline = Pipeline::new(&strategies, &constructors).scoped("audit");

        let tree = pipeline.serialize(&Stamp { unix: 1 }).unwrap();
        assert_eq!(tree, Value::from("scoped"));

        let global = Pipeline::new(&strategies, &constructors);
        assert_eq!(
            global.serialize(&Stamp { unix: 1 }),
            Some(Value::from("global"))
        );
    }

    #[test]
    fn expand_routine_post_processes_the_instance() {
        let mut strategies = StrategyRegistry::new();
        strategies
            .register(
                Namespace::Global,
                "Point",
                Strategy::expand(|_, expanded| {
                    let point: Point = expanded
                        .take()
                        .ok_or_else(|| crate::ExpandError::custom("expected a Point"))?;
                    Ok(Expanded::Instance(Box::new(Point {
                        x: point.y,
                        y: point.x,
                    })))
                }),
            )
            .unwrap();
        let mut constructors = ConstructorRegistry::empty();
        constructors.register::<Point>();
        let pipeline = Pipeline::new(&strategies, &constructors);

        let tree = pipeline.serialize(&Point { x: 1, y: 2 }).unwrap();
        let back = pipeline.deserialize(&tree).unwrap().unwrap();
        assert_eq!(back.downcast_ref::<Point>(), Some(&Point { x: 2, y: 1 }));
    }

    #[test]
    fn null_input_is_a_no_op_in_both_directions() {
        let strategies = StrategyRegistry::new();
        let constructors = ConstructorRegistry::empty();
        let pipeline = Pipeline::new(&strategies, &constructors);

        let nothing: Option<Point> = None;
        assert_eq!(pipeline.serialize(&nothing), None);
        assert!(pipeline.deserialize(&Value::Null).unwrap().is_none());
    }
}
