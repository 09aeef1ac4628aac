//! Parameter binding
//!
//! Resolves the shape of a request's params and coerces each value into the
//! kind declared by its destination slot. Binding is all-or-nothing: a
//! [`Bound`] record is only returned once every slot has been coerced.

use std::{collections::HashSet, fmt};

use serde_json::{Map, Value};

use crate::rpc::error::RpcError;
use crate::rpc::value::{coerce, describe, Coerced, FromParam, Kind};

#[derive(Debug, Clone, PartialEq, Eq)]
enum SlotKind {
    Known(Kind),
    Unknown(String),
}

/// A typed destination for one param.
///
/// A slot with a key is matched by name against named params; a slot without
/// one takes the entry at its own index in the mapping's document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slot {
    key: Option<String>,
    kind: SlotKind,
}

impl Slot {
    pub fn new(kind: Kind) -> Self {
        Self {
            key: None,
            kind: SlotKind::Known(kind),
        }
    }

    pub fn string() -> Self {
        Self::new(Kind::String)
    }

    pub fn integer() -> Self {
        Self::new(Kind::Integer)
    }

    pub fn float() -> Self {
        Self::new(Kind::Float)
    }

    pub fn keyed(key: impl Into<String>, kind: Kind) -> Self {
        Self::new(kind).with_key(key)
    }

    /// Builds a slot from a type name known only at runtime. Unrecognized
    /// names are kept and reported when the slot is bound.
    pub fn declared(type_name: &str) -> Self {
        let kind = match type_name.parse::<Kind>() {
            Ok(kind) => SlotKind::Known(kind),
            Err(_) => SlotKind::Unknown(type_name.to_string()),
        };
        Self { key: None, kind }
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    pub fn kind(&self) -> Result<Kind, RpcError> {
        match &self.kind {
            SlotKind::Known(kind) => Ok(*kind),
            SlotKind::Unknown(name) => Err(RpcError::internal(format!(
                "unknown destination kind `{name}`"
            ))),
        }
    }
}

/// The two params shapes a call may carry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamsShape<'a> {
    Positional(&'a [Value]),
    Named(&'a Map<String, Value>),
}

impl<'a> ParamsShape<'a> {
    pub fn classify(params: Option<&'a Value>) -> Result<Self, RpcError> {
        match params {
            Some(Value::Array(items)) => Ok(Self::Positional(items)),
            Some(Value::Object(entries)) => Ok(Self::Named(entries)),
            Some(other) => Err(RpcError::invalid_params(format!(
                "unsupported params shape: {}",
                describe(other)
            ))),
            None => Err(RpcError::invalid_params("unsupported params shape: absent")),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Positional(items) => items.len(),
            Self::Named(entries) => entries.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Coerced values in slot order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Bound {
    values: Vec<Coerced>,
}

impl Bound {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Coerced> {
        self.values.get(index)
    }

    pub fn string(&self, index: usize) -> Result<&str, RpcError> {
        self.get(index)
            .and_then(Coerced::as_str)
            .ok_or_else(|| wrong_accessor(index, Kind::String))
    }

    pub fn int(&self, index: usize) -> Result<i64, RpcError> {
        self.get(index)
            .and_then(Coerced::as_i64)
            .ok_or_else(|| wrong_accessor(index, Kind::Integer))
    }

    pub fn float(&self, index: usize) -> Result<f64, RpcError> {
        self.get(index)
            .and_then(Coerced::as_f64)
            .ok_or_else(|| wrong_accessor(index, Kind::Float))
    }

    pub fn into_values(self) -> Vec<Coerced> {
        self.values
    }
}

fn wrong_accessor(index: usize, kind: Kind) -> RpcError {
    RpcError::internal(format!("bound slot {index} is not a {kind}"))
}

/// Binds `params` into `slots`, returning one coerced value per slot.
///
/// Fails with an internal error if any slot has an unknown kind, or if slot
/// keys are duplicated or only partly given (both checked before any value
/// is read), and with invalid params on a shape, count,
/// missing key or coercion failure. The first failure wins.
pub fn bind(params: Option<&Value>, slots: &[Slot]) -> Result<Bound, RpcError> {
    let kinds = slots
        .iter()
        .map(Slot::kind)
        .collect::<Result<Vec<_>, _>>()?;
    let sources = resolve_sources(params, slots)?;

    let values = sources
        .into_iter()
        .zip(kinds)
        .enumerate()
        .map(|(index, (value, kind))| {
            at_position(position(index, &slots[index]), coerce(value, kind))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Bound { values })
}

/// A fixed list of Rust types bound from params, positionally or in the
/// mapping's document order.
pub trait FromParams: Sized {
    fn slots() -> Vec<Slot>;

    fn from_sources(sources: &[&Value]) -> Result<Self, RpcError>;
}

pub fn bind_typed<T: FromParams>(params: Option<&Value>) -> Result<T, RpcError> {
    let slots = T::slots();
    let sources = resolve_sources(params, &slots)?;
    T::from_sources(&sources)
}

/// Like [`bind_typed`], but named params are looked up by the given keys.
/// Positional params ignore the keys.
pub fn bind_typed_keyed<T: FromParams>(
    params: Option<&Value>,
    keys: &[&str],
) -> Result<T, RpcError> {
    let slots = T::slots();
    if keys.len() != slots.len() {
        return Err(RpcError::internal(format!(
            "{} keys supplied for {} slots",
            keys.len(),
            slots.len()
        )));
    }

    let slots = slots
        .into_iter()
        .zip(keys)
        .map(|(slot, key)| slot.with_key(*key))
        .collect::<Vec<_>>();
    let sources = resolve_sources(params, &slots)?;
    T::from_sources(&sources)
}

fn resolve_sources<'a>(
    params: Option<&'a Value>,
    slots: &[Slot],
) -> Result<Vec<&'a Value>, RpcError> {
    check_slot_keys(slots)?;
    let shape = ParamsShape::classify(params)?;
    if shape.len() != slots.len() {
        return Err(RpcError::invalid_params(format!(
            "size mismatch: expected {} params, got {}",
            slots.len(),
            shape.len()
        )));
    }

    match shape {
        ParamsShape::Positional(items) => Ok(items.iter().collect()),
        ParamsShape::Named(entries) => {
            let ordered = entries.values().collect::<Vec<_>>();
            slots
                .iter()
                .enumerate()
                .map(|(index, slot)| match slot.key() {
                    Some(key) => entries
                        .get(key)
                        .ok_or_else(|| RpcError::invalid_params(format!("missing param `{key}`"))),
                    None => Ok(ordered[index]),
                })
                .collect()
        }
    }
}

/// Slots must be either all keyed, with distinct keys, or all unkeyed.
/// Anything else would bind one named entry twice and drop another.
fn check_slot_keys(slots: &[Slot]) -> Result<(), RpcError> {
    let keyed = slots.iter().filter(|slot| slot.key().is_some()).count();
    if keyed != 0 && keyed != slots.len() {
        return Err(RpcError::internal(
            "slots mix keyed and unkeyed destinations",
        ));
    }

    let mut seen = HashSet::with_capacity(keyed);
    for key in slots.iter().filter_map(Slot::key) {
        if !seen.insert(key) {
            return Err(RpcError::internal(format!("duplicate slot key `{key}`")));
        }
    }

    Ok(())
}

enum Position<'a> {
    Index(usize),
    Key(&'a str),
}

impl fmt::Display for Position<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index(index) => write!(f, "param {index}"),
            Self::Key(key) => write!(f, "param `{key}`"),
        }
    }
}

fn position(index: usize, slot: &Slot) -> Position<'_> {
    slot.key().map_or(Position::Index(index), Position::Key)
}

fn at_position<T>(position: Position<'_>, result: Result<T, RpcError>) -> Result<T, RpcError> {
    result.map_err(|err| match err {
        RpcError::InvalidParams { message } => {
            RpcError::invalid_params(format!("{position}: {message}"))
        }
        other => other,
    })
}

fn source_at<'a>(sources: &[&'a Value], index: usize) -> Result<&'a Value, RpcError> {
    sources
        .get(index)
        .copied()
        .ok_or_else(|| RpcError::internal(format!("no source value for slot {index}")))
}

macro_rules! impl_from_params {
    ($($name:ident : $index:tt),+) => {
        impl<$($name: FromParam),+> FromParams for ($($name,)+) {
            fn slots() -> Vec<Slot> {
                vec![$(Slot::new(<$name as FromParam>::KIND)),+]
            }

            fn from_sources(sources: &[&Value]) -> Result<Self, RpcError> {
                Ok(($(
                    at_position(
                        Position::Index($index),
                        source_at(sources, $index).and_then(<$name as FromParam>::from_param),
                    )?,
                )+))
            }
        }
    };
}

impl_from_params!(A: 0);
impl_from_params!(A: 0, B: 1);
impl_from_params!(A: 0, B: 1, C: 2);
impl_from_params!(A: 0, B: 1, C: 2, D: 3);

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn binds_positional_integers() {
        let params = json!([42, 23]);
        let bound = bind(Some(&params), &[Slot::integer(), Slot::integer()]).expect("bind");

        assert_eq!(bound.int(0).expect("slot 0"), 42);
        assert_eq!(bound.int(1).expect("slot 1"), 23);
    }

    #[test]
    fn named_params_bind_in_document_order_without_keys() {
        let params: Value =
            serde_json::from_str(r#"{"subtrahend":23,"minuend":42}"#).expect("valid json");
        let bound = bind(Some(&params), &[Slot::integer(), Slot::integer()]).expect("bind");

        assert_eq!(bound.int(0).expect("slot 0"), 23);
        assert_eq!(bound.int(1).expect("slot 1"), 42);
    }

    #[test]
    fn keyed_slots_bind_named_params_by_key() {
        let params: Value =
            serde_json::from_str(r#"{"subtrahend":23,"minuend":42}"#).expect("valid json");
        let slots = [
            Slot::keyed("minuend", Kind::Integer),
            Slot::keyed("subtrahend", Kind::Integer),
        ];
        let bound = bind(Some(&params), &slots).expect("bind");

        assert_eq!(bound.int(0).expect("minuend"), 42);
        assert_eq!(bound.int(1).expect("subtrahend"), 23);
    }

    #[test]
    fn missing_key_is_invalid_params() {
        let params = json!({"minuend": 42, "other": 23});
        let slots = [
            Slot::keyed("minuend", Kind::Integer),
            Slot::keyed("subtrahend", Kind::Integer),
        ];

        let err = bind(Some(&params), &slots).expect_err("missing key");
        assert!(err.is_invalid_params());
        assert!(err.to_string().contains("subtrahend"));
    }

    #[test]
    fn mixed_keyed_and_unkeyed_slots_are_internal() {
        let params = json!({"a": 1, "b": 2});
        let err = bind(
            Some(&params),
            &[Slot::keyed("b", Kind::Integer), Slot::integer()],
        )
        .expect_err("mixed slots");

        assert!(err.is_internal());
        assert!(err.to_string().contains("mix keyed and unkeyed"));
    }

    #[test]
    fn duplicate_slot_keys_are_internal() {
        let params = json!({"a": 1, "b": 2});
        let err = bind(
            Some(&params),
            &[Slot::keyed("a", Kind::Integer), Slot::keyed("a", Kind::Integer)],
        )
        .expect_err("duplicate keys");

        assert!(err.is_internal());
        assert!(err.to_string().contains("duplicate slot key `a`"));
    }

    #[test]
    fn slot_keys_are_checked_before_params_shape() {
        let err = bind(
            Some(&json!("scalar")),
            &[Slot::keyed("a", Kind::Integer), Slot::keyed("a", Kind::Integer)],
        )
        .expect_err("duplicate keys");
        assert!(err.is_internal());

        let err = bind_typed_keyed::<(i64, i64)>(Some(&json!([1, 2])), &["x", "x"])
            .expect_err("duplicate keys");
        assert!(err.is_internal());
    }

    #[test]
    fn count_mismatch_is_invalid_params() {
        let positional = json!([1, 2, 3]);
        let named = json!({"a": 1});

        let err = bind(Some(&positional), &[Slot::integer(), Slot::integer()])
            .expect_err("too many params");
        assert!(err.is_invalid_params());
        assert!(err.to_string().contains("size mismatch"));

        let err = bind(Some(&named), &[Slot::integer(), Slot::integer()])
            .expect_err("too few params");
        assert!(err.is_invalid_params());
    }

    #[test]
    fn scalar_and_absent_params_are_unsupported() {
        for params in [json!("bar"), json!(1), json!(true), json!(null)] {
            let err = bind(Some(&params), &[Slot::string()]).expect_err("scalar params");
            assert!(err.is_invalid_params());
            assert!(err.to_string().contains("unsupported params shape"));
        }

        let err = bind(None, &[]).expect_err("absent params");
        assert!(err.to_string().contains("unsupported params shape"));
    }

    #[test]
    fn unknown_kind_is_internal_and_binds_nothing() {
        let params = json!(["x", true]);
        let err = bind(Some(&params), &[Slot::string(), Slot::declared("bool")])
            .expect_err("unknown kind");

        assert!(err.is_internal());
        assert!(err.to_string().contains("unknown destination kind"));
    }

    #[test]
    fn first_coercion_failure_is_returned() {
        let params = json!([1, "nope", null]);
        let err = bind(
            Some(&params),
            &[Slot::integer(), Slot::integer(), Slot::integer()],
        )
        .expect_err("bad literal");

        assert!(err.is_invalid_params());
        assert!(err.to_string().contains("param 1"));
    }

    #[test]
    fn mixed_kinds_coerce_per_slot() {
        let params = json!(["7", 2.5, 10]);
        let bound = bind(
            Some(&params),
            &[Slot::integer(), Slot::string(), Slot::float()],
        )
        .expect("bind");

        assert_eq!(bound.int(0).expect("int"), 7);
        assert_eq!(bound.string(1).expect("string"), "2.500000");
        assert_eq!(bound.float(2).expect("float"), 10.0);
        assert!(bound.float(0).expect_err("wrong accessor").is_internal());
    }

    #[test]
    fn empty_params_bind_to_empty_slots() {
        let bound = bind(Some(&json!([])), &[]).expect("bind");
        assert!(bound.is_empty());
        assert!(bind(Some(&json!({})), &[]).expect("bind").is_empty());
    }

    #[test]
    fn typed_binding_produces_tuples() {
        let params = json!([42, "23"]);
        let (minuend, subtrahend): (i64, f64) = bind_typed(Some(&params)).expect("bind");

        assert_eq!(minuend, 42);
        assert_eq!(subtrahend, 23.0);
    }

    #[test]
    fn typed_keyed_binding_looks_up_names() {
        let params = json!({"subtrahend": 23, "minuend": 42});
        let (minuend, subtrahend): (i64, i64) =
            bind_typed_keyed(Some(&params), &["minuend", "subtrahend"]).expect("bind");

        assert_eq!((minuend, subtrahend), (42, 23));
    }

    #[test]
    fn typed_keyed_binding_rejects_wrong_key_count() {
        let params = json!({"a": 1});
        let err = bind_typed_keyed::<(i64,)>(Some(&params), &["a", "b"]).expect_err("bad keys");
        assert!(err.is_internal());
    }
}
