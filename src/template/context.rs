//! Conversion of a caller's local context into its serialized form.
//!
//! A context whose top level is a map keyed by anything other than text
//! (numbers, chars, enum variants, tuples) has no inspectable fields, even
//! though `serde_json` would happily stringify some of those keys.

use serde::Serialize;
use serde::ser::{self, Impossible};
use serde_json::Value as JsonValue;
use std::fmt::Display;
use thiserror::Error;
use tracing::debug;

/// Serialize `context` for patching and execution.
///
/// Contexts without inspectable fields become `Null`; that is never a
/// render failure.
pub(crate) fn to_context<T: Serialize + ?Sized>(context: &T) -> JsonValue {
    if let Err(Shape::NonTextKey) = context.serialize(TopLevel) {
        debug!("context map has non-text keys; rendering without local fields");
        return JsonValue::Null;
    }
    serde_json::to_value(context).unwrap_or_else(|err| {
        debug!(error = %err, "context is not representable; rendering without local fields");
        JsonValue::Null
    })
}

/// Why the shape check stopped.
#[derive(Debug, Error)]
enum Shape {
    #[error("not a map")]
    NotAMap,
    #[error("map key is not text")]
    NonTextKey,
    #[error("{0}")]
    Custom(String),
}

impl ser::Error for Shape {
    fn custom<T: Display>(msg: T) -> Self {
        Shape::Custom(msg.to_string())
    }
}

/// Generates methods that fail with `$error` for every scalar input.
macro_rules! reject_scalars {
    ($error:expr) => {
        reject_scalars!($error;
            serialize_bool(bool), serialize_i8(i8), serialize_i16(i16),
            serialize_i32(i32), serialize_i64(i64), serialize_i128(i128),
            serialize_u8(u8), serialize_u16(u16), serialize_u32(u32),
            serialize_u64(u64), serialize_u128(u128), serialize_f32(f32),
            serialize_f64(f64), serialize_char(char), serialize_bytes(&[u8]),
            serialize_none(), serialize_unit(), serialize_unit_struct(&'static str),
            serialize_unit_variant(&'static str, u32, &'static str)
        );
    };
    ($error:expr; $($method:ident($($arg:ty),*)),* $(,)?) => {
        $(
            fn $method(self, $(_: $arg),*) -> Result<(), Shape> {
                Err($error)
            }
        )*
    };
}

/// Generates the compound-value methods, all failing with `$error`.
macro_rules! reject_compounds {
    ($error:expr) => {
        fn serialize_newtype_variant<T: ?Sized + Serialize>(
            self,
            _: &'static str,
            _: u32,
            _: &'static str,
            _: &T,
        ) -> Result<(), Shape> {
            Err($error)
        }

        fn serialize_seq(self, _: Option<usize>) -> Result<Self::SerializeSeq, Shape> {
            Err($error)
        }

        fn serialize_tuple(self, _: usize) -> Result<Self::SerializeTuple, Shape> {
            Err($error)
        }

        fn serialize_tuple_struct(
            self,
            _: &'static str,
            _: usize,
        ) -> Result<Self::SerializeTupleStruct, Shape> {
            Err($error)
        }

        fn serialize_tuple_variant(
            self,
            _: &'static str,
            _: u32,
            _: &'static str,
            _: usize,
        ) -> Result<Self::SerializeTupleVariant, Shape> {
            Err($error)
        }

        fn serialize_struct(self, _: &'static str, _: usize) -> Result<Self::SerializeStruct, Shape> {
            Err($error)
        }

        fn serialize_struct_variant(
            self,
            _: &'static str,
            _: u32,
            _: &'static str,
            _: usize,
        ) -> Result<Self::SerializeStructVariant, Shape> {
            Err($error)
        }
    };
}

/// Succeeds only for a map whose keys are all text.
struct TopLevel;

impl ser::Serializer for TopLevel {
    type Ok = ();
    type Error = Shape;
    type SerializeSeq = Impossible<(), Shape>;
    type SerializeTuple = Impossible<(), Shape>;
    type SerializeTupleStruct = Impossible<(), Shape>;
    type SerializeTupleVariant = Impossible<(), Shape>;
    type SerializeMap = MapKeys;
    type SerializeStruct = Impossible<(), Shape>;
    type SerializeStructVariant = Impossible<(), Shape>;

    reject_scalars!(Shape::NotAMap);
    reject_scalars!(Shape::NotAMap; serialize_str(&str));
    reject_compounds!(Shape::NotAMap);

    fn serialize_some<T: ?Sized + Serialize>(self, value: &T) -> Result<(), Shape> {
        value.serialize(self)
    }

    fn serialize_newtype_struct<T: ?Sized + Serialize>(
        self,
        _: &'static str,
        value: &T,
    ) -> Result<(), Shape> {
        value.serialize(self)
    }

    fn serialize_map(self, _: Option<usize>) -> Result<MapKeys, Shape> {
        Ok(MapKeys)
    }
}

struct MapKeys;

impl ser::SerializeMap for MapKeys {
    type Ok = ();
    type Error = Shape;

    fn serialize_key<T: ?Sized + Serialize>(&mut self, key: &T) -> Result<(), Shape> {
        key.serialize(TextKey)
    }

    fn serialize_value<T: ?Sized + Serialize>(&mut self, _: &T) -> Result<(), Shape> {
        Ok(())
    }

    fn end(self) -> Result<(), Shape> {
        Ok(())
    }
}

/// Succeeds only for a string key.
struct TextKey;

impl ser::Serializer for TextKey {
    type Ok = ();
    type Error = Shape;
    type SerializeSeq = Impossible<(), Shape>;
    type SerializeTuple = Impossible<(), Shape>;
    type SerializeTupleStruct = Impossible<(), Shape>;
    type SerializeTupleVariant = Impossible<(), Shape>;
    type SerializeMap = Impossible<(), Shape>;
    type SerializeStruct = Impossible<(), Shape>;
    type SerializeStructVariant = Impossible<(), Shape>;

    reject_scalars!(Shape::NonTextKey);
    reject_compounds!(Shape::NonTextKey);

    fn serialize_str(self, _: &str) -> Result<(), Shape> {
        Ok(())
    }

    fn serialize_some<T: ?Sized + Serialize>(self, _: &T) -> Result<(), Shape> {
        Err(Shape::NonTextKey)
    }

    fn serialize_newtype_struct<T: ?Sized + Serialize>(
        self,
        _: &'static str,
        value: &T,
    ) -> Result<(), Shape> {
        value.serialize(self)
    }

    fn serialize_map(self, _: Option<usize>) -> Result<Self::SerializeMap, Shape> {
        Err(Shape::NonTextKey)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::{BTreeMap, HashMap};

    #[derive(Serialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
    enum Kind {
        Text,
    }

    #[derive(Serialize, PartialEq, Eq, Hash)]
    struct Name(String);

    #[derive(Serialize)]
    struct Wrapper(BTreeMap<String, i32>);

    #[test]
    fn text_keyed_maps_keep_their_fields() {
        let mut context = HashMap::new();
        context.insert("Text", "shown");
        assert_eq!(to_context(&context), json!({"Text": "shown"}));

        let mut named = HashMap::new();
        named.insert(Name("Text".to_string()), 1);
        assert_eq!(to_context(&named), json!({"Text": 1}));

        let wrapped = Wrapper(BTreeMap::from([("A".to_string(), 1)]));
        assert_eq!(to_context(&Some(wrapped)), json!({"A": 1}));
    }

    #[test]
    fn non_map_contexts_serialize_normally() {
        assert_eq!(to_context("text"), json!("text"));
        assert_eq!(to_context(&[1, 2]), json!([1, 2]));
        assert_eq!(to_context(&json!({"Nested": {"1": 2}})), json!({"Nested": {"1": 2}}));
    }

    #[test]
    fn enum_variant_keys_have_no_fields() {
        let context = BTreeMap::from([(Kind::Text, "leaked")]);
        assert_eq!(to_context(&context), JsonValue::Null);
    }

    #[test]
    fn char_and_number_keys_have_no_fields() {
        assert_eq!(to_context(&HashMap::from([('a', "leaked")])), JsonValue::Null);
        assert_eq!(to_context(&HashMap::from([(1, "one")])), JsonValue::Null);
        assert_eq!(to_context(&HashMap::from([(true, "yes")])), JsonValue::Null);
    }

    #[test]
    fn composite_keys_have_no_fields() {
        assert_eq!(to_context(&HashMap::from([((1, 2), "pair")])), JsonValue::Null);
    }
}
