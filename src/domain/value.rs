//! Captured object-value graphs.
//!
//! A captured invocation record is the usual root a [`ValuePath`] is resolved
//! against: it exposes the receiver, the named parameters, the return value
//! and the thrown exception as special members.
//!
//! [`ValuePath`]: crate::domain::value_path::ValuePath

use crate::domain::value_path::MemberRef;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::BTreeMap;

/// A value graph that can be walked one member reference at a time.
pub trait Addressable: Clone {
    /// The value referenced by `member`, or `None` if this value has no such
    /// member. Computed members (such as an array's length) are returned owned.
    fn member(&self, member: &MemberRef) -> Option<Cow<'_, Self>>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CapturedValue {
    Null,
    Bool {
        value: bool,
    },
    Int {
        value: i64,
    },
    Float {
        value: f64,
    },
    Str {
        value: String,
    },
    Object {
        class: String,
        #[serde(default)]
        fields: BTreeMap<String, CapturedValue>,
    },
    Array {
        #[serde(default)]
        elements: Vec<CapturedValue>,
    },
    Invocation {
        method: String,
        #[serde(default)]
        this: Option<Box<CapturedValue>>,
        #[serde(default)]
        parameters: Vec<CapturedParameter>,
        #[serde(default)]
        return_value: Option<Box<CapturedValue>>,
        #[serde(default)]
        exception: Option<Box<CapturedValue>>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapturedParameter {
    pub name: String,
    pub value: CapturedValue,
}

impl CapturedValue {
    /// Short type label used in diagnostics.
    pub fn type_label(&self) -> &str {
        match self {
            CapturedValue::Null => "null",
            CapturedValue::Bool { .. } => "bool",
            CapturedValue::Int { .. } => "int",
            CapturedValue::Float { .. } => "float",
            CapturedValue::Str { .. } => "string",
            CapturedValue::Object { class, .. } => class,
            CapturedValue::Array { .. } => "array",
            CapturedValue::Invocation { method, .. } => method,
        }
    }
}

impl Addressable for CapturedValue {
    fn member(&self, member: &MemberRef) -> Option<Cow<'_, Self>> {
        match (self, member) {
            (CapturedValue::Object { fields, .. }, MemberRef::Field(name)) => {
                fields.get(name).map(Cow::Borrowed)
            }
            (CapturedValue::Array { elements }, MemberRef::Element(index)) => {
                elements.get(*index as usize).map(Cow::Borrowed)
            }
            (CapturedValue::Array { elements }, MemberRef::Length) => {
                Some(Cow::Owned(CapturedValue::Int {
                    value: elements.len() as i64,
                }))
            }
            (CapturedValue::Invocation { this, .. }, MemberRef::This) => {
                this.as_deref().map(Cow::Borrowed)
            }
            (CapturedValue::Invocation { parameters, .. }, MemberRef::Parameter(name)) => {
                parameters
                    .iter()
                    .find(|p| &p.name == name)
                    .map(|p| Cow::Borrowed(&p.value))
            }
            (CapturedValue::Invocation { return_value, .. }, MemberRef::ReturnValue) => {
                return_value.as_deref().map(Cow::Borrowed)
            }
            (CapturedValue::Invocation { exception, .. }, MemberRef::Exception) => {
                exception.as_deref().map(Cow::Borrowed)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_array_length_is_computed() {
        let array = CapturedValue::Array {
            elements: vec![CapturedValue::Null, CapturedValue::Int { value: 3 }],
        };
        let len = array.member(&MemberRef::Length).unwrap();
        assert_eq!(len.into_owned(), CapturedValue::Int { value: 2 });
        assert!(array.member(&MemberRef::Element(2)).is_none());
    }

    #[test]
    fn test_members_do_not_apply_to_scalars() {
        let value = CapturedValue::Int { value: 1 };
        assert!(value.member(&MemberRef::Field("x".into())).is_none());
        assert!(value.member(&MemberRef::This).is_none());
    }

    #[test]
    fn test_deserialize_invocation() {
        let json = r#"{
            "kind": "invocation",
            "method": "Cart.total",
            "parameters": [{"name": "discount", "value": {"kind": "int", "value": 5}}]
        }"#;
        let value: CapturedValue = serde_json::from_str(json).unwrap();
        let discount = value
            .member(&MemberRef::Parameter("discount".into()))
            .unwrap();
        assert_eq!(*discount, CapturedValue::Int { value: 5 });
        assert!(value.member(&MemberRef::ReturnValue).is_none());
    }
}
