//! Addresses of values inside captured object graphs.
//!
//! A [`ValuePath`] is an immutable sequence of [`MemberRef`]s. Its text form
//! joins the components with dots, e.g. `this().items.elementAt(3)`:
//!
//! | component            | text               |
//! |----------------------|--------------------|
//! | field                | `name`             |
//! | array element        | `elementAt(i)`     |
//! | array length         | `length()`         |
//! | receiver             | `this()`           |
//! | named parameter      | `param(name)`      |
//! | return value         | `return()`         |
//! | thrown exception     | `exception()`      |
//!
//! Field and parameter names that are not identifiers (or that would be
//! misread, such as `a.b`) are written between backticks, with `` ` `` and
//! `\` escaped by a backslash: `` this().`a.b` ``, `` param(`x y`) ``.

use crate::domain::error::PathError;
use crate::domain::value::Addressable;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

const IDENT: &str = r"[\p{XID_Start}_$][\p{XID_Continue}$]*";
const QUOTED: &str = r"`(?:[^`\\]|\\.)*`";

static COMPONENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"^(?s:(?P<special>this|return|exception|length)\(\)|elementAt\((?P<index>[0-9]+)\)|param\((?P<param>{IDENT}|{QUOTED})\)|(?P<field>{IDENT}|{QUOTED}))$"
    ))
    .expect("component pattern is valid")
});

static BARE_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!("^{IDENT}$")).expect("identifier pattern is valid"));

/// Write `name` bare when it is an identifier, backtick-quoted otherwise.
fn write_name(f: &mut fmt::Formatter<'_>, name: &str) -> fmt::Result {
    if BARE_NAME.is_match(name) {
        return f.write_str(name);
    }
    f.write_str("`")?;
    for c in name.chars() {
        if c == '`' || c == '\\' {
            f.write_str("\\")?;
        }
        write!(f, "{c}")?;
    }
    f.write_str("`")
}

/// Inverse of [`write_name`]; the regex has already checked the quoting.
fn read_name(text: &str) -> String {
    let Some(inner) = text.strip_prefix('`').and_then(|t| t.strip_suffix('`')) else {
        return text.to_string();
    };
    let mut name = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => name.extend(chars.next()),
            c => name.push(c),
        }
    }
    name
}

/// Split path text on the dots that are not inside backticks.
fn split_components(text: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut quoted = false;
    let mut escaped = false;
    let mut begin = 0;
    for (i, c) in text.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' if quoted => escaped = true,
            '`' => quoted = !quoted,
            '.' if !quoted => {
                parts.push(&text[begin..i]);
                begin = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&text[begin..]);
    parts
}

/// One step of a value path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MemberRef {
    Field(String),
    Element(u32),
    Length,
    This,
    Parameter(String),
    ReturnValue,
    Exception,
}

impl fmt::Display for MemberRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemberRef::Field(name) => write_name(f, name),
            MemberRef::Element(index) => write!(f, "elementAt({index})"),
            MemberRef::Length => f.write_str("length()"),
            MemberRef::This => f.write_str("this()"),
            MemberRef::Parameter(name) => {
                f.write_str("param(")?;
                write_name(f, name)?;
                f.write_str(")")
            }
            MemberRef::ReturnValue => f.write_str("return()"),
            MemberRef::Exception => f.write_str("exception()"),
        }
    }
}

impl FromStr for MemberRef {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || PathError::Malformed {
            component: s.to_string(),
        };
        let caps = COMPONENT.captures(s).ok_or_else(malformed)?;
        if let Some(special) = caps.name("special") {
            return Ok(match special.as_str() {
                "this" => MemberRef::This,
                "return" => MemberRef::ReturnValue,
                "exception" => MemberRef::Exception,
                _ => MemberRef::Length,
            });
        }
        if let Some(index) = caps.name("index") {
            let index = index.as_str().parse().map_err(|_| malformed())?;
            return Ok(MemberRef::Element(index));
        }
        if let Some(param) = caps.name("param") {
            return Ok(MemberRef::Parameter(read_name(param.as_str())));
        }
        caps.name("field")
            .map(|field| MemberRef::Field(read_name(field.as_str())))
            .ok_or_else(malformed)
    }
}

/// Immutable address of a value, relative to a root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ValuePath {
    components: Vec<MemberRef>,
}

impl ValuePath {
    /// The empty path, addressing the root itself.
    pub fn root() -> Self {
        Self::default()
    }

    /// Start a builder seeded with this path's components. `self` is left
    /// untouched.
    pub fn append(&self) -> ValuePathBuilder {
        ValuePathBuilder {
            components: self.components.clone(),
        }
    }

    pub fn components(&self) -> &[MemberRef] {
        &self.components
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// All components but the last.
    pub fn parent(&self) -> Option<ValuePath> {
        let (_, prefix) = self.components.split_last()?;
        Some(ValuePath {
            components: prefix.to_vec(),
        })
    }

    pub fn last(&self) -> Option<&MemberRef> {
        self.components.last()
    }

    /// Walk `root` along every component.
    pub fn resolve<'a, V: Addressable>(&self, root: &'a V) -> Result<Cow<'a, V>, PathError> {
        self.walk(&self.components, root)
    }

    /// Walk `root` along every component but the last.
    pub fn resolve_parent<'a, V: Addressable>(&self, root: &'a V) -> Result<Cow<'a, V>, PathError> {
        let (_, prefix) = self.components.split_last().ok_or(PathError::NoParent)?;
        self.walk(prefix, root)
    }

    fn walk<'a, V: Addressable>(
        &self,
        members: &[MemberRef],
        root: &'a V,
    ) -> Result<Cow<'a, V>, PathError> {
        let mut current = Cow::Borrowed(root);
        for (position, member) in members.iter().enumerate() {
            let next = match &current {
                Cow::Borrowed(value) => V::member(*value, member),
                Cow::Owned(value) => value.member(member).map(|v| Cow::Owned(v.into_owned())),
            };
            current = next.ok_or_else(|| PathError::Unresolved {
                path: self.to_string(),
                member: member.to_string(),
                position,
            })?;
        }
        Ok(current)
    }
}

impl From<Vec<MemberRef>> for ValuePath {
    fn from(components: Vec<MemberRef>) -> Self {
        Self { components }
    }
}

impl fmt::Display for ValuePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, component) in self.components.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{component}")?;
        }
        Ok(())
    }
}

impl FromStr for ValuePath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Ok(ValuePath::root());
        }
        split_components(s)
            .into_iter()
            .map(MemberRef::from_str)
            .collect::<Result<Vec<_>, _>>()
            .map(ValuePath::from)
    }
}

impl Serialize for ValuePath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ValuePath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

/// Accumulates components for a new [`ValuePath`].
#[derive(Debug, Clone, Default)]
pub struct ValuePathBuilder {
    components: Vec<MemberRef>,
}

impl ValuePathBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn member(mut self, member: MemberRef) -> Self {
        self.components.push(member);
        self
    }

    pub fn field(self, name: impl Into<String>) -> Self {
        self.member(MemberRef::Field(name.into()))
    }

    pub fn element(self, index: u32) -> Self {
        self.member(MemberRef::Element(index))
    }

    pub fn length(self) -> Self {
        self.member(MemberRef::Length)
    }

    pub fn this(self) -> Self {
        self.member(MemberRef::This)
    }

    pub fn parameter(self, name: impl Into<String>) -> Self {
        self.member(MemberRef::Parameter(name.into()))
    }

    pub fn return_value(self) -> Self {
        self.member(MemberRef::ReturnValue)
    }

    pub fn exception(self) -> Self {
        self.member(MemberRef::Exception)
    }

    pub fn build(self) -> ValuePath {
        ValuePath {
            components: self.components,
        }
    }
}
