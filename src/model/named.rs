//! Name-keyed collections.
//!
//! Every container of the model (parameters, data blocks, algorithms,
//! interfaces) is keyed by the name of its items, but code generation must
//! visit the items in the order they were declared. `NamedMap` gives both.

use std::fmt;
use std::marker::PhantomData;

use indexmap::IndexMap;
use serde::de::{Error as _, SeqAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::err::ModelError;

/// Reserved words of the generated language.
const KEYWORDS: &[&str] = &[
    "alignas", "alignof", "and", "and_eq", "asm", "auto", "bitand", "bitor", "bool", "break",
    "case", "catch", "char", "char8_t", "char16_t", "char32_t", "class", "compl", "concept",
    "const", "consteval", "constexpr", "constinit", "const_cast", "continue", "co_await",
    "co_return", "co_yield", "decltype", "default", "delete", "do", "double", "dynamic_cast",
    "else", "enum", "explicit", "export", "extern", "false", "float", "for", "friend", "goto",
    "if", "inline", "int", "long", "mutable", "namespace", "new", "noexcept", "not", "not_eq",
    "nullptr", "operator", "or", "or_eq", "private", "protected", "public", "register",
    "reinterpret_cast", "requires", "return", "short", "signed", "sizeof", "static",
    "static_assert", "static_cast", "struct", "switch", "template", "this", "thread_local",
    "throw", "true", "try", "typedef", "typeid", "typename", "union", "unsigned", "using",
    "virtual", "void", "volatile", "wchar_t", "while", "xor", "xor_eq",
];

/// Checks that `name` can be emitted as an identifier: `[A-Za-z_][A-Za-z0-9_]*`
/// and not a keyword.
pub fn check_name(kind: &'static str, name: &str) -> Result<(), ModelError> {
    let mut chars = name.chars();
    let first = match chars.next() {
        Some(c) => c,
        None => return Err(ModelError::EmptyName { kind }),
    };
    let valid = (first.is_ascii_alphabetic() || first == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !KEYWORDS.contains(&name);
    if !valid {
        return Err(ModelError::InvalidName {
            kind,
            name: name.to_owned(),
        });
    }
    Ok(())
}

/// An item that can be stored in a `NamedMap`.
pub trait Named {
    /// What the item is, used in error messages.
    const KIND: &'static str;

    fn name(self: &Self) -> &str;

    /// Item-specific checks, run before the item enters a map.
    fn validate(self: &Self) -> Result<(), ModelError> {
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedMap<T> {
    items: IndexMap<String, T>,
}

impl<T> Default for NamedMap<T> {
    fn default() -> Self {
        NamedMap {
            items: IndexMap::new(),
        }
    }
}

impl<T: Named> NamedMap<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Checks that `item` may be stored at position `index`.
    /// `index` is `None` for a new item.
    fn admit(self: &Self, item: &T, index: Option<usize>) -> Result<(), ModelError> {
        let name = item.name();
        check_name(T::KIND, name)?;
        item.validate()?;
        match self.items.get_index_of(name) {
            Some(other) if Some(other) != index => Err(ModelError::DuplicateName {
                kind: T::KIND,
                name: name.to_owned(),
            }),
            _ => Ok(()),
        }
    }

    /// Adds `item` after all the existing ones.
    ///
    /// Names are never overwritten: if an item with the same name is already
    /// present, the map is left untouched and `DuplicateName` is returned.
    pub fn insert(self: &mut Self, item: T) -> Result<(), ModelError> {
        self.admit(&item, None)?;
        self.items.insert(item.name().to_owned(), item);
        Ok(())
    }

    pub fn get(self: &Self, name: &str) -> Option<&T> {
        self.items.get(name)
    }

    /// Applies `f` to the item called `name`, keeping its position.
    ///
    /// The modified item is checked like a new one, so a rename onto an
    /// existing name fails. On failure the map is left untouched.
    pub fn update<F>(self: &mut Self, name: &str, f: F) -> Result<(), ModelError>
    where
        T: Clone,
        F: FnOnce(&mut T),
    {
        let (index, _, item) = self
            .items
            .get_full(name)
            .ok_or_else(|| ModelError::Undefined {
                kind: T::KIND,
                name: name.to_owned(),
            })?;
        let mut item = item.clone();
        f(&mut item);
        self.admit(&item, Some(index))?;
        self.items.shift_remove_index(index);
        self.items.shift_insert(index, item.name().to_owned(), item);
        Ok(())
    }

    pub fn contains(self: &Self, name: &str) -> bool {
        self.items.contains_key(name)
    }

    /// Items in declaration order.
    pub fn iter(self: &Self) -> impl Iterator<Item = &T> {
        self.items.values()
    }

    pub fn names(self: &Self) -> impl Iterator<Item = &str> {
        self.items.keys().map(|k| k.as_str())
    }

    pub fn len(self: &Self) -> usize {
        self.items.len()
    }

    pub fn is_empty(self: &Self) -> bool {
        self.items.is_empty()
    }
}

impl<T: Named> std::convert::TryFrom<Vec<T>> for NamedMap<T> {
    type Error = ModelError;

    fn try_from(items: Vec<T>) -> Result<Self, Self::Error> {
        let mut map = NamedMap::new();
        for item in items {
            map.insert(item)?;
        }
        Ok(map)
    }
}

impl<'a, T: Named> IntoIterator for &'a NamedMap<T> {
    type Item = &'a T;
    type IntoIter = indexmap::map::Values<'a, String, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.values()
    }
}

impl<T: Named + Serialize> Serialize for NamedMap<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.items.values())
    }
}

struct NamedMapVisitor<T>(PhantomData<T>);

impl<'de, T: Named + Deserialize<'de>> Visitor<'de> for NamedMapVisitor<T> {
    type Value = NamedMap<T>;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "a list of uniquely named {}s", T::KIND)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
        let mut map = NamedMap::new();
        while let Some(item) = seq.next_element()? {
            map.insert(item).map_err(A::Error::custom)?;
        }
        Ok(map)
    }
}

impl<'de, T: Named + Deserialize<'de>> Deserialize<'de> for NamedMap<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_seq(NamedMapVisitor(PhantomData))
    }
}
