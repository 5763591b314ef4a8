use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Type of a scalar value (semantics)
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BaseType {
    /// Signed integer, as wide as the target's `int`
    Int,
}

impl BaseType {
    pub fn all() -> Vec<Self> {
        use BaseType::*;
        vec![Int]
    }

    pub fn name(self: Self) -> &'static str {
        match self {
            BaseType::Int => "int",
        }
    }
}

impl fmt::Display for BaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BaseType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all().into_iter().find(|k| k.name() == s).ok_or(())
    }
}

/// Number of items along one array dimension.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Extent {
    /// Size known only at run time
    Unbounded,
    /// Size fixed at generation time
    Fixed(u64),
}

impl Default for Extent {
    fn default() -> Self {
        Extent::Unbounded
    }
}

/// One dimension of an array variable. Indices always start at zero.
#[derive(Debug, Clone, Copy, Default, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArraySpecification {
    #[serde(default)]
    pub extent: Extent,
}

impl ArraySpecification {
    pub fn unbounded() -> Self {
        ArraySpecification {
            extent: Extent::Unbounded,
        }
    }

    pub fn fixed(size: u64) -> Self {
        ArraySpecification {
            extent: Extent::Fixed(size),
        }
    }

    pub fn fixed_size(self: &Self) -> Option<u64> {
        match self.extent {
            Extent::Fixed(size) => Some(size),
            Extent::Unbounded => None,
        }
    }
}
