use serde::{Deserialize, Serialize};

use super::err::ModelError;
use super::named::{Named, NamedMap};
use super::ty::{ArraySpecification, BaseType};

/// A named, typed value: a parameter or a storage declaration.
///
/// Without array specifications the variable is a scalar.
/// Otherwise it is an array with one dimension per specification, outermost first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variable {
    pub name: String,
    pub base_type: BaseType,
    #[serde(default)]
    pub array_specifications: Vec<ArraySpecification>,
}

impl Variable {
    pub fn scalar(name: impl Into<String>, base_type: BaseType) -> Self {
        Variable {
            name: name.into(),
            base_type,
            array_specifications: Vec::new(),
        }
    }

    pub fn array(
        name: impl Into<String>,
        base_type: BaseType,
        array_specifications: Vec<ArraySpecification>,
    ) -> Self {
        Variable {
            name: name.into(),
            base_type,
            array_specifications,
        }
    }

    pub fn dimensions(self: &Self) -> usize {
        self.array_specifications.len()
    }

    pub fn is_scalar(self: &Self) -> bool {
        self.array_specifications.is_empty()
    }

    /// Sizes of all the dimensions, if every one of them is fixed.
    pub fn fixed_extents(self: &Self) -> Option<Vec<u64>> {
        self.array_specifications
            .iter()
            .map(ArraySpecification::fixed_size)
            .collect()
    }
}

impl Named for Variable {
    const KIND: &'static str = "variable";

    fn name(&self) -> &str {
        &self.name
    }

    fn validate(&self) -> Result<(), ModelError> {
        if self.array_specifications.iter().any(|s| s.fixed_size() == Some(0)) {
            return Err(ModelError::ZeroExtent {
                name: self.name.clone(),
            });
        }
        Ok(())
    }
}

/// A group of related storage declarations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DataBlock {
    pub variables: NamedMap<Variable>,
}

impl DataBlock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(self: &mut Self, variable: Variable) -> Result<(), ModelError> {
        self.variables.insert(variable)
    }

    pub fn get(self: &Self, name: &str) -> Option<&Variable> {
        self.variables.get(name)
    }

    pub fn iter(self: &Self) -> impl Iterator<Item = &Variable> {
        self.variables.iter()
    }

    pub fn len(self: &Self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(self: &Self) -> bool {
        self.variables.is_empty()
    }
}
