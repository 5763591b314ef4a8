use std::collections::HashSet;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

use super::err::ModelError;
use super::named::{check_name, Named, NamedMap};
use super::ty::BaseType;
use super::var::{DataBlock, Variable};

/// A callable unit of an algorithm. Also describes the callbacks an
/// algorithm can invoke.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlgorithmFunction {
    pub name: String,
    #[serde(default)]
    pub parameters: NamedMap<Variable>,
    /// `None` for procedures
    #[serde(default)]
    pub return_type: Option<BaseType>,
}

impl AlgorithmFunction {
    pub fn new(name: impl Into<String>) -> Self {
        AlgorithmFunction {
            name: name.into(),
            parameters: NamedMap::new(),
            return_type: None,
        }
    }

    pub fn returning(self: Self, return_type: BaseType) -> Self {
        AlgorithmFunction {
            return_type: Some(return_type),
            ..self
        }
    }

    /// Appends a parameter; parameter names must be unique within the function.
    pub fn add_parameter(self: &mut Self, parameter: Variable) -> Result<(), ModelError> {
        self.parameters.insert(parameter)
    }
}

impl Named for AlgorithmFunction {
    const KIND: &'static str = "function";

    fn name(&self) -> &str {
        &self.name
    }
}

/// One schedulable unit of work. At run time, an algorithm is a process.
///
/// Shared data, callbacks and functions live in the same namespace, so a
/// name can be used by only one of them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Algorithm {
    pub name: String,
    /// Shared state, declared before everything else
    #[serde(default)]
    pub data: DataBlock,
    /// Provided by the caller of the algorithm, which may invoke them
    #[serde(default)]
    pub callbacks: NamedMap<AlgorithmFunction>,
    #[serde(default)]
    pub functions: NamedMap<AlgorithmFunction>,
}

impl Algorithm {
    pub fn new(name: impl Into<String>) -> Self {
        Algorithm {
            name: name.into(),
            data: DataBlock::new(),
            callbacks: NamedMap::new(),
            functions: NamedMap::new(),
        }
    }

    fn declares(self: &Self, name: &str) -> bool {
        self.data.get(name).is_some()
            || self.callbacks.contains(name)
            || self.functions.contains(name)
    }

    pub fn add_function(self: &mut Self, function: AlgorithmFunction) -> Result<(), ModelError> {
        if self.declares(&function.name) {
            return Err(ModelError::DuplicateName {
                kind: "function",
                name: function.name,
            });
        }
        self.functions.insert(function)
    }

    pub fn add_callback(self: &mut Self, callback: AlgorithmFunction) -> Result<(), ModelError> {
        if self.declares(&callback.name) {
            return Err(ModelError::DuplicateName {
                kind: "callback",
                name: callback.name,
            });
        }
        self.callbacks.insert(callback)
    }

    pub fn function(self: &Self, name: &str) -> Option<&AlgorithmFunction> {
        self.functions.get(name)
    }

    pub fn callback(self: &Self, name: &str) -> Option<&AlgorithmFunction> {
        self.callbacks.get(name)
    }
}

impl Named for Algorithm {
    const KIND: &'static str = "algorithm";

    fn name(&self) -> &str {
        &self.name
    }

    fn validate(&self) -> Result<(), ModelError> {
        let mut seen = HashSet::new();
        let members = self
            .data
            .iter()
            .map(|v| ("variable", v.name.as_str()))
            .chain(self.callbacks.names().map(|n| ("callback", n)))
            .chain(self.functions.names().map(|n| ("function", n)));
        for (kind, name) in members {
            if !seen.insert(name) {
                return Err(ModelError::DuplicateName {
                    kind,
                    name: name.to_owned(),
                });
            }
        }
        Ok(())
    }
}

/// Group of algorithms exposed together by a generated program.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interface {
    #[serde(deserialize_with = "interface_name")]
    pub name: String,
    #[serde(default)]
    pub algorithms: NamedMap<Algorithm>,
}

fn interface_name<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let name = String::deserialize(deserializer)?;
    check_name("interface", &name).map_err(D::Error::custom)?;
    Ok(name)
}

impl Interface {
    pub fn new(name: impl Into<String>) -> Result<Self, ModelError> {
        let name = name.into();
        check_name("interface", &name)?;
        Ok(Interface {
            name,
            algorithms: NamedMap::new(),
        })
    }

    pub fn add_algorithm(self: &mut Self, algorithm: Algorithm) -> Result<(), ModelError> {
        self.algorithms.insert(algorithm)
    }

    pub fn algorithm(self: &Self, name: &str) -> Option<&Algorithm> {
        self.algorithms.get(name)
    }
}
