//! Per-component parameter storage
//!
//! Every model component owns one [`ParameterStore`]: an ordered list of
//! [`Parameter`]s. The order is the order in which the component declared its
//! parameters and is what the model set uses to lay out its flat vector.

use serde::{Deserialize, Serialize};

use crate::parameters::parameter::{Parameter, ParameterError};

/// Ordered collection of the parameters of one component
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParameterStore {
    params: Vec<Parameter>,
}

impl ParameterStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: append a parameter. Names are not checked; see [`ParameterStore::push`].
    pub fn with(mut self, param: Parameter) -> Self {
        self.params.push(param);
        self
    }

    /// Append a parameter, rejecting duplicate names
    pub fn push(&mut self, param: Parameter) -> Result<(), ParameterError> {
        if self.index_of(param.name()).is_some() {
            return Err(ParameterError::DuplicateParameter {
                name: param.name().to_string(),
            });
        }
        self.params.push(param);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.params.iter().position(|p| p.name() == name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.params.iter().map(|p| p.name()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Parameter> {
        self.params.iter()
    }

    pub fn get(&self, name: &str) -> Option<&Parameter> {
        self.params.iter().find(|p| p.name() == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Parameter> {
        self.params.iter_mut().find(|p| p.name() == name)
    }

    pub fn at(&self, index: usize) -> Option<&Parameter> {
        self.params.get(index)
    }

    pub fn at_mut(&mut self, index: usize) -> Option<&mut Parameter> {
        self.params.get_mut(index)
    }

    /// Value by declaration index; NaN if the index is out of range.
    ///
    /// Components read their own parameters through fixed indices so that the
    /// hot evaluation paths avoid string lookups.
    pub fn value(&self, index: usize) -> f64 {
        self.params.get(index).map_or(f64::NAN, |p| p.value())
    }

    pub fn value_of(&self, name: &str) -> Result<f64, ParameterError> {
        self.get(name)
            .map(|p| p.value())
            .ok_or_else(|| ParameterError::ParameterNotFound {
                name: name.to_string(),
            })
    }

    pub fn set_value(&mut self, name: &str, value: f64) -> Result<(), ParameterError> {
        let param = self
            .get_mut(name)
            .ok_or_else(|| ParameterError::ParameterNotFound {
                name: name.to_string(),
            })?;
        param.set_value(value);
        Ok(())
    }

    /// Current values in declaration order
    pub fn values(&self) -> Vec<f64> {
        self.params.iter().map(|p| p.value()).collect()
    }
}
