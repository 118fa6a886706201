use std::fmt;
use std::ops::Index;
use std::sync::Arc;

use crate::error::SqlConduitError;
use crate::types::{DbType, DbValue, ParameterDirection};

/// One bound parameter of a statement.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DbParameter {
    pub name: String,
    pub value: DbValue,
    pub db_type: Option<DbType>,
    pub direction: ParameterDirection,
}

impl DbParameter {
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<DbValue>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            db_type: None,
            direction: ParameterDirection::Input,
        }
    }

    #[must_use]
    pub fn with_type(mut self, db_type: DbType) -> Self {
        self.db_type = Some(db_type);
        self
    }

    #[must_use]
    pub fn with_direction(mut self, direction: ParameterDirection) -> Self {
        self.direction = direction;
        self
    }

    /// The explicit type hint, or the type inferred from the value.
    #[must_use]
    pub fn effective_type(&self) -> DbType {
        self.db_type.unwrap_or_else(|| self.value.inferred_type())
    }

    /// The name with any leading sigil (`@`, `:`, `$`) removed.
    #[must_use]
    pub fn bare_name(&self) -> &str {
        self.name.trim_start_matches(['@', ':', '$'])
    }
}

/// Materializes provider-native parameters when one is added by value.
pub trait ParameterFactory: Send + Sync {
    fn create_parameter(
        &self,
        name: &str,
        value: DbValue,
        db_type: Option<DbType>,
        direction: ParameterDirection,
    ) -> DbParameter;
}

/// Factory that stores names as given and infers a type hint from the value.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultParameterFactory;

impl ParameterFactory for DefaultParameterFactory {
    fn create_parameter(
        &self,
        name: &str,
        value: DbValue,
        db_type: Option<DbType>,
        direction: ParameterDirection,
    ) -> DbParameter {
        let db_type = db_type.or_else(|| Some(value.inferred_type()));
        DbParameter {
            name: name.to_string(),
            value,
            db_type,
            direction,
        }
    }
}

/// Ordered parameters, addressable by position and by name.
///
/// Indexing by name returns the first case-insensitive match, while [`ParameterList::contains`]
/// is an exact, case-sensitive test. Duplicate names are allowed.
/// ```rust
/// use sql_conduit::prelude::*;
///
/// let mut params = ParameterList::default();
/// params.add("Name", "alice")?;
/// assert_eq!(params["name"].value, DbValue::Text("alice".into()));
/// assert!(!params.contains("name"));
/// # Ok::<(), SqlConduitError>(())
/// ```
#[derive(Clone)]
pub struct ParameterList {
    factory: Arc<dyn ParameterFactory>,
    items: Vec<DbParameter>,
}

impl fmt::Debug for ParameterList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParameterList")
            .field("items", &self.items)
            .finish_non_exhaustive()
    }
}

impl Default for ParameterList {
    fn default() -> Self {
        Self::new(Arc::new(DefaultParameterFactory))
    }
}

impl ParameterList {
    #[must_use]
    pub fn new(factory: Arc<dyn ParameterFactory>) -> Self {
        Self {
            factory,
            items: Vec::new(),
        }
    }

    fn push_created(
        &mut self,
        name: &str,
        value: DbValue,
        db_type: Option<DbType>,
        direction: ParameterDirection,
    ) -> Result<&mut DbParameter, SqlConduitError> {
        if name.is_empty() {
            return Err(SqlConduitError::invalid_argument(
                "parameter name must not be empty",
            ));
        }
        let parameter = self
            .factory
            .create_parameter(name, value, db_type, direction);
        self.items.push(parameter);
        let last = self.items.len() - 1;
        Ok(&mut self.items[last])
    }

    /// Add an input parameter, inferring its type from the value.
    ///
    /// # Errors
    /// Returns `SqlConduitError::InvalidArgument` if `name` is empty.
    pub fn add(
        &mut self,
        name: &str,
        value: impl Into<DbValue>,
    ) -> Result<&mut DbParameter, SqlConduitError> {
        self.push_created(name, value.into(), None, ParameterDirection::Input)
    }

    /// # Errors
    /// Returns `SqlConduitError::InvalidArgument` if `name` is empty.
    pub fn add_typed(
        &mut self,
        name: &str,
        value: impl Into<DbValue>,
        db_type: DbType,
    ) -> Result<&mut DbParameter, SqlConduitError> {
        self.push_created(name, value.into(), Some(db_type), ParameterDirection::Input)
    }

    /// # Errors
    /// Returns `SqlConduitError::InvalidArgument` if `name` is empty.
    pub fn add_directed(
        &mut self,
        name: &str,
        value: impl Into<DbValue>,
        direction: ParameterDirection,
    ) -> Result<&mut DbParameter, SqlConduitError> {
        self.push_created(name, value.into(), None, direction)
    }

    /// # Errors
    /// Returns `SqlConduitError::InvalidArgument` if `name` is empty.
    pub fn add_full(
        &mut self,
        name: &str,
        value: impl Into<DbValue>,
        db_type: DbType,
        direction: ParameterDirection,
    ) -> Result<&mut DbParameter, SqlConduitError> {
        self.push_created(name, value.into(), Some(db_type), direction)
    }

    /// Let `populate` fill in a fresh parameter, then append it.
    ///
    /// # Errors
    /// Returns `SqlConduitError::InvalidArgument` if the populated parameter has an empty name.
    pub fn add_with<F>(&mut self, populate: F) -> Result<&mut DbParameter, SqlConduitError>
    where
        F: FnOnce(&mut DbParameter),
    {
        let mut parameter = DbParameter::default();
        populate(&mut parameter);
        if parameter.name.is_empty() {
            return Err(SqlConduitError::invalid_argument(
                "populated parameter has no name",
            ));
        }
        self.items.push(parameter);
        let last = self.items.len() - 1;
        Ok(&mut self.items[last])
    }

    /// Append already-built parameters in order.
    ///
    /// # Errors
    /// Returns `SqlConduitError::InvalidArgument` if any parameter has an empty name; parameters
    /// before the offending one stay appended.
    pub fn extend_from<I>(&mut self, parameters: I) -> Result<(), SqlConduitError>
    where
        I: IntoIterator<Item = DbParameter>,
    {
        for parameter in parameters {
            if parameter.name.is_empty() {
                return Err(SqlConduitError::invalid_argument(
                    "parameter name must not be empty",
                ));
            }
            self.items.push(parameter);
        }
        Ok(())
    }

    /// Append one input parameter per `(name, value)` entry, e.g. from a `HashMap`.
    ///
    /// # Errors
    /// Returns `SqlConduitError::InvalidArgument` if any name is empty.
    pub fn extend_from_map<I, K, V>(&mut self, entries: I) -> Result<(), SqlConduitError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<DbValue>,
    {
        for (name, value) in entries {
            self.add(name.as_ref(), value)?;
        }
        Ok(())
    }

    /// Exact, case-sensitive name test.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.items.iter().any(|p| p.name == name)
    }

    /// First parameter whose name matches ignoring ASCII case.
    #[must_use]
    pub fn get_by_name(&self, name: &str) -> Option<&DbParameter> {
        self.items
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
    }

    #[must_use]
    pub fn get_by_name_mut(&mut self, name: &str) -> Option<&mut DbParameter> {
        self.items
            .iter_mut()
            .find(|p| p.name.eq_ignore_ascii_case(name))
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&DbParameter> {
        self.items.get(index)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DbParameter> {
        self.items.iter()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[DbParameter] {
        &self.items
    }
}

impl Index<usize> for ParameterList {
    type Output = DbParameter;

    fn index(&self, index: usize) -> &Self::Output {
        &self.items[index]
    }
}

impl Index<&str> for ParameterList {
    type Output = DbParameter;

    /// # Panics
    /// Panics if no parameter matches `name`; use [`ParameterList::get_by_name`] to probe.
    fn index(&self, name: &str) -> &Self::Output {
        match self.get_by_name(name) {
            Some(parameter) => parameter,
            None => panic!("no parameter named {name:?}"),
        }
    }
}

impl<'a> IntoIterator for &'a ParameterList {
    type Item = &'a DbParameter;
    type IntoIter = std::slice::Iter<'a, DbParameter>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_is_case_insensitive_but_contains_is_not() {
        let mut params = ParameterList::default();
        params.add("Name", "v").unwrap();
        assert_eq!(params["name"].name, "Name");
        assert!(!params.contains("name"));
        assert!(params.contains("Name"));
    }

    #[test]
    fn first_match_wins_for_duplicates() {
        let mut params = ParameterList::default();
        params.add("@id", 1).unwrap();
        params.add("@ID", 2).unwrap();
        assert_eq!(params.len(), 2);
        assert_eq!(params["@id"].value, DbValue::Int(1));
        assert_eq!(params["@Id"].value, DbValue::Int(1));
    }

    #[test]
    fn empty_names_are_rejected() {
        let mut params = ParameterList::default();
        assert!(matches!(
            params.add("", 1),
            Err(SqlConduitError::InvalidArgument(_))
        ));
        assert!(matches!(
            params.add_with(|p| p.value = DbValue::Int(3)),
            Err(SqlConduitError::InvalidArgument(_))
        ));
        assert!(params.is_empty());
    }

    #[test]
    fn mutators_record_type_and_direction() {
        let mut params = ParameterList::default();
        params.add_typed("a", "1", DbType::Int).unwrap();
        params
            .add_directed("b", DbValue::Null, ParameterDirection::Output)
            .unwrap();
        params
            .add_full("c", 2.5, DbType::Float, ParameterDirection::InputOutput)
            .unwrap();
        params
            .add_with(|p| {
                p.name = "d".into();
                p.direction = ParameterDirection::ReturnValue;
            })
            .unwrap();
        assert_eq!(params[0].db_type, Some(DbType::Int));
        assert_eq!(params[1].direction, ParameterDirection::Output);
        assert_eq!(params[2].effective_type(), DbType::Float);
        assert_eq!(params[3].direction, ParameterDirection::ReturnValue);
        let names: Vec<_> = params.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn bulk_append_keeps_order() {
        let mut params = ParameterList::default();
        params
            .extend_from(vec![DbParameter::new("x", 1), DbParameter::new("y", 2)])
            .unwrap();
        let mut other = ParameterList::default();
        other.extend_from(params.iter().cloned()).unwrap();
        assert_eq!(other.len(), 2);
        assert_eq!(other[1].name, "y");
        assert_eq!(DbParameter::new("@x", 1).bare_name(), "x");
    }
}
