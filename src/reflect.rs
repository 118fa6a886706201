//! Per-type field tables for populating caller types from named columns.
//!
//! The explicit closure passed to `Statement::execute_for_each_row` is the primary mapping
//! path. This module backs the slower, map-driven path: a type opts in by implementing
//! [`FieldMapped`], usually through [`field_mapped!`](crate::field_mapped).

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, LazyLock, RwLock};

use crate::error::SqlConduitError;
use crate::guard::{read_guard, write_guard};
use crate::results::RowAdapter;
use crate::types::DbValue;

/// Field name → column name.
pub type ColumnMap = HashMap<String, String>;

pub type FieldSetter<T> = fn(&mut T, &DbValue) -> Result<(), SqlConduitError>;

/// Build a [`ColumnMap`] from `(field, column)` pairs.
#[must_use]
pub fn column_map<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> ColumnMap {
    pairs
        .into_iter()
        .map(|(field, column)| (field.to_string(), column.to_string()))
        .collect()
}

/// Name and setter of one assignable field.
pub struct FieldDescriptor<T> {
    name: &'static str,
    setter: FieldSetter<T>,
}

impl<T> Clone for FieldDescriptor<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for FieldDescriptor<T> {}

impl<T> fmt::Debug for FieldDescriptor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl<T> FieldDescriptor<T> {
    #[must_use]
    pub const fn new(name: &'static str, setter: FieldSetter<T>) -> Self {
        Self { name, setter }
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// # Errors
    /// Returns `SqlConduitError::TypeMismatch` if `value` does not fit the field.
    pub fn set(&self, target: &mut T, value: &DbValue) -> Result<(), SqlConduitError> {
        (self.setter)(target, value)
    }
}

/// A type whose fields can be assigned by name.
pub trait FieldMapped: Sized + 'static {
    /// Assignable fields, in declaration order.
    fn field_descriptors() -> Vec<FieldDescriptor<Self>>;
}

/// Cached, ordered field descriptors of one type.
#[derive(Debug)]
pub struct FieldTable<T> {
    fields: Vec<FieldDescriptor<T>>,
}

impl<T> FieldTable<T> {
    #[must_use]
    pub fn fields(&self) -> &[FieldDescriptor<T>] {
        &self.fields
    }

    /// First field whose name matches ignoring ASCII case.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<&FieldDescriptor<T>> {
        self.fields
            .iter()
            .find(|field| field.name.eq_ignore_ascii_case(name))
    }
}

type FieldCacheMap = LazyLock<RwLock<HashMap<TypeId, Arc<dyn Any + Send + Sync>>>>;

static FIELD_CACHE: FieldCacheMap = LazyLock::new(|| RwLock::new(HashMap::new()));

/// The field table of `T`, computed on first use and kept for the life of the process.
///
/// The write lock is held while computing, so concurrent first access computes once.
#[must_use]
pub fn field_table<T: FieldMapped>() -> Arc<FieldTable<T>> {
    let key = TypeId::of::<T>();
    {
        let cache = read_guard(&FIELD_CACHE, "field cache");
        if let Some(table) = cache
            .get(&key)
            .and_then(|entry| Arc::clone(entry).downcast::<FieldTable<T>>().ok())
        {
            return table;
        }
    }

    let mut cache = write_guard(&FIELD_CACHE, "field cache");
    let entry = cache.entry(key).or_insert_with(|| {
        tracing::debug!(type_name = std::any::type_name::<T>(), "caching field table");
        Arc::new(FieldTable {
            fields: T::field_descriptors(),
        }) as Arc<dyn Any + Send + Sync>
    });
    Arc::clone(entry)
        .downcast::<FieldTable<T>>()
        .unwrap_or_else(|_| {
            Arc::new(FieldTable {
                fields: T::field_descriptors(),
            })
        })
}

/// Number of types with a cached field table.
#[must_use]
pub fn cached_type_count() -> usize {
    read_guard(&FIELD_CACHE, "field cache").len()
}

/// Default-construct a `T` and assign every mapped field from the row.
///
/// Field names that `T` does not have are skipped.
///
/// # Errors
/// Returns `ColumnNotFound` if a mapped column is missing from the row, or `TypeMismatch` if a
/// value does not fit its field.
pub fn populate<T>(row: &RowAdapter<'_>, map: &ColumnMap) -> Result<T, SqlConduitError>
where
    T: FieldMapped + Default,
{
    let table = field_table::<T>();
    let mut target = T::default();
    for (field, column) in map {
        let Some(descriptor) = table.find(field) else {
            tracing::trace!(field = %field, "no such field; skipped");
            continue;
        };
        let value = row.get_value(column.as_str())?;
        descriptor.set(&mut target, &value)?;
    }
    Ok(target)
}

/// Implement [`FieldMapped`](crate::reflect::FieldMapped) for a struct by listing its fields.
///
/// Each listed field must implement [`FromDbValue`](crate::results::FromDbValue); NULL cells
/// assign the field's zero value.
/// ```rust
/// use sql_conduit::field_mapped;
///
/// #[derive(Default)]
/// struct Person {
///     id: i64,
///     name: String,
/// }
///
/// field_mapped!(Person { id, name });
/// ```
#[macro_export]
macro_rules! field_mapped {
    ($ty:ty { $($field:ident),* $(,)? }) => {
        impl $crate::reflect::FieldMapped for $ty {
            fn field_descriptors() -> ::std::vec::Vec<$crate::reflect::FieldDescriptor<Self>> {
                ::std::vec![
                    $(
                        $crate::reflect::FieldDescriptor::new(
                            stringify!($field),
                            |target: &mut Self, value: &$crate::types::DbValue| {
                                target.$field =
                                    $crate::results::FromDbValue::from_nullable(value)?;
                                Ok(())
                            },
                        )
                    ),*
                ]
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default, PartialEq)]
    struct Account {
        id: i64,
        owner: String,
        balance: Option<f64>,
    }

    crate::field_mapped!(Account { id, owner, balance });

    #[test]
    fn descriptors_keep_declaration_order() {
        let table = field_table::<Account>();
        let names: Vec<_> = table.fields().iter().map(FieldDescriptor::name).collect();
        assert_eq!(names, vec!["id", "owner", "balance"]);
    }

    #[test]
    fn lookup_is_case_insensitive() {
        let table = field_table::<Account>();
        assert_eq!(table.find("OWNER").map(FieldDescriptor::name), Some("owner"));
        assert!(table.find("missing").is_none());
    }

    #[test]
    fn table_is_computed_once() {
        let first = field_table::<Account>();
        let second = field_table::<Account>();
        assert!(Arc::ptr_eq(&first, &second));
        assert!(cached_type_count() >= 1);
    }

    #[test]
    fn setters_apply_zero_for_null() {
        let table = field_table::<Account>();
        let mut account = Account {
            id: 3,
            ..Account::default()
        };
        table.find("id").unwrap().set(&mut account, &DbValue::Null).unwrap();
        table
            .find("balance")
            .unwrap()
            .set(&mut account, &DbValue::Float(1.5))
            .unwrap();
        assert_eq!(account.id, 0);
        assert_eq!(account.balance, Some(1.5));
    }

    #[test]
    fn concurrent_first_access_shares_one_table() {
        #[derive(Default)]
        struct Fresh {
            x: i64,
        }
        crate::field_mapped!(Fresh { x });

        let handles: Vec<_> = (0..8)
            .map(|_| std::thread::spawn(field_table::<Fresh>))
            .collect();
        let tables: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(tables.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
    }
}
