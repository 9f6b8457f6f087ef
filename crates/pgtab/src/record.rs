//! Decoded rows.

use crate::error::{TabError, TabResult};
use crate::value::{FromValue, Value};
use std::ops::Index;

/// One decoded row: a value per column, in the table's column order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record(Vec<Value>);

impl Record {
    pub fn new(values: Vec<Value>) -> Self {
        Self(values)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn values(&self) -> &[Value] {
        &self.0
    }

    pub fn value(&self, index: usize) -> Option<&Value> {
        self.0.get(index)
    }

    /// Convert the value at `index`.
    pub fn get<T: FromValue>(&self, index: usize) -> TabResult<T> {
        T::from_value(self.slot(index)?.clone())
    }

    /// Move the value at `index` out, leaving `Null` behind.
    pub fn take<T: FromValue>(&mut self, index: usize) -> TabResult<T> {
        let len = self.0.len();
        let slot = self
            .0
            .get_mut(index)
            .ok_or_else(|| out_of_range(index, len))?;
        T::from_value(std::mem::replace(slot, Value::Null))
    }

    /// Clone the structured value at `index` out as a `T`.
    pub fn get_object<T: Clone + 'static>(&self, index: usize) -> TabResult<T> {
        let value = self.slot(index)?;
        value.to_object::<T>().ok_or_else(|| {
            TabError::decode(format!(
                "column {} holds {}, not {}",
                index,
                value.kind(),
                std::any::type_name::<T>()
            ))
        })
    }

    /// Like [`get_object`](Self::get_object), with `Null` read as `None`.
    pub fn get_object_opt<T: Clone + 'static>(&self, index: usize) -> TabResult<Option<T>> {
        match self.slot(index)? {
            Value::Null => Ok(None),
            _ => self.get_object(index).map(Some),
        }
    }

    pub fn into_values(self) -> Vec<Value> {
        self.0
    }

    fn slot(&self, index: usize) -> TabResult<&Value> {
        self.0.get(index).ok_or_else(|| out_of_range(index, self.0.len()))
    }
}

fn out_of_range(index: usize, len: usize) -> TabError {
    TabError::decode(format!("column {} out of range for a row of {}", index, len))
}

impl From<Vec<Value>> for Record {
    fn from(values: Vec<Value>) -> Self {
        Self(values)
    }
}

impl Index<usize> for Record {
    type Output = Value;

    fn index(&self, index: usize) -> &Value {
        &self.0[index]
    }
}

impl IntoIterator for Record {
    type Item = Value;
    type IntoIter = std::vec::IntoIter<Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Record {
    type Item = &'a Value;
    type IntoIter = std::slice::Iter<'a, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_access_by_position() {
        let mut record = Record::from(vec![Value::from("u1"), Value::I32(30), Value::Null]);
        assert_eq!(record.get::<String>(0).unwrap(), "u1");
        assert_eq!(record.get::<i64>(1).unwrap(), 30);
        assert_eq!(record.get::<Option<i32>>(2).unwrap(), None);
        assert!(record.get::<i32>(3).is_err());

        let id: String = record.take(0).unwrap();
        assert_eq!(id, "u1");
        assert_eq!(record[0], Value::Null);
    }

    #[test]
    fn object_access_checks_type() {
        let record = Record::from(vec![Value::object(vec![1, 2]), Value::Null]);
        assert_eq!(record.get_object::<Vec<i32>>(0).unwrap(), vec![1, 2]);
        assert!(record.get_object::<String>(0).is_err());
        assert_eq!(record.get_object_opt::<Vec<i32>>(1).unwrap(), None);
    }
}
