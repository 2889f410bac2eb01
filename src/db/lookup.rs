//! Result of a point read.
//!
//! Gateway reads return `Result<Lookup<T>, DbError>`: `Found`, `NotFound`, or
//! the `Err` arm for a store failure. Absence is a value the engine matches on,
//! never an error it has to recognise after the fact.

/// Outcome of reading a single row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup<T> {
    Found(T),
    NotFound,
}

impl<T> Lookup<T> {
    /// Return the value, or the error produced by `missing` when absent.
    pub fn found_or_else<E>(self, missing: impl FnOnce() -> E) -> Result<T, E> {
        match self {
            Self::Found(value) => Ok(value),
            Self::NotFound => Err(missing()),
        }
    }
}

impl<T> From<Option<T>> for Lookup<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(value) => Self::Found(value),
            None => Self::NotFound,
        }
    }
}
