//! Facade-level errors raised while configuring and wiring the runtime.

use std::error::Error;
use std::fmt::{Display, Formatter};

use gcountry::CountryError;
use gmemory::MemoryError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeErrorKind {
    Config,
    Country,
    Memory,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeError {
    pub kind: RuntimeErrorKind,
    pub message: String,
}

impl RuntimeError {
    pub fn new(kind: RuntimeErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::new(RuntimeErrorKind::Config, message)
    }

    pub fn country(message: impl Into<String>) -> Self {
        Self::new(RuntimeErrorKind::Country, message)
    }

    pub fn memory(message: impl Into<String>) -> Self {
        Self::new(RuntimeErrorKind::Memory, message)
    }
}

impl Display for RuntimeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl Error for RuntimeError {}

impl From<CountryError> for RuntimeError {
    fn from(error: CountryError) -> Self {
        Self::country(error.to_string())
    }
}

impl From<MemoryError> for RuntimeError {
    fn from(error: MemoryError) -> Self {
        Self::memory(error.to_string())
    }
}
