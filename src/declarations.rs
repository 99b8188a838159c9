use std::collections::HashSet;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Cannot declare '{0}' twice.")]
pub struct DeclarationError(pub String);

/// A registry of names declared in one scope category.
pub trait Declarations {
    /// Inserts `name`, failing if it is already present.
    fn add_declaration(&mut self, name: &str) -> Result<(), DeclarationError>;
    fn is_declared(&self, name: &str) -> bool;
    fn is_empty(&self) -> bool;
    fn clear(&mut self);
}

#[derive(Debug, Clone, Default)]
pub struct DeclarationTable {
    names: HashSet<String>,
}

impl DeclarationTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }
}

impl Declarations for DeclarationTable {
    fn add_declaration(&mut self, name: &str) -> Result<(), DeclarationError> {
        if !self.names.insert(name.to_string()) {
            return Err(DeclarationError(name.to_string()));
        }
        Ok(())
    }

    fn is_declared(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    fn clear(&mut self) {
        self.names.clear()
    }
}

/// The four scope categories a name can be declared in.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Scope {
    ClassName,
    ClassVar,
    SubroutineName,
    SubroutineVar,
}

impl Display for Scope {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::ClassName => "class name",
            Self::ClassVar => "class variable",
            Self::SubroutineName => "subroutine name",
            Self::SubroutineVar => "subroutine variable",
        };
        write!(f, "{s}")
    }
}
