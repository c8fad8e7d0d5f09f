use std::{cell::RefCell, rc::Rc};

use crate::frontend::intern::InternedSymbol;

/// The maximum number of `Name` indirections followed before a chain is
/// considered to be infinitely recursive
pub const MAX_NAME_CHAIN: usize = 4096;

/// Thin pointer to a type kind. Record, array and name types are nominal so
/// they compare by identity. Every other kind compares by kind.
#[derive(Clone)]
pub struct Type(Rc<TypeKind>);

pub enum TypeKind {
    /// nil
    ///
    /// Only inhabited by the `nil` literal which can stand in for any record
    Nil,
    /// int
    Int,
    /// string
    String,
    /// The type of expressions which produce no value
    Void,
    /// { x: int, next: list }
    Record(Vec<RecordField>),
    /// array of int
    Array(Type),
    /// A named type whose definition may not be known yet. Created as a
    /// placeholder while a batch of type declarations is processed so that the
    /// declarations can refer to each other.
    Name {
        name: InternedSymbol,
        binding: RefCell<Option<Type>>,
    },
}

#[derive(Clone)]
pub struct RecordField {
    pub name: InternedSymbol,
    pub ty: Type,
}

impl Type {
    pub fn new(kind: TypeKind) -> Self {
        Self(Rc::new(kind))
    }

    pub fn nil() -> Self {
        Self::new(TypeKind::Nil)
    }

    pub fn int() -> Self {
        Self::new(TypeKind::Int)
    }

    pub fn string() -> Self {
        Self::new(TypeKind::String)
    }

    pub fn void() -> Self {
        Self::new(TypeKind::Void)
    }

    pub fn record(fields: Vec<RecordField>) -> Self {
        Self::new(TypeKind::Record(fields))
    }

    pub fn array(element: Type) -> Self {
        Self::new(TypeKind::Array(element))
    }

    /// Creates an unresolved named type
    pub fn name(name: InternedSymbol) -> Self {
        Self::new(TypeKind::Name {
            name,
            binding: RefCell::new(None),
        })
    }

    /// Points a named type at its definition.
    ///
    /// Panics if called on anything other than a `Name` type
    pub fn bind(&self, ty: Type) {
        match &*self.0 {
            TypeKind::Name { binding, .. } => *binding.borrow_mut() = Some(ty),
            _ => unreachable!("attempted to bind a type which is not a name"),
        }
    }

    /// Follows `Name` indirections until reaching a concrete type. If the chain
    /// is unresolved or longer than [`MAX_NAME_CHAIN`] the original type is
    /// returned, which still being a `Name` signals a recursive definition.
    pub fn actual(&self) -> Type {
        let mut current = self.clone();

        for _ in 0..MAX_NAME_CHAIN {
            let next = match &*current.0 {
                TypeKind::Name { binding, .. } => binding.borrow().clone(),
                _ => return current,
            };

            match next {
                Some(next) => current = next,
                None => return self.clone(),
            }
        }

        self.clone()
    }

    /// Type compatibility for assignment, argument passing and equality. `nil`
    /// is additionally compatible with any record type.
    pub fn matches(&self, other: &Type) -> bool {
        let a = self.actual();
        let b = other.actual();

        if a == b {
            return true;
        }

        matches!(
            (&*a, &*b),
            (TypeKind::Record(_), TypeKind::Nil) | (TypeKind::Nil, TypeKind::Record(_))
        )
    }
}

impl PartialEq for Type {
    fn eq(&self, other: &Self) -> bool {
        match (&*self.0, &*other.0) {
            (TypeKind::Nil, TypeKind::Nil)
            | (TypeKind::Int, TypeKind::Int)
            | (TypeKind::String, TypeKind::String)
            | (TypeKind::Void, TypeKind::Void) => true,
            (TypeKind::Record(_), TypeKind::Record(_))
            | (TypeKind::Array(_), TypeKind::Array(_))
            | (TypeKind::Name { .. }, TypeKind::Name { .. }) => Rc::ptr_eq(&self.0, &other.0),
            _ => false,
        }
    }
}

impl Eq for Type {}

impl core::ops::Deref for Type {
    type Target = TypeKind;

    fn deref(&self) -> &Self::Target {
        self.0.as_ref()
    }
}

impl TypeKind {
    pub fn is_nil(&self) -> bool {
        matches!(self, TypeKind::Nil)
    }

    pub fn is_int(&self) -> bool {
        matches!(self, TypeKind::Int)
    }

    pub fn is_string(&self) -> bool {
        matches!(self, TypeKind::String)
    }

    pub fn is_void(&self) -> bool {
        matches!(self, TypeKind::Void)
    }

    pub fn is_name(&self) -> bool {
        matches!(self, TypeKind::Name { .. })
    }
}

// Records and names may be cyclic, so nested types are only ever printed by
// name or shape and never recursed into.
impl core::fmt::Display for TypeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Nil => write!(f, "nil"),
            Self::Int => write!(f, "int"),
            Self::String => write!(f, "string"),
            Self::Void => write!(f, "void"),
            Self::Record(fields) => {
                write!(f, "{{ ")?;
                for (i, field) in fields.iter().enumerate() {
                    write!(f, "{}: {}", field.name, field.ty.shallow_name())?;

                    if i != fields.len() - 1 {
                        write!(f, ", ")?;
                    }
                }
                write!(f, " }}")
            }
            Self::Array(element) => write!(f, "array of {}", element.shallow_name()),
            Self::Name { name, .. } => write!(f, "{name}"),
        }
    }
}

impl Type {
    fn shallow_name(&self) -> String {
        match &*self.0 {
            TypeKind::Record(_) => "{...}".to_owned(),
            TypeKind::Array(_) => "array of ...".to_owned(),
            kind => kind.to_string(),
        }
    }
}

impl core::fmt::Display for Type {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", **self)
    }
}

impl core::fmt::Debug for Type {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Type").field(&self.to_string()).finish()
    }
}
