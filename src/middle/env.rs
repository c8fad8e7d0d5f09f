//! The value and type environments the semantic analyzer resolves names in

use strum::IntoEnumIterator;

use crate::{
    frontend::intern::InternedSymbol,
    middle::{
        table::SymbolTable,
        temp::Label,
        translate::{Access, CallTarget},
        ty::Type,
    },
};

#[derive(Debug, Clone)]
pub enum Binding {
    Variable {
        access: Access,
        ty: Type,
        /// Index variables of `for` loops may not be assigned to
        is_loop_index: bool,
    },
    Function {
        formals: Vec<Type>,
        result: Type,
        target: CallTarget,
    },
}

/// Functions every program can call without declaring them. They are
/// implemented by the runtime library.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::EnumIter, strum::IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
enum Builtin {
    Print,
    Getchar,
    Ord,
    Chr,
}

impl Builtin {
    fn binding(self) -> Binding {
        let (formals, result) = match self {
            Builtin::Print => (vec![Type::string()], Type::void()),
            Builtin::Getchar => (vec![], Type::string()),
            Builtin::Ord => (vec![Type::string()], Type::int()),
            Builtin::Chr => (vec![Type::int()], Type::string()),
        };

        let name: &'static str = self.into();

        Binding::Function {
            formals,
            result,
            target: CallTarget::Runtime(Label::named(name)),
        }
    }
}

/// Variables and functions share one namespace, types live in another
#[derive(Debug)]
pub struct Environment {
    pub values: SymbolTable<Binding>,
    pub types: SymbolTable<Type>,
}

impl Environment {
    /// An environment holding only the predefined types and functions
    pub fn new() -> Self {
        let mut values = SymbolTable::new();
        let mut types = SymbolTable::new();

        types.enter(InternedSymbol::new("int"), Type::int());
        types.enter(InternedSymbol::new("string"), Type::string());

        for builtin in Builtin::iter() {
            let name: &'static str = builtin.into();
            values.enter(InternedSymbol::new(name), builtin.binding());
        }

        Self { values, types }
    }

    pub fn begin_scope(&mut self) {
        self.values.begin_scope();
        self.types.begin_scope();
    }

    pub fn end_scope(&mut self) {
        self.values.end_scope();
        self.types.end_scope();
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}
