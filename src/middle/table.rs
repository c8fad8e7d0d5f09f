use hashbrown::HashMap;

use crate::frontend::intern::InternedSymbol;

/// A symbol table with nested scopes. Entering a name which is already bound
/// shadows the previous binding until the scope the new binding was entered
/// in ends.
#[derive(Debug)]
pub struct SymbolTable<V> {
    bindings: HashMap<InternedSymbol, Vec<V>>,
    /// Every live binding in the order it was entered. `None` marks the start
    /// of a scope.
    undo_stack: Vec<Option<InternedSymbol>>,
}

impl<V> SymbolTable<V> {
    pub fn new() -> Self {
        Self {
            bindings: HashMap::new(),
            undo_stack: Vec::new(),
        }
    }

    /// Binds a name in the current (most nested) scope
    pub fn enter(&mut self, symbol: InternedSymbol, value: V) {
        self.bindings.entry(symbol).or_default().push(value);
        self.undo_stack.push(Some(symbol));
    }

    /// Looks up the innermost live binding for a name
    pub fn lookup(&self, symbol: InternedSymbol) -> Option<&V> {
        self.bindings.get(&symbol).and_then(|stack| stack.last())
    }

    /// Creates a new scope
    pub fn begin_scope(&mut self) {
        self.undo_stack.push(None);
    }

    /// Destroys the current scope, undoing every binding entered since the
    /// matching call to [`SymbolTable::begin_scope`]
    pub fn end_scope(&mut self) {
        loop {
            match self.undo_stack.pop() {
                Some(Some(symbol)) => {
                    let stack = self
                        .bindings
                        .get_mut(&symbol)
                        .expect("every entry on the undo stack has a binding");
                    stack.pop();

                    if stack.is_empty() {
                        self.bindings.remove(&symbol);
                    }
                }
                Some(None) => return,
                None => panic!("Attempted to end a scope which was never started"),
            }
        }
    }
}

impl<V> Default for SymbolTable<V> {
    fn default() -> Self {
        Self::new()
    }
}
