use schsvg_lexer::token_enum;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fill {
    Foreground,
    Background,
    None,
}

token_enum!(Fill {
    Fill::Foreground => ["F"],
    Fill::Background => ["f"],
    Fill::None => ["N"],
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinDirection {
    Up,
    Down,
    Left,
    Right,
}

token_enum!(PinDirection {
    PinDirection::Up => ["U"],
    PinDirection::Down => ["D"],
    PinDirection::Left => ["L"],
    PinDirection::Right => ["R"],
});

impl PinDirection {
    /// Unit vector from the connection point towards the symbol body, in
    /// library coordinates (y up).
    pub fn delta(self) -> (i32, i32) {
        match self {
            PinDirection::Up => (0, 1),
            PinDirection::Down => (0, -1),
            PinDirection::Left => (-1, 0),
            PinDirection::Right => (1, 0),
        }
    }
}

/// Which unit and body style (convert) an item belongs to; 0 means all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UnitScope {
    pub unit: i32,
    pub convert: i32,
}

impl UnitScope {
    pub fn applies_to(&self, unit: i32, convert: i32) -> bool {
        (self.unit == 0 || self.unit == unit) && (self.convert == 0 || self.convert == convert)
    }
}

/// One drawing primitive of a symbol body, in library coordinates.
#[derive(Debug, Clone, PartialEq)]
pub enum SymbolItem {
    Rectangle {
        scope: UnitScope,
        start: (i32, i32),
        end: (i32, i32),
        thickness: i32,
        fill: Fill,
    },
    Circle {
        scope: UnitScope,
        center: (i32, i32),
        radius: i32,
        thickness: i32,
        fill: Fill,
    },
    Polyline {
        scope: UnitScope,
        points: Vec<(i32, i32)>,
        thickness: i32,
        fill: Fill,
    },
    Arc {
        scope: UnitScope,
        radius: i32,
        /// Start and end angles in tenths of a degree.
        angles: (i32, i32),
        start: (i32, i32),
        end: (i32, i32),
        thickness: i32,
        fill: Fill,
    },
    Pin {
        scope: UnitScope,
        name: String,
        number: String,
        position: (i32, i32),
        length: i32,
        direction: PinDirection,
        visible: bool,
    },
}

impl SymbolItem {
    pub fn scope(&self) -> UnitScope {
        match self {
            SymbolItem::Rectangle { scope, .. }
            | SymbolItem::Circle { scope, .. }
            | SymbolItem::Polyline { scope, .. }
            | SymbolItem::Arc { scope, .. }
            | SymbolItem::Pin { scope, .. } => *scope,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Symbol {
    pub name: String,
    pub aliases: Vec<String>,
    pub items: Vec<SymbolItem>,
}

impl Symbol {
    /// Items drawn for the given unit and body style.
    pub fn items_for(&self, unit: i32, convert: i32) -> impl Iterator<Item = &SymbolItem> {
        self.items
            .iter()
            .filter(move |item| item.scope().applies_to(unit, convert))
    }
}

/// A parsed library. Symbols are reachable by name and by alias.
#[derive(Debug, Clone, Default)]
pub struct SymbolLibrary {
    pub name: String,
    symbols: HashMap<String, Arc<Symbol>>,
}

impl SymbolLibrary {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            symbols: HashMap::new(),
        }
    }

    /// Adds `symbol` under its name and each alias. Earlier entries win.
    pub fn insert(&mut self, symbol: Symbol) {
        let symbol = Arc::new(symbol);
        for key in std::iter::once(&symbol.name).chain(symbol.aliases.iter()) {
            self.symbols
                .entry(key.clone())
                .or_insert_with(|| symbol.clone());
        }
    }

    pub fn get(&self, name: &str) -> Option<Arc<Symbol>> {
        self.symbols.get(name).cloned()
    }

    /// Number of names (symbols plus aliases) in the library.
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}
