use std::fmt;

use serde::Serialize;
use strum::IntoEnumIterator;
use strum_macros::EnumIter;

/// One corner of the triangle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, EnumIter)]
pub enum Asset {
    /// Base asset, the one every cycle starts and ends in
    A,
    /// Intermediate asset
    B,
    /// Quote-settlement asset
    C,
}

impl Asset {
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// The three cross pairs of the triangle: A/B, B/C and A/C
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, EnumIter)]
pub enum SymbolId {
    AB,
    BC,
    AC,
}

impl SymbolId {
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    #[inline]
    pub const fn base(self) -> Asset {
        match self {
            SymbolId::AB | SymbolId::AC => Asset::A,
            SymbolId::BC => Asset::B,
        }
    }

    #[inline]
    pub const fn quote(self) -> Asset {
        match self {
            SymbolId::AB => Asset::B,
            SymbolId::BC | SymbolId::AC => Asset::C,
        }
    }
}

impl fmt::Display for SymbolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}/{:?}", self.base(), self.quote())
    }
}

/// Ticker names of the three assets.
///
/// Wire symbols are `"{base}-{quote}"`, so the default triangle tracks
/// `FIL-ETH`, `ETH-BSV` and `FIL-BSV`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Triangle {
    assets: [String; 3],
    #[serde(skip)]
    symbols: [String; 3],
}

impl Triangle {
    pub fn new(a: impl Into<String>, b: impl Into<String>, c: impl Into<String>) -> Self {
        let assets = [a.into(), b.into(), c.into()];
        let symbol = |id: SymbolId| {
            format!("{}-{}", assets[id.base().index()], assets[id.quote().index()])
        };
        let symbols = [symbol(SymbolId::AB), symbol(SymbolId::BC), symbol(SymbolId::AC)];

        Self { assets, symbols }
    }

    #[inline]
    pub fn asset_name(&self, asset: Asset) -> &str {
        &self.assets[asset.index()]
    }

    #[inline]
    pub fn symbol_name(&self, symbol: SymbolId) -> &str {
        &self.symbols[symbol.index()]
    }

    /// Resolve a wire symbol to one of the tracked pairs
    pub fn resolve(&self, symbol: &str) -> Option<SymbolId> {
        SymbolId::iter().find(|id| self.symbols[id.index()] == symbol)
    }
}

impl Default for Triangle {
    fn default() -> Self {
        Self::new("FIL", "ETH", "BSV")
    }
}

impl fmt::Display for Triangle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} → {} → {}", self.symbols[0], self.symbols[1], self.symbols[2])
    }
}
