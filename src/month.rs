//! Spanish calendar month enumeration
//!
//! Month filtering, ordering and accumulation all go through this fixed
//! 12-entry lookup. Ordering by month is never alphabetical; it is always
//! the calendar ordinal derived from the name.

use serde::{Deserialize, Serialize};

/// A calendar month identified by its Spanish name, ordinal 1..=12.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Month {
    Enero = 1,
    Febrero = 2,
    Marzo = 3,
    Abril = 4,
    Mayo = 5,
    Junio = 6,
    Julio = 7,
    Agosto = 8,
    Septiembre = 9,
    Octubre = 10,
    Noviembre = 11,
    Diciembre = 12,
}

impl Month {
    /// All twelve months in calendar order.
    pub const ALL: [Month; 12] = [
        Month::Enero,
        Month::Febrero,
        Month::Marzo,
        Month::Abril,
        Month::Mayo,
        Month::Junio,
        Month::Julio,
        Month::Agosto,
        Month::Septiembre,
        Month::Octubre,
        Month::Noviembre,
        Month::Diciembre,
    ];

    /// 1-based calendar position.
    pub fn ordinal(self) -> u8 {
        self as u8
    }

    /// Canonical capitalized Spanish name.
    pub fn name(self) -> &'static str {
        match self {
            Month::Enero => "Enero",
            Month::Febrero => "Febrero",
            Month::Marzo => "Marzo",
            Month::Abril => "Abril",
            Month::Mayo => "Mayo",
            Month::Junio => "Junio",
            Month::Julio => "Julio",
            Month::Agosto => "Agosto",
            Month::Septiembre => "Septiembre",
            Month::Octubre => "Octubre",
            Month::Noviembre => "Noviembre",
            Month::Diciembre => "Diciembre",
        }
    }

    /// Case- and whitespace-insensitive name lookup.
    pub fn from_name(name: &str) -> Option<Month> {
        let normalized = name.trim().to_lowercase();
        Month::ALL
            .iter()
            .copied()
            .find(|m| m.name().to_lowercase() == normalized)
    }

    /// Ordinal lookup (1..=12).
    pub fn from_ordinal(ordinal: i32) -> Option<Month> {
        Month::ALL.iter().copied().find(|m| m.ordinal() as i32 == ordinal)
    }

    /// The twelve canonical names in calendar order.
    pub fn names() -> [&'static str; 12] {
        let mut names = [""; 12];
        for (i, m) in Month::ALL.iter().enumerate() {
            names[i] = m.name();
        }
        names
    }
}

/// SQL CASE expression mapping a month-name column to its ordinal.
///
/// Matching is case- and whitespace-insensitive; names outside the
/// enumeration sort after December. Portable across the supported
/// backends, replacing dialect-specific `FIELD()` lists.
pub fn sql_ordinal_expr(column: &str) -> String {
    let mut expr = format!("CASE LOWER(TRIM({}))", column);
    for m in Month::ALL {
        expr.push_str(&format!(" WHEN '{}' THEN {}", m.name().to_lowercase(), m.ordinal()));
    }
    expr.push_str(" ELSE 13 END");
    expr
}
