//! Availability calculator: the maximum feasible quantity per transition.
//!
//! Pure, side-effect-free functions over plain snapshots. These answer the
//! advisory "how many could I move" queries; the engine's planning layer
//! applies the same bounds against locked rows as the authoritative
//! precondition check, so display and validation cannot diverge.

/// A resource that caps a transition: a packaging material or a BOM
/// component, with its per-unit requirement and currently available stock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceLine {
    /// SKU of the constraining item, used for diagnostics.
    pub sku: String,
    /// Units consumed per unit of the target item. Always positive.
    pub per_unit: i32,
    /// Currently available stock in the relevant bucket.
    pub available: i32,
}

/// Result of an availability computation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Availability {
    /// Largest quantity the transition can move right now.
    pub max: i64,
    /// SKU of the resource that caps `max`, when a packaging material or
    /// component is the binding constraint. `None` when the item's own
    /// stock (or nothing) is the bound.
    pub limiting_factor: Option<String>,
}

impl Availability {
    const fn unbounded() -> Self {
        Self {
            max: i64::MAX,
            limiting_factor: None,
        }
    }

    fn own_stock(available: i32) -> Self {
        Self {
            max: i64::from(available),
            limiting_factor: None,
        }
    }
}

/// How many units each resource line can support: `floor(available / per_unit)`.
///
/// Returns the minimum across lines together with the SKU of the first line
/// attaining it (declaration order breaks ties). `None` when there are no
/// lines.
fn tightest_line(lines: &[ResourceLine]) -> Option<(i64, &str)> {
    let mut best: Option<(i64, &str)> = None;
    for line in lines {
        if line.per_unit <= 0 {
            continue;
        }
        let bound = i64::from(line.available) / i64::from(line.per_unit);
        match best {
            Some((current, _)) if bound >= current => {}
            _ => best = Some((bound, line.sku.as_str())),
        }
    }
    best
}

/// Maximum receivable quantity.
///
/// Receiving is unconstrained by stock; the purchase-order balance that
/// actually caps it is an upstream concern.
#[must_use]
pub const fn max_receive() -> Availability {
    Availability::unbounded()
}

/// Maximum packageable quantity.
///
/// `min(semi_finished, floor(packaging_finished / per_unit))` across every
/// packaging requirement. An item with no packaging requirements is bounded
/// by its semi-finished stock alone.
#[must_use]
pub fn max_package(semi_finished: i32, packaging: &[ResourceLine]) -> Availability {
    let own = i64::from(semi_finished);
    match tightest_line(packaging) {
        Some((bound, sku)) if bound < own => Availability {
            max: bound,
            limiting_factor: Some(sku.to_string()),
        },
        _ => Availability::own_stock(semi_finished),
    }
}

/// Maximum unpackable quantity: bounded by the finished counter.
///
/// Reversing a package restores packaging stock, which is always safe, so
/// packaging imposes no bound here.
#[must_use]
pub fn max_unpack(finished: i32) -> Availability {
    Availability::own_stock(finished)
}

/// Maximum shippable quantity: bounded by the finished counter.
#[must_use]
pub fn max_ship(finished: i32) -> Availability {
    Availability::own_stock(finished)
}

/// Maximum assemblable quantity for a combo.
///
/// `min(floor(component_semi_finished / per_unit), floor(packaging_finished
/// / per_unit))` across every BOM component and combo-level packaging
/// requirement. Components are declared before packaging for tie-breaking.
/// A combo with no components assembles nothing.
#[must_use]
pub fn max_assemble(components: &[ResourceLine], packaging: &[ResourceLine]) -> Availability {
    if components.is_empty() {
        return Availability {
            max: 0,
            limiting_factor: None,
        };
    }

    let mut lines: Vec<&ResourceLine> = Vec::with_capacity(components.len() + packaging.len());
    lines.extend(components);
    lines.extend(packaging);

    let mut best: Option<(i64, &str)> = None;
    for line in lines {
        if line.per_unit <= 0 {
            continue;
        }
        let bound = i64::from(line.available) / i64::from(line.per_unit);
        match best {
            Some((current, _)) if bound >= current => {}
            _ => best = Some((bound, line.sku.as_str())),
        }
    }

    best.map_or(
        Availability {
            max: 0,
            limiting_factor: None,
        },
        |(bound, sku)| Availability {
            max: bound,
            limiting_factor: Some(sku.to_string()),
        },
    )
}

/// Maximum disassemblable quantity: bounded by the combo's finished counter.
#[must_use]
pub fn max_disassemble(combo_finished: i32) -> Availability {
    Availability::own_stock(combo_finished)
}

/// Maximum shippable quantity for a combo: bounded by its finished counter.
#[must_use]
pub fn max_ship_combo(combo_finished: i32) -> Availability {
    Availability::own_stock(combo_finished)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn line(sku: &str, per_unit: i32, available: i32) -> ResourceLine {
        ResourceLine {
            sku: sku.to_string(),
            per_unit,
            available,
        }
    }

    #[test]
    fn test_receive_is_unbounded() {
        assert_eq!(max_receive().max, i64::MAX);
        assert_eq!(max_receive().limiting_factor, None);
    }

    #[test]
    fn test_package_without_packaging_bounded_by_semi_finished() {
        let a = max_package(10, &[]);
        assert_eq!(a.max, 10);
        assert_eq!(a.limiting_factor, None);
    }

    // Scenario: semi_finished=10, requires 2 units of packaging P with
    // P.finished=15 -> floor(15/2)=7 binds below the 10 on hand.
    #[test]
    fn test_package_bounded_by_packaging() {
        let a = max_package(10, &[line("PKG-P", 2, 15)]);
        assert_eq!(a.max, 7);
        assert_eq!(a.limiting_factor.as_deref(), Some("PKG-P"));
    }

    #[test]
    fn test_package_own_stock_binds_without_limiting_factor() {
        let a = max_package(3, &[line("PKG-P", 1, 50)]);
        assert_eq!(a.max, 3);
        assert_eq!(a.limiting_factor, None);
    }

    #[test]
    fn test_package_tie_with_own_stock_reports_own_stock() {
        // Packaging supports exactly as many as semi_finished; the bound is
        // not strictly below own stock, so no packaging is singled out.
        let a = max_package(5, &[line("PKG-P", 2, 10)]);
        assert_eq!(a.max, 5);
        assert_eq!(a.limiting_factor, None);
    }

    #[test]
    fn test_package_first_minimal_packaging_wins_ties() {
        let a = max_package(10, &[line("PKG-A", 1, 4), line("PKG-B", 2, 8)]);
        assert_eq!(a.max, 4);
        assert_eq!(a.limiting_factor.as_deref(), Some("PKG-A"));
    }

    #[test]
    fn test_package_zero_packaging_stock() {
        let a = max_package(10, &[line("PKG-P", 3, 0)]);
        assert_eq!(a.max, 0);
        assert_eq!(a.limiting_factor.as_deref(), Some("PKG-P"));
    }

    // Scenario: combo C = 2xA + 1xB; A.semi_finished=5, B.semi_finished=3.
    // A bounds at floor(5/2)=2, B at floor(3/1)=3 -> min = 2.
    #[test]
    fn test_assemble_component_floor_division() {
        let a = max_assemble(&[line("SKU-A", 2, 5), line("SKU-B", 1, 3)], &[]);
        assert_eq!(a.max, 2);
        assert_eq!(a.limiting_factor.as_deref(), Some("SKU-A"));
    }

    #[test]
    fn test_assemble_packaging_can_bind() {
        let a = max_assemble(
            &[line("SKU-A", 1, 10)],
            &[line("PKG-BOX", 2, 6)],
        );
        assert_eq!(a.max, 3);
        assert_eq!(a.limiting_factor.as_deref(), Some("PKG-BOX"));
    }

    #[test]
    fn test_assemble_component_declared_first_wins_ties() {
        let a = max_assemble(
            &[line("SKU-A", 1, 2)],
            &[line("PKG-BOX", 1, 2)],
        );
        assert_eq!(a.max, 2);
        assert_eq!(a.limiting_factor.as_deref(), Some("SKU-A"));
    }

    #[test]
    fn test_assemble_no_components_yields_zero() {
        let a = max_assemble(&[], &[line("PKG-BOX", 1, 10)]);
        assert_eq!(a.max, 0);
        assert_eq!(a.limiting_factor, None);
    }

    #[test]
    fn test_ship_and_unpack_bounded_by_finished() {
        assert_eq!(max_ship(4).max, 4);
        assert_eq!(max_unpack(4).max, 4);
        assert_eq!(max_disassemble(2).max, 2);
        assert_eq!(max_ship_combo(2).max, 2);
    }
}
