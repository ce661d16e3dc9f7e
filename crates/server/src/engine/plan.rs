//! Transition planning: the pure check phase of check-then-commit.
//!
//! A plan is computed from locked snapshots and either rejects with a typed
//! error before any mutation, or yields the full set of counter deltas plus
//! the audit-row description. The engine applies plans verbatim; nothing else
//! mutates counters.

use packhouse_core::{ComboProductId, ProductId, StockBucket, TransitionType};

use super::EngineError;

// =============================================================================
// Snapshots
// =============================================================================

/// Counters of one base stock record, as read under lock.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BaseCounters {
    /// Ordered, not yet arrived.
    pub in_transit: i32,
    /// Arrived, awaiting packaging.
    pub semi_finished: i32,
    /// Packaged, ready to ship.
    pub finished: i32,
    /// Shipped out.
    pub shipped: i32,
}

/// Counters of one combo stock record, as read under lock.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ComboCounters {
    /// Assembled, ready to ship.
    pub finished: i32,
    /// Shipped out.
    pub shipped: i32,
}

/// The transition target: a base item and its locked counters.
#[derive(Debug, Clone)]
pub struct ItemState {
    /// Product being transitioned.
    pub product_id: ProductId,
    /// Product SKU, used in error detail.
    pub sku: String,
    /// Locked counters.
    pub counters: BaseCounters,
}

/// A packaging requirement with the packaging item's locked finished stock.
#[derive(Debug, Clone)]
pub struct RequirementState {
    /// Packaging material consumed.
    pub packaging_id: ProductId,
    /// Packaging SKU, used in error detail.
    pub sku: String,
    /// Units consumed per unit of the target item.
    pub per_unit: i32,
    /// Locked finished stock of the packaging item.
    pub finished: i32,
}

/// A BOM component with the base item's locked semi-finished stock.
#[derive(Debug, Clone)]
pub struct ComponentState {
    /// Base product consumed.
    pub product_id: ProductId,
    /// Component SKU, used in error detail.
    pub sku: String,
    /// Units consumed per assembled combo.
    pub per_unit: i32,
    /// Locked semi-finished stock of the component.
    pub semi_finished: i32,
}

// =============================================================================
// Plans
// =============================================================================

/// One signed counter adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterDelta {
    /// Adjustment to a base stock record counter.
    Base {
        /// Product whose record is adjusted.
        product_id: ProductId,
        /// Counter to adjust.
        bucket: StockBucket,
        /// Signed amount.
        delta: i64,
    },
    /// Adjustment to a combo stock record counter.
    Combo {
        /// Combo whose record is adjusted.
        combo_product_id: ComboProductId,
        /// Counter to adjust.
        bucket: StockBucket,
        /// Signed amount.
        delta: i64,
    },
}

/// A validated transition ready to commit: all deltas plus the audit-row
/// description. Applying a plan either happens entirely or not at all.
#[derive(Debug, Clone)]
pub struct TransitionPlan {
    /// Transition kind recorded in the log.
    pub transition: TransitionType,
    /// Log row from-bucket.
    pub from_bucket: Option<StockBucket>,
    /// Log row to-bucket.
    pub to_bucket: Option<StockBucket>,
    /// Every counter adjustment, in application order.
    pub deltas: Vec<CounterDelta>,
}

fn ensure_positive(quantity: i32) -> Result<i64, EngineError> {
    if quantity <= 0 {
        return Err(EngineError::InvalidQuantity {
            value: i64::from(quantity),
        });
    }
    Ok(i64::from(quantity))
}

fn ensure_available(
    sku: &str,
    bucket: StockBucket,
    available: i32,
    requested: i64,
) -> Result<(), EngineError> {
    if i64::from(available) < requested {
        return Err(EngineError::InsufficientStock {
            item: sku.to_string(),
            bucket,
            requested,
            available: i64::from(available),
        });
    }
    Ok(())
}

// =============================================================================
// Base-item transitions
// =============================================================================

/// Book quantity in transit. No stock precondition.
///
/// # Errors
///
/// Returns `EngineError::InvalidQuantity` for a non-positive quantity.
pub fn plan_receive(item: &ItemState, quantity: i32) -> Result<TransitionPlan, EngineError> {
    let qty = ensure_positive(quantity)?;
    Ok(TransitionPlan {
        transition: TransitionType::Receive,
        from_bucket: None,
        to_bucket: Some(StockBucket::InTransit),
        deltas: vec![CounterDelta::Base {
            product_id: item.product_id,
            bucket: StockBucket::InTransit,
            delta: qty,
        }],
    })
}

/// Confirm arrival: in-transit moves to semi-finished.
///
/// # Errors
///
/// Returns `EngineError::InvalidQuantity` or `EngineError::InsufficientStock`
/// naming the in-transit bucket.
pub fn plan_confirm_receipt(
    item: &ItemState,
    quantity: i32,
) -> Result<TransitionPlan, EngineError> {
    let qty = ensure_positive(quantity)?;
    ensure_available(&item.sku, StockBucket::InTransit, item.counters.in_transit, qty)?;
    Ok(TransitionPlan {
        transition: TransitionType::Receive,
        from_bucket: Some(StockBucket::InTransit),
        to_bucket: Some(StockBucket::SemiFinished),
        deltas: vec![
            CounterDelta::Base {
                product_id: item.product_id,
                bucket: StockBucket::InTransit,
                delta: -qty,
            },
            CounterDelta::Base {
                product_id: item.product_id,
                bucket: StockBucket::SemiFinished,
                delta: qty,
            },
        ],
    })
}

/// Package semi-finished goods, consuming each packaging requirement from
/// the packaging item's finished stock.
///
/// Either every requirement is satisfiable and the whole plan commits, or
/// the plan is rejected naming the first shortfall.
///
/// # Errors
///
/// Returns `EngineError::InvalidQuantity` or `EngineError::InsufficientStock`.
pub fn plan_package(
    item: &ItemState,
    packaging: &[RequirementState],
    quantity: i32,
) -> Result<TransitionPlan, EngineError> {
    let qty = ensure_positive(quantity)?;
    ensure_available(
        &item.sku,
        StockBucket::SemiFinished,
        item.counters.semi_finished,
        qty,
    )?;

    let mut deltas = vec![
        CounterDelta::Base {
            product_id: item.product_id,
            bucket: StockBucket::SemiFinished,
            delta: -qty,
        },
        CounterDelta::Base {
            product_id: item.product_id,
            bucket: StockBucket::Finished,
            delta: qty,
        },
    ];

    for requirement in packaging {
        let needed = i64::from(requirement.per_unit) * qty;
        ensure_available(&requirement.sku, StockBucket::Finished, requirement.finished, needed)?;
        deltas.push(CounterDelta::Base {
            product_id: requirement.packaging_id,
            bucket: StockBucket::Finished,
            delta: -needed,
        });
    }

    Ok(TransitionPlan {
        transition: TransitionType::Package,
        from_bucket: Some(StockBucket::SemiFinished),
        to_bucket: Some(StockBucket::Finished),
        deltas,
    })
}

/// Unpack finished goods back to semi-finished, restoring packaging.
///
/// Restoration is symmetric with [`plan_package`] and never validates an
/// upper bound: crediting stock back is always safe.
///
/// # Errors
///
/// Returns `EngineError::InvalidQuantity` or `EngineError::InsufficientStock`.
pub fn plan_unpack(
    item: &ItemState,
    packaging: &[RequirementState],
    quantity: i32,
) -> Result<TransitionPlan, EngineError> {
    let qty = ensure_positive(quantity)?;
    ensure_available(&item.sku, StockBucket::Finished, item.counters.finished, qty)?;

    let mut deltas = vec![
        CounterDelta::Base {
            product_id: item.product_id,
            bucket: StockBucket::Finished,
            delta: -qty,
        },
        CounterDelta::Base {
            product_id: item.product_id,
            bucket: StockBucket::SemiFinished,
            delta: qty,
        },
    ];

    for requirement in packaging {
        let restored = i64::from(requirement.per_unit) * qty;
        deltas.push(CounterDelta::Base {
            product_id: requirement.packaging_id,
            bucket: StockBucket::Finished,
            delta: restored,
        });
    }

    Ok(TransitionPlan {
        transition: TransitionType::Unpack,
        from_bucket: Some(StockBucket::Finished),
        to_bucket: Some(StockBucket::SemiFinished),
        deltas,
    })
}

/// Ship finished goods. Irreversible: there is no "unship" transition.
///
/// # Errors
///
/// Returns `EngineError::InvalidQuantity` or `EngineError::InsufficientStock`.
pub fn plan_ship(item: &ItemState, quantity: i32) -> Result<TransitionPlan, EngineError> {
    let qty = ensure_positive(quantity)?;
    ensure_available(&item.sku, StockBucket::Finished, item.counters.finished, qty)?;
    Ok(TransitionPlan {
        transition: TransitionType::Ship,
        from_bucket: Some(StockBucket::Finished),
        to_bucket: Some(StockBucket::Shipped),
        deltas: vec![
            CounterDelta::Base {
                product_id: item.product_id,
                bucket: StockBucket::Finished,
                delta: -qty,
            },
            CounterDelta::Base {
                product_id: item.product_id,
                bucket: StockBucket::Shipped,
                delta: qty,
            },
        ],
    })
}

// =============================================================================
// Combo transitions
// =============================================================================

/// Assemble a combo, consuming component semi-finished stock and combo
/// packaging finished stock.
///
/// # Errors
///
/// Returns `EngineError::ConfigurationMissing` for a combo with no
/// components, `EngineError::InvalidQuantity`, or
/// `EngineError::InsufficientStock` naming the first shortfall.
pub fn plan_assemble(
    combo_product_id: ComboProductId,
    combo_sku: &str,
    components: &[ComponentState],
    packaging: &[RequirementState],
    quantity: i32,
) -> Result<TransitionPlan, EngineError> {
    let qty = ensure_positive(quantity)?;
    if components.is_empty() {
        return Err(EngineError::ConfigurationMissing {
            detail: format!("combo {combo_sku} has no components"),
        });
    }

    let mut deltas = Vec::with_capacity(components.len() + packaging.len() + 1);

    for component in components {
        let needed = i64::from(component.per_unit) * qty;
        ensure_available(
            &component.sku,
            StockBucket::SemiFinished,
            component.semi_finished,
            needed,
        )?;
        deltas.push(CounterDelta::Base {
            product_id: component.product_id,
            bucket: StockBucket::SemiFinished,
            delta: -needed,
        });
    }

    for requirement in packaging {
        let needed = i64::from(requirement.per_unit) * qty;
        ensure_available(&requirement.sku, StockBucket::Finished, requirement.finished, needed)?;
        deltas.push(CounterDelta::Base {
            product_id: requirement.packaging_id,
            bucket: StockBucket::Finished,
            delta: -needed,
        });
    }

    deltas.push(CounterDelta::Combo {
        combo_product_id,
        bucket: StockBucket::Finished,
        delta: qty,
    });

    Ok(TransitionPlan {
        transition: TransitionType::Assemble,
        from_bucket: None,
        to_bucket: Some(StockBucket::Finished),
        deltas,
    })
}

/// Disassemble a combo, restoring component semi-finished stock and combo
/// packaging finished stock. Reverses [`plan_assemble`].
///
/// # Errors
///
/// Returns `EngineError::ConfigurationMissing` for a combo with no
/// components, `EngineError::InvalidQuantity`, or
/// `EngineError::InsufficientStock` on the combo's finished stock.
pub fn plan_disassemble(
    combo_product_id: ComboProductId,
    combo_sku: &str,
    combo: ComboCounters,
    components: &[ComponentState],
    packaging: &[RequirementState],
    quantity: i32,
) -> Result<TransitionPlan, EngineError> {
    let qty = ensure_positive(quantity)?;
    if components.is_empty() {
        return Err(EngineError::ConfigurationMissing {
            detail: format!("combo {combo_sku} has no components"),
        });
    }
    ensure_available(combo_sku, StockBucket::Finished, combo.finished, qty)?;

    let mut deltas = vec![CounterDelta::Combo {
        combo_product_id,
        bucket: StockBucket::Finished,
        delta: -qty,
    }];

    for component in components {
        let restored = i64::from(component.per_unit) * qty;
        deltas.push(CounterDelta::Base {
            product_id: component.product_id,
            bucket: StockBucket::SemiFinished,
            delta: restored,
        });
    }

    for requirement in packaging {
        let restored = i64::from(requirement.per_unit) * qty;
        deltas.push(CounterDelta::Base {
            product_id: requirement.packaging_id,
            bucket: StockBucket::Finished,
            delta: restored,
        });
    }

    Ok(TransitionPlan {
        transition: TransitionType::Disassemble,
        from_bucket: Some(StockBucket::Finished),
        to_bucket: None,
        deltas,
    })
}

/// Ship an assembled combo. Irreversible.
///
/// # Errors
///
/// Returns `EngineError::InvalidQuantity` or `EngineError::InsufficientStock`.
pub fn plan_ship_combo(
    combo_product_id: ComboProductId,
    combo_sku: &str,
    combo: ComboCounters,
    quantity: i32,
) -> Result<TransitionPlan, EngineError> {
    let qty = ensure_positive(quantity)?;
    ensure_available(combo_sku, StockBucket::Finished, combo.finished, qty)?;
    Ok(TransitionPlan {
        transition: TransitionType::Ship,
        from_bucket: Some(StockBucket::Finished),
        to_bucket: Some(StockBucket::Shipped),
        deltas: vec![
            CounterDelta::Combo {
                combo_product_id,
                bucket: StockBucket::Finished,
                delta: -qty,
            },
            CounterDelta::Combo {
                combo_product_id,
                bucket: StockBucket::Shipped,
                delta: qty,
            },
        ],
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    /// In-memory ledger used to verify plan symmetry properties.
    #[derive(Debug, Default, Clone, PartialEq, Eq)]
    struct Ledger {
        base: HashMap<ProductId, BaseCounters>,
        combo: HashMap<ComboProductId, ComboCounters>,
    }

    impl Ledger {
        fn apply(&mut self, plan: &TransitionPlan) {
            for delta in &plan.deltas {
                match *delta {
                    CounterDelta::Base {
                        product_id,
                        bucket,
                        delta,
                    } => {
                        let counters = self.base.entry(product_id).or_default();
                        let slot = match bucket {
                            StockBucket::InTransit => &mut counters.in_transit,
                            StockBucket::SemiFinished => &mut counters.semi_finished,
                            StockBucket::Finished => &mut counters.finished,
                            StockBucket::Shipped => &mut counters.shipped,
                        };
                        *slot = i32::try_from(i64::from(*slot) + delta).unwrap();
                    }
                    CounterDelta::Combo {
                        combo_product_id,
                        bucket,
                        delta,
                    } => {
                        let counters = self.combo.entry(combo_product_id).or_default();
                        let slot = match bucket {
                            StockBucket::Finished => &mut counters.finished,
                            StockBucket::Shipped => &mut counters.shipped,
                            _ => panic!("combo has no {bucket} bucket"),
                        };
                        *slot = i32::try_from(i64::from(*slot) + delta).unwrap();
                    }
                }
            }
        }

        fn item_state(&self, product_id: ProductId, sku: &str) -> ItemState {
            ItemState {
                product_id,
                sku: sku.to_string(),
                counters: self.base.get(&product_id).copied().unwrap_or_default(),
            }
        }

        fn requirement(&self, packaging_id: ProductId, sku: &str, per_unit: i32) -> RequirementState {
            RequirementState {
                packaging_id,
                sku: sku.to_string(),
                per_unit,
                finished: self.base.get(&packaging_id).copied().unwrap_or_default().finished,
            }
        }

        fn component(&self, product_id: ProductId, sku: &str, per_unit: i32) -> ComponentState {
            ComponentState {
                product_id,
                sku: sku.to_string(),
                per_unit,
                semi_finished: self
                    .base
                    .get(&product_id)
                    .copied()
                    .unwrap_or_default()
                    .semi_finished,
            }
        }
    }

    const X: ProductId = ProductId::new(1);
    const P: ProductId = ProductId::new(2);
    const A: ProductId = ProductId::new(3);
    const B: ProductId = ProductId::new(4);
    const C: ComboProductId = ComboProductId::new(1);

    fn scenario_a_ledger() -> Ledger {
        let mut ledger = Ledger::default();
        ledger.base.insert(
            X,
            BaseCounters {
                semi_finished: 10,
                ..BaseCounters::default()
            },
        );
        ledger.base.insert(
            P,
            BaseCounters {
                finished: 15,
                ..BaseCounters::default()
            },
        );
        ledger
    }

    #[test]
    fn test_package_consumes_packaging_and_moves_buckets() {
        let mut ledger = scenario_a_ledger();
        let plan = plan_package(
            &ledger.item_state(X, "SKU-X"),
            &[ledger.requirement(P, "PKG-P", 2)],
            7,
        )
        .unwrap();
        ledger.apply(&plan);

        assert_eq!(ledger.base[&X].semi_finished, 3);
        assert_eq!(ledger.base[&X].finished, 7);
        assert_eq!(ledger.base[&P].finished, 1);
    }

    #[test]
    fn test_package_shortfall_names_packaging_item() {
        let mut ledger = scenario_a_ledger();
        let plan = plan_package(
            &ledger.item_state(X, "SKU-X"),
            &[ledger.requirement(P, "PKG-P", 2)],
            7,
        )
        .unwrap();
        ledger.apply(&plan);

        // One more unit needs 2 packaging but only 1 remains.
        let err = plan_package(
            &ledger.item_state(X, "SKU-X"),
            &[ledger.requirement(P, "PKG-P", 2)],
            1,
        )
        .unwrap_err();

        match err {
            EngineError::InsufficientStock {
                item,
                bucket,
                requested,
                available,
            } => {
                assert_eq!(item, "PKG-P");
                assert_eq!(bucket, StockBucket::Finished);
                assert_eq!(requested, 2);
                assert_eq!(available, 1);
            }
            other => panic!("expected InsufficientStock, got {other:?}"),
        }
    }

    #[test]
    fn test_package_then_unpack_restores_all_counters() {
        let mut ledger = scenario_a_ledger();
        let initial = ledger.clone();

        let package = plan_package(
            &ledger.item_state(X, "SKU-X"),
            &[ledger.requirement(P, "PKG-P", 2)],
            6,
        )
        .unwrap();
        ledger.apply(&package);

        let unpack = plan_unpack(
            &ledger.item_state(X, "SKU-X"),
            &[ledger.requirement(P, "PKG-P", 2)],
            6,
        )
        .unwrap();
        ledger.apply(&unpack);

        assert_eq!(ledger, initial);
    }

    #[test]
    fn test_assemble_then_disassemble_restores_all_counters() {
        let mut ledger = Ledger::default();
        ledger.base.insert(
            A,
            BaseCounters {
                semi_finished: 5,
                ..BaseCounters::default()
            },
        );
        ledger.base.insert(
            B,
            BaseCounters {
                semi_finished: 3,
                ..BaseCounters::default()
            },
        );
        ledger.base.insert(
            P,
            BaseCounters {
                finished: 8,
                ..BaseCounters::default()
            },
        );
        let initial = ledger.clone();

        let components = [ledger.component(A, "SKU-A", 2), ledger.component(B, "SKU-B", 1)];
        let packaging = [ledger.requirement(P, "PKG-P", 1)];
        let assemble = plan_assemble(C, "COMBO-C", &components, &packaging, 2).unwrap();
        ledger.apply(&assemble);

        assert_eq!(ledger.base[&A].semi_finished, 1);
        assert_eq!(ledger.base[&B].semi_finished, 1);
        assert_eq!(ledger.base[&P].finished, 6);
        assert_eq!(ledger.combo[&C].finished, 2);

        let components = [ledger.component(A, "SKU-A", 2), ledger.component(B, "SKU-B", 1)];
        let packaging = [ledger.requirement(P, "PKG-P", 1)];
        let disassemble = plan_disassemble(
            C,
            "COMBO-C",
            ledger.combo[&C],
            &components,
            &packaging,
            2,
        )
        .unwrap();
        ledger.apply(&disassemble);

        assert_eq!(ledger.base, initial.base);
        assert_eq!(ledger.combo[&C], ComboCounters::default());
    }

    #[test]
    fn test_assemble_rejects_before_any_delta_on_shortfall() {
        let mut ledger = Ledger::default();
        ledger.base.insert(
            A,
            BaseCounters {
                semi_finished: 10,
                ..BaseCounters::default()
            },
        );
        ledger.base.insert(
            B,
            BaseCounters {
                semi_finished: 1,
                ..BaseCounters::default()
            },
        );

        let components = [ledger.component(A, "SKU-A", 1), ledger.component(B, "SKU-B", 2)];
        let err = plan_assemble(C, "COMBO-C", &components, &[], 1).unwrap_err();

        // The whole operation is rejected; no partial consumption of A.
        match err {
            EngineError::InsufficientStock { item, requested, available, .. } => {
                assert_eq!(item, "SKU-B");
                assert_eq!(requested, 2);
                assert_eq!(available, 1);
            }
            other => panic!("expected InsufficientStock, got {other:?}"),
        }
    }

    #[test]
    fn test_assemble_without_components_is_configuration_missing() {
        let err = plan_assemble(C, "COMBO-C", &[], &[], 1).unwrap_err();
        assert!(matches!(err, EngineError::ConfigurationMissing { .. }));

        let err =
            plan_disassemble(C, "COMBO-C", ComboCounters::default(), &[], &[], 1).unwrap_err();
        assert!(matches!(err, EngineError::ConfigurationMissing { .. }));
    }

    #[test]
    fn test_non_positive_quantity_rejected_everywhere() {
        let ledger = scenario_a_ledger();
        let item = ledger.item_state(X, "SKU-X");

        assert!(matches!(
            plan_receive(&item, 0),
            Err(EngineError::InvalidQuantity { value: 0 })
        ));
        assert!(matches!(
            plan_ship(&item, -3),
            Err(EngineError::InvalidQuantity { value: -3 })
        ));
        assert!(matches!(
            plan_package(&item, &[], 0),
            Err(EngineError::InvalidQuantity { .. })
        ));
    }

    #[test]
    fn test_confirm_receipt_moves_in_transit() {
        let mut ledger = Ledger::default();
        let item = ledger.item_state(X, "SKU-X");
        let receive = plan_receive(&item, 4).unwrap();
        ledger.apply(&receive);
        assert_eq!(ledger.base[&X].in_transit, 4);

        let confirm = plan_confirm_receipt(&ledger.item_state(X, "SKU-X"), 4).unwrap();
        ledger.apply(&confirm);
        assert_eq!(ledger.base[&X].in_transit, 0);
        assert_eq!(ledger.base[&X].semi_finished, 4);
    }

    #[test]
    fn test_confirm_receipt_shortfall_names_in_transit() {
        let ledger = Ledger::default();
        let err = plan_confirm_receipt(&ledger.item_state(X, "SKU-X"), 1).unwrap_err();
        match err {
            EngineError::InsufficientStock { item, bucket, .. } => {
                assert_eq!(item, "SKU-X");
                assert_eq!(bucket, StockBucket::InTransit);
            }
            other => panic!("expected InsufficientStock, got {other:?}"),
        }
    }

    #[test]
    fn test_ship_combo_is_finished_to_shipped() {
        let plan = plan_ship_combo(
            C,
            "COMBO-C",
            ComboCounters {
                finished: 2,
                shipped: 0,
            },
            2,
        )
        .unwrap();
        assert_eq!(plan.transition, TransitionType::Ship);
        assert_eq!(plan.from_bucket, Some(StockBucket::Finished));
        assert_eq!(plan.to_bucket, Some(StockBucket::Shipped));

        let err = plan_ship_combo(C, "COMBO-C", ComboCounters::default(), 1).unwrap_err();
        assert!(matches!(err, EngineError::InsufficientStock { .. }));
    }
}
