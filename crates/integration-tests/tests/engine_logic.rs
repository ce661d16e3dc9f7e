//! Logical tests over the library surface.
//!
//! These exercise the pure engine pieces through the public crate API and
//! run without a server or database.

use packhouse_core::{ComboProductId, ItemRef, ProductId, StockBucket, TransitionType};
use packhouse_server::engine::EngineError;
use packhouse_server::engine::availability::{ResourceLine, max_assemble, max_package, max_ship};

fn line(sku: &str, per_unit: i32, available: i32) -> ResourceLine {
    ResourceLine {
        sku: sku.to_string(),
        per_unit,
        available,
    }
}

// =============================================================================
// Availability Through the Public API
// =============================================================================

#[test]
fn test_packaging_bound_is_exact() {
    // max is the largest n for which package(n) would succeed: n consumes
    // 2n packaging, so floor(15/2) = 7 succeeds and 8 would need 16.
    let availability = max_package(10, &[line("PKG-P", 2, 15)]);
    assert_eq!(availability.max, 7);

    let needed_for_one_more = 2 * (availability.max + 1);
    assert!(needed_for_one_more > 15);
}

#[test]
fn test_assemble_bound_takes_component_minimum() {
    let availability = max_assemble(
        &[line("SKU-A", 2, 5), line("SKU-B", 1, 3)],
        &[],
    );
    assert_eq!(availability.max, 2);
    assert_eq!(availability.limiting_factor.as_deref(), Some("SKU-A"));
}

#[test]
fn test_ship_bound_is_finished_stock() {
    assert_eq!(max_ship(0).max, 0);
    assert_eq!(max_ship(41).max, 41);
}

// =============================================================================
// Error Rendering
// =============================================================================

#[test]
fn test_insufficient_stock_message_names_everything() {
    let err = EngineError::InsufficientStock {
        item: "PKG-P".to_string(),
        bucket: StockBucket::Finished,
        requested: 14,
        available: 1,
    };
    let message = err.to_string();
    assert!(message.contains("PKG-P"));
    assert!(message.contains("finished"));
    assert!(message.contains("14"));
    assert!(message.contains('1'));
}

#[test]
fn test_contention_message_suggests_retry() {
    assert!(EngineError::ContentionTimeout.to_string().contains("retry"));
}

// =============================================================================
// Wire Shapes
// =============================================================================

#[test]
fn test_item_ref_wire_shape_is_field_discriminated() {
    let base = serde_json::to_value(ItemRef::base(ProductId::new(7))).expect("serialize");
    assert_eq!(base, serde_json::json!({"product_id": 7}));

    let combo = serde_json::to_value(ItemRef::combo(ComboProductId::new(8))).expect("serialize");
    assert_eq!(combo, serde_json::json!({"combo_product_id": 8}));
}

#[test]
fn test_transition_type_query_form() {
    // Availability endpoints take the snake_case form in query strings.
    assert_eq!(TransitionType::Package.as_str(), "package");
    assert_eq!("assemble".parse::<TransitionType>(), Ok(TransitionType::Assemble));
}
