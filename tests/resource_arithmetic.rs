//! Integration coverage for `domain::quantity` beyond what the inline unit
//! tests already cover in isolation.

use federation_broker::domain::quantity::{parse_quantity, Quantity, ResourceQuantities};
use federation_broker::domain::resource_metrics::ResourceMetrics;

#[test]
fn available_always_reflects_allocatable_minus_allocated_minus_reserved() {
    let mut metrics = ResourceMetrics::new(
        ResourceQuantities::new(Quantity(10_000), Quantity(32 * 1024 * 1024 * 1024)),
        ResourceQuantities::new(Quantity(10_000), Quantity(32 * 1024 * 1024 * 1024)),
        ResourceQuantities::new(Quantity(2_000), Quantity(4 * 1024 * 1024 * 1024)),
    );
    assert_eq!(metrics.available.cpu, Quantity(8_000));

    metrics.reserved = Some(ResourceQuantities::new(Quantity(1_000), Quantity(0)));
    metrics.recompute_available();
    assert_eq!(metrics.available.cpu, Quantity(7_000));

    // Allocated creeping past allocatable (a transient over-commit) clamps
    // available at zero instead of underflowing.
    metrics.allocated = ResourceQuantities::new(Quantity(11_000), Quantity(0));
    metrics.recompute_available();
    assert_eq!(metrics.available.cpu, Quantity::ZERO);
}

#[test]
fn parse_and_format_round_trip_through_base_units() {
    let parsed = parse_quantity("2Gi").unwrap();
    assert_eq!(parsed, Quantity(2 * 1024 * 1024 * 1024));

    let parsed_cpu = parse_quantity("1500m").unwrap();
    assert_eq!(parsed_cpu, Quantity(1500));

    let requested = ResourceQuantities { gpu: Some(parse_quantity("2").unwrap()), ..ResourceQuantities::new(parsed_cpu, parsed) };
    assert!(requested.gpu.unwrap().is_positive());
}

#[test]
fn fits_is_satisfied_at_exact_boundary_not_one_unit_under() {
    let available = ResourceQuantities::new(Quantity(500), Quantity(1024));
    let requested = ResourceQuantities::new(Quantity(500), Quantity(1024));
    assert!(available.fits(&requested));

    let requested_one_more = ResourceQuantities::new(Quantity(501), Quantity(1024));
    assert!(!available.fits(&requested_one_more));
}

#[test]
fn adding_zero_quantities_is_a_no_op() {
    let a = ResourceQuantities::new(Quantity(100), Quantity(200));
    let sum = a.add(&ResourceQuantities::default());
    assert_eq!(sum, a);
}

#[test]
fn checked_sub_rejects_what_saturating_sub_clamps() {
    let available = Quantity(100);
    let requested = Quantity(150);
    assert!(available.checked_sub(requested).is_err());
    assert_eq!(available.saturating_sub(requested), Quantity::ZERO);
}
