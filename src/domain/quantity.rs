//! Fixed-point resource quantities and the arithmetic the decision engine
//! and locking step need over them.
//!
//! A [`Quantity`] is always expressed in its component's base unit: for CPU
//! that is a milli-core, for memory/GPU/storage that is a byte. Keeping
//! everything as an integer base-unit count means comparisons and additions
//! never have to reconcile mismatched scales at the call site.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum QuantityError {
    #[error("invalid quantity '{0}': expected a decimal with an optional unit suffix (m, Ki, Mi, Gi, Ti)")]
    InvalidFormat(String),

    #[error("quantity underflow: {minuend} - {subtrahend}")]
    Underflow { minuend: Quantity, subtrahend: Quantity },
}

/// A non-negative quantity in a component's base unit (milli-cores for CPU,
/// bytes for memory/GPU/storage).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Quantity(pub u64);

impl Quantity {
    pub const ZERO: Quantity = Quantity(0);

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub fn is_positive(self) -> bool {
        self.0 > 0
    }

    pub fn add(self, other: Quantity) -> Quantity {
        Quantity(self.0.saturating_add(other.0))
    }

    /// Subtracts `other`, returning an error if the result would be
    /// negative. Used wherever a negative result is a domain error rather
    /// than a legitimate "nothing left".
    pub fn checked_sub(self, other: Quantity) -> Result<Quantity, QuantityError> {
        self.0
            .checked_sub(other.0)
            .map(Quantity)
            .ok_or(QuantityError::Underflow { minuend: self, subtrahend: other })
    }

    /// Subtracts `other`, clamping at zero. Used for `Available` computation,
    /// where a provider whose Allocated+Reserved has crept past Allocatable
    /// (e.g. during a lifecycle race) should read as zero headroom, not error.
    pub fn saturating_sub(self, other: Quantity) -> Quantity {
        Quantity(self.0.saturating_sub(other.0))
    }

    /// Fraction of `self` that `part` represents, as `0.0..=1.0`-ish (not
    /// clamped — callers that need utilisation-after calculations clamp
    /// themselves if they want to tolerate transient over-commit).
    pub fn ratio_of(part: Quantity, whole: Quantity) -> f64 {
        if whole.0 == 0 {
            return 0.0;
        }
        part.0 as f64 / whole.0 as f64
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Parses a unit-suffixed decimal into a [`Quantity`] expressed in its base
/// unit. Accepts a bare integer (already in the base unit), `m` (milli,
/// meaningful for CPU), and binary byte multipliers `Ki`/`Mi`/`Gi`/`Ti`
/// (meaningful for memory/GPU/storage). The caller is responsible for
/// knowing which suffixes make sense for the component being parsed; this
/// function only rejects syntactically invalid input.
pub fn parse_quantity(input: &str) -> Result<Quantity, QuantityError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(QuantityError::InvalidFormat(input.to_string()));
    }

    const SUFFIXES: &[(&str, f64)] = &[
        ("Ti", 1024.0 * 1024.0 * 1024.0 * 1024.0),
        ("Gi", 1024.0 * 1024.0 * 1024.0),
        ("Mi", 1024.0 * 1024.0),
        ("Ki", 1024.0),
        ("m", 0.001),
    ];

    for (suffix, multiplier) in SUFFIXES {
        if let Some(number) = input.strip_suffix(suffix) {
            let value: f64 = number
                .trim()
                .parse()
                .map_err(|_| QuantityError::InvalidFormat(input.to_string()))?;
            if value < 0.0 {
                return Err(QuantityError::InvalidFormat(input.to_string()));
            }
            return Ok(Quantity((value * multiplier).round() as u64));
        }
    }

    let value: f64 = input.parse().map_err(|_| QuantityError::InvalidFormat(input.to_string()))?;
    if value < 0.0 {
        return Err(QuantityError::InvalidFormat(input.to_string()));
    }
    Ok(Quantity(value.round() as u64))
}

/// Formats a base-unit quantity back into the canonical wire form for the
/// given suffix (`"m"` or `"Ki"`/`"Mi"`/`"Gi"`/`"Ti"` callers may prefer);
/// the broker always stores and emits plain base-unit integers, which are
/// themselves valid input to [`parse_quantity`].
pub fn format_quantity(q: Quantity) -> String {
    q.0.to_string()
}

/// The four (two required, two optional) resource components a cluster can
/// advertise or a reservation can request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ResourceQuantities {
    pub cpu: Quantity,
    pub memory: Quantity,
    pub gpu: Option<Quantity>,
    pub storage: Option<Quantity>,
}

impl ResourceQuantities {
    pub fn new(cpu: Quantity, memory: Quantity) -> Self {
        Self { cpu, memory, gpu: None, storage: None }
    }

    /// Componentwise addition. A missing optional component on either side
    /// is treated as present-with-zero if the other side has a value, so
    /// "add a GPU request onto a GPU-less accumulator" just starts tracking
    /// GPU, it never discards it.
    pub fn add(&self, other: &ResourceQuantities) -> ResourceQuantities {
        ResourceQuantities {
            cpu: self.cpu.add(other.cpu),
            memory: self.memory.add(other.memory),
            gpu: add_optional(self.gpu, other.gpu),
            storage: add_optional(self.storage, other.storage),
        }
    }

    /// Componentwise subtraction, clamped at zero per component. Used for
    /// `Available = Allocatable - Allocated - Reserved`.
    pub fn saturating_sub(&self, other: &ResourceQuantities) -> ResourceQuantities {
        ResourceQuantities {
            cpu: self.cpu.saturating_sub(other.cpu),
            memory: self.memory.saturating_sub(other.memory),
            gpu: sub_optional_saturating(self.gpu, other.gpu),
            storage: sub_optional_saturating(self.storage, other.storage),
        }
    }

    /// True if every component of `self` is `>=` the corresponding component
    /// of `requested`. A component missing from `self` is treated as zero
    /// (so it only "fits" an unset-or-zero request); a component missing
    /// from `requested` is treated as not requested at all.
    pub fn fits(&self, requested: &ResourceQuantities) -> bool {
        if self.cpu < requested.cpu {
            return false;
        }
        if self.memory < requested.memory {
            return false;
        }
        if let Some(req_gpu) = requested.gpu {
            if req_gpu.is_positive() && self.gpu.unwrap_or(Quantity::ZERO) < req_gpu {
                return false;
            }
        }
        if let Some(req_storage) = requested.storage {
            if req_storage.is_positive() && self.storage.unwrap_or(Quantity::ZERO) < req_storage {
                return false;
            }
        }
        true
    }

    pub fn is_zero(&self) -> bool {
        self.cpu.is_zero()
            && self.memory.is_zero()
            && self.gpu.map(Quantity::is_zero).unwrap_or(true)
            && self.storage.map(Quantity::is_zero).unwrap_or(true)
    }
}

fn add_optional(a: Option<Quantity>, b: Option<Quantity>) -> Option<Quantity> {
    match (a, b) {
        (None, None) => None,
        (Some(a), None) => Some(a),
        (None, Some(b)) => Some(b),
        (Some(a), Some(b)) => Some(a.add(b)),
    }
}

fn sub_optional_saturating(a: Option<Quantity>, b: Option<Quantity>) -> Option<Quantity> {
    match (a, b) {
        (None, None) => None,
        (Some(a), None) => Some(a),
        (None, Some(_)) => Some(Quantity::ZERO),
        (Some(a), Some(b)) => Some(a.saturating_sub(b)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bare_integer() {
        assert_eq!(parse_quantity("500").unwrap(), Quantity(500));
    }

    #[test]
    fn parses_milli_suffix() {
        assert_eq!(parse_quantity("500m").unwrap(), Quantity(500));
        assert_eq!(parse_quantity("1500m").unwrap(), Quantity(1500));
    }

    #[test]
    fn parses_binary_byte_suffixes() {
        assert_eq!(parse_quantity("1Ki").unwrap(), Quantity(1024));
        assert_eq!(parse_quantity("1Gi").unwrap(), Quantity(1024 * 1024 * 1024));
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_quantity("abc").is_err());
        assert!(parse_quantity("-5").is_err());
        assert!(parse_quantity("").is_err());
    }

    #[test]
    fn checked_sub_errors_on_underflow() {
        assert!(Quantity(5).checked_sub(Quantity(10)).is_err());
        assert_eq!(Quantity(10).checked_sub(Quantity(5)).unwrap(), Quantity(5));
    }

    #[test]
    fn saturating_sub_clamps_at_zero() {
        assert_eq!(Quantity(5).saturating_sub(Quantity(10)), Quantity::ZERO);
    }

    #[test]
    fn fits_treats_missing_optional_as_zero() {
        let available = ResourceQuantities::new(Quantity(1000), Quantity(1024));
        let requested = ResourceQuantities { gpu: Some(Quantity(1)), ..ResourceQuantities::new(Quantity(500), Quantity(512)) };
        assert!(!available.fits(&requested));

        let requested_no_gpu = ResourceQuantities::new(Quantity(500), Quantity(512));
        assert!(available.fits(&requested_no_gpu));
    }

    #[test]
    fn add_preserves_optional_components() {
        let a = ResourceQuantities::new(Quantity(100), Quantity(200));
        let b = ResourceQuantities { gpu: Some(Quantity(1)), ..ResourceQuantities::new(Quantity(50), Quantity(50)) };
        let sum = a.add(&b);
        assert_eq!(sum.cpu, Quantity(150));
        assert_eq!(sum.gpu, Some(Quantity(1)));
    }
}
