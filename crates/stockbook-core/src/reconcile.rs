//! # Stock Reconciliation Planner
//!
//! Turns "lines before an edit" and "lines after an edit" into the minimal
//! list of stock deltas that moves product stock from one to the other.
//!
//! ## Buckets
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  before: {1: A×4, 2: B×5}          after: {2: B×8, 3: C×1}              │
//! │                                                                         │
//! │  Removed    line 1   reverse A×4                                        │
//! │  Added      line 3   apply   C×1                                        │
//! │  Persisting line 2   same product → apply only the difference B×3      │
//! │                                                                         │
//! │  Persisting with a product change (A×4 → B×4):                          │
//! │             MovedFrom reverse A×4, then MovedTo apply B×4               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Deltas come out in bucket order (removed, added, persisting) and by
//! ascending line id inside each bucket. Purchases push stock in
//! ([`StockDirection::Inbound`]), sales pull it out
//! ([`StockDirection::Outbound`]).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The stock-relevant part of one order line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineSnapshot {
    pub product_id: i64,
    pub quantity: i64,
}

/// An order's lines keyed by line id, ordered by id.
pub type LineSet = BTreeMap<i64, LineSnapshot>;

/// Which way an order moves stock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockDirection {
    /// Purchases: a line adds its quantity.
    Inbound,
    /// Sales: a line removes its quantity.
    Outbound,
}

impl StockDirection {
    /// Stock effect of a line with `quantity` in this direction.
    pub fn effect(self, quantity: i64) -> i64 {
        match self {
            StockDirection::Inbound => quantity,
            StockDirection::Outbound => -quantity,
        }
    }
}

/// Why a delta was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeltaCause {
    Added,
    Removed,
    Resized,
    MovedFrom,
    MovedTo,
}

/// One signed stock adjustment for one product.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockDelta {
    pub line_id: i64,
    pub product_id: i64,
    pub delta: i64,
    pub cause: DeltaCause,
}

/// Deltas for one edit, plus how many lines fell in each bucket.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconciliationPlan {
    pub deltas: Vec<StockDelta>,
    pub removed: usize,
    pub added: usize,
    pub persisting: usize,
}

impl ReconciliationPlan {
    /// True when the edit does not touch stock.
    pub fn is_empty(&self) -> bool {
        self.deltas.is_empty()
    }

    /// Net delta per product.
    pub fn net_by_product(&self) -> BTreeMap<i64, i64> {
        let mut net = BTreeMap::new();
        for d in &self.deltas {
            *net.entry(d.product_id).or_insert(0) += d.delta;
        }
        net
    }
}

/// Stock effect of a freshly created order: every line, in id order.
pub fn initial_effect(direction: StockDirection, lines: &LineSet) -> Vec<StockDelta> {
    lines
        .iter()
        .map(|(&line_id, line)| StockDelta {
            line_id,
            product_id: line.product_id,
            delta: direction.effect(line.quantity),
            cause: DeltaCause::Added,
        })
        .collect()
}

/// Plans the stock deltas that take an order from `before` to `after`.
///
/// ## Arguments
/// * `direction` - inbound for purchases, outbound for sales
/// * `before` - snapshot taken before the edit was persisted
/// * `after` - lines as persisted after the edit
pub fn plan_reconciliation(
    direction: StockDirection,
    before: &LineSet,
    after: &LineSet,
) -> ReconciliationPlan {
    let mut plan = ReconciliationPlan::default();

    // Removed: undo the original effect on the original product
    for (&line_id, old) in before.iter().filter(|(id, _)| !after.contains_key(id)) {
        plan.removed += 1;
        plan.deltas.push(StockDelta {
            line_id,
            product_id: old.product_id,
            delta: -direction.effect(old.quantity),
            cause: DeltaCause::Removed,
        });
    }

    // Added
    for (&line_id, new) in after.iter().filter(|(id, _)| !before.contains_key(id)) {
        plan.added += 1;
        plan.deltas.push(StockDelta {
            line_id,
            product_id: new.product_id,
            delta: direction.effect(new.quantity),
            cause: DeltaCause::Added,
        });
    }

    // Persisting
    for (&line_id, old) in before.iter() {
        let Some(new) = after.get(&line_id) else {
            continue;
        };
        plan.persisting += 1;

        if old.product_id == new.product_id {
            let delta = direction.effect(new.quantity - old.quantity);
            if delta != 0 {
                plan.deltas.push(StockDelta {
                    line_id,
                    product_id: new.product_id,
                    delta,
                    cause: DeltaCause::Resized,
                });
            }
        } else {
            plan.deltas.push(StockDelta {
                line_id,
                product_id: old.product_id,
                delta: -direction.effect(old.quantity),
                cause: DeltaCause::MovedFrom,
            });
            plan.deltas.push(StockDelta {
                line_id,
                product_id: new.product_id,
                delta: direction.effect(new.quantity),
                cause: DeltaCause::MovedTo,
            });
        }
    }

    plan
}

// =============================================================================
// Unit Tests
// =============================================================================
