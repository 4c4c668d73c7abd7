use std::collections::{BTreeMap, BTreeSet, HashMap};

use polars::prelude::*;

use crate::error::AttachError;
use crate::schema::{line, machine, pair};

/// Option-pair co-occurrence table for one machine.
///
/// For every order of the selected machine, the distinct item codes on that
/// order are collected as a set; each unordered pair of distinct items
/// increments one counter under its canonical (lexicographically sorted) key,
/// so (A,B) and (B,A) are the same row. Support divides by the machine's
/// total order count from the machine table; orders with fewer than two
/// distinct options contribute no pairs but stay in the denominator.
///
/// Rows are sorted by descending count, then (item_a, item_b).
/// O(orders × k²) for k options per order.
pub fn pair_counts(
    joined: &DataFrame,
    machines: &DataFrame,
    machine_code: &str,
) -> Result<DataFrame, AttachError> {
    let total_orders = total_orders_for(machines, machine_code)?;
    if total_orders == 0 {
        return Err(AttachError::UnknownMachine(machine_code.to_string()));
    }

    let machine_col = joined.column(machine::MACHINE_CODE)?.str()?;
    let order_col = joined.column(line::ORDER_ID)?.str()?;
    let item_col = joined.column(line::ITEM_CODE)?.str()?;

    // Distinct item set per order, restricted to the selected machine.
    let mut order_items: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
    for i in 0..joined.height() {
        if machine_col.get(i) != Some(machine_code) {
            continue;
        }
        let (Some(order), Some(item)) = (order_col.get(i), item_col.get(i)) else {
            continue;
        };
        order_items.entry(order).or_default().insert(item);
    }

    let mut counter: HashMap<(&str, &str), u32> = HashMap::new();
    for items in order_items.values() {
        // BTreeSet iteration is sorted, so (earlier, later) is the canonical key.
        let items: Vec<&str> = items.iter().copied().collect();
        for a in 0..items.len() {
            for b in (a + 1)..items.len() {
                *counter.entry((items[a], items[b])).or_insert(0) += 1;
            }
        }
    }

    let mut rows: Vec<(&str, &str, u32)> = counter
        .into_iter()
        .map(|((a, b), count)| (a, b, count))
        .collect();
    rows.sort_by(|x, y| {
        y.2.cmp(&x.2)
            .then_with(|| x.0.cmp(y.0))
            .then_with(|| x.1.cmp(y.1))
    });

    let item_a: Vec<String> = rows.iter().map(|r| r.0.to_string()).collect();
    let item_b: Vec<String> = rows.iter().map(|r| r.1.to_string()).collect();
    let counts: Vec<u32> = rows.iter().map(|r| r.2).collect();
    let support: Vec<f64> = rows
        .iter()
        .map(|r| r.2 as f64 / total_orders as f64)
        .collect();

    let df = DataFrame::new(vec![
        Column::new(pair::ITEM_A.into(), &item_a),
        Column::new(pair::ITEM_B.into(), &item_b),
        Column::new(pair::CO_OCCURRENCE_COUNT.into(), &counts),
        Column::new(pair::SUPPORT.into(), &support),
    ])?;

    Ok(df)
}

/// Distinct order count for one machine. The machine table holds one row per
/// order, so this is a plain row count.
fn total_orders_for(machines: &DataFrame, machine_code: &str) -> Result<usize, AttachError> {
    let codes = machines.column(machine::MACHINE_CODE)?.str()?;
    Ok(codes
        .into_iter()
        .flatten()
        .filter(|code| *code == machine_code)
        .count())
}
