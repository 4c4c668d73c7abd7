use polars::prelude::*;

use crate::error::AttachError;
use crate::schema::{attach, machine};

/// Attach-rate table: one row per (machine_code, item_code) with the count of
/// distinct orders carrying that option and the machine's total order count.
///
/// `joined` is the option→machine join, `machines` the deduplicated machine
/// table; the denominator comes from the machine rows alone, so orders
/// without any option still count. Rows are sorted by (machine_code,
/// item_code). Pairs with zero occurrences never appear, so every rate is in
/// (0, 1].
pub fn attach_rates(joined: &DataFrame, machines: &DataFrame) -> Result<DataFrame, AttachError> {
    let counts = joined
        .clone()
        .lazy()
        .group_by([col(attach::MACHINE_CODE), col(attach::ITEM_CODE)])
        .agg([col(machine::ORDER_ID)
            .n_unique()
            .alias(attach::DISTINCT_ORDER_COUNT)]);

    let totals = machines
        .clone()
        .lazy()
        .group_by([col(attach::MACHINE_CODE)])
        .agg([col(machine::ORDER_ID).n_unique().alias(attach::TOTAL_ORDERS)]);

    let rates = counts
        .join(
            totals,
            [col(attach::MACHINE_CODE)],
            [col(attach::MACHINE_CODE)],
            JoinArgs::new(JoinType::Inner),
        )
        .with_column(
            (col(attach::DISTINCT_ORDER_COUNT).cast(DataType::Float64)
                / col(attach::TOTAL_ORDERS).cast(DataType::Float64))
            .alias(attach::ATTACH_RATE),
        )
        .sort(
            [attach::MACHINE_CODE, attach::ITEM_CODE],
            SortMultipleOptions::default(),
        )
        .collect()?;

    // A machine enters this table only through its own order rows, so a zero
    // denominator cannot occur. Assert rather than emit an undefined rate.
    let zero_totals = rates
        .column(attach::TOTAL_ORDERS)?
        .u32()?
        .into_iter()
        .flatten()
        .any(|total| total == 0);
    if zero_totals {
        return Err(AttachError::Validation(
            "machine with zero total orders in attach-rate table".to_string(),
        ));
    }

    Ok(rates)
}

/// Presentation shaping of the attach-rate table: one machine, minimum rate,
/// top-N rows by descending rate (item code breaks ties).
pub fn filter_rates(
    rates: &DataFrame,
    machine_code: &str,
    min_rate: f64,
    top_n: Option<usize>,
) -> Result<DataFrame, AttachError> {
    let mut filtered = rates
        .clone()
        .lazy()
        .filter(
            col(attach::MACHINE_CODE)
                .eq(lit(machine_code))
                .and(col(attach::ATTACH_RATE).gt_eq(lit(min_rate))),
        )
        .sort_by_exprs(
            vec![col(attach::ATTACH_RATE), col(attach::ITEM_CODE)],
            SortMultipleOptions::default().with_order_descending_multi([true, false]),
        );
    if let Some(n) = top_n {
        filtered = filtered.limit(n as IdxSize);
    }
    Ok(filtered.collect()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::line;

    fn joined_frame(rows: &[(&str, &str, &str)]) -> DataFrame {
        // (order_id, item_code, machine_code)
        let orders: Vec<String> = rows.iter().map(|r| r.0.to_string()).collect();
        let items: Vec<String> = rows.iter().map(|r| r.1.to_string()).collect();
        let machines: Vec<String> = rows.iter().map(|r| r.2.to_string()).collect();
        DataFrame::new(vec![
            Column::new(line::ORDER_ID.into(), &orders),
            Column::new(line::ITEM_CODE.into(), &items),
            Column::new(machine::MACHINE_CODE.into(), &machines),
        ])
        .unwrap()
    }

    fn machine_frame(rows: &[(&str, &str)]) -> DataFrame {
        // (order_id, machine_code), already one row per order
        let orders: Vec<String> = rows.iter().map(|r| r.0.to_string()).collect();
        let machines: Vec<String> = rows.iter().map(|r| r.1.to_string()).collect();
        DataFrame::new(vec![
            Column::new(machine::ORDER_ID.into(), &orders),
            Column::new(machine::MACHINE_CODE.into(), &machines),
        ])
        .unwrap()
    }

    #[test]
    fn totals_come_from_machine_orders_not_option_rows() {
        // O2 has no options at all but still belongs in the denominator.
        let machines = machine_frame(&[("O1", "M"), ("O2", "M")]);
        let joined = joined_frame(&[("O1", "A", "M")]);

        let rates = attach_rates(&joined, &machines).unwrap();
        assert_eq!(rates.height(), 1);
        let rate = rates
            .column(attach::ATTACH_RATE)
            .unwrap()
            .f64()
            .unwrap()
            .get(0)
            .unwrap();
        assert_eq!(rate, 0.5);
        let total = rates
            .column(attach::TOTAL_ORDERS)
            .unwrap()
            .u32()
            .unwrap()
            .get(0)
            .unwrap();
        assert_eq!(total, 2);
    }

    #[test]
    fn rows_are_grouped_per_machine_and_sorted() {
        let machines = machine_frame(&[("O1", "M1"), ("O2", "M2")]);
        let joined = joined_frame(&[
            ("O2", "B", "M2"),
            ("O1", "A", "M1"),
            ("O2", "A", "M2"),
        ]);

        let rates = attach_rates(&joined, &machines).unwrap();
        let machines_col: Vec<&str> = rates
            .column(attach::MACHINE_CODE)
            .unwrap()
            .str()
            .unwrap()
            .into_iter()
            .flatten()
            .collect();
        let items_col: Vec<&str> = rates
            .column(attach::ITEM_CODE)
            .unwrap()
            .str()
            .unwrap()
            .into_iter()
            .flatten()
            .collect();
        assert_eq!(machines_col, vec!["M1", "M2", "M2"]);
        assert_eq!(items_col, vec!["A", "A", "B"]);
    }

    #[test]
    fn rates_stay_in_unit_interval() {
        let machines = machine_frame(&[("O1", "M"), ("O2", "M"), ("O3", "M")]);
        let joined = joined_frame(&[
            ("O1", "A", "M"),
            ("O2", "A", "M"),
            ("O3", "A", "M"),
            ("O1", "B", "M"),
        ]);

        let rates = attach_rates(&joined, &machines).unwrap();
        for value in rates
            .column(attach::ATTACH_RATE)
            .unwrap()
            .f64()
            .unwrap()
            .into_iter()
            .flatten()
        {
            assert!(value > 0.0 && value <= 1.0);
        }
    }

    #[test]
    fn filter_applies_threshold_and_top_n_in_rate_order() {
        let machines = machine_frame(&[
            ("O1", "M"),
            ("O2", "M"),
            ("O3", "M"),
            ("O4", "M"),
        ]);
        let joined = joined_frame(&[
            ("O1", "A", "M"),
            ("O2", "A", "M"),
            ("O3", "A", "M"),
            ("O4", "A", "M"),
            ("O1", "B", "M"),
            ("O2", "B", "M"),
            ("O1", "C", "M"),
        ]);

        let rates = attach_rates(&joined, &machines).unwrap();
        let top = filter_rates(&rates, "M", 0.3, Some(2)).unwrap();
        let items: Vec<&str> = top
            .column(attach::ITEM_CODE)
            .unwrap()
            .str()
            .unwrap()
            .into_iter()
            .flatten()
            .collect();
        // A at 1.0, B at 0.5; C at 0.25 falls under the threshold anyway.
        assert_eq!(items, vec!["A", "B"]);
    }

    #[test]
    fn empty_join_yields_empty_table() {
        let machines = machine_frame(&[("O1", "M")]);
        let joined = joined_frame(&[]);
        let rates = attach_rates(&joined, &machines).unwrap();
        assert_eq!(rates.height(), 0);
    }
}
