/// Column-name constants for order-attachkit tables.
/// Single source of truth for every DataFrame the crate produces.

// ── Canonical order-line columns ────────────────────────────────────────────
pub mod line {
    pub const ORDER_ID: &str = "order_id";
    pub const LINE_NUMBER: &str = "line_number";
    pub const ITEM_CODE: &str = "item_code";
    pub const DESCRIPTION: &str = "description";
}

// ── Machine table columns ───────────────────────────────────────────────────
pub mod machine {
    pub const ORDER_ID: &str = "order_id";
    pub const MACHINE_CODE: &str = "machine_code";
}

// ── Attach-rate table columns ───────────────────────────────────────────────
pub mod attach {
    pub const MACHINE_CODE: &str = "machine_code";
    pub const ITEM_CODE: &str = "item_code";
    pub const DISTINCT_ORDER_COUNT: &str = "distinct_order_count";
    pub const TOTAL_ORDERS: &str = "total_orders";
    pub const ATTACH_RATE: &str = "attach_rate";
}

// ── Pair table columns ──────────────────────────────────────────────────────
pub mod pair {
    pub const ITEM_A: &str = "item_a";
    pub const ITEM_B: &str = "item_b";
    pub const CO_OCCURRENCE_COUNT: &str = "co_occurrence_count";
    pub const SUPPORT: &str = "support";
}

// ── Header aliases ──────────────────────────────────────────────────────────
//
// Matched against a normalized header (trimmed, lowercase, space/dash folded
// to underscore). Matching strategy, per canonical field:
//   1) exact match, scanning raw headers in input order
//   2) affix match: starts_with("alias_"), ends_with("_alias"), contains("_alias_")
// The first hit wins; later headers never displace an earlier match.
pub mod aliases {
    pub const ORDER_ID: &[&str] = &[
        "order_id",
        "co_num",
        "co_number",
        "order_number",
        "order_no",
        "order",
    ];

    pub const LINE_NUMBER: &[&str] = &[
        "line_number",
        "co_line",
        "line_no",
        "line_num",
        "line",
    ];

    pub const ITEM_CODE: &[&str] = &[
        "item_code",
        "item",
        "item_number",
        "item_no",
        "part_number",
        "product_code",
    ];

    pub const DESCRIPTION: &[&str] = &[
        "description",
        "item_description",
        "desc",
    ];
}
