//! Lenient reading of the opaque cart payload stored on an order.
//!
//! The storefront writes the cart as JSON, either a bare array of line items or an object with an `items` array:
//!
//! ```json
//! [{ "name": "Ha Long Bay Cruise",
//!    "selected": ["Kayaking", { "name": "Hotel pickup" }],
//!    "travellers": { "adult": 2, "child": 1, "infant": 0 },
//!    "subtotal": 240.5 }]
//! ```
//!
//! Nothing here fails. Missing or malformed fields fall back to empty values, and entries that are not objects are
//! skipped, so a damaged line can never stop an invoice or a badge from being produced.
use std::collections::BTreeMap;

use log::warn;
use serde_json::Value;
use tour_common::Money;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CartLine {
    pub name: String,
    pub selected: Vec<String>,
    /// Traveller counts per age bracket. Only brackets with a positive count are kept.
    pub travellers: BTreeMap<String, u32>,
    pub subtotal: Option<Money>,
}

pub fn parse_cart(raw: &str) -> Vec<CartLine> {
    let value = match serde_json::from_str::<Value>(raw) {
        Ok(v) => v,
        Err(e) => {
            warn!("🧾️ Cart payload is not valid JSON. Treating it as empty. {e}");
            return Vec::new();
        },
    };
    let items = match value {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("items") {
            Some(Value::Array(items)) => items,
            _ => Vec::new(),
        },
        _ => Vec::new(),
    };
    items.iter().filter_map(parse_line).collect()
}

fn parse_line(item: &Value) -> Option<CartLine> {
    let obj = item.as_object()?;
    let name = obj.get("name").or_else(|| obj.get("title")).and_then(Value::as_str).unwrap_or_default();
    let name = name.trim().to_string();
    let selected = obj
        .get("selected")
        .and_then(Value::as_array)
        .map(|opts| {
            opts.iter()
                .filter_map(|o| match o {
                    Value::String(s) => Some(s.trim().to_string()),
                    Value::Object(m) => m.get("name").and_then(Value::as_str).map(|s| s.trim().to_string()),
                    _ => None,
                })
                .filter(|s| !s.is_empty())
                .collect()
        })
        .unwrap_or_default();
    let travellers = obj
        .get("travellers")
        .and_then(Value::as_object)
        .map(|counts| {
            counts
                .iter()
                .filter_map(|(bracket, n)| {
                    let n = n.as_u64().and_then(|n| u32::try_from(n).ok())?;
                    (n > 0).then(|| (bracket.to_ascii_lowercase(), n))
                })
                .collect()
        })
        .unwrap_or_default();
    let subtotal = obj.get("subtotal").and_then(Value::as_f64).and_then(|v| Money::try_from(v).ok());
    Some(CartLine { name, selected, travellers, subtotal })
}

/// A one-line description of the booked trips, e.g. `"Ha Long Bay Cruise, Cooking Class"`.
pub fn trip_summary(raw: &str) -> String {
    parse_cart(raw).into_iter().map(|l| l.name).filter(|n| !n.is_empty()).collect::<Vec<_>>().join(", ")
}
