//! Invoice rendering.
//!
//! Invoices are plain-text documents with a fixed 64-column layout. They are rendered on demand and never stored, so
//! [`render_invoice`] is a pure function of the order and the locale: the same inputs always produce the same bytes.
use std::fmt::Debug;

use chrono::{DateTime, Utc};
use log::*;

use crate::{
    db_types::{Order, OrderNumber},
    fe_api::errors::InvoiceError,
    traits::OrderManagement,
};

pub mod cart;
pub mod templates;

pub use cart::{parse_cart, trip_summary, CartLine};
pub use templates::{for_locale, resolve, InvoiceTemplate, DEFAULT_LOCALE};

pub const INVOICE_WIDTH: usize = 64;
pub const INVOICE_CONTENT_TYPE: &str = "text/plain; charset=utf-8";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invoice {
    pub order_number: OrderNumber,
    /// The locale the invoice was actually rendered in, after fallback.
    pub locale: &'static str,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

pub fn render_invoice(order: &Order, locale: &str) -> Invoice {
    let t = resolve(locale);
    if t.locale != locale {
        debug!("🧾️ No invoice template for '{locale}'. Using '{}'.", t.locale);
    }
    let rule = "=".repeat(INVOICE_WIDTH);
    let thin = "-".repeat(INVOICE_WIDTH);
    let date = |d: &DateTime<Utc>| d.format(t.date_format).to_string();
    let mut out = Vec::<String>::new();

    out.push(rule.clone());
    out.push(columns(t.title, order.order_number.as_str()));
    out.push(rule.clone());
    out.push(format!("{}: {}", t.order, order.order_number));
    out.push(format!("{}: {}", t.date, date(&order.created_at)));
    out.push(format!("{}: {}", t.billed_to, order.customer_name));
    if let Some(email) = order.customer_email.as_deref().filter(|e| !e.is_empty()) {
        out.push(format!("{}: {email}", t.email));
    }
    if let Some(phone) = order.customer_phone.as_deref().filter(|p| !p.is_empty()) {
        out.push(format!("{}: {phone}", t.phone));
    }

    out.push(thin.clone());
    out.push(columns(t.item, t.amount));
    out.push(thin.clone());
    for line in parse_cart(&order.cart) {
        let amount = line.subtotal.map(|m| m.to_string()).unwrap_or_default();
        out.push(columns(&line.name, &amount));
        for option in &line.selected {
            out.push(truncate(&format!("  + {option}"), INVOICE_WIDTH));
        }
        if !line.travellers.is_empty() {
            let counts =
                line.travellers.iter().map(|(k, n)| format!("{}: {n}", t.bracket(k))).collect::<Vec<_>>().join(", ");
            out.push(truncate(&format!("  {counts}"), INVOICE_WIDTH));
        }
    }
    out.push(thin);
    out.push(columns(t.total, &format!("{} {}", order.total, order.currency)));
    out.push(format!("{}: {}", t.payment, order.payment_status));
    if let Some(paid_at) = &order.paid_at {
        out.push(format!("{}: {}", t.paid_on, date(paid_at)));
    }
    if let Some(txid) = order.transaction_id.as_deref() {
        let method = order.payment_method.as_deref().map(|m| format!(" ({m})")).unwrap_or_default();
        out.push(truncate(&format!("{}: {txid}{method}", t.transaction), INVOICE_WIDTH));
    }
    out.push(rule);
    out.push(t.thanks.to_string());

    let mut text = out.join("\n");
    text.push('\n');
    Invoice {
        order_number: order.order_number.clone(),
        locale: t.locale,
        content_type: INVOICE_CONTENT_TYPE,
        bytes: text.into_bytes(),
    }
}

/// `left` and `right` on one line, `right` flush with the right margin. `left` is cut short if the two do not fit.
fn columns(left: &str, right: &str) -> String {
    let right_len = right.chars().count();
    let room = INVOICE_WIDTH.saturating_sub(right_len + 1);
    let left = truncate(left, room);
    let pad = INVOICE_WIDTH.saturating_sub(left.chars().count() + right_len);
    format!("{left}{}{right}", " ".repeat(pad))
}

fn truncate(s: &str, width: usize) -> String {
    s.chars().take(width).collect()
}

/// Fetches orders and renders their invoices.
pub struct InvoiceApi<B> {
    db: B,
}

impl<B> Debug for InvoiceApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "InvoiceApi")
    }
}

impl<B> InvoiceApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }
}

impl<B: OrderManagement> InvoiceApi<B> {
    pub async fn invoice_for_order(&self, order_number: &OrderNumber, locale: &str) -> Result<Invoice, InvoiceError> {
        let order = self
            .db
            .fetch_order(order_number)
            .await?
            .ok_or_else(|| InvoiceError::OrderNotFound(order_number.clone()))?;
        Ok(render_invoice(&order, locale))
    }
}
