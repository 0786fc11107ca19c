//! Kitchen tickets handed to the printer.

use crate::model::{DisplayNumber, Money, Order, OrderId, Priority};
use chrono::{DateTime, Utc};
use std::fmt::Write;

#[derive(Debug, Clone, PartialEq)]
pub struct TicketLine {
    pub quantity: u32,
    pub name: String,
    pub customizations: Vec<String>,
    pub note: Option<String>,
    pub line_total: Money,
}

/// Everything the kitchen needs on paper.
#[derive(Debug, Clone, PartialEq)]
pub struct KitchenTicket {
    pub store_name: String,
    pub order_id: OrderId,
    pub display_number: DisplayNumber,
    pub customer_name: String,
    pub customer_phone: String,
    pub priority: Priority,
    pub placed_at: DateTime<Utc>,
    pub lines: Vec<TicketLine>,
    pub subtotal: Money,
    pub tax: Money,
    pub total: Money,
    pub special_instructions: Option<String>,
}

impl KitchenTicket {
    /// Builds a ticket, splitting the tax-inclusive total with `tax_rate`.
    pub fn from_order(order: &Order, store_name: &str, tax_rate: f64) -> Self {
        let (subtotal, tax) = split_tax(order.total, tax_rate);
        Self {
            store_name: store_name.to_string(),
            order_id: order.id,
            display_number: order.display_number,
            customer_name: order.customer.name.clone(),
            customer_phone: order.customer.phone.clone(),
            priority: order.priority,
            placed_at: order.created_at,
            lines: order
                .items
                .iter()
                .map(|item| TicketLine {
                    quantity: item.quantity,
                    name: item.name.clone(),
                    customizations: item.customizations.clone(),
                    note: item.note.clone(),
                    line_total: item.line_total(),
                })
                .collect(),
            subtotal,
            tax,
            total: order.total,
            special_instructions: order.special_instructions.clone(),
        }
    }

    /// Plain-text rendering, one field per line.
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{}", self.store_name);
        let _ = writeln!(out, "Order {}  {}", self.display_number, self.placed_at.format("%Y-%m-%d %H:%M"));
        if self.priority != Priority::Normal {
            let _ = writeln!(out, "*** {} ***", self.priority.as_str().to_uppercase());
        }
        let _ = writeln!(out, "{}  {}", self.customer_name, self.customer_phone);
        let _ = writeln!(out, "----------------------------------------");
        for line in &self.lines {
            let _ = writeln!(out, "{} x {:<28} {:>8}", line.quantity, line.name, line.line_total);
            for customization in &line.customizations {
                let _ = writeln!(out, "    + {customization}");
            }
            if let Some(note) = &line.note {
                let _ = writeln!(out, "    note: {note}");
            }
        }
        let _ = writeln!(out, "----------------------------------------");
        let _ = writeln!(out, "Subtotal {:>31}", self.subtotal);
        let _ = writeln!(out, "Tax {:>36}", self.tax);
        let _ = writeln!(out, "Total {:>34}", self.total);
        if let Some(instructions) = &self.special_instructions {
            let _ = writeln!(out, "Instructions: {instructions}");
        }
        out
    }
}

/// `subtotal = round(total / (1 + rate))`, `tax = total - subtotal`.
pub fn split_tax(total: Money, tax_rate: f64) -> (Money, Money) {
    if tax_rate <= 0.0 {
        return (total, Money::ZERO);
    }
    let subtotal = Money((total.cents() as f64 / (1.0 + tax_rate)).round() as i64);
    (subtotal, total - subtotal)
}
