//! Side-effect values produced by the dispatcher.

use super::KitchenTicket;
use crate::model::{DisplayNumber, OrderId, Priority};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertKind {
    NewOrder,
    OrderReady,
}

/// How loudly to announce something. Derived from priority only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Emphasis {
    Standard,
    Elevated,
    Urgent,
}

impl Emphasis {
    pub fn for_priority(priority: Priority) -> Self {
        match priority {
            Priority::Normal => Emphasis::Standard,
            Priority::Express => Emphasis::Elevated,
            Priority::Vip => Emphasis::Urgent,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub order_id: OrderId,
    pub display_number: DisplayNumber,
    pub kind: AlertKind,
    pub emphasis: Emphasis,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub order_id: OrderId,
    pub title: String,
    pub body: String,
    pub emphasis: Emphasis,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Alert(Alert),
    Toast(Toast),
    Print(KitchenTicket),
}

/// Effects decided for one observation, in the order they should run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dispatch {
    pub effects: Vec<Effect>,
}

impl Dispatch {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    pub fn alerts(&self) -> impl Iterator<Item = &Alert> {
        self.effects.iter().filter_map(|effect| match effect {
            Effect::Alert(alert) => Some(alert),
            _ => None,
        })
    }

    pub fn prints(&self) -> impl Iterator<Item = &KitchenTicket> {
        self.effects.iter().filter_map(|effect| match effect {
            Effect::Print(ticket) => Some(ticket),
            _ => None,
        })
    }
}

impl IntoIterator for Dispatch {
    type Item = Effect;
    type IntoIter = std::vec::IntoIter<Effect>;

    fn into_iter(self) -> Self::IntoIter {
        self.effects.into_iter()
    }
}
