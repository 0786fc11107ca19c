//! Log-backed collaborators for running without real hardware.

use super::{AlertSink, PrintError, TicketPrinter};
use crate::dispatcher::{Alert, KitchenTicket, Toast};
use async_trait::async_trait;
use tracing::info;

/// Writes alerts and toasts to the log.
#[derive(Debug, Clone, Default)]
pub struct TracingAlertSink {
    terminal: String,
}

impl TracingAlertSink {
    pub fn new(terminal: impl Into<String>) -> Self {
        Self {
            terminal: terminal.into(),
        }
    }
}

impl AlertSink for TracingAlertSink {
    fn play_alert(&self, alert: &Alert) {
        info!(terminal = %self.terminal, kind = ?alert.kind, emphasis = ?alert.emphasis, order = %alert.display_number, "Alert");
    }

    fn show_toast(&self, toast: &Toast) {
        info!(terminal = %self.terminal, title = %toast.title, body = %toast.body, "Toast");
    }
}

/// "Prints" tickets by logging their rendered text.
#[derive(Debug, Clone, Default)]
pub struct LogTicketPrinter;

#[async_trait]
impl TicketPrinter for LogTicketPrinter {
    async fn print(&self, ticket: KitchenTicket) -> Result<(), PrintError> {
        info!(order = %ticket.display_number, "Kitchen ticket\n{}", ticket.render());
        Ok(())
    }
}
