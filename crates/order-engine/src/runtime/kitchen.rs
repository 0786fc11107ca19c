use crate::config::{ConfigError, EngineConfig};
use crate::ports::{AlertSink, StoreFeed, TicketPrinter};
use crate::session::{Session, SessionHandle, SessionPorts, SessionWarning};
use order_store::{StoreActor, StoreClient};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{error, info};

#[derive(Debug, Error)]
#[error("task failed during shutdown: {0}")]
pub struct ShutdownError(#[from] tokio::task::JoinError);

/// One store plus any number of independent terminal sessions.
///
/// Each session gets its own feed subscription, order set and seen set. They share
/// nothing but the store.
///
/// ```ignore
/// let mut kitchen = Kitchen::start(EngineConfig::default())?;
/// let (front, _warnings) = kitchen.open_session("front", alerts, printer);
/// front.accept(order_id).await?;
///
/// drop(front);
/// kitchen.shutdown().await?;
/// ```
pub struct Kitchen {
    config: EngineConfig,
    store: StoreClient,
    store_handle: JoinHandle<()>,
    session_handles: Vec<JoinHandle<()>>,
}

impl Kitchen {
    /// Validates `config` and spawns the store actor. Must be called inside a Tokio
    /// runtime.
    pub fn start(config: EngineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let (actor, store) = StoreActor::new(32, config.feed.channel_capacity);
        let store_handle = tokio::spawn(actor.run());
        info!(store = %config.store.name, "Kitchen started");
        Ok(Self {
            config,
            store,
            store_handle,
            session_handles: Vec::new(),
        })
    }

    /// Client for seeding orders and for writers outside any session.
    pub fn store(&self) -> &StoreClient {
        &self.store
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Starts a session for one terminal.
    pub fn open_session(
        &mut self,
        name: impl Into<String>,
        alerts: Arc<dyn AlertSink>,
        printer: Arc<dyn TicketPrinter>,
    ) -> (SessionHandle, mpsc::UnboundedReceiver<SessionWarning>) {
        let feed = StoreFeed::new(
            self.store.clone(),
            self.config.feed.reconnect_delay,
            self.config.feed.channel_capacity,
        );
        let ports = SessionPorts {
            store: Arc::new(self.store.clone()),
            feed: Arc::new(feed),
            alerts,
            printer,
        };
        let (session, handle, warnings) = Session::new(name, &self.config, ports);
        self.session_handles.push(tokio::spawn(session.run()));
        (handle, warnings)
    }

    /// Waits for every session to end, then stops the store.
    ///
    /// Sessions end when their last [`SessionHandle`] is dropped, so drop those first.
    pub async fn shutdown(self) -> Result<(), ShutdownError> {
        info!("Shutting down kitchen...");

        for handle in self.session_handles {
            if let Err(e) = handle.await {
                error!("Session task failed: {:?}", e);
                return Err(e.into());
            }
        }

        drop(self.store);
        if let Err(e) = self.store_handle.await {
            error!("Store task failed: {:?}", e);
            return Err(e.into());
        }

        info!("Kitchen shutdown complete.");
        Ok(())
    }
}
