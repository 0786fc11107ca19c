//! # Mock Store
//!
//! Test doubles that hand out a real [`StoreClient`] whose requests are answered from
//! a script instead of a [`StoreActor`](crate::StoreActor). They make the hard cases
//! cheap to set up: lost races, missing rows and a store that never answers.
//!
//! | Need | Use |
//! |------|-----|
//! | Scripted answers, checked at the end | [`MockStore`] with `expect_*` + `verify()` |
//! | Inspect each request and answer by hand | [`create_mock_store`] + [`expect_update_status`] |
//!
//! ```rust
//! use order_store::mock::MockStore;
//! use order_store::{OrderId, UpdateOutcome};
//!
//! #[tokio::main]
//! async fn main() {
//!     let mut mock = MockStore::new();
//!     mock.expect_update_status().return_ok(UpdateOutcome::NotFound);
//!
//!     let client = mock.client();
//!     let outcome = client
//!         .update_status(OrderId::new(), vec!["pending".into()], "preparing")
//!         .await
//!         .unwrap();
//!     assert_eq!(outcome, UpdateOutcome::NotFound);
//!     mock.verify();
//! }
//! ```

use crate::client::StoreClient;
use crate::error::StoreError;
use crate::message::{Response, StoreRequest, UpdateOutcome};
use crate::record::{OrderId, OrderRecord};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

enum Expectation {
    Get {
        response: Result<Option<OrderRecord>, StoreError>,
    },
    List {
        response: Result<Vec<OrderRecord>, StoreError>,
    },
    UpdateStatus {
        response: Result<UpdateOutcome, StoreError>,
    },
    /// Accept the next update but never answer it.
    StallUpdate,
}

type Expectations = Arc<Mutex<VecDeque<Expectation>>>;

/// A scripted store. Expectations are consumed in order.
pub struct MockStore {
    client: StoreClient,
    expectations: Expectations,
    _handle: tokio::task::JoinHandle<()>,
}

impl MockStore {
    /// Must be called inside a Tokio runtime.
    pub fn new() -> Self {
        let (sender, mut receiver) = mpsc::channel::<StoreRequest>(100);
        let expectations: Expectations = Arc::new(Mutex::new(VecDeque::new()));
        let script = expectations.clone();

        let handle = tokio::spawn(async move {
            // Stalled responders stay alive so callers observe silence, not a drop.
            let mut stalled: Vec<Response<UpdateOutcome>> = Vec::new();
            while let Some(request) = receiver.recv().await {
                let next = script.lock().map(|mut exps| exps.pop_front()).ok().flatten();
                match (request, next) {
                    (StoreRequest::Get { respond_to, .. }, Some(Expectation::Get { response })) => {
                        let _ = respond_to.send(response);
                    }
                    (StoreRequest::List { respond_to, .. }, Some(Expectation::List { response })) => {
                        let _ = respond_to.send(response);
                    }
                    (
                        StoreRequest::UpdateStatus { respond_to, .. },
                        Some(Expectation::UpdateStatus { response }),
                    ) => {
                        let _ = respond_to.send(response);
                    }
                    (StoreRequest::UpdateStatus { respond_to, .. }, Some(Expectation::StallUpdate)) => {
                        stalled.push(respond_to);
                    }
                    (request, _) => {
                        panic!("Unexpected store request or expectation mismatch: {request:?}");
                    }
                }
            }
        });

        Self {
            client: StoreClient::new(sender),
            expectations,
            _handle: handle,
        }
    }

    pub fn client(&self) -> StoreClient {
        self.client.clone()
    }

    pub fn expect_get(&mut self) -> GetExpectationBuilder {
        GetExpectationBuilder {
            expectations: self.expectations.clone(),
        }
    }

    pub fn expect_list(&mut self) -> ListExpectationBuilder {
        ListExpectationBuilder {
            expectations: self.expectations.clone(),
        }
    }

    pub fn expect_update_status(&mut self) -> UpdateExpectationBuilder {
        UpdateExpectationBuilder {
            expectations: self.expectations.clone(),
        }
    }

    /// Panics if any expectation is still queued.
    pub fn verify(&self) {
        let remaining = self.expectations.lock().map(|exps| exps.len()).unwrap_or(0);
        if remaining > 0 {
            panic!("Not all expectations were met. {remaining} remaining");
        }
    }
}

impl Default for MockStore {
    fn default() -> Self {
        Self::new()
    }
}

fn push(expectations: &Expectations, expectation: Expectation) {
    if let Ok(mut exps) = expectations.lock() {
        exps.push_back(expectation);
    }
}

pub struct GetExpectationBuilder {
    expectations: Expectations,
}

impl GetExpectationBuilder {
    pub fn return_ok(self, row: Option<OrderRecord>) {
        push(&self.expectations, Expectation::Get { response: Ok(row) });
    }

    pub fn return_err(self, error: StoreError) {
        push(&self.expectations, Expectation::Get { response: Err(error) });
    }
}

pub struct ListExpectationBuilder {
    expectations: Expectations,
}

impl ListExpectationBuilder {
    pub fn return_ok(self, rows: Vec<OrderRecord>) {
        push(&self.expectations, Expectation::List { response: Ok(rows) });
    }

    pub fn return_err(self, error: StoreError) {
        push(&self.expectations, Expectation::List { response: Err(error) });
    }
}

pub struct UpdateExpectationBuilder {
    expectations: Expectations,
}

impl UpdateExpectationBuilder {
    pub fn return_ok(self, outcome: UpdateOutcome) {
        push(
            &self.expectations,
            Expectation::UpdateStatus {
                response: Ok(outcome),
            },
        );
    }

    pub fn return_err(self, error: StoreError) {
        push(
            &self.expectations,
            Expectation::UpdateStatus {
                response: Err(error),
            },
        );
    }

    /// The update is received but never answered.
    pub fn stall(self) {
        push(&self.expectations, Expectation::StallUpdate);
    }
}

/// Creates a client plus the raw request receiver, for tests that want to look at
/// each request before answering it.
pub fn create_mock_store(buffer_size: usize) -> (StoreClient, mpsc::Receiver<StoreRequest>) {
    let (sender, receiver) = mpsc::channel(buffer_size);
    (StoreClient::new(sender), receiver)
}

/// Next request, if it is a conditional update.
pub async fn expect_update_status(
    receiver: &mut mpsc::Receiver<StoreRequest>,
) -> Option<(OrderId, Vec<String>, String, Response<UpdateOutcome>)> {
    match receiver.recv().await {
        Some(StoreRequest::UpdateStatus {
            id,
            expected,
            new_status,
            respond_to,
        }) => Some((id, expected, new_status, respond_to)),
        _ => None,
    }
}

/// Next request, if it is a list query.
pub async fn expect_list(
    receiver: &mut mpsc::Receiver<StoreRequest>,
) -> Option<(Vec<String>, Response<Vec<OrderRecord>>)> {
    match receiver.recv().await {
        Some(StoreRequest::List {
            exclude_statuses,
            respond_to,
        }) => Some((exclude_statuses, respond_to)),
        _ => None,
    }
}
