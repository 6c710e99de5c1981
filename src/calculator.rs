//! # Calculator state
//! The interactive calculator as a pure reducer: `(State, Event) → State`.
//!
//! Every currency change (or retry) opens a new request id. Load results
//! carry the id they were issued for; anything that is not the in-flight
//! request is dropped, so the last *requested* currency wins even when an
//! older fetch resolves later. Issuing the actual fetch is the driver's job
//! (see `session::MeasureSession`); the reducer only records what it wants.

use serde::Serialize;

use crate::consensus::{compute_consensus_with, parse_amount, ConsensusResult, WeightingMode};
use crate::currency::Currency;
use crate::quality::{score_data_quality, DataQualityScore};
use crate::resolve::Resolution;
use crate::series::{MAX_YEAR, MIN_YEAR};

pub type RequestId = u64;

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    CurrencyChanged(Currency),
    FromYearChanged(i32),
    ToYearChanged(i32),
    AmountChanged(String),
    DataLoaded {
        request: RequestId,
        resolution: Resolution,
    },
    DataFetchFailed {
        request: RequestId,
        message: String,
    },
    RetryRequested,
}

/// Banner-level error shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserError {
    pub message: String,
    pub retryable: bool,
}

impl UserError {
    fn retryable(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            retryable: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct State {
    pub currency: Currency,
    pub from_year: i32,
    pub to_year: i32,
    /// Raw amount text as typed.
    pub amount_text: String,
    pub weighting: WeightingMode,
    pub resolution: Option<Resolution>,
    /// Request whose result the state is waiting for.
    pub in_flight: Option<RequestId>,
    /// Highest request id issued so far.
    pub last_request: RequestId,
    pub error: Option<UserError>,
}

impl State {
    /// Fresh calculator with the initial load for `currency` already requested.
    pub fn new(currency: Currency, from_year: i32, to_year: i32, amount_text: impl Into<String>) -> Self {
        Self {
            currency,
            from_year: clamp_year(from_year),
            to_year: clamp_year(to_year),
            amount_text: amount_text.into(),
            weighting: WeightingMode::default(),
            resolution: None,
            in_flight: Some(1),
            last_request: 1,
            error: None,
        }
    }

    pub fn with_weighting(mut self, mode: WeightingMode) -> Self {
        self.weighting = mode;
        self
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.is_some()
    }

    /// The fetch the driver should have running, if any.
    pub fn pending_fetch(&self) -> Option<(RequestId, Currency)> {
        self.in_flight.map(|id| (id, self.currency))
    }

    pub fn amount(&self) -> Option<f64> {
        parse_amount(&self.amount_text)
    }

    /// Consensus for the current selection; the empty sentinel while nothing
    /// usable is loaded or the amount is invalid.
    pub fn consensus(&self) -> ConsensusResult {
        match (&self.resolution, self.amount()) {
            (Some(r), Some(amount)) => compute_consensus_with(
                self.weighting,
                r.measures(),
                self.currency,
                self.from_year,
                self.to_year,
                amount,
            ),
            _ => ConsensusResult::empty(self.currency, self.from_year, self.to_year),
        }
    }

    pub fn quality(&self) -> DataQualityScore {
        self.resolution
            .as_ref()
            .map(|r| score_data_quality(r.measures()))
            .unwrap_or_default()
    }

    fn issue_request(&mut self) {
        self.last_request += 1;
        self.in_flight = Some(self.last_request);
        self.error = None;
    }

    fn accepts(&self, request: RequestId) -> bool {
        self.in_flight == Some(request)
    }
}

fn clamp_year(y: i32) -> i32 {
    y.clamp(MIN_YEAR, MAX_YEAR)
}

pub fn reduce(mut state: State, event: Event) -> State {
    match event {
        Event::CurrencyChanged(c) => {
            state.currency = c;
            state.resolution = None;
            state.issue_request();
        }
        Event::FromYearChanged(y) => state.from_year = clamp_year(y),
        Event::ToYearChanged(y) => state.to_year = clamp_year(y),
        Event::AmountChanged(text) => state.amount_text = text,
        Event::DataLoaded {
            request,
            resolution,
        } => {
            if !state.accepts(request) || resolution.currency != state.currency {
                tracing::debug!(target: "calculator", request, "discarding stale load");
                return state;
            }
            state.in_flight = None;
            state.error = resolution.is_empty().then(|| {
                UserError::retryable(format!(
                    "No inflation data could be loaded for {}. Please try again.",
                    resolution.currency
                ))
            });
            state.resolution = Some(resolution);
        }
        Event::DataFetchFailed { request, message } => {
            if !state.accepts(request) {
                tracing::debug!(target: "calculator", request, "discarding stale failure");
                return state;
            }
            tracing::warn!(target: "calculator", request, %message, "measure load failed");
            state.in_flight = None;
            state.error = Some(UserError::retryable(format!(
                "Could not load inflation data for {}. Please try again.",
                state.currency
            )));
        }
        Event::RetryRequested => state.issue_request(),
    }
    state
}
