//! Quotation pricing engine for InverApp.
//!
//! Pure math lives in `calculators` and `state`; `queries` and `services`
//! load stock and commissions and persist quotations; `routes` exposes it
//! all over HTTP/JSON.

pub mod calculators;
pub mod models;
pub mod queries;
pub mod requests;
pub mod responses;
pub mod routes;
pub mod services;
pub mod state;

// Re-export commonly used items
pub use calculators::{round_money, MixInput, PaymentConcept, QuoteMode};
pub use models::{Unit, UnitKind};
pub use routes::router;
pub use state::{PriceBreakdown, QuotationEdit, QuotationState};
