//! In-process publish/subscribe event bus.
//!
//! Publishers hand an [`Event`] to the bus; the bus delivers it
//! synchronously to every handler subscribed to that event type, in
//! registration order. A failing handler does not abort delivery to later
//! handlers. Only the subscription table is serialized; handlers run under
//! the publisher's control flow.

pub mod bus;
pub mod types;

pub use bus::{EventBus, EventHandler, HandlerError, SubscriptionId};
pub use types::{
    BalanceUpdateEvent, Event, TransactionStatusEvent, ValidationEvent, ACCOUNT_BALANCE_UPDATED,
    TRANSACTION_CREATED, TRANSACTION_FAILED, TRANSACTION_PENDING, TRANSACTION_POSTED,
    TRANSACTION_VALIDATED, TRANSACTION_VOIDED,
};
