pub mod memory;

pub use memory::{InMemoryCallSessionStore, InMemoryReservationStore};

use async_trait::async_trait;
use thiserror::Error;

use quell_core::domain::reservation::{
    NewReservation, Reservation, ReservationId, ReservationUpdate,
};
use quell_core::domain::session::{CallSession, CallSid, SessionPatch};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store backend failure: {0}")]
    Backend(String),
}

#[async_trait]
pub trait ReservationStore: Send + Sync {
    async fn create(&self, input: NewReservation) -> Result<Reservation, StoreError>;
    async fn get(&self, id: &ReservationId) -> Result<Option<Reservation>, StoreError>;
    /// Merges the update over an existing reservation; absent id is a no-op
    /// returning `None`.
    async fn update(
        &self,
        id: &ReservationId,
        update: ReservationUpdate,
    ) -> Result<Option<Reservation>, StoreError>;
    /// Newest first.
    async fn list(&self) -> Result<Vec<Reservation>, StoreError>;
}

#[async_trait]
pub trait CallSessionStore: Send + Sync {
    /// Registers a fresh session in the `intro` state. The call sid may be
    /// known before the first callback arrives, so creation is explicit.
    async fn create(
        &self,
        call_sid: CallSid,
        reservation_id: ReservationId,
        customer_phone: &str,
    ) -> Result<CallSession, StoreError>;
    async fn get(&self, call_sid: &CallSid) -> Result<Option<CallSession>, StoreError>;
    /// Merges collected fields and refreshes `last_updated`. Never creates:
    /// updating an unknown call sid returns `None`.
    async fn update(
        &self,
        call_sid: &CallSid,
        patch: SessionPatch,
    ) -> Result<Option<CallSession>, StoreError>;
    async fn delete(&self, call_sid: &CallSid) -> Result<(), StoreError>;
}
