use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;

use quell_core::domain::reservation::{
    NewReservation, Reservation, ReservationId, ReservationUpdate,
};
use quell_core::domain::session::{CallSession, CallSid, SessionPatch};

use crate::{CallSessionStore, ReservationStore, StoreError};

/// Process-lifetime reservation book. Insertion order is preserved so
/// listing can return newest first.
#[derive(Default)]
pub struct InMemoryReservationStore {
    reservations: RwLock<Vec<Reservation>>,
}

#[async_trait::async_trait]
impl ReservationStore for InMemoryReservationStore {
    async fn create(&self, input: NewReservation) -> Result<Reservation, StoreError> {
        let reservation = Reservation::create(ReservationId::generate(), input, Utc::now());
        let mut reservations = self.reservations.write().await;
        reservations.push(reservation.clone());
        Ok(reservation)
    }

    async fn get(&self, id: &ReservationId) -> Result<Option<Reservation>, StoreError> {
        let reservations = self.reservations.read().await;
        Ok(reservations.iter().find(|entry| entry.id == *id).cloned())
    }

    async fn update(
        &self,
        id: &ReservationId,
        update: ReservationUpdate,
    ) -> Result<Option<Reservation>, StoreError> {
        let mut reservations = self.reservations.write().await;
        let Some(reservation) = reservations.iter_mut().find(|entry| entry.id == *id) else {
            return Ok(None);
        };
        reservation.apply(update, Utc::now());
        Ok(Some(reservation.clone()))
    }

    async fn list(&self) -> Result<Vec<Reservation>, StoreError> {
        let reservations = self.reservations.read().await;
        Ok(reservations.iter().rev().cloned().collect())
    }
}

/// Ephemeral per-call conversation state. The single write lock makes each
/// read-modify-write atomic per store, so same-call callbacks cannot lose
/// updates even if the host parallelises them.
#[derive(Default)]
pub struct InMemoryCallSessionStore {
    sessions: RwLock<HashMap<CallSid, CallSession>>,
}

impl InMemoryCallSessionStore {
    /// Removes sessions whose last activity is older than `ttl`. Stalled
    /// calls never receive another callback, so without sweeping their
    /// state would survive until process restart.
    pub async fn sweep_expired(&self, ttl: Duration, now: DateTime<Utc>) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, session| session.last_updated + ttl > now);
        before - sessions.len()
    }

    pub async fn active_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}

#[async_trait::async_trait]
impl CallSessionStore for InMemoryCallSessionStore {
    async fn create(
        &self,
        call_sid: CallSid,
        reservation_id: ReservationId,
        customer_phone: &str,
    ) -> Result<CallSession, StoreError> {
        let session =
            CallSession::open(call_sid.clone(), reservation_id, customer_phone, Utc::now());
        let mut sessions = self.sessions.write().await;
        sessions.insert(call_sid, session.clone());
        Ok(session)
    }

    async fn get(&self, call_sid: &CallSid) -> Result<Option<CallSession>, StoreError> {
        let sessions = self.sessions.read().await;
        Ok(sessions.get(call_sid).cloned())
    }

    async fn update(
        &self,
        call_sid: &CallSid,
        patch: SessionPatch,
    ) -> Result<Option<CallSession>, StoreError> {
        let mut sessions = self.sessions.write().await;
        let Some(session) = sessions.get_mut(call_sid) else {
            return Ok(None);
        };
        session.apply(patch, Utc::now());
        Ok(Some(session.clone()))
    }

    async fn delete(&self, call_sid: &CallSid) -> Result<(), StoreError> {
        let mut sessions = self.sessions.write().await;
        sessions.remove(call_sid);
        Ok(())
    }
}
