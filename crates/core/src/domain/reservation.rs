use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReservationId(pub String);

impl ReservationId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReservationSource {
    Web,
    PhoneCall,
}

impl ReservationSource {
    /// Web bookings are taken as firm; phone bookings stay pending until the
    /// caller confirms during the call.
    pub fn default_status(self) -> ReservationStatus {
        match self {
            Self::Web => ReservationStatus::Confirmed,
            Self::PhoneCall => ReservationStatus::Pending,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReservationStatus {
    Pending,
    Confirmed,
    Cancelled,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reservation {
    pub id: ReservationId,
    pub name: Option<String>,
    pub phone: String,
    pub email: Option<String>,
    pub party_size: Option<u32>,
    pub dining_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub source: ReservationSource,
    pub status: ReservationStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewReservation {
    pub name: Option<String>,
    pub phone: String,
    pub email: Option<String>,
    pub party_size: Option<u32>,
    pub dining_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub source: ReservationSource,
    pub status: Option<ReservationStatus>,
}

impl NewReservation {
    pub fn for_phone(phone: impl Into<String>) -> Self {
        Self {
            name: None,
            phone: phone.into(),
            email: None,
            party_size: None,
            dining_at: None,
            notes: None,
            source: ReservationSource::PhoneCall,
            status: None,
        }
    }
}

/// Partial update applied by the store. Outer `Option` distinguishes "leave
/// untouched" from "set", the inner one carries the new (possibly absent)
/// value. `id`, `phone`, `source` and `created_at` are not updatable here.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReservationUpdate {
    pub name: Option<Option<String>>,
    pub email: Option<Option<String>>,
    pub party_size: Option<Option<u32>>,
    pub dining_at: Option<Option<DateTime<Utc>>>,
    pub notes: Option<Option<String>>,
    pub status: Option<ReservationStatus>,
}

impl Reservation {
    pub fn create(id: ReservationId, input: NewReservation, now: DateTime<Utc>) -> Self {
        let status = input.status.unwrap_or_else(|| input.source.default_status());
        Self {
            id,
            name: trim_to_option(input.name),
            phone: normalize_phone(&input.phone),
            email: trim_to_option(input.email),
            party_size: input.party_size,
            dining_at: input.dining_at,
            notes: trim_to_option(input.notes),
            source: input.source,
            status,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn apply(&mut self, update: ReservationUpdate, now: DateTime<Utc>) {
        if let Some(name) = update.name {
            self.name = trim_to_option(name);
        }
        if let Some(email) = update.email {
            self.email = trim_to_option(email);
        }
        if let Some(party_size) = update.party_size {
            self.party_size = party_size;
        }
        if let Some(dining_at) = update.dining_at {
            self.dining_at = dining_at;
        }
        if let Some(notes) = update.notes {
            self.notes = trim_to_option(notes);
        }
        if let Some(status) = update.status {
            self.status = status;
        }
        self.updated_at = now;
    }
}

/// Keeps digits and a single leading `+`; every other character is dropped.
pub fn normalize_phone(raw: &str) -> String {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    if raw.trim_start().starts_with('+') {
        format!("+{digits}")
    } else {
        digits
    }
}

fn trim_to_option(value: Option<String>) -> Option<String> {
    value.and_then(|raw| {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::{
        normalize_phone, NewReservation, Reservation, ReservationId, ReservationSource,
        ReservationStatus, ReservationUpdate,
    };

    fn phone_reservation() -> Reservation {
        Reservation::create(
            ReservationId("R-1".to_string()),
            NewReservation::for_phone("+43 660 123 4567"),
            Utc::now(),
        )
    }

    #[test]
    fn phone_source_defaults_to_pending() {
        let reservation = phone_reservation();
        assert_eq!(reservation.status, ReservationStatus::Pending);
    }

    #[test]
    fn web_source_defaults_to_confirmed() {
        let reservation = Reservation::create(
            ReservationId("R-2".to_string()),
            NewReservation {
                source: ReservationSource::Web,
                ..NewReservation::for_phone("0660 765 4321")
            },
            Utc::now(),
        );
        assert_eq!(reservation.status, ReservationStatus::Confirmed);
    }

    #[test]
    fn explicit_status_wins_over_source_default() {
        let reservation = Reservation::create(
            ReservationId("R-3".to_string()),
            NewReservation {
                status: Some(ReservationStatus::Cancelled),
                ..NewReservation::for_phone("0660 765 4321")
            },
            Utc::now(),
        );
        assert_eq!(reservation.status, ReservationStatus::Cancelled);
    }

    #[test]
    fn phone_is_normalized_to_digits_and_leading_plus() {
        assert_eq!(normalize_phone("+43 (660) 123-4567"), "+436601234567");
        assert_eq!(normalize_phone("0660 / 123 45 67"), "06601234567");
    }

    #[test]
    fn create_trims_optional_text_fields() {
        let reservation = Reservation::create(
            ReservationId("R-4".to_string()),
            NewReservation {
                name: Some("  Lena Hofbauer  ".to_string()),
                email: Some("   ".to_string()),
                notes: Some(" window table ".to_string()),
                ..NewReservation::for_phone("06601234567")
            },
            Utc::now(),
        );

        assert_eq!(reservation.name.as_deref(), Some("Lena Hofbauer"));
        assert_eq!(reservation.email, None);
        assert_eq!(reservation.notes.as_deref(), Some("window table"));
    }

    #[test]
    fn update_merges_provided_fields_and_clears_notes() {
        let mut reservation = phone_reservation();
        let later = Utc::now();

        reservation.apply(
            ReservationUpdate {
                name: Some(Some("Lena Hofbauer".to_string())),
                party_size: Some(Some(2)),
                notes: Some(None),
                status: Some(ReservationStatus::Confirmed),
                ..ReservationUpdate::default()
            },
            later,
        );

        assert_eq!(reservation.name.as_deref(), Some("Lena Hofbauer"));
        assert_eq!(reservation.party_size, Some(2));
        assert_eq!(reservation.notes, None);
        assert_eq!(reservation.status, ReservationStatus::Confirmed);
        assert_eq!(reservation.updated_at, later);
    }

    #[test]
    fn update_leaves_untouched_fields_alone() {
        let mut reservation = phone_reservation();
        let original_phone = reservation.phone.clone();

        reservation.apply(ReservationUpdate::default(), Utc::now());

        assert_eq!(reservation.phone, original_phone);
        assert_eq!(reservation.status, ReservationStatus::Pending);
    }
}
