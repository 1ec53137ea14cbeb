use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reservation {
    pub id: String,
    pub property_id: String,
    pub guest_id: String,
    pub host_id: String,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub guests: GuestCounts,
    pub status: ReservationStatus,
    pub special_requests: Option<String>,
    pub pricing: PricingSnapshot,
    pub payment: Option<PaymentRecord>,
    pub cancellation: Option<CancellationRecord>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GuestCounts {
    pub adults: i32,
    pub children: i32,
    pub infants: i32,
}

impl GuestCounts {
    pub fn total(&self) -> i32 {
        self.adults + self.children + self.infants
    }
}

/// Fee breakdown computed once at admission. Amounts are whole rupees;
/// the snapshot is the quote the guest agreed to and is never recomputed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingSnapshot {
    pub base_price: i64,
    pub nights: i64,
    pub subtotal: i64,
    pub cleaning_fee: i64,
    pub service_fee: i64,
    pub taxes: i64,
    pub total: i64,
    pub currency: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub order_id: String,
    pub status: PaymentStatus,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Created,
    Paid,
    Failed,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Created => "created",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "created" => Some(PaymentStatus::Created),
            "paid" => Some(PaymentStatus::Paid),
            "failed" => Some(PaymentStatus::Failed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancellationRecord {
    pub cancelled_by: String,
    pub cancelled_at: NaiveDateTime,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReservationStatus {
    Pending,
    Confirmed,
    CancelledByGuest,
    CancelledByHost,
    Completed,
    NoShow,
    PaymentFailed,
}

impl ReservationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReservationStatus::Pending => "pending",
            ReservationStatus::Confirmed => "confirmed",
            ReservationStatus::CancelledByGuest => "cancelled_by_guest",
            ReservationStatus::CancelledByHost => "cancelled_by_host",
            ReservationStatus::Completed => "completed",
            ReservationStatus::NoShow => "no_show",
            ReservationStatus::PaymentFailed => "payment_failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(ReservationStatus::Pending),
            "confirmed" => Some(ReservationStatus::Confirmed),
            "cancelled_by_guest" => Some(ReservationStatus::CancelledByGuest),
            "cancelled_by_host" => Some(ReservationStatus::CancelledByHost),
            "completed" => Some(ReservationStatus::Completed),
            "no_show" => Some(ReservationStatus::NoShow),
            "payment_failed" => Some(ReservationStatus::PaymentFailed),
            _ => None,
        }
    }

    /// The guest/host-facing transition table. Payment settlement moves
    /// pending reservations to confirmed or payment_failed through its own
    /// path and is not expressible here.
    pub fn can_transition_to(self, next: ReservationStatus) -> bool {
        use ReservationStatus::*;
        matches!(
            (self, next),
            (Pending, Confirmed | CancelledByHost | CancelledByGuest)
                | (Confirmed, Completed | CancelledByHost | CancelledByGuest | NoShow)
        )
    }

    pub fn is_terminal(self) -> bool {
        use ReservationStatus::*;
        matches!(
            self,
            CancelledByGuest | CancelledByHost | Completed | NoShow | PaymentFailed
        )
    }

    pub fn is_cancellation(self) -> bool {
        matches!(
            self,
            ReservationStatus::CancelledByGuest | ReservationStatus::CancelledByHost
        )
    }

    pub const ALL: [ReservationStatus; 7] = [
        ReservationStatus::Pending,
        ReservationStatus::Confirmed,
        ReservationStatus::CancelledByGuest,
        ReservationStatus::CancelledByHost,
        ReservationStatus::Completed,
        ReservationStatus::NoShow,
        ReservationStatus::PaymentFailed,
    ];
}

impl std::fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
