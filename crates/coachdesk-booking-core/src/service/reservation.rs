//! Slot holds

use chrono::{Duration, NaiveDate, NaiveTime};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use coachdesk_db::CreateReservation;
use coachdesk_types::{BookingToken, ProductId, Reservation, ReservationId, ReservationStatus};

use super::BookingService;
use crate::error::BookingError;

/// Reserve slot request
#[derive(Debug, Clone)]
pub struct ReserveSlot {
    pub product_id: ProductId,
    pub booking_date: NaiveDate,
    pub booking_time: NaiveTime,
    /// Defaults to the product's duration
    pub duration_minutes: Option<u32>,
    /// Customer's IANA timezone, for display
    pub timezone: Option<String>,
}

impl BookingService {
    /// Hold an open slot for `hold_minutes`.
    ///
    /// Holds are not exclusive: two customers may hold the same slot, and
    /// only confirmed bookings remove it from availability.
    #[instrument(skip(self, request), fields(product_id = %request.product_id))]
    pub async fn reserve_slot(&self, request: ReserveSlot) -> Result<Reservation, BookingError> {
        let product = self.slot_product(request.product_id).await?;
        let duration = self.resolve_duration(&product, request.duration_minutes)?;

        let slots = self.open_slots_on(request.booking_date, duration).await?;
        if !slots.contains(&request.booking_time) {
            info!(
                date = %request.booking_date,
                time = %request.booking_time,
                "Requested slot is not open"
            );
            return Err(BookingError::SlotUnavailable);
        }

        let expires_at = self.now() + Duration::minutes(self.config.hold_minutes);
        let row = self
            .stores
            .reservations
            .create(CreateReservation {
                id: Uuid::new_v4(),
                product_id: product.id.0,
                booking_date: request.booking_date,
                booking_time: request.booking_time,
                duration_minutes: i32::try_from(duration)
                    .map_err(|_| BookingError::Validation("duration is too large".to_string()))?,
                timezone: request.timezone.filter(|tz| !tz.trim().is_empty()),
                booking_token: BookingToken::generate().0,
                expires_at,
            })
            .await?;

        let reservation = Reservation::try_from(row)?;
        metrics::counter!("booking_reservations_created_total").increment(1);
        info!(
            reservation_id = %reservation.id,
            date = %reservation.booking_date,
            time = %reservation.booking_time,
            expires_at = %reservation.expires_at,
            "Slot reserved"
        );
        Ok(reservation)
    }

    /// Reservation with its effective status
    #[instrument(skip(self))]
    pub async fn get_reservation(&self, id: ReservationId) -> Result<Reservation, BookingError> {
        let mut reservation = self.find_reservation(id).await?;
        reservation.status = reservation.effective_status(self.now());
        Ok(reservation)
    }

    /// Give a pending hold back. Releasing a cancelled hold is a no-op.
    #[instrument(skip(self))]
    pub async fn release_reservation(
        &self,
        id: ReservationId,
    ) -> Result<Reservation, BookingError> {
        let mut reservation = self.find_reservation(id).await?;

        match reservation.status {
            ReservationStatus::Cancelled => return Ok(reservation),
            ReservationStatus::Pending => {}
            other => return Err(BookingError::ReservationNotPending(other)),
        }

        if !self.stores.reservations.cancel_pending(id.0).await? {
            // Confirmed or released concurrently
            let current = self.find_reservation(id).await?;
            warn!(status = %current.status, "Reservation changed before release");
            return match current.status {
                ReservationStatus::Cancelled => Ok(current),
                other => Err(BookingError::ReservationNotPending(other)),
            };
        }

        metrics::counter!("booking_reservations_released_total").increment(1);
        info!(reservation_id = %id, "Reservation released");
        reservation.status = ReservationStatus::Cancelled;
        Ok(reservation)
    }

    pub(super) async fn find_reservation(
        &self,
        id: ReservationId,
    ) -> Result<Reservation, BookingError> {
        let row = self
            .stores
            .reservations
            .find_by_id(id.0)
            .await?
            .ok_or(BookingError::ReservationNotFound)?;
        Ok(Reservation::try_from(row)?)
    }
}
