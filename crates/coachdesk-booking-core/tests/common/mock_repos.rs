//! In-memory repositories for testing

#![allow(dead_code)]

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use uuid::Uuid;

use coachdesk_db::{
    BookingRepository, BookingRow, BusinessHoursRow, BusySlotRow, CalendarEventRow,
    ConfirmOutcome, ConfirmReservation, CreateReservation, CreateTransaction, DbError, DbResult,
    EmailTemplateRepository, EmailTemplateRow, ProductRepository, ProductRow, ProfileRepository,
    ProfileRow, ReservationRepository, ReservationRow, ScheduleRepository, TransactionRepository,
    TransactionRow,
};

/// Every repository over one set of in-memory tables
#[derive(Default)]
pub struct MockStore {
    products: DashMap<Uuid, ProductRow>,
    reservations: DashMap<Uuid, ReservationRow>,
    transactions: DashMap<Uuid, TransactionRow>,
    sessions: DashMap<String, Uuid>,
    bookings: DashMap<Uuid, BookingRow>,
    calendar_events: DashMap<Uuid, CalendarEventRow>,
    business_hours: DashMap<i16, Vec<BusinessHoursRow>>,
    busy_slots: DashMap<Uuid, BusySlotRow>,
    profiles: DashMap<Uuid, ProfileRow>,
    templates: DashMap<String, EmailTemplateRow>,
    /// Stands in for the database transaction around a confirmation
    confirm_lock: Mutex<()>,
}

fn time(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

impl MockStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_product(&self, name: &str, product_type: &str, duration: Option<i32>) -> ProductRow {
        let row = ProductRow {
            id: Uuid::new_v4(),
            name: name.to_string(),
            price_cents: 9900,
            product_type: product_type.to_string(),
            duration_minutes: duration,
            active: true,
        };
        self.products.insert(row.id, row.clone());
        row
    }

    /// Open every weekday from 09:00 to 17:00
    pub fn open_weekdays_nine_to_five(&self) {
        for weekday in 0..5 {
            self.add_hours(weekday, time(9, 0), time(17, 0));
        }
    }

    pub fn add_hours(&self, weekday: i16, open: NaiveTime, close: NaiveTime) {
        self.business_hours
            .entry(weekday)
            .or_default()
            .push(BusinessHoursRow {
                weekday,
                open_time: open,
                close_time: close,
                is_closed: false,
            });
    }

    pub fn add_busy_slot(&self, start: NaiveDateTime, end: NaiveDateTime) {
        let row = BusySlotRow {
            id: Uuid::new_v4(),
            start_time: start,
            end_time: end,
            title: "Away".to_string(),
            description: None,
            away_status: true,
        };
        self.busy_slots.insert(row.id, row);
    }

    pub fn add_profile(&self, id: Uuid, email: &str) {
        self.profiles.insert(
            id,
            ProfileRow {
                id,
                email: Some(email.to_string()),
                full_name: None,
            },
        );
    }

    pub fn add_template(&self, key: &str, subject: &str, html_body: &str) {
        self.templates.insert(
            key.to_string(),
            EmailTemplateRow {
                key: key.to_string(),
                subject: subject.to_string(),
                html_body: html_body.to_string(),
                updated_at: Utc::now(),
            },
        );
    }

    pub fn reservation(&self, id: Uuid) -> Option<ReservationRow> {
        self.reservations.get(&id).map(|r| r.value().clone())
    }

    pub fn reservations_on(&self, date: NaiveDate) -> Vec<ReservationRow> {
        self.reservations
            .iter()
            .filter(|r| r.booking_date == date)
            .map(|r| r.value().clone())
            .collect()
    }

    pub fn transaction_for_session(&self, session_id: &str) -> Option<TransactionRow> {
        self.sessions
            .get(session_id)
            .and_then(|id| self.transactions.get(id.value()).map(|t| t.value().clone()))
    }

    pub fn bookings(&self) -> Vec<BookingRow> {
        self.bookings.iter().map(|b| b.value().clone()).collect()
    }

    pub fn calendar_events(&self) -> Vec<CalendarEventRow> {
        self.calendar_events.iter().map(|e| e.value().clone()).collect()
    }
}

#[async_trait]
impl ProductRepository for MockStore {
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<ProductRow>> {
        Ok(self.products.get(&id).map(|r| r.value().clone()))
    }
}

#[async_trait]
impl ReservationRepository for MockStore {
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<ReservationRow>> {
        Ok(self.reservation(id))
    }

    async fn create(&self, reservation: CreateReservation) -> DbResult<ReservationRow> {
        let row = ReservationRow {
            id: reservation.id,
            product_id: reservation.product_id,
            booking_date: reservation.booking_date,
            booking_time: reservation.booking_time,
            duration_minutes: reservation.duration_minutes,
            timezone: reservation.timezone,
            status: "pending".to_string(),
            booking_token: reservation.booking_token,
            expires_at: reservation.expires_at,
            created_at: Utc::now(),
            transaction_id: None,
            confirmed_at: None,
        };
        self.reservations.insert(row.id, row.clone());
        Ok(row)
    }

    async fn cancel_pending(&self, id: Uuid) -> DbResult<bool> {
        match self.reservations.get_mut(&id) {
            Some(mut r) if r.status == "pending" => {
                r.status = "cancelled".to_string();
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[async_trait]
impl TransactionRepository for MockStore {
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<TransactionRow>> {
        Ok(self.transactions.get(&id).map(|r| r.value().clone()))
    }

    async fn find_by_session_id(&self, session_id: &str) -> DbResult<Option<TransactionRow>> {
        Ok(self.transaction_for_session(session_id))
    }

    async fn insert_if_absent(&self, transaction: CreateTransaction) -> DbResult<TransactionRow> {
        let id = match self.sessions.entry(transaction.stripe_session_id.clone()) {
            Entry::Occupied(existing) => *existing.get(),
            Entry::Vacant(slot) => {
                let now = Utc::now();
                let row = TransactionRow {
                    id: transaction.id,
                    stripe_session_id: transaction.stripe_session_id,
                    customer_email: transaction.customer_email,
                    product_id: transaction.product_id,
                    amount_cents: transaction.amount_cents,
                    currency: transaction.currency,
                    status: "pending".to_string(),
                    user_id: transaction.user_id,
                    booking_token: transaction.booking_token,
                    booking_timestamp: transaction.booking_timestamp,
                    created_at: now,
                    updated_at: now,
                };
                self.transactions.insert(row.id, row);
                *slot.insert(transaction.id)
            }
        };
        self.transactions
            .get(&id)
            .map(|r| r.value().clone())
            .ok_or(DbError::NotFound)
    }

    async fn mark_completed(&self, id: Uuid) -> DbResult<bool> {
        match self.transactions.get_mut(&id) {
            Some(mut t) if t.status != "completed" => {
                t.status = "completed".to_string();
                t.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn link_user(&self, booking_token: &str, user_id: Uuid) -> DbResult<u64> {
        let mut updated = 0;
        for mut t in self.transactions.iter_mut() {
            if t.booking_token.as_deref() == Some(booking_token) && t.user_id.is_none() {
                t.user_id = Some(user_id);
                updated += 1;
            }
        }
        Ok(updated)
    }
}

#[async_trait]
impl BookingRepository for MockStore {
    async fn find_by_transaction_id(&self, transaction_id: Uuid) -> DbResult<Option<BookingRow>> {
        Ok(self
            .bookings
            .iter()
            .find(|b| b.transaction_id == transaction_id)
            .map(|b| b.value().clone()))
    }

    async fn find_confirmed_on(&self, date: NaiveDate) -> DbResult<Vec<BookingRow>> {
        let mut rows: Vec<BookingRow> = self
            .bookings
            .iter()
            .filter(|b| b.booking_date == date && b.status == "confirmed")
            .map(|b| b.value().clone())
            .collect();
        rows.sort_by_key(|b| b.booking_time);
        Ok(rows)
    }

    async fn find_by_user_id(&self, user_id: Uuid, limit: i64) -> DbResult<Vec<BookingRow>> {
        let mut rows: Vec<BookingRow> = self
            .bookings
            .iter()
            .filter(|b| b.user_id == Some(user_id))
            .map(|b| b.value().clone())
            .collect();
        rows.sort_by(|a, b| (b.booking_date, b.booking_time).cmp(&(a.booking_date, a.booking_time)));
        rows.truncate(usize::try_from(limit).unwrap_or(0));
        Ok(rows)
    }

    async fn link_user(&self, booking_token: &str, user_id: Uuid) -> DbResult<u64> {
        let mut updated = 0;
        for mut b in self.bookings.iter_mut() {
            if b.booking_token == booking_token && b.user_id.is_none() {
                b.user_id = Some(user_id);
                updated += 1;
            }
        }
        Ok(updated)
    }

    async fn confirm_reservation(&self, input: ConfirmReservation) -> DbResult<ConfirmOutcome> {
        let _guard = self.confirm_lock.lock().unwrap();

        if !self.transactions.contains_key(&input.transaction_id) {
            return Err(DbError::NotFound);
        }

        if let Some(booking) = self
            .bookings
            .iter()
            .find(|b| b.transaction_id == input.transaction_id)
            .map(|b| b.value().clone())
        {
            self.mark_transaction_completed(input.transaction_id);
            return Ok(ConfirmOutcome::AlreadyConfirmed { booking });
        }

        let mut reservation = self
            .reservation(input.reservation_id)
            .ok_or(DbError::NotFound)?;
        if reservation.product_id != input.product_id {
            return Err(DbError::Conflict(format!(
                "reservation {} belongs to another product",
                reservation.id
            )));
        }
        if reservation.status != "pending" {
            return Err(DbError::Conflict(format!(
                "reservation {} is {}",
                reservation.id, reservation.status
            )));
        }

        // Nothing is written until every check has passed
        let now = Utc::now();
        reservation.status = "confirmed".to_string();
        reservation.transaction_id = Some(input.transaction_id);
        reservation.confirmed_at = Some(now);

        let booking = BookingRow {
            id: Uuid::new_v4(),
            product_id: reservation.product_id,
            user_id: input.user_id,
            customer_email: input.customer_email,
            booking_date: reservation.booking_date,
            booking_time: reservation.booking_time,
            duration_minutes: reservation.duration_minutes,
            timezone: reservation.timezone.clone(),
            status: "confirmed".to_string(),
            transaction_id: input.transaction_id,
            reservation_id: reservation.id,
            booking_token: reservation.booking_token.clone(),
            created_at: now,
        };

        let calendar_event = input.calendar_title.map(|title| {
            let start = booking.booking_date.and_time(booking.booking_time);
            CalendarEventRow {
                id: Uuid::new_v4(),
                booking_id: booking.id,
                title,
                start_time: start,
                end_time: start + Duration::minutes(i64::from(booking.duration_minutes)),
                created_at: now,
            }
        });

        self.mark_transaction_completed(input.transaction_id);
        self.reservations.insert(reservation.id, reservation.clone());
        self.bookings.insert(booking.id, booking.clone());
        if let Some(event) = &calendar_event {
            self.calendar_events.insert(event.id, event.clone());
        }

        Ok(ConfirmOutcome::Created {
            booking,
            reservation,
            calendar_event,
        })
    }
}

impl MockStore {
    fn mark_transaction_completed(&self, id: Uuid) {
        if let Some(mut t) = self.transactions.get_mut(&id) {
            t.status = "completed".to_string();
            t.updated_at = Utc::now();
        }
    }
}

#[async_trait]
impl ScheduleRepository for MockStore {
    async fn business_hours_for(&self, weekday: i16) -> DbResult<Vec<BusinessHoursRow>> {
        Ok(self
            .business_hours
            .get(&weekday)
            .map(|rows| rows.value().clone())
            .unwrap_or_default())
    }

    async fn busy_slots_between(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> DbResult<Vec<BusySlotRow>> {
        Ok(self
            .busy_slots
            .iter()
            .filter(|s| s.start_time < end && start < s.end_time)
            .map(|s| s.value().clone())
            .collect())
    }
}

#[async_trait]
impl ProfileRepository for MockStore {
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<ProfileRow>> {
        Ok(self.profiles.get(&id).map(|p| p.value().clone()))
    }
}

#[async_trait]
impl EmailTemplateRepository for MockStore {
    async fn find_by_key(&self, key: &str) -> DbResult<Option<EmailTemplateRow>> {
        Ok(self.templates.get(key).map(|t| t.value().clone()))
    }
}
