//! Booking service
//!
//! Orchestrates the booking workflow over the repositories, the payment
//! provider and the notifier:
//!
//! 1. [`BookingService::availability`] lists open start times
//! 2. [`BookingService::reserve_slot`] holds one for a few minutes
//! 3. [`BookingService::create_checkout`] sends the customer to Stripe
//! 4. [`BookingService::confirm_checkout`] turns the paid hold into a booking,
//!    whether triggered by the webhook or the browser callback

mod account;
mod checkout;
mod confirm;
mod reservation;

pub use account::LinkResult;
pub use checkout::CreateCheckout;
pub use confirm::{ConfirmSource, Confirmation, SessionStatus, WebhookOutcome};
pub use reservation::ReserveSlot;

use std::sync::Arc;

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use serde::Serialize;
use tracing::{debug, instrument};

use coachdesk_types::{
    weekday_index, Booking, BusinessHours, BusySlot, Product, ProductId, TimeWindow,
};

use crate::availability::{open_slots, SlotQuery};
use crate::clock::{Clock, SystemClock};
use crate::config::BookingConfig;
use crate::error::BookingError;
use crate::notify::{Mailer, Notifier};
use crate::provider::PaymentProvider;
use crate::store::Stores;
use crate::webhook::WebhookHandler;

/// How far ahead slots can be listed or held
const BOOKING_HORIZON_DAYS: i64 = 730;

/// Open start times for a product on a date
#[derive(Debug, Clone, Serialize)]
pub struct Availability {
    pub product_id: ProductId,
    pub date: NaiveDate,
    pub duration_minutes: u32,
    pub slots: Vec<NaiveTime>,
}

/// Booking service
pub struct BookingService {
    stores: Stores,
    provider: Arc<dyn PaymentProvider>,
    webhooks: WebhookHandler,
    notifier: Notifier,
    config: BookingConfig,
    clock: Arc<dyn Clock>,
}

impl BookingService {
    /// Create a new booking service
    pub fn new(
        stores: Stores,
        provider: Arc<dyn PaymentProvider>,
        mailer: Arc<dyn Mailer>,
        config: BookingConfig,
    ) -> Self {
        let webhooks = WebhookHandler::new(config.stripe.webhook_secret.clone())
            .with_tolerance(config.stripe.webhook_tolerance_secs);
        let notifier = Notifier::new(mailer, stores.email_templates.clone());
        Self {
            stores,
            provider,
            webhooks,
            notifier,
            config,
            clock: Arc::new(SystemClock),
        }
    }

    /// Replace the time source
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &BookingConfig {
        &self.config
    }

    fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Current wall-clock time at the business
    fn local_now(&self) -> NaiveDateTime {
        self.now()
            .with_timezone(&self.config.business_utc_offset)
            .naive_local()
    }

    /// A local booking start as an instant
    fn to_utc(&self, local: NaiveDateTime) -> Option<DateTime<Utc>> {
        self.config
            .business_utc_offset
            .from_local_datetime(&local)
            .single()
            .map(|dt| dt.with_timezone(&Utc))
    }

    async fn product(&self, id: ProductId) -> Result<Product, BookingError> {
        let row = self
            .stores
            .products
            .find_by_id(id.0)
            .await?
            .ok_or(BookingError::ProductNotFound)?;
        Ok(Product::try_from(row)?)
    }

    /// Product that books a calendar slot
    async fn slot_product(&self, id: ProductId) -> Result<Product, BookingError> {
        let product = self.product(id).await?;
        if !product.product_type.requires_slot() {
            return Err(BookingError::Validation(format!(
                "product type {} has no booking slot",
                product.product_type
            )));
        }
        Ok(product)
    }

    /// Requested duration, else the product's default
    fn resolve_duration(
        &self,
        product: &Product,
        requested: Option<u32>,
    ) -> Result<u32, BookingError> {
        let minutes = requested
            .or(product.duration_minutes)
            .ok_or_else(|| BookingError::Validation("duration is required".to_string()))?;
        if minutes == 0 || minutes > self.config.max_duration_minutes {
            return Err(BookingError::Validation(format!(
                "duration must be between 1 and {} minutes",
                self.config.max_duration_minutes
            )));
        }
        Ok(minutes)
    }

    /// List open start times for a product on a date
    #[instrument(skip(self))]
    pub async fn availability(
        &self,
        product_id: ProductId,
        date: NaiveDate,
        duration_minutes: Option<u32>,
    ) -> Result<Availability, BookingError> {
        let product = self.slot_product(product_id).await?;
        let duration = self.resolve_duration(&product, duration_minutes)?;
        let slots = self.open_slots_on(date, duration).await?;

        debug!(count = slots.len(), "Computed open slots");

        Ok(Availability {
            product_id,
            date,
            duration_minutes: duration,
            slots,
        })
    }

    /// Open start times on `date`, honouring business hours, confirmed
    /// bookings, busy slots and the current time
    async fn open_slots_on(
        &self,
        date: NaiveDate,
        duration_minutes: u32,
    ) -> Result<Vec<NaiveTime>, BookingError> {
        let local_now = self.local_now();
        let today = local_now.date();
        if date < today {
            return Ok(Vec::new());
        }
        let horizon = today
            .checked_add_signed(Duration::days(BOOKING_HORIZON_DAYS))
            .unwrap_or(NaiveDate::MAX);
        if date > horizon {
            return Err(BookingError::Validation(format!(
                "booking_date must be within {BOOKING_HORIZON_DAYS} days from today"
            )));
        }

        let business_hours = self
            .stores
            .schedule
            .business_hours_for(weekday_index(date.weekday()))
            .await?
            .into_iter()
            .map(BusinessHours::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        let booked = self
            .stores
            .bookings
            .find_confirmed_on(date)
            .await?
            .into_iter()
            .map(|row| Booking::try_from(row).map(|b| b.window()))
            .collect::<Result<Vec<TimeWindow>, _>>()?;

        let day_start = date.and_time(NaiveTime::MIN);
        let day_end = date
            .succ_opt()
            .map_or(NaiveDateTime::MAX, |next| next.and_time(NaiveTime::MIN));
        let busy: Vec<TimeWindow> = self
            .stores
            .schedule
            .busy_slots_between(day_start, day_end)
            .await?
            .into_iter()
            .map(|row| BusySlot::from(row).window())
            .collect();

        let not_before = (date == local_now.date()).then_some(local_now);

        Ok(open_slots(&SlotQuery {
            date,
            duration_minutes,
            slot_interval_minutes: self.config.slot_interval_minutes,
            business_hours: &business_hours,
            booked: &booked,
            busy: &busy,
            not_before,
        }))
    }
}
