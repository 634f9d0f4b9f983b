//! Repository handles used by the booking service

use std::sync::Arc;

use coachdesk_db::{
    BookingRepository, EmailTemplateRepository, ProductRepository, ProfileRepository,
    Repositories, ReservationRepository, ScheduleRepository, TransactionRepository,
};

/// Trait-object repositories, so the service runs against Postgres or an
/// in-memory store alike
#[derive(Clone)]
pub struct Stores {
    pub products: Arc<dyn ProductRepository>,
    pub reservations: Arc<dyn ReservationRepository>,
    pub transactions: Arc<dyn TransactionRepository>,
    pub bookings: Arc<dyn BookingRepository>,
    pub schedule: Arc<dyn ScheduleRepository>,
    pub profiles: Arc<dyn ProfileRepository>,
    pub email_templates: Arc<dyn EmailTemplateRepository>,
}

impl Stores {
    /// Use one value for every repository
    pub fn shared<R>(repo: Arc<R>) -> Self
    where
        R: ProductRepository
            + ReservationRepository
            + TransactionRepository
            + BookingRepository
            + ScheduleRepository
            + ProfileRepository
            + EmailTemplateRepository
            + 'static,
    {
        Self {
            products: repo.clone(),
            reservations: repo.clone(),
            transactions: repo.clone(),
            bookings: repo.clone(),
            schedule: repo.clone(),
            profiles: repo.clone(),
            email_templates: repo,
        }
    }
}

impl From<Repositories> for Stores {
    fn from(repos: Repositories) -> Self {
        Self {
            products: Arc::new(repos.products),
            reservations: Arc::new(repos.reservations),
            transactions: Arc::new(repos.transactions),
            bookings: Arc::new(repos.bookings),
            schedule: Arc::new(repos.schedule),
            profiles: Arc::new(repos.profiles),
            email_templates: Arc::new(repos.email_templates),
        }
    }
}
