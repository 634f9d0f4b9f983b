//! PostgreSQL repository implementations

mod booking;
mod email_template;
mod product;
mod profile;
mod reservation;
mod schedule;
mod transaction;

pub use booking::PgBookingRepository;
pub use email_template::PgEmailTemplateRepository;
pub use product::PgProductRepository;
pub use profile::PgProfileRepository;
pub use reservation::PgReservationRepository;
pub use schedule::PgScheduleRepository;
pub use transaction::PgTransactionRepository;

use crate::DbPool;

/// All repositories bundled together
#[derive(Clone)]
pub struct Repositories {
    pub products: PgProductRepository,
    pub reservations: PgReservationRepository,
    pub transactions: PgTransactionRepository,
    pub bookings: PgBookingRepository,
    pub schedule: PgScheduleRepository,
    pub profiles: PgProfileRepository,
    pub email_templates: PgEmailTemplateRepository,
}

impl Repositories {
    /// Create all repositories from a database pool
    pub fn new(pool: DbPool) -> Self {
        Self {
            products: PgProductRepository::new(pool.clone()),
            reservations: PgReservationRepository::new(pool.clone()),
            transactions: PgTransactionRepository::new(pool.clone()),
            bookings: PgBookingRepository::new(pool.clone()),
            schedule: PgScheduleRepository::new(pool.clone()),
            profiles: PgProfileRepository::new(pool.clone()),
            email_templates: PgEmailTemplateRepository::new(pool),
        }
    }
}
