//! Business logic services

pub mod catalog;
pub mod circulation;
pub mod fees;
pub mod notifications;
pub mod overdue;
pub mod payments;
pub mod reservations;

use crate::{config::AppConfig, repository::Repository};

use fees::FeeSchedule;
use notifications::{NotificationHub, NotificationService};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub catalog: catalog::CatalogService,
    pub circulation: circulation::CirculationService,
    pub payments: payments::PaymentsService,
    pub reservations: reservations::ReservationsService,
    pub notifications: NotificationService,
}

impl Services {
    /// Create all services with the given repository. Constructed once at
    /// startup and shared by reference through `AppState`.
    pub fn new(repository: Repository, config: &AppConfig) -> Self {
        let fees = FeeSchedule::from_config(&config.circulation);
        let notifications = NotificationService::new(repository.clone(), NotificationHub::default());
        let reservations =
            reservations::ReservationsService::new(repository.clone(), notifications.clone());
        let circulation = circulation::CirculationService::new(
            repository.clone(),
            notifications.clone(),
            reservations.clone(),
            fees,
            config.circulation.loan_period_days,
        );
        let payments = payments::PaymentsService::new(repository.clone(), fees);
        let catalog = catalog::CatalogService::new(repository);

        Self {
            catalog,
            circulation,
            payments,
            reservations,
            notifications,
        }
    }
}
