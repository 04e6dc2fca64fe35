//! gym-desk: front-desk and back-office service for a small gym
//!
//! Clients, memberships, door check-in, point of sale, register reconciliation,
//! dashboard statistics and bulk email, served as a JSON API over SQLite.

pub mod api;
pub mod config;
pub mod database;
pub mod error;
pub mod logging;
pub mod models;
pub mod services;

use std::sync::Arc;

use crate::config::Config;
use crate::database::DatabaseManager;
use crate::services::{
    AttendanceService, CatalogService, ClientService, GymSchedule, Mailer, MembershipService,
    MessagingService, OperatorService, ProductService, ReconciliationService, SalesService,
    StatisticsService, TimeProvider,
};

pub use crate::api::build_router;
pub use crate::error::{AppError, AppResult};

/// Shared application state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub database: DatabaseManager,
    pub operators: OperatorService,
    pub clients: ClientService,
    pub catalog: CatalogService,
    pub memberships: MembershipService,
    pub attendance: AttendanceService,
    pub products: ProductService,
    pub sales: SalesService,
    pub reconciliation: Arc<ReconciliationService>,
    pub statistics: StatisticsService,
    pub messaging: MessagingService,
}

impl AppState {
    pub fn new(
        config: Config,
        database: DatabaseManager,
        time_provider: Arc<dyn TimeProvider>,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        let pool = database.pool.clone();
        let timezone = config.gym_timezone();
        let schedule = GymSchedule::new(timezone, config.opening_time, config.closing_time);

        Self {
            operators: OperatorService::new(pool.clone(), time_provider.clone()),
            clients: ClientService::new(pool.clone(), time_provider.clone()),
            catalog: CatalogService::new(pool.clone()),
            memberships: MembershipService::new(
                pool.clone(),
                time_provider.clone(),
                mailer.clone(),
                timezone,
            ),
            attendance: AttendanceService::new(pool.clone(), time_provider.clone(), schedule.clone()),
            products: ProductService::new(pool.clone()),
            sales: SalesService::new(pool.clone(), time_provider.clone()),
            reconciliation: Arc::new(ReconciliationService::new(
                pool.clone(),
                time_provider.clone(),
                config.starting_float,
                config.fallback_period_start,
            )),
            statistics: StatisticsService::new(pool.clone(), time_provider.clone(), schedule),
            messaging: MessagingService::new(pool, time_provider.clone(), mailer),
            config: Arc::new(config),
            database,
        }
    }
}
