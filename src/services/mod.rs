//! Services module for gym-desk
//!
//! Contains all business logic and service implementations.

pub mod attendance_service;
pub mod catalog_service;
pub mod client_service;
pub mod mailer;
pub mod membership_service;
pub mod messaging_service;
pub mod operator_service;
pub mod product_service;
pub mod reconciliation_service;
pub mod sales_service;
pub mod statistics_service;
pub mod time_provider;
pub mod timezone_service;

// Re-export commonly used services
pub use attendance_service::AttendanceService;
pub use catalog_service::CatalogService;
pub use client_service::ClientService;
pub use mailer::{Mailer, MailerError, OutgoingEmail};
pub use membership_service::MembershipService;
pub use messaging_service::MessagingService;
pub use operator_service::OperatorService;
pub use product_service::ProductService;
pub use reconciliation_service::ReconciliationService;
pub use sales_service::SalesService;
pub use statistics_service::StatisticsService;
pub use time_provider::{MockTimeProvider, SystemTimeProvider, TimeProvider};
pub use timezone_service::GymSchedule;
