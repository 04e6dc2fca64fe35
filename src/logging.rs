//! Logging configuration for gym-desk
//!
//! Structured logging setup with appropriate levels and formatting.

use rust_decimal::Decimal;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize the application logging system.
///
/// `RUST_LOG` wins over `log_level`. Production emits JSON lines, development a compact
/// console format. Calling this twice is harmless (the second call is ignored).
pub fn init_logging(log_level: &str, json: bool) {
    let default_filter = format!(
        "gym_desk={level},tower_http={level},axum::rejection=trace,sqlx=warn",
        level = log_level
    );

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let json_layer = json.then(|| {
        fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
    });

    let console_layer = (!json).then(|| {
        fmt::layer()
            .with_target(false)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .compact()
            .with_ansi(true)
    });

    let initialized = tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(console_layer)
        .try_init()
        .is_ok();

    if initialized {
        tracing::info!("Logging system initialized");
    }
}

/// Create a span for request logging
#[macro_export]
macro_rules! request_span {
    ($method:expr, $path:expr) => {
        tracing::info_span!(
            "http_request",
            method = %$method,
            path = %$path,
            status_code = tracing::field::Empty,
            duration_ms = tracing::field::Empty,
        )
    };
}

/// Create a span around a register closing
#[macro_export]
macro_rules! closing_span {
    ($operator_id:expr) => {
        tracing::info_span!(
            "cash_closing",
            operator_id = %$operator_id,
            period_start = tracing::field::Empty,
            closing_id = tracing::field::Empty,
        )
    };
}

/// Log application startup
pub fn log_startup() {
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        git_commit = option_env!("GIT_COMMIT").unwrap_or("unknown"),
        "gym-desk starting up"
    );
}

/// Log database operation
pub fn log_database_operation(operation: &str, table: &str, rows_affected: Option<u64>) {
    tracing::debug!(
        operation = %operation,
        table = %table,
        rows_affected = ?rows_affected,
        "Database operation completed"
    );
}

/// Log a completed point-of-sale sale
pub fn log_sale_completed(sale_id: i64, total: Decimal, payment_method: &str, lines: usize) {
    tracing::info!(
        sale_id,
        total = %format!("{:.2}", total),
        payment_method = %payment_method,
        lines,
        "Sale completed"
    );
}

/// Log a recorded membership payment
pub fn log_membership_payment(membership_id: i64, client_id: i64, service: &str, total: Decimal) {
    tracing::info!(
        membership_id,
        client_id,
        service = %service,
        total = %format!("{:.2}", total),
        "Membership payment recorded"
    );
}

/// Log a check-in attempt and its outcome
pub fn log_check_in(entry: &str, accepted: bool, reason: &str) {
    if accepted {
        tracing::info!(entry = %entry, "Client checked in");
    } else {
        tracing::warn!(entry = %entry, reason = %reason, "Check-in refused");
    }
}

/// Log a register closing. Exact closings are info, anything else is a warning.
pub fn log_closing(closing_id: i64, expected: Decimal, counted: Decimal, variance: Decimal) {
    if variance.is_zero() {
        tracing::info!(
            closing_id,
            expected = %format!("{:.2}", expected),
            counted = %format!("{:.2}", counted),
            "Register closed with exact cash"
        );
    } else {
        tracing::warn!(
            closing_id,
            expected = %format!("{:.2}", expected),
            counted = %format!("{:.2}", counted),
            variance = %format!("{:.2}", variance),
            "Register closed with a cash difference"
        );
    }
}

/// Log mail delivery
pub fn log_mail_delivery(recipient: &str, subject: &str, success: bool) {
    if success {
        tracing::info!(recipient = %recipient, subject = %subject, "Mail delivered");
    } else {
        tracing::warn!(recipient = %recipient, subject = %subject, "Mail delivery failed");
    }
}

/// Log a bulk message dispatch
pub fn log_bulk_dispatch(filter: &str, recipients: usize, sent: usize) {
    tracing::info!(filter = %filter, recipients, sent, "Bulk message dispatched");
}

/// Log error with context
pub fn log_error(error: &str, context: &str) {
    tracing::error!(error = %error, context = %context, "Application error occurred");
}

/// Log warning with context
pub fn log_warning(warning: &str, context: &str) {
    tracing::warn!(warning = %warning, context = %context, "Application warning");
}
