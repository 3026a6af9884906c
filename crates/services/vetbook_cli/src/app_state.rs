// --- File: crates/services/vetbook_cli/src/app_state.rs ---
use std::sync::Arc;

use tracing::debug;
use vetbook_api::RestVetService;
use vetbook_common::logging::log_result;
use vetbook_common::{
    AuthService, LoginResponse, Person, RegisterRequest, StaticSession, VetbookError,
};
use vetbook_config::AppConfig;
use vetbook_reconciler::{BookingReconciler, DoctorSchedule};

/// Everything a command needs: configuration, the booking service and the
/// session credentials.
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub service: Arc<RestVetService>,
    pub session: Arc<StaticSession>,
}

impl AppState {
    /// Builds the REST client and a session from the configured credentials.
    pub fn new(config: Arc<AppConfig>) -> Result<Self, VetbookError> {
        let service = Arc::new(RestVetService::new(&config.api)?);
        let session = Arc::new(StaticSession::from_config(&config.session));
        Ok(Self {
            config,
            service,
            session,
        })
    }

    /// Exchanges email and password for a token and makes it the session.
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, VetbookError> {
        let login = log_result(
            self.service.login(email, password).await,
            "login succeeded",
            "login failed",
        )?;
        self.session.apply_login(&login);
        debug!(
            "session for {} with role {}",
            login.name.as_deref().or(login.email.as_deref()).unwrap_or(email),
            login.role.as_deref().unwrap_or("-")
        );
        Ok(login)
    }

    /// Creates a USER account. The session is left unchanged.
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<Person, VetbookError> {
        let request = RegisterRequest::new(name, email, password)?;
        log_result(
            self.service.register(request).await,
            "registration succeeded",
            "registration failed",
        )
    }

    pub fn reconciler(&self) -> BookingReconciler {
        BookingReconciler::new(
            self.service.clone(),
            self.session.clone(),
            self.config.booking.clone(),
        )
    }

    pub fn schedule(&self) -> DoctorSchedule {
        DoctorSchedule::new(
            self.service.clone(),
            self.session.clone(),
            self.config.booking.clone(),
        )
    }
}
