use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use lazy_static::lazy_static;
use once_cell::sync::OnceCell;
use tokio::runtime::Runtime;
use uuid::Uuid;
use crate::config::CoreConfig;
use crate::domains::bulk::{BulkActionCoordinator, BulkModerationService};
use crate::domains::core::ApiClient;
use crate::domains::donation::{ConfirmationHandler, DonationOrchestrator, DonationSession};
use crate::domains::fees::FeeSchedule;
use crate::domains::moderation::{AdminRepository, AutoConfirm, HttpAdminRepository, ModerationWorkflow};
use crate::domains::payment::{HostedCheckoutGateway, HttpPaymentRepository, PaymentGatewaySession, PaymentRepository};
use crate::ffi::error::{FFIError, FFIResult};

/// A donation flow shared between FFI calls
pub type SharedSession = Arc<tokio::sync::Mutex<DonationSession>>;

static RUNTIME: OnceCell<Runtime> = OnceCell::new();

// Global state definitions
lazy_static! {
    static ref INIT_LOCK: Mutex<()> = Mutex::new(());
    static ref INITIALIZED: AtomicBool = AtomicBool::new(false);

    static ref CONFIG: Mutex<Option<Arc<CoreConfig>>> = Mutex::new(None);

    // Payment
    static ref PAYMENT_GATEWAY: Mutex<Option<Arc<dyn PaymentGatewaySession>>> = Mutex::new(None);

    // Donation
    static ref DONATION_ORCHESTRATOR: Mutex<Option<Arc<DonationOrchestrator>>> = Mutex::new(None);
    static ref CONFIRMATION_HANDLER: Mutex<Option<Arc<ConfirmationHandler>>> = Mutex::new(None);
    static ref DONATION_FLOWS: Mutex<HashMap<Uuid, SharedSession>> = Mutex::new(HashMap::new());

    // Moderation
    static ref BULK_MODERATION_SERVICE: Mutex<Option<Arc<BulkModerationService>>> = Mutex::new(None);
}

fn get_service<T: ?Sized>(slot: &Mutex<Option<Arc<T>>>, name: &str) -> FFIResult<Arc<T>> {
    slot.lock()
        .map_err(|_| FFIError::internal(format!("{} lock poisoned", name)))?
        .clone()
        .ok_or_else(|| FFIError::internal(format!("{} not initialized", name)))
}

fn set_service<T: ?Sized>(slot: &Mutex<Option<Arc<T>>>, name: &str, value: Arc<T>) -> FFIResult<()> {
    *slot
        .lock()
        .map_err(|_| FFIError::internal(format!("{} lock poisoned", name)))? = Some(value);
    Ok(())
}

// --- Getter Functions ---

pub fn get_config() -> FFIResult<Arc<CoreConfig>> {
    get_service(&CONFIG, "Core config")
}
pub fn get_payment_gateway() -> FFIResult<Arc<dyn PaymentGatewaySession>> {
    get_service(&PAYMENT_GATEWAY, "Payment gateway")
}
pub fn get_donation_orchestrator() -> FFIResult<Arc<DonationOrchestrator>> {
    get_service(&DONATION_ORCHESTRATOR, "Donation orchestrator")
}
pub fn get_confirmation_handler() -> FFIResult<Arc<ConfirmationHandler>> {
    get_service(&CONFIRMATION_HANDLER, "Confirmation handler")
}
pub fn get_bulk_moderation_service() -> FFIResult<Arc<BulkModerationService>> {
    get_service(&BULK_MODERATION_SERVICE, "Bulk moderation service")
}

pub fn is_initialized() -> bool {
    INITIALIZED.load(Ordering::Acquire)
}

/// Shared runtime for every blocking FFI call. The HTTP client's connection
/// pool is tied to the runtime it first ran on, so there is exactly one.
pub fn runtime() -> FFIResult<&'static Runtime> {
    RUNTIME.get_or_try_init(|| {
        tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .thread_name("crowdfund-core")
            .build()
            .map_err(|e| FFIError::internal(format!("Failed to create Tokio runtime: {}", e)))
    })
}

// --- Donation flow registry ---

pub fn register_flow(session: DonationSession) -> FFIResult<Uuid> {
    let handle = Uuid::new_v4();
    DONATION_FLOWS
        .lock()
        .map_err(|_| FFIError::internal("Donation flow registry lock poisoned".to_string()))?
        .insert(handle, Arc::new(tokio::sync::Mutex::new(session)));
    log::debug!("Registered donation flow {}", handle);
    Ok(handle)
}

pub fn get_flow(handle: &Uuid) -> FFIResult<SharedSession> {
    DONATION_FLOWS
        .lock()
        .map_err(|_| FFIError::internal("Donation flow registry lock poisoned".to_string()))?
        .get(handle)
        .cloned()
        .ok_or_else(|| FFIError::not_found("DonationFlow", &handle.to_string()))
}

/// Drop a flow and its fee cache. Returns whether the handle was known.
pub fn remove_flow(handle: &Uuid) -> FFIResult<bool> {
    let removed = DONATION_FLOWS
        .lock()
        .map_err(|_| FFIError::internal("Donation flow registry lock poisoned".to_string()))?
        .remove(handle)
        .is_some();
    Ok(removed)
}

// --- Initialization ---

/// Wire every service from `config`. Safe to call more than once; later
/// calls are ignored.
pub fn initialize(config: CoreConfig) -> FFIResult<()> {
    let _guard = INIT_LOCK
        .lock()
        .map_err(|_| FFIError::internal("Init lock poisoned".to_string()))?;

    if INITIALIZED.load(Ordering::Acquire) {
        return Ok(());
    }

    initialize_internal(config)?;
    INITIALIZED.store(true, Ordering::Release);
    Ok(())
}

fn initialize_internal(config: CoreConfig) -> FFIResult<()> {
    // Initialize logging first
    if std::env::var("RUST_LOG").is_err() {
        #[cfg(debug_assertions)]
        std::env::set_var("RUST_LOG", "debug");
        #[cfg(not(debug_assertions))]
        std::env::set_var("RUST_LOG", "info");
    }
    let _ = env_logger::try_init();

    log::info!("Starting core initialization");
    config.validate()?;
    log::debug!("API base URL: {}", config.api_base_url);
    log::debug!("App base URL: {}", config.app_base_url);
    log::debug!(
        "Currency {} with limits [{}, {}]",
        config.currency,
        config.min_donation,
        config.max_donation
    );

    let config = Arc::new(config);
    let timeout = config.request_timeout();
    let api = ApiClient::new(&config.api_base_url, timeout)?;

    let payment_repo: Arc<dyn PaymentRepository> = Arc::new(HttpPaymentRepository::new(api.clone()));
    let gateway: Arc<dyn PaymentGatewaySession> =
        Arc::new(HostedCheckoutGateway::new(payment_repo.clone(), &config));
    let fees = Arc::new(FeeSchedule::new(
        payment_repo.clone(),
        config.limits(),
        &config.currency,
        timeout,
    ));
    let orchestrator = Arc::new(DonationOrchestrator::new(
        payment_repo,
        gateway.clone(),
        fees,
        timeout,
    ));
    let confirmation = Arc::new(ConfirmationHandler::new(gateway.clone()));

    let admin_repo: Arc<dyn AdminRepository> = Arc::new(HttpAdminRepository::new(api));
    let workflow = Arc::new(ModerationWorkflow::new(admin_repo, timeout));
    let bulk = Arc::new(BulkModerationService::new(
        workflow,
        BulkActionCoordinator::new(),
        Arc::new(AutoConfirm),
    ));

    set_service(&CONFIG, "Core config", config)?;
    set_service(&PAYMENT_GATEWAY, "Payment gateway", gateway)?;
    set_service(&DONATION_ORCHESTRATOR, "Donation orchestrator", orchestrator)?;
    set_service(&CONFIRMATION_HANDLER, "Confirmation handler", confirmation)?;
    set_service(&BULK_MODERATION_SERVICE, "Bulk moderation service", bulk)?;

    log::info!("Core initialization complete");
    Ok(())
}
