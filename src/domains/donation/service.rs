use std::sync::Arc;
use std::time::Duration;
use chrono::Utc;
use log::{info, warn};
use rust_decimal::Decimal;
use crate::auth::AuthContext;
use crate::domains::campaign::Campaign;
use crate::domains::core::with_timeout;
use crate::domains::donation::flow::{DonationFlow, DonorDetails, FlowOutcome, FlowState};
use crate::domains::donation::types::TransferInstructions;
use crate::domains::fees::{FeeBreakdown, FeeSchedule, FeeTracker};
use crate::domains::payment::gateway::PaymentGatewaySession;
use crate::domains::payment::repository::PaymentRepository;
use crate::domains::payment::types::{DonationRequest, PaymentConfig, PaymentMethod};
use crate::errors::ServiceResult;
use crate::types::Permission;

/// Starts donation flows and wires them to fees and payment
pub struct DonationOrchestrator {
    payments: Arc<dyn PaymentRepository>,
    gateway: Arc<dyn PaymentGatewaySession>,
    fees: Arc<FeeSchedule>,
    timeout: Duration,
}

impl DonationOrchestrator {
    pub fn new(
        payments: Arc<dyn PaymentRepository>,
        gateway: Arc<dyn PaymentGatewaySession>,
        fees: Arc<FeeSchedule>,
        timeout: Duration,
    ) -> Self {
        Self {
            payments,
            gateway,
            fees,
            timeout,
        }
    }

    /// Open a flow for `campaign`. The payment configuration is fetched once
    /// here and kept for the lifetime of the flow.
    pub async fn start_flow(&self, campaign: &Campaign, auth: &AuthContext) -> ServiceResult<DonationSession> {
        auth.authorize(Permission::MakeDonation)?;
        campaign.ensure_accepting_donations(Utc::now())?;

        let config = with_timeout(self.timeout, "Payment configuration", self.payments.get_config()).await?;
        info!(
            "Donation flow started for campaign {} with methods {:?}",
            campaign.id,
            config.enabled_methods()
        );

        Ok(DonationSession {
            flow: DonationFlow::new(&campaign.id, self.fees.currency(), *self.fees.limits()),
            campaign: campaign.clone(),
            config,
            fees: Arc::new(FeeTracker::new(self.fees.clone())),
            payments: self.payments.clone(),
            gateway: self.gateway.clone(),
            timeout: self.timeout,
        })
    }
}

/// One donor's flow together with everything scoped to it: the campaign
/// it was opened for, the cached payment configuration and its own fee cache.
pub struct DonationSession {
    flow: DonationFlow,
    campaign: Campaign,
    config: PaymentConfig,
    fees: Arc<FeeTracker>,
    payments: Arc<dyn PaymentRepository>,
    gateway: Arc<dyn PaymentGatewaySession>,
    timeout: Duration,
}

impl DonationSession {
    pub fn flow(&self) -> &DonationFlow {
        &self.flow
    }

    pub fn config(&self) -> &PaymentConfig {
        &self.config
    }

    /// This flow's fee cache, for quoting without holding the session
    pub fn fee_tracker(&self) -> Arc<FeeTracker> {
        self.fees.clone()
    }

    pub fn state(&self) -> FlowState {
        self.flow.snapshot(&self.config, self.fees.latest())
    }

    /// Live fee totals for a candidate amount. `Ok(None)` means the amount
    /// changed again before this quote came back.
    pub async fn quote_fees(&self, amount: Decimal, auth: &AuthContext) -> ServiceResult<Option<FeeBreakdown>> {
        self.fees.quote(amount, auth).await
    }

    pub fn submit_amount(&mut self, amount: Decimal) -> ServiceResult<FlowState> {
        self.flow.submit_amount(amount)?;
        self.fees.align_to(amount);
        Ok(self.state())
    }

    pub fn submit_details(&mut self, details: DonorDetails) -> ServiceResult<FlowState> {
        self.flow.submit_details(details)?;
        Ok(self.state())
    }

    pub fn back(&mut self) -> ServiceResult<FlowState> {
        self.flow.back()?;
        Ok(self.state())
    }

    pub fn cancel(&mut self) -> ServiceResult<FlowState> {
        self.flow.cancel()?;
        self.fees.invalidate();
        Ok(self.state())
    }

    pub fn retry(&mut self) -> ServiceResult<FlowState> {
        self.flow.retry()?;
        Ok(self.state())
    }

    /// Run the PROCESSING step for `method`.
    ///
    /// `Err` means the step was refused locally and the flow did not move.
    /// Once a request is sent the result is always `Ok`: the returned state
    /// is REDIRECT_PENDING, SUCCESS or FAILED.
    pub async fn submit_payment(&mut self, method: PaymentMethod, auth: &AuthContext) -> ServiceResult<FlowState> {
        auth.authorize(Permission::MakeDonation)?;
        auth.bearer_token()?;
        self.campaign.ensure_accepting_donations(Utc::now())?;
        let request = self.flow.begin_processing(method, &self.config)?;

        let result = match method {
            PaymentMethod::GatewayCard => self.start_card(&request, auth).await,
            PaymentMethod::BankTransfer => self.create_transfer(&request, auth).await,
        };

        if let Err(err) = result {
            warn!(
                "Donation to campaign {} failed during processing: {}",
                request.campaign_id, err
            );
            self.flow.fail(&err.user_message())?;
        }
        Ok(self.state())
    }

    async fn start_card(&mut self, request: &DonationRequest, auth: &AuthContext) -> ServiceResult<()> {
        let session = self.gateway.start_card_session(request, auth).await?;
        self.flow.redirect(&session.redirect_url)?;
        Ok(())
    }

    async fn create_transfer(&mut self, request: &DonationRequest, auth: &AuthContext) -> ServiceResult<()> {
        let donation = with_timeout(
            self.timeout,
            "Donation creation",
            self.payments.create_donation(request, auth),
        ).await?;
        let donation = donation.with_name_suppressed();

        let instructions = TransferInstructions::for_donation(&donation, self.config.bank_account.clone());
        info!("Bank transfer donation {} recorded as {}", donation.id, donation.status);
        self.flow.complete(FlowOutcome::ManualTransferPending { donation, instructions })?;
        Ok(())
    }
}
