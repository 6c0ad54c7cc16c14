pub mod confirmation;
pub mod flow;
pub mod service;
pub mod types;

pub use confirmation::{ConfirmationHandler, ConfirmationOutcome};
pub use flow::{DonationFlow, DonorDetails, FlowOutcome, FlowState, FlowStep};
pub use service::{DonationOrchestrator, DonationSession};
pub use types::{Donation, DonationStatus, TransferInstructions};
