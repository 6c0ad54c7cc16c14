pub mod callback;
pub mod gateway;
pub mod repository;
pub mod types;

pub use callback::RedirectCallback;
pub use gateway::{HostedCheckoutGateway, PaymentGatewaySession};
pub use repository::{HttpPaymentRepository, PaymentRepository};
pub use types::{
    BankAccountDetails, CardSession, DonationRequest, PaymentConfig, PaymentConfirmation, PaymentMethod,
    PaymentReference, RefundResult,
};
