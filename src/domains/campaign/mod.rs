pub mod types;

pub use types::{Campaign, CampaignDecision, CampaignStatus};
