use crate::models::Intent;

pub const BUYER_AUTOMATION: &str = "Notified available sellers";
pub const SELLER_AUTOMATION: &str = "Notified interested buyers";
pub const NO_AUTOMATION: &str = "No automation triggered";

/// Status text for the notification that would follow a classified message.
/// Nothing is actually sent.
pub fn dispatch_automation(intent: Intent) -> &'static str {
    match intent {
        Intent::Buyer => BUYER_AUTOMATION,
        Intent::Seller => SELLER_AUTOMATION,
        Intent::Unknown => NO_AUTOMATION,
    }
}
