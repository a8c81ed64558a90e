use crate::models::Intent;

pub const BUYING_KEYWORDS: [&str; 5] = [
    "buy",
    "looking for",
    "want to buy",
    "interested in",
    "searching",
];

pub const SELLING_KEYWORDS: [&str; 5] = [
    "sell",
    "selling",
    "list my property",
    "want to sell",
    "put house for sale",
];

/// Buying keywords are scanned before selling keywords, so a message
/// carrying both always classifies as `Buyer`.
pub fn classify_intent(message: &str) -> Intent {
    let lower = message.to_lowercase();

    if contains_any(&lower, &BUYING_KEYWORDS) {
        return Intent::Buyer;
    }

    if contains_any(&lower, &SELLING_KEYWORDS) {
        return Intent::Seller;
    }

    Intent::Unknown
}

fn contains_any(input: &str, needles: &[&str]) -> bool {
    needles.iter().any(|needle| input.contains(needle))
}
