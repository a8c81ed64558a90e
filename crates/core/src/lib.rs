pub mod automation;
pub mod intent;
pub mod models;

pub use automation::dispatch_automation;
pub use intent::classify_intent;
pub use models::*;
