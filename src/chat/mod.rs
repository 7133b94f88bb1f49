pub mod intent;
pub mod prompt;
pub mod service;
pub mod session;

pub use intent::{IntentClassifier, KeywordIntentClassifier, SiteQuery};
pub use service::{ChatService, ChatServiceBuilder};
pub use session::ConversationState;
