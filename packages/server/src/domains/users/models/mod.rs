pub mod preferences;
pub mod user;

pub use preferences::{PreferenceDocument, UserPreferences};
pub use user::User;
