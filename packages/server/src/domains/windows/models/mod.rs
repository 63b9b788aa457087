pub mod conversation_window;
pub mod reminder_log;

pub use conversation_window::{ConversationWindow, WindowStatus};
pub use reminder_log::ReminderLog;
