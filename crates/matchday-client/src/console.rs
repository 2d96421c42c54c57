//! User-facing output.

use matchday::{PendingAction, Reception};

/// Where the driver writes text meant for the user.
pub trait Console: Send + Sync + 'static {
    fn print(&self, line: &str);
}

/// Prints to standard output.
#[derive(Debug, Clone, Copy, Default)]
pub struct Stdout;

impl Console for Stdout {
    fn print(&self, line: &str) {
        println!("{line}");
    }
}

/// Console text for a server frame, if the user should see anything.
pub fn describe(reception: &Reception) -> Option<String> {
    match reception {
        Reception::Connected { .. } => Some("Login successful".to_string()),
        Reception::Error { message, body } => Some(format!(
            "Error received: {}\n{}",
            message.trim(),
            body.trim_end()
        )),
        Reception::Receipt {
            action: Some(PendingAction::Disconnect),
            ..
        } => None,
        Reception::Receipt {
            action: Some(action),
            ..
        } => Some(action.to_string()),
        Reception::Receipt { action: None, .. }
        | Reception::Message { .. }
        | Reception::Ignored => None,
    }
}
