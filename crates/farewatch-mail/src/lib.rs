/// Mail transports for price-change notifications.
///
/// - `MailgunTransport`: sends through the Mailgun messages API
/// - `LogTransport`: dry run, writes the message to the log instead

pub mod log;
pub mod mailgun;

pub use log::LogTransport;
pub use mailgun::{MailError, MailgunConfig, MailgunTransport};
