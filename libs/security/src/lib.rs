//! Webhook authenticity checks used by the channel adapters.
//!
//! Helpers return [`SignatureError`] so each adapter can map a failed check to the status code its
//! vendor expects.

pub mod guard;
pub mod signature;
pub mod twilio;
pub mod twitter;

pub use guard::*;
pub use signature::*;
pub use twilio::*;
pub use twitter::*;
