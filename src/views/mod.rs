pub mod donation_form;
pub mod event_detail;
pub mod format;

pub use donation_form::{DonationForm, PendingSubmission};
pub use event_detail::{EventDetail, EventDetailView};
pub use format::{ellipse_address, event_option_label};
