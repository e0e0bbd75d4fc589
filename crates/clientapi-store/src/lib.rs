pub mod data_dir;
pub mod payment_request;

pub use payment_request::{PaymentRequestRecord, PaymentRequestStore};
