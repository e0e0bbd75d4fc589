pub mod error;
pub mod request;
pub mod response;

pub use error::BridgeError;

/// Default ZeroMQ endpoint the bridge binds its REP socket to.
pub const DEFAULT_ENDPOINT: &str = "tcp://*:5557";

/// Command that creates and stores a payment request.
pub const PAYMENT_REQUEST_COMMAND: &str = "getpaymentrequest";

/// Backend method used to obtain a fresh receiving address.
pub const NEW_ADDRESS_METHOD: &str = "getnewaddress";
