//! `getpaymentrequest`: fetch a new address and record what the payer owes.
//!
//! Arguments are positional `[amount, label, msg]`. Trailing arguments may be
//! omitted and are stored as empty strings; more than three is rejected
//! before the backend is contacted.

use super::Dispatcher;
use clientapi::request::DecodedRequest;
use clientapi::response::{ResponseEnvelope, normalize};
use clientapi::{BridgeError, NEW_ADDRESS_METHOD};
use clientapi_rpc::RpcBackend;
use clientapi_store::PaymentRequestRecord;
use tokio_util::sync::CancellationToken;

/// `amount`, `label`, `msg`.
pub const MAX_PAYMENT_REQUEST_ARGS: usize = 3;

/// Caller-supplied part of a payment request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaymentRequestArgs {
    pub amount: String,
    pub label: String,
    pub msg: String,
}

impl PaymentRequestArgs {
    pub fn from_args(args: &[String]) -> Result<Self, BridgeError> {
        if args.len() > MAX_PAYMENT_REQUEST_ARGS {
            return Err(BridgeError::InvalidArguments(format!(
                "expected at most {MAX_PAYMENT_REQUEST_ARGS} arguments (amount, label, msg), got {}",
                args.len()
            )));
        }
        let arg = |idx: usize| args.get(idx).cloned().unwrap_or_default();
        Ok(Self {
            amount: arg(0),
            label: arg(1),
            msg: arg(2),
        })
    }

    pub fn into_record(self, address: String) -> PaymentRequestRecord {
        PaymentRequestRecord {
            address,
            amount: self.amount,
            label: self.label,
            msg: self.msg,
        }
    }
}

pub(crate) async fn handle_payment_request<B: RpcBackend>(
    dispatcher: &Dispatcher<B>,
    request: &DecodedRequest,
    shutdown: &CancellationToken,
) -> Result<ResponseEnvelope, BridgeError> {
    let fields = PaymentRequestArgs::from_args(&request.args)?;

    let reply = dispatcher
        .call(NEW_ADDRESS_METHOD, Vec::new(), shutdown)
        .await?;
    let response = normalize(&reply);
    let Some(address) = response.data() else {
        // Backend refused; hand its error straight back, nothing is stored.
        return Ok(response);
    };
    if address.is_empty() {
        return Err(BridgeError::Protocol(format!(
            "{NEW_ADDRESS_METHOD} returned no address"
        )));
    }

    let record = fields.into_record(address.to_string());
    let count = match dispatcher.store().append(record) {
        Ok(count) => count,
        Err(e) => {
            let detail = format!("{e:#}");
            tracing::error!(err = %detail, "failed to store payment request");
            return Err(BridgeError::Persistence(detail));
        }
    };

    tracing::info!(address, stored = count, "payment request created");
    Ok(response)
}
