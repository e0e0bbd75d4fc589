use super::*;
use clientapi::response::RpcReply;
use clientapi_store::PaymentRequestRecord;
use serde_json::json;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

type Scripted = Result<RpcReply, BridgeError>;

/// Backend that replays canned replies and records every call.
#[derive(Default)]
struct ScriptedBackend {
    replies: Mutex<VecDeque<Scripted>>,
    calls: Mutex<Vec<(String, Vec<Value>)>>,
}

impl ScriptedBackend {
    fn with(replies: Vec<Scripted>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> Vec<(String, Vec<Value>)> {
        self.calls.lock().unwrap().clone()
    }
}

impl RpcBackend for ScriptedBackend {
    async fn call(&self, method: &str, params: Vec<Value>) -> Result<RpcReply, BridgeError> {
        self.calls
            .lock()
            .unwrap()
            .push((method.to_string(), params));
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(BridgeError::Protocol("no scripted reply".into())))
    }
}

fn make_dispatcher(
    replies: Vec<Scripted>,
    retry: RetryPolicy,
) -> (Dispatcher<ScriptedBackend>, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let store = PaymentRequestStore::open(dir.path());
    let dispatcher = Dispatcher::new(ScriptedBackend::with(replies), store, retry);
    (dispatcher, dir)
}

async fn dispatch(dispatcher: &Dispatcher<ScriptedBackend>, body: &str) -> Value {
    let response = dispatcher
        .handle(body.as_bytes(), &CancellationToken::new())
        .await;
    serde_json::from_slice(&response.to_bytes()).unwrap()
}

fn assert_error_code(resp: &Value, expected: &str) {
    assert_eq!(resp["errors"]["status"], json!(400), "not a failure: {resp}");
    assert_eq!(resp["errors"]["code"], json!(expected), "unexpected: {resp}");
}

// ---- Registry ----

#[test]
fn registry_defaults_to_pass_through() {
    let registry = CommandRegistry::standard();
    assert_eq!(registry.resolve("getbalance"), CommandHandler::PassThrough);
    assert_eq!(
        registry.resolve("getpaymentrequest"),
        CommandHandler::Composite(CompositeCommand::PaymentRequest)
    );
    assert_eq!(
        CommandRegistry::default().resolve("getpaymentrequest"),
        CommandHandler::PassThrough
    );
}

// ---- Pass-through ----

#[tokio::test]
async fn pass_through_converts_params_and_normalizes() {
    let (dispatcher, _dir) = make_dispatcher(
        vec![Ok(RpcReply::success(json!("000000abc")))],
        RetryPolicy::default(),
    );
    let resp = dispatch(&dispatcher, r#"{"type":"getblockhash","payload":["100"]}"#).await;
    assert_eq!(resp, json!({"data": "000000abc", "meta": {"status": 200}}));
    assert_eq!(
        dispatcher.backend().calls(),
        vec![("getblockhash".to_string(), vec![json!(100)])]
    );
}

#[tokio::test]
async fn pass_through_keeps_string_arguments() {
    let (dispatcher, _dir) = make_dispatcher(
        vec![Ok(RpcReply::success(json!("txid")))],
        RetryPolicy::default(),
    );
    dispatch(
        &dispatcher,
        r#"{"type":"sendtoaddress","payload":["1ABC","0.5","dinner"]}"#,
    )
    .await;
    assert_eq!(
        dispatcher.backend().calls()[0].1,
        vec![json!("1ABC"), json!(0.5), json!("dinner")]
    );
}

#[tokio::test]
async fn structured_result_is_pretty_string() {
    let (dispatcher, _dir) = make_dispatcher(
        vec![Ok(RpcReply::success(json!({"balance": 1})))],
        RetryPolicy::default(),
    );
    let resp = dispatch(&dispatcher, r#"{"type":"getwalletinfo","payload":[]}"#).await;
    assert_eq!(resp["data"], json!("{\n  \"balance\": 1\n}"));
}

#[tokio::test]
async fn rpc_error_becomes_failure_envelope() {
    let (dispatcher, _dir) = make_dispatcher(
        vec![Ok(RpcReply::failure(-32601, "Method not found"))],
        RetryPolicy::default(),
    );
    let resp = dispatch(&dispatcher, r#"{"type":"nosuchmethod","payload":[]}"#).await;
    assert_eq!(
        resp,
        json!({"errors": {"status": 400, "message": "Method not found", "code": "-32601"}})
    );
}

#[tokio::test]
async fn malformed_request_never_reaches_backend() {
    let (dispatcher, _dir) = make_dispatcher(vec![], RetryPolicy::default());
    let resp = dispatch(&dispatcher, "{oops").await;
    assert_error_code(&resp, "parse_error");

    let resp = dispatch(&dispatcher, r#"{"type":"getblockhash","payload":["ten"]}"#).await;
    assert_error_code(&resp, "parse_error");

    assert!(dispatcher.backend().calls().is_empty());
}

#[tokio::test]
async fn connection_failure_without_wait_is_not_retried() {
    let (dispatcher, _dir) = make_dispatcher(
        vec![
            Err(BridgeError::Connection("refused".into())),
            Ok(RpcReply::success(json!("late"))),
        ],
        RetryPolicy::default(),
    );
    let resp = dispatch(&dispatcher, r#"{"type":"getinfo"}"#).await;
    assert_error_code(&resp, "connection_error");
    assert_eq!(dispatcher.backend().calls().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn connection_failure_with_wait_retries_until_success() {
    let (dispatcher, _dir) = make_dispatcher(
        vec![
            Err(BridgeError::Connection("refused".into())),
            Err(BridgeError::Connection("refused".into())),
            Ok(RpcReply::success(json!("up"))),
        ],
        RetryPolicy::wait(Duration::from_secs(1)),
    );
    let resp = dispatch(&dispatcher, r#"{"type":"getinfo"}"#).await;
    assert_eq!(resp["data"], json!("up"));
    assert_eq!(dispatcher.backend().calls().len(), 3);
}

#[tokio::test]
async fn auth_failure_is_reported() {
    let (dispatcher, _dir) = make_dispatcher(
        vec![Err(BridgeError::Auth("incorrect rpcuser or rpcpassword".into()))],
        RetryPolicy::wait(Duration::from_millis(1)),
    );
    let resp = dispatch(&dispatcher, r#"{"type":"getinfo"}"#).await;
    assert_error_code(&resp, "auth_error");
    assert_eq!(dispatcher.backend().calls().len(), 1);
}

// ---- Payment request ----

#[tokio::test]
async fn payment_request_stores_record_and_returns_address() {
    let (dispatcher, _dir) = make_dispatcher(
        vec![Ok(RpcReply::success(json!("1ABCxyz")))],
        RetryPolicy::default(),
    );
    let resp = dispatch(
        &dispatcher,
        r#"{"type":"getpaymentrequest","payload":["10.0","rent","march"]}"#,
    )
    .await;

    assert_eq!(resp, json!({"data": "1ABCxyz", "meta": {"status": 200}}));
    assert_eq!(
        dispatcher.backend().calls(),
        vec![("getnewaddress".to_string(), vec![])]
    );
    assert_eq!(
        dispatcher.store().load().unwrap(),
        vec![PaymentRequestRecord {
            address: "1ABCxyz".into(),
            amount: "10.0".into(),
            label: "rent".into(),
            msg: "march".into(),
        }]
    );
}

#[tokio::test]
async fn payment_request_appends_in_order() {
    let (dispatcher, _dir) = make_dispatcher(
        vec![
            Ok(RpcReply::success(json!("1First"))),
            Ok(RpcReply::success(json!("1Second"))),
        ],
        RetryPolicy::default(),
    );
    dispatch(&dispatcher, r#"{"type":"getpaymentrequest","payload":["1"]}"#).await;
    dispatch(&dispatcher, r#"{"type":"getpaymentrequest","payload":["2","b"]}"#).await;

    let stored = dispatcher.store().load().unwrap();
    assert_eq!(stored.len(), 2);
    assert_eq!(stored[0].address, "1First");
    assert_eq!(stored[0].label, "");
    assert_eq!(stored[1].address, "1Second");
    assert_eq!(stored[1].label, "b");
}

#[tokio::test]
async fn payment_request_backend_error_persists_nothing() {
    let (dispatcher, _dir) = make_dispatcher(
        vec![Ok(RpcReply::failure(-12, "Keypool ran out"))],
        RetryPolicy::default(),
    );
    let resp = dispatch(
        &dispatcher,
        r#"{"type":"getpaymentrequest","payload":["1","a","b"]}"#,
    )
    .await;
    assert_error_code(&resp, "-12");
    assert_eq!(resp["errors"]["message"], json!("Keypool ran out"));
    assert!(dispatcher.store().load().unwrap().is_empty());
}

#[tokio::test]
async fn payment_request_empty_address_persists_nothing() {
    let (dispatcher, _dir) = make_dispatcher(
        vec![Ok(RpcReply::success(Value::Null))],
        RetryPolicy::default(),
    );
    let resp = dispatch(&dispatcher, r#"{"type":"getpaymentrequest","payload":["1"]}"#).await;
    assert_error_code(&resp, "protocol_error");
    assert!(dispatcher.store().load().unwrap().is_empty());
}

#[tokio::test]
async fn payment_request_rejects_extra_arguments_before_backend() {
    let (dispatcher, _dir) = make_dispatcher(vec![], RetryPolicy::default());
    let resp = dispatch(
        &dispatcher,
        r#"{"type":"getpaymentrequest","payload":["1","a","b","c"]}"#,
    )
    .await;
    assert_error_code(&resp, "invalid_arguments");
    assert!(dispatcher.backend().calls().is_empty());
}

#[tokio::test]
async fn payment_request_store_failure_is_persistence_error() {
    let (dispatcher, _dir) = make_dispatcher(
        vec![Ok(RpcReply::success(json!("1ABC")))],
        RetryPolicy::default(),
    );
    let path = dispatcher.store().path().to_path_buf();
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, "[broken").unwrap();

    let resp = dispatch(&dispatcher, r#"{"type":"getpaymentrequest","payload":["1"]}"#).await;
    assert_error_code(&resp, "persistence_error");
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "[broken");
}

#[tokio::test]
async fn custom_registry_routes_alias_to_composite() {
    let mut registry = CommandRegistry::standard();
    registry.register(
        "newpaymentrequest",
        CommandHandler::Composite(CompositeCommand::PaymentRequest),
    );
    let (dispatcher, _dir) = make_dispatcher(
        vec![Ok(RpcReply::success(json!("1Alias")))],
        RetryPolicy::default(),
    );
    let dispatcher = dispatcher.with_registry(registry);

    let resp = dispatch(&dispatcher, r#"{"type":"newpaymentrequest","payload":["3"]}"#).await;
    assert_eq!(resp["data"], json!("1Alias"));
    assert_eq!(dispatcher.store().load().unwrap()[0].amount, "3");
}
