use clientapi_store::PaymentRequestRecord;
use clientapi_tests::harness::backend::{CannedReply, FakeBackend};
use clientapi_tests::harness::bridge::TestBridge;
use clientapi_tests::{unwrap_data, unwrap_error};
use serde_json::json;

#[tokio::test]
async fn payment_request_returns_address_and_persists() {
    let backend = FakeBackend::spawn().await.unwrap();
    backend.reply("getnewaddress", CannedReply::result(json!("1ABCxyz")));
    let bridge = TestBridge::spawn(backend.rpc_config()).await.unwrap();
    let mut client = bridge.client().unwrap();

    let resp = client
        .request("getpaymentrequest", json!(["10.0", "rent", "march"]))
        .await
        .unwrap();
    assert_eq!(unwrap_data(&resp), "1ABCxyz");

    let requests = backend.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method(), "getnewaddress");
    assert_eq!(requests[0].params(), &json!([]));

    let path = bridge
        .data_dir()
        .join("persistent")
        .join("payment_request.json");
    let doc: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
    assert_eq!(
        doc,
        json!({"data": [{"address": "1ABCxyz", "amount": "10.0", "label": "rent", "msg": "march"}]})
    );
}

#[tokio::test]
async fn successive_requests_accumulate() {
    let backend = FakeBackend::spawn().await.unwrap();
    backend.reply("getnewaddress", CannedReply::result(json!("1Same")));
    let bridge = TestBridge::spawn(backend.rpc_config()).await.unwrap();
    let mut client = bridge.client().unwrap();

    client
        .request("getpaymentrequest", json!(["1", "a"]))
        .await
        .unwrap();
    client
        .request("getpaymentrequest", json!(["2"]))
        .await
        .unwrap();

    assert_eq!(
        bridge.store().load().unwrap(),
        vec![
            PaymentRequestRecord {
                address: "1Same".into(),
                amount: "1".into(),
                label: "a".into(),
                msg: "".into(),
            },
            PaymentRequestRecord {
                address: "1Same".into(),
                amount: "2".into(),
                label: "".into(),
                msg: "".into(),
            },
        ]
    );
}

#[tokio::test]
async fn backend_failure_stores_nothing() {
    let backend = FakeBackend::spawn().await.unwrap();
    backend.reply(
        "getnewaddress",
        CannedReply::error(-12, "Error: Keypool ran out, please call keypoolrefill first"),
    );
    let bridge = TestBridge::spawn(backend.rpc_config()).await.unwrap();
    let mut client = bridge.client().unwrap();

    let resp = client
        .request("getpaymentrequest", json!(["1", "a", "b"]))
        .await
        .unwrap();
    let (code, message) = unwrap_error(&resp);
    assert_eq!(code, "-12");
    assert!(message.unwrap().contains("Keypool ran out"));
    assert!(bridge.store().load().unwrap().is_empty());
}

#[tokio::test]
async fn too_many_arguments_never_reach_backend() {
    let backend = FakeBackend::spawn().await.unwrap();
    backend.reply("getnewaddress", CannedReply::result(json!("1Unused")));
    let bridge = TestBridge::spawn(backend.rpc_config()).await.unwrap();
    let mut client = bridge.client().unwrap();

    let resp = client
        .request("getpaymentrequest", json!(["1", "a", "b", "extra"]))
        .await
        .unwrap();
    assert_eq!(unwrap_error(&resp).0, "invalid_arguments");
    assert!(backend.requests().is_empty());
    assert!(bridge.store().load().unwrap().is_empty());
}

#[tokio::test]
async fn corrupt_store_is_persistence_error() {
    let backend = FakeBackend::spawn().await.unwrap();
    backend.reply("getnewaddress", CannedReply::result(json!("1Lost")));
    let bridge = TestBridge::spawn(backend.rpc_config()).await.unwrap();
    let mut client = bridge.client().unwrap();

    let store = bridge.store();
    std::fs::create_dir_all(store.path().parent().unwrap()).unwrap();
    std::fs::write(store.path(), "not a document").unwrap();

    let resp = client
        .request("getpaymentrequest", json!(["1"]))
        .await
        .unwrap();
    assert_eq!(unwrap_error(&resp).0, "persistence_error");
    assert_eq!(std::fs::read_to_string(store.path()).unwrap(), "not a document");
}
