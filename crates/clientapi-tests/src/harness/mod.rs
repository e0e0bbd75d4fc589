pub mod backend;
pub mod bridge;
pub mod client;

use std::time::Duration;

/// How long a test waits for any single reply.
pub const REPLY_TIMEOUT: Duration = Duration::from_secs(10);

/// Initialize tracing for tests (only once per process).
pub fn init_tracing() {
    use std::sync::Once;
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter("clientapi_node=debug,clientapi_rpc=debug,clientapi_store=debug")
            .with_test_writer()
            .try_init()
            .ok();
    });
}

/// A loopback port with nothing listening on it.
pub fn closed_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    port
}
