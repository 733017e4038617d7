use std::{
    net::SocketAddr,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use base64::{Engine as _, prelude::BASE64_STANDARD};
use borsh::BorshDeserialize as _;
use loadtest_configs::{
    LoadConfig,
    constants::{DEFAULT_USER_FUNDS, FUNCTION_CALL_GAS},
};
use loadtest_core::{
    provision::CREATE_ACCOUNT_LABEL,
    sim::{Environment, SimulationBuilder, SimulationError},
};
use loadtest_workloads::{
    InitStage, MintInitializer, SimulationBuilderExt as _,
    inscription::{DEFAULT_TICK, MINT_LABEL},
};
use near_crypto::{KeyType, SecretKey};
use near_primitives::{
    action::Action,
    hash::CryptoHash,
    transaction::{SignedTransaction, Transaction},
};
use serde_json::{Value, json};
use tokio::{
    io::{AsyncReadExt as _, AsyncWriteExt as _},
    net::{TcpListener, TcpStream},
};

const MOCK_NONCE: u64 = 17;

fn mock_block_hash() -> CryptoHash {
    CryptoHash([7u8; 32])
}

/// In-process JSON-RPC node: answers the three methods the framework uses
/// and records every signed transaction it receives.
struct MockNode {
    queries: AtomicUsize,
    sent: Mutex<Vec<String>>,
    fail_sends_after: AtomicUsize,
}

impl MockNode {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            queries: AtomicUsize::new(0),
            sent: Mutex::new(Vec::new()),
            fail_sends_after: AtomicUsize::new(usize::MAX),
        })
    }

    fn sent_transactions(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }

    fn dispatch(&self, request: &Value) -> Value {
        let id = request["id"].clone();
        let result = match request["method"].as_str().unwrap_or_default() {
            "query" => {
                self.queries.fetch_add(1, Ordering::SeqCst);
                json!({
                    "nonce": MOCK_NONCE,
                    "permission": "FullAccess",
                    "block_height": 1,
                    "block_hash": mock_block_hash().to_string(),
                })
            }
            "block" => json!({"header": {"hash": mock_block_hash().to_string()}}),
            "send_tx" => {
                let encoded = request["params"]["signed_tx_base64"]
                    .as_str()
                    .unwrap_or_default()
                    .to_owned();
                let recorded = {
                    let mut sent = self.sent.lock().unwrap();
                    sent.push(encoded);
                    sent.len()
                };
                if recorded > self.fail_sends_after.load(Ordering::SeqCst) {
                    return json!({
                        "jsonrpc": "2.0",
                        "id": id,
                        "error": {"code": -32000, "message": "Server error", "data": "transaction rejected"},
                    });
                }
                json!({"final_execution_status": "EXECUTED_OPTIMISTIC"})
            }
            other => json!({"error": format!("unexpected method {other}")}),
        };
        json!({"jsonrpc": "2.0", "id": id, "result": result})
    }
}

async fn spawn_mock_node() -> (Arc<MockNode>, SocketAddr) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let node = MockNode::new();

    let accept_node = Arc::clone(&node);
    tokio::spawn(async move {
        loop {
            let Ok((stream, _)) = listener.accept().await else {
                break;
            };
            let node = Arc::clone(&accept_node);
            tokio::spawn(serve_connection(stream, node));
        }
    });

    (node, addr)
}

async fn serve_connection(mut stream: TcpStream, node: Arc<MockNode>) {
    let mut buffer = Vec::new();
    loop {
        let Some(request) = read_request(&mut stream, &mut buffer).await else {
            return;
        };
        let body = node.dispatch(&request).to_string();
        let response = format!(
            "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\n\r\n{body}",
            body.len(),
        );
        if stream.write_all(response.as_bytes()).await.is_err() {
            return;
        }
    }
}

/// Just enough HTTP/1.1 to serve reqwest's keep-alive POSTs.
async fn read_request(stream: &mut TcpStream, buffer: &mut Vec<u8>) -> Option<Value> {
    let header_end = loop {
        if let Some(position) = buffer.windows(4).position(|window| window == b"\r\n\r\n") {
            break position;
        }
        if read_chunk(stream, buffer).await? == 0 {
            return None;
        }
    };

    let headers = String::from_utf8_lossy(&buffer[..header_end]).to_ascii_lowercase();
    let content_length = headers
        .lines()
        .find_map(|line| line.strip_prefix("content-length:"))
        .and_then(|value| value.trim().parse::<usize>().ok())?;

    let body_start = header_end + 4;
    while buffer.len() < body_start + content_length {
        if read_chunk(stream, buffer).await? == 0 {
            return None;
        }
    }

    let request = serde_json::from_slice(&buffer[body_start..body_start + content_length]).ok();
    buffer.drain(..body_start + content_length);
    request
}

async fn read_chunk(stream: &mut TcpStream, buffer: &mut Vec<u8>) -> Option<usize> {
    let mut chunk = [0u8; 4096];
    let read = stream.read(&mut chunk).await.ok()?;
    buffer.extend_from_slice(&chunk[..read]);
    Some(read)
}

fn config_for(addr: SocketAddr) -> LoadConfig {
    let key = SecretKey::from_random(KeyType::ED25519);
    LoadConfig::new("funder.near", key.to_string())
        .with_rpc_url(format!("http://{addr}"))
        .with_users(1)
        .with_pace(Duration::from_millis(25))
        .with_run_duration(Duration::from_millis(250))
        .with_run_id("itest")
}

fn decode_sent(encoded: &str) -> SignedTransaction {
    let bytes = BASE64_STANDARD.decode(encoded).unwrap();
    SignedTransaction::try_from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn mint_flow_submits_wire_correct_inscriptions() {
    let (node, addr) = spawn_mock_node().await;

    let report = SimulationBuilder::new(config_for(addr))
        .mint_inscriptions()
        .build()
        .unwrap()
        .run()
        .await
        .unwrap();

    let mints = report.channel(MINT_LABEL).expect("mint channel");
    assert!(mints.requests >= 1);
    assert_eq!(mints.failures, 0);
    assert_eq!(
        report.channel(CREATE_ACCOUNT_LABEL).map(|c| c.requests),
        Some(1)
    );

    let sent = node.sent_transactions();
    assert!(
        sent.len() >= 2,
        "expected provisioning plus at least one mint, got {}",
        sent.len()
    );

    // The first submission provisions the user's sub-account.
    let Transaction::V0(create) = decode_sent(&sent[0]).transaction else {
        panic!("expected a v0 transaction");
    };
    assert_eq!(create.signer_id.as_str(), "funder.near");
    assert_eq!(create.receiver_id.as_str(), "itest-u0.funder.near");
    assert_eq!(create.nonce, MOCK_NONCE + 1);
    assert_eq!(create.block_hash, mock_block_hash());
    assert!(matches!(create.actions[0], Action::CreateAccount(_)));
    let Action::Transfer(ref funds) = create.actions[1] else {
        panic!("expected a transfer action");
    };
    assert_eq!(funds.deposit, DEFAULT_USER_FUNDS);
    assert!(matches!(create.actions[2], Action::AddKey(_)));

    // Everything after it is a paced mint call signed by that sub-account.
    let signed = decode_sent(&sent[1]);
    let (tx_hash, _) = signed.transaction.get_hash_and_size();
    let signature = signed.signature.clone();
    let Transaction::V0(mint) = signed.transaction else {
        panic!("expected a v0 transaction");
    };
    assert!(signature.verify(tx_hash.as_ref(), &mint.public_key));
    assert_eq!(mint.signer_id.as_str(), "itest-u0.funder.near");
    assert_eq!(mint.receiver_id.as_str(), "inscription.near");
    assert_eq!(mint.nonce, MOCK_NONCE + 1);

    let [Action::FunctionCall(call)] = mint.actions.as_slice() else {
        panic!("expected a single function call");
    };
    assert_eq!(call.method_name, "inscribe");
    assert_eq!(call.gas, FUNCTION_CALL_GAS);
    assert_eq!(call.deposit, 0);
    let args: Value = serde_json::from_slice(&call.args).unwrap();
    assert_eq!(
        args,
        json!({"p": "nrc-20", "op": "mint", "tick": DEFAULT_TICK, "amt": "100"})
    );
}

#[tokio::test]
async fn init_refreshes_the_funder_nonce_only_after_readiness() {
    let (node, addr) = spawn_mock_node().await;
    let environment = Arc::new(Environment::new(config_for(addr)).unwrap());

    let initializer = MintInitializer::new();
    let mut stages = initializer.stage_watch();

    let init_environment = Arc::clone(&environment);
    let init = tokio::spawn(async move { initializer.run(&init_environment).await });

    stages
        .wait_for(|stage| *stage == InitStage::WaitingOnReadiness)
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(
        node.queries.load(Ordering::SeqCst),
        0,
        "nonce refresh must wait for readiness"
    );

    environment.resolve_funding_account().unwrap();
    environment.readiness().set();

    init.await.unwrap().unwrap();
    assert_eq!(*stages.borrow(), InitStage::Ready);
    assert_eq!(node.queries.load(Ordering::SeqCst), 1);
    assert_eq!(environment.funding_account().unwrap().nonce(), MOCK_NONCE);
}

#[tokio::test]
async fn failed_mints_trip_the_success_expectation() {
    let (node, addr) = spawn_mock_node().await;
    // Let provisioning through, then reject every mint.
    node.fail_sends_after.store(1, Ordering::SeqCst);

    let err = SimulationBuilder::new(config_for(addr))
        .mint_inscriptions()
        .build()
        .unwrap()
        .run()
        .await
        .unwrap_err();

    let SimulationError::Expectations { summary } = err else {
        panic!("expected the mint expectation to fail");
    };
    assert!(summary.contains("mint_inscription_success"));
}
