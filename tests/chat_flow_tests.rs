//! End-to-end chat flows: turn handling, the pending transaction and signing

mod common;

use async_trait::async_trait;
use serde_json::json;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::tempdir;

use hedera_agent_chat::{
    app::{ChatApp, NoticeLevel, Phase, DISCONNECTED_NOTICE, NO_SIGNER_NOTICE, SIGN_FAILED_NOTICE},
    blockchain::{
        enrichment::TransactionEnricher,
        models::{AccountId, HederaNetwork, TransactionError, TransactionPayload},
    },
    chat::{
        message::{Message, Role, Transcript},
        turn::{TurnHandler, TurnOutcome, GENERIC_ERROR_MESSAGE, TRANSACTION_PREPARED_MESSAGE},
        PanelAction, TransactionPanel,
    },
    wallet::{connector::methods, SessionStore, WalletSession, ACCOUNT_STORAGE_KEY},
};

use common::{FakeActions, FakeWallet, TX_BYTES};

struct FakeEnricher {
    fail: bool,
}

#[async_trait]
impl TransactionEnricher for FakeEnricher {
    async fn enrich(&self, mut payload: TransactionPayload) -> Result<TransactionPayload, TransactionError> {
        if self.fail {
            return Err(TransactionError::Enrichment("lookup service down".to_string()));
        }
        payload.merge(
            json!({ "memo": "lunch", "amount": "5 ℏ" })
                .as_object()
                .cloned()
                .unwrap(),
        );
        Ok(payload)
    }
}

fn wallet_session(wallet: Arc<FakeWallet>, dir: &Path) -> WalletSession {
    let store = SessionStore::new(dir.join("local_storage.json"));
    WalletSession::new(wallet, store, HederaNetwork::Testnet)
}

async fn connected_app(
    actions: Arc<FakeActions>,
    enricher: Option<Arc<dyn TransactionEnricher>>,
    wallet: Arc<FakeWallet>,
    dir: &Path,
) -> ChatApp {
    let mut app = ChatApp::new(actions, enricher, wallet_session(wallet, dir));
    app.connect_wallet().await;
    let notices = app.drain_notices();
    assert_eq!(notices[0].level, NoticeLevel::Success);
    assert_eq!(notices[0].text, "Connected: 0.0.1234");
    app
}

#[tokio::test]
async fn test_transfer_prompt_prepares_transaction_before_signing() {
    let temp_dir = tempdir().unwrap();
    let actions = Arc::new(FakeActions::default());
    let wallet = Arc::new(FakeWallet::with_account("0.0.1234"));
    let mut app = connected_app(actions.clone(), None, wallet.clone(), temp_dir.path()).await;

    let outcome = app.send("send 5 hbar to 0.0.1234").await;
    assert!(matches!(outcome, TurnOutcome::TransactionPrepared(_)));

    let pending = app.pending().expect("pending transaction");
    assert_eq!(pending.tx_bytes.as_str(), TX_BYTES);
    assert_eq!(app.phase(), Phase::AwaitingSignature);
    assert_eq!(
        app.transcript().messages(),
        &[
            Message::user("send 5 hbar to 0.0.1234"),
            Message::tool(TRANSACTION_PREPARED_MESSAGE),
        ]
    );

    // The panel is available and nothing has been sent to the wallet yet.
    let panel = app.panel().expect("panel");
    assert!(!panel.render().contains(TX_BYTES));
    assert!(panel.render().contains("TRANSFER"));
    assert_eq!(TransactionPanel::ACTIONS, [PanelAction::SignAndExecute, PanelAction::Cancel]);
    assert!(wallet.rpc_calls().is_empty());
    assert_eq!(actions.summary_count(), 0);

    let chat = actions.last_chat().unwrap();
    assert_eq!(chat.account_id, "0.0.1234");
    assert!(chat.current_transaction.is_none());
}

#[tokio::test]
async fn test_informational_result_is_summarized_once() {
    let temp_dir = tempdir().unwrap();
    let actions = Arc::new(FakeActions::default());
    let wallet = Arc::new(FakeWallet::with_account("0.0.1234"));
    let mut app = connected_app(actions.clone(), None, wallet, temp_dir.path()).await;

    let outcome = app.send("  what is my balance?  ").await;
    assert_eq!(outcome, TurnOutcome::Summarized);
    assert!(app.pending().is_none());
    assert_eq!(actions.summary_count(), 1);
    assert_eq!(actions.last_chat().unwrap().input, "what is my balance?");

    let messages = app.transcript().messages();
    assert_eq!(messages.len(), 3);
    assert_eq!(messages[1], Message::assistant("Your balance is 42 HBAR."));
    assert_eq!(messages[2].role, Role::Tool);
    assert_eq!(messages[2].content, "{\n  \"balance\": \"42 HBAR\"\n}");

    let summarized = actions.summaries.lock().unwrap()[0].clone();
    assert_eq!(summarized[0]["toolName"], json!("interact-with-hedera"));
}

#[tokio::test]
async fn test_plain_text_reply() {
    let temp_dir = tempdir().unwrap();
    let actions = Arc::new(FakeActions {
        plain_text: Some("Hi! Ask me about Hedera.".to_string()),
        ..Default::default()
    });
    let wallet = Arc::new(FakeWallet::with_account("0.0.1234"));
    let mut app = connected_app(actions.clone(), None, wallet, temp_dir.path()).await;

    assert_eq!(app.send("hello").await, TurnOutcome::Replied);
    assert_eq!(
        app.transcript().last(),
        Some(&Message::assistant("Hi! Ask me about Hedera."))
    );
    assert_eq!(actions.summary_count(), 0);
    assert_eq!(app.phase(), Phase::Idle);
}

#[tokio::test]
async fn test_failed_turn_appends_generic_error() {
    let temp_dir = tempdir().unwrap();
    let actions = Arc::new(FakeActions {
        fail_chat: true,
        ..Default::default()
    });
    let wallet = Arc::new(FakeWallet::with_account("0.0.1234"));
    let mut app = connected_app(actions.clone(), None, wallet, temp_dir.path()).await;

    assert_eq!(app.send("send 5 hbar to 0.0.1234").await, TurnOutcome::Failed);
    assert_eq!(
        app.transcript().messages(),
        &[
            Message::user("send 5 hbar to 0.0.1234"),
            Message::assistant(GENERIC_ERROR_MESSAGE),
        ]
    );
    assert!(app.pending().is_none());
    assert_eq!(app.phase(), Phase::Idle);
    assert_eq!(actions.chat_count(), 1);
}

#[tokio::test]
async fn test_user_message_is_appended_before_the_response_arrives() {
    let actions = FakeActions {
        hang: true,
        ..Default::default()
    };
    let handler = TurnHandler::new(&actions, None);
    let account: AccountId = "0.0.1234".parse().unwrap();
    let mut transcript = Transcript::new();

    let turn = handler.handle_send(&mut transcript, Some(&account), "send 5 hbar", None);
    assert!(tokio::time::timeout(Duration::from_millis(50), turn).await.is_err());

    assert_eq!(transcript.messages(), &[Message::user("send 5 hbar")]);
    assert_eq!(actions.chat_count(), 1);
}

#[tokio::test]
async fn test_missing_account_is_rejected_without_network() {
    let temp_dir = tempdir().unwrap();
    let actions = Arc::new(FakeActions::default());
    let wallet = Arc::new(FakeWallet::with_account("0.0.1234"));
    let mut app = ChatApp::new(actions.clone(), None, wallet_session(wallet, temp_dir.path()));

    assert_eq!(app.send("send 5 hbar to 0.0.1234").await, TurnOutcome::Ignored);
    assert!(app.transcript().is_empty());
    assert_eq!(actions.chat_count(), 0);

    let notices = app.drain_notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].level, NoticeLevel::Error);
    assert_eq!(notices[0].text, "No account ID found");
}

#[tokio::test]
async fn test_blank_input_is_ignored() {
    let temp_dir = tempdir().unwrap();
    let actions = Arc::new(FakeActions::default());
    let wallet = Arc::new(FakeWallet::with_account("0.0.1234"));
    let mut app = connected_app(actions.clone(), None, wallet, temp_dir.path()).await;

    assert_eq!(app.send("   \n").await, TurnOutcome::Ignored);
    assert!(app.transcript().is_empty());
    assert!(app.drain_notices().is_empty());
    assert_eq!(actions.chat_count(), 0);
}

#[tokio::test]
async fn test_cancel_clears_pending_without_message() {
    let temp_dir = tempdir().unwrap();
    let actions = Arc::new(FakeActions::default());
    let wallet = Arc::new(FakeWallet::with_account("0.0.1234"));
    let mut app = connected_app(actions, None, wallet.clone(), temp_dir.path()).await;

    app.send("send 5 hbar to 0.0.1234").await;
    let before = app.transcript().len();

    app.cancel_transaction();
    assert!(app.pending().is_none());
    assert!(app.panel().is_none());
    assert_eq!(app.transcript().len(), before);
    assert_eq!(app.phase(), Phase::Idle);
    assert!(wallet.rpc_calls().is_empty());
}

#[tokio::test]
async fn test_sign_success_appends_explorer_link() {
    let temp_dir = tempdir().unwrap();
    let actions = Arc::new(FakeActions::default());
    let wallet = Arc::new(FakeWallet::with_account("0.0.1234"));
    let mut app = connected_app(actions, None, wallet.clone(), temp_dir.path()).await;

    app.send("send 5 hbar to 0.0.1234").await;
    assert!(app.sign_transaction().await);

    assert_eq!(
        app.transcript().last(),
        Some(&Message::url(
            "https://hashscan.io/testnet/transaction/0.0.1234@1700000000.000000001"
        ))
    );
    assert!(app.pending().is_none());
    assert_eq!(app.phase(), Phase::Idle);
    assert_eq!(
        wallet.rpc_calls(),
        vec![methods::SIGN_TRANSACTION, methods::EXECUTE_TRANSACTION]
    );

    let notices = app.drain_notices();
    assert_eq!(notices[0].level, NoticeLevel::Success);
    assert!(notices[0].text.contains("SUCCESS"));
}

#[tokio::test]
async fn test_sign_failure_keeps_transaction_for_retry() {
    let temp_dir = tempdir().unwrap();
    let actions = Arc::new(FakeActions::default());
    let wallet = Arc::new(FakeWallet {
        accounts: vec!["0.0.1234"],
        reject_signing: true,
        ..Default::default()
    });
    let mut app = connected_app(actions, None, wallet.clone(), temp_dir.path()).await;

    app.send("send 5 hbar to 0.0.1234").await;
    let before = app.transcript().len();
    assert!(!app.sign_transaction().await);

    assert!(app.pending().is_some());
    assert_eq!(app.phase(), Phase::AwaitingSignature);
    assert_eq!(app.transcript().len(), before + 1);
    assert_eq!(
        app.transcript().last(),
        Some(&Message::assistant(SIGN_FAILED_NOTICE))
    );
    assert_eq!(
        wallet.rpc_calls(),
        vec![methods::SIGN_TRANSACTION, methods::SIGN_AND_EXECUTE_TRANSACTION]
    );

    let notices = app.drain_notices();
    assert_eq!(notices[0].level, NoticeLevel::Error);
    assert_eq!(notices[0].text, SIGN_FAILED_NOTICE);
}

#[tokio::test]
async fn test_sign_without_pending_or_wallet_makes_no_call() {
    let temp_dir = tempdir().unwrap();
    let actions = Arc::new(FakeActions::default());
    let wallet = Arc::new(FakeWallet::with_account("0.0.1234"));
    let mut app = connected_app(actions, None, wallet.clone(), temp_dir.path()).await;

    // Connected, nothing pending.
    assert!(!app.sign_transaction().await);
    assert_eq!(app.drain_notices()[0].text, NO_SIGNER_NOTICE);

    // Pending, then the wallet goes away.
    app.send("send 5 hbar to 0.0.1234").await;
    app.disconnect_wallet().await;
    assert!(app.pending().is_none());
    assert!(!app.sign_transaction().await);

    let notices = app.drain_notices();
    assert_eq!(notices[0].level, NoticeLevel::Info);
    assert_eq!(notices[0].text, DISCONNECTED_NOTICE);
    assert_eq!(notices[1].text, NO_SIGNER_NOTICE);
    assert!(wallet.rpc_calls().is_empty());
}

#[tokio::test]
async fn test_new_transaction_replaces_pending_and_carries_context() {
    let temp_dir = tempdir().unwrap();
    let actions = Arc::new(FakeActions::default());
    let wallet = Arc::new(FakeWallet::with_account("0.0.1234"));
    let mut app = connected_app(actions.clone(), None, wallet, temp_dir.path()).await;

    app.send("send 5 hbar to 0.0.1234").await;
    let first = app.pending().cloned().unwrap();

    assert_eq!(first.fields["amount"], json!("5 HBAR"));

    app.send("transfer 10 hbar instead").await;
    let chat = actions.last_chat().unwrap();
    assert_eq!(chat.current_transaction.as_ref(), Some(&first));

    let mut second = TransactionPayload::new(TX_BYTES);
    second.merge(
        json!({ "transactionType": "TRANSFER", "amount": "10 HBAR" })
            .as_object()
            .cloned()
            .unwrap(),
    );
    assert_ne!(app.pending(), Some(&first));
    assert_eq!(app.pending(), Some(&second));
    assert_eq!(app.phase(), Phase::AwaitingSignature);
}

#[tokio::test]
async fn test_enrichment_merges_and_failure_keeps_raw_payload() {
    let temp_dir = tempdir().unwrap();
    let actions = Arc::new(FakeActions::default());
    let wallet = Arc::new(FakeWallet::with_account("0.0.1234"));

    let enricher: Arc<dyn TransactionEnricher> = Arc::new(FakeEnricher { fail: false });
    let mut app = connected_app(actions.clone(), Some(enricher), wallet.clone(), temp_dir.path()).await;
    app.send("send 5 hbar to 0.0.1234").await;
    let pending = app.pending().unwrap();
    assert_eq!(pending.fields["memo"], json!("lunch"));
    assert_eq!(pending.fields["amount"], json!("5 ℏ"));
    assert_eq!(pending.transaction_type(), Some("TRANSFER"));

    let enricher: Arc<dyn TransactionEnricher> = Arc::new(FakeEnricher { fail: true });
    let mut app = connected_app(actions, Some(enricher), wallet, temp_dir.path()).await;
    app.send("send 5 hbar to 0.0.1234").await;
    let pending = app.pending().unwrap();
    assert_eq!(pending.fields["amount"], json!("5 HBAR"));
    assert!(pending.fields.get("memo").is_none());
    assert_eq!(
        app.transcript().last(),
        Some(&Message::tool(TRANSACTION_PREPARED_MESSAGE))
    );
}

#[tokio::test]
async fn test_connect_persists_and_disconnect_forgets_account() {
    let temp_dir = tempdir().unwrap();
    let actions = Arc::new(FakeActions::default());
    let wallet = Arc::new(FakeWallet::with_account("0.0.1234"));
    let mut app = connected_app(actions, None, wallet, temp_dir.path()).await;

    let stored = |dir: &Path| -> Option<String> {
        let store = SessionStore::load_or_create(dir.join("local_storage.json")).unwrap();
        store.get(ACCOUNT_STORAGE_KEY).map(str::to_string)
    };
    assert_eq!(stored(temp_dir.path()).as_deref(), Some("0.0.1234"));
    assert!(app.wallet().is_connected());

    app.disconnect_wallet().await;
    assert!(!app.wallet().is_connected());
    assert!(stored(temp_dir.path()).is_none());
}

#[tokio::test]
async fn test_disconnect_clears_pending_when_forgetting_account_fails() {
    let temp_dir = tempdir().unwrap();
    let actions = Arc::new(FakeActions::default());
    let wallet = Arc::new(FakeWallet::with_account("0.0.1234"));
    let mut app = connected_app(actions, None, wallet.clone(), temp_dir.path()).await;

    app.send("send 5 hbar to 0.0.1234").await;
    assert!(app.pending().is_some());

    // A directory where the store writes its temp file makes the save fail.
    std::fs::create_dir(temp_dir.path().join("local_storage.tmp")).unwrap();
    app.disconnect_wallet().await;

    assert!(!app.wallet().is_connected());
    assert!(app.pending().is_none());
    assert!(app.panel().is_none());
    assert_eq!(app.phase(), Phase::Idle);
    assert!(wallet.calls().contains(&"disconnect_all".to_string()));

    let notices = app.drain_notices();
    assert_eq!(notices.len(), 2);
    assert_eq!(notices[0].level, NoticeLevel::Error);
    assert!(notices[0].text.starts_with("Wallet disconnect failed"));
    assert_eq!(notices[1].level, NoticeLevel::Info);
    assert_eq!(notices[1].text, DISCONNECTED_NOTICE);
}
