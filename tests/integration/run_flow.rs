//! End-to-end runs against the scripted transport.
//!
//! Each test writes a configuration file, runs the orchestrator over it,
//! persists, and checks requests, logs and the rewritten file.

use serde_json::json;
use std::path::PathBuf;
use std::time::Duration;
use uuid::Uuid;

use citybox::api::sign::SignInOutcome;
use citybox::engine::{AccountOutcome, Citybox};
use citybox::storage::AccountStore;
use citybox::types::CityboxError;

use crate::log_capture::CapturedLogs;
use crate::mock_transport::ScriptedTransport;

const USER_INFO: &str = "https://citybox.test/user/info";
const SIGN: &str = "https://citybox.test/sign";
const ROULETTE: &str = "https://citybox.test/roulette";
const LOTTERY_INFO: &str = "https://citybox.test/lottery/info";
const LOTTERY_JOIN: &str = "https://citybox.test/lottery/join";
const LOTTERY_LOG: &str = "https://citybox.test/lottery/log";
const LOTTERY_RECEIVE: &str = "https://citybox.test/lottery/receive";
const COUPON_LIST: &str = "https://citybox.test/coupon/list";

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

struct TempConf(PathBuf);

impl TempConf {
    fn write(accounts: serde_json::Value, check_coupon: bool) -> Self {
        let mut p = std::env::temp_dir();
        p.push(format!("citybox_it_conf_{}.json", Uuid::new_v4()));

        let doc = json!({
            "HEADER": {"User-Agent": "citybox-it"},
            "GET_USER_INFO_URL": USER_INFO,
            "SIGN_URL": SIGN,
            "ROULETTE_URL": ROULETTE,
            "LOTTERY_INFO_URL": LOTTERY_INFO,
            "LOTTERY_URL": LOTTERY_JOIN,
            "LOTTERY_LOG_URL": LOTTERY_LOG,
            "LOTTERY_RECEIVE_URL": LOTTERY_RECEIVE,
            "COUPON_LIST_URL": COUPON_LIST,
            "CHECK_COUPON": check_coupon,
            "ACCOUNT_INFO": accounts,
        });
        std::fs::write(&p, serde_json::to_string_pretty(&doc).unwrap()).unwrap();
        Self(p)
    }

    fn reload(&self) -> serde_json::Value {
        serde_json::from_str(&std::fs::read_to_string(&self.0).unwrap()).unwrap()
    }
}

impl Drop for TempConf {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.0);
    }
}

fn orchestrator_for(conf: &TempConf, transport: &ScriptedTransport) -> Citybox {
    let store = AccountStore::load(&conf.0).unwrap();
    Citybox::new(store, Box::new(transport.clone())).with_pause(Duration::ZERO)
}

/// Quiet responses for every engagement endpoint.
fn script_engagement_defaults(transport: &ScriptedTransport) {
    transport
        .respond(ROULETTE, 400, r#"{"message": "今日抽奖次数已用完"}"#)
        .respond(LOTTERY_LOG, 200, "[]")
        .respond(LOTTERY_INFO, 200, "[]");
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_signin_and_balance_delta() {
    let (logs, _guard) = CapturedLogs::install();
    let conf = TempConf::write(json!({"alice": {"token": "tok-a", "hassign": 0}}), false);

    let transport = ScriptedTransport::new();
    transport
        .respond(USER_INFO, 200, r#"{"modou": 100, "last_update": "2026-10-17", "hassign": 0}"#)
        .respond(USER_INFO, 200, r#"{"modou": 110, "last_update": "2026-10-18", "hassign": 1}"#)
        .respond(SIGN, 200, r#"{"qmodou": 5}"#);
    script_engagement_defaults(&transport);

    let mut citybox = orchestrator_for(&conf, &transport);
    let report = citybox.collect_modou(Uuid::new_v4()).await;
    citybox.persist().unwrap();

    let alice = report.account("alice").unwrap();
    assert_eq!(alice.outcome, AccountOutcome::Completed);
    assert_eq!(alice.sign_in, Some(SignInOutcome::Signed { qmodou: 5 }));
    assert_eq!(alice.difference, 10);

    assert_eq!(logs.count("INFO", "Sign in successful"), 1);
    assert_eq!(logs.count("INFO", "Modou balance reconciled"), 1);

    let saved = conf.reload();
    let state = &saved["ACCOUNT_INFO"]["alice"];
    assert_eq!(state["last_modou"], 100);
    assert_eq!(state["current_modou"], 110);
    assert_eq!(state["difference"], 10);
    assert_eq!(state["last_sign"], "2026-10-17");
    assert_eq!(state["token_expire"], false);
}

#[tokio::test]
async fn test_expired_token_skips_account() {
    let (logs, _guard) = CapturedLogs::install();
    let conf = TempConf::write(
        json!({
            "alice": {"token": "tok-a", "last_modou": 80},
            "bob": {"token": "tok-b"}
        }),
        true,
    );

    let transport = ScriptedTransport::new();
    // alice is processed first and gets the 401.
    transport
        .respond(USER_INFO, 401, r#"{"message": "Unauthorized"}"#)
        .respond(USER_INFO, 200, r#"{"modou": 40, "last_update": "2026-10-18", "hassign": 1}"#)
        .respond(COUPON_LIST, 200, "[]");
    script_engagement_defaults(&transport);

    let mut citybox = orchestrator_for(&conf, &transport);
    let report = citybox.collect_modou(Uuid::new_v4()).await;
    citybox.persist().unwrap();

    // Only the status check went out for alice.
    let alice_requests = transport.requests_for("tok-a");
    assert_eq!(alice_requests.len(), 1);
    assert_eq!(alice_requests[0].url, USER_INFO);
    assert_eq!(logs.count_for_account("WARN", "alice"), 1);

    // bob still ran the whole sequence.
    assert!(report.account("bob").unwrap().is_completed());
    assert_eq!(transport.count("tok-b", ROULETTE), 2);
    assert_eq!(transport.count("tok-b", COUPON_LIST), 1);

    let saved = conf.reload();
    assert_eq!(saved["ACCOUNT_INFO"]["alice"]["token_expire"], true);
    assert_eq!(saved["ACCOUNT_INFO"]["alice"]["last_modou"], 80);
    assert_eq!(saved["ACCOUNT_INFO"]["bob"]["token_expire"], false);
}

#[tokio::test]
async fn test_missing_configuration_aborts_before_any_request() {
    let mut path = std::env::temp_dir();
    path.push(format!("citybox_it_absent_{}.json", Uuid::new_v4()));

    let transport = ScriptedTransport::new();
    match AccountStore::load(&path) {
        Err(CityboxError::ConfigMissing { path: reported }) => {
            assert!(reported.contains("citybox_it_absent_"))
        }
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("load should fail without a configuration file"),
    }
    assert!(transport.requests().is_empty());
    assert!(!path.exists());
}

#[tokio::test]
async fn test_signin_skipped_when_already_signed() {
    let conf = TempConf::write(json!({"alice": {"token": "tok-a"}}), false);

    let transport = ScriptedTransport::new();
    transport.respond(
        USER_INFO,
        200,
        r#"{"modou": "300", "last_update": "2026-10-18", "hassign": "1"}"#,
    );
    script_engagement_defaults(&transport);

    let mut citybox = orchestrator_for(&conf, &transport);
    let report = citybox.collect_modou(Uuid::new_v4()).await;

    let alice = report.account("alice").unwrap();
    assert_eq!(alice.sign_in, Some(SignInOutcome::AlreadySigned));
    assert_eq!(transport.count("tok-a", SIGN), 0);
    assert_eq!(alice.difference, 0);
}

#[tokio::test]
async fn test_roulette_attempted_twice_regardless_of_outcome() {
    let conf = TempConf::write(json!({"alice": {"token": "tok-a", "cookie": {"sid": "s-1"}}}), false);

    let transport = ScriptedTransport::new();
    transport
        .respond(USER_INFO, 200, r#"{"modou": 10, "last_update": "", "hassign": 1}"#)
        .respond(ROULETTE, 200, r#"{"winning_desc": "5魔豆"}"#)
        .respond(ROULETTE, 400, r#"{"message": "今日抽奖次数已用完"}"#)
        .respond(LOTTERY_LOG, 200, "[]")
        .respond(LOTTERY_INFO, 200, "[]");

    let mut citybox = orchestrator_for(&conf, &transport);
    let report = citybox.collect_modou(Uuid::new_v4()).await;

    let alice = report.account("alice").unwrap();
    assert_eq!(alice.spins, vec![Some("5魔豆".to_string()), None]);

    let spins: Vec<_> = transport
        .requests_for("tok-a")
        .into_iter()
        .filter(|r| r.url == ROULETTE)
        .collect();
    assert_eq!(spins.len(), 2);
    for spin in spins {
        assert_eq!(spin.cookies.get("sid").map(String::as_str), Some("s-1"));
        assert_eq!(spin.cookies.get("token").map(String::as_str), Some("tok-a"));
    }
}

#[tokio::test]
async fn test_lottery_claim_and_join_rules() {
    let (logs, _guard) = CapturedLogs::install();
    let conf = TempConf::write(json!({"alice": {"token": "tok-a", "hassign": 1}}), false);

    let transport = ScriptedTransport::new();
    transport
        .respond(USER_INFO, 200, r#"{"modou": 10, "last_update": "2026-10-18", "hassign": 1}"#)
        .respond(ROULETTE, 400, r#"{"message": "no spins"}"#)
        // lost entries, then won entries
        .respond(LOTTERY_LOG, 200, r#"[{"log_id": "l1"}]"#)
        .respond(
            LOTTERY_LOG,
            200,
            r#"[
                {"name": "5元券", "log_id": "w1", "lottery_status": "2", "delivery_status": "1", "expire_state": 1},
                {"name": "已发货", "log_id": "w2", "lottery_status": "2", "delivery_status": "2", "expire_state": 1},
                {"name": "已过期", "log_id": "w3", "lottery_status": "2", "delivery_status": "1", "expire_state": 2}
            ]"#,
        )
        .respond(LOTTERY_RECEIVE, 200, r#""领取成功""#)
        .respond(
            LOTTERY_INFO,
            200,
            r#"[
                {"name": "100积分大抽奖", "is_join": 0, "lottery_id": 501},
                {"name": "无门槛红包", "is_join": 1, "lottery_id": 502},
                {"name": "新款手机", "is_join": 0, "lottery_id": 503}
            ]"#,
        )
        .respond(LOTTERY_JOIN, 200, r#""参与成功""#);

    let mut citybox = orchestrator_for(&conf, &transport);
    let report = citybox.collect_modou(Uuid::new_v4()).await;
    let alice = report.account("alice").unwrap();

    let claims: Vec<_> = transport
        .requests()
        .into_iter()
        .filter(|r| r.url == LOTTERY_RECEIVE)
        .collect();
    assert_eq!(claims.len(), 1);
    assert_eq!(claims[0].query, vec![("log_id".to_string(), "w1".to_string())]);

    let joins: Vec<_> = transport
        .requests()
        .into_iter()
        .filter(|r| r.url == LOTTERY_JOIN)
        .collect();
    assert_eq!(joins.len(), 1);
    assert_eq!(joins[0].form, vec![("lottery_id".to_string(), "501".to_string())]);

    let log = alice.lottery_log.as_ref().unwrap();
    assert_eq!(log.total, 4);
    assert_eq!(log.won, 3);
    assert_eq!(log.claimed(), 1);
    assert_eq!(alice.lottery_join.as_ref().unwrap().joined, vec!["100积分大抽奖"]);

    // The per-prize claim listing reaches the console level.
    assert_eq!(logs.count("INFO", "Citybox Account alice:"), 1);
    assert!(logs.lines().iter().any(|l| l.contains("5元券 w1")));
}

#[tokio::test]
async fn test_transport_failures_do_not_abort_sequence() {
    let conf = TempConf::write(json!({"alice": {"token": "tok-a"}}), false);

    let transport = ScriptedTransport::new();
    transport
        .respond(USER_INFO, 200, r#"{"modou": 60, "last_update": "2026-10-17", "hassign": 0}"#)
        .respond(USER_INFO, 200, r#"{"modou": 55, "last_update": "2026-10-17", "hassign": 0}"#)
        .fail(SIGN, "connection reset by peer")
        .fail(ROULETTE, "timed out")
        .respond(LOTTERY_LOG, 502, "")
        .fail(LOTTERY_INFO, "timed out");

    let mut citybox = orchestrator_for(&conf, &transport);
    let report = citybox.collect_modou(Uuid::new_v4()).await;

    let alice = report.account("alice").unwrap();
    assert!(alice.is_completed());
    assert_eq!(alice.sign_in, Some(SignInOutcome::Failed));
    assert_eq!(transport.count("tok-a", ROULETTE), 2);
    assert_eq!(transport.count("tok-a", LOTTERY_INFO), 1);
    assert_eq!(alice.difference, -5);
}

#[tokio::test]
async fn test_balance_check_is_idempotent() {
    let conf = TempConf::write(json!({"alice": {"token": "tok-a"}}), false);
    let transport = ScriptedTransport::new();
    transport.respond(USER_INFO, 200, r#"{"modou": 420, "last_update": "", "hassign": 1}"#);

    let store = AccountStore::load(&conf.0).unwrap();
    let endpoints = store.config().endpoints();
    let creds = citybox::auth::SessionProvider::new(&store)
        .credentials("alice", false)
        .unwrap();
    let api = citybox::api::CityboxApi::new(&transport, &endpoints);

    let first = api.check_balance("alice", &creds).await;
    let second = api.check_balance("alice", &creds).await;
    assert_eq!(first, 420);
    assert_eq!(first, second);
}
