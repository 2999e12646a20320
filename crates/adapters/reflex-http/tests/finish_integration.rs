mod common;

use reflex_core::config::GameConfig;
use reflex_core::game::{Game, Task};
use reflex_core::report::{ReportOutcome, ResultPayload, RetryPolicy, SessionReporter};
use reflex_core::scheduler::VirtualScheduler;
use reflex_core::session::SessionId;
use reflex_core::surface::Bounds;
use reflex_core::test_helpers::{RecordingSurface, drive};

use common::{StoredResult, StubMode, TestServer, init_tracing};

const TOKEN: &str = "s3cr3t";

fn reporter(session: &str, token: Option<&str>, policy: RetryPolicy) -> SessionReporter {
    SessionReporter::new(
        SessionId::new(session),
        token.map(str::to_string),
        policy,
    )
}

fn retrying(max_attempts: u32) -> RetryPolicy {
    RetryPolicy {
        max_attempts,
        initial_backoff_ms: 5,
        max_backoff_ms: 20,
        ..RetryPolicy::default()
    }
}

#[tokio::test]
async fn delivered_result_redirects_and_is_scored() {
    init_tracing();
    let server = TestServer::new(TOKEN).await;
    let payload = ResultPayload {
        hits: 7,
        combos: 3,
        duration: 24.5,
    };

    let outcome = reporter("42", Some(TOKEN), RetryPolicy::default())
        .report(&server.service(), payload)
        .await;

    assert_eq!(outcome, ReportOutcome::Navigate("/results/42/".to_string()));
    // 7 * 10 + 3 * 5 + floor(30 - 24.5)
    assert_eq!(
        server.result("42"),
        Some(StoredResult {
            hits: 7,
            combos: 3,
            duration: 24.5,
            score: 90,
        })
    );
}

#[tokio::test]
async fn wrong_token_is_rejected_and_reloads() {
    init_tracing();
    let server = TestServer::new(TOKEN).await;
    let outcome = reporter("9", Some("forged"), retrying(3))
        .report(&server.service(), ResultPayload {
            hits: 1,
            combos: 0,
            duration: 30.0,
        })
        .await;

    assert_eq!(outcome, ReportOutcome::Reload);
    // A 403 is not worth retrying.
    assert_eq!(server.request_count(), 1);
    assert_eq!(server.result("9"), None);
}

#[tokio::test]
async fn missing_token_sends_no_header() {
    init_tracing();
    let server = TestServer::without_csrf().await;
    let outcome = reporter("5", None, RetryPolicy::default())
        .report(&server.service(), ResultPayload {
            hits: 0,
            combos: 0,
            duration: 30.0,
        })
        .await;
    assert_eq!(outcome, ReportOutcome::Navigate("/results/5/".to_string()));

    let guarded = TestServer::new(TOKEN).await;
    let outcome = reporter("5", None, RetryPolicy::default())
        .report(&guarded.service(), ResultPayload {
            hits: 0,
            combos: 0,
            duration: 30.0,
        })
        .await;
    assert_eq!(outcome, ReportOutcome::Reload);
}

#[tokio::test]
async fn garbage_body_reloads_without_retry() {
    init_tracing();
    let server = TestServer::with_mode(TOKEN, StubMode::Garbage).await;
    let outcome = reporter("3", Some(TOKEN), retrying(4))
        .report(&server.service(), ResultPayload {
            hits: 2,
            combos: 1,
            duration: 30.0,
        })
        .await;
    assert_eq!(outcome, ReportOutcome::Reload);
    assert_eq!(server.request_count(), 1);
}

#[tokio::test]
async fn server_errors_are_retried() {
    init_tracing();
    let server = TestServer::with_mode(TOKEN, StubMode::FailFirst(2)).await;
    let outcome = reporter("11", Some(TOKEN), retrying(3))
        .report(&server.service(), ResultPayload {
            hits: 4,
            combos: 0,
            duration: 30.0,
        })
        .await;
    assert_eq!(outcome, ReportOutcome::Navigate("/results/11/".to_string()));
    assert_eq!(server.request_count(), 3);
}

#[tokio::test]
async fn single_attempt_gives_up_on_server_error() {
    init_tracing();
    let server = TestServer::with_mode(TOKEN, StubMode::FailFirst(1)).await;
    let outcome = reporter("12", Some(TOKEN), RetryPolicy::default())
        .report(&server.service(), ResultPayload {
            hits: 4,
            combos: 0,
            duration: 30.0,
        })
        .await;
    assert_eq!(outcome, ReportOutcome::Reload);
    assert_eq!(server.request_count(), 1);
}

#[tokio::test]
async fn second_finish_is_not_a_redirect() {
    init_tracing();
    let server = TestServer::new(TOKEN).await;
    let payload = ResultPayload {
        hits: 3,
        combos: 1,
        duration: 30.0,
    };
    let first = reporter("77", Some(TOKEN), RetryPolicy::default())
        .report(&server.service(), payload)
        .await;
    let second = reporter("77", Some(TOKEN), RetryPolicy::default())
        .report(&server.service(), payload)
        .await;

    assert_eq!(first, ReportOutcome::Navigate("/results/77/".to_string()));
    assert_eq!(second, ReportOutcome::Reload);
    assert_eq!(server.result("77").map(|r| r.score), Some(35));
}

#[tokio::test]
async fn unreachable_service_reloads() {
    init_tracing();
    let service = reflex_http::HttpResultsService::new(reflex_http::HttpServiceConfig {
        // Nothing listens on port 9 of the loopback interface.
        base_url: "http://127.0.0.1:9".to_string(),
        timeout_secs: 2,
        ..reflex_http::HttpServiceConfig::default()
    })
    .unwrap();
    let outcome = reporter("1", Some(TOKEN), retrying(2))
        .report(&service, ResultPayload {
            hits: 0,
            combos: 0,
            duration: 30.0,
        })
        .await;
    assert_eq!(outcome, ReportOutcome::Reload);
}

#[tokio::test]
async fn played_session_reaches_the_service() {
    init_tracing();
    let server = TestServer::new(TOKEN).await;

    let config = GameConfig::default();
    let mut game = Game::new(SessionId::new("100"), config, 0.0, 7);
    let mut sched = VirtualScheduler::<Task>::with_frame_interval(0.0, 10.0);
    let mut surface = RecordingSurface::new(Bounds::new(640.0, 480.0));
    assert!(game.start(0.0, &mut sched, &mut surface).is_none());

    // Two hits 500 ms apart form one combo.
    assert!(drive(&mut game, &mut sched, &mut surface, 510.0).is_none());
    let first = game.live_targets().max().unwrap();
    assert!(game.hit(first, 510.0, &mut surface).is_some());
    assert!(drive(&mut game, &mut sched, &mut surface, 1010.0).is_none());
    let second = game.live_targets().max().unwrap();
    assert!(game.hit(second, 1010.0, &mut surface).is_some());

    let payload = drive(&mut game, &mut sched, &mut surface, 31_000.0)
        .expect("session should be over");
    assert_eq!((payload.hits, payload.combos), (2, 1));

    let outcome = reporter("100", Some(TOKEN), RetryPolicy::default())
        .report(&server.service(), payload)
        .await;
    assert_eq!(outcome, ReportOutcome::Navigate("/results/100/".to_string()));
    let stored = server.result("100").unwrap();
    assert_eq!(stored.score, 25);
}
