//! Dispatch Integration Tests
//!
//! End-to-end routing through the default registry with in-memory transports.

mod common;

use common::{
    drain, test_system, test_system_with, PanicOnceRelayer, RecordingRelayer, RevertingRelayer,
};
use rahat_core::actions::{ActingUser, ActionOutcome, ActionRequest};
use rahat_core::config::{PeerFailurePolicy, RahatConfig};
use rahat_core::constants::{actions, commands};
use rahat_core::events::ProjectEvent;
use rahat_core::messaging::MessagingError;
use rahat_core::orchestration::OrchestrationError;
use serde_json::json;
use std::sync::Arc;
use std::time::{Duration, Instant};
use uuid::Uuid;

#[tokio::test]
async fn test_settings_list_sends_subject_only_envelope() {
    let t = test_system();
    let subject = Uuid::new_v4();
    t.peer.respond_with(
        commands::PROJECT_SETTINGS_LIST,
        json!([{"name": "currency", "value": "NPR"}]),
    );

    let outcome = t
        .system
        .dispatcher
        .dispatch(ActionRequest::new(subject, actions::SETTINGS_LIST, json!({"ignored": true})))
        .await
        .unwrap();

    assert_eq!(
        outcome,
        ActionOutcome::Response(json!([{"name": "currency", "value": "NPR"}]))
    );

    let sent = t.peer.sent_envelopes();
    assert_eq!(sent.len(), 1);
    assert_eq!(
        sent[0].to_wire(),
        json!({"cmd": "PROJECT_SETTINGS_LIST", "subjectId": subject.to_string()})
    );
}

#[tokio::test]
async fn test_unknown_action_fails_with_exact_message() {
    let t = test_system();

    for action_id in ["", "SETTINGS.DELETE", "settings.list", "ELPROJECT"] {
        let err = t
            .system
            .dispatcher
            .dispatch(ActionRequest::new(Uuid::new_v4(), action_id, json!({})))
            .await
            .unwrap_err();
        assert_eq!(err, OrchestrationError::invalid_action(action_id));
        assert_eq!(err.to_string(), "Please provide a valid action!");
    }

    assert_eq!(t.peer.sent_count(), 0);
    assert_eq!(t.queue.pending_count(), 0);
}

#[tokio::test]
async fn test_every_base_action_reaches_its_peer_command() {
    let t = test_system();
    let routes = [
        (actions::SETTINGS_GET, commands::PROJECT_SETTINGS_GET),
        (actions::UPDATE_REDEMPTION, commands::UPDATE_REDEMPTION),
        (actions::LIST_REDEMPTION, commands::LIST_REDEMPTION),
        (actions::GET_VENDOR_REDEMPTION, commands::GET_VENDOR_REDEMPTION),
        (actions::GET_VENDOR_REFERRER, commands::BENEFICIARY_VENDOR_REFERRAL),
        (actions::BENEFICIARY_ADD_TO_PROJECT, commands::BENEFICIARY_ADD_TO_PROJECT),
        (actions::BENEFICIARY_ASSIGN_TO_PROJECT, commands::BENEFICIARY_ASSIGN_TO_PROJECT),
        (actions::BENEFICIARY_BULK_ASSIGN_TO_PROJECT, commands::BENEFICIARY_BULK_ASSIGN_TO_PROJECT),
        (actions::BENEFICIARY_BULK_REFER_TO_PROJECT, commands::BENEFICIARY_BULK_REFER_TO_PROJECT),
        (actions::BENEFICIARY_LIST_BY_PROJECT, commands::BENEFICIARY_LIST_BY_PROJECT),
        (actions::VENDOR_ASSIGN_TO_PROJECT, commands::VENDOR_ASSIGN_PROJECT),
        (actions::VENDOR_LIST_BY_PROJECT, commands::VENDOR_LIST_BY_PROJECT),
    ];

    for (action_id, command) in routes {
        t.peer.respond_with(command, json!({"served": command}));
        let outcome = t
            .system
            .dispatcher
            .dispatch(ActionRequest::new(Uuid::new_v4(), action_id, json!({"page": 1})))
            .await
            .unwrap();
        assert_eq!(outcome.response(), Some(&json!({"served": command})), "{action_id}");
    }

    let sent: Vec<String> = t.peer.sent_envelopes().into_iter().map(|e| e.cmd).collect();
    let expected: Vec<String> = routes.iter().map(|(_, cmd)| cmd.to_string()).collect();
    assert_eq!(sent, expected);
}

#[tokio::test]
async fn test_beneficiary_and_vendor_payload_shapes() {
    let t = test_system();
    let subject = Uuid::new_v4();
    t.peer.respond_with(commands::BENEFICIARY_ADD_TO_PROJECT, json!(null));
    t.peer.respond_with(commands::VENDOR_LIST_BY_PROJECT, json!([]));

    t.system
        .dispatcher
        .dispatch(ActionRequest::new(
            subject,
            actions::BENEFICIARY_ADD_TO_PROJECT,
            json!({"beneficiaryId": "b-1"}),
        ))
        .await
        .unwrap();
    t.system
        .dispatcher
        .dispatch(ActionRequest::new(
            subject,
            actions::VENDOR_LIST_BY_PROJECT,
            json!({"page": 2}),
        ))
        .await
        .unwrap();

    let sent = t.peer.sent_envelopes();
    assert_eq!(
        sent[0].to_wire(),
        json!({
            "cmd": "BENEFICIARY_ADD_TO_PROJECT",
            "dto": {"beneficiaryId": "b-1"},
            "projectUid": subject,
        })
    );
    assert_eq!(
        sent[1].to_wire(),
        json!({"cmd": "VENDOR_LIST_BY_PROJECT", "projectId": subject, "page": 2})
    );
}

#[tokio::test]
async fn test_meta_transaction_actions_never_reach_the_peer() {
    let t = test_system();
    let relayer = Arc::new(RecordingRelayer::default());
    let worker = t.system.start_worker(relayer.clone());

    // Peer answers for every command the EL table would have sent
    for command in [
        commands::REDEEM_VOUCHER,
        commands::PROCESS_OTP,
        commands::ASSIGN_DISCOUNT_VOUCHER,
        commands::REQUEST_REDEMPTION,
    ] {
        t.peer.respond_with(command, json!({"from": "peer"}));
    }

    for action_id in actions::META_TRANSACTION_ACTIONS {
        let outcome = t
            .system
            .dispatcher
            .dispatch(
                ActionRequest::new(Uuid::new_v4(), *action_id, json!({"voucher": 1}))
                    .with_trigger(json!({"source": "vendor-app"})),
            )
            .await
            .unwrap();
        let receipt = outcome.receipt().expect("settled receipt");
        assert_eq!(receipt.status, "success");
    }

    assert_eq!(t.peer.sent_count(), 0);
    assert_eq!(relayer.count(), 4);
    assert_eq!(worker.shutdown().await, 4);
}

#[tokio::test]
async fn test_redeem_voucher_announces_settlement() {
    let t = test_system();
    let mut events = t.system.publisher.subscribe();
    let worker = t.system.start_worker(Arc::new(RecordingRelayer::default()));
    let subject = Uuid::new_v4();

    let outcome = t
        .system
        .dispatcher
        .dispatch(ActionRequest::new(subject, actions::REDEEM_VOUCHER, json!({"otp": "9"})))
        .await
        .unwrap();
    let receipt = outcome.receipt().cloned().unwrap();

    let published = drain(&mut events);
    assert_eq!(published.len(), 1);
    assert_eq!(published[0].name, ProjectEvent::RedeemVoucher);
    assert_eq!(
        published[0].payload,
        json!({
            "subjectId": subject,
            "transactionHash": receipt.transaction_hash,
            "status": "success",
        })
    );

    // Other meta-transaction actions settle silently
    t.system
        .dispatcher
        .dispatch(ActionRequest::new(subject, actions::PROCESS_OTP, json!({})))
        .await
        .unwrap();
    assert!(drain(&mut events).is_empty());
    worker.shutdown().await;
}

#[tokio::test]
async fn test_request_redemption_announces_settlement() {
    let t = test_system();
    let mut events = t.system.publisher.subscribe();
    let worker = t.system.start_worker(Arc::new(RecordingRelayer::default()));
    let subject = Uuid::new_v4();

    let outcome = t
        .system
        .dispatcher
        .dispatch(ActionRequest::new(
            subject,
            actions::REQUEST_REDEMPTION,
            json!({"tokenAmount": 40}),
        ))
        .await
        .unwrap();
    let receipt = outcome.receipt().cloned().unwrap();

    let published = drain(&mut events);
    assert_eq!(published.len(), 1);
    assert_eq!(published[0].name, ProjectEvent::RequestRedemption);
    assert_eq!(published[0].payload["subjectId"], json!(subject));
    assert_eq!(
        published[0].payload["transactionHash"],
        json!(receipt.transaction_hash)
    );
    assert_eq!(t.peer.sent_count(), 0);
    worker.shutdown().await;
}

#[tokio::test]
async fn test_failed_settlement_is_reported() {
    let t = test_system();
    let worker = t.system.start_worker(Arc::new(RevertingRelayer));

    let err = t
        .system
        .dispatcher
        .dispatch(ActionRequest::new(
            Uuid::new_v4(),
            actions::ASSIGN_DISCOUNT_VOUCHER,
            json!({}),
        ))
        .await
        .unwrap_err();

    match err {
        OrchestrationError::TransactionFailed { message, .. } => {
            assert_eq!(message, "execution reverted")
        }
        other => panic!("unexpected error: {other:?}"),
    }
    worker.shutdown().await;
}

#[tokio::test]
async fn test_relayer_panic_fails_dispatch_and_worker_keeps_settling() {
    let t = test_system();
    let relayer = Arc::new(PanicOnceRelayer::default());
    let worker = t.system.start_worker(relayer.clone());

    let first = tokio::time::timeout(
        Duration::from_secs(5),
        t.system.dispatcher.dispatch(ActionRequest::new(
            Uuid::new_v4(),
            actions::REDEEM_VOUCHER,
            json!({"voucher": 1}),
        )),
    )
    .await
    .expect("dispatch resolves after a relayer panic");
    match first {
        Err(OrchestrationError::TransactionFailed { message, .. }) => {
            assert!(message.contains("relayer lost its signer"), "{message}")
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert_eq!(t.queue.in_flight_count(), 0);

    let second = tokio::time::timeout(
        Duration::from_secs(5),
        t.system.dispatcher.dispatch(ActionRequest::new(
            Uuid::new_v4(),
            actions::REDEEM_VOUCHER,
            json!({"voucher": 2}),
        )),
    )
    .await
    .expect("worker survives the panic")
    .unwrap();
    assert!(second.receipt().is_some());
    assert_eq!(relayer.settled.count(), 1);
    assert_eq!(t.queue.pending_count(), 0);

    assert_eq!(worker.shutdown().await, 2);
}

#[tokio::test]
async fn test_closed_queue_fails_the_dispatch() {
    let t = test_system();
    t.queue.close();

    let err = t
        .system
        .dispatcher
        .dispatch(ActionRequest::new(Uuid::new_v4(), actions::REDEEM_VOUCHER, json!({})))
        .await
        .unwrap_err();
    assert!(matches!(err, OrchestrationError::QueueUnavailable { .. }));
}

#[tokio::test]
async fn test_peer_that_never_answers_is_bounded_by_configured_timeout() {
    let mut config = RahatConfig::default();
    config.dispatch.default_timeout_ms = 40;
    config
        .dispatch
        .action_timeouts
        .insert(actions::LIST_REDEMPTION.to_string(), 60);
    let t = test_system_with(config);

    for command in [commands::PROJECT_SETTINGS_LIST, commands::LIST_REDEMPTION] {
        t.peer.register(command, |_| async {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(json!({}))
        });
    }

    let started = Instant::now();
    let err = t
        .system
        .dispatcher
        .dispatch(ActionRequest::new(Uuid::new_v4(), actions::SETTINGS_LIST, json!({})))
        .await
        .unwrap_err();
    assert_eq!(err, OrchestrationError::peer_timeout(commands::PROJECT_SETTINGS_LIST, 40));

    // The configured override beats the 500000 ms the table declares
    let err = t
        .system
        .dispatcher
        .dispatch(ActionRequest::new(Uuid::new_v4(), actions::LIST_REDEMPTION, json!({})))
        .await
        .unwrap_err();
    assert_eq!(err, OrchestrationError::peer_timeout(commands::LIST_REDEMPTION, 60));
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn test_transport_timeout_is_propagated_under_suppress_policy() {
    let t = test_system();
    t.peer.register(commands::PROJECT_SETTINGS_LIST, |_| async {
        Err(MessagingError::peer_timeout(commands::PROJECT_SETTINGS_LIST, 10))
    });

    let err = t
        .system
        .dispatcher
        .dispatch(ActionRequest::new(Uuid::new_v4(), actions::SETTINGS_LIST, json!({})))
        .await
        .unwrap_err();
    assert!(matches!(err, OrchestrationError::PeerTimeout { .. }));
}

#[tokio::test]
async fn test_peer_failure_follows_configured_policy() {
    let failing = |t: &common::TestSystem| {
        t.peer.register(commands::VENDOR_LIST_BY_PROJECT, |_| async {
            Err(MessagingError::peer_failure(
                commands::VENDOR_LIST_BY_PROJECT,
                "vendor service unavailable",
            ))
        });
    };

    let lenient = test_system();
    failing(&lenient);
    let outcome = lenient
        .system
        .dispatcher
        .dispatch(ActionRequest::new(Uuid::new_v4(), actions::VENDOR_LIST_BY_PROJECT, json!({})))
        .await
        .unwrap();
    assert!(outcome.is_suppressed());
    assert_eq!(outcome.into_value(), None);

    let mut config = RahatConfig::default();
    config.dispatch.peer_failure_policy = PeerFailurePolicy::Propagate;
    let strict = test_system_with(config);
    failing(&strict);
    let err = strict
        .system
        .dispatcher
        .dispatch(ActionRequest::new(Uuid::new_v4(), actions::VENDOR_LIST_BY_PROJECT, json!({})))
        .await
        .unwrap_err();
    assert!(matches!(err, OrchestrationError::PeerError { .. }));
}

#[tokio::test]
async fn test_unanswered_command_is_a_peer_failure() {
    let t = test_system();
    let outcome = t
        .system
        .dispatcher
        .dispatch(ActionRequest::new(Uuid::new_v4(), actions::SETTINGS_GET, json!({})))
        .await
        .unwrap();
    assert!(outcome.is_suppressed());
}

#[tokio::test]
async fn test_acting_user_travels_with_user_required_actions() {
    let t = test_system();
    t.peer.respond_with(commands::UPDATE_REDEMPTION, json!({"ok": true}));
    t.peer.respond_with(commands::LIST_REDEMPTION, json!([]));
    let user = ActingUser::new(Uuid::new_v4())
        .with_name("Program Officer")
        .with_wallet("0xfeed");

    for action_id in [actions::UPDATE_REDEMPTION, actions::LIST_REDEMPTION] {
        t.system
            .dispatcher
            .dispatch(
                ActionRequest::new(Uuid::new_v4(), action_id, json!({"uuid": "r-1"}))
                    .with_acting_user(user.clone()),
            )
            .await
            .unwrap();
    }

    let sent = t.peer.sent_envelopes();
    assert_eq!(
        sent[0].payload["user"],
        json!({"uuid": user.uuid, "name": "Program Officer", "wallet": "0xfeed"})
    );
    assert_eq!(sent[0].payload["uuid"], "r-1");
    assert!(sent[1].payload.get("user").is_none());
}

#[tokio::test]
async fn test_identical_dispatches_are_independent() {
    let t = test_system();
    t.peer.respond_with(commands::BENEFICIARY_LIST_BY_PROJECT, json!({"total": 3}));
    let request = ActionRequest::new(
        Uuid::new_v4(),
        actions::BENEFICIARY_LIST_BY_PROJECT,
        json!({"page": 1, "perPage": 20}),
    );

    let first = t.system.dispatcher.dispatch(request.clone()).await.unwrap();
    let second = t.system.dispatcher.dispatch(request).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(t.peer.sent_count(), 2);
}

#[tokio::test]
async fn test_concurrent_dispatches_share_transports() {
    let t = test_system();
    t.peer.register(commands::PROJECT_SETTINGS_GET, |envelope| async move {
        tokio::time::sleep(Duration::from_millis(10)).await;
        Ok(json!({"key": envelope.payload["key"].clone()}))
    });

    let dispatcher = Arc::clone(&t.system.dispatcher);
    let tasks: Vec<_> = (0..16)
        .map(|i| {
            let dispatcher = Arc::clone(&dispatcher);
            tokio::spawn(async move {
                dispatcher
                    .dispatch(ActionRequest::new(
                        Uuid::new_v4(),
                        actions::SETTINGS_GET,
                        json!({"key": i}),
                    ))
                    .await
            })
        })
        .collect();

    for (i, task) in tasks.into_iter().enumerate() {
        let outcome = task.await.unwrap().unwrap();
        assert_eq!(outcome.response(), Some(&json!({"key": i})));
    }
    assert_eq!(t.peer.sent_count(), 16);
}
