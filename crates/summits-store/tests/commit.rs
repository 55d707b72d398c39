//! Optimistic commit behaviour against ledger doubles

use pretty_assertions::assert_eq;
use std::sync::Arc;
use summits_model::{
    Aspect, AimUpdate, FlowUpdate, Permissions, TokenTrade, DEFAULT_FLOW_WEIGHT,
};
use summits_store::{Ledger, LedgerError, Selection, Severity, StoreError};
use summits_test_utils::{
    account, address, empty_ledger, network_over, sample_ledger, FailingLedger, GatedLedger,
};

#[tokio::test]
async fn data_commit_settles_and_reaches_ledger() {
    let ledger = sample_ledger();
    let net = network_over(ledger.clone());
    let home = net.load_home(0).await.unwrap();

    net.update_aim(home, AimUpdate::Title("summit".into())).unwrap();
    net.update_aim(home, AimUpdate::LoopWeight(10)).unwrap();
    let aim = net.aim(home).unwrap();
    assert_eq!(aim.data_origin().title.as_deref(), Some("home"));
    assert_eq!(aim.data_updates().fields(), vec!["title", "loop_weight"]);

    net.commit_aim_changes(home).await.unwrap();

    let aim = net.aim(home).unwrap();
    assert!(aim.data_origin().is_empty());
    assert!(!aim.pending().is_pending(Aspect::Data));
    assert!(net.changes().is_empty());

    let record = ledger.fetch_aim(&address(1)).await.unwrap();
    assert_eq!(record.title, "summit");
    assert_eq!(record.loop_weight, 10);
}

#[tokio::test]
async fn reset_restores_remote_values() {
    let net = network_over(sample_ledger());
    let home = net.load_home(0).await.unwrap();

    net.update_aim(home, AimUpdate::Title("draft".into())).unwrap();
    net.reset_aim_changes(home).unwrap();

    let aim = net.aim(home).unwrap();
    assert_eq!(aim.title(), "home");
    assert!(!aim.has_data_changes());
}

#[tokio::test]
async fn second_commit_while_in_flight_is_rejected() {
    let gated = Arc::new(GatedLedger::new(sample_ledger()));
    let net = Arc::new(network_over(gated.clone()));
    let home = net.load_home(0).await.unwrap();

    net.update_aim(home, AimUpdate::Title("first".into())).unwrap();
    let first = {
        let net = net.clone();
        tokio::spawn(async move { net.commit_aim_changes(home).await })
    };
    gated.entered(1).await;
    assert!(net.aim(home).unwrap().pending().is_pending(Aspect::Data));

    // edits keep working while the commit is out
    net.update_aim(home, AimUpdate::Title("second".into())).unwrap();
    let err = net.commit_aim_changes(home).await.unwrap_err();
    assert!(matches!(
        err,
        StoreError::CommitInFlight {
            aspect: Aspect::Data,
            ..
        }
    ));
    assert!(err.is_retryable());

    gated.release(1);
    first.await.unwrap().unwrap();

    let aim = net.aim(home).unwrap();
    assert_eq!(aim.title(), "second");
    assert_eq!(aim.data_origin().title.as_deref(), Some("first"));
    assert!(!aim.pending().is_pending(Aspect::Data));
    assert_eq!(gated.writes(), 1);
}

#[tokio::test]
async fn different_aspects_commit_concurrently() {
    let gated = Arc::new(GatedLedger::new(sample_ledger()));
    let net = Arc::new(network_over(gated.clone()));
    let home = net.load_home(0).await.unwrap();

    net.update_aim(home, AimUpdate::Title("t".into())).unwrap();
    net.set_tokens(home, 5).unwrap();

    let data = {
        let net = net.clone();
        tokio::spawn(async move { net.commit_aim_changes(home).await })
    };
    gated.entered(1).await;
    let tokens = {
        let net = net.clone();
        tokio::spawn(async move { net.commit_token_changes(home).await })
    };
    gated.entered(2).await;

    let pending = net.aim(home).unwrap().pending();
    assert!(pending.is_pending(Aspect::Data));
    assert!(pending.is_pending(Aspect::Investment));

    gated.open();
    data.await.unwrap().unwrap();
    tokens.await.unwrap().unwrap();
    assert!(!net.aim(home).unwrap().has_pending_transactions());
    assert!(net.changes().is_empty());
}

#[tokio::test]
async fn failed_commit_keeps_staged_values() {
    let failing = Arc::new(FailingLedger::new(sample_ledger()));
    let net = network_over(failing.clone());
    let home = net.load_home(0).await.unwrap();

    net.update_aim(home, AimUpdate::Title("lost?".into())).unwrap();
    let err = net.commit_aim_changes(home).await.unwrap_err();
    assert!(matches!(err, StoreError::Ledger(LedgerError::Provider(_))));

    let aim = net.aim(home).unwrap();
    assert_eq!(aim.title(), "lost?");
    assert_eq!(aim.data_origin().title.as_deref(), Some("home"));
    assert!(!aim.has_pending_transactions());

    let errors = net.activity().at_least(Severity::Error);
    assert_eq!(errors.len(), 1);
    assert!(errors[0].message.contains("connection reset"));

    failing.set_failing(false);
    net.commit_aim_changes(home).await.unwrap();
    assert!(net.changes().is_empty());
    let record = failing.inner().fetch_aim(&address(1)).await.unwrap();
    assert_eq!(record.title, "lost?");
}

#[tokio::test]
async fn token_trade_follows_staged_holding() {
    let ledger = sample_ledger();
    let net = network_over(ledger.clone());
    let home = net.load_home(0).await.unwrap();

    net.set_tokens(home, 400).unwrap();
    let aim = net.aim(home).unwrap();
    assert_eq!(aim.token_trade(), Some(TokenTrade::Buy(400)));
    assert!(aim.r() > 0.0);

    net.commit_token_changes(home).await.unwrap();
    let aim = net.aim(home).unwrap();
    assert_eq!(aim.chain_tokens(), 400);
    assert_eq!(aim.total_supply(), 400);
    assert_eq!(aim.token_trade(), None);

    net.set_tokens(home, 100).unwrap();
    net.commit_token_changes(home).await.unwrap();
    let record = ledger.fetch_aim(&address(1)).await.unwrap();
    assert_eq!(record.tokens, 100);
    assert_eq!(record.total_supply, 100);
}

#[tokio::test]
async fn member_changes_commit_in_one_call() {
    let ledger = sample_ledger();
    let net = network_over(ledger.clone());
    let home = net.load_home(0).await.unwrap();

    net.set_member_permissions(home, address(7), Permissions::EDIT)
        .unwrap();
    net.set_member_permissions(home, address(8), Permissions::EDIT | Permissions::NETWORK)
        .unwrap();
    assert_eq!(net.aim(home).unwrap().member_updates().len(), 2);

    net.commit_member_changes(home).await.unwrap();
    assert!(!net.aim(home).unwrap().has_member_changes());

    let record = ledger.fetch_aim(&address(1)).await.unwrap();
    assert!(record
        .members
        .contains(&(address(8), Permissions::EDIT | Permissions::NETWORK)));
}

#[tokio::test]
async fn transfer_requires_ownership() {
    let ledger = sample_ledger();
    let net = network_over(ledger.clone());
    let home = net.load_home(0).await.unwrap();

    net.transfer_aim(home, address(9)).await.unwrap();
    assert!(!net.aim(home).unwrap().permissions.contains(Permissions::OWNER));

    let err = net.transfer_aim(home, address(9)).await.unwrap_err();
    assert!(matches!(err, StoreError::PermissionDenied(_)));
    assert!(err.is_rejection());
}

#[tokio::test]
async fn unpublished_aims_cannot_trade() {
    let net = network_over(empty_ledger());
    let id = net.create_and_select_aim(|_| {});
    net.set_tokens(id, 3).unwrap();

    let err = net.commit_token_changes(id).await.unwrap_err();
    assert!(matches!(err, StoreError::NotPublished(_)));
    // data of unpublished aims goes out with publish
    net.commit_aim_changes(id).await.unwrap();
}

#[tokio::test]
async fn local_graph_publishes_and_confirms() {
    let ledger = empty_ledger();
    let net = network_over(ledger.clone());

    let a = net.create_and_select_aim(|_| {});
    let b = net.create_and_select_aim(|_| {});
    net.update_aim(a, AimUpdate::Title("a".into())).unwrap();
    let key = net.create_and_select_flow(a, b).unwrap();
    assert_eq!(net.selection(), Selection::Flow(key));
    net.update_flow(key, FlowUpdate::Explanation("because".into()))
        .unwrap();

    let err = net.publish_flow(key).await.unwrap_err();
    assert!(matches!(err, StoreError::NotPublished(_)));

    let from = net.publish_aim(a).await.unwrap();
    let into = net.publish_aim(b).await.unwrap();
    net.publish_flow(key).await.unwrap();
    assert!(net.flow(key).unwrap().is_published());
    assert!(!net.flow(key).unwrap().is_modified());

    net.update_flow(key, FlowUpdate::Weight(9)).unwrap();
    net.commit_flow_changes(key).await.unwrap();
    net.set_flow_confirmation(key, true).await.unwrap();
    assert!(net.flow(key).unwrap().is_confirmed());

    let record = ledger.fetch_flow(&from, &into).await.unwrap();
    assert_eq!(record.explanation, "because");
    assert_eq!(record.weight, 9);
    assert!(record.confirmed);
    assert_eq!(ledger.account(), &account());
}

#[tokio::test]
async fn edit_during_aim_publish_stays_staged() {
    let ledger = empty_ledger();
    let gated = Arc::new(GatedLedger::new(ledger.clone()));
    let net = Arc::new(network_over(gated.clone()));
    let id = net.create_and_select_aim(|_| {});
    net.update_aim(id, AimUpdate::Title("draft".into())).unwrap();

    let publish = {
        let net = net.clone();
        tokio::spawn(async move { net.publish_aim(id).await })
    };
    gated.entered(1).await;
    net.update_aim(id, AimUpdate::Title("edited".into())).unwrap();
    let err = net.commit_aim_changes(id).await.unwrap_err();
    assert!(matches!(
        err,
        StoreError::CommitInFlight {
            aspect: Aspect::Creation,
            ..
        }
    ));

    gated.release(1);
    let address = publish.await.unwrap().unwrap();

    let aim = net.aim(id).unwrap();
    assert_eq!(aim.title(), "edited");
    assert_eq!(aim.data_origin().title.as_deref(), Some("draft"));
    assert!(aim.has_data_changes());
    assert_eq!(net.changes().len(), 1);
    assert_eq!(ledger.fetch_aim(&address).await.unwrap().title, "draft");

    gated.open();
    net.commit_aim_changes(id).await.unwrap();
    assert!(net.changes().is_empty());
    assert_eq!(ledger.fetch_aim(&address).await.unwrap().title, "edited");
}

#[tokio::test]
async fn edit_during_flow_publish_stays_staged() {
    let ledger = empty_ledger();
    let gated = Arc::new(GatedLedger::new(ledger.clone()));
    let net = Arc::new(network_over(gated.clone()));
    let a = net.create_and_select_aim(|_| {});
    let b = net.create_and_select_aim(|_| {});
    gated.release(2);
    let from = net.publish_aim(a).await.unwrap();
    let into = net.publish_aim(b).await.unwrap();
    let key = net.create_flow(a, b).unwrap();

    let publish = {
        let net = net.clone();
        tokio::spawn(async move { net.publish_flow(key).await })
    };
    gated.entered(3).await;
    net.update_flow(key, FlowUpdate::Weight(5)).unwrap();
    let err = net.commit_flow_changes(key).await.unwrap_err();
    assert!(matches!(
        err,
        StoreError::CommitInFlight {
            aspect: Aspect::Creation,
            ..
        }
    ));

    gated.release(1);
    publish.await.unwrap().unwrap();

    let flow = net.flow(key).unwrap();
    assert!(flow.is_published());
    assert_eq!(flow.weight(), 5);
    assert_eq!(flow.weight_origin(), Some(DEFAULT_FLOW_WEIGHT));
    assert!(flow.is_modified());
    let record = ledger.fetch_flow(&from, &into).await.unwrap();
    assert_eq!(record.weight, DEFAULT_FLOW_WEIGHT);

    gated.open();
    net.commit_flow_changes(key).await.unwrap();
    assert!(!net.flow(key).unwrap().is_modified());
    let record = ledger.fetch_flow(&from, &into).await.unwrap();
    assert_eq!(record.weight, 5);
}

#[tokio::test]
async fn flow_reset_after_commit_leaves_empty_origin() {
    let net = network_over(empty_ledger());
    let a = net.create_and_select_aim(|_| {});
    let b = net.create_and_select_aim(|_| {});
    let key = net.create_flow(a, b).unwrap();
    assert_eq!(net.flow(key).unwrap().weight(), 0x7fff);

    net.commit_flow_changes(key).await.unwrap();
    net.reset_flow_changes(key).unwrap();

    let flow = net.flow(key).unwrap();
    assert_eq!(flow.weight(), 0x7fff);
    assert_eq!(flow.weight_origin(), None);
    assert_eq!(flow.explanation_origin(), None);
    assert!(!flow.is_modified());
}

#[tokio::test]
async fn flow_reset_restores_committed_weight() {
    let net = network_over(empty_ledger());
    let a = net.create_and_select_aim(|_| {});
    let b = net.create_and_select_aim(|_| {});
    net.publish_aim(a).await.unwrap();
    net.publish_aim(b).await.unwrap();
    let key = net.create_flow(a, b).unwrap();
    net.publish_flow(key).await.unwrap();

    net.update_flow(key, FlowUpdate::Weight(9)).unwrap();
    net.commit_flow_changes(key).await.unwrap();
    net.update_flow(key, FlowUpdate::Weight(3)).unwrap();
    assert_eq!(net.flow(key).unwrap().weight_origin(), Some(9));

    net.reset_flow_changes(key).unwrap();
    let flow = net.flow(key).unwrap();
    assert_eq!(flow.weight(), 9);
    assert!(!flow.is_modified());
    assert!(net.changes().is_empty());
}

#[tokio::test]
async fn token_reset_restores_holding_and_radius() {
    let net = network_over(sample_ledger());
    let home = net.load_home(0).await.unwrap();
    let before = net.aim(home).unwrap();

    net.set_tokens(home, 400).unwrap();
    assert!(net.aim(home).unwrap().r() > before.r());

    net.reset_token_changes(home).unwrap();
    let aim = net.aim(home).unwrap();
    assert_eq!(aim.tokens(), before.tokens());
    assert_eq!(aim.token_trade(), None);
    assert!((aim.r() - before.r()).abs() < 1e-12);
    assert!(net.changes().is_empty());
}

#[tokio::test]
async fn member_reset_restores_permissions() {
    let net = network_over(sample_ledger());
    let home = net.load_home(0).await.unwrap();

    net.set_member_permissions(home, address(7), Permissions::EDIT)
        .unwrap();
    net.set_member_permissions(home, account(), Permissions::EDIT)
        .unwrap();
    assert!(net.aim(home).unwrap().has_member_changes());

    net.reset_member_changes(home).unwrap();
    let aim = net.aim(home).unwrap();
    assert!(!aim.has_member_changes());
    assert_eq!(aim.member_permissions(&address(7)), None);
    assert_eq!(aim.member_permissions(&account()), Some(Permissions::FULL));
    assert!(net.changes().is_empty());
}
