//! # End-to-End Consensus
//!
//! One full round across three witnesses, witness 0 hosting the organizer:
//!
//! ```text
//! organizer ──elect──→ [A] [B] [C]
//! A, B, C   ──elect_accept (all)──→ everyone
//!
//! [A] ──prepare(1)──→ [B] [C]
//! [B] [C] ──promise──→ [A]
//! [A] ──propose(1, true)──→ [B] [C]
//! [B] [C] ──accept──→ [A]
//! [A] ──learn(true)──→ [B] [C]
//! ```

use crate::harness::TestFederation;
use wh_02_consensus::domain::{
    AcceptValue, LearnValue, Phase, PrepareValue, PromiseValue, ProposeValue,
};
use wh_02_consensus::{ChannelApi, ConsensusData};

#[test]
fn test_three_witnesses_decide_true() {
    let federation = TestFederation::new(3);
    let elect = federation.open_round(&[]);

    let delivery = federation.deliver();

    assert!(delivery.rejected.is_empty(), "{:?}", delivery.rejected);
    // A: prepare, propose, learn to two peers. B and C: promise, accept
    // to two peers each.
    assert_eq!(delivery.delivered, 14);
    assert_eq!(
        federation.decisions(&TestFederation::instance_id()),
        vec![Some(true); 3]
    );

    let to_b = federation.sent_on_link(0, 1);
    assert_eq!(to_b.len(), 3);
    match &to_b[0] {
        ConsensusData::Prepare(prepare) => {
            assert_eq!(prepare.message_id, elect.message_id);
            assert_eq!(prepare.value, PrepareValue { proposed_try: 1 });
        }
        other => panic!("expected prepare, got {other:?}"),
    }
    match &to_b[1] {
        ConsensusData::Propose(propose) => assert_eq!(
            propose.value,
            ProposeValue {
                proposed_try: 1,
                proposed_value: true
            }
        ),
        other => panic!("expected propose, got {other:?}"),
    }
    match &to_b[2] {
        ConsensusData::Learn(learn) => assert_eq!(learn.value, LearnValue { decision: true }),
        other => panic!("expected learn, got {other:?}"),
    }
}

#[test]
fn test_acceptors_reply_to_proposer() {
    let federation = TestFederation::new(3);
    federation.open_round(&[]);
    federation.deliver();

    let from_b = federation.sent_on_link(1, 0);
    assert_eq!(from_b.len(), 2);
    match &from_b[0] {
        ConsensusData::Promise(promise) => assert_eq!(
            promise.value,
            PromiseValue {
                accepted_try: -1,
                accepted_value: false,
                promised_try: 1
            }
        ),
        other => panic!("expected promise, got {other:?}"),
    }
    match &from_b[1] {
        ConsensusData::Accept(accept) => assert_eq!(
            accept.value,
            AcceptValue {
                accepted_try: 1,
                accepted_value: true
            }
        ),
        other => panic!("expected accept, got {other:?}"),
    }
}

#[test]
fn test_round_phases_after_decision() {
    let federation = TestFederation::new(3);
    let elect = federation.open_round(&[]);
    federation.deliver();

    let proposer = federation.channel(0).round(&elect.message_id).unwrap();
    assert_eq!(proposer.phase, Phase::Learn);
    assert_eq!(proposer.elect_accept_count, 3);

    for index in 1..3 {
        let round = federation.channel(index).round(&elect.message_id).unwrap();
        assert_eq!(round.phase, Phase::Finished);
        assert!(!round.failed);

        let instance = federation
            .channel(index)
            .instance(&TestFederation::instance_id())
            .unwrap();
        assert_eq!(instance.promised_try, 1);
        assert_eq!(instance.accepted_try, 1);
        assert_eq!(instance.accepted_value, Some(true));
    }
}

#[test]
fn test_clients_see_every_stored_message_in_order() {
    let federation = TestFederation::new(3);
    let elect = federation.open_round(&[]);
    federation.deliver();

    let channel = federation.channel(1);
    let history = channel.catchup();
    assert_eq!(history.len(), channel.inbox().len());
    assert_eq!(history[0].message_id, elect.message_id);

    let client = federation.witnesses[1].client.as_ref().unwrap();
    assert_eq!(client.sent().len(), history.len());
}

#[test]
fn test_five_witnesses_decide_true() {
    let federation = TestFederation::new(5);
    federation.open_round(&[]);

    let delivery = federation.deliver();

    assert!(delivery.rejected.is_empty(), "{:?}", delivery.rejected);
    assert_eq!(
        federation.decisions(&TestFederation::instance_id()),
        vec![Some(true); 5]
    );
}
