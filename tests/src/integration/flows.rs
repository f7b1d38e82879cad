//! # Consensus Flows
//!
//! Rejections, abstention, failure and input validation across a federation.

use crate::harness::TestFederation;
use proptest::prelude::*;
use shared_types::encoding;
use wh_02_consensus::domain::Phase;
use wh_02_consensus::{quorum, ChannelApi, ChannelError, ConsensusData, ElectKey};

// =============================================================================
// Gates
// =============================================================================

#[test]
fn test_missing_elect_accept_blocks_prepare() {
    let federation = TestFederation::new(3);
    let elect = federation.elect();
    federation.publish_all(&elect);
    for from in 0..2 {
        let vote = federation.elect_accept(from, &elect.message_id, true);
        federation.publish_all(&vote);
    }

    let delivery = federation.deliver();

    assert_eq!(delivery.delivered, 0);
    let round = federation.channel(0).round(&elect.message_id).unwrap();
    assert_eq!(round.phase, Phase::ElectAccept);
    assert_eq!(round.elect_accept_count, 2);
}

#[test]
fn test_rejected_elect_fails_round_everywhere() {
    let federation = TestFederation::new(3);
    let elect = federation.open_round(&[2]);

    let delivery = federation.deliver();

    assert!(delivery.rejected.is_empty(), "{:?}", delivery.rejected);
    assert!(matches!(
        federation.sent_on_link(0, 1).as_slice(),
        [ConsensusData::Failure(_)]
    ));
    for index in 0..3 {
        let round = federation.channel(index).round(&elect.message_id).unwrap();
        assert!(round.failed);
        assert_eq!(round.phase, Phase::Finished);
    }
    assert_eq!(
        federation.decisions(&TestFederation::instance_id()),
        vec![None; 3]
    );
}

// =============================================================================
// Abstention
// =============================================================================

#[test]
fn test_one_abstainer_of_three_still_decides() {
    let federation = TestFederation::with_clients(&[true, true, false]);
    let elect = federation.open_round(&[]);

    federation.deliver();

    assert_eq!(
        federation.decisions(&TestFederation::instance_id()),
        vec![Some(true); 3]
    );
    assert!(federation.sent_on_link(2, 0).is_empty());
    let abstainer = federation.channel(2).round(&elect.message_id).unwrap();
    assert_eq!(abstainer.phase, Phase::Finished);
}

#[test]
fn test_majority_abstaining_never_decides() {
    let federation = TestFederation::with_clients(&[true, false, false]);
    let elect = federation.open_round(&[]);

    federation.deliver();

    assert_eq!(
        federation.decisions(&TestFederation::instance_id()),
        vec![None; 3]
    );
    assert!(federation.sent_on_link(1, 0).is_empty());
    assert!(federation.sent_on_link(2, 0).is_empty());
    let proposer = federation.channel(0).round(&elect.message_id).unwrap();
    assert_eq!(proposer.phase, Phase::Promise);
}

#[test]
fn test_minority_abstaining_still_learns() {
    let federation = TestFederation::with_clients(&[true, true, true, true, false]);
    federation.open_round(&[]);

    federation.deliver();

    assert_eq!(
        federation.decisions(&TestFederation::instance_id()),
        vec![Some(true); 5]
    );
    assert!(federation.sent_on_link(4, 0).is_empty());
}

#[test]
fn test_single_witness_decides() {
    let federation = TestFederation::new(1);
    federation.open_round(&[]);

    let delivery = federation.deliver();

    assert_eq!(delivery.delivered, 0);
    assert_eq!(
        federation.decisions(&TestFederation::instance_id()),
        vec![Some(true)]
    );
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    /// Every witness with clients votes, the proposer included, so the round
    /// decides exactly when they form a majority.
    #[test]
    fn prop_decides_iff_active_witnesses_form_majority(
        clients in proptest::collection::vec(any::<bool>(), 1..=6)
    ) {
        let n = clients.len();
        let active = clients.iter().filter(|c| **c).count();

        let federation = TestFederation::with_clients(&clients);
        federation.open_round(&[]);
        federation.deliver();

        let decisions = federation.decisions(&TestFederation::instance_id());
        if active >= quorum::majority(n) {
            prop_assert_eq!(decisions, vec![Some(true); n]);
        } else {
            prop_assert_eq!(decisions, vec![None; n]);
        }
    }
}

// =============================================================================
// Failure
// =============================================================================

#[test]
fn test_failure_applies_once() {
    let federation = TestFederation::new(3);
    let elect = federation.open_round(&[]);

    let failure = federation.failure(&elect.message_id, 10);
    for result in federation.publish_all(&failure) {
        result.unwrap();
    }
    let again = federation.failure(&elect.message_id, 11);
    for result in federation.publish_all(&again) {
        assert!(matches!(result, Err(ChannelError::AlreadyFailed(_))));
    }

    // The pending prepare reaches failed rounds and is ignored.
    let delivery = federation.deliver();
    assert!(delivery.rejected.is_empty(), "{:?}", delivery.rejected);
    assert!(federation.sent_on_link(1, 0).is_empty());
    assert_eq!(
        federation.decisions(&TestFederation::instance_id()),
        vec![None; 3]
    );
}

// =============================================================================
// Validation
// =============================================================================

#[test]
fn test_duplicate_elect_is_rejected() {
    let federation = TestFederation::new(3);
    let elect = federation.open_round(&[]);
    let stored = federation.channel(1).inbox().len();

    let result = federation.publish_to(1, &elect);

    assert!(matches!(result, Err(ChannelError::AlreadyExists(_))));
    assert_eq!(federation.channel(1).inbox().len(), stored);
    assert_eq!(federation.channel(1).state().round_count(), 1);
}

#[test]
fn test_elect_with_foreign_instance_id_is_rejected() {
    let federation = TestFederation::new(3);
    let elect = federation.elect_with(
        ElectKey::new("election", "e1", "state"),
        "not-the-hash".to_string(),
    );

    let result = federation.publish_to(0, &elect);

    assert!(matches!(result, Err(ChannelError::InvalidMessage(_))));
    assert!(federation.channel(0).inbox().is_empty());
    assert_eq!(federation.channel(0).state().instance_count(), 0);
}

#[test]
fn test_tampered_message_is_rejected() {
    let federation = TestFederation::new(3);
    let mut elect = federation.elect();
    elect.data = encoding::encode(br#"{"object":"consensus","action":"elect"}"#);

    let result = federation.publish_to(0, &elect);

    assert!(matches!(result, Err(ChannelError::InvalidMessage(_))));
    assert!(federation.channel(0).catchup().is_empty());
}

#[test]
fn test_elect_accept_before_elect_is_unknown() {
    let federation = TestFederation::new(3);
    let elect = federation.elect();
    federation.publish_to(0, &elect).unwrap();

    let vote = federation.elect_accept(0, &elect.message_id, true);
    let result = federation.publish_to(1, &vote);

    assert!(matches!(result, Err(ChannelError::UnknownMessage(_))));
    assert!(federation.channel(1).inbox().is_empty());
}
