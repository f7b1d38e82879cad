//! Protocol handlers, one per action.
//!
//! Every follow-up is encoded and signed before any state is written, so an
//! internal error leaves the round untouched. The proposer works on copies of
//! its round and instance and commits them once every follow-up is signed.
//! Locks are released before anything is sent.
//!
//! The proposer is also an acceptor: unless it abstains, it promises and
//! accepts its own proposal locally, so a single-server federation decides.

use super::emit::Outbound;
use super::ConsensusChannel;
use crate::domain::{
    Accept, AcceptRecord, AcceptValue, ChannelError, ChannelResult, ConsensusData,
    ConsensusInstance, ConsensusObject, Elect, ElectAccept, Failure, Learn, LearnValue,
    MessageState, Phase, Prepare, PrepareValue, Promise, PromiseRecord, PromiseValue, Propose,
    ProposeValue, QuorumRule, ELECT_STARTED,
};
use crate::metrics;
use crate::ports::Hub;
use parking_lot::{Mutex, RwLock};
use shared_types::Message;
use std::sync::Arc;
use tracing::{debug, info, warn};

type Round = Arc<Mutex<MessageState>>;
type Instance = Arc<RwLock<ConsensusInstance>>;

impl<H: Hub> ConsensusChannel<H> {
    /// Resolve the round an elect message opened, and the instance it decides.
    fn resolve(&self, elect_id: &str, instance_id: &str) -> ChannelResult<(Round, Instance)> {
        if !self.inbox.contains(elect_id) {
            return Err(ChannelError::UnknownMessage(elect_id.to_string()));
        }
        let round = self
            .state
            .round(elect_id)
            .ok_or_else(|| ChannelError::UnknownMessage(elect_id.to_string()))?;
        let instance = self
            .state
            .instance(instance_id)
            .ok_or_else(|| ChannelError::UnknownInstance(instance_id.to_string()))?;
        Ok((round, instance))
    }

    pub(super) fn handle_elect(&self, message: &Message, elect: Elect) -> ChannelResult<()> {
        let expected = elect
            .key
            .instance_id()
            .map_err(|e| ChannelError::InvalidMessage(e.to_string()))?;
        if elect.instance_id != expected {
            return Err(ChannelError::InvalidMessage(format!(
                "instance_id {} does not match key, expected {}",
                elect.instance_id, expected
            )));
        }
        if elect.value != ELECT_STARTED {
            return Err(ChannelError::InvalidMessage(format!(
                "elect value must be \"{ELECT_STARTED}\", got \"{}\"",
                elect.value
            )));
        }

        let proposer = message.sender_key()?;
        let new_instance = self.state.open_instance(&elect.instance_id);
        if self.state.open_round(&message.message_id, proposer) {
            metrics::record_round_opened();
        }

        info!(
            channel = %self.config.channel_id,
            msg_id = %message.message_id,
            instance_id = %elect.instance_id,
            new_instance,
            "Consensus round opened"
        );
        Ok(())
    }

    pub(super) fn handle_elect_accept(&self, data: ElectAccept) -> ChannelResult<()> {
        let (round, instance) = self.resolve(&data.message_id, &data.instance_id)?;
        let mut state = round.lock();
        if state.failed {
            debug!(msg_id = %data.message_id, "Round failed, ignoring elect_accept");
            return Ok(());
        }

        if !data.accept {
            if state.phase != Phase::ElectAccept || !self.is_local_proposer(&state.proposer) {
                state.elect_reject_count += 1;
                return Ok(());
            }

            // Unanimity can no longer be reached.
            let outbound = self.prepare_outbound(&ConsensusData::Failure(Failure {
                object: ConsensusObject::Consensus,
                instance_id: data.instance_id.clone(),
                message_id: data.message_id.clone(),
                created_at: self.now(),
            }))?;
            state.elect_reject_count += 1;
            state.failed = true;
            state.advance_to(Phase::Finished);
            drop(state);

            warn!(
                channel = %self.config.channel_id,
                msg_id = %data.message_id,
                instance_id = %data.instance_id,
                "Elect rejected by a server, round failed"
            );
            self.send_to_servers("failure", outbound);
            return Ok(());
        }

        let count = state.elect_accept_count + 1;
        let n = self.hub.server_count();
        if !QuorumRule::Unanimity.is_reached(count, n)
            || state.phase != Phase::ElectAccept
            || !self.is_local_proposer(&state.proposer)
        {
            state.elect_accept_count = count;
            return Ok(());
        }

        let mut instance = instance.write();
        let mut next_state = state.clone();
        let mut next = instance.clone();
        let try_number = next.next_proposed_try();
        let mut emissions = vec![(
            "prepare",
            self.prepare_outbound(&ConsensusData::Prepare(Prepare {
                object: ConsensusObject::Consensus,
                instance_id: data.instance_id.clone(),
                message_id: data.message_id.clone(),
                created_at: self.now(),
                value: PrepareValue {
                    proposed_try: try_number,
                },
            }))?,
        )];
        next.set_proposed_try(try_number);
        next_state.elect_accept_count = count;
        next_state.advance_to(Phase::Promise);

        // The proposer is one of the acceptors it prepares.
        if !self.abstains() && try_number > next.promised_try {
            next.promised_try = try_number;
            next.promises.push(PromiseRecord {
                accepted_try: next.accepted_try,
                accepted_value: next.accepted_value.unwrap_or(false),
                promised_try: try_number,
            });
        }
        let decided = self.advance_proposer(
            &mut next_state,
            &mut next,
            &data.instance_id,
            &data.message_id,
            &mut emissions,
        )?;
        *state = next_state;
        *instance = next;
        drop(instance);
        drop(state);

        info!(
            channel = %self.config.channel_id,
            msg_id = %data.message_id,
            instance_id = %data.instance_id,
            try_number,
            "All servers accepted, preparing"
        );
        self.finish(&data.instance_id, &data.message_id, decided, emissions);
        Ok(())
    }

    /// Drive the proposer's side of a round on working copies: propose once a
    /// majority promised, then decide once a majority accepted. Signing
    /// errors propagate before the caller commits anything.
    fn advance_proposer(
        &self,
        state: &mut MessageState,
        instance: &mut ConsensusInstance,
        instance_id: &str,
        message_id: &str,
        emissions: &mut Vec<(&'static str, Outbound)>,
    ) -> ChannelResult<Option<bool>> {
        let n = self.hub.server_count();

        if state.phase == Phase::Promise
            && QuorumRule::Majority.is_reached(instance.promises.len(), n)
        {
            let highest_accepted = instance.highest_accepted_try();
            let try_number = if highest_accepted == -1 {
                instance.proposed_try
            } else {
                highest_accepted
            };
            emissions.push((
                "propose",
                self.prepare_outbound(&ConsensusData::Propose(Propose {
                    object: ConsensusObject::Consensus,
                    instance_id: instance_id.to_string(),
                    message_id: message_id.to_string(),
                    created_at: self.now(),
                    value: ProposeValue {
                        proposed_try: try_number,
                        proposed_value: true,
                    },
                    acceptor_signatures: Vec::new(),
                }))?,
            ));
            instance.proposed_value = Some(true);
            state.advance_to(Phase::Propose);
            debug!(
                msg_id = %message_id,
                instance_id = %instance_id,
                try_number,
                "Majority promised, proposing"
            );

            if !self.abstains() && instance.promised_try <= try_number {
                instance.accepted_try = try_number;
                instance.accepted_value = Some(true);
                instance.accepts.push(AcceptRecord {
                    accepted_try: try_number,
                    accepted_value: true,
                });
                state.advance_to(Phase::Accept);
            }
        }

        if instance.decided || !QuorumRule::Majority.is_reached(instance.accepts.len(), n) {
            return Ok(None);
        }
        let Some(decision) = instance
            .proposed_value
            .or_else(|| instance.quorum_accepted_value())
        else {
            return Ok(None);
        };

        emissions.push((
            "learn",
            self.prepare_outbound(&ConsensusData::Learn(Learn {
                object: ConsensusObject::Consensus,
                instance_id: instance_id.to_string(),
                message_id: message_id.to_string(),
                created_at: self.now(),
                value: LearnValue { decision },
                acceptor_signatures: Vec::new(),
            }))?,
        ));
        instance.decide(decision);
        state.advance_to(Phase::Learn);
        Ok(Some(decision))
    }

    /// Report a committed decision, then send what the round emitted.
    fn finish(
        &self,
        instance_id: &str,
        message_id: &str,
        decided: Option<bool>,
        emissions: Vec<(&'static str, Outbound)>,
    ) {
        if let Some(decision) = decided {
            metrics::record_decision(decision);
            info!(
                channel = %self.config.channel_id,
                msg_id = %message_id,
                instance_id = %instance_id,
                decision,
                "Majority accepted, decided"
            );
        }
        for (action, outbound) in emissions {
            self.send_to_servers(action, outbound);
        }
    }

    pub(super) fn handle_prepare(&self, data: Prepare) -> ChannelResult<()> {
        let (round, instance) = self.resolve(&data.message_id, &data.instance_id)?;
        let mut state = round.lock();
        if state.failed {
            return Ok(());
        }

        // A prepare proves every server accepted the elect, so the round is
        // past ElectAccept here whether or not we vote.
        if self.abstains() {
            state.advance_to(Phase::Promise);
            debug!(
                channel = %self.config.channel_id,
                msg_id = %data.message_id,
                "No client subscribers, abstaining from prepare"
            );
            return Ok(());
        }

        let mut instance = instance.write();
        let try_number = data.value.proposed_try;
        if try_number <= instance.promised_try {
            state.advance_to(Phase::Promise);
            debug!(
                instance_id = %data.instance_id,
                try_number,
                promised_try = instance.promised_try,
                "Prepare does not exceed promised try"
            );
            return Ok(());
        }

        let outbound = self.prepare_outbound(&ConsensusData::Promise(Promise {
            object: ConsensusObject::Consensus,
            instance_id: data.instance_id.clone(),
            message_id: data.message_id.clone(),
            created_at: self.now(),
            value: PromiseValue {
                accepted_try: instance.accepted_try,
                accepted_value: instance.accepted_value.unwrap_or(false),
                promised_try: try_number,
            },
        }))?;
        instance.promised_try = try_number;
        state.advance_to(Phase::Promise);
        drop(instance);
        drop(state);

        self.send_to_servers("promise", outbound);
        Ok(())
    }

    pub(super) fn handle_promise(&self, data: Promise) -> ChannelResult<()> {
        let (round, instance) = self.resolve(&data.message_id, &data.instance_id)?;
        let mut state = round.lock();
        if state.failed {
            return Ok(());
        }
        if state.phase < Phase::Promise {
            return Err(ChannelError::PhaseNotReached {
                required: Phase::Promise,
                current: state.phase,
            });
        }

        let mut instance = instance.write();
        let record = PromiseRecord::from(&data.value);
        if !self.is_local_proposer(&state.proposer) {
            instance.promises.push(record);
            return Ok(());
        }

        let mut next_state = state.clone();
        let mut next = instance.clone();
        next.promises.push(record);
        let mut emissions = Vec::new();
        let decided = self.advance_proposer(
            &mut next_state,
            &mut next,
            &data.instance_id,
            &data.message_id,
            &mut emissions,
        )?;
        *state = next_state;
        *instance = next;
        drop(instance);
        drop(state);

        self.finish(&data.instance_id, &data.message_id, decided, emissions);
        Ok(())
    }

    pub(super) fn handle_propose(&self, data: Propose) -> ChannelResult<()> {
        let (round, instance) = self.resolve(&data.message_id, &data.instance_id)?;
        let mut state = round.lock();
        if state.failed {
            return Ok(());
        }
        if self.abstains() {
            state.advance_to(Phase::Propose);
            debug!(
                channel = %self.config.channel_id,
                msg_id = %data.message_id,
                "No client subscribers, abstaining from propose"
            );
            return Ok(());
        }

        let mut instance = instance.write();
        let ProposeValue {
            proposed_try,
            proposed_value,
        } = data.value;
        if instance.promised_try > proposed_try {
            state.advance_to(Phase::Propose);
            debug!(
                instance_id = %data.instance_id,
                try_number = proposed_try,
                promised_try = instance.promised_try,
                "Propose below promised try"
            );
            return Ok(());
        }

        let outbound = self.prepare_outbound(&ConsensusData::Accept(Accept {
            object: ConsensusObject::Consensus,
            instance_id: data.instance_id.clone(),
            message_id: data.message_id.clone(),
            created_at: self.now(),
            value: AcceptValue {
                accepted_try: proposed_try,
                accepted_value: proposed_value,
            },
        }))?;
        instance.accepted_try = proposed_try;
        instance.accepted_value = Some(proposed_value);
        state.advance_to(Phase::Accept);
        drop(instance);
        drop(state);

        self.send_to_servers("accept", outbound);
        Ok(())
    }

    pub(super) fn handle_accept(&self, data: Accept) -> ChannelResult<()> {
        let (round, instance) = self.resolve(&data.message_id, &data.instance_id)?;
        let mut state = round.lock();
        if state.failed {
            return Ok(());
        }

        let mut instance = instance.write();
        let record = AcceptRecord::from(&data.value);
        if !self.is_local_proposer(&state.proposer) {
            instance.accepts.push(record);
            return Ok(());
        }

        let mut next_state = state.clone();
        let mut next = instance.clone();
        next.accepts.push(record);
        let mut emissions = Vec::new();
        let decided = self.advance_proposer(
            &mut next_state,
            &mut next,
            &data.instance_id,
            &data.message_id,
            &mut emissions,
        )?;
        *state = next_state;
        *instance = next;
        drop(instance);
        drop(state);

        self.finish(&data.instance_id, &data.message_id, decided, emissions);
        Ok(())
    }

    pub(super) fn handle_learn(&self, data: Learn) -> ChannelResult<()> {
        let (round, instance) = self.resolve(&data.message_id, &data.instance_id)?;
        let mut state = round.lock();
        if state.failed {
            return Ok(());
        }

        let decision = data.value.decision;
        if instance.write().decide(decision) {
            metrics::record_decision(decision);
            info!(
                channel = %self.config.channel_id,
                msg_id = %data.message_id,
                instance_id = %data.instance_id,
                decision,
                "Learned decision"
            );
        }
        state.advance_to(Phase::Finished);
        Ok(())
    }

    pub(super) fn handle_failure(&self, data: Failure) -> ChannelResult<()> {
        if !self.inbox.contains(&data.message_id) {
            return Err(ChannelError::UnknownMessage(data.message_id));
        }
        let round = self
            .state
            .round(&data.message_id)
            .ok_or_else(|| ChannelError::UnknownMessage(data.message_id.clone()))?;

        let mut state = round.lock();
        if state.failed {
            return Err(ChannelError::AlreadyFailed(data.message_id));
        }
        state.failed = true;
        state.advance_to(Phase::Finished);

        warn!(
            channel = %self.config.channel_id,
            msg_id = %data.message_id,
            instance_id = %data.instance_id,
            "Consensus round failed"
        );
        Ok(())
    }
}
