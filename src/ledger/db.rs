use std::collections::BTreeMap;

use thiserror::Error;
use tracing::debug;

use crate::types::edge::EdgeDB;
use crate::types::{Address, Edge, Int};

#[derive(Debug, Error, Eq, PartialEq)]
pub enum LedgerError {
    #[error("unknown participant {0}")]
    UnknownParticipant(Address),
    #[error("trust percentage {0} exceeds 100")]
    InvalidTrustPercentage(u8),
    #[error("{holder} holds {available} of token {token}, cannot move {needed}")]
    InsufficientBalance {
        holder: Address,
        token: Address,
        available: Int,
        needed: Int,
    },
}

/// State of one participant. Balances are keyed by token, and a token is
/// the address of its issuer.
#[derive(Clone, Debug, Default)]
pub struct Participant {
    pub balances: BTreeMap<Address, Int>,
    /// Limit percentage in "send to" direction
    pub trust_percentage: BTreeMap<Address, u8>,
    pub organization: bool,
}

impl Participant {
    pub fn balance(&self, token: &Address) -> Int {
        self.balances.get(token).cloned().unwrap_or_default()
    }

    /// Aggregate value held across all tokens.
    pub fn total_balance(&self) -> Int {
        self.balances
            .values()
            .fold(Int::zero(), |acc, balance| acc + balance.clone())
    }
}

/// In-memory ledger of signups, trusts and balances. The flow edge set is
/// derived from them and recomputed lazily after mutations.
#[derive(Debug, Default)]
pub struct Ledger {
    participants: BTreeMap<Address, Participant>,
    edges: EdgeDB,
    dirty: bool,
}

impl Ledger {
    pub fn new() -> Ledger {
        Ledger::default()
    }

    pub fn signup(&mut self, user: Address) {
        self.participants.entry(user).or_default();
        self.dirty = true;
    }

    pub fn organization_signup(&mut self, organization: Address) {
        self.participants.entry(organization).or_default().organization = true;
        self.dirty = true;
    }

    /// Declares that `user` may send its own token to `can_send_to`, up to
    /// `limit_percentage` of the receiver's own holdings.
    pub fn trust(
        &mut self,
        can_send_to: Address,
        user: Address,
        limit_percentage: u8,
    ) -> Result<(), LedgerError> {
        if limit_percentage > 100 {
            return Err(LedgerError::InvalidTrustPercentage(limit_percentage));
        }
        let participant = self
            .participants
            .get_mut(&user)
            .ok_or(LedgerError::UnknownParticipant(user))?;
        participant.trust_percentage.insert(can_send_to, limit_percentage);
        self.dirty = true;
        Ok(())
    }

    pub fn set_balance(
        &mut self,
        user: Address,
        token: Address,
        amount: Int,
    ) -> Result<(), LedgerError> {
        let participant = self
            .participants
            .get_mut(&user)
            .ok_or(LedgerError::UnknownParticipant(user))?;
        participant.balances.insert(token, amount);
        self.dirty = true;
        Ok(())
    }

    /// Moves `amount` of `token` between two signed-up participants.
    pub fn transfer(
        &mut self,
        token: Address,
        from: Address,
        to: Address,
        amount: Int,
    ) -> Result<(), LedgerError> {
        if !self.participants.contains_key(&to) {
            return Err(LedgerError::UnknownParticipant(to));
        }
        let sender = self
            .participants
            .get_mut(&from)
            .ok_or(LedgerError::UnknownParticipant(from))?;
        let available = sender.balance(&token);
        if available < amount {
            return Err(LedgerError::InsufficientBalance {
                holder: from,
                token,
                available,
                needed: amount,
            });
        }
        *sender.balances.entry(token).or_default() -= amount.clone();
        *self
            .participants
            .get_mut(&to)
            .expect("checked above")
            .balances
            .entry(token)
            .or_default() += amount;
        self.dirty = true;
        Ok(())
    }

    pub fn participant(&self, address: &Address) -> Option<&Participant> {
        self.participants.get(address)
    }

    pub fn participants(&self) -> &BTreeMap<Address, Participant> {
        &self.participants
    }

    /// The derived flow edge set, recomputed when the ledger has changed
    /// since the last call.
    pub fn edges(&mut self) -> &EdgeDB {
        if self.dirty {
            self.edges = self.compute_edges();
            self.dirty = false;
        }
        &self.edges
    }

    fn compute_edges(&self) -> EdgeDB {
        let mut edges = vec![];
        for (user, participant) in &self.participants {
            let own_balance = participant.balance(user);
            // trust connections
            for (send_to, percentage) in &participant.trust_percentage {
                if *user == *send_to {
                    continue;
                }
                if let Some(receiver) = self.participants.get(send_to) {
                    let limit = trust_transfer_limit(user, participant, send_to, receiver, *percentage);
                    // The sender cannot spend more of its own token than
                    // it holds, whatever the receiver would accept.
                    let capacity = limit.min(own_balance.clone());
                    if !capacity.is_zero() {
                        edges.push(Edge {
                            from: *user,
                            to: *send_to,
                            token: *user,
                            capacity,
                        });
                    }
                }
            }
            // send tokens back to their issuer
            for (token, balance) in &participant.balances {
                if *token != *user && !balance.is_zero() {
                    edges.push(Edge {
                        from: *user,
                        to: *token,
                        token: *token,
                        capacity: balance.clone(),
                    });
                }
            }
        }
        debug!(edge_count = edges.len(), "derived ledger edges");
        EdgeDB::new(edges)
    }
}

/// How much of the sender's own token the receiver accepts under a trust
/// percentage: the declared share of the receiver's own holdings, reduced
/// by what the receiver already holds of the sender's token. Organizations
/// accept without limit.
fn trust_transfer_limit(
    sender: &Address,
    sender_state: &Participant,
    receiver: &Address,
    receiver_state: &Participant,
    trust_percentage: u8,
) -> Int {
    if receiver_state.organization {
        sender_state.balance(sender)
    } else {
        let already_held = receiver_state.balance(sender);
        let amount = receiver_state.balance(receiver) * u32::from(trust_percentage) / 100;
        if amount < already_held {
            Int::zero()
        } else {
            let scaled_held = already_held * u32::from(100 - trust_percentage) / 100;
            amount - scaled_held
        }
    }
}
