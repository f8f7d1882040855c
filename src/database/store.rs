//! Storage contracts for codes and winners.
//!
//! Every state change a code goes through is expressed as a [`CodeGuard`] plus a
//! [`CodeUpdate`] handed to [`CodeStore::update_code_if`]. Implementations must
//! evaluate the guard and apply the update as one atomic operation; the claim
//! protocol has no other serialization point.

use crate::entities::{ClaimResult, ClaimState, code_entity as codes, winner_entity as winners};
use crate::error::AppResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Audit data captured from the request that performs a claim.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    pub ip: Option<String>,
    pub user_agent: Option<String>,
}

/// Predicate a stored code must satisfy for a conditional update to apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeGuard {
    /// `claim_state = unclaimed`
    Unclaimed,
    /// `result = pending AND claimant_ref = id`
    PendingFor(Uuid),
}

impl CodeGuard {
    pub fn holds(&self, code: &codes::Model) -> bool {
        match self {
            CodeGuard::Unclaimed => code.claim_state == ClaimState::Unclaimed,
            CodeGuard::PendingFor(id) => {
                code.result == Some(ClaimResult::Pending) && code.claimant_ref == Some(*id)
            }
        }
    }
}

/// Field values written by a conditional update. `None` leaves a field as is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodeUpdate {
    pub claim_state: Option<ClaimState>,
    pub claimed_at: Option<DateTime<Utc>>,
    pub claimant_ref: Option<Option<Uuid>>,
    pub audit_ip: Option<String>,
    pub audit_user_agent: Option<String>,
    pub result: Option<ClaimResult>,
}

impl CodeUpdate {
    /// Unclaimed -> Claimed with the given outcome and audit trail.
    pub fn claim(
        now: DateTime<Utc>,
        result: ClaimResult,
        claimant: Option<Uuid>,
        ctx: &RequestContext,
    ) -> Self {
        Self {
            claim_state: Some(ClaimState::Claimed),
            claimed_at: Some(now),
            claimant_ref: Some(claimant),
            audit_ip: ctx.ip.clone(),
            audit_user_agent: ctx.user_agent.clone(),
            result: Some(result),
        }
    }

    /// Pending -> Win keeps the claimant; Pending -> Lose drops it.
    pub fn resolve(result: ClaimResult) -> Self {
        Self {
            claimant_ref: (result == ClaimResult::Lose).then_some(None),
            result: Some(result),
            ..Default::default()
        }
    }

    pub fn apply_to(&self, code: &mut codes::Model) {
        if let Some(state) = self.claim_state {
            code.claim_state = state;
        }
        if let Some(at) = self.claimed_at {
            code.claimed_at = Some(at);
        }
        if let Some(claimant) = self.claimant_ref {
            code.claimant_ref = claimant;
        }
        if let Some(ip) = &self.audit_ip {
            code.audit_ip = Some(ip.clone());
        }
        if let Some(ua) = &self.audit_user_agent {
            code.audit_user_agent = Some(ua.clone());
        }
        if let Some(result) = self.result {
            code.result = Some(result);
        }
    }
}

/// Outcome of [`CodeStore::update_code_if`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConditionalUpdate {
    /// The guard held; carries the record as stored after the update.
    Applied(codes::Model),
    /// The code is absent or the guard did not hold. Nothing was written.
    Rejected,
}

#[async_trait]
pub trait CodeStore: Send + Sync + 'static {
    async fn find_code(&self, code: &str) -> AppResult<Option<codes::Model>>;

    async fn update_code_if(
        &self,
        code: &str,
        guard: CodeGuard,
        update: CodeUpdate,
    ) -> AppResult<ConditionalUpdate>;

    /// Inserts a batch, skipping codes that already exist. Returns the number
    /// of rows actually inserted.
    async fn insert_codes(&self, batch: Vec<codes::Model>) -> AppResult<u64>;

    /// Random sample, without replacement, of unclaimed codes that carry no prize.
    async fn sample_unassigned(&self, count: usize) -> AppResult<Vec<String>>;

    /// Marks an unclaimed non-prize code as a prize. Returns false when the
    /// code no longer qualifies.
    async fn assign_prize(&self, code: &str, label: &str) -> AppResult<bool>;

    async fn count_codes(&self) -> AppResult<u64>;

    /// Claimed codes still waiting on their winner record, oldest first.
    async fn list_pending(&self, limit: u64) -> AppResult<Vec<codes::Model>>;
}

#[async_trait]
pub trait WinnerRegistry: Send + Sync + 'static {
    async fn insert_winner(&self, winner: winners::Model) -> AppResult<winners::Model>;

    /// All winners, newest first.
    async fn list_winners(&self) -> AppResult<Vec<winners::Model>>;

    async fn count_winners(&self) -> AppResult<u64>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_guard_requires_matching_claimant() {
        let winner = Uuid::new_v4();
        let mut code = codes::Model::fresh("A1B2C3D4".into());
        assert!(CodeGuard::Unclaimed.holds(&code));
        assert!(!CodeGuard::PendingFor(winner).holds(&code));

        CodeUpdate::claim(Utc::now(), ClaimResult::Pending, Some(winner), &RequestContext::default())
            .apply_to(&mut code);
        assert!(!CodeGuard::Unclaimed.holds(&code));
        assert!(CodeGuard::PendingFor(winner).holds(&code));
        assert!(!CodeGuard::PendingFor(Uuid::new_v4()).holds(&code));
    }

    #[test]
    fn resolving_to_lose_clears_the_claimant() {
        let winner = Uuid::new_v4();
        let mut code = codes::Model::fresh("A1B2C3D4".into());
        CodeUpdate::claim(Utc::now(), ClaimResult::Pending, Some(winner), &RequestContext::default())
            .apply_to(&mut code);

        let mut won = code.clone();
        CodeUpdate::resolve(ClaimResult::Win).apply_to(&mut won);
        assert_eq!(won.claimant_ref, Some(winner));
        assert_eq!(won.result, Some(ClaimResult::Win));

        CodeUpdate::resolve(ClaimResult::Lose).apply_to(&mut code);
        assert_eq!(code.claimant_ref, None);
        assert_eq!(code.result, Some(ClaimResult::Lose));
        assert_eq!(code.claim_state, ClaimState::Claimed);
    }
}
