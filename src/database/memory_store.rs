use crate::database::store::{CodeGuard, CodeStore, CodeUpdate, ConditionalUpdate, WinnerRegistry};
use crate::entities::{ClaimResult, ClaimState, code_entity as codes, winner_entity as winners};
use crate::error::{AppError, AppResult};
use async_trait::async_trait;
use rand::seq::SliceRandom;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;

/// In-process store for local runs (`memory://`) and tests.
///
/// A single mutex per record set stands in for the database row lock: the guard
/// check and the update happen while it is held.
#[derive(Default)]
pub struct MemoryStore {
    codes: Mutex<HashMap<String, codes::Model>>,
    winners: Mutex<Vec<winners::Model>>,
    fail_winner_inserts: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every following `insert_winner` fail as if the store were down.
    pub fn set_fail_winner_inserts(&self, fail: bool) {
        self.fail_winner_inserts.store(fail, Ordering::SeqCst);
    }

    /// Seeds a code with an explicit prize flag, bypassing provisioning.
    pub async fn seed(&self, code: &str, prize_type: Option<&str>) {
        let mut model = codes::Model::fresh(code.to_string());
        model.is_prize = prize_type.is_some();
        model.prize_type = prize_type.map(str::to_string);
        self.codes.lock().await.insert(code.to_string(), model);
    }
}

#[async_trait]
impl CodeStore for MemoryStore {
    async fn find_code(&self, code: &str) -> AppResult<Option<codes::Model>> {
        Ok(self.codes.lock().await.get(code).cloned())
    }

    async fn update_code_if(
        &self,
        code: &str,
        guard: CodeGuard,
        update: CodeUpdate,
    ) -> AppResult<ConditionalUpdate> {
        let mut table = self.codes.lock().await;
        match table.get_mut(code) {
            Some(stored) if guard.holds(stored) => {
                update.apply_to(stored);
                Ok(ConditionalUpdate::Applied(stored.clone()))
            }
            _ => Ok(ConditionalUpdate::Rejected),
        }
    }

    async fn insert_codes(&self, batch: Vec<codes::Model>) -> AppResult<u64> {
        let mut table = self.codes.lock().await;
        let mut inserted = 0;
        for model in batch {
            if !table.contains_key(&model.code) {
                table.insert(model.code.clone(), model);
                inserted += 1;
            }
        }
        Ok(inserted)
    }

    async fn sample_unassigned(&self, count: usize) -> AppResult<Vec<String>> {
        let table = self.codes.lock().await;
        let eligible: Vec<&String> = table
            .values()
            .filter(|c| !c.is_prize && c.claim_state == ClaimState::Unclaimed)
            .map(|c| &c.code)
            .collect();
        let mut rng = rand::thread_rng();
        Ok(eligible
            .choose_multiple(&mut rng, count)
            .map(|c| (*c).clone())
            .collect())
    }

    async fn assign_prize(&self, code: &str, label: &str) -> AppResult<bool> {
        let mut table = self.codes.lock().await;
        match table.get_mut(code) {
            Some(stored) if !stored.is_prize && stored.claim_state == ClaimState::Unclaimed => {
                stored.is_prize = true;
                stored.prize_type = Some(label.to_string());
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn count_codes(&self) -> AppResult<u64> {
        Ok(self.codes.lock().await.len() as u64)
    }

    async fn list_pending(&self, limit: u64) -> AppResult<Vec<codes::Model>> {
        let table = self.codes.lock().await;
        let mut pending: Vec<codes::Model> = table
            .values()
            .filter(|c| c.result == Some(ClaimResult::Pending))
            .cloned()
            .collect();
        pending.sort_by_key(|c| c.claimed_at);
        pending.truncate(limit as usize);
        Ok(pending)
    }
}

#[async_trait]
impl WinnerRegistry for MemoryStore {
    async fn insert_winner(&self, winner: winners::Model) -> AppResult<winners::Model> {
        if self.fail_winner_inserts.load(Ordering::SeqCst) {
            return Err(AppError::StoreUnavailable(
                "winner registry unavailable".to_string(),
            ));
        }
        let mut registry = self.winners.lock().await;
        if registry
            .iter()
            .any(|w| w.id == winner.id || w.winning_code == winner.winning_code)
        {
            return Err(AppError::DatabaseError(sea_orm::DbErr::Custom(format!(
                "duplicate winner for code {}",
                winner.winning_code
            ))));
        }
        registry.push(winner.clone());
        Ok(winner)
    }

    async fn list_winners(&self) -> AppResult<Vec<winners::Model>> {
        let mut listed = self.winners.lock().await.clone();
        listed.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(listed)
    }

    async fn count_winners(&self) -> AppResult<u64> {
        Ok(self.winners.lock().await.len() as u64)
    }
}
