use crate::config::PrizeConfig;
use crate::database::CodeStore;
use crate::entities::code_entity as codes;
use crate::error::{AppError, AppResult};
use crate::utils::generate_code;
use chrono::{DateTime, Utc};
use rand::Rng;
use std::collections::HashSet;
use std::sync::Arc;

/// 每个目标码允许的最大抽取次数，超过即视为码空间耗尽
const MAX_DRAWS_PER_CODE: usize = 100;

/// 一次派奖的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrizeAssignment {
    pub code: String,
    pub prize_type: String,
}

/// 离线发码与派奖（活动开始前运行）
#[derive(Clone)]
pub struct ProvisioningService {
    codes: Arc<dyn CodeStore>,
}

impl ProvisioningService {
    pub fn new(codes: Arc<dyn CodeStore>) -> Self {
        Self { codes }
    }

    /// 生成 `total` 个长度为 `length` 的兑换码，按 `batch_size` 分批写入。
    ///
    /// 本地重复的抽取会重新抽取；库中已存在（被存储层跳过）的码同样由新码补足，
    /// 直到每批都达到目标数量。返回实际新建的数量。
    pub async fn generate_codes(
        &self,
        total: usize,
        length: usize,
        batch_size: usize,
    ) -> AppResult<u64> {
        if length == 0 || batch_size == 0 {
            return Err(AppError::ConfigError(
                "code length and batch size must be positive".to_string(),
            ));
        }

        let mut seen: HashSet<String> = HashSet::with_capacity(total);
        let mut created: u64 = 0;

        while (created as usize) < total {
            let wanted = batch_size.min(total - created as usize);
            let batch: Vec<codes::Model> = {
                let mut rng = rand::thread_rng();
                let mut batch = Vec::with_capacity(wanted);
                let mut draws = 0;
                while batch.len() < wanted && draws < wanted * MAX_DRAWS_PER_CODE {
                    draws += 1;
                    let code = generate_code(&mut rng, length);
                    if seen.insert(code.clone()) {
                        batch.push(codes::Model::fresh(code));
                    }
                }
                batch
            };

            if batch.is_empty() {
                return Err(AppError::InternalError(format!(
                    "code space exhausted after {created} codes of length {length}"
                )));
            }

            let drawn = batch.len() as u64;
            let inserted = self.codes.insert_codes(batch).await?;
            created += inserted;

            if inserted < drawn {
                log::warn!(
                    "{} generated codes already existed in the store, drawing replacements",
                    drawn - inserted
                );
            }

            log::info!("Generated {created}/{total} codes");
        }

        Ok(created)
    }

    /// 随机选出 `count` 个未领取、无奖品的码并标记为有奖。
    ///
    /// 活动开始（`opens_at`）之后拒绝执行，除非 `force`。
    pub async fn assign_prizes(
        &self,
        count: usize,
        prizes: &[PrizeConfig],
        opens_at: Option<DateTime<Utc>>,
        force: bool,
    ) -> AppResult<Vec<PrizeAssignment>> {
        if let Some(opens_at) = opens_at
            && Utc::now() >= opens_at
            && !force
        {
            return Err(AppError::ValidationError(format!(
                "Redemption opened at {}; refusing to assign prizes without --force",
                opens_at.to_rfc3339()
            )));
        }

        let total_weight: u32 = prizes.iter().map(|p| p.weight).sum();
        if total_weight == 0 {
            return Err(AppError::ConfigError(
                "at least one prize with a positive weight is required".to_string(),
            ));
        }

        let candidates = self.codes.sample_unassigned(count).await?;
        if candidates.len() < count {
            log::warn!(
                "Only {} unassigned codes available for {count} prizes",
                candidates.len()
            );
        }

        let mut assignments = Vec::with_capacity(candidates.len());
        for code in candidates {
            let label = pick_prize(prizes, total_weight);
            // 抽样与写入之间该码可能已被领取或派奖，条件写入会跳过它
            if self.codes.assign_prize(&code, label).await? {
                assignments.push(PrizeAssignment {
                    code,
                    prize_type: label.to_string(),
                });
            } else {
                log::warn!("Code {code} no longer eligible for a prize, skipped");
            }
        }

        log::info!("Assigned {} prizes", assignments.len());
        Ok(assignments)
    }
}

/// 按权重抽取奖品名称；调用方保证 `total_weight > 0`
fn pick_prize(prizes: &[PrizeConfig], total_weight: u32) -> &str {
    let pick = rand::thread_rng().gen_range(0..total_weight);
    let mut acc = 0;
    for p in prizes {
        acc += p.weight;
        if pick < acc {
            return &p.label;
        }
    }
    // total_weight > 0 保证循环内返回
    prizes.last().map(|p| p.label.as_str()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{CodeGuard, CodeUpdate, MemoryStore, RequestContext};
    use crate::entities::ClaimResult;
    use crate::utils::CODE_ALPHABET;
    use chrono::Duration;

    fn prizes() -> Vec<PrizeConfig> {
        vec![
            PrizeConfig {
                label: "Camiseta".into(),
                weight: 1,
            },
            PrizeConfig {
                label: "Balón".into(),
                weight: 1,
            },
        ]
    }

    #[tokio::test]
    async fn generates_unique_codes_of_configured_length() {
        let store = Arc::new(MemoryStore::new());
        let service = ProvisioningService::new(store.clone());

        let created = service.generate_codes(250, 8, 64).await.unwrap();
        assert_eq!(created, 250);
        assert_eq!(store.count_codes().await.unwrap(), 250);

        let sample = store.sample_unassigned(250).await.unwrap();
        assert_eq!(sample.len(), 250);
        for code in &sample {
            assert_eq!(code.len(), 8);
            assert!(code.bytes().all(|b| CODE_ALPHABET.contains(&b)));
        }
    }

    #[tokio::test]
    async fn existing_codes_are_replaced_by_fresh_draws() {
        let store = Arc::new(MemoryStore::new());
        // 长度 2 的码空间只有 1296 个，必然撞上已有的码
        for a in CODE_ALPHABET.iter().take(20) {
            for b in CODE_ALPHABET {
                let code = format!("{}{}", *a as char, *b as char);
                store.seed(&code, None).await;
            }
        }
        let before = store.count_codes().await.unwrap();

        let service = ProvisioningService::new(store.clone());
        let created = service.generate_codes(300, 2, 100).await.unwrap();
        assert_eq!(created, 300);
        assert_eq!(store.count_codes().await.unwrap(), before + 300);
    }

    #[tokio::test]
    async fn exhausted_code_space_is_an_error() {
        let store = Arc::new(MemoryStore::new());
        let service = ProvisioningService::new(store);
        let err = service.generate_codes(40, 1, 10).await.unwrap_err();
        assert!(matches!(err, AppError::InternalError(_)));
    }

    #[tokio::test]
    async fn assigns_prizes_to_fresh_codes_only() {
        let store = Arc::new(MemoryStore::new());
        store.seed("CLAIMED1", None).await;
        store.seed("PRIZED01", Some("Trofeo")).await;
        for i in 0..10 {
            store.seed(&format!("FRESH{i:03}"), None).await;
        }
        store
            .update_code_if(
                "CLAIMED1",
                CodeGuard::Unclaimed,
                CodeUpdate::claim(Utc::now(), ClaimResult::Lose, None, &RequestContext::default()),
            )
            .await
            .unwrap();

        let service = ProvisioningService::new(store.clone());
        let assigned = service.assign_prizes(20, &prizes(), None, false).await.unwrap();
        assert_eq!(assigned.len(), 10);
        assert!(assigned.iter().all(|a| a.code.starts_with("FRESH")));
        assert!(
            assigned
                .iter()
                .all(|a| a.prize_type == "Camiseta" || a.prize_type == "Balón")
        );

        let claimed = store.find_code("CLAIMED1").await.unwrap().unwrap();
        assert!(!claimed.is_prize);
        let prized = store.find_code("PRIZED01").await.unwrap().unwrap();
        assert_eq!(prized.prize_type.as_deref(), Some("Trofeo"));

        let again = service.assign_prizes(5, &prizes(), None, false).await.unwrap();
        assert!(again.is_empty());
    }

    #[tokio::test]
    async fn refuses_after_redemption_opens_unless_forced() {
        let store = Arc::new(MemoryStore::new());
        store.seed("FRESH001", None).await;
        let service = ProvisioningService::new(store);
        let opened = Some(Utc::now() - Duration::hours(1));

        let err = service
            .assign_prizes(1, &prizes(), opened, false)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));

        let forced = service.assign_prizes(1, &prizes(), opened, true).await.unwrap();
        assert_eq!(forced.len(), 1);
    }

    #[test]
    fn zero_weight_prizes_are_never_drawn() {
        let prizes = vec![
            PrizeConfig {
                label: "Nunca".into(),
                weight: 0,
            },
            PrizeConfig {
                label: "Siempre".into(),
                weight: 3,
            },
        ];
        for _ in 0..50 {
            assert_eq!(pick_prize(&prizes, 3), "Siempre");
        }
    }
}
