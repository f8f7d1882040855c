use crate::database::WinnerRegistry;
use crate::error::{AppError, AppResult};
use crate::utils::{quote_field, write_row};
use std::sync::Arc;

pub const EXPORT_HEADER: [&str; 8] = [
    "Name", "Surname", "Email", "Phone", "Address", "Prize", "Code", "Date",
];

#[derive(Clone)]
pub struct WinnerService {
    winners: Arc<dyn WinnerRegistry>,
    export_key: String,
}

impl WinnerService {
    pub fn new(winners: Arc<dyn WinnerRegistry>, export_key: String) -> Self {
        Self {
            winners,
            export_key,
        }
    }

    /// 校验导出密钥；未配置密钥时一律拒绝
    pub fn verify_key(&self, key: Option<&str>) -> AppResult<()> {
        match key {
            Some(k) if !self.export_key.is_empty() && k == self.export_key => Ok(()),
            _ => Err(AppError::Forbidden),
        }
    }

    /// 导出中奖名单（CSV，按登记时间倒序）
    pub async fn export_csv(&self) -> AppResult<String> {
        let winners = self.winners.list_winners().await?;

        let mut out = String::new();
        let header: Vec<String> = EXPORT_HEADER.iter().map(|h| h.to_string()).collect();
        write_row(&mut out, &header);

        for w in &winners {
            let date = w.created_at.format("%Y-%m-%d").to_string();
            let row = [
                quote_field(Some(&w.name)),
                quote_field(w.surname.as_deref()),
                quote_field(Some(&w.email)),
                quote_field(w.phone.as_deref()),
                quote_field(w.address.as_deref()),
                quote_field(Some(&w.prize_awarded)),
                quote_field(Some(&w.winning_code)),
                quote_field(Some(&date)),
            ];
            write_row(&mut out, &row);
        }

        log::info!("Exported {} winners", winners.len());
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryStore;
    use crate::entities::winner_entity as winners;
    use chrono::{Duration, TimeZone, Utc};
    use uuid::Uuid;

    fn winner(code: &str, name: &str, address: Option<&str>, minutes: i64) -> winners::Model {
        winners::Model {
            id: Uuid::new_v4(),
            name: name.to_string(),
            surname: None,
            email: format!("{}@example.com", code.to_lowercase()),
            phone: None,
            address: address.map(str::to_string),
            winning_code: code.to_string(),
            prize_awarded: "Balón".to_string(),
            created_at: Utc.with_ymd_and_hms(2026, 6, 1, 12, 0, 0).unwrap()
                + Duration::minutes(minutes),
        }
    }

    #[test]
    fn export_key_must_match() {
        let service = WinnerService::new(Arc::new(MemoryStore::new()), "s3cret".into());
        assert!(service.verify_key(Some("s3cret")).is_ok());
        assert!(matches!(
            service.verify_key(Some("wrong")),
            Err(AppError::Forbidden)
        ));
        assert!(matches!(service.verify_key(None), Err(AppError::Forbidden)));

        let unset = WinnerService::new(Arc::new(MemoryStore::new()), String::new());
        assert!(matches!(unset.verify_key(Some("")), Err(AppError::Forbidden)));
    }

    #[tokio::test]
    async fn empty_registry_exports_header_only() {
        let service = WinnerService::new(Arc::new(MemoryStore::new()), "k".into());
        let csv = service.export_csv().await.unwrap();
        assert_eq!(csv, "Name,Surname,Email,Phone,Address,Prize,Code,Date\n");
    }

    #[tokio::test]
    async fn exports_one_row_per_winner_newest_first() {
        let store = Arc::new(MemoryStore::new());
        store.insert_winner(winner("AAAA1111", "Ana", None, 0)).await.unwrap();
        store
            .insert_winner(winner("BBBB2222", "Luis \"el Flaco\"", Some("Calle 5, 2º B"), 30))
            .await
            .unwrap();

        let service = WinnerService::new(store, "k".into());
        let csv = service.export_csv().await.unwrap();
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[1],
            r#""Luis ""el Flaco""",,"bbbb2222@example.com",,"Calle 5, 2º B","Balón","BBBB2222","2026-06-01""#
        );
        assert_eq!(
            lines[2],
            r#""Ana",,"aaaa1111@example.com",,,"Balón","AAAA1111","2026-06-01""#
        );
    }
}
