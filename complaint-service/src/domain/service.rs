//! 投诉生命周期领域服务
//!
//! 负责创建 / 查询 / 更新的决策逻辑：
//! - 创建时总是先做地理定位（即使最终走重复投诉分支也会调用）
//! - 按 (product_id, reported_by) 去重：已存在则计数加一，否则新建
//! - 更新只替换内容
//!
//! 去重不变量依赖存储层唯一约束，而不是仅靠查询预检；
//! 并发写入冲突时重新执行一次"读取-写入"步骤。

use complaint_core::{ComplaintError, ComplaintResult};
use tracing::{info, instrument, warn};

use crate::domain::model::{Complaint, ComplaintId, ComplaintSubmission, NewComplaint};
use crate::domain::repository::{
    ComplaintRepositoryRef, GeolocationResolverRef, RepositoryError,
};

/// 写入冲突时"读取-写入"步骤的最大尝试次数
const MAX_WRITE_ATTEMPTS: usize = 3;

pub struct ComplaintDomainService {
    repository: ComplaintRepositoryRef,
    geolocation: GeolocationResolverRef,
}

impl ComplaintDomainService {
    pub fn new(repository: ComplaintRepositoryRef, geolocation: GeolocationResolverRef) -> Self {
        Self {
            repository,
            geolocation,
        }
    }

    /// 全部投诉，按存储顺序
    pub async fn list_all(&self) -> ComplaintResult<Vec<Complaint>> {
        Ok(self.repository.find_all().await?)
    }

    pub async fn get_by_id(&self, id: ComplaintId) -> ComplaintResult<Complaint> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or(ComplaintError::NotFound(id))
    }

    /// 提交投诉：新建记录，或对已存在的去重键计数加一
    #[instrument(skip(self, submission), fields(product_id = %submission.product_id, reported_by = %submission.reported_by))]
    pub async fn create(&self, submission: ComplaintSubmission) -> ComplaintResult<Complaint> {
        let country = self
            .geolocation
            .resolve_country(&submission.client_ip)
            .await;

        for attempt in 1..=MAX_WRITE_ATTEMPTS {
            let existing = self
                .repository
                .find_by_product_id_and_reported_by(
                    &submission.product_id,
                    &submission.reported_by,
                )
                .await?;

            let outcome = match existing {
                Some(complaint) => {
                    let incremented = complaint.with_incremented_counter()?;
                    self.repository
                        .save(&incremented)
                        .await
                        .map(|saved| (saved, false))
                }
                None => {
                    let draft = NewComplaint::new(
                        submission.product_id.clone(),
                        submission.content.clone(),
                        submission.reported_by.clone(),
                        country.clone(),
                    );
                    self.repository
                        .insert(&draft)
                        .await
                        .map(|saved| (saved, true))
                }
            };

            match outcome {
                Ok((saved, true)) => {
                    info!(id = saved.id(), country = %saved.country(), "complaint created");
                    return Ok(saved);
                }
                Ok((saved, false)) => {
                    info!(id = saved.id(), counter = saved.counter(), "duplicate complaint, counter incremented");
                    return Ok(saved);
                }
                Err(err @ (RepositoryError::DuplicateKey { .. } | RepositoryError::StaleWrite(_))) => {
                    warn!(attempt, error = %err, "concurrent complaint write detected, retrying");
                }
                Err(err) => return Err(err.into()),
            }
        }

        Err(ComplaintError::Conflict(format!(
            "complaint for product {} reported by {} kept changing after {} attempts",
            submission.product_id, submission.reported_by, MAX_WRITE_ATTEMPTS
        )))
    }

    /// 替换投诉内容，其余字段保持不变
    #[instrument(skip(self, content))]
    pub async fn update_content(&self, id: ComplaintId, content: &str) -> ComplaintResult<Complaint> {
        for attempt in 1..=MAX_WRITE_ATTEMPTS {
            let complaint = self.get_by_id(id).await?;

            match self.repository.save(&complaint.with_content(content)).await {
                Ok(saved) => {
                    info!(id, "complaint content updated");
                    return Ok(saved);
                }
                Err(err @ RepositoryError::StaleWrite(_)) => {
                    warn!(attempt, error = %err, "concurrent complaint update detected, retrying");
                }
                Err(err) => return Err(err.into()),
            }
        }

        Err(ComplaintError::Conflict(format!(
            "complaint {id} kept changing after {MAX_WRITE_ATTEMPTS} attempts"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use async_trait::async_trait;

    use crate::domain::model::{ComplaintRestoreParams, UNKNOWN_COUNTRY};
    use crate::domain::repository::{
        ComplaintRepository, GeolocationResolver, RepositoryResult,
    };
    use crate::infrastructure::persistence::memory::InMemoryComplaintRepository;

    /// 返回固定国家并记录调用次数
    struct FixedResolver {
        country: String,
        calls: AtomicUsize,
    }

    impl FixedResolver {
        fn new(country: &str) -> Arc<Self> {
            Arc::new(Self {
                country: country.to_string(),
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl GeolocationResolver for FixedResolver {
        async fn resolve_country(&self, _ip_address: &str) -> String {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.country.clone()
        }
    }

    /// 包装内存仓储：统计写入次数，并可模拟一次并发写入
    struct ScriptedRepository {
        inner: InMemoryComplaintRepository,
        writes: AtomicUsize,
        race_on_insert: AtomicBool,
        race_on_save: AtomicBool,
    }

    impl ScriptedRepository {
        fn new() -> Self {
            Self {
                inner: InMemoryComplaintRepository::new(),
                writes: AtomicUsize::new(0),
                race_on_insert: AtomicBool::new(false),
                race_on_save: AtomicBool::new(false),
            }
        }
    }

    #[async_trait]
    impl ComplaintRepository for ScriptedRepository {
        async fn find_all(&self) -> RepositoryResult<Vec<Complaint>> {
            self.inner.find_all().await
        }

        async fn find_by_id(&self, id: ComplaintId) -> RepositoryResult<Option<Complaint>> {
            self.inner.find_by_id(id).await
        }

        async fn find_by_product_id_and_reported_by(
            &self,
            product_id: &str,
            reported_by: &str,
        ) -> RepositoryResult<Option<Complaint>> {
            self.inner
                .find_by_product_id_and_reported_by(product_id, reported_by)
                .await
        }

        async fn insert(&self, complaint: &NewComplaint) -> RepositoryResult<Complaint> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            if self.race_on_insert.swap(false, Ordering::SeqCst) {
                // 另一个请求抢先写入了同一去重键
                let rival = NewComplaint::new(
                    complaint.product_id.clone(),
                    "from the faster request",
                    complaint.reported_by.clone(),
                    "Germany",
                );
                self.inner.insert(&rival).await?;
            }
            self.inner.insert(complaint).await
        }

        async fn save(&self, complaint: &Complaint) -> RepositoryResult<Complaint> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            if self.race_on_save.swap(false, Ordering::SeqCst) {
                let current = self
                    .inner
                    .find_by_id(complaint.id())
                    .await?
                    .expect("raced complaint exists");
                self.inner
                    .save(&current.with_incremented_counter().expect("counter below limit"))
                    .await?;
            }
            self.inner.save(complaint).await
        }
    }

    fn submission(product_id: &str, content: &str, reported_by: &str, ip: &str) -> ComplaintSubmission {
        ComplaintSubmission {
            product_id: product_id.to_string(),
            content: content.to_string(),
            reported_by: reported_by.to_string(),
            client_ip: ip.to_string(),
        }
    }

    fn service_with(
        repository: Arc<ScriptedRepository>,
        resolver: Arc<FixedResolver>,
    ) -> ComplaintDomainService {
        ComplaintDomainService::new(repository, resolver)
    }

    #[tokio::test]
    async fn first_submission_creates_record_with_resolved_country() {
        let repository = Arc::new(ScriptedRepository::new());
        let service = service_with(repository.clone(), FixedResolver::new("Poland"));

        let created = service
            .create(submission("p1", "broken", "u1", "1.2.3.4"))
            .await
            .unwrap();

        assert_eq!(created.product_id(), "p1");
        assert_eq!(created.content(), "broken");
        assert_eq!(created.reported_by(), "u1");
        assert_eq!(created.country(), "Poland");
        assert_eq!(created.counter(), 1);
    }

    #[tokio::test]
    async fn repeat_submission_increments_counter_and_keeps_original_content() {
        let repository = Arc::new(ScriptedRepository::new());
        let resolver = FixedResolver::new("Poland");
        let service = service_with(repository.clone(), resolver.clone());

        let first = service
            .create(submission("p1", "broken", "u1", "1.2.3.4"))
            .await
            .unwrap();
        let second = service
            .create(submission("p1", "still broken", "u1", "5.6.7.8"))
            .await
            .unwrap();

        assert_eq!(second.id(), first.id());
        assert_eq!(second.counter(), 2);
        // 重复提交的新内容被有意丢弃，首次提交内容保持权威
        assert_eq!(second.content(), "broken");
        assert_eq!(second.country(), "Poland");
        assert_eq!(second.created_at(), first.created_at());
        assert_eq!(service.list_all().await.unwrap().len(), 1);
        // 重复分支同样会调用地理定位
        assert_eq!(resolver.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn repeat_submission_keeps_original_country_when_resolver_changes() {
        let repository = Arc::new(ScriptedRepository::new());
        let first_service = service_with(repository.clone(), FixedResolver::new("Poland"));
        first_service
            .create(submission("p1", "broken", "u1", "1.2.3.4"))
            .await
            .unwrap();

        let second_service = service_with(repository.clone(), FixedResolver::new(UNKNOWN_COUNTRY));
        let updated = second_service
            .create(submission("p1", "again", "u1", "9.9.9.9"))
            .await
            .unwrap();

        assert_eq!(updated.counter(), 2);
        assert_eq!(updated.country(), "Poland");
    }

    #[tokio::test]
    async fn different_reporters_or_products_create_separate_records() {
        let repository = Arc::new(ScriptedRepository::new());
        let service = service_with(repository.clone(), FixedResolver::new("Poland"));

        service.create(submission("p1", "a", "u1", "1.1.1.1")).await.unwrap();
        service.create(submission("p1", "b", "u2", "1.1.1.1")).await.unwrap();
        service.create(submission("p2", "c", "u1", "1.1.1.1")).await.unwrap();

        let all = service.list_all().await.unwrap();
        assert_eq!(all.len(), 3);
        assert!(all.iter().all(|c| c.counter() == 1));
        // 按插入顺序返回
        let ids: Vec<_> = all.iter().map(Complaint::id).collect();
        let mut sorted = ids.clone();
        sorted.sort();
        assert_eq!(ids, sorted);
    }

    #[tokio::test]
    async fn unknown_country_is_stored_when_resolution_fails() {
        let repository = Arc::new(ScriptedRepository::new());
        let service = service_with(repository, FixedResolver::new(UNKNOWN_COUNTRY));

        let created = service
            .create(submission("p1", "broken", "u1", "10.0.0.1"))
            .await
            .unwrap();
        assert_eq!(created.country(), UNKNOWN_COUNTRY);
    }

    #[tokio::test]
    async fn get_by_id_reports_missing_id() {
        let repository = Arc::new(ScriptedRepository::new());
        let service = service_with(repository, FixedResolver::new("Poland"));

        let err = service.get_by_id(42).await.unwrap_err();
        assert!(err.is_not_found());
        assert!(err.to_string().contains("42"));
    }

    #[tokio::test]
    async fn update_replaces_only_content() {
        let repository = Arc::new(ScriptedRepository::new());
        let service = service_with(repository.clone(), FixedResolver::new("Poland"));

        let created = service
            .create(submission("p1", "broken", "u1", "1.2.3.4"))
            .await
            .unwrap();
        service
            .create(submission("p1", "ignored", "u1", "1.2.3.4"))
            .await
            .unwrap();

        let updated = service.update_content(created.id(), "fixed?").await.unwrap();

        assert_eq!(updated.content(), "fixed?");
        assert_eq!(updated.counter(), 2);
        assert_eq!(updated.country(), "Poland");
        assert_eq!(updated.product_id(), "p1");
        assert_eq!(updated.reported_by(), "u1");
        assert_eq!(updated.created_at(), created.created_at());
        assert_eq!(service.get_by_id(created.id()).await.unwrap().content(), "fixed?");
    }

    #[tokio::test]
    async fn update_of_missing_id_fails_without_writing() {
        let repository = Arc::new(ScriptedRepository::new());
        let service = service_with(repository.clone(), FixedResolver::new("Poland"));

        let err = service.update_content(999, "anything").await.unwrap_err();

        assert_eq!(err.to_string(), "Complaint not found with id: 999");
        assert_eq!(repository.writes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn update_does_not_call_resolver() {
        let repository = Arc::new(ScriptedRepository::new());
        let resolver = FixedResolver::new("Poland");
        let service = service_with(repository, resolver.clone());

        let created = service
            .create(submission("p1", "broken", "u1", "1.2.3.4"))
            .await
            .unwrap();
        service.update_content(created.id(), "new").await.unwrap();
        service.get_by_id(created.id()).await.unwrap();
        service.list_all().await.unwrap();

        assert_eq!(resolver.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn repeat_submission_at_counter_limit_fails_without_writing() {
        let repository = Arc::new(ScriptedRepository::new());
        let service = service_with(repository.clone(), FixedResolver::new("Poland"));
        let created = service
            .create(submission("p1", "broken", "u1", "1.2.3.4"))
            .await
            .unwrap();
        let at_limit = Complaint::restore(ComplaintRestoreParams {
            id: created.id(),
            product_id: created.product_id().to_string(),
            content: created.content().to_string(),
            created_at: created.created_at(),
            reported_by: created.reported_by().to_string(),
            country: created.country().to_string(),
            counter: i32::MAX,
            version: created.version(),
        });
        repository.inner.save(&at_limit).await.unwrap();
        let writes_before = repository.writes.load(Ordering::SeqCst);

        let err = service
            .create(submission("p1", "again", "u1", "1.2.3.4"))
            .await
            .unwrap_err();

        assert!(matches!(err, ComplaintError::CounterOverflow(id) if id == created.id()));
        assert_eq!(repository.writes.load(Ordering::SeqCst), writes_before);
        let stored = service.get_by_id(created.id()).await.unwrap();
        assert_eq!(stored.counter(), i32::MAX);
    }

    #[tokio::test]
    async fn racing_insert_is_converted_into_increment() {
        let repository = Arc::new(ScriptedRepository::new());
        repository.race_on_insert.store(true, Ordering::SeqCst);
        let resolver = FixedResolver::new("Poland");
        let service = service_with(repository.clone(), resolver.clone());

        let result = service
            .create(submission("p1", "broken", "u1", "1.2.3.4"))
            .await
            .unwrap();

        assert_eq!(result.counter(), 2);
        assert_eq!(result.content(), "from the faster request");
        assert_eq!(service.list_all().await.unwrap().len(), 1);
        // 重试不会再次调用地理定位
        assert_eq!(resolver.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn racing_increment_is_not_lost() {
        let repository = Arc::new(ScriptedRepository::new());
        let service = service_with(repository.clone(), FixedResolver::new("Poland"));
        service
            .create(submission("p1", "broken", "u1", "1.2.3.4"))
            .await
            .unwrap();

        repository.race_on_save.store(true, Ordering::SeqCst);
        let result = service
            .create(submission("p1", "again", "u1", "1.2.3.4"))
            .await
            .unwrap();

        // 1 (首次) + 1 (并发请求) + 1 (本次)
        assert_eq!(result.counter(), 3);
    }

    #[tokio::test]
    async fn racing_update_keeps_concurrent_increment() {
        let repository = Arc::new(ScriptedRepository::new());
        let service = service_with(repository.clone(), FixedResolver::new("Poland"));
        let created = service
            .create(submission("p1", "broken", "u1", "1.2.3.4"))
            .await
            .unwrap();

        repository.race_on_save.store(true, Ordering::SeqCst);
        let updated = service.update_content(created.id(), "edited").await.unwrap();

        assert_eq!(updated.content(), "edited");
        assert_eq!(updated.counter(), 2);
    }
}
