// Admin service - Use cases for users, schedules and the stats overview
use crate::application::admin_repository::AdminRepository;
use crate::application::device_repository::Session;
use crate::application::error::{RepositoryError, Result};
use crate::domain::admin::{NewUser, Schedule, StatCard, Stats, User};
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Clone, Serialize)]
pub struct StatsOverview {
    pub stats: Stats,
    pub cards: Vec<StatCard>,
}

#[derive(Clone)]
pub struct AdminService {
    repository: Arc<dyn AdminRepository>,
}

impl AdminService {
    pub fn new(repository: Arc<dyn AdminRepository>) -> Self {
        Self { repository }
    }

    pub async fn list_users(&self, session: &Session) -> Result<Vec<User>> {
        self.repository.list_users(session).await
    }

    pub async fn create_user(&self, session: &Session, user: &NewUser) -> Result<()> {
        self.repository.create_user(session, user).await?;
        tracing::info!("Created user {} ({:?})", user.email, user.role);
        Ok(())
    }

    pub async fn delete_user(&self, session: &Session, user_id: &str) -> Result<()> {
        self.repository.delete_user(session, user_id).await?;
        tracing::info!("Deleted user {}", user_id);
        Ok(())
    }

    pub async fn list_schedules(&self, session: &Session) -> Result<Vec<Schedule>> {
        self.repository.list_schedules(session).await
    }

    pub async fn delete_schedule(&self, session: &Session, schedule_id: &str) -> Result<()> {
        self.repository.delete_schedule(session, schedule_id).await?;
        tracing::info!("Deleted schedule {}", schedule_id);
        Ok(())
    }

    /// Platform counters; any failure other than an expired session shows zeros
    pub async fn stats_overview(&self, session: &Session) -> Result<StatsOverview> {
        let stats = match self.repository.stats(session).await {
            Ok(stats) => stats,
            Err(RepositoryError::Unauthorized) => return Err(RepositoryError::Unauthorized),
            Err(e) => {
                tracing::warn!("Error fetching stats: {}", e);
                Stats::default()
            }
        };

        Ok(StatsOverview {
            cards: stats.cards(),
            stats,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::testing::InMemoryRepository;
    use crate::domain::admin::UserRole;

    fn service(repo: &Arc<InMemoryRepository>) -> AdminService {
        AdminService::new(repo.clone())
    }

    fn new_user(email: &str) -> NewUser {
        NewUser {
            name: "Grace".to_string(),
            email: email.to_string(),
            password: "hopper".to_string(),
            role: UserRole::Admin,
        }
    }

    #[tokio::test]
    async fn test_create_and_delete_user() {
        let repo = Arc::new(InMemoryRepository::with_greenhouse());
        let svc = service(&repo);
        let session = Session::anonymous();

        svc.create_user(&session, &new_user("grace@example.com")).await.unwrap();
        let users = svc.list_users(&session).await.unwrap();
        assert_eq!(users.len(), 2);
        assert_eq!(users[1].role, "admin");

        svc.delete_user(&session, &users[1].id).await.unwrap();
        assert_eq!(svc.list_users(&session).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_email_is_rejected() {
        let repo = Arc::new(InMemoryRepository::with_greenhouse());
        let err = service(&repo)
            .create_user(&Session::anonymous(), &new_user("ada@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::Rejected { status: 409, .. }));
    }

    #[tokio::test]
    async fn test_delete_schedule() {
        let repo = Arc::new(InMemoryRepository::with_greenhouse());
        let svc = service(&repo);
        let session = Session::anonymous();

        assert_eq!(svc.list_schedules(&session).await.unwrap().len(), 1);
        svc.delete_schedule(&session, "sched1").await.unwrap();
        assert!(svc.list_schedules(&session).await.unwrap().is_empty());

        let err = svc.delete_schedule(&session, "sched1").await.unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_stats_overview() {
        let repo = Arc::new(InMemoryRepository::with_greenhouse());
        let overview = service(&repo)
            .stats_overview(&Session::anonymous())
            .await
            .unwrap();
        assert_eq!(
            overview.stats,
            Stats { users: 1, devices: 1, telemetry_records: 4, schedules: 1 }
        );
        assert_eq!(overview.cards[1].value, 1);
    }

    #[tokio::test]
    async fn test_stats_failure_shows_zeros() {
        let repo = Arc::new(InMemoryRepository::with_greenhouse().failing_stats(|| {
            RepositoryError::Status { status: 500, body: String::new() }
        }));
        let overview = service(&repo)
            .stats_overview(&Session::anonymous())
            .await
            .unwrap();
        assert_eq!(overview.stats, Stats::default());

        let repo = Arc::new(
            InMemoryRepository::with_greenhouse().failing_stats(|| RepositoryError::Unauthorized),
        );
        let err = service(&repo)
            .stats_overview(&Session::anonymous())
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::Unauthorized));
    }
}
