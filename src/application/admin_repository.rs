// Repository trait for the backend's administration API
use crate::application::device_repository::Session;
use crate::application::error::Result;
use crate::domain::admin::{NewUser, Schedule, Stats, User};
use async_trait::async_trait;

#[async_trait]
pub trait AdminRepository: Send + Sync {
    async fn list_users(&self, session: &Session) -> Result<Vec<User>>;

    async fn create_user(&self, session: &Session, user: &NewUser) -> Result<()>;

    async fn delete_user(&self, session: &Session, user_id: &str) -> Result<()>;

    async fn list_schedules(&self, session: &Session) -> Result<Vec<Schedule>>;

    async fn delete_schedule(&self, session: &Session, schedule_id: &str) -> Result<()>;

    async fn stats(&self, session: &Session) -> Result<Stats>;
}
