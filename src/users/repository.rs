use async_trait::async_trait;

use super::types::User;
use crate::TeamError;

#[derive(Debug, Clone)]
pub struct CreateUser {
    pub external_id: String,
    pub username: String,
    pub email: Option<String>,
}

#[async_trait]
pub trait UserRepository: Send {
    async fn create_user(&mut self, data: CreateUser) -> Result<User, TeamError>;
    async fn find_user(&mut self, id: i64) -> Result<Option<User>, TeamError>;
    async fn find_user_by_external_id(
        &mut self,
        external_id: &str,
    ) -> Result<Option<User>, TeamError>;
    async fn update_user_profile(
        &mut self,
        id: i64,
        username: &str,
        email: Option<&str>,
    ) -> Result<User, TeamError>;
}
