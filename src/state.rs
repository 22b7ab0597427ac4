use std::sync::Arc;

use sqlx::PgPool;

use crate::auth::jwt::TokenKeys;
use crate::config::Config;
use crate::storage::ImageStore;

pub type SharedState = Arc<AppState>;

pub struct AppState {
    pub pool: PgPool,
    pub config: Config,
    pub tokens: TokenKeys,
    pub images: Arc<dyn ImageStore>,
}
