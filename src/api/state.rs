use std::sync::Arc;

use crate::commentary::CommentaryGenerator;
use crate::config::AppConfig;
use crate::storage::MatchStore;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<MatchStore>,
    pub commentary: CommentaryGenerator,
    pub config: Arc<AppConfig>,
}
