use std::sync::Arc;

use crate::auth::AuthService;
use crate::auth::password::PasswordHasher;
use crate::clock::SharedClock;
use crate::config::Config;
use crate::store::SharedStore;

pub type SharedState = Arc<AppState>;

pub struct AppState {
    pub config: Config,
    pub auth: AuthService,
}

impl AppState {
    pub fn new(
        store: SharedStore,
        clock: SharedClock,
        hasher: PasswordHasher,
        config: Config,
    ) -> Self {
        let auth = AuthService::new(store, hasher, clock, &config.auth);
        Self { config, auth }
    }
}
