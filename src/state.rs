use crate::{config::AuthSettings, db::OrmConn};

#[derive(Clone)]
pub struct AppState {
    pub orm: OrmConn,
    pub auth: AuthSettings,
}

impl AppState {
    pub fn new(orm: OrmConn, auth: AuthSettings) -> Self {
        Self { orm, auth }
    }
}
