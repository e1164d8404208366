//! Shared HTTP adapter state.
//!
//! Handlers receive this via `actix_web::web::Data` and only see domain
//! driving ports, so they stay testable without I/O.

use std::sync::Arc;

use crate::domain::ports::{AccountCommand, AccountQuery, LoginService};

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub accounts: Arc<dyn AccountCommand>,
    pub accounts_query: Arc<dyn AccountQuery>,
    pub login: Arc<dyn LoginService>,
}

impl HttpState {
    /// Bundle the driving ports.
    pub fn new(
        accounts: Arc<dyn AccountCommand>,
        accounts_query: Arc<dyn AccountQuery>,
        login: Arc<dyn LoginService>,
    ) -> Self {
        Self {
            accounts,
            accounts_query,
            login,
        }
    }

    /// Use one service for every port.
    ///
    /// # Examples
    /// ```
    /// use std::sync::Arc;
    ///
    /// use accounts::domain::AccountService;
    /// use accounts::inbound::http::state::HttpState;
    /// use accounts::outbound::crypto::{Argon2Params, Argon2PasswordHasher};
    /// use accounts::outbound::memory::InMemoryAccountStore;
    ///
    /// let store = InMemoryAccountStore::new(Arc::new(mockable::DefaultClock));
    /// let hasher = Argon2PasswordHasher::new(Argon2Params::default()).expect("default params");
    /// let service = AccountService::new(Arc::new(store), Arc::new(hasher));
    /// let _state = HttpState::from_service(Arc::new(service));
    /// ```
    pub fn from_service<T>(service: Arc<T>) -> Self
    where
        T: AccountCommand + AccountQuery + LoginService + 'static,
    {
        Self {
            accounts: service.clone(),
            accounts_query: service.clone(),
            login: service,
        }
    }
}
