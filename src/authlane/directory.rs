//! In-memory user directory backing the demo strategies.
//!
//! Stands in for the user-storage layer: it looks accounts up by username
//! and keeps the remember-me tokens it handed out.

use parking_lot::Mutex;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde_json::Value;
use std::{
    collections::HashMap,
    fmt,
    sync::Arc,
    time::{Duration, Instant},
};
use tracing::debug;
use ulid::Ulid;

use crate::auth::{Credentials, Model, Registry, DEFAULT_MAX_AGE_SECONDS};

/// Rank required by the `admin` role when the request gives none.
pub const ADMIN_RANK: i64 = 2;

/// Remember tokens live as long as the cookie that carries them.
pub const TOKEN_TTL: Duration = Duration::from_secs(DEFAULT_MAX_AGE_SECONDS.unsigned_abs());

#[derive(Clone, Serialize)]
pub struct Account {
    pub id: u64,
    pub username: String,
    pub rank: i64,
    #[serde(skip)]
    password: SecretString,
}

impl Account {
    pub fn new(id: u64, username: &str, rank: i64, password: &str) -> Self {
        Self {
            id,
            username: username.to_string(),
            rank,
            password: SecretString::from(password.to_string()),
        }
    }
}

impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Account")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("rank", &self.rank)
            .field("password", &"***")
            .finish()
    }
}

#[derive(Debug)]
struct Token {
    account: u64,
    expires_at: Instant,
}

#[derive(Debug)]
pub struct Directory {
    accounts: Vec<Account>,
    tokens: Mutex<HashMap<String, Token>>,
    token_ttl: Duration,
}

impl Directory {
    #[must_use]
    pub fn new(accounts: Vec<Account>) -> Self {
        Self {
            accounts,
            tokens: Mutex::new(HashMap::new()),
            token_ttl: TOKEN_TTL,
        }
    }

    #[must_use]
    pub fn with_token_ttl(mut self, ttl: Duration) -> Self {
        self.token_ttl = ttl;
        self
    }

    /// Two demo accounts: `alice` (admin rank) and `bob` (regular rank).
    #[must_use]
    pub fn seeded() -> Self {
        Self::new(vec![
            Account::new(1, "alice", ADMIN_RANK, "wonderland"),
            Account::new(2, "bob", 1, "builder"),
        ])
    }

    #[must_use]
    pub fn authenticate(&self, username: &str, password: &str) -> Option<&Account> {
        self.accounts
            .iter()
            .find(|account| account.username == username)
            .filter(|account| account.password.expose_secret() == password)
    }

    /// Hand out a remember-me token for an account.
    pub fn issue_token(&self, id: u64) -> String {
        let token = Ulid::new().to_string();
        let now = Instant::now();
        let mut tokens = self.tokens.lock();
        tokens.retain(|_, issued| issued.expires_at > now);
        tokens.insert(
            token.clone(),
            Token {
                account: id,
                expires_at: now + self.token_ttl,
            },
        );
        token
    }

    /// Tokens that can still be redeemed.
    #[must_use]
    pub fn active_tokens(&self) -> usize {
        let now = Instant::now();
        let mut tokens = self.tokens.lock();
        tokens.retain(|_, issued| issued.expires_at > now);
        tokens.len()
    }

    #[must_use]
    pub fn find(&self, id: u64) -> Option<&Account> {
        self.accounts.iter().find(|account| account.id == id)
    }

    #[must_use]
    pub fn redeem(&self, token: &str) -> Option<&Account> {
        let mut tokens = self.tokens.lock();
        let &Token {
            account,
            expires_at,
        } = tokens.get(token)?;
        if expires_at <= Instant::now() {
            tokens.remove(token);
            debug!("expired remember token refused");
            return None;
        }
        drop(tokens);
        self.find(account)
    }

    pub fn revoke(&self, token: &str) {
        if self.tokens.lock().remove(token).is_some() {
            debug!("remember token revoked");
        }
    }
}

fn credentials(account: &Account) -> Credentials {
    Arc::new(Model(account.clone()))
}

/// Install the demo strategies on `registry`.
///
/// - auth: checks the `username`/`password` form fields and, when `remember`
///   is present, issues a token into the remember cookie;
/// - remember/forget: redeem and revoke those tokens;
/// - `admin` role: the rank of the account behind the session record must
///   reach the requested rank ([`ADMIN_RANK`] by default). The rank is read
///   from the directory since the record may only carry the id.
#[must_use]
pub fn install(mut registry: Registry, directory: Arc<Directory>) -> Registry {
    let remember_cookie = registry.remember_cookie().to_string();

    let users = directory.clone();
    registry.set_auth_strategy(move |context| {
        let (Some(username), Some(password)) = (context.param("username"), context.param("password"))
        else {
            return Ok(None);
        };
        let Some(account) = users.authenticate(username, password) else {
            debug!("invalid credentials for {username}");
            return Ok(None);
        };
        let credentials = credentials(account);
        if context.param("remember").is_some() {
            let token = users.issue_token(account.id);
            context.cookies().set(&remember_cookie, &token);
        }
        Ok(Some(credentials))
    });

    let users = directory.clone();
    registry.set_remember_strategy(move |_, token| {
        Ok(users.redeem(token.expose_secret()).map(credentials))
    });

    let users = directory.clone();
    registry.set_forget_strategy(move |_, token| {
        users.revoke(token.expose_secret());
        Ok(())
    });

    let users = directory;
    registry.set_named_role_strategy("admin", move |_, user, rank| {
        let required = rank.and_then(Value::as_i64).unwrap_or(ADMIN_RANK);
        let Some(account) = user
            .id()
            .and_then(|id| id.as_u64())
            .and_then(|id| users.find(id))
        else {
            return Ok(false);
        };
        Ok(account.rank >= required)
    });

    registry
}
