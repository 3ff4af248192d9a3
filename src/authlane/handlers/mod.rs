pub mod health;
pub use self::health::health;

pub mod session;
pub use self::session::{signin, signout};

pub mod pages;
pub use self::pages::{account, admin, admin_rank, authorized, protected, unauthorized, user};

/// Where a successful sign-in lands.
pub const ACCOUNT_ROUTE: &str = "/account";
