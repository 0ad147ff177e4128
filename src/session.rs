use chrono::{DateTime, Local};
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Role {
    Admin,
    User,
}

impl Role {
    pub fn label(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::User => "user",
        }
    }

    pub fn landing_route(self) -> Route {
        match self {
            Self::Admin => Route::Admin,
            Self::User => Route::Dashboard,
        }
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

#[derive(Debug, Clone, Copy)]
struct Account {
    username: &'static str,
    password: &'static str,
    role: Role,
}

const ACCOUNTS: [Account; 2] = [
    Account {
        username: "admin",
        password: "admin",
        role: Role::Admin,
    },
    Account {
        username: "user1",
        password: "user1",
        role: Role::User,
    },
];

#[derive(Debug, Clone, Copy, Eq, PartialEq, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid username or password")]
    InvalidCredentials,
}

/// Signed-in identity. Exists only between a successful login and logout.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Session {
    pub username: String,
    pub role: Role,
    pub signed_in_at: DateTime<Local>,
}

impl Session {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

pub fn authenticate(username: &str, password: &str) -> Result<Session, AuthError> {
    let account = ACCOUNTS
        .iter()
        .find(|account| account.username == username && account.password == password)
        .ok_or(AuthError::InvalidCredentials)?;

    Ok(Session {
        username: account.username.to_string(),
        role: account.role,
        signed_in_at: Local::now(),
    })
}

/// Usernames and roles of the built-in accounts, for the admin view.
pub fn known_accounts() -> Vec<(&'static str, Role)> {
    ACCOUNTS
        .iter()
        .map(|account| (account.username, account.role))
        .collect()
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Route {
    Login,
    Dashboard,
    Admin,
}

impl Route {
    pub fn title(self) -> &'static str {
        match self {
            Self::Login => "login",
            Self::Dashboard => "dashboard",
            Self::Admin => "admin",
        }
    }

    /// Applies the route guards: anonymous users land on login, each role is
    /// kept on its own area.
    pub fn resolve(requested: Route, session: Option<&Session>) -> Route {
        let Some(session) = session else {
            return Route::Login;
        };

        match (requested, session.role) {
            (Route::Login, role) => role.landing_route(),
            (Route::Dashboard, Role::Admin) => Route::Admin,
            (Route::Admin, Role::User) => Route::Dashboard,
            (route, _) => route,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{AuthError, Role, Route, authenticate, known_accounts};

    #[test]
    fn static_accounts_map_to_roles() {
        let admin = authenticate("admin", "admin").expect("admin signs in");
        assert_eq!(admin.role, Role::Admin);
        assert!(admin.is_admin());

        let user = authenticate("user1", "user1").expect("user signs in");
        assert_eq!(user.role, Role::User);
        assert_eq!(user.username, "user1");
    }

    #[test]
    fn wrong_credentials_are_rejected() {
        assert_eq!(
            authenticate("user1", "admin"),
            Err(AuthError::InvalidCredentials)
        );
        assert_eq!(authenticate("", ""), Err(AuthError::InvalidCredentials));
        assert_eq!(
            AuthError::InvalidCredentials.to_string(),
            "Invalid username or password"
        );
    }

    #[test]
    fn anonymous_requests_land_on_login() {
        assert_eq!(Route::resolve(Route::Dashboard, None), Route::Login);
        assert_eq!(Route::resolve(Route::Admin, None), Route::Login);
    }

    #[test]
    fn guards_keep_roles_in_their_area() {
        let admin = authenticate("admin", "admin").expect("admin");
        let user = authenticate("user1", "user1").expect("user");

        assert_eq!(Route::resolve(Route::Dashboard, Some(&admin)), Route::Admin);
        assert_eq!(Route::resolve(Route::Admin, Some(&admin)), Route::Admin);
        assert_eq!(Route::resolve(Route::Login, Some(&admin)), Route::Admin);

        assert_eq!(Route::resolve(Route::Admin, Some(&user)), Route::Dashboard);
        assert_eq!(Route::resolve(Route::Login, Some(&user)), Route::Dashboard);
    }

    #[test]
    fn account_listing_has_no_passwords() {
        let accounts = known_accounts();
        assert_eq!(accounts.len(), 2);
        assert!(accounts.contains(&("admin", Role::Admin)));
    }
}
