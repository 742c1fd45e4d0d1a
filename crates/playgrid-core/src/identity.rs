//! Session identities: session id, login name, and password.
//!
//! Identifiers are random but not checked for uniqueness. A collision
//! between two live sessions is possible and is not retried; callers that
//! need a stronger guarantee can supply their own [`IdentityGenerator`].

use rand::Rng;
use serde::{Deserialize, Serialize};

pub const SESSION_PREFIX: &str = "steam-";
pub const USERNAME_PREFIX: &str = "user-";

pub const SESSION_SUFFIX_LEN: usize = 4;
pub const USERNAME_SUFFIX_LEN: usize = 5;
pub const PASSWORD_LEN: usize = 12;

const LOWER_ALNUM: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
const LOWER_ALPHA: &[u8] = b"abcdefghijklmnopqrstuvwxyz";
const MIXED_ALNUM: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Login pair handed to the caller and injected into the workload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// Everything generated for a new session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionIdentity {
    pub session_id: String,
    pub credentials: Credentials,
}

/// Source of session identifiers and credentials.
pub trait IdentityGenerator: Send + Sync {
    fn session_id(&self) -> String;
    fn username(&self) -> String;
    fn password(&self) -> String;

    fn generate(&self) -> SessionIdentity {
        SessionIdentity {
            session_id: self.session_id(),
            credentials: Credentials {
                username: self.username(),
                password: self.password(),
            },
        }
    }
}

/// Default generator backed by the thread-local RNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomIdentityGenerator;

impl IdentityGenerator for RandomIdentityGenerator {
    fn session_id(&self) -> String {
        format!("{SESSION_PREFIX}{}", random_string(LOWER_ALNUM, SESSION_SUFFIX_LEN))
    }

    fn username(&self) -> String {
        format!("{USERNAME_PREFIX}{}", random_string(LOWER_ALPHA, USERNAME_SUFFIX_LEN))
    }

    fn password(&self) -> String {
        random_string(MIXED_ALNUM, PASSWORD_LEN)
    }
}

fn random_string(charset: &[u8], len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| charset[rng.gen_range(0..charset.len())] as char)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use regex::Regex;

    #[test]
    fn session_id_shape() {
        let re = Regex::new(r"^steam-[a-z0-9]{4}$").unwrap();
        for _ in 0..200 {
            let id = RandomIdentityGenerator.session_id();
            assert!(re.is_match(&id), "{id}");
        }
    }

    #[test]
    fn username_shape() {
        let re = Regex::new(r"^user-[a-z]{5}$").unwrap();
        for _ in 0..200 {
            let name = RandomIdentityGenerator.username();
            assert!(re.is_match(&name), "{name}");
        }
    }

    #[test]
    fn password_shape() {
        let re = Regex::new(r"^[A-Za-z0-9]{12}$").unwrap();
        for _ in 0..200 {
            let pw = RandomIdentityGenerator.password();
            assert!(re.is_match(&pw), "{pw}");
        }
    }

    #[test]
    fn generate_fills_every_field() {
        let identity = RandomIdentityGenerator.generate();
        assert!(identity.session_id.starts_with(SESSION_PREFIX));
        assert!(identity.credentials.username.starts_with(USERNAME_PREFIX));
        assert_eq!(identity.credentials.password.len(), PASSWORD_LEN);
    }

    struct Fixed;

    impl IdentityGenerator for Fixed {
        fn session_id(&self) -> String {
            "steam-test".into()
        }
        fn username(&self) -> String {
            "user-fixed".into()
        }
        fn password(&self) -> String {
            "hunter2hunter".into()
        }
    }

    #[test]
    fn generator_is_pluggable() {
        let identity = Fixed.generate();
        assert_eq!(identity.session_id, "steam-test");
        assert_eq!(identity.credentials.username, "user-fixed");
        assert_eq!(identity.credentials.password, "hunter2hunter");
    }
}
