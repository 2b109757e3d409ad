use aide::axum::ApiRouter;
use rand::distributions::Alphanumeric;
use rand::Rng;

use crate::database::AppState;
use crate::error::{ServiceError, ServiceResult};

pub mod auth;
pub mod orders;
pub mod payments;
pub mod points;
pub mod reservations;
pub mod users;

pub fn init(app_state: AppState) -> ApiRouter {
    ApiRouter::new()
        .merge(auth::router(app_state.clone()))
        .merge(users::router(app_state.clone()))
        .merge(points::router(app_state.clone()))
        .merge(orders::router(app_state.clone()))
        .merge(payments::router(app_state.clone()))
        .merge(reservations::router(app_state))
}

const PASSWORD_SALT_LENGTH: usize = 16;

/// Hash a password with a fresh random salt. The salt is stored as the
/// prefix of the returned value.
pub fn password_hash(password: &str) -> Vec<u8> {
    let salt: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(PASSWORD_SALT_LENGTH)
        .map(char::from)
        .collect();
    let hash = argon2rs::argon2i_simple(password, &salt);

    let mut result = salt.into_bytes();
    result.extend_from_slice(&hash);
    result
}

pub fn password_hash_verify(hash: &[u8], password: &str) -> ServiceResult<bool> {
    if hash.len() <= PASSWORD_SALT_LENGTH {
        return Ok(false);
    }

    let (salt, expected) = hash.split_at(PASSWORD_SALT_LENGTH);
    let salt = std::str::from_utf8(salt).map_err(|_| {
        ServiceError::InternalServerError("Malformed password hash".to_owned())
    })?;
    let actual = argon2rs::argon2i_simple(password, salt);

    Ok(actual.as_slice() == expected)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_hash_roundtrip() {
        let hash = password_hash("secret hunter2");
        assert!(password_hash_verify(&hash, "secret hunter2").unwrap());
        assert!(!password_hash_verify(&hash, "hunter2").unwrap());
        assert!(!password_hash_verify(&[], "secret hunter2").unwrap());

        // salts are random, equal passwords hash differently
        assert_ne!(hash, password_hash("secret hunter2"));
    }
}
