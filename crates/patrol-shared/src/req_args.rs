//! This module stores the expected format of the arguments for the requests
//! and the responses that come back from the auth endpoints

use std::fmt::Debug;

use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;

use crate::wire::{lenient_bool, lenient_string, Variants};

const KEY_ACCESS_TOKEN: Variants = Variants(&["access_token"]);
const KEY_MESSAGE: Variants = Variants(&["message", "msg", "error"]);

/// Passwords only leave the [`SecretString`] when the body is serialized
pub fn serialize_secret<S: serde::Serializer>(
    secret: &SecretString,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(secret.expose_secret())
}

pub fn serialize_opt_secret<S: serde::Serializer>(
    secret: &Option<SecretString>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match secret {
        Some(secret) => serializer.serialize_some(secret.expose_secret()),
        None => serializer.serialize_none(),
    }
}

#[derive(serde::Serialize, Clone)]
pub struct LoginReqArgs {
    pub email: String,
    #[serde(serialize_with = "serialize_secret")]
    pub password: SecretString,
}

impl LoginReqArgs {
    pub fn new<S: Into<String>>(email: S, password: SecretString) -> Self {
        Self {
            email: email.into(),
            password,
        }
    }
}

impl Debug for LoginReqArgs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginReqArgs")
            .field("email", &self.email)
            .field("has_password", &!self.password.expose_secret().is_empty())
            .finish()
    }
}

/// Result of `POST /auth/login`
#[derive(Clone, PartialEq, Eq)]
pub struct LoginResponse {
    pub ok: bool,
    pub access_token: Option<String>,
    pub message: Option<String>,
}

impl LoginResponse {
    /// A missing or malformed body counts as not ok
    pub fn from_wire(value: &Value) -> Self {
        let Some(obj) = value.as_object() else {
            return Self {
                ok: false,
                access_token: None,
                message: None,
            };
        };
        Self {
            ok: obj.get("ok").and_then(lenient_bool).unwrap_or(false),
            access_token: KEY_ACCESS_TOKEN.string(obj),
            message: KEY_MESSAGE.string(obj),
        }
    }
}

impl Debug for LoginResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginResponse")
            .field("ok", &self.ok)
            .field("has_access_token", &self.access_token.is_some())
            .field("message", &self.message)
            .finish()
    }
}

/// Token (if any) handed out by `POST /auth/refresh`
pub fn refreshed_access_token(value: &Value) -> Option<String> {
    value.as_object().and_then(|obj| KEY_ACCESS_TOKEN.string(obj))
}

/// Server provided message (`message` or `msg`) from an error body
pub fn error_message(value: &Value) -> Option<String> {
    let obj = value.as_object()?;
    Variants(&["message", "msg"])
        .lookup(obj)
        .and_then(lenient_string)
}
