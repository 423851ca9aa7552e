use std::fmt::Display;

use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;

use crate::{
    errors::{ConversionError, ValidationError},
    id::EntityId,
    location::parse_timestamp,
    req_args::{serialize_opt_secret, serialize_secret},
    wire::{string_list, Object, Variants},
};

const KEY_ID: Variants = Variants(&["id", "user_id", "_id"]);
const KEY_EMAIL: Variants = Variants(&["email", "user_email"]);
const KEY_NAME: Variants = Variants(&["nombre", "fullname", "full_name", "name"]);
const KEY_NIP: Variants = Variants(&["nip", "pin"]);
const KEY_ROLES: Variants = Variants(&["roles", "role_codes", "roles_codes"]);
const KEY_ROLE: Variants = Variants(&["role", "rol"]);
const KEY_ROLE_DISPLAY: Variants = Variants(&["role_display"]);
const KEY_ACTIVE: Variants = Variants(&["is_active", "active", "enabled"]);
const KEY_CREATED: Variants = Variants(&["created_at", "createdAt", "created", "fecha_creacion"]);
/// Wrappers used by the single user endpoint
const KEY_SINGLE: Variants = Variants(&["user", "data"]);

#[derive(
    Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq, Eq, Hash, PartialOrd, Ord,
)]
/// Login email, constrained to not be empty
pub struct Email(String);

impl Email {
    pub const MAX_LENGTH: usize = 254;
}

impl TryFrom<String> for Email {
    type Error = ConversionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let value = value.trim().to_string();
        if value.is_empty() {
            return Err(ConversionError::Empty);
        }
        if value.len() > Self::MAX_LENGTH {
            return Err(ConversionError::MaxExceeded {
                max: Self::MAX_LENGTH,
                actual: value.len(),
            });
        }
        Ok(Self(value))
    }
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for Email {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// User as shown on the management screen
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct User {
    pub id: EntityId,
    pub email: String,
    pub nombre: Option<String>,
    pub nip: Option<String>,
    pub roles: Vec<String>,
    pub role: Option<String>,
    /// Ready to show, the backend's own text or the roles joined
    pub role_display: Option<String>,
    pub is_active: Option<bool>,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl User {
    /// Records without an id cannot be edited or deleted so they are skipped
    pub fn from_wire(obj: &Object) -> Option<Self> {
        let id = KEY_ID.lookup(obj).and_then(EntityId::from_wire)?;
        let roles = KEY_ROLES.lookup(obj).map(string_list).unwrap_or_default();
        let role = KEY_ROLE.string(obj).or_else(|| roles.first().cloned());
        let role_display = KEY_ROLE_DISPLAY.string(obj).or_else(|| {
            if roles.is_empty() {
                role.clone()
            } else {
                Some(roles.join(", "))
            }
        });
        Some(Self {
            id,
            email: KEY_EMAIL.string(obj).unwrap_or_default(),
            nombre: KEY_NAME.string(obj),
            nip: KEY_NIP.string(obj),
            roles,
            role,
            role_display,
            is_active: KEY_ACTIVE.boolean(obj),
            created_at: KEY_CREATED.lookup(obj).and_then(parse_timestamp),
        })
    }

    /// The single user endpoint may wrap the record in `user` or `data`
    pub fn from_single_wire(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        let inner = KEY_SINGLE
            .lookup(obj)
            .and_then(Value::as_object)
            .unwrap_or(obj);
        Self::from_wire(inner)
    }
}

/// Body of `POST /users`
#[derive(serde::Serialize)]
pub struct UserDraft {
    pub email: Email,
    #[serde(serialize_with = "serialize_secret")]
    pub password: SecretString,
    pub is_active: bool,
    pub roles: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nombre: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nip: Option<String>,
}

/// Body of `PUT /users/:id`. A missing password leaves it unchanged
#[derive(serde::Serialize)]
pub struct UserPatch {
    pub email: Email,
    #[serde(
        serialize_with = "serialize_opt_secret",
        skip_serializing_if = "Option::is_none"
    )]
    pub password: Option<SecretString>,
    pub is_active: bool,
    pub roles: Vec<String>,
    pub nombre: Option<String>,
    pub nip: Option<String>,
}

/// Raw contents of the user editor
#[derive(Default, Clone, PartialEq, Eq)]
pub struct UserForm {
    pub email: String,
    pub password: String,
    pub nombre: String,
    pub nip: String,
    pub role: String,
    pub is_active: bool,
}

fn blank_to_none(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

impl UserForm {
    pub fn new_for_create(default_role: &str) -> Self {
        Self {
            role: default_role.to_string(),
            is_active: true,
            ..Default::default()
        }
    }

    pub fn from_user(user: &User) -> Self {
        Self {
            email: user.email.clone(),
            password: String::new(),
            nombre: user.nombre.clone().unwrap_or_default(),
            nip: user.nip.clone().unwrap_or_default(),
            role: user.role.clone().unwrap_or_default(),
            is_active: user.is_active.unwrap_or(true),
        }
    }

    fn email(&self) -> Result<Email, ValidationError> {
        Email::try_from(self.email.clone())
            .map_err(|e| ValidationError::from_conversion("Email", e))
    }

    fn roles(&self) -> Vec<String> {
        blank_to_none(&self.role).into_iter().collect()
    }

    /// Email and password are required
    pub fn to_draft(&self) -> Result<UserDraft, ValidationError> {
        let email = self.email()?;
        if self.password.is_empty() {
            return Err(ValidationError::required("Password"));
        }
        Ok(UserDraft {
            email,
            password: SecretString::from(self.password.clone()),
            is_active: self.is_active,
            roles: self.roles(),
            nombre: blank_to_none(&self.nombre),
            nip: blank_to_none(&self.nip),
        })
    }

    /// Blank password means leave it as it is
    pub fn to_patch(&self) -> Result<UserPatch, ValidationError> {
        Ok(UserPatch {
            email: self.email()?,
            password: (!self.password.is_empty())
                .then(|| SecretString::from(self.password.clone())),
            is_active: self.is_active,
            roles: self.roles(),
            nombre: blank_to_none(&self.nombre),
            nip: blank_to_none(&self.nip),
        })
    }
}

impl std::fmt::Debug for UserForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserForm")
            .field("email", &self.email)
            .field("has_password", &!self.password.is_empty())
            .field("nombre", &self.nombre)
            .field("role", &self.role)
            .field("is_active", &self.is_active)
            .finish_non_exhaustive()
    }
}

impl std::fmt::Debug for UserDraft {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserDraft")
            .field("email", &self.email)
            .field("has_password", &!self.password.expose_secret().is_empty())
            .field("roles", &self.roles)
            .finish_non_exhaustive()
    }
}

impl std::fmt::Debug for UserPatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserPatch")
            .field("email", &self.email)
            .field("changes_password", &self.password.is_some())
            .field("roles", &self.roles)
            .finish_non_exhaustive()
    }
}

/// Roles catalogue from `GET /users/roles` (`{roles: [..]}` or a bare array)
pub fn roles_from_wire(value: &Value) -> Option<Vec<String>> {
    let list = match value {
        Value::Array(_) => string_list(value),
        Value::Object(obj) => obj.get("roles").map(string_list)?,
        _ => return None,
    };
    (!list.is_empty()).then_some(list)
}

/// Short text used when a user has no display name
pub fn user_label(user: &User) -> String {
    match (&user.nombre, user.email.is_empty()) {
        (Some(nombre), _) => nombre.clone(),
        (None, false) => user.email.clone(),
        (None, true) => user.id.to_string(),
    }
}
