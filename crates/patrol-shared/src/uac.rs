//! Shared items related to user account control

use std::collections::BTreeSet;

use serde_json::Value;

use crate::{
    errors::WireError,
    id::EntityId,
    wire::{lenient_bool, lenient_string, Object, Variants},
};

const KEY_ROLE: Variants = Variants(&["role", "rol"]);
const KEY_ROLES: Variants = Variants(&["roles", "role_codes", "roles_codes"]);
const KEY_IS_ADMIN: Variants = Variants(&["is_admin"]);
const KEY_EMAIL: Variants = Variants(&["email", "correo"]);
const KEY_USER_ID: Variants = Variants(&["id", "user_id", "_id"]);

/// The only distinction the dashboard makes between operators
#[derive(
    Debug,
    Default,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    serde::Serialize,
    serde::Deserialize,
    strum::Display,
    strum::AsRefStr,
)]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    Admin,
    #[default]
    User,
}

impl Role {
    /// `admin` in any case is an admin, everything else is a regular user
    pub fn from_role_code(code: &str) -> Self {
        if code.trim().eq_ignore_ascii_case("admin") {
            Self::Admin
        } else {
            Self::User
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Self::Admin)
    }
}

/// Who is signed in. Read only snapshot, replaced as a whole when the identity
/// is checked again
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Session {
    pub id: Option<EntityId>,
    pub email: String,
    pub role: Role,
    pub roles: BTreeSet<String>,
    /// The backend's `is_admin` flag as sent. Only consulted when deriving
    /// `role` without an explicit role, gating always goes through `role`
    pub admin_flag: bool,
}

impl Session {
    /// Builds the session from the identity endpoint's response
    /// (`{ok, user, roles?, is_admin?}`)
    pub fn from_wire(value: &Value) -> Result<Self, WireError> {
        let top = value
            .as_object()
            .ok_or_else(|| WireError::not_an_object(value))?;
        if top.get("ok").and_then(lenient_bool) == Some(false) {
            let msg = top
                .get("msg")
                .or_else(|| top.get("message"))
                .and_then(lenient_string)
                .unwrap_or_else(|| "identity check rejected".to_string());
            return Err(WireError::NotOk(msg));
        }
        // Some deployments return the user at the top level
        let user = top.get("user").and_then(Value::as_object).unwrap_or(top);

        let roles = roles_collection(user)
            .or_else(|| roles_collection(top))
            .unwrap_or_default();
        let role = derive_role(top, user, &roles);
        let is_admin_flag = KEY_IS_ADMIN
            .boolean(user)
            .or_else(|| KEY_IS_ADMIN.boolean(top));

        Ok(Self {
            id: KEY_USER_ID.lookup(user).and_then(EntityId::from_wire),
            email: KEY_EMAIL.string(user).unwrap_or_default(),
            role,
            admin_flag: is_admin_flag.unwrap_or(false),
            roles: roles.into_iter().collect(),
        })
    }

    /// What gating uses, an explicit non admin role wins over [`Self::admin_flag`]
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    /// Value exposed to the page for styling hooks (shown in the top bar)
    pub fn role_attr(&self) -> &str {
        self.role.as_ref()
    }
}

fn roles_collection(obj: &Object) -> Option<Vec<String>> {
    let result: Vec<String> = KEY_ROLES
        .array(obj)?
        .iter()
        .filter_map(|role| match role {
            // Some backends send `{code, name}` pairs
            Value::Object(inner) => inner
                .get("code")
                .or_else(|| inner.get("name"))
                .and_then(lenient_string),
            other => lenient_string(other),
        })
        .collect();
    (!result.is_empty()).then_some(result)
}

/// Explicit role field, then first element of the roles list, then the admin
/// flag, then [`Role::User`]
fn derive_role(top: &Object, user: &Object, roles: &[String]) -> Role {
    if let Some(code) = KEY_ROLE.string(user).or_else(|| KEY_ROLE.string(top)) {
        return Role::from_role_code(&code);
    }
    if let Some(first) = roles.first() {
        return Role::from_role_code(first);
    }
    match KEY_IS_ADMIN
        .boolean(user)
        .or_else(|| KEY_IS_ADMIN.boolean(top))
    {
        Some(true) => Role::Admin,
        Some(false) | None => Role::User,
    }
}

/// What a page needs before it can be shown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageAccess {
    /// Only needs a signed in operator
    Authenticated,
    AdminRequired,
}

impl PageAccess {
    pub fn allows(&self, role: Role) -> bool {
        match self {
            PageAccess::Authenticated => true,
            PageAccess::AdminRequired => role.is_admin(),
        }
    }
}

/// Declarative tag placed on a control
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateTag {
    /// Hidden from non admins
    AdminOnly,
    /// Shown but disabled for non admins
    AdminDisable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    Visible,
    Hidden,
    Disabled,
}

impl Gate {
    pub fn is_visible(&self) -> bool {
        !matches!(self, Gate::Hidden)
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self, Gate::Visible)
    }
}

pub fn gate(tag: GateTag, role: Role) -> Gate {
    match (tag, role) {
        (_, Role::Admin) => Gate::Visible,
        (GateTag::AdminOnly, Role::User) => Gate::Hidden,
        (GateTag::AdminDisable, Role::User) => Gate::Disabled,
    }
}
