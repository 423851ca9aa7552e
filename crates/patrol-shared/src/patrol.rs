use std::fmt::Display;

use serde_json::Value;

use crate::{
    errors::{ConversionError, ValidationError},
    id::EntityId,
    location::parse_timestamp,
    wire::{Object, Variants},
};

const KEY_ID: Variants = Variants(&["id", "patrulla_id", "_id"]);
const KEY_CODE: Variants = Variants(&["codigo", "code"]);
const KEY_ALIAS: Variants = Variants(&["alias", "nombre"]);
const KEY_PLATE: Variants = Variants(&["placa", "plate"]);
const KEY_ACTIVE: Variants = Variants(&["is_activa", "activa", "active"]);
const KEY_CREATED: Variants = Variants(&["created_at", "createdAt", "fecha_creacion"]);
const KEY_SINGLE: Variants = Variants(&["patrulla", "data"]);

/// Unique code of a patrol unit. Fixed once the patrol exists
#[derive(
    Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq, Eq, Hash, PartialOrd, Ord,
)]
pub struct PatrolCode(String);

impl PatrolCode {
    pub const MAX_LENGTH: usize = 32;
}

impl TryFrom<String> for PatrolCode {
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

impl Display for PatrolCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Patrol {
    pub id: EntityId,
    pub codigo: Option<String>,
    pub alias: Option<String>,
    pub placa: Option<String>,
    pub is_activa: bool,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl Patrol {
    pub fn from_wire(obj: &Object) -> Option<Self> {
        Some(Self {
            id: KEY_ID.lookup(obj).and_then(EntityId::from_wire)?,
            codigo: KEY_CODE.string(obj),
            alias: KEY_ALIAS.string(obj),
            placa: KEY_PLATE.string(obj),
            is_activa: KEY_ACTIVE.boolean(obj).unwrap_or(false),
            created_at: KEY_CREATED.lookup(obj).and_then(parse_timestamp),
        })
    }

    pub fn from_single_wire(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        let inner = KEY_SINGLE
            .lookup(obj)
            .and_then(Value::as_object)
            .unwrap_or(obj);
        Self::from_wire(inner)
    }
}

/// Body of `POST /patrullas`
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct PatrolDraft {
    pub codigo: PatrolCode,
    pub alias: Option<String>,
    pub placa: Option<String>,
    pub is_activa: bool,
}

/// Body of `PUT /patrullas/:id`, the code is not part of it
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct PatrolPatch {
    pub alias: Option<String>,
    pub placa: Option<String>,
    pub is_activa: bool,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PatrolForm {
    pub codigo: String,
    pub alias: String,
    pub placa: String,
    pub is_activa: bool,
}

fn blank_to_none(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

impl PatrolForm {
    pub fn new_for_create() -> Self {
        Self {
            is_activa: true,
            ..Default::default()
        }
    }

    pub fn from_patrol(patrol: &Patrol) -> Self {
        Self {
            codigo: patrol.codigo.clone().unwrap_or_default(),
            alias: patrol.alias.clone().unwrap_or_default(),
            placa: patrol.placa.clone().unwrap_or_default(),
            is_activa: patrol.is_activa,
        }
    }

    pub fn to_draft(&self) -> Result<PatrolDraft, ValidationError> {
        Ok(PatrolDraft {
            codigo: PatrolCode::try_from(self.codigo.clone())
                .map_err(|e| ValidationError::from_conversion("Código", e))?,
            alias: blank_to_none(&self.alias),
            placa: blank_to_none(&self.placa),
            is_activa: self.is_activa,
        })
    }

    pub fn to_patch(&self) -> PatrolPatch {
        PatrolPatch {
            alias: blank_to_none(&self.alias),
            placa: blank_to_none(&self.placa),
            is_activa: self.is_activa,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn patrol_variants() {
        let input = json!({"patrulla_id": 3, "code": "P-03", "nombre": "Norte", "plate": "O-123", "activa": 1});
        let patrol = Patrol::from_wire(input.as_object().unwrap()).unwrap();
        insta::assert_json_snapshot!(patrol, @r#"
        {
          "id": "3",
          "codigo": "P-03",
          "alias": "Norte",
          "placa": "O-123",
          "is_activa": true,
          "created_at": null
        }
        "#);
    }

    #[test]
    fn wrapped_single_patrol() {
        let patrol = Patrol::from_single_wire(&json!({"patrulla": {"id": 1}})).unwrap();
        assert!(!patrol.is_activa);
        assert_eq!(patrol.id.as_str(), "1");
    }

    #[test]
    fn code_required_on_create() {
        let form = PatrolForm::new_for_create();
        assert_eq!(
            form.to_draft().unwrap_err(),
            ValidationError::required("Código")
        );
        let too_long = PatrolForm {
            codigo: "x".repeat(40),
            ..PatrolForm::new_for_create()
        };
        assert!(matches!(
            too_long.to_draft().unwrap_err(),
            ValidationError::Invalid { field: "Código", .. }
        ));
    }

    #[test]
    fn patch_never_sends_the_code() {
        let form = PatrolForm {
            codigo: "P-01".into(),
            alias: " ".into(),
            placa: "O-1".into(),
            is_activa: false,
        };
        let body = serde_json::to_value(form.to_patch()).unwrap();
        assert_eq!(
            body,
            json!({"alias": null, "placa": "O-1", "is_activa": false})
        );
    }
}
