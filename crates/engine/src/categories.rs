//! Category taxonomy, one tree per candidate kind.

use api_types::CandidateKind;
use sea_orm::entity::{ActiveValue, prelude::*};
use uuid::Uuid;

use crate::{EngineError, util::normalize_category_key, util::parse_uuid};

#[derive(Clone, Debug, PartialEq)]
pub struct Category {
    pub id: Uuid,
    pub kind: CandidateKind,
    pub name: String,
    /// Diacritics-stripped lowercase key, unique per kind.
    pub name_norm: String,
    /// System rows are the "Khác" sentinels unmapped hints fall back to.
    pub is_system: bool,
}

impl Category {
    pub fn new(kind: CandidateKind, name: impl Into<String>) -> Self {
        let name = name.into();
        let name_norm = normalize_category_key(&name);
        Self {
            id: Uuid::new_v4(),
            kind,
            name,
            name_norm,
            is_system: false,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "categories")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub kind: String,
    pub name: String,
    pub name_norm: String,
    pub is_system: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::transactions::Entity")]
    Transactions,
}

impl Related<super::transactions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transactions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Category> for ActiveModel {
    fn from(value: &Category) -> Self {
        Self {
            id: ActiveValue::Set(value.id.to_string()),
            kind: ActiveValue::Set(value.kind.as_str().to_string()),
            name: ActiveValue::Set(value.name.clone()),
            name_norm: ActiveValue::Set(value.name_norm.clone()),
            is_system: ActiveValue::Set(value.is_system),
        }
    }
}

impl TryFrom<Model> for Category {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "category")?,
            kind: CandidateKind::try_from(model.kind.as_str())
                .map_err(|_| EngineError::KeyNotFound("category not exists".to_string()))?,
            name: model.name,
            name_norm: model.name_norm,
            is_system: model.is_system,
        })
    }
}
