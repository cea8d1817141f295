//! The module contains the `Wallet` struct and its persistence entity.

use api_types::Currency;
use sea_orm::entity::{ActiveValue, prelude::*};
use uuid::Uuid;

use crate::{EngineError, util::parse_uuid};

/// A wallet: a cash envelope, bank account or e-wallet whose balance the
/// engine keeps denormalized in đồng.
///
/// The id is a UUID generated once and persisted, so a wallet can be
/// renamed without breaking references.
#[derive(Clone, Debug, PartialEq)]
pub struct Wallet {
    pub id: Uuid,
    pub user_id: String,
    pub name: String,
    pub balance_minor: i64,
    pub currency: Currency,
    pub archived: bool,
}

impl Wallet {
    pub fn new(user_id: impl Into<String>, name: impl Into<String>, balance_minor: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: user_id.into(),
            name: name.into(),
            balance_minor,
            currency: Currency::Vnd,
            archived: false,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "wallets")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub balance_minor: i64,
    pub currency: String,
    pub archived: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::batches::Entity")]
    Batches,
    #[sea_orm(has_many = "super::transactions::Entity")]
    Transactions,
}

impl Related<super::batches::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Batches.def()
    }
}

impl Related<super::transactions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transactions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Wallet> for ActiveModel {
    fn from(value: &Wallet) -> Self {
        Self {
            id: ActiveValue::Set(value.id.to_string()),
            user_id: ActiveValue::Set(value.user_id.clone()),
            name: ActiveValue::Set(value.name.clone()),
            balance_minor: ActiveValue::Set(value.balance_minor),
            currency: ActiveValue::Set(value.currency.code().to_string()),
            archived: ActiveValue::Set(value.archived),
        }
    }
}

impl TryFrom<Model> for Wallet {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "wallet")?,
            user_id: model.user_id,
            name: model.name,
            balance_minor: model.balance_minor,
            currency: Currency::try_from(model.currency.as_str()).unwrap_or_default(),
            archived: model.archived,
        })
    }
}
