//! Persisted ledger rows and their in-memory form.

use std::collections::BTreeSet;

use api_types::{BatchCandidate, CandidateKind, Currency, ParseStrategy};
use chrono::{DateTime, Utc};
use sea_orm::entity::{ActiveValue, prelude::*};
use uuid::Uuid;

use crate::{EngineError, util::parse_uuid};

/// A single committed ledger row.
///
/// Provenance fields (`source_strategy`, `confidence`, `tags`) carry how
/// the row was parsed, so reviewers can later audit rule-based fallbacks.
#[derive(Clone, Debug, PartialEq)]
pub struct Transaction {
    pub id: Uuid,
    pub batch_id: Uuid,
    pub wallet_id: Uuid,
    /// Zero-based position inside the submitted batch.
    pub position: i32,
    pub kind: CandidateKind,
    pub amount_minor: i64,
    pub currency: Currency,
    pub description: String,
    pub category_id: Option<Uuid>,
    pub tags: BTreeSet<String>,
    pub transfer_target: Option<String>,
    pub transfer_fee_minor: Option<i64>,
    pub source_strategy: Option<ParseStrategy>,
    pub confidence: Option<f64>,
    pub occurred_at: DateTime<Utc>,
    pub created_by: String,
}

impl Transaction {
    pub(crate) fn from_candidate(
        candidate: &BatchCandidate,
        batch_id: Uuid,
        wallet_id: Uuid,
        position: i32,
        category_id: Option<Uuid>,
        created_by: &str,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            batch_id,
            wallet_id,
            position,
            kind: candidate.kind,
            amount_minor: candidate.amount_minor,
            currency: candidate.currency,
            description: candidate.description.trim().to_string(),
            category_id,
            tags: candidate.tags.clone(),
            transfer_target: candidate.transfer_target.clone(),
            transfer_fee_minor: candidate.transfer_fee_minor,
            source_strategy: candidate.source_strategy,
            confidence: candidate.confidence,
            occurred_at: candidate.occurred_at.unwrap_or(now),
            created_by: created_by.to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub batch_id: String,
    pub wallet_id: String,
    pub position: i32,
    pub kind: String,
    pub amount_minor: i64,
    pub currency: String,
    pub description: String,
    pub category_id: Option<String>,
    /// JSON array; `None` when the candidate carried no tags.
    pub tags: Option<String>,
    pub transfer_target: Option<String>,
    pub transfer_fee_minor: Option<i64>,
    pub source_strategy: Option<String>,
    pub confidence: Option<f64>,
    pub occurred_at: DateTimeUtc,
    pub created_by: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::batches::Entity",
        from = "Column::BatchId",
        to = "super::batches::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Batches,
    #[sea_orm(
        belongs_to = "super::wallets::Entity",
        from = "Column::WalletId",
        to = "super::wallets::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Wallets,
    #[sea_orm(
        belongs_to = "super::categories::Entity",
        from = "Column::CategoryId",
        to = "super::categories::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Categories,
}

impl Related<super::batches::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Batches.def()
    }
}

impl Related<super::wallets::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Wallets.def()
    }
}

impl Related<super::categories::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Categories.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Transaction> for ActiveModel {
    fn from(value: &Transaction) -> Self {
        let tags = if value.tags.is_empty() {
            None
        } else {
            serde_json::to_string(&value.tags).ok()
        };
        Self {
            id: ActiveValue::Set(value.id.to_string()),
            batch_id: ActiveValue::Set(value.batch_id.to_string()),
            wallet_id: ActiveValue::Set(value.wallet_id.to_string()),
            position: ActiveValue::Set(value.position),
            kind: ActiveValue::Set(value.kind.as_str().to_string()),
            amount_minor: ActiveValue::Set(value.amount_minor),
            currency: ActiveValue::Set(value.currency.code().to_string()),
            description: ActiveValue::Set(value.description.clone()),
            category_id: ActiveValue::Set(value.category_id.map(|id| id.to_string())),
            tags: ActiveValue::Set(tags),
            transfer_target: ActiveValue::Set(value.transfer_target.clone()),
            transfer_fee_minor: ActiveValue::Set(value.transfer_fee_minor),
            source_strategy: ActiveValue::Set(
                value.source_strategy.map(|s| s.as_str().to_string()),
            ),
            confidence: ActiveValue::Set(value.confidence),
            occurred_at: ActiveValue::Set(value.occurred_at),
            created_by: ActiveValue::Set(value.created_by.clone()),
        }
    }
}

impl TryFrom<Model> for Transaction {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let tags = match model.tags.as_deref() {
            Some(raw) => serde_json::from_str(raw)
                .map_err(|_| EngineError::KeyNotFound("transaction not exists".to_string()))?,
            None => BTreeSet::new(),
        };
        Ok(Self {
            id: parse_uuid(&model.id, "transaction")?,
            batch_id: parse_uuid(&model.batch_id, "batch")?,
            wallet_id: parse_uuid(&model.wallet_id, "wallet")?,
            position: model.position,
            kind: CandidateKind::try_from(model.kind.as_str())
                .map_err(|_| EngineError::KeyNotFound("transaction not exists".to_string()))?,
            amount_minor: model.amount_minor,
            currency: Currency::try_from(model.currency.as_str()).unwrap_or_default(),
            description: model.description,
            category_id: model.category_id.and_then(|s| Uuid::parse_str(&s).ok()),
            tags,
            transfer_target: model.transfer_target,
            transfer_fee_minor: model.transfer_fee_minor,
            source_strategy: model
                .source_strategy
                .as_deref()
                .and_then(|s| ParseStrategy::try_from(s).ok()),
            confidence: model.confidence,
            occurred_at: model.occurred_at,
            created_by: model.created_by,
        })
    }
}
