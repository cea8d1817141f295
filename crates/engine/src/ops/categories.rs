use api_types::CandidateKind;
use sea_orm::{ActiveModelTrait, DatabaseTransaction, QueryFilter, QueryOrder, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{
    Category, EngineError, ResultEngine, categories,
    util::{normalize_category_key, parse_uuid},
};

use super::{Engine, with_tx};

impl Engine {
    /// Categories of one kind, sentinel included, by normalized name.
    pub async fn list_categories(&self, kind: CandidateKind) -> ResultEngine<Vec<Category>> {
        let models = categories::Entity::find()
            .filter(categories::Column::Kind.eq(kind.as_str()))
            .order_by_asc(categories::Column::NameNorm)
            .all(&self.database)
            .await?;
        models.into_iter().map(Category::try_from).collect()
    }

    /// Add a category. Adding a name that normalizes to an existing row
    /// returns that row's id instead of failing.
    pub async fn new_category(&self, kind: CandidateKind, name: &str) -> ResultEngine<Uuid> {
        let category = Category::new(kind, name.trim());
        if category.name.is_empty() {
            return Err(EngineError::KeyNotFound(
                "category name is empty".to_string(),
            ));
        }
        with_tx!(self, |db_tx| {
            let existing = categories::Entity::find()
                .filter(categories::Column::Kind.eq(kind.as_str()))
                .filter(categories::Column::NameNorm.eq(category.name_norm.clone()))
                .one(&db_tx)
                .await?;
            if let Some(model) = existing {
                parse_uuid(&model.id, "category")
            } else {
                categories::ActiveModel::from(&category).insert(&db_tx).await?;
                Ok(category.id)
            }
        })
    }

    /// Map a candidate's category hint to a persisted category id.
    ///
    /// Transfers carry no category. For expenses and income a missing or
    /// unmapped hint falls back to the kind's sentinel row, with a warning
    /// so the unmapped hint is visible in logs rather than silently lost.
    pub(super) async fn resolve_category_id(
        &self,
        db_tx: &DatabaseTransaction,
        kind: CandidateKind,
        hint: Option<&str>,
    ) -> ResultEngine<Option<Uuid>> {
        if kind == CandidateKind::Transfer {
            return Ok(None);
        }

        if let Some(hint) = hint {
            let norm = normalize_category_key(hint);
            let found = categories::Entity::find()
                .filter(categories::Column::Kind.eq(kind.as_str()))
                .filter(categories::Column::NameNorm.eq(norm))
                .one(db_tx)
                .await?;
            if let Some(model) = found {
                return parse_uuid(&model.id, "category").map(Some);
            }
            tracing::warn!(kind = kind.as_str(), hint, "unmapped category hint, using sentinel");
        }

        let sentinel = categories::Entity::find()
            .filter(categories::Column::Kind.eq(kind.as_str()))
            .filter(categories::Column::IsSystem.eq(true))
            .one(db_tx)
            .await?
            .ok_or_else(|| EngineError::CategoryConfigMissing(kind.as_str().to_string()))?;
        parse_uuid(&sentinel.id, "category").map(Some)
    }
}
