use sea_orm::{ActiveValue, QueryFilter, QueryOrder, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{EngineError, ResultEngine, Wallet, wallets};

use super::{Engine, with_tx};

impl Engine {
    /// Create a wallet for `user_id` with an opening balance in đồng.
    pub async fn new_wallet(
        &self,
        user_id: &str,
        name: &str,
        opening_balance_minor: i64,
    ) -> ResultEngine<Uuid> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(EngineError::KeyNotFound("wallet name is empty".to_string()));
        }
        with_tx!(self, |db_tx| {
            self.require_user_exists(&db_tx, user_id).await?;
            let wallet = Wallet::new(user_id, trimmed, opening_balance_minor);
            wallets::ActiveModel::from(&wallet).insert(&db_tx).await?;
            Ok(wallet.id)
        })
    }

    /// Load one wallet, enforcing ownership.
    pub async fn wallet(&self, user_id: &str, wallet_id: &str) -> ResultEngine<Wallet> {
        with_tx!(self, |db_tx| {
            let model = self.require_wallet_write(&db_tx, wallet_id, user_id).await?;
            Wallet::try_from(model)
        })
    }

    /// All of a user's wallets, archived ones included, by name.
    pub async fn list_wallets(&self, user_id: &str) -> ResultEngine<Vec<Wallet>> {
        let models = wallets::Entity::find()
            .filter(wallets::Column::UserId.eq(user_id.to_string()))
            .order_by_asc(wallets::Column::Name)
            .all(&self.database)
            .await?;
        models.into_iter().map(Wallet::try_from).collect()
    }

    /// Archive a wallet. Archived wallets keep their history but reject
    /// new batches.
    pub async fn archive_wallet(&self, user_id: &str, wallet_id: &str) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let model = self.require_wallet_write(&db_tx, wallet_id, user_id).await?;
            let mut active: wallets::ActiveModel = model.into();
            active.archived = ActiveValue::Set(true);
            active.update(&db_tx).await?;
            Ok(())
        })
    }
}
