use sea_orm::{DatabaseTransaction, prelude::*};

use crate::{EngineError, ResultEngine, users, wallets};

use super::Engine;

impl Engine {
    /// Load a wallet the caller may write to.
    ///
    /// A wallet that does not exist and a wallet owned by someone else
    /// produce the same `AccessDenied`, so callers cannot probe ids.
    pub(super) async fn require_wallet_write(
        &self,
        db_tx: &DatabaseTransaction,
        wallet_id: &str,
        user_id: &str,
    ) -> ResultEngine<wallets::Model> {
        let model = wallets::Entity::find_by_id(wallet_id.to_string())
            .one(db_tx)
            .await?
            .ok_or(EngineError::AccessDenied)?;
        if model.user_id != user_id {
            return Err(EngineError::AccessDenied);
        }
        Ok(model)
    }

    pub(super) async fn require_user_exists(
        &self,
        db_tx: &DatabaseTransaction,
        username: &str,
    ) -> ResultEngine<()> {
        let exists = users::Entity::find_by_id(username.to_string())
            .one(db_tx)
            .await?
            .is_some();
        if !exists {
            return Err(EngineError::KeyNotFound("user not exists".to_string()));
        }
        Ok(())
    }
}
