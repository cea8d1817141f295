use api_types::{
    BatchCandidate, CandidateKind, CommitReceipt, CommitRequest, ValidationIssue,
};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ActiveValue, DatabaseTransaction, QueryFilter, QueryOrder, TransactionTrait,
    prelude::*,
};
use uuid::Uuid;

use crate::{
    EngineError, ResultEngine, Transaction, batches, transactions, util::parse_uuid, wallets,
};

use super::{Engine, with_tx};

impl Engine {
    /// Commit a confirmed batch as one atomic unit of work.
    ///
    /// Either every transaction lands and the wallet balance moves once,
    /// or nothing is persisted. Resubmitting the same
    /// `(user_id, idempotency_key)` replays the original receipt without
    /// touching the balance again.
    pub async fn commit_batch(&self, request: &CommitRequest) -> ResultEngine<CommitReceipt> {
        let now = Utc::now();
        with_tx!(self, |db_tx| {
            self.commit_batch_in_tx(&db_tx, request, now).await
        })
    }

    async fn commit_batch_in_tx(
        &self,
        db_tx: &DatabaseTransaction,
        request: &CommitRequest,
        now: DateTime<Utc>,
    ) -> ResultEngine<CommitReceipt> {
        let wallet = self
            .require_wallet_write(db_tx, &request.wallet_id, &request.user_id)
            .await?;
        let wallet_id = parse_uuid(&wallet.id, "wallet")?;

        // A blank key would alias every keyless batch from this user to the
        // first one ever committed, so it is rejected before the replay
        // lookup can swallow the submission.
        if request.idempotency_key.trim().is_empty() {
            return Err(EngineError::ValidationFailed(vec![ValidationIssue::new(
                None,
                "idempotency_key",
                "idempotency key is blank",
            )]));
        }

        if let Some(receipt) = self
            .replayed_receipt(db_tx, &request.user_id, &request.idempotency_key)
            .await?
        {
            tracing::info!(
                batch_id = %receipt.batch_id,
                "idempotency key already applied, replaying receipt"
            );
            return Ok(receipt);
        }

        let balance_after = validate_batch(&wallet, &request.candidates)
            .map_err(EngineError::ValidationFailed)?;

        let batch_id = Uuid::new_v4();
        let mut transaction_rows = Vec::with_capacity(request.candidates.len());
        for (position, candidate) in request.candidates.iter().enumerate() {
            let category_id = self
                .resolve_category_id(db_tx, candidate.kind, candidate.category_hint.as_deref())
                .await?;
            transaction_rows.push(Transaction::from_candidate(
                candidate,
                batch_id,
                wallet_id,
                position as i32,
                category_id,
                &request.user_id,
                now,
            ));
        }

        let batch_row = batches::ActiveModel {
            id: ActiveValue::Set(batch_id.to_string()),
            user_id: ActiveValue::Set(request.user_id.clone()),
            wallet_id: ActiveValue::Set(wallet.id.clone()),
            idempotency_key: ActiveValue::Set(request.idempotency_key.clone()),
            balance_before_minor: ActiveValue::Set(wallet.balance_minor),
            balance_after_minor: ActiveValue::Set(balance_after),
            created_at: ActiveValue::Set(now),
        };
        if let Err(err) = batch_row.insert(db_tx).await {
            // Unique index on (user_id, idempotency_key): a concurrent
            // commit may have won the race between our lookup and insert.
            if let Some(receipt) = self
                .replayed_receipt(db_tx, &request.user_id, &request.idempotency_key)
                .await?
            {
                return Ok(receipt);
            }
            return Err(err.into());
        }

        let mut transaction_ids = Vec::with_capacity(transaction_rows.len());
        for row in &transaction_rows {
            transactions::ActiveModel::from(row).insert(db_tx).await?;
            transaction_ids.push(row.id);
        }

        let mut wallet_active: wallets::ActiveModel = wallet.clone().into();
        wallet_active.balance_minor = ActiveValue::Set(balance_after);
        wallet_active.update(db_tx).await?;

        tracing::info!(
            %batch_id,
            wallet_id = %wallet.id,
            count = transaction_ids.len(),
            balance_after_minor = balance_after,
            "batch committed"
        );

        Ok(CommitReceipt {
            batch_id,
            transaction_ids,
            balance_before_minor: wallet.balance_minor,
            balance_after_minor: balance_after,
            duplicate: false,
        })
    }

    async fn replayed_receipt(
        &self,
        db_tx: &DatabaseTransaction,
        user_id: &str,
        idempotency_key: &str,
    ) -> ResultEngine<Option<CommitReceipt>> {
        let batch = batches::Entity::find()
            .filter(batches::Column::UserId.eq(user_id.to_string()))
            .filter(batches::Column::IdempotencyKey.eq(idempotency_key.to_string()))
            .one(db_tx)
            .await?;
        let Some(batch) = batch else {
            return Ok(None);
        };

        let rows = transactions::Entity::find()
            .filter(transactions::Column::BatchId.eq(batch.id.clone()))
            .order_by_asc(transactions::Column::Position)
            .all(db_tx)
            .await?;
        let transaction_ids = rows
            .iter()
            .map(|m| parse_uuid(&m.id, "transaction"))
            .collect::<ResultEngine<Vec<_>>>()?;

        Ok(Some(CommitReceipt {
            batch_id: parse_uuid(&batch.id, "batch")?,
            transaction_ids,
            balance_before_minor: batch.balance_before_minor,
            balance_after_minor: batch.balance_after_minor,
            duplicate: true,
        }))
    }

    /// Look up the receipt of a previously committed batch.
    pub async fn batch_receipt(&self, user_id: &str, batch_id: &str) -> ResultEngine<CommitReceipt> {
        with_tx!(self, |db_tx| {
            let batch = self.require_batch(&db_tx, batch_id, user_id).await?;
            let rows = transactions::Entity::find()
                .filter(transactions::Column::BatchId.eq(batch.id.clone()))
                .order_by_asc(transactions::Column::Position)
                .all(&db_tx)
                .await?;
            let transaction_ids = rows
                .iter()
                .map(|m| parse_uuid(&m.id, "transaction"))
                .collect::<ResultEngine<Vec<_>>>()?;
            Ok(CommitReceipt {
                batch_id: parse_uuid(&batch.id, "batch")?,
                transaction_ids,
                balance_before_minor: batch.balance_before_minor,
                balance_after_minor: batch.balance_after_minor,
                duplicate: false,
            })
        })
    }

    /// The ledger rows of one batch, in submission order.
    pub async fn list_batch_transactions(
        &self,
        user_id: &str,
        batch_id: &str,
    ) -> ResultEngine<Vec<Transaction>> {
        with_tx!(self, |db_tx| {
            let batch = self.require_batch(&db_tx, batch_id, user_id).await?;
            let rows = transactions::Entity::find()
                .filter(transactions::Column::BatchId.eq(batch.id.clone()))
                .order_by_asc(transactions::Column::Position)
                .all(&db_tx)
                .await?;
            rows.into_iter().map(Transaction::try_from).collect()
        })
    }

    async fn require_batch(
        &self,
        db_tx: &DatabaseTransaction,
        batch_id: &str,
        user_id: &str,
    ) -> ResultEngine<batches::Model> {
        let model = batches::Entity::find_by_id(batch_id.to_string())
            .one(db_tx)
            .await?
            .ok_or(EngineError::AccessDenied)?;
        if model.user_id != user_id {
            return Err(EngineError::AccessDenied);
        }
        Ok(model)
    }
}

/// Check every candidate and the batch as a whole, returning the resulting
/// wallet balance or the full list of issues.
///
/// The funds check is on the outgoing total alone (expenses plus transfer
/// amounts and fees): income in the same batch does not offset it, so a
/// wallet can never be drawn below what it held when the batch arrived.
fn validate_batch(
    wallet: &wallets::Model,
    candidates: &[BatchCandidate],
) -> Result<i64, Vec<ValidationIssue>> {
    let mut issues = Vec::new();

    if wallet.archived {
        issues.push(ValidationIssue::new(None, "wallet", "wallet is archived"));
    }
    if candidates.is_empty() {
        issues.push(ValidationIssue::new(None, "candidates", "batch is empty"));
    }

    let mut outgoing: i64 = 0;
    let mut incoming: i64 = 0;
    for (index, candidate) in candidates.iter().enumerate() {
        let index = Some(index);
        let mut amount_ok = true;

        if candidate.amount_minor <= 0 {
            issues.push(ValidationIssue::new(
                index,
                "amount_minor",
                "amount must be positive",
            ));
            amount_ok = false;
        }
        if candidate.description.trim().is_empty() {
            issues.push(ValidationIssue::new(
                index,
                "description",
                "description is empty",
            ));
        }
        if candidate.currency.code() != wallet.currency {
            issues.push(ValidationIssue::new(
                index,
                "currency",
                format!("wallet holds {}", wallet.currency),
            ));
        }
        if let Some(confidence) = candidate.confidence
            && !(0.0..=1.0).contains(&confidence)
        {
            issues.push(ValidationIssue::new(
                index,
                "confidence",
                "confidence must be within [0, 1]",
            ));
        }

        match candidate.kind {
            CandidateKind::Transfer => {
                match candidate.transfer_target.as_deref().map(str::trim) {
                    None | Some("") => {
                        issues.push(ValidationIssue::new(
                            index,
                            "transfer_target",
                            "transfer needs a target",
                        ));
                    }
                    Some(target) if target == wallet.id => {
                        issues.push(ValidationIssue::new(
                            index,
                            "transfer_target",
                            "transfer cannot target its own source wallet",
                        ));
                    }
                    Some(_) => {}
                }
                if let Some(fee) = candidate.transfer_fee_minor
                    && fee < 0
                {
                    issues.push(ValidationIssue::new(
                        index,
                        "transfer_fee_minor",
                        "fee must not be negative",
                    ));
                    amount_ok = false;
                }
            }
            CandidateKind::Expense | CandidateKind::Income => {
                if candidate.transfer_fee_minor.is_some() {
                    issues.push(ValidationIssue::new(
                        index,
                        "transfer_fee_minor",
                        "fee is only valid on transfers",
                    ));
                }
            }
        }

        if amount_ok {
            let applied = match candidate.kind {
                CandidateKind::Income => {
                    incoming.checked_add(candidate.amount_minor).map(|t| incoming = t)
                }
                CandidateKind::Expense => {
                    outgoing.checked_add(candidate.amount_minor).map(|t| outgoing = t)
                }
                CandidateKind::Transfer => outgoing
                    .checked_add(candidate.amount_minor)
                    .and_then(|t| t.checked_add(candidate.transfer_fee_minor.unwrap_or(0)))
                    .map(|t| outgoing = t),
            };
            if applied.is_none() {
                issues.push(ValidationIssue::new(
                    index,
                    "amount_minor",
                    "batch total overflows",
                ));
            }
        }
    }

    if issues.is_empty() && outgoing > wallet.balance_minor {
        issues.push(ValidationIssue::new(
            None,
            "amount_minor",
            format!(
                "insufficient funds: outgoing total {outgoing} exceeds balance {}",
                wallet.balance_minor
            ),
        ));
    }

    if issues.is_empty() {
        // Outgoing fits within the balance, so the subtraction cannot
        // underflow; the income side still needs the overflow check.
        match (wallet.balance_minor - outgoing).checked_add(incoming) {
            Some(balance_after) => return Ok(balance_after),
            None => issues.push(ValidationIssue::new(
                None,
                "amount_minor",
                "batch total overflows",
            )),
        }
    }
    Err(issues)
}
