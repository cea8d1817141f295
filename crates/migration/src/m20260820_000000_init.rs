//! Initial schema migration - creates all tables from scratch.
//!
//! Complete schema for SoChi:
//!
//! - `users`: account identities
//! - `wallets`: money locations (cash, bank, e-wallet) with denormalized balances
//! - `categories`: expense/income taxonomy with a "Khác" sentinel per kind
//! - `batches`: one row per committed batch, keyed for idempotent replay
//! - `transactions`: ledger rows with parse provenance
//!
//! The Vietnamese default categories are seeded here too, so a fresh
//! database can resolve rule-based hints out of the box.

use sea_orm::{ConnectionTrait, DbBackend, Statement, Value};
use sea_orm_migration::{SchemaManagerConnection, prelude::*};
use unicode_normalization::{UnicodeNormalization, char::is_combining_mark};
use uuid::Uuid;

#[derive(DeriveMigrationName)]
pub struct Migration;

// ─────────────────────────────────────────────────────────────────────────────
// Table identifiers
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Iden)]
enum Users {
    Table,
    Username,
    DisplayName,
}

#[derive(Iden)]
enum Wallets {
    Table,
    Id,
    UserId,
    Name,
    BalanceMinor,
    Currency,
    Archived,
}

#[derive(Iden)]
enum Categories {
    Table,
    Id,
    Kind,
    Name,
    NameNorm,
    IsSystem,
}

#[derive(Iden)]
enum Batches {
    Table,
    Id,
    UserId,
    WalletId,
    IdempotencyKey,
    BalanceBeforeMinor,
    BalanceAfterMinor,
    CreatedAt,
}

#[derive(Iden)]
enum Transactions {
    Table,
    Id,
    BatchId,
    WalletId,
    Position,
    Kind,
    AmountMinor,
    Currency,
    Description,
    CategoryId,
    Tags,
    TransferTarget,
    TransferFeeMinor,
    SourceStrategy,
    Confidence,
    OccurredAt,
    CreatedBy,
}

// ─────────────────────────────────────────────────────────────────────────────
// Migration implementation
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ───────────────────────────────────────────────────────────────────
        // 1. Users
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Users::Username)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Users::DisplayName).string())
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 2. Wallets
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Wallets::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Wallets::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Wallets::UserId).string().not_null())
                    .col(ColumnDef::new(Wallets::Name).string().not_null())
                    .col(
                        ColumnDef::new(Wallets::BalanceMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Wallets::Currency)
                            .string()
                            .not_null()
                            .default("VND"),
                    )
                    .col(
                        ColumnDef::new(Wallets::Archived)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-wallets-user_id")
                            .from(Wallets::Table, Wallets::UserId)
                            .to(Users::Table, Users::Username),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-wallets-user_id-name-unique")
                    .table(Wallets::Table)
                    .col(Wallets::UserId)
                    .col(Wallets::Name)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 3. Categories
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Categories::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Categories::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Categories::Kind).string().not_null())
                    .col(ColumnDef::new(Categories::Name).string().not_null())
                    .col(ColumnDef::new(Categories::NameNorm).string().not_null())
                    .col(
                        ColumnDef::new(Categories::IsSystem)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-categories-kind-name_norm-unique")
                    .table(Categories::Table)
                    .col(Categories::Kind)
                    .col(Categories::NameNorm)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 4. Batches
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Batches::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Batches::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Batches::UserId).string().not_null())
                    .col(ColumnDef::new(Batches::WalletId).string().not_null())
                    .col(ColumnDef::new(Batches::IdempotencyKey).string().not_null())
                    .col(
                        ColumnDef::new(Batches::BalanceBeforeMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Batches::BalanceAfterMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Batches::CreatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-batches-user_id")
                            .from(Batches::Table, Batches::UserId)
                            .to(Users::Table, Users::Username),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-batches-wallet_id")
                            .from(Batches::Table, Batches::WalletId)
                            .to(Wallets::Table, Wallets::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // Replay protection: one batch per (user, key), ever.
        manager
            .create_index(
                Index::create()
                    .name("uidx-batches-user_id-idempotency_key")
                    .table(Batches::Table)
                    .col(Batches::UserId)
                    .col(Batches::IdempotencyKey)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 5. Transactions
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Transactions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Transactions::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Transactions::BatchId).string().not_null())
                    .col(ColumnDef::new(Transactions::WalletId).string().not_null())
                    .col(ColumnDef::new(Transactions::Position).integer().not_null())
                    .col(ColumnDef::new(Transactions::Kind).string().not_null())
                    .col(
                        ColumnDef::new(Transactions::AmountMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Transactions::Currency)
                            .string()
                            .not_null()
                            .default("VND"),
                    )
                    .col(
                        ColumnDef::new(Transactions::Description)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Transactions::CategoryId).string())
                    .col(ColumnDef::new(Transactions::Tags).string())
                    .col(ColumnDef::new(Transactions::TransferTarget).string())
                    .col(ColumnDef::new(Transactions::TransferFeeMinor).big_integer())
                    .col(ColumnDef::new(Transactions::SourceStrategy).string())
                    .col(ColumnDef::new(Transactions::Confidence).double())
                    .col(
                        ColumnDef::new(Transactions::OccurredAt)
                            .timestamp()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Transactions::CreatedBy).string().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-transactions-batch_id")
                            .from(Transactions::Table, Transactions::BatchId)
                            .to(Batches::Table, Batches::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-transactions-wallet_id")
                            .from(Transactions::Table, Transactions::WalletId)
                            .to(Wallets::Table, Wallets::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-transactions-category_id")
                            .from(Transactions::Table, Transactions::CategoryId)
                            .to(Categories::Table, Categories::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-transactions-batch_id-position")
                    .table(Transactions::Table)
                    .col(Transactions::BatchId)
                    .col(Transactions::Position)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-transactions-wallet_id-occurred_at")
                    .table(Transactions::Table)
                    .col(Transactions::WalletId)
                    .col(Transactions::OccurredAt)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 6. Default Vietnamese categories
        // ───────────────────────────────────────────────────────────────────
        let db = manager.get_connection();
        let backend = db.get_database_backend();

        for &(kind, name, is_system) in DEFAULT_CATEGORIES {
            insert_category(db, backend, kind, name, is_system).await?;
        }

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Drop in reverse order of creation (respecting FK dependencies)
        manager
            .drop_table(Table::drop().table(Transactions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Batches::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Categories::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Wallets::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;
        Ok(())
    }
}

/// `(kind, display name, is_system)`. The "Khác" rows are the sentinels
/// that unmapped category hints resolve to.
const DEFAULT_CATEGORIES: &[(&str, &str, bool)] = &[
    ("expense", "Khác", true),
    ("expense", "Ăn uống", false),
    ("expense", "Cà phê", false),
    ("expense", "Di chuyển", false),
    ("expense", "Nhà cửa", false),
    ("expense", "Hóa đơn", false),
    ("expense", "Mua sắm", false),
    ("expense", "Quà tặng", false),
    ("income", "Khác", true),
    ("income", "Lương", false),
    ("income", "Thưởng", false),
    ("income", "Quà tặng", false),
];

async fn insert_category(
    db: &SchemaManagerConnection<'_>,
    backend: DbBackend,
    kind: &str,
    name: &str,
    is_system: bool,
) -> Result<(), DbErr> {
    let values: Vec<Value> = vec![
        Uuid::new_v4().to_string().into(),
        kind.into(),
        name.into(),
        normalize_key(name).into(),
        is_system.into(),
    ];
    db.execute(Statement::from_sql_and_values(
        backend,
        "INSERT INTO categories (id, kind, name, name_norm, is_system) \
         VALUES (?, ?, ?, ?, ?);",
        values,
    ))
    .await?;
    Ok(())
}

/// Same normalization the engine applies to category hints: NFKD, strip
/// combining marks, map đ/Đ, lowercase, collapse separators.
fn normalize_key(value: &str) -> String {
    let stripped: String = value
        .nfkd()
        .filter(|c| !is_combining_mark(*c))
        .map(|c| match c {
            'đ' => 'd',
            'Đ' => 'D',
            '_' | '-' => ' ',
            other => other,
        })
        .collect();

    stripped
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
