//! Initial schema migration.
//!
//! Creates the complete schema:
//!
//! - `users`, `sessions`: site accounts and login sessions
//! - `courses`, `lessons`, `blogs`: read-only site content
//! - `category_expenses`, `category_incomes`, `category_invests`: category registry
//! - `expenses`, `incomes`, `invests`: ledger entries
//! - `budgets`: running total per expense category

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

// ─────────────────────────────────────────────────────────────────────────────
// Table identifiers
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Iden)]
enum Users {
    Table,
    Id,
    Email,
    PasswordHash,
    Salt,
    Verified,
    VerificationToken,
    CreatedAt,
}

#[derive(Iden)]
enum Sessions {
    Table,
    Token,
    UserId,
    ExpiresAt,
}

#[derive(Iden)]
enum Courses {
    Table,
    Id,
    Slug,
    Title,
    Description,
    Image,
    Featured,
    PublishedAt,
}

#[derive(Iden)]
enum Lessons {
    Table,
    Id,
    CourseId,
    Slug,
    Title,
    Content,
    Position,
}

#[derive(Iden)]
enum Blogs {
    Table,
    Id,
    Slug,
    Title,
    Summary,
    Body,
    Featured,
    PublishedAt,
}

/// Columns shared by the three category tables.
#[derive(Iden)]
enum CategoryColumns {
    Id,
    Name,
    NameNorm,
    BudgetLimitMinor,
    CreatedAt,
}

/// Columns shared by the three entry tables.
#[derive(Iden)]
enum EntryColumns {
    Id,
    Date,
    AmountMinor,
    CategoryId,
    Note,
    CreatedAt,
}

#[derive(Iden)]
enum Budgets {
    Table,
    CategoryId,
    CurrentAmountMinor,
    UpdatedAt,
}

/// `(entries table, categories table)` for each ledger kind.
const LEDGERS: [(&str, &str); 3] = [
    ("expenses", "category_expenses"),
    ("incomes", "category_incomes"),
    ("invests", "category_invests"),
];

// ─────────────────────────────────────────────────────────────────────────────
// Migration implementation
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ───────────────────────────────────────────────────────────────────
        // 1. Accounts
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Users::Id).string().not_null().primary_key())
                    .col(
                        ColumnDef::new(Users::Email)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Users::PasswordHash).string().not_null())
                    .col(ColumnDef::new(Users::Salt).string().not_null())
                    .col(
                        ColumnDef::new(Users::Verified)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Users::VerificationToken).string())
                    .col(ColumnDef::new(Users::CreatedAt).timestamp().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Sessions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Sessions::Token)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Sessions::UserId).string().not_null())
                    .col(ColumnDef::new(Sessions::ExpiresAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-sessions-user_id")
                            .from(Sessions::Table, Sessions::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 2. Content
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Courses::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Courses::Id).string().not_null().primary_key())
                    .col(
                        ColumnDef::new(Courses::Slug)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Courses::Title).string().not_null())
                    .col(ColumnDef::new(Courses::Description).string())
                    .col(ColumnDef::new(Courses::Image).string())
                    .col(
                        ColumnDef::new(Courses::Featured)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Courses::PublishedAt).timestamp().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Lessons::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Lessons::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Lessons::CourseId).string().not_null())
                    .col(ColumnDef::new(Lessons::Slug).string().not_null())
                    .col(ColumnDef::new(Lessons::Title).string().not_null())
                    .col(ColumnDef::new(Lessons::Content).text().not_null())
                    .col(ColumnDef::new(Lessons::Position).integer().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-lessons-course_id")
                            .from(Lessons::Table, Lessons::CourseId)
                            .to(Courses::Table, Courses::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-lessons-course_id-position")
                    .table(Lessons::Table)
                    .col(Lessons::CourseId)
                    .col(Lessons::Position)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Blogs::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Blogs::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Blogs::Slug).string().not_null().unique_key())
                    .col(ColumnDef::new(Blogs::Title).string().not_null())
                    .col(ColumnDef::new(Blogs::Summary).string())
                    .col(ColumnDef::new(Blogs::Body).text().not_null())
                    .col(
                        ColumnDef::new(Blogs::Featured)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Blogs::PublishedAt).timestamp().not_null())
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 3. Ledgers: categories + entries per kind
        // ───────────────────────────────────────────────────────────────────
        for (entries, categories) in LEDGERS {
            manager
                .create_table(
                    Table::create()
                        .table(Alias::new(categories))
                        .if_not_exists()
                        .col(
                            ColumnDef::new(CategoryColumns::Id)
                                .string()
                                .not_null()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(CategoryColumns::Name).string().not_null())
                        .col(
                            ColumnDef::new(CategoryColumns::NameNorm)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(CategoryColumns::BudgetLimitMinor).big_integer())
                        .col(
                            ColumnDef::new(CategoryColumns::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Alias::new(entries))
                        .if_not_exists()
                        .col(
                            ColumnDef::new(EntryColumns::Id)
                                .string()
                                .not_null()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(EntryColumns::Date).date().not_null())
                        .col(
                            ColumnDef::new(EntryColumns::AmountMinor)
                                .big_integer()
                                .not_null(),
                        )
                        .col(ColumnDef::new(EntryColumns::CategoryId).string().not_null())
                        .col(ColumnDef::new(EntryColumns::Note).string())
                        .col(
                            ColumnDef::new(EntryColumns::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name(format!("fk-{entries}-category_id"))
                                .from(Alias::new(entries), EntryColumns::CategoryId)
                                .to(Alias::new(categories), CategoryColumns::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name(format!("idx-{entries}-date"))
                        .table(Alias::new(entries))
                        .col(EntryColumns::Date)
                        .col(EntryColumns::Id)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name(format!("idx-{entries}-category_id"))
                        .table(Alias::new(entries))
                        .col(EntryColumns::CategoryId)
                        .to_owned(),
                )
                .await?;
        }

        // ───────────────────────────────────────────────────────────────────
        // 4. Budgets
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Budgets::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Budgets::CategoryId)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Budgets::CurrentAmountMinor)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Budgets::UpdatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-budgets-category_id")
                            .from(Budgets::Table, Budgets::CategoryId)
                            .to(Alias::new("category_expenses"), CategoryColumns::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Budgets::Table).if_exists().to_owned())
            .await?;

        for (entries, categories) in LEDGERS {
            manager
                .drop_table(Table::drop().table(Alias::new(entries)).if_exists().to_owned())
                .await?;
            manager
                .drop_table(
                    Table::drop()
                        .table(Alias::new(categories))
                        .if_exists()
                        .to_owned(),
                )
                .await?;
        }

        manager
            .drop_table(Table::drop().table(Lessons::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Courses::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Blogs::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Sessions::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).if_exists().to_owned())
            .await
    }
}
