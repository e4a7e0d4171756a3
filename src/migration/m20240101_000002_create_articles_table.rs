use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(DeriveIden)]
enum Articles {
    Table,
    Id,
    UserId,
    Section,
    Title,
    Slug,
    Body,
    Publish,
    CreatedAt,
    UpdatedAt,
    Edited,
    Status,
    NewsImage,
    NewsImageTwo,
    NewsImageThree,
    NewsImageFour,
    Caption,
    CaptionTwo,
    CaptionThree,
    CaptionFour,
    TotalLikes,
    HitCount,
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Articles::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Articles::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Articles::UserId).integer().not_null())
                    .col(ColumnDef::new(Articles::Section).string_len(32).not_null())
                    .col(ColumnDef::new(Articles::Title).string_len(250).not_null())
                    .col(ColumnDef::new(Articles::Slug).string_len(250).not_null())
                    .col(ColumnDef::new(Articles::Body).text().not_null())
                    .col(
                        ColumnDef::new(Articles::Publish)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Articles::CreatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Articles::UpdatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Articles::Edited)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Articles::Status)
                            .string_len(2)
                            .not_null()
                            .default("DF"),
                    )
                    .col(ColumnDef::new(Articles::NewsImage).string().not_null())
                    .col(ColumnDef::new(Articles::NewsImageTwo).string().null())
                    .col(ColumnDef::new(Articles::NewsImageThree).string().null())
                    .col(ColumnDef::new(Articles::NewsImageFour).string().null())
                    .col(ColumnDef::new(Articles::Caption).string().null())
                    .col(ColumnDef::new(Articles::CaptionTwo).string().null())
                    .col(ColumnDef::new(Articles::CaptionThree).string().null())
                    .col(ColumnDef::new(Articles::CaptionFour).string().null())
                    .col(
                        ColumnDef::new(Articles::TotalLikes)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Articles::HitCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_articles_user_id")
                            .from(Articles::Table, Articles::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        let db = manager.get_connection();

        db.execute_unprepared(
            "CREATE INDEX IF NOT EXISTS idx_articles_publish ON articles (publish DESC)",
        )
        .await?;

        db.execute_unprepared(
            "CREATE INDEX IF NOT EXISTS idx_articles_total_likes ON articles (total_likes DESC)",
        )
        .await?;

        db.execute_unprepared(
            "CREATE INDEX IF NOT EXISTS idx_articles_section_status_publish \
             ON articles (section, status, publish DESC)",
        )
        .await?;

        // A slug may repeat within a section, but never on the same publish day.
        db.execute_unprepared(
            "CREATE UNIQUE INDEX IF NOT EXISTS idx_articles_slug_per_day \
             ON articles (section, slug, CAST(publish AS DATE))",
        )
        .await?;

        db.execute_unprepared(
            "ALTER TABLE articles ADD COLUMN search_vector tsvector \
             GENERATED ALWAYS AS (\
                 to_tsvector('english', coalesce(title, '')) || \
                 to_tsvector('english', coalesce(body, ''))\
             ) STORED",
        )
        .await?;

        db.execute_unprepared(
            "CREATE INDEX IF NOT EXISTS idx_articles_search ON articles USING GIN (search_vector)",
        )
        .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Articles::Table).to_owned())
            .await
    }
}
