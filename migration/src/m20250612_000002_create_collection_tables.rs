use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create artists table
        manager
            .create_table(
                Table::create()
                    .table(Artists::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Artists::Id).integer().not_null().auto_increment().primary_key())
                    .col(ColumnDef::new(Artists::Name).string().not_null().unique_key())
                    .to_owned(),
            )
            .await?;

        // Create sizes table (reference vocabulary: 7, 10, 12)
        manager
            .create_table(
                Table::create()
                    .table(Sizes::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Sizes::Id).integer().not_null().auto_increment().primary_key())
                    .col(ColumnDef::new(Sizes::Name).integer().not_null().unique_key())
                    .to_owned(),
            )
            .await?;

        // Create formats table (reference vocabulary: vinyl)
        manager
            .create_table(
                Table::create()
                    .table(Formats::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Formats::Id).integer().not_null().auto_increment().primary_key())
                    .col(ColumnDef::new(Formats::Name).string().not_null().unique_key())
                    .to_owned(),
            )
            .await?;

        // Create titles table
        manager
            .create_table(
                Table::create()
                    .table(Titles::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Titles::Id).integer().not_null().auto_increment().primary_key())
                    .col(ColumnDef::new(Titles::Name).string().not_null())
                    .col(ColumnDef::new(Titles::ArtistId).integer().not_null())
                    .col(ColumnDef::new(Titles::SizeId).integer().not_null())
                    .col(ColumnDef::new(Titles::FormatId).integer().not_null())
                    .col(ColumnDef::new(Titles::Color).string())
                    .col(ColumnDef::new(Titles::Year).integer().not_null())
                    .col(ColumnDef::new(Titles::Notes).string())
                    .col(ColumnDef::new(Titles::OwnerId).integer().not_null())
                    .col(ColumnDef::new(Titles::Mail).boolean().not_null().default(false))
                    .col(ColumnDef::new(Titles::Timestamp).big_integer().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_titles_artist_id")
                            .from(Titles::Table, Titles::ArtistId)
                            .to(Artists::Table, Artists::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_titles_size_id")
                            .from(Titles::Table, Titles::SizeId)
                            .to(Sizes::Table, Sizes::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_titles_format_id")
                            .from(Titles::Table, Titles::FormatId)
                            .to(Formats::Table, Formats::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_titles_owner_id")
                            .from(Titles::Table, Titles::OwnerId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_titles_owner_id")
                    .table(Titles::Table)
                    .col(Titles::OwnerId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_titles_timestamp")
                    .table(Titles::Table)
                    .col(Titles::Timestamp)
                    .to_owned(),
            )
            .await?;

        // Create images table; one auxiliary image per title, removed with it
        manager
            .create_table(
                Table::create()
                    .table(Images::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Images::RecordId).integer().not_null().primary_key())
                    .col(ColumnDef::new(Images::ImageUrl).string().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_images_record_id")
                            .from(Images::Table, Images::RecordId)
                            .to(Titles::Table, Titles::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Images::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Titles::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Formats::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Sizes::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Artists::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum Artists {
    Table,
    Id,
    Name,
}

#[derive(DeriveIden)]
enum Sizes {
    Table,
    Id,
    Name,
}

#[derive(DeriveIden)]
enum Formats {
    Table,
    Id,
    Name,
}

#[derive(DeriveIden)]
enum Titles {
    Table,
    Id,
    Name,
    ArtistId,
    SizeId,
    FormatId,
    Color,
    Year,
    Notes,
    OwnerId,
    Mail,
    Timestamp,
}

#[derive(DeriveIden)]
enum Images {
    Table,
    RecordId,
    ImageUrl,
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
}
