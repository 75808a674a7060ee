use sea_orm_migration::{prelude::*, sea_orm::DatabaseBackend};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .if_not_exists()
                    .table(GalleryImages::Table)
                    .col(pk_id_col(manager, GalleryImages::Id))
                    .col(uuid_col(GalleryImages::Uuid))
                    .col(ColumnDef::new(GalleryImages::Url).string().not_null())
                    .col(ColumnDef::new(GalleryImages::Title).string().not_null())
                    .col(ColumnDef::new(GalleryImages::BlobKey).string().not_null())
                    .col(timestamp_col(GalleryImages::CreatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_gallery_images_uuid")
                    .table(GalleryImages::Table)
                    .col(GalleryImages::Uuid)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_gallery_images_blob_key")
                    .table(GalleryImages::Table)
                    .col(GalleryImages::BlobKey)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .if_not_exists()
                    .table(TeamMembers::Table)
                    .col(pk_id_col(manager, TeamMembers::Id))
                    .col(uuid_col(TeamMembers::Uuid))
                    .col(ColumnDef::new(TeamMembers::Name).string().not_null())
                    .col(ColumnDef::new(TeamMembers::Role).string().not_null())
                    .col(ColumnDef::new(TeamMembers::Image).string().not_null())
                    .col(ColumnDef::new(TeamMembers::BlobKey).string().not_null())
                    .col(timestamp_col(TeamMembers::CreatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_team_members_uuid")
                    .table(TeamMembers::Table)
                    .col(TeamMembers::Uuid)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_team_members_blob_key")
                    .table(TeamMembers::Table)
                    .col(TeamMembers::BlobKey)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(TeamMembers::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(GalleryImages::Table).to_owned())
            .await?;
        Ok(())
    }
}

fn pk_id_col<T: Iden>(manager: &SchemaManager, col: T) -> ColumnDef {
    let mut col = ColumnDef::new(col);
    match manager.get_database_backend() {
        DatabaseBackend::Sqlite => {
            col.integer();
        }
        _ => {
            col.big_integer();
        }
    }
    col.not_null().auto_increment().primary_key().to_owned()
}

fn uuid_col<T: Iden>(col: T) -> ColumnDef {
    ColumnDef::new(col).uuid().not_null().to_owned()
}

fn timestamp_col<T: Iden>(col: T) -> ColumnDef {
    ColumnDef::new(col)
        .timestamp()
        .not_null()
        .default(Expr::current_timestamp())
        .to_owned()
}

#[derive(Iden)]
enum GalleryImages {
    Table,
    Id,
    Uuid,
    Url,
    Title,
    BlobKey,
    CreatedAt,
}

#[derive(Iden)]
enum TeamMembers {
    Table,
    Id,
    Uuid,
    Name,
    Role,
    Image,
    BlobKey,
    CreatedAt,
}
