use crate::entities::prelude::*;
use crate::entities::{anime, character, external_link, staff, voice_actor};
use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::Schema;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let backend = manager.get_database_backend();
        let schema = Schema::new(backend);

        manager
            .create_table(
                schema
                    .create_table_from_entity(Anime)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(Character)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(Staff)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(VoiceActor)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(Studio)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(Tag)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(Genre)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(ExternalLink)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(AnimeCharacter)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(AnimeStaffEdge)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(CharacterVoiceActor)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(AnimeGenre)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(AnimeStudio)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(AnimeTag)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(AnimeRelation)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(AnimeRecommendation)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        // Natural-key indexes the entity definitions cannot express:
        // composite uniques for the name quadruples and per-title links.
        manager
            .create_index(
                Index::create()
                    .name("idx_characters_name")
                    .table(Character)
                    .col(character::Column::NameRomaji)
                    .col(character::Column::NameEnglish)
                    .col(character::Column::NameNative)
                    .col(character::Column::NameUserPreferred)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_staff_name")
                    .table(Staff)
                    .col(staff::Column::NameRomaji)
                    .col(staff::Column::NameEnglish)
                    .col(staff::Column::NameNative)
                    .col(staff::Column::NameUserPreferred)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_voice_actors_name")
                    .table(VoiceActor)
                    .col(voice_actor::Column::NameRomaji)
                    .col(voice_actor::Column::NameEnglish)
                    .col(voice_actor::Column::NameNative)
                    .col(voice_actor::Column::NameUserPreferred)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_external_links_anime_url")
                    .table(ExternalLink)
                    .col(external_link::Column::AnimeId)
                    .col(external_link::Column::Url)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_anime_title_user_preferred")
                    .table(Anime)
                    .col(anime::Column::TitleUserPreferred)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(AnimeRecommendation).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(AnimeRelation).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(AnimeTag).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(AnimeStudio).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(AnimeGenre).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(CharacterVoiceActor).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(AnimeStaffEdge).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(AnimeCharacter).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ExternalLink).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Genre).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Tag).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Studio).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(VoiceActor).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Staff).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Character).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Anime).to_owned())
            .await
    }
}
