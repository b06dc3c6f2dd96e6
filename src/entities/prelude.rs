pub use super::anime::Entity as Anime;
pub use super::anime_character::Entity as AnimeCharacter;
pub use super::anime_genre::Entity as AnimeGenre;
pub use super::anime_recommendation::Entity as AnimeRecommendation;
pub use super::anime_relation::Entity as AnimeRelation;
pub use super::anime_staff::Entity as AnimeStaffEdge;
pub use super::anime_studio::Entity as AnimeStudio;
pub use super::anime_tag::Entity as AnimeTag;
pub use super::character::Entity as Character;
pub use super::character_voice_actor::Entity as CharacterVoiceActor;
pub use super::external_link::Entity as ExternalLink;
pub use super::genre::Entity as Genre;
pub use super::staff::Entity as Staff;
pub use super::studio::Entity as Studio;
pub use super::tag::Entity as Tag;
pub use super::voice_actor::Entity as VoiceActor;
