pub mod prelude;

pub mod enums;

pub mod anime;
pub mod anime_character;
pub mod anime_genre;
pub mod anime_recommendation;
pub mod anime_relation;
pub mod anime_staff;
pub mod anime_studio;
pub mod anime_tag;
pub mod character;
pub mod character_voice_actor;
pub mod external_link;
pub mod genre;
pub mod staff;
pub mod studio;
pub mod tag;
pub mod voice_actor;
