use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Content section an article is filed under. Stored by slug.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
    ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
pub enum Section {
    #[sea_orm(string_value = "crimes")]
    #[serde(rename = "crimes")]
    Crimes,
    #[sea_orm(string_value = "business")]
    #[serde(rename = "business")]
    Business,
    #[sea_orm(string_value = "news")]
    #[serde(rename = "news")]
    Political,
    #[sea_orm(string_value = "entertainments")]
    #[serde(rename = "entertainments")]
    Entertainments,
    #[sea_orm(string_value = "internationals")]
    #[serde(rename = "internationals")]
    Internationals,
    #[sea_orm(string_value = "educations")]
    #[serde(rename = "educations")]
    Educations,
    #[sea_orm(string_value = "sciences")]
    #[serde(rename = "sciences")]
    ScienceAndTech,
    #[sea_orm(string_value = "sports")]
    #[serde(rename = "sports")]
    Sports,
    #[sea_orm(string_value = "health-articles")]
    #[serde(rename = "health-articles")]
    HealthArticles,
    #[sea_orm(string_value = "political-articles")]
    #[serde(rename = "political-articles")]
    PoliticalArticles,
    #[sea_orm(string_value = "happening")]
    #[serde(rename = "happening")]
    Happenings,
    #[sea_orm(string_value = "innovations")]
    #[serde(rename = "innovations")]
    InnovativeArticles,
    #[sea_orm(string_value = "lifestyles")]
    #[serde(rename = "lifestyles")]
    LifestyleArticles,
    #[sea_orm(string_value = "religions")]
    #[serde(rename = "religions")]
    ReligionArticles,
    #[sea_orm(string_value = "sport-articles")]
    #[serde(rename = "sport-articles")]
    SportArticles,
    #[sea_orm(string_value = "cultures")]
    #[serde(rename = "cultures")]
    Cultures,
    #[sea_orm(string_value = "foods")]
    #[serde(rename = "foods")]
    Foods,
    #[sea_orm(string_value = "business-articles")]
    #[serde(rename = "business-articles")]
    BusinessArticles,
    #[sea_orm(string_value = "howtos")]
    #[serde(rename = "howtos")]
    Howtos,
    #[sea_orm(string_value = "celeb")]
    #[serde(rename = "celeb")]
    Celeb,
    #[sea_orm(string_value = "loves")]
    #[serde(rename = "loves")]
    Loves,
    #[sea_orm(string_value = "campus")]
    #[serde(rename = "campus")]
    Campus,
    #[sea_orm(string_value = "personalities")]
    #[serde(rename = "personalities")]
    Personalities,
    #[sea_orm(string_value = "events")]
    #[serde(rename = "events")]
    Events,
}

impl Section {
    /// Every section, in the order the sitemap chains their published articles.
    pub const ALL: [Section; 24] = [
        Section::Crimes,
        Section::Business,
        Section::Political,
        Section::Entertainments,
        Section::Internationals,
        Section::Educations,
        Section::ScienceAndTech,
        Section::Sports,
        Section::HealthArticles,
        Section::PoliticalArticles,
        Section::Happenings,
        Section::InnovativeArticles,
        Section::LifestyleArticles,
        Section::ReligionArticles,
        Section::SportArticles,
        Section::Cultures,
        Section::Foods,
        Section::BusinessArticles,
        Section::Howtos,
        Section::Celeb,
        Section::Loves,
        Section::Campus,
        Section::Personalities,
        Section::Events,
    ];

    pub fn slug(&self) -> String {
        self.to_value()
    }

    pub fn from_slug(slug: &str) -> Option<Section> {
        Self::ALL.into_iter().find(|s| s.slug() == slug)
    }

    pub fn ordinal(&self) -> usize {
        Self::ALL
            .iter()
            .position(|s| s == self)
            .unwrap_or(Self::ALL.len())
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Section::Crimes => "Crimes",
            Section::Business => "Business",
            Section::Political => "News",
            Section::Entertainments => "Entertainment",
            Section::Internationals => "International",
            Section::Educations => "Education",
            Section::ScienceAndTech => "Science & Tech",
            Section::Sports => "Sports",
            Section::HealthArticles => "Health Articles",
            Section::PoliticalArticles => "Political Articles",
            Section::Happenings => "Happenings",
            Section::InnovativeArticles => "Innovative Articles",
            Section::LifestyleArticles => "Lifestyle Articles",
            Section::ReligionArticles => "Religion Articles",
            Section::SportArticles => "Sport Articles",
            Section::Cultures => "Culture",
            Section::Foods => "Food",
            Section::BusinessArticles => "Business Articles",
            Section::Howtos => "How-tos",
            Section::Celeb => "Celebrity",
            Section::Loves => "Love",
            Section::Campus => "Campus",
            Section::Personalities => "Personalities",
            Section::Events => "Events",
        }
    }

    /// Label shown next to comments, e.g. "Health Article Comment".
    pub fn comment_label(&self) -> String {
        let name = self.display_name();
        match name.strip_suffix(" Articles") {
            Some(stem) => format!("{stem} Article Comment"),
            None => format!("{name} Comment"),
        }
    }
}
