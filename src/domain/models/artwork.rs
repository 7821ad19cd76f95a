#[cfg(test)]
#[path = "artwork_test.rs"]
mod tests;

use serde::de;
use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde_json::Value;
use strum::EnumIter;
use strum::EnumVariantNames;
use strum::IntoEnumIterator;

pub type ArtworkId = String;

/// The backend hands out numeric ids, the client treats them as opaque.
fn deserialize_id<'de, D>(deserializer: D) -> Result<ArtworkId, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(id) => return Ok(id),
        Value::Number(id) => return Ok(id.to_string()),
        other => return Err(de::Error::custom(format!("invalid artwork id {other}"))),
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ArtworkStatus {
    Processing,
    Completed,
    Failed,
}

impl ArtworkStatus {
    pub fn is_terminal(&self) -> bool {
        return *self != ArtworkStatus::Processing;
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, EnumIter, EnumVariantNames, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PublicScope {
    /// Only the generated image is visible in the gallery.
    #[default]
    ResultOnly,
    /// Source and generated image are both visible.
    All,
}

impl PublicScope {
    pub fn parse(text: &str) -> Option<PublicScope> {
        return PublicScope::iter().find(|e| return e.to_string() == text);
    }
}

/// Client side projection of a generation job.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Artwork {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: ArtworkId,
    pub status: ArtworkStatus,
    #[serde(default)]
    pub source_image_url: Option<String>,
    #[serde(default)]
    pub result_image_url: Option<String>,
    #[serde(default)]
    pub progress: Option<f64>,
    #[serde(default)]
    pub style_name: Option<String>,
    #[serde(default)]
    pub is_public: bool,
    #[serde(default)]
    pub public_scope: Option<PublicScope>,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub likes_count: i64,
    #[serde(default)]
    pub views_count: i64,
}

impl Artwork {
    pub fn is_processing(&self) -> bool {
        return self.status == ArtworkStatus::Processing;
    }

    /// Folds a progress report into the projection. Returns true when the
    /// artwork reached a terminal status.
    pub fn apply(&mut self, report: &ArtworkProgress) -> bool {
        match report.status {
            ArtworkStatus::Completed => {
                self.status = ArtworkStatus::Completed;
                if report.artwork_url.is_some() {
                    self.result_image_url = report.artwork_url.clone();
                }
                self.progress = Some(100.0);
            }
            ArtworkStatus::Failed => {
                self.status = ArtworkStatus::Failed;
                self.error_message = report.error_message.clone();
            }
            ArtworkStatus::Processing => {
                if report.progress.is_some() {
                    self.progress = report.progress;
                }
            }
        }

        return self.status.is_terminal();
    }
}

/// Body of `GET /artworks/{id}/progress`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ArtworkProgress {
    pub status: ArtworkStatus,
    #[serde(default)]
    pub progress: Option<f64>,
    #[serde(default, alias = "result_image_url")]
    pub artwork_url: Option<String>,
    #[serde(default)]
    pub error_message: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ImageSource {
    Url(String),
    /// Base64 encoded image bytes.
    Inline(String),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct NewArtwork {
    pub style_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_base64: Option<String>,
}

impl NewArtwork {
    pub fn new(style_id: i64, source: ImageSource) -> NewArtwork {
        match source {
            ImageSource::Url(url) => {
                return NewArtwork {
                    style_id,
                    image_url: Some(url),
                    image_base64: None,
                }
            }
            ImageSource::Inline(data) => {
                return NewArtwork {
                    style_id,
                    image_url: None,
                    image_base64: Some(data),
                }
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Publication {
    pub is_public: bool,
    pub public_scope: PublicScope,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, EnumIter, EnumVariantNames, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum PortfolioTab {
    #[default]
    All,
    Public,
    Private,
}

impl PortfolioTab {
    pub fn parse(text: &str) -> Option<PortfolioTab> {
        return PortfolioTab::iter().find(|e| return e.to_string() == text);
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArtworkQuery {
    pub skip: usize,
    pub limit: usize,
    pub tab: PortfolioTab,
}

impl Default for ArtworkQuery {
    fn default() -> ArtworkQuery {
        return ArtworkQuery {
            skip: 0,
            limit: 10,
            tab: PortfolioTab::All,
        };
    }
}

impl ArtworkQuery {
    pub fn to_params(&self) -> Vec<(String, String)> {
        let mut params = vec![
            ("skip".to_string(), self.skip.to_string()),
            ("limit".to_string(), self.limit.to_string()),
            ("order_by".to_string(), "created_at".to_string()),
            ("order_desc".to_string(), "true".to_string()),
        ];

        match self.tab {
            PortfolioTab::Public => params.push(("is_public".to_string(), "true".to_string())),
            PortfolioTab::Private => params.push(("is_public".to_string(), "false".to_string())),
            PortfolioTab::All => {}
        }

        return params;
    }
}

/// Order of the public gallery.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, EnumIter, EnumVariantNames, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum GallerySort {
    #[default]
    Latest,
    Popular,
    Likes,
}

impl GallerySort {
    pub fn parse(text: &str) -> Option<GallerySort> {
        return GallerySort::iter().find(|e| return e.to_string() == text);
    }

    pub fn order_by(&self) -> &'static str {
        match self {
            GallerySort::Latest => return "created_at",
            GallerySort::Popular => return "views_count",
            GallerySort::Likes => return "likes_count",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GalleryQuery {
    pub skip: usize,
    pub limit: usize,
    pub sort: GallerySort,
}

impl Default for GalleryQuery {
    fn default() -> GalleryQuery {
        return GalleryQuery {
            skip: 0,
            limit: 10,
            sort: GallerySort::Latest,
        };
    }
}

impl GalleryQuery {
    pub fn to_params(&self) -> Vec<(String, String)> {
        return vec![
            ("skip".to_string(), self.skip.to_string()),
            ("limit".to_string(), self.limit.to_string()),
            ("is_public".to_string(), "true".to_string()),
            ("order_by".to_string(), self.sort.order_by().to_string()),
            ("order_desc".to_string(), "true".to_string()),
        ];
    }
}
