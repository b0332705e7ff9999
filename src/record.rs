//! Record type for one social media post's engagement metrics

use serde::{Deserialize, Serialize};

/// One social media post with its engagement metrics and categorical metadata.
///
/// Serialized field names match the source CSV headers and the column names
/// of the `posts` table, so rows round-trip between CSV, SQLite and JSON
/// without any renaming layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocialMediaPost {
    #[serde(rename = "Post_ID")]
    pub post_id: String,

    #[serde(rename = "Platform")]
    pub platform: String,

    #[serde(rename = "Hashtag")]
    pub hashtag: String,

    #[serde(rename = "Content_Type")]
    pub content_type: String,

    #[serde(rename = "Region")]
    pub region: String,

    #[serde(rename = "Views")]
    pub views: i64,

    #[serde(rename = "Likes")]
    pub likes: i64,

    #[serde(rename = "Shares")]
    pub shares: i64,

    #[serde(rename = "Comments")]
    pub comments: i64,

    #[serde(rename = "Engagement_Level")]
    pub engagement_level: String,

    /// Calendar date as an ISO `YYYY-MM-DD` string. Kept as text end to end;
    /// comparisons and sorting over this field are lexical.
    #[serde(rename = "Post_Date")]
    pub post_date: String,
}
