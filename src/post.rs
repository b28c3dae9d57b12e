use serde::Deserialize;

/// One entry of the feed document.
///
/// The wire format uses Spanish field names (`titulo`, `descripcion`,
/// `imagen`); they are mapped onto English field names here. `image_path` is
/// relative and only becomes a URL once joined with the configured base URL.
///
/// Posts are only produced by decoding feed entries (see
/// [`parse`](crate::feed::parse)).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Post {
    #[serde(rename = "titulo")]
    pub title: String,
    #[serde(rename = "descripcion")]
    pub description: String,
    #[serde(rename = "imagen")]
    pub image_path: String,
}

#[cfg(test)]
impl Post {
    pub(crate) fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        image_path: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            image_path: image_path.into(),
        }
    }
}
