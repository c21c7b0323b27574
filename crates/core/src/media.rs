//! Cloudinary delivery URLs for stored images.
//!
//! Pure string building: no request is ever made to Cloudinary.

use serde::Serialize;

/// Crop, gravity and format options of an image transformation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transformation {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub crop: Option<&'static str>,
    pub gravity: Option<&'static str>,
    pub quality: Option<&'static str>,
    pub format: Option<&'static str>,
}

impl Transformation {
    pub fn thumbnail() -> Self {
        Self {
            width: Some(150),
            height: Some(150),
            crop: Some("fill"),
            gravity: Some("auto"),
            quality: Some("auto"),
            format: Some("auto"),
        }
    }

    pub fn medium() -> Self {
        Self::limit(800, "auto")
    }

    pub fn large() -> Self {
        Self::limit(1200, "auto")
    }

    pub fn webp() -> Self {
        Self::limit(800, "webp")
    }

    pub fn avatar_thumbnail() -> Self {
        Self {
            width: Some(150),
            height: Some(150),
            crop: Some("thumb"),
            gravity: Some("face"),
            quality: Some("auto"),
            format: Some("auto"),
        }
    }

    fn limit(width: u32, format: &'static str) -> Self {
        Self {
            width: Some(width),
            crop: Some("limit"),
            quality: Some("auto"),
            format: Some(format),
            ..Self::default()
        }
    }

    /// Renders the `c_,f_,g_,h_,q_,w_` segment. Empty when nothing is set.
    pub fn render(&self) -> String {
        // Already in key order.
        let parts = [
            self.crop.map(|c| format!("c_{c}")),
            self.format.map(|f| format!("f_{f}")),
            self.gravity.map(|g| format!("g_{g}")),
            self.height.map(|h| format!("h_{h}")),
            self.quality.map(|q| format!("q_{q}")),
            self.width.map(|w| format!("w_{w}")),
        ];
        parts.into_iter().flatten().collect::<Vec<_>>().join(",")
    }
}

/// Extension used when a stored path has none.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Avatar,
    Image,
}

impl MediaKind {
    fn default_extension(&self) -> &'static str {
        match self {
            MediaKind::Avatar => ".jpg",
            MediaKind::Image => ".png",
        }
    }
}

/// Splits `path` into its public id and lowercased extension.
///
/// Only the last path segment is searched for an extension.
pub fn split_public_id(path: &str) -> (&str, Option<String>) {
    let file_start = path.rfind('/').map_or(0, |i| i + 1);
    match path[file_start..].rfind('.') {
        Some(dot) if dot > 0 => {
            let split = file_start + dot;
            (&path[..split], Some(path[split..].to_lowercase()))
        }
        _ => (path, None),
    }
}

/// Builds delivery URLs for one Cloudinary account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloudinaryUrlBuilder {
    cloud_name: String,
}

impl CloudinaryUrlBuilder {
    pub fn new(cloud_name: impl Into<String>) -> Self {
        Self {
            cloud_name: cloud_name.into(),
        }
    }

    pub fn cloud_name(&self) -> &str {
        &self.cloud_name
    }

    /// URL of `path`, optionally transformed.
    ///
    /// `extension` overrides the extension found in the path, e.g. a stored
    /// `file_extension` column.
    pub fn url(
        &self,
        path: &str,
        kind: MediaKind,
        extension: Option<&str>,
        transformation: Option<&Transformation>,
    ) -> String {
        let (public_id, path_ext) = split_public_id(path);
        let ext = match extension.filter(|e| !e.is_empty()) {
            Some(e) if e.starts_with('.') => e.to_lowercase(),
            Some(e) => format!(".{}", e.to_lowercase()),
            None => path_ext.unwrap_or_else(|| kind.default_extension().to_string()),
        };
        let segment = transformation
            .map(Transformation::render)
            .filter(|s| !s.is_empty())
            .map(|s| format!("{s}/"))
            .unwrap_or_default();
        format!(
            "https://res.cloudinary.com/{}/image/upload/{segment}{public_id}{ext}",
            self.cloud_name
        )
    }

    /// URL of a non-image upload such as a PDF or an archive.
    ///
    /// Raw files keep their full name as the public id.
    pub fn raw_url(&self, path: &str) -> String {
        format!(
            "https://res.cloudinary.com/{}/raw/upload/{}",
            self.cloud_name,
            path.trim_start_matches('/')
        )
    }

    /// Original and thumbnail URLs of an avatar.
    pub fn avatar_urls(&self, path: &str) -> (String, String) {
        (
            self.url(path, MediaKind::Avatar, None, None),
            self.url(
                path,
                MediaKind::Avatar,
                None,
                Some(&Transformation::avatar_thumbnail()),
            ),
        )
    }

    /// Every preset of a stored image.
    pub fn image_urls(&self, path: &str, extension: Option<&str>) -> ImageUrls {
        let build = |t: Option<Transformation>| self.url(path, MediaKind::Image, extension, t.as_ref());
        ImageUrls {
            image_url: build(None),
            thumbnail_url: build(Some(Transformation::thumbnail())),
            medium_url: build(Some(Transformation::medium())),
            large_url: build(Some(Transformation::large())),
            webp_url: build(Some(Transformation::webp())),
        }
    }
}

/// Responsive URL set of one image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageUrls {
    pub image_url: String,
    pub thumbnail_url: String,
    pub medium_url: String,
    pub large_url: String,
    pub webp_url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builder() -> CloudinaryUrlBuilder {
        CloudinaryUrlBuilder::new("demo")
    }

    #[test]
    fn test_raw_url_keeps_extension() {
        assert_eq!(
            builder().raw_url("procedures/attachments/guide.pdf"),
            "https://res.cloudinary.com/demo/raw/upload/procedures/attachments/guide.pdf"
        );
    }

    #[test]
    fn test_original_url() {
        assert_eq!(
            builder().url("ticket_images/a.PNG", MediaKind::Image, None, None),
            "https://res.cloudinary.com/demo/image/upload/ticket_images/a.png"
        );
    }

    #[test]
    fn test_thumbnail_url() {
        assert_eq!(
            builder().url(
                "ticket_images/a.jpg",
                MediaKind::Image,
                None,
                Some(&Transformation::thumbnail())
            ),
            "https://res.cloudinary.com/demo/image/upload/c_fill,f_auto,g_auto,h_150,q_auto,w_150/ticket_images/a.jpg"
        );
    }

    #[test]
    fn test_default_extensions() {
        let b = builder();
        assert!(b
            .url("avatars/u/pic", MediaKind::Avatar, None, None)
            .ends_with("avatars/u/pic.jpg"));
        assert!(b
            .url("procedures/p/img", MediaKind::Image, None, None)
            .ends_with("procedures/p/img.png"));
    }

    #[test]
    fn test_explicit_extension_wins() {
        assert!(builder()
            .url("interventions/x", MediaKind::Image, Some("WEBP"), None)
            .ends_with("interventions/x.webp"));
    }

    #[test]
    fn test_dot_in_directory_is_not_an_extension() {
        assert_eq!(split_public_id("a.b/c"), ("a.b/c", None));
        assert_eq!(
            split_public_id("a.b/c.gif"),
            ("a.b/c", Some(".gif".to_string()))
        );
    }

    #[test]
    fn test_presets() {
        assert_eq!(Transformation::medium().render(), "c_limit,f_auto,q_auto,w_800");
        assert_eq!(Transformation::large().render(), "c_limit,f_auto,q_auto,w_1200");
        assert_eq!(Transformation::webp().render(), "c_limit,f_webp,q_auto,w_800");
        assert_eq!(
            Transformation::avatar_thumbnail().render(),
            "c_thumb,f_auto,g_face,h_150,q_auto,w_150"
        );
        assert_eq!(Transformation::default().render(), "");
    }

    #[test]
    fn test_avatar_urls() {
        let (original, thumb) = builder().avatar_urls("avatars/1/me.png");
        assert!(original.ends_with("/upload/avatars/1/me.png"));
        assert!(thumb.contains("/c_thumb,f_auto,g_face,h_150,q_auto,w_150/"));
    }
}
