//! Embedded video links found in message text.
//!
//! Every YouTube or Vimeo link is swapped for a short placeholder in the stored
//! text and turned into an external [`Media`] entry pointing at the player.
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::models::{Media, MediaKind};

static YOUTUBE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?:https?://)?(?:www\.)?(?:youtube\.com/(?:watch\?v=|embed/)|youtu\.be/)([a-zA-Z0-9_-]+)\S*",
    )
    .expect("valid youtube regex")
});

static VIMEO: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:https?://)?(?:www\.)?vimeo\.com/(\d+)\S*").expect("valid vimeo regex")
});

#[derive(Debug, Default)]
pub struct ExtractedLinks {
    pub text: String,
    pub media: Vec<Media>,
}

struct Platform {
    pattern: &'static Lazy<Regex>,
    name: &'static str,
    placeholder_base: &'static str,
    player_base: &'static str,
    id_prefix: &'static str,
    mime_type: &'static str,
}

static PLATFORMS: [Platform; 2] = [
    Platform {
        pattern: &YOUTUBE,
        name: "YouTube",
        placeholder_base: "https://youtu.be/",
        player_base: "https://www.youtube.com/embed/",
        id_prefix: "youtube_",
        mime_type: "video/youtube",
    },
    Platform {
        pattern: &VIMEO,
        name: "Vimeo",
        placeholder_base: "https://vimeo.com/",
        player_base: "https://player.vimeo.com/video/",
        id_prefix: "vimeo_",
        mime_type: "video/vimeo",
    },
];

pub fn extract_video_links(text: &str) -> ExtractedLinks {
    let mut media: Vec<Media> = Vec::new();
    let mut text = text.to_string();

    for platform in PLATFORMS.iter() {
        text = platform
            .pattern
            .replace_all(&text, |caps: &Captures| {
                let video_id = &caps[1];
                let file_id = format!("{}{video_id}", platform.id_prefix);
                if !media.iter().any(|m| m.file_id == file_id) {
                    media.push(Media::external(
                        MediaKind::Video,
                        file_id,
                        format!("{}{video_id}", platform.player_base),
                        platform.mime_type,
                    ));
                }
                format!("[{}: {}{video_id}]", platform.name, platform.placeholder_base)
            })
            .into_owned();
    }

    ExtractedLinks { text, media }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn youtube_links_become_placeholders_and_media() {
        let out = extract_video_links(
            "Дивіться https://www.youtube.com/watch?v=dQw4w9WgXcQ&t=10s і youtu.be/abc_-1",
        );
        assert_eq!(
            out.text,
            "Дивіться [YouTube: https://youtu.be/dQw4w9WgXcQ] і [YouTube: https://youtu.be/abc_-1]"
        );
        assert_eq!(out.media.len(), 2);
        assert_eq!(out.media[0].file_id, "youtube_dQw4w9WgXcQ");
        assert_eq!(out.media[0].url, "https://www.youtube.com/embed/dQw4w9WgXcQ");
        assert!(out.media.iter().all(|m| m.is_external));
    }

    #[test]
    fn vimeo_links_are_recognised() {
        let out = extract_video_links("talk: https://vimeo.com/123456?share=copy");
        assert_eq!(out.text, "talk: [Vimeo: https://vimeo.com/123456]");
        assert_eq!(out.media[0].url, "https://player.vimeo.com/video/123456");
        assert_eq!(out.media[0].mime_type.as_deref(), Some("video/vimeo"));
    }

    #[test]
    fn repeated_link_yields_single_media() {
        let out = extract_video_links("youtu.be/x1 and again https://youtu.be/x1");
        assert_eq!(out.media.len(), 1);
        assert_eq!(
            out.text,
            "[YouTube: https://youtu.be/x1] and again [YouTube: https://youtu.be/x1]"
        );
    }

    #[test]
    fn plain_text_is_untouched() {
        let out = extract_video_links("nothing to see at https://example.com");
        assert_eq!(out.text, "nothing to see at https://example.com");
        assert!(out.media.is_empty());
    }
}
