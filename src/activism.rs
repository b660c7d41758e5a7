use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use time::macros::format_description;

use crate::db::Storage;
use crate::models::{ActivismRecord, ActivismStats};

const LISTED_RECORDS: i64 = 10;
const DESCRIPTION_CHARS: usize = 200;
const PLACEHOLDER_IMAGE: &str = "https://via.placeholder.com/600x400";
const DEFAULT_TITLE: &str = "Ініціатива активізму";

static DATE_IN_TEXT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\d{1,2}[\s.,-]\d{1,2}[\s.,-]\d{2,4}").expect("valid date regex")
});
static CITY_IN_TEXT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)м[\s.]\s*([А-ЯІЇЄҐа-яіїєґ']+)").expect("valid city regex")
});

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Initiative {
    pub id: usize,
    pub title: String,
    pub description: String,
    pub date: String,
    pub location: String,
    pub categories: String,
    pub author: String,
    pub image_url: String,
    /// Empty when the record has no video.
    pub video_url: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Stat {
    pub id: usize,
    pub label: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryStat {
    pub category: String,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivismResponse {
    pub success: bool,
    pub initiatives: Vec<Initiative>,
    pub stats: Vec<Stat>,
    pub category_stats: Vec<CategoryStat>,
}

/// Activism overview. Falls back to demo content when nothing is stored or the
/// store cannot be read.
pub async fn activism_overview(db: &dyn Storage) -> ActivismResponse {
    match stored_overview(db).await {
        Ok(Some(response)) => response,
        Ok(None) => {
            log::info!("no activism records stored, serving demo data");
            demo_data()
        }
        Err(err) => {
            log::error!("cannot read activism records, serving demo data: {err:?}");
            demo_data()
        }
    }
}

async fn stored_overview(db: &dyn Storage) -> anyhow::Result<Option<ActivismResponse>> {
    let stats = db.activism_stats().await?;
    if stats.total == 0 {
        return Ok(None);
    }
    let records = db.activism_records(LISTED_RECORDS).await?;
    Ok(Some(overview(&records, stats)))
}

/// Initiatives are the listed records, stats cover the whole table.
fn overview(records: &[ActivismRecord], totals: ActivismStats) -> ActivismResponse {
    let stats = vec![
        stat(1, "Initiatives", format!("{}+", totals.total)),
        stat(2, "Categories", totals.categories.len().to_string()),
        stat(3, "Posts with images", totals.with_images.to_string()),
        stat(4, "Posts with videos", totals.with_videos.to_string()),
    ];

    ActivismResponse {
        success: true,
        initiatives: records
            .iter()
            .enumerate()
            .map(|(i, r)| initiative(i + 1, r))
            .collect(),
        stats,
        category_stats: totals
            .categories
            .into_iter()
            .map(|(category, count)| CategoryStat { category, count })
            .collect(),
    }
}

fn stat(id: usize, label: &str, value: String) -> Stat {
    Stat {
        id,
        label: label.to_string(),
        value,
    }
}

fn initiative(id: usize, record: &ActivismRecord) -> Initiative {
    let text = record.text.as_str();
    let title = text
        .split('.')
        .next()
        .filter(|t| !t.is_empty())
        .unwrap_or(DEFAULT_TITLE)
        .to_string();

    let mut description: String = text.chars().take(DESCRIPTION_CHARS).collect();
    if text.chars().count() > DESCRIPTION_CHARS {
        description.push_str("...");
    }

    let date = match DATE_IN_TEXT.find(text) {
        Some(m) => m.as_str().to_string(),
        None => {
            let when = record.timestamp.unwrap_or(record.processed_at);
            when.format(format_description!("[day].[month].[year]"))
                .unwrap_or_default()
        }
    };

    let location = CITY_IN_TEXT
        .captures(text)
        .map(|caps| caps[1].to_string())
        .unwrap_or_else(|| "Україна".to_string());

    Initiative {
        id,
        title,
        description,
        date,
        location,
        categories: record.activism_categories.join(", "),
        author: record
            .author
            .clone()
            .filter(|a| !a.is_empty())
            .unwrap_or_else(|| "Активіст".to_string()),
        image_url: record
            .images
            .first()
            .cloned()
            .unwrap_or_else(|| PLACEHOLDER_IMAGE.to_string()),
        video_url: record.videos.first().cloned().unwrap_or_default(),
        url: record.url.clone(),
    }
}

fn demo_initiative(
    id: usize,
    title: &str,
    description: &str,
    date: &str,
    location: &str,
    categories: &str,
    author: &str,
    url: &str,
) -> Initiative {
    Initiative {
        id,
        title: title.to_string(),
        description: description.to_string(),
        date: date.to_string(),
        location: location.to_string(),
        categories: categories.to_string(),
        author: author.to_string(),
        image_url: PLACEHOLDER_IMAGE.to_string(),
        video_url: String::new(),
        url: url.to_string(),
    }
}

pub fn demo_data() -> ActivismResponse {
    ActivismResponse {
        success: true,
        initiatives: vec![
            demo_initiative(
                1,
                "Volunteer aid hub",
                "Collecting and delivering humanitarian aid to communities near the front line.",
                "01.05.2023",
                "Україна",
                "volunteer, social",
                "Андрій Гевюк",
                "https://www.facebook.com/agevyuk",
            ),
            demo_initiative(
                2,
                "Cybersecurity for everyone",
                "An open course on the basics of information security, safe browsing and phishing protection.",
                "15.06.2023",
                "Україна",
                "educational, digital",
                "Фонд Символи",
                "https://www.facebook.com/fsymvoly",
            ),
            demo_initiative(
                3,
                "CleanCity",
                "Cleaning up city parks and promoting waste sorting among residents.",
                "10.07.2023",
                "Київ",
                "ecological, social",
                "Активіст",
                "",
            ),
        ],
        stats: vec![
            stat(1, "Initiatives", "3+".to_string()),
            stat(2, "Categories", "5".to_string()),
            stat(3, "Posts with images", "3".to_string()),
            stat(4, "Posts with videos", "0".to_string()),
        ],
        category_stats: [
            ("social", 2),
            ("volunteer", 1),
            ("educational", 1),
            ("digital", 1),
            ("ecological", 1),
        ]
        .into_iter()
        .map(|(category, count)| CategoryStat {
            category: category.to_string(),
            count,
        })
        .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory::MemoryStorage;
    use time::macros::datetime;

    fn record(text: &str) -> ActivismRecord {
        ActivismRecord {
            url: "https://facebook.com/p/1".to_string(),
            author: None,
            text: text.to_string(),
            images: vec![],
            videos: vec![],
            activism_categories: vec![],
            timestamp: Some(datetime!(2024-03-05 10:00 UTC)),
            processed_at: datetime!(2024-03-06 10:00 UTC),
        }
    }

    #[test]
    fn initiative_fields_are_derived_from_text() {
        let mut r = record("Толока в парку. Зустріч 12.04.2024 у м. Львів, беріть рукавиці");
        r.images = vec!["https://img/1.jpg".to_string()];
        r.activism_categories = vec!["ecological".to_string(), "social".to_string()];
        let i = initiative(1, &r);
        assert_eq!(i.title, "Толока в парку");
        assert_eq!(i.date, "12.04.2024");
        assert_eq!(i.location, "Львів");
        assert_eq!(i.categories, "ecological, social");
        assert_eq!(i.author, "Активіст");
        assert_eq!(i.image_url, "https://img/1.jpg");
        assert_eq!(i.video_url, "");
        assert!(!i.description.ends_with("..."));
    }

    #[test]
    fn missing_details_fall_back_to_defaults() {
        let i = initiative(2, &record(&"a".repeat(250)));
        assert_eq!(i.date, "05.03.2024");
        assert_eq!(i.location, "Україна");
        assert_eq!(i.image_url, PLACEHOLDER_IMAGE);
        assert_eq!(i.description.chars().count(), DESCRIPTION_CHARS + 3);
    }

    #[tokio::test]
    async fn stored_records_are_summarised() {
        let db = MemoryStorage::new();
        let mut first = record("One");
        first.activism_categories = vec!["social".to_string()];
        first.videos = vec!["https://v/1".to_string()];
        let mut second = record("Two");
        second.activism_categories = vec!["social".to_string(), "digital".to_string()];
        db.push_activism(first);
        db.push_activism(second);

        let response = activism_overview(&db).await;
        assert_eq!(response.initiatives.len(), 2);
        assert_eq!(response.stats[0].value, "2+");
        assert_eq!(response.stats[1].value, "2");
        assert_eq!(response.stats[3].value, "1");
        assert_eq!(
            response.category_stats,
            vec![
                CategoryStat { category: "digital".to_string(), count: 1 },
                CategoryStat { category: "social".to_string(), count: 2 },
            ]
        );
    }

    #[test]
    fn title_keeps_text_before_first_period() {
        assert_eq!(initiative(1, &record(" Прибирання. Деталі")).title, " Прибирання");
        assert_eq!(initiative(1, &record(".Без заголовка")).title, DEFAULT_TITLE);
    }

    #[test]
    fn missing_video_is_serialized_as_empty_string() {
        let json = serde_json::to_value(initiative(1, &record("Text"))).unwrap();
        assert_eq!(json["videoUrl"], "");
    }

    #[tokio::test]
    async fn stats_cover_records_beyond_the_listed_ones() {
        let db = MemoryStorage::new();
        for n in 0..12 {
            let mut r = record(&format!("Initiative {n}"));
            r.images = vec![format!("https://img/{n}.jpg")];
            r.activism_categories = vec![format!("category-{n:02}")];
            db.push_activism(r);
        }

        let response = activism_overview(&db).await;
        assert_eq!(response.initiatives.len(), LISTED_RECORDS as usize);
        let values: Vec<&str> = response.stats.iter().map(|s| s.value.as_str()).collect();
        assert_eq!(values, vec!["12+", "12", "12", "0"]);
        assert_eq!(response.category_stats.len(), 12);
    }

    #[tokio::test]
    async fn empty_or_failing_store_serves_demo_data() {
        let db = MemoryStorage::new();
        assert_eq!(activism_overview(&db).await, demo_data());

        db.fail_activism();
        assert_eq!(activism_overview(&db).await, demo_data());
    }
}
