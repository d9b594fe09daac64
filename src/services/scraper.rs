//! scraper.rs
//!
//! Сбор кандидатов-кинотеатров со стороннего сайта для последующего импорта.
//!
//! 1.  Страница-список региона: `{base}/theater/{subdivision}/`. Из неё берутся ссылки
//!     вида `/theater/{subdivision}/{area}/{theater}/`, без повторов по пути.
//! 2.  Страницы кинотеатров обходятся строго последовательно с фиксированной паузой,
//!     чтобы не нагружать источник.
//! 3.  Из каждой страницы эвристиками достаются название, адрес, официальный сайт
//!     и список залов с числом мест.
//!
//! Ошибка на странице кинотеатра только выкидывает его из результата. Ошибка на
//! странице-списке обрывает весь сбор.

use std::collections::HashSet;
use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Url;
use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::ScraperConfig;

#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected status {status} from {url}")]
    Status { url: String, status: u16 },
    #[error("invalid url: {0}")]
    InvalidUrl(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapedScreen {
    pub name: String,
    pub seat_count: u32,
}

/// Кандидат на импорт, ещё не сохранён.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapedTheater {
    pub name: String,
    pub address: String,
    pub official_url: Option<String>,
    pub subdivision_id: i32,
    pub screens: Vec<ScrapedScreen>,
    pub source_url: String,
}

static H1: Lazy<Selector> = Lazy::new(|| Selector::parse("h1").unwrap());
static H2: Lazy<Selector> = Lazy::new(|| Selector::parse("h2").unwrap());
static ANCHOR: Lazy<Selector> = Lazy::new(|| Selector::parse("a[href]").unwrap());

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

// 所在地 + текст до следующей метки
static ADDRESS_LABELED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"所在地\s*[:：]?\s*(.{2,80}?)\s*(?:電話番号|電話|TEL|アクセス|駐車場|座席数|座席|公式|URL|営業時間)")
        .unwrap()
});

// Запасной вариант: адрес начинается с названия региона верхнего уровня
static ADDRESS_BY_REGION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"((?:北海道|東京都|京都府|大阪府|\p{Han}{2,3}県)[^\s<>]{2,60})").unwrap()
});

static SCREEN_PRIMARY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(スクリーン|シアター|SCREEN|Screen|THEATER|Theater)\s*(\d{1,2})(?:\s*[:：]\s*|\s+)(\d{1,4})\s*(?:座席|席)")
        .unwrap()
});

static SCREEN_BRACKETED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(スクリーン|シアター|SCREEN|Screen|THEATER|Theater)\s*(\d{1,2})\s*[（(]\s*(\d{1,4})\s*(?:座席|席)\s*[）)]")
        .unwrap()
});

fn collapse(text: &str) -> String {
    WHITESPACE.replace_all(text.trim(), " ").into_owned()
}

fn page_text(doc: &Html) -> String {
    collapse(&doc.root_element().text().collect::<Vec<_>>().join(" "))
}

fn first_heading(doc: &Html, selector: &Selector) -> Option<String> {
    doc.select(selector)
        .map(|el| collapse(&el.text().collect::<String>()))
        .find(|t| !t.is_empty())
}

/// Название: первый `h1`, иначе первый `h2`.
pub fn extract_name(doc: &Html) -> Option<String> {
    first_heading(doc, &H1).or_else(|| first_heading(doc, &H2))
}

pub fn extract_address(text: &str) -> Option<String> {
    let labeled = ADDRESS_LABELED
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string());

    labeled.filter(|a| !a.is_empty()).or_else(|| {
        ADDRESS_BY_REGION
            .captures(text)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string())
    })
}

/// Первая ссылка с «公式» в тексте и абсолютным http(s) адресом.
pub fn extract_official_url(doc: &Html) -> Option<String> {
    doc.select(&ANCHOR).find_map(|a| {
        let text: String = a.text().collect();
        let href = a.value().attr("href")?.trim();
        let absolute = href.starts_with("http://") || href.starts_with("https://");
        (text.contains("公式") && absolute).then(|| href.to_string())
    })
}

fn collect_screens(re: &Regex, text: &str) -> Vec<ScrapedScreen> {
    let mut seen = HashSet::new();
    let mut found: Vec<(u32, ScrapedScreen)> = Vec::new();

    for caps in re.captures_iter(text) {
        let number: u32 = match caps[2].parse() {
            Ok(n) => n,
            Err(_) => continue,
        };
        let seat_count: u32 = match caps[3].parse() {
            Ok(n) => n,
            Err(_) => continue,
        };
        let name = format!("{}{}", &caps[1], number);
        if seen.insert(name.clone()) {
            found.push((number, ScrapedScreen { name, seat_count }));
        }
    }

    // sort_by_key стабильный: при равных номерах порядок документа сохраняется
    found.sort_by_key(|(number, _)| *number);
    found.into_iter().map(|(_, s)| s).collect()
}

/// Залы и число мест. Сначала `スクリーン1：120席`, если пусто - `スクリーン2（80席）`.
pub fn extract_screens(text: &str) -> Vec<ScrapedScreen> {
    let primary = collect_screens(&SCREEN_PRIMARY, text);
    if !primary.is_empty() {
        return primary;
    }
    collect_screens(&SCREEN_BRACKETED, text)
}

/// Разбор страницы кинотеатра. Без названия кандидата нет.
pub fn extract_theater(html: &str, subdivision_id: i32, source_url: &str) -> Option<ScrapedTheater> {
    let doc = Html::parse_document(html);
    let name = extract_name(&doc)?;
    let text = page_text(&doc);

    Some(ScrapedTheater {
        name,
        address: extract_address(&text).unwrap_or_default(),
        official_url: extract_official_url(&doc),
        subdivision_id,
        screens: extract_screens(&text),
        source_url: source_url.to_string(),
    })
}

/// Пути страниц кинотеатров из страницы-списка, в порядке документа.
pub fn extract_theater_links(html: &str, subdivision_id: i32) -> Vec<String> {
    let pattern = format!(r"^(?:https?://[^/]+)?(/theater/{}/\d+/\d+/?)(?:[?#].*)?$", subdivision_id);
    let Ok(re) = Regex::new(&pattern) else {
        return Vec::new();
    };

    let doc = Html::parse_document(html);
    let mut seen = HashSet::new();
    let mut links = Vec::new();
    for a in doc.select(&ANCHOR) {
        let Some(href) = a.value().attr("href") else { continue };
        let Some(path) = re.captures(href.trim()).and_then(|c| c.get(1)) else { continue };
        let path = format!("{}/", path.as_str().trim_end_matches('/'));
        if seen.insert(path.clone()) {
            links.push(path);
        }
    }
    links
}

/// Клиент сбора. Создаётся один раз, хранится в AppState.
#[derive(Clone)]
pub struct TheaterScraper {
    client: reqwest::Client,
    base_url: Url,
    request_delay: Duration,
}

impl TheaterScraper {
    pub fn new(config: &ScraperConfig) -> Result<Self, ScrapeError> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        let base_url = Url::parse(&format!("{}/", config.base_url.trim_end_matches('/')))
            .map_err(|_| ScrapeError::InvalidUrl(config.base_url.clone()))?;

        Ok(Self {
            client,
            base_url,
            request_delay: Duration::from_millis(config.request_delay_ms),
        })
    }

    fn url(&self, path: &str) -> Result<Url, ScrapeError> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|_| ScrapeError::InvalidUrl(path.to_string()))
    }

    async fn fetch(&self, url: Url) -> Result<String, ScrapeError> {
        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ScrapeError::Status { url: url.to_string(), status: status.as_u16() });
        }
        Ok(response.text().await?)
    }

    pub async fn scrape_subdivision(&self, subdivision_id: i32) -> Result<Vec<ScrapedTheater>, ScrapeError> {
        let listing_url = self.url(&format!("theater/{}/", subdivision_id))?;
        info!("Scraping theater listing {}", listing_url);

        let listing = self.fetch(listing_url).await?;
        let links = extract_theater_links(&listing, subdivision_id);
        info!("Found {} theater links for subdivision {}", links.len(), subdivision_id);

        let mut theaters = Vec::with_capacity(links.len());
        for (i, path) in links.iter().enumerate() {
            if i > 0 && !self.request_delay.is_zero() {
                tokio::time::sleep(self.request_delay).await;
            }

            let url = match self.url(path) {
                Ok(url) => url,
                Err(e) => {
                    warn!("Skipping theater link {}: {}", path, e);
                    continue;
                }
            };

            match self.fetch(url.clone()).await {
                Ok(html) => match extract_theater(&html, subdivision_id, url.as_str()) {
                    Some(theater) => theaters.push(theater),
                    None => debug!("No theater name on {}, dropped", url),
                },
                Err(e) => warn!("Failed to fetch theater page {}: {}", url, e),
            }
        }

        info!("Scraped {} theaters for subdivision {}", theaters.len(), subdivision_id);
        Ok(theaters)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DETAIL: &str = r#"
        <html><body>
          <h1> TOHOシネマズ 日比谷 </h1>
          <dl>
            <dt>所在地</dt><dd>東京都千代田区有楽町1-1-2 東京ミッドタウン日比谷4F</dd>
            <dt>電話</dt><dd>050-6868-5068</dd>
          </dl>
          <a href="/movie/">作品一覧</a>
          <a href="https://www.tohotheater.jp/theater/081/">公式サイト</a>
          <table>
            <tr><td>スクリーン2：189座席</td></tr>
            <tr><td>スクリーン1：120座席</td></tr>
            <tr><td>スクリーン1：120座席</td></tr>
            <tr><td>スクリーン10：98席</td></tr>
          </table>
        </body></html>
    "#;

    #[test]
    fn extracts_full_detail_page() {
        let t = extract_theater(DETAIL, 13, "https://example.test/theater/13/130201/3263/").unwrap();
        assert_eq!(t.name, "TOHOシネマズ 日比谷");
        assert_eq!(t.address, "東京都千代田区有楽町1-1-2 東京ミッドタウン日比谷4F");
        assert_eq!(t.official_url.as_deref(), Some("https://www.tohotheater.jp/theater/081/"));
        assert_eq!(
            t.screens,
            vec![
                ScrapedScreen { name: "スクリーン1".into(), seat_count: 120 },
                ScrapedScreen { name: "スクリーン2".into(), seat_count: 189 },
                ScrapedScreen { name: "スクリーン10".into(), seat_count: 98 },
            ]
        );
        assert_eq!(t.subdivision_id, 13);
        assert_eq!(t.source_url, "https://example.test/theater/13/130201/3263/");
    }

    #[test]
    fn primary_screen_pattern() {
        assert_eq!(
            extract_screens("スクリーン1：120座席"),
            vec![ScrapedScreen { name: "スクリーン1".into(), seat_count: 120 }]
        );
    }

    #[test]
    fn bracketed_fallback_only_when_primary_is_empty() {
        assert_eq!(
            extract_screens("スクリーン2（80席）"),
            vec![ScrapedScreen { name: "スクリーン2".into(), seat_count: 80 }]
        );
        let mixed = extract_screens("スクリーン1：120席 スクリーン2（80席）");
        assert_eq!(mixed, vec![ScrapedScreen { name: "スクリーン1".into(), seat_count: 120 }]);
    }

    #[test]
    fn name_falls_back_to_h2_and_missing_name_drops_page() {
        let doc = r#"<html><body><h2>シネマ・ジャック</h2></body></html>"#;
        assert_eq!(extract_theater(doc, 14, "u").unwrap().name, "シネマ・ジャック");

        let nameless = r#"<html><body><p>スクリーン1：100席</p></body></html>"#;
        assert!(extract_theater(nameless, 14, "u").is_none());
    }

    #[test]
    fn address_falls_back_to_region_prefix() {
        let text = "アクセス案内 神奈川県横浜市中区本町1-1 までお越しください";
        assert_eq!(extract_address(text).as_deref(), Some("神奈川県横浜市中区本町1-1"));
        assert!(extract_address("no address here").is_none());
    }

    #[test]
    fn official_url_requires_marker_and_absolute_href() {
        let html = r#"<a href="/official/">公式サイト</a><a href="https://other.test/">サイト</a>"#;
        assert!(extract_official_url(&Html::parse_document(html)).is_none());
    }

    #[test]
    fn listing_links_are_filtered_and_deduplicated() {
        let html = r#"
            <a href="/theater/13/130201/3263/">A</a>
            <a href="https://eiga.com/theater/13/130201/3263">A again</a>
            <a href="/theater/13/130301/3010/#map">B</a>
            <a href="/theater/14/140101/1000/">other region</a>
            <a href="/theater/13/">listing itself</a>
            <a href="/movie/1234/">movie</a>
        "#;
        assert_eq!(
            extract_theater_links(html, 13),
            vec!["/theater/13/130201/3263/", "/theater/13/130301/3010/"]
        );
    }
}
