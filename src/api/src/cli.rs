//! CLI commands for keiba-db.
//!
//! Crawling (`collect`, `dump`, `sync`), loading saved pages into SQLite
//! (`import`) and inspecting a single saved page (`parse`).

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::collections::HashSet;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::import::{import_dir, import_race_file};
use crate::scraper::historical::{absolute_url, is_day_page_for, race_calendar_url, RaceListParser};
use crate::scraper::parsers::{PayoffParser, PedigreeParser, RaceInfoParser, RaceResultParser};
use crate::scraper::{horse_ped_url, PageKind, PageStore, RateLimiter, Session};
use crate::storage::RaceRepository;

#[derive(Parser)]
#[command(name = "keiba-db")]
#[command(version, about = "Keiba-DB: race database builder for db.netkeiba.com", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Collect race page URLs from the race calendar into the race list
    Collect {
        /// Number of years to walk back from the current month
        #[arg(short, long, default_value_t = 10, value_parser = clap::value_parser!(u32).range(1..=100))]
        years: u32,
    },

    /// Download pages that are not on disk yet
    Dump {
        /// Page kind: race (from the race list) or horse (pedigrees missing from the database)
        #[arg(short, long, value_enum, default_value = "race")]
        kind: PageKind,
    },

    /// Import downloaded pages into the database
    Import {
        /// Page kind to import
        #[arg(short, long, value_enum, default_value = "race")]
        kind: PageKind,

        /// Delete the database file before importing
        #[arg(long)]
        force: bool,
    },

    /// Download and import races newer than the latest race in the database
    Sync,

    /// Print the records of one saved page as JSON
    Parse {
        /// Saved page (file name is the race or horse id)
        file: PathBuf,

        /// Page kind
        #[arg(short, long, value_enum, default_value = "race")]
        kind: PageKind,
    },
}

/// Where listing pages (calendar, race days) come from
trait ListingSource {
    async fn fetch(&self, url: &str) -> Result<String>;
}

/// Session paced by the listing request interval
struct PacedSession {
    session: Session,
    limiter: RateLimiter,
}

impl ListingSource for PacedSession {
    async fn fetch(&self, url: &str) -> Result<String> {
        self.limiter.acquire().await;
        self.session.fetch_page(url).await
    }
}

/// Walks the race calendar backwards.
///
/// A day page that fails to load is logged and skipped. A calendar page that
/// fails ends the walk, since the previous month link is on it.
struct Crawler<S> {
    source: S,
    db_url: String,
}

impl Crawler<PacedSession> {
    fn new(config: &AppConfig) -> Result<Self> {
        Ok(Self {
            source: PacedSession {
                session: Session::new(&config.crawl.user_agent)?,
                limiter: RateLimiter::new(
                    config.crawl.request_interval_secs,
                    config.crawl.jitter_secs,
                ),
            },
            db_url: config.netkeiba.db_url.clone(),
        })
    }
}

impl<S: ListingSource> Crawler<S> {
    async fn race_pages_of_day(&self, day_href: &str) -> Option<Vec<String>> {
        let url = absolute_url(&self.db_url, day_href);
        match self.source.fetch(&url).await {
            Ok(html) => Some(RaceListParser::race_pages(&html, &self.db_url)),
            Err(e) => {
                warn!("Skipping race day {}: {:#}", url, e);
                None
            }
        }
    }

    /// Walk the calendar back `months` months, writing every race page URL
    async fn collect(&self, months: u32, out: &mut impl Write) -> Result<usize> {
        let mut calendar_url = race_calendar_url(&self.db_url);
        let mut collected = 0;

        for month in 0..months {
            info!("Collecting month {}/{}: {}", month + 1, months, calendar_url);
            let calendar = match self.source.fetch(&calendar_url).await {
                Ok(html) => RaceListParser::schedule_pages(&html),
                Err(e) => {
                    warn!("Stopping at {}: {:#}", calendar_url, e);
                    break;
                }
            };

            for day in &calendar.day_pages {
                for url in self.race_pages_of_day(day).await.unwrap_or_default() {
                    writeln!(out, "{}", url)?;
                    collected += 1;
                }
            }

            match calendar.previous_month {
                Some(href) => calendar_url = absolute_url(&self.db_url, &href),
                None => {
                    warn!("No previous month link on {}, stopping", calendar_url);
                    break;
                }
            }
        }

        Ok(collected)
    }

    /// Race page URLs of every race day after `latest`, newest first.
    ///
    /// A failed calendar page is an error here: stopping early would leave a
    /// gap behind the newly imported races.
    async fn collect_since(&self, latest: chrono::NaiveDate) -> Result<Vec<String>> {
        let mut calendar_url = race_calendar_url(&self.db_url);
        let mut urls = Vec::new();

        loop {
            info!("Checking {}", calendar_url);
            let html = self
                .source
                .fetch(&calendar_url)
                .await
                .with_context(|| format!("Failed to load race calendar {}", calendar_url))?;
            let calendar = RaceListParser::schedule_pages(&html);

            for day in calendar.day_pages.iter().rev() {
                if is_day_page_for(day, latest) {
                    return Ok(urls);
                }
                urls.extend(self.race_pages_of_day(day).await.unwrap_or_default());
            }

            match calendar.previous_month {
                Some(href) => calendar_url = absolute_url(&self.db_url, &href),
                None => {
                    warn!("Reached the first calendar month without finding {}", latest);
                    return Ok(urls);
                }
            }
        }
    }
}

/// Race list lines, trimmed, without blanks or duplicates, in file order
fn read_race_list(path: &Path) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read race list {}", path.display()))?;

    let mut seen = HashSet::new();
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter(|line| seen.insert(line.to_string()))
        .map(str::to_string)
        .collect())
}

/// URLs whose page is not stored yet
fn pending_urls(store: &PageStore, kind: PageKind, urls: Vec<String>) -> Vec<String> {
    urls.into_iter()
        .filter(|url| !store.exists(kind, url))
        .collect()
}

/// Log in and download pages, pacing by the dump interval.
/// A page that fails to download is logged and skipped.
async fn dump_pages(
    config: &AppConfig,
    store: &PageStore,
    kind: PageKind,
    urls: &[String],
) -> Result<Vec<PathBuf>> {
    let netkeiba = &config.netkeiba;
    if netkeiba.email.is_empty() || netkeiba.password.is_empty() {
        bail!("netkeiba.email and netkeiba.password must be set to download pages");
    }

    let session = Session::new(&config.crawl.user_agent)?;
    session
        .login(&netkeiba.login_url, &netkeiba.email, &netkeiba.password)
        .await?;

    let limiter = RateLimiter::new(config.crawl.dump_interval_secs, config.crawl.jitter_secs);
    let mut saved = Vec::with_capacity(urls.len());

    for (i, url) in urls.iter().enumerate() {
        limiter.acquire().await;
        info!("[{}/{}] {}", i + 1, urls.len(), url);

        match session.fetch_page(url).await {
            Ok(html) => saved.push(store.save(kind, url, &html)?),
            Err(e) => warn!("Skipping {}: {:#}", url, e),
        }
    }

    Ok(saved)
}

/// Run the collect command
pub async fn run_collect(config: &AppConfig, years: u32) -> Result<()> {
    let race_list = config.path.race_list();
    if let Some(parent) = race_list.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    let mut out = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&race_list)
        .with_context(|| format!("Failed to open race list {}", race_list.display()))?;

    let crawler = Crawler::new(config)?;
    let collected = crawler.collect(years * 12, &mut out).await?;

    info!("Collected {} race URLs into {}", collected, race_list.display());
    Ok(())
}

/// Run the dump command
pub async fn run_dump(config: &AppConfig, kind: PageKind) -> Result<()> {
    let store = PageStore::new(&config.path.data_dir);

    let urls = match kind {
        PageKind::Race => read_race_list(&config.path.race_list())?,
        PageKind::Horse => {
            let repo = RaceRepository::new(&config.path.database())?;
            repo.horse_ids_without_pedigree()?
                .iter()
                .map(|id| horse_ped_url(&config.netkeiba.db_url, id))
                .collect()
        }
    };

    let total = urls.len();
    let pending = pending_urls(&store, kind, urls);
    info!("{} of {} {} pages to download", pending.len(), total, kind.dir_name());

    if pending.is_empty() {
        return Ok(());
    }

    let saved = dump_pages(config, &store, kind, &pending).await?;
    info!("Saved {} pages under {}", saved.len(), store.dir(kind).display());
    Ok(())
}

/// Run the import command
pub async fn run_import(config: &AppConfig, kind: PageKind, force: bool) -> Result<()> {
    let db_path = config.path.database();
    if force && db_path.exists() {
        info!("Removing {}", db_path.display());
        std::fs::remove_file(&db_path)
            .with_context(|| format!("Failed to remove {}", db_path.display()))?;
    }

    let mut repo = RaceRepository::new(&db_path)?;
    let store = PageStore::new(&config.path.data_dir);
    let summary = import_dir(&mut repo, &store.dir(kind), kind)?;

    eprintln!(
        "Imported {} {} pages, {} failed ({} races, {} horses in database)",
        summary.imported,
        kind.dir_name(),
        summary.failed,
        repo.race_count()?,
        repo.horse_count()?
    );
    Ok(())
}

/// Run the sync command
pub async fn run_sync(config: &AppConfig) -> Result<()> {
    let mut repo = RaceRepository::new(&config.path.database())?;
    let latest = repo
        .last_race_date()?
        .context("Nothing to synchronize: you may need to run `import`")?;
    info!("Latest race in database: {}", latest);

    let crawler = Crawler::new(config)?;
    let urls = crawler.collect_since(latest).await?;
    if urls.is_empty() {
        info!("It is up to date");
        return Ok(());
    }

    let store = PageStore::new(&config.path.data_dir);
    let pending = pending_urls(&store, PageKind::Race, urls.clone());
    if !pending.is_empty() {
        dump_pages(config, &store, PageKind::Race, &pending).await?;
    }

    let (mut imported, mut failed) = (0, 0);
    for url in &urls {
        let path = store.path_for(PageKind::Race, url);
        if !path.exists() {
            continue;
        }
        match import_race_file(&mut repo, &path) {
            Ok(()) => imported += 1,
            Err(e) => {
                warn!("Skipping {}: {:#}", path.display(), e);
                failed += 1;
            }
        }
    }

    info!("Synchronized {} races ({} failed)", imported, failed);
    Ok(())
}

/// Run the parse command
pub fn run_parse(file: &Path, kind: PageKind) -> Result<()> {
    let output = parse_page(file, kind)?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn parse_page(file: &Path, kind: PageKind) -> Result<serde_json::Value> {
    let stem = file
        .file_stem()
        .and_then(|s| s.to_str())
        .with_context(|| format!("No file name in {}", file.display()))?;
    let html = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let document = scraper::Html::parse_document(&html);

    let value = match kind {
        PageKind::Race => {
            let race_id: i64 = stem
                .parse()
                .with_context(|| format!("Race id is not numeric: {}", stem))?;
            serde_json::json!({
                "race": RaceInfoParser::build(&document, race_id)?,
                "payoffs": PayoffParser::build(&document, race_id)?,
                "results": RaceResultParser::build(&document, race_id)?,
            })
        }
        PageKind::Horse => serde_json::to_value(PedigreeParser::build(&document, stem)?)?,
    };

    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::tempdir;

    #[test]
    fn test_cli_parses_commands() {
        let cli = Cli::try_parse_from(["keiba-db", "collect"]).unwrap();
        assert!(matches!(cli.command, Commands::Collect { years: 10 }));

        let cli = Cli::try_parse_from(["keiba-db", "import", "--kind", "horse", "--force"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Import { kind: PageKind::Horse, force: true }
        ));

        let cli = Cli::try_parse_from(["keiba-db", "parse", "data/race/1.html"]).unwrap();
        assert!(matches!(cli.command, Commands::Parse { kind: PageKind::Race, .. }));

        assert!(Cli::try_parse_from(["keiba-db", "collect", "--years", "0"]).is_err());
        assert!(Cli::try_parse_from(["keiba-db", "dump", "--kind", "jockey"]).is_err());
    }

    const DB_URL: &str = "https://db.netkeiba.com";

    /// Serves fixed pages; any other URL fails like a 404
    struct FakeSite {
        pages: HashMap<String, String>,
    }

    impl FakeSite {
        fn new(pages: &[(&str, String)]) -> Self {
            Self {
                pages: pages
                    .iter()
                    .map(|(url, html)| (format!("{}{}", DB_URL, url), html.clone()))
                    .collect(),
            }
        }
    }

    impl ListingSource for FakeSite {
        async fn fetch(&self, url: &str) -> Result<String> {
            self.pages
                .get(url)
                .cloned()
                .with_context(|| format!("Request to {} failed, status code is 404", url))
        }
    }

    fn crawler(pages: &[(&str, String)]) -> Crawler<FakeSite> {
        Crawler {
            source: FakeSite::new(pages),
            db_url: DB_URL.to_string(),
        }
    }

    fn calendar(days: &[&str], previous: &str) -> String {
        let links: String = days
            .iter()
            .map(|d| format!(r#"<td><a href="/race/list/{}/">{}</a></td>"#, d, &d[6..]))
            .collect();
        format!(
            r#"<div class="race_calendar"><div class="rev"><a href="{}">前月</a></div><table><tr>{}</tr></table></div>"#,
            previous, links
        )
    }

    fn race_day(race_ids: &[&str]) -> String {
        race_ids
            .iter()
            .map(|id| format!(r#"<dl class="race_top_data_info"><dd><a href="/race/{}/">R</a></dd></dl>"#, id))
            .collect()
    }

    #[tokio::test]
    async fn test_collect_skips_failed_day_pages() {
        let crawler = crawler(&[
            ("/?pid=race_top", calendar(&["20210501", "20210502", "20210508"], "/?pid=race_top&amp;date=202104")),
            ("/race/list/20210501/", race_day(&["202105020101", "202105020102"])),
            ("/race/list/20210508/", race_day(&["202105020301"])),
            ("/?pid=race_top&date=202104", calendar(&["20210403"], "/?pid=race_top&amp;date=202103")),
            ("/race/list/20210403/", race_day(&["202103030101"])),
        ]);

        let mut out = Vec::new();
        let collected = crawler.collect(3, &mut out).await.unwrap();

        // 20210502 fails, and the March calendar is missing, which ends the walk
        assert_eq!(collected, 4);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "https://db.netkeiba.com/race/202105020101/\n\
             https://db.netkeiba.com/race/202105020102/\n\
             https://db.netkeiba.com/race/202105020301/\n\
             https://db.netkeiba.com/race/202103030101/\n"
        );
    }

    #[tokio::test]
    async fn test_collect_since_stops_at_latest_day() {
        let crawler = crawler(&[
            ("/?pid=race_top", calendar(&["20210508", "20210515"], "/?pid=race_top&amp;date=202104")),
            ("/race/list/20210515/", race_day(&["202105020501"])),
            ("/?pid=race_top&date=202104", calendar(&["20210424", "20210425", "20210501"], "/?pid=race_top&amp;date=202103")),
            ("/race/list/20210425/", race_day(&["202104010801"])),
        ]);

        let latest = chrono::NaiveDate::from_ymd_opt(2021, 4, 24).unwrap();
        let urls = crawler.collect_since(latest).await.unwrap();

        // 20210508 and 20210501 fail and are skipped
        assert_eq!(
            urls,
            vec![
                "https://db.netkeiba.com/race/202105020501/",
                "https://db.netkeiba.com/race/202104010801/",
            ]
        );
    }

    #[tokio::test]
    async fn test_collect_since_fails_on_missing_calendar() {
        let crawler = crawler(&[
            ("/?pid=race_top", calendar(&["20210515"], "/?pid=race_top&amp;date=202104")),
            ("/race/list/20210515/", race_day(&["202105020501"])),
        ]);

        let latest = chrono::NaiveDate::from_ymd_opt(2021, 4, 24).unwrap();
        let err = crawler.collect_since(latest).await.unwrap_err();
        assert!(err.to_string().contains("date=202104"));
    }

    #[test]
    fn test_read_race_list() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("race_list.txt");
        std::fs::write(
            &path,
            "https://db.netkeiba.com/race/202105020311/\n\n\
             https://db.netkeiba.com/race/202105020301/ \n\
             https://db.netkeiba.com/race/202105020311/\n",
        )
        .unwrap();

        let urls = read_race_list(&path).unwrap();
        assert_eq!(
            urls,
            vec![
                "https://db.netkeiba.com/race/202105020311/",
                "https://db.netkeiba.com/race/202105020301/",
            ]
        );
    }

    #[test]
    fn test_pending_urls_skips_stored_pages() {
        let dir = tempdir().unwrap();
        let store = PageStore::new(dir.path());
        store
            .save(PageKind::Race, "https://db.netkeiba.com/race/1/", "<html></html>")
            .unwrap();

        let pending = pending_urls(
            &store,
            PageKind::Race,
            vec![
                "https://db.netkeiba.com/race/1/".to_string(),
                "https://db.netkeiba.com/race/2/".to_string(),
            ],
        );
        assert_eq!(pending, vec!["https://db.netkeiba.com/race/2/"]);
    }

    #[test]
    fn test_parse_page_rejects_non_numeric_race_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("latest.html");
        std::fs::write(&path, "<html></html>").unwrap();

        assert!(parse_page(&path, PageKind::Race).is_err());
    }

    #[test]
    fn test_parse_page_reports_missing_anchor() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("202105020311.html");
        std::fs::write(&path, "<html><body></body></html>").unwrap();

        let err = parse_page(&path, PageKind::Race).unwrap_err();
        assert!(err.to_string().contains("dl.racedata"));
    }

    #[tokio::test]
    async fn test_dump_requires_credentials() {
        let dir = tempdir().unwrap();
        let mut config = AppConfig::default();
        config.path.data_dir = dir.path().to_path_buf();
        let store = PageStore::new(dir.path());

        let urls = vec!["https://db.netkeiba.com/race/1/".to_string()];
        let err = dump_pages(&config, &store, PageKind::Race, &urls).await.unwrap_err();
        assert!(err.to_string().contains("netkeiba.email"));
    }
}
