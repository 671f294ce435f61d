use std::str::FromStr;

use crate::cache::CacheStore;
use crate::parser::{ParseError, parse_menu};
use crate::scraper::{Fetch, FetchError};
use crate::types::{Location, LocationParseError, WeeklyMenu};

#[derive(Debug, thiserror::Error)]
pub enum MenuError {
    #[error("{0}")]
    Configuration(#[from] LocationParseError),
    #[error("Failed to fetch menu. {0}")]
    Fetch(#[from] FetchError),
    #[error("Failed to parse HTML: {0}")]
    Parse(#[from] ParseError),
}

/// Serves weekly menus, going to the network only when the cached page for a
/// location is missing or older than two hours.
#[derive(Debug)]
pub struct MenuService<'a, F> {
    cache: &'a CacheStore,
    fetcher: F,
}

impl<'a, F: Fetch> MenuService<'a, F> {
    pub fn new(cache: &'a CacheStore, fetcher: F) -> Self {
        Self { cache, fetcher }
    }

    pub fn cache(&self) -> &CacheStore {
        self.cache
    }

    /// Resolves `location_key` before touching the cache or the network.
    pub async fn fetch_menu(&self, location_key: &str) -> Result<WeeklyMenu, MenuError> {
        let location = Location::from_str(location_key)
            .inspect_err(|e| log::error!("Configuration error: {}", e))?;
        self.fetch_location(location).await
    }

    pub async fn fetch_location(&self, location: Location) -> Result<WeeklyMenu, MenuError> {
        match self.cache.load(location) {
            Some(entry) if !entry.is_expired => {
                log::info!("Loaded {} menu from cache", location);
                return Ok(parse_menu(location, &entry.raw_html)?);
            }
            Some(entry) => log::info!(
                "Cached {} menu from {} has expired",
                location,
                entry.fetched_at
            ),
            None => log::debug!("No cached {} menu", location),
        }

        log::info!("Fetching {} menu from {}...", location, location.menu_url());
        let html = self.fetcher.fetch_html(location.menu_url()).await?;

        // The page stays cached even if it turns out not to parse.
        if let Err(e) = self.cache.save(location, &html) {
            log::warn!("Failed to cache {} menu: {}", location, e);
        }

        Ok(parse_menu(location, &html)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheEvent;
    use crate::types::WeekDay;

    use chrono::{Duration, Utc};
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    const N58_PAGE: &str = r#"
        <table>
            <tr><th>Dag</th><th>Hovedrett</th><th>Suppe</th></tr>
            <tr><td><a class="dag">Mandag</a></td><td><a class="hovedrett">Fiskesuppe</a></td><td><a class="suppe">Potetsuppe</a></td></tr>
        </table>
    "#;
    const FB38_PAGE: &str = r#"
        <div class="sqs-html-content"><h2>ONSDAG</h2><p>VARMMAT Taco DAGENS SUPPE Løksuppe</p></div>
    "#;

    enum Reply {
        Page(&'static str),
        Empty,
    }

    struct FakeFetcher {
        reply: Reply,
        calls: AtomicUsize,
        urls: Mutex<Vec<String>>,
    }

    impl FakeFetcher {
        fn new(reply: Reply) -> Self {
            Self {
                reply,
                calls: AtomicUsize::new(0),
                urls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl Fetch for &FakeFetcher {
        async fn fetch_html(&self, url: &str) -> Result<String, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.urls.lock().unwrap().push(url.to_string());
            match self.reply {
                Reply::Page(html) => Ok(html.to_string()),
                Reply::Empty => Err(FetchError::EmptyBody(url.to_string())),
            }
        }
    }

    fn create_test_cache() -> (CacheStore, TempDir) {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        (CacheStore::new(temp_dir.path()), temp_dir)
    }

    #[tokio::test]
    async fn test_fresh_cache_skips_network() {
        let (cache, _temp_dir) = create_test_cache();
        cache.save(Location::N58, N58_PAGE).unwrap();
        let fetcher = FakeFetcher::new(Reply::Empty);
        let service = MenuService::new(&cache, &fetcher);

        let menu = service.fetch_menu("N58").await.expect("Cached menu should parse");

        assert_eq!(fetcher.calls(), 0);
        assert_eq!(menu.get(WeekDay::Mandag).unwrap().main_dish, "Fiskesuppe");
    }

    #[tokio::test]
    async fn test_missing_cache_fetches_and_saves() {
        let (cache, _temp_dir) = create_test_cache();
        let mut events = cache.subscribe();
        let fetcher = FakeFetcher::new(Reply::Page(FB38_PAGE));
        let service = MenuService::new(&cache, &fetcher);

        let menu = service.fetch_menu("FB38").await.expect("Fetch should succeed");

        assert_eq!(fetcher.calls(), 1);
        assert_eq!(
            fetcher.urls.lock().unwrap().as_slice(),
            ["https://fb38.squarespace.com/meny"]
        );
        assert_eq!(menu.get(WeekDay::Onsdag).unwrap().soup, "Løksuppe");
        assert_eq!(cache.load(Location::Fb38).unwrap().raw_html, FB38_PAGE);
        assert_eq!(events.try_recv().unwrap(), CacheEvent::Saved(Location::Fb38));

        service.fetch_menu("FB38").await.unwrap();
        assert_eq!(fetcher.calls(), 1, "Second request should hit the cache");
    }

    #[tokio::test]
    async fn test_expired_cache_is_refetched() {
        let (cache, _temp_dir) = create_test_cache();
        cache
            .save_at(Location::N58, "<p>gammel</p>", Utc::now() - Duration::hours(3))
            .unwrap();
        let fetcher = FakeFetcher::new(Reply::Page(N58_PAGE));
        let service = MenuService::new(&cache, &fetcher);

        let menu = service.fetch_menu("N58").await.unwrap();

        assert_eq!(fetcher.calls(), 1);
        assert_eq!(menu.len(), 1);
        let entry = cache.load(Location::N58).unwrap();
        assert_eq!(entry.raw_html, N58_PAGE);
        assert!(!entry.is_expired);
    }

    #[tokio::test]
    async fn test_fetch_failure_leaves_cache_alone() {
        let (cache, _temp_dir) = create_test_cache();
        let stale_at = Utc::now() - Duration::hours(5);
        cache.save_at(Location::N58, N58_PAGE, stale_at).unwrap();
        let fetcher = FakeFetcher::new(Reply::Empty);
        let service = MenuService::new(&cache, &fetcher);

        let result = service.fetch_menu("N58").await;

        assert!(matches!(result, Err(MenuError::Fetch(FetchError::EmptyBody(_)))));
        let entry = cache.load(Location::N58).unwrap();
        assert!(entry.is_expired);
        assert_eq!(entry.fetched_at.timestamp(), stale_at.timestamp());
    }

    #[tokio::test]
    async fn test_parse_failure_keeps_cached_page() {
        let (cache, _temp_dir) = create_test_cache();
        let fetcher = FakeFetcher::new(Reply::Page("Service Unavailable"));
        let service = MenuService::new(&cache, &fetcher);

        let result = service.fetch_menu("FB38").await;

        assert!(matches!(result, Err(MenuError::Parse(ParseError::NoMarkup))));
        assert_eq!(
            cache.load(Location::Fb38).unwrap().raw_html,
            "Service Unavailable"
        );
    }

    #[tokio::test]
    async fn test_unknown_location_fails_before_io() {
        let (cache, _temp_dir) = create_test_cache();
        let fetcher = FakeFetcher::new(Reply::Page(N58_PAGE));
        let service = MenuService::new(&cache, &fetcher);

        let result = service.fetch_menu("fb38").await;

        assert!(matches!(result, Err(MenuError::Configuration(_))));
        assert_eq!(fetcher.calls(), 0);
        assert!(cache.load(Location::Fb38).is_none());
    }

    #[tokio::test]
    async fn test_locations_use_their_own_cache_and_parser() {
        let (cache, _temp_dir) = create_test_cache();
        cache.save(Location::Fb38, FB38_PAGE).unwrap();
        cache.save(Location::N58, N58_PAGE).unwrap();
        let fetcher = FakeFetcher::new(Reply::Empty);
        let service = MenuService::new(&cache, &fetcher);

        let fb38 = service.fetch_menu("FB38").await.unwrap();
        let n58 = service.fetch_menu("N58").await.unwrap();

        assert_eq!(fetcher.calls(), 0);
        assert!(fb38.get(WeekDay::Onsdag).is_some());
        assert!(n58.get(WeekDay::Mandag).is_some());
    }

    #[test]
    fn test_error_messages() {
        let err = MenuError::from(FetchError::EmptyBody("https://drittserver.net/lunsj/".into()));
        assert_eq!(
            err.to_string(),
            "Failed to fetch menu. Received empty response from https://drittserver.net/lunsj/"
        );
        let err = MenuError::from(ParseError::EmptyDocument);
        assert_eq!(err.to_string(), "Failed to parse HTML: Document is empty");
    }
}
