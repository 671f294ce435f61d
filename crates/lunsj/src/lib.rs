pub mod cache;
pub mod container;
pub mod parser;
pub mod scraper;
pub mod service;
pub mod settings;
pub mod timeline;
pub mod types;
pub mod utils;

pub use container::SharedContainer;
pub use scraper::{FetchError, WebScraper};
pub use service::{MenuError, MenuService};
