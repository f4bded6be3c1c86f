pub mod browser;
pub mod error;
pub mod extract;
pub mod sync;
pub mod vendors;

pub use browser::{BrowserPage, BrowserSession, ChromiumBrowser, ChromiumLaunchOptions};
pub use error::ScraperError;
pub use extract::{Extractor, ItemMapper};
pub use sync::{
    PageSynchronizer, ResponseTimeoutSettle, SettleObservation, SettleStrategy, SyncOptions,
    SyncOutcome, SyncState,
};
pub use vendors::{CanadaComputersMapper, VendorProfile};
