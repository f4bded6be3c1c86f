//! Vendor-specific page layouts.

pub mod canada_computers;

pub use canada_computers::CanadaComputersMapper;

/// Where a vendor's listings live on a search results page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VendorProfile {
    /// Short tag written to the ledger, e.g. `canadacomputers`.
    pub tag: &'static str,
    /// Selector that must appear before scrolling starts.
    pub wait_selector: &'static str,
    /// Selector matching one node per listing.
    pub container_selector: &'static str,
}
