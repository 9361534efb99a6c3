// Product catalog backed by a CSV file

use crate::error::{KioskError, Result};
use serde::Deserialize;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info, warn};

/// Columns every catalog file must carry
const REQUIRED_COLUMNS: [&str; 4] = ["Category", "Title", "Price (INR)", "Description"];

/// One product row; read-only
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CatalogEntry {
    #[serde(rename = "Category")]
    pub category: String,
    #[serde(rename = "Title")]
    pub title: String,
    /// Price in rupees
    #[serde(rename = "Price (INR)")]
    pub price: f64,
    #[serde(rename = "Description")]
    pub description: String,
}

impl CatalogEntry {
    /// Price with the rupee sign, whole prices without decimals
    pub fn display_price(&self) -> String {
        if self.price.fract() == 0.0 {
            format!("₹{}", self.price as i64)
        } else {
            format!("₹{:.2}", self.price)
        }
    }
}

/// The full product table
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
}

impl Catalog {
    /// Wraps already parsed entries
    pub fn new(entries: Vec<CatalogEntry>) -> Self {
        Self { entries }
    }

    /// Reads every row of the CSV file at `path`
    pub fn load(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path).map_err(|e| {
            KioskError::Catalog(format!("Failed to open {}: {e}", path.display()))
        })?;
        let catalog = Self::from_reader(file)?;
        info!(
            "Loaded {} catalog entries from {}",
            catalog.len(),
            path.display()
        );
        Ok(catalog)
    }

    /// Parses CSV with a `Category,Title,Price (INR),Description` header.
    ///
    /// A missing column fails the whole file; a malformed row is logged and
    /// skipped.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = csv_reader.headers()?.clone();
        if let Some(missing) = REQUIRED_COLUMNS
            .iter()
            .find(|column| !headers.iter().any(|h| h == **column))
        {
            return Err(KioskError::Catalog(format!(
                "Missing column {missing:?} in catalog header"
            )));
        }

        let mut entries = Vec::new();
        for (row, record) in csv_reader.deserialize::<CatalogEntry>().enumerate() {
            match record {
                Ok(entry) => entries.push(entry),
                Err(e) => warn!("Skipping catalog row {}: {}", row + 1, e),
            }
        }
        Ok(Self { entries })
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when the file had no usable rows
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries whose category matches `category`, ignoring case and a
    /// plural "s" (detector labels are singular, categories often are not).
    ///
    /// An empty result is a normal outcome, not an error.
    pub fn lookup(&self, category: &str) -> Vec<&CatalogEntry> {
        let wanted = category_key(category);
        let matches: Vec<&CatalogEntry> = self
            .entries
            .iter()
            .filter(|entry| category_key(&entry.category) == wanted)
            .collect();
        debug!("Catalog lookup {:?}: {} matches", category, matches.len());
        matches
    }
}

fn category_key(category: &str) -> String {
    let lower = category.trim().to_lowercase();
    match lower.strip_suffix('s') {
        Some(stem) if !stem.is_empty() => stem.to_string(),
        _ => lower,
    }
}

/// Pictogram for a category or product label
pub fn category_icon(category: &str) -> &'static str {
    let lower = category.to_lowercase();
    let has = |needles: &[&str]| needles.iter().any(|n| lower.contains(n));
    if has(&["book"]) {
        "📚"
    } else if has(&["food", "fruit"]) {
        "🍎"
    } else if has(&["drink", "bottle"]) {
        "🥤"
    } else if has(&["clothing", "shirt"]) {
        "👕"
    } else if has(&["electronic", "phone"]) {
        "📱"
    } else if has(&["chair", "furniture"]) {
        "🪑"
    } else {
        "🛍️"
    }
}
