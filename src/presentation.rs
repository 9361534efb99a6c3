// View models for the display, computed from session state only

use crate::catalog::{category_icon, Catalog, CatalogEntry};
use crate::error::Result;
use crate::models::Observation;
use crate::perception::product_labels;
use crate::session::{Session, Suggestion};
use tracing::{error, info};

/// Products listed on the status strip
const STRIP_PRODUCTS: usize = 3;

/// Steps of the "How It Works" panel
pub const INSTRUCTIONS: [&str; 4] = [
    "Start the camera.",
    "We detect your emotions and the product you are viewing.",
    "If you're in a positive mood (happy, neutral, or curious), we save that product.",
    "Then you can choose to explore more about it.",
];

/// Shown in place of the feed while the camera is off
pub const CAMERA_OFF_HINT: &str =
    "📸 Camera is currently off. Press the Start Camera button to begin!";

/// Shown after the viewer declines
pub const DECLINE_MESSAGE: &str =
    "If you need help or when your mood becomes better, feel free to reach out!";

/// The suggestion block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuggestionCard {
    pub title: String,
    pub lines: Vec<String>,
}

/// Card for the suggestion currently on screen
pub fn suggestion_card(suggestion: &Suggestion) -> SuggestionCard {
    match suggestion {
        Suggestion::Ready => SuggestionCard {
            title: "🔮 Ready to Help!".to_string(),
            lines: vec![
                "We'll show personalized product suggestions based on your emotions \
                 when the camera is turned on."
                    .to_string(),
            ],
        },
        Suggestion::Analyzing => SuggestionCard {
            title: "🔍 Analyzing...".to_string(),
            lines: vec!["Looking for products and analyzing your emotions.".to_string()],
        },
        Suggestion::Recommend { emotion, product } => SuggestionCard {
            title: format!(
                "{} Smart Suggestion {}",
                emotion.icon(),
                category_icon(product)
            ),
            lines: vec![
                format!("You seem {emotion}!"),
                format!("We recommend exploring more {product} options!"),
                "✨ Perfect match for your current mood! ✨".to_string(),
            ],
        },
    }
}

/// The yes/no follow-up question
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExplorationPrompt {
    pub heading: String,
    pub question: String,
    pub yes_label: String,
    pub no_label: String,
}

/// Prompt to show, if the session is waiting for an answer
pub fn exploration_prompt(session: &Session) -> Option<ExplorationPrompt> {
    if !session.awaiting_answer() {
        return None;
    }
    let product = session.saved_positive_product()?;
    Some(ExplorationPrompt {
        heading: "🌟 Product Recommendation".to_string(),
        question: format!(
            "You seemed to be in a positive mood regarding {product}. \
             Would you like to explore more about the latest {product}?"
        ),
        yes_label: "✅ Yes, Show Me!".to_string(),
        no_label: "❌ No, Thanks".to_string(),
    })
}

/// Text of the strip drawn under the camera image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusStrip {
    pub emotion: String,
    pub products: String,
}

/// Strip text for one tick's observation
pub fn status_strip(observation: &Observation) -> StatusStrip {
    let emotion = observation
        .emotion
        .map(|e| e.to_string())
        .unwrap_or_else(|| "Scanning...".to_string());
    let products = product_labels(&observation.objects);
    let products = if products.is_empty() {
        "No products".to_string()
    } else {
        products
            .into_iter()
            .take(STRIP_PRODUCTS)
            .collect::<Vec<_>>()
            .join(", ")
    };
    StatusStrip {
        emotion: format!("Emotion: {emotion}"),
        products: format!("Products: {products}"),
    }
}

/// One catalog entry, ready to lay out
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductCard {
    pub icon: &'static str,
    pub title: String,
    pub price: String,
    pub description: String,
}

impl ProductCard {
    fn from_entry(category: &str, entry: &CatalogEntry) -> Self {
        Self {
            icon: category_icon(category),
            title: entry.title.clone(),
            price: entry.display_price(),
            description: entry.description.clone(),
        }
    }
}

/// What to show once the camera has stopped
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Nothing resolved
    Nothing,
    Details {
        header: String,
        products: Vec<ProductCard>,
    },
    NoProducts(String),
    Declined(String),
    /// The catalog could not be read
    CatalogUnavailable(String),
}

/// Computes the terminal display for a stopped session.
///
/// `load_catalog` runs only when the viewer asked for details.
pub fn outcome<F>(session: &Session, load_catalog: F) -> Outcome
where
    F: FnOnce() -> Result<Catalog>,
{
    if session.camera_active() {
        return Outcome::Nothing;
    }

    if session.wants_details() {
        let Some(category) = session.saved_positive_product() else {
            return Outcome::Nothing;
        };
        let catalog = match load_catalog() {
            Ok(catalog) => catalog,
            Err(e) => {
                error!("Catalog unavailable: {}", e);
                return Outcome::CatalogUnavailable(format!(
                    "Product details are unavailable: {e}"
                ));
            }
        };
        let matches = catalog.lookup(category);
        info!("Showing {} products for {}", matches.len(), category);
        if matches.is_empty() {
            return Outcome::NoProducts(format!(
                "No products found in the category: {category}"
            ));
        }
        Outcome::Details {
            header: format!("🏷️ Products in Category: {}", title_case(category)),
            products: matches
                .into_iter()
                .map(|entry| ProductCard::from_entry(category, entry))
                .collect(),
        }
    } else if session.declined_details() {
        Outcome::Declined(DECLINE_MESSAGE.to_string())
    } else {
        Outcome::Nothing
    }
}

/// Capitalises the first letter of every word
pub fn title_case(text: &str) -> String {
    text.split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
