// Core data models for the EmotiCart kiosk

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Represents a single video frame with RGB data
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    /// Raw RGB pixel data (width * height * 3 bytes)
    pub data: Vec<u8>,
    /// Frame width in pixels
    pub width: u32,
    /// Frame height in pixels
    pub height: u32,
}

impl Frame {
    /// Creates a new Frame with the given parameters
    pub fn new(data: Vec<u8>, width: u32, height: u32) -> Self {
        Self {
            data,
            width,
            height,
        }
    }

    /// Creates a frame filled with a single colour
    pub fn filled(width: u32, height: u32, rgb: [u8; 3]) -> Self {
        let data = rgb
            .iter()
            .copied()
            .cycle()
            .take(width as usize * height as usize * 3)
            .collect();
        Self::new(data, width, height)
    }

    /// True when the buffer length matches the advertised dimensions
    pub fn is_well_formed(&self) -> bool {
        self.width > 0
            && self.height > 0
            && self.data.len() == self.width as usize * self.height as usize * 3
    }
}

/// Emotion labels the kiosk understands
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Emotion {
    Happy,
    Sad,
    Angry,
    Surprised,
    Neutral,
    Disgust,
    Fear,
    /// Not produced by the bundled classifier; kept for alternate models
    Curious,
}

impl Emotion {
    /// Happy, neutral and curious viewers get their product saved
    pub fn is_positive(self) -> bool {
        matches!(self, Emotion::Happy | Emotion::Neutral | Emotion::Curious)
    }

    /// Pictogram shown next to a suggestion
    pub fn icon(self) -> &'static str {
        match self {
            Emotion::Happy => "😄",
            Emotion::Sad => "😢",
            Emotion::Angry => "😠",
            Emotion::Surprised => "😲",
            Emotion::Neutral => "😐",
            Emotion::Disgust => "🤢",
            Emotion::Fear => "😨",
            Emotion::Curious => "😊",
        }
    }
}

impl fmt::Display for Emotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Emotion::Happy => write!(f, "Happy"),
            Emotion::Sad => write!(f, "Sad"),
            Emotion::Angry => write!(f, "Angry"),
            Emotion::Surprised => write!(f, "Surprised"),
            Emotion::Neutral => write!(f, "Neutral"),
            Emotion::Disgust => write!(f, "Disgust"),
            Emotion::Fear => write!(f, "Fear"),
            Emotion::Curious => write!(f, "Curious"),
        }
    }
}

/// Returned when a label is outside the emotion vocabulary
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown emotion label: {0}")]
pub struct UnknownEmotion(pub String);

impl FromStr for Emotion {
    type Err = UnknownEmotion;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "happy" | "happiness" => Ok(Emotion::Happy),
            "sad" | "sadness" => Ok(Emotion::Sad),
            "angry" | "anger" => Ok(Emotion::Angry),
            "surprise" | "surprised" => Ok(Emotion::Surprised),
            "neutral" => Ok(Emotion::Neutral),
            // Contempt is folded into disgust
            "disgust" | "disgusted" | "contempt" => Ok(Emotion::Disgust),
            "fear" | "scared" => Ok(Emotion::Fear),
            "curious" => Ok(Emotion::Curious),
            other => Err(UnknownEmotion(other.to_string())),
        }
    }
}

/// One tick's combined reading from the perception boundary
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Observation {
    /// Raw detector labels, most salient first
    pub objects: Vec<String>,
    /// Best-guess emotion, `None` when no face was found
    pub emotion: Option<Emotion>,
}

impl Observation {
    /// Creates an observation from raw labels and an optional emotion
    pub fn new(objects: Vec<String>, emotion: Option<Emotion>) -> Self {
        Self { objects, emotion }
    }

    /// Nothing seen this tick
    pub fn empty() -> Self {
        Self::default()
    }
}
