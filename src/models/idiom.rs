use serde::Serialize;

pub const DEFAULT_EXAMPLE: &str = "Example usage not available.";

/// A figure of speech in the phrase collection
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Idiom {
    pub idiom: String,
    pub definition: String,
    pub synonyms: Vec<String>,
    #[serde(serialize_with = "serialize_example")]
    pub example: Option<String>,
    /// Uniform value in [0, 1) used to pick random entries
    #[serde(skip)]
    pub randomizer_id: f64,
}

impl Idiom {
    /// Builds an entry the way the collection stores them: lowercased phrase,
    /// trimmed non-empty synonyms and a fresh randomizer value.
    pub fn new(idiom: &str, definition: &str, synonyms: &[&str]) -> Self {
        Self {
            idiom: idiom.trim().to_lowercase(),
            definition: definition.trim().to_string(),
            synonyms: synonyms
                .iter()
                .map(|s| s.trim())
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
            example: None,
            randomizer_id: rand::random::<f64>(),
        }
    }

    pub fn with_example(mut self, example: &str) -> Self {
        self.example = Some(example.to_string());
        self
    }
}

fn serialize_example<S>(example: &Option<String>, ser: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    ser.serialize_str(example.as_deref().unwrap_or(DEFAULT_EXAMPLE))
}
