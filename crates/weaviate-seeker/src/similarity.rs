//! Similarity, keyword and question search directives.
//!
//! Each directive validates its input up front and renders to a backend
//! fragment such as `{ concepts: ["x"], distance: 0.55 }`.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{Result, SeekerError};
use crate::value::{format_float, quote, quote_list};

static UUID_SHAPE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$")
        .expect("uuid pattern is valid")
});

/// Anything that can be referenced by id in a near-object search.
pub trait Entity {
    /// Returns the backend id, if the entity has been stored.
    fn entity_id(&self) -> Option<String>;
}

/// Accumulated search directives of one query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Similarity {
    concepts: Vec<String>,
    text_distance: Option<f64>,
    vector: Option<(Vec<f64>, f64)>,
    object: Option<(String, f64)>,
    keyword: Option<Prompt>,
    question: Option<Prompt>,
}

/// Free text plus the attributes it is restricted to.
#[derive(Debug, Clone, PartialEq)]
struct Prompt {
    text: String,
    properties: Vec<String>,
}

impl Prompt {
    fn new(text: &str, properties: &[&str]) -> Result<Self> {
        if text.is_empty() {
            return Err(SeekerError::EmptyPrompt);
        }
        Ok(Prompt {
            text: normalize_quotes(text),
            properties: properties.iter().map(|p| (*p).to_string()).collect(),
        })
    }

    fn render(&self, key: &str) -> String {
        if self.properties.is_empty() {
            format!("{{ {key}: {} }}", quote(&self.text))
        } else {
            format!(
                "{{ {key}: {}, properties: {} }}",
                quote(&self.text),
                quote_list(&self.properties)
            )
        }
    }
}

impl Similarity {
    /// Creates an empty set of directives.
    pub fn new() -> Self {
        Similarity::default()
    }

    /// Adds text concepts. The distance replaces any earlier one.
    pub fn near_text(&mut self, phrases: &[&str], distance: f64) -> Result<()> {
        check_distance(distance)?;
        self.concepts
            .extend(phrases.iter().map(|phrase| normalize_quotes(phrase)));
        self.text_distance = Some(distance);
        Ok(())
    }

    /// Replaces the search vector and its distance.
    pub fn near_vector(&mut self, vector: &[f64], distance: f64) -> Result<()> {
        if let Some(bad) = vector.iter().find(|v| !v.is_finite()) {
            return Err(SeekerError::type_mismatch(format!(
                "invalid vector component {bad}"
            )));
        }
        check_distance(distance)?;
        self.vector = Some((vector.to_vec(), distance));
        Ok(())
    }

    /// Replaces the reference object by id.
    pub fn near_object_id(&mut self, id: &str, distance: f64) -> Result<()> {
        if !UUID_SHAPE.is_match(id) {
            return Err(SeekerError::type_mismatch(format!("invalid uuid '{id}'")));
        }
        check_distance(distance)?;
        self.object = Some((id.to_string(), distance));
        Ok(())
    }

    /// Replaces the reference object by entity.
    pub fn near_object<E: Entity + ?Sized>(&mut self, entity: &E, distance: f64) -> Result<()> {
        let id = entity
            .entity_id()
            .ok_or_else(|| SeekerError::type_mismatch("entity has no id"))?;
        self.near_object_id(&id, distance)
    }

    /// Sets the keyword (BM25) search.
    pub fn bm25(&mut self, text: &str, properties: &[&str]) -> Result<()> {
        self.keyword = Some(Prompt::new(text, properties)?);
        Ok(())
    }

    /// Sets the question for question answering.
    pub fn ask(&mut self, question: &str, properties: &[&str]) -> Result<()> {
        self.question = Some(Prompt::new(question, properties)?);
        Ok(())
    }

    /// Returns `true` if a keyword search is active.
    pub fn has_keyword_search(&self) -> bool {
        self.keyword.is_some()
    }

    /// `{ concepts: [...], distance: d }`, once a concept was added.
    pub fn render_near_text(&self) -> Option<String> {
        if self.concepts.is_empty() {
            return None;
        }
        let distance = self.text_distance?;
        Some(format!(
            "{{ concepts: {}, distance: {} }}",
            quote_list(&self.concepts),
            format_float(distance)
        ))
    }

    /// `{ vector: [...], distance: d }`
    pub fn render_near_vector(&self) -> Option<String> {
        self.vector.as_ref().map(|(vector, distance)| {
            let parts: Vec<String> = vector.iter().map(|v| format_float(*v)).collect();
            format!(
                "{{ vector: [{}], distance: {} }}",
                parts.join(", "),
                format_float(*distance)
            )
        })
    }

    /// `{ id: "...", distance: d }`
    pub fn render_near_object(&self) -> Option<String> {
        self.object.as_ref().map(|(id, distance)| {
            format!("{{ id: {}, distance: {} }}", quote(id), format_float(*distance))
        })
    }

    /// `{ query: "...", properties: [...] }`
    pub fn render_bm25(&self) -> Option<String> {
        self.keyword.as_ref().map(|prompt| prompt.render("query"))
    }

    /// `{ question: "...", properties: [...] }`
    pub fn render_ask(&self) -> Option<String> {
        self.question.as_ref().map(|prompt| prompt.render("question"))
    }
}

fn check_distance(distance: f64) -> Result<()> {
    if distance.is_finite() {
        Ok(())
    } else {
        Err(SeekerError::type_mismatch("Invalid value for distance"))
    }
}

fn normalize_quotes(text: &str) -> String {
    text.replace('"', "'")
}
