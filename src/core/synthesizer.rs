//! Template substitution for generated test modules.
//!
//! Placeholders are spliced at their positions in the template, so the
//! substituted text is never searched again. A placeholder token that
//! happens to occur inside the header or implementation text is copied
//! through unchanged.

use crate::domain::model::Declaration;
use crate::utils::error::{Result, ScaffoldError};
use std::collections::HashSet;

pub const HEADER_PLACEHOLDER: &str = "__HEADER_DEFINITIONS__";
pub const IMPLEMENTATION_PLACEHOLDER: &str = "__FUNCTIONS_IMPLEMENTATION__";

/// The cffi test harness shipped with the tool.
pub const BUNDLED_TEMPLATE: &str = include_str!("../../templates/test_template.py");

/// A template whose two placeholders are known to occur exactly once.
#[derive(Debug, Clone)]
pub struct TemplateDocument {
    text: String,
    header_at: usize,
    implementation_at: usize,
}

impl TemplateDocument {
    pub fn parse(text: impl Into<String>) -> Result<Self> {
        let text = text.into();
        let header_at = single_occurrence(&text, HEADER_PLACEHOLDER)?;
        let implementation_at = single_occurrence(&text, IMPLEMENTATION_PLACEHOLDER)?;

        Ok(Self {
            text,
            header_at,
            implementation_at,
        })
    }

    pub fn bundled() -> Result<Self> {
        Self::parse(BUNDLED_TEMPLATE)
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn render(&self, header_definitions: &str, implementation: &str) -> String {
        let mut spots = [
            (self.header_at, HEADER_PLACEHOLDER.len(), header_definitions),
            (
                self.implementation_at,
                IMPLEMENTATION_PLACEHOLDER.len(),
                implementation,
            ),
        ];
        spots.sort_by_key(|(at, _, _)| *at);

        let mut out = String::with_capacity(
            self.text.len() + header_definitions.len() + implementation.len(),
        );
        let mut cursor = 0;
        for (at, len, replacement) in spots {
            out.push_str(&self.text[cursor..at]);
            out.push_str(replacement);
            cursor = at + len;
        }
        out.push_str(&self.text[cursor..]);
        out
    }
}

fn single_occurrence(text: &str, placeholder: &str) -> Result<usize> {
    let positions: Vec<usize> = text.match_indices(placeholder).map(|(at, _)| at).collect();
    match positions.as_slice() {
        [at] => Ok(*at),
        _ => Err(ScaffoldError::TemplateError {
            placeholder: placeholder.to_string(),
            occurrences: positions.len(),
        }),
    }
}

/// Declarations one per line in first-appearance order, dropping byte-identical repeats.
pub fn header_definitions(declarations: &[Declaration]) -> String {
    let mut ordered: Vec<&Declaration> = declarations.iter().collect();
    ordered.sort_by_key(|d| d.order);

    let mut seen = HashSet::new();
    ordered
        .into_iter()
        .filter(|d| seen.insert(d.text.as_str()))
        .map(|d| d.text.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn synthesize(
    template_text: &str,
    header_declarations: &[Declaration],
    implementation_text: &str,
) -> Result<String> {
    let template = TemplateDocument::parse(template_text)?;
    let module = template.render(
        &header_definitions(header_declarations),
        implementation_text,
    );

    tracing::debug!(
        "Synthesized test module: {} declarations, {} bytes",
        header_declarations.len(),
        module.len()
    );
    Ok(module)
}
