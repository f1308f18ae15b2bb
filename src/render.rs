//! HTML page rendering

use crate::types::prediction::PageMessage;
use anyhow::{Context, Result};
use minijinja::{context, Environment};

const INDEX_TEMPLATE: &str = "index.html";

/// Renders the input form page with an optional result line.
pub struct PageRenderer {
    env: Environment<'static>,
}

impl PageRenderer {
    pub fn new() -> Result<Self> {
        let mut env = Environment::new();
        // `.html` names get HTML auto-escaping
        env.add_template(INDEX_TEMPLATE, include_str!("../templates/index.html"))
            .context("Failed to compile page template")?;
        Ok(Self { env })
    }

    /// Render the form, followed by `message` when there is one.
    ///
    /// The fixed result sentence lives in the template, so only the label or
    /// message text goes through the escaper.
    pub fn render_index(&self, message: Option<&PageMessage>) -> Result<String> {
        let (label, message) = match message {
            Some(PageMessage::Prediction(label)) => (Some(label.as_str()), None),
            Some(other) => (None, Some(other.text())),
            None => (None, None),
        };

        self.env
            .get_template(INDEX_TEMPLATE)?
            .render(context! { label, message })
            .context("Failed to render page")
    }
}
