use regex::Regex;
use scraper::Html;
use serde_json::Value;

/// Decides where paragraph breaks go in description text that lost its
/// markup.
pub trait ParagraphSplitter {
    fn split(&self, text: &str) -> String;
}

/// Breaks wherever a lowercase ASCII letter runs straight into an uppercase
/// one, e.g. `"kitchenLiving room"` becomes `"kitchen\nLiving room"`.
///
/// This also splits genuine camel-case words such as `"McDonald"`.
#[derive(Debug, Clone)]
pub struct CaseBoundarySplitter {
    boundary: Regex,
}

impl CaseBoundarySplitter {
    pub fn new() -> Self {
        Self {
            // Matches never overlap: the second letter of a match is
            // uppercase and so cannot begin another one.
            boundary: Regex::new(r"([a-z])([A-Z])").expect("static regex is valid"),
        }
    }
}

impl Default for CaseBoundarySplitter {
    fn default() -> Self {
        Self::new()
    }
}

impl ParagraphSplitter for CaseBoundarySplitter {
    fn split(&self, text: &str) -> String {
        self.boundary.replace_all(text, "$1\n$2").into_owned()
    }
}

/// Plain-text version of a listing's HTML `description`, or `""` when the
/// listing has none.
pub fn clean_description<S: ParagraphSplitter + ?Sized>(property: &Value, splitter: &S) -> String {
    let markup = match property.get("description") {
        Some(Value::String(markup)) => markup,
        _ => return String::new(),
    };

    let text = strip_markup(markup)
        .replace("\u{a0}15", "")
        .replace('\u{a0}', "");

    splitter.split(&text)
}

fn strip_markup(markup: &str) -> String {
    Html::parse_fragment(markup)
        .root_element()
        .text()
        .collect::<String>()
}
