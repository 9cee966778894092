//! Mock autocomplete service.
//!
//! Matches the text just before the cursor against a keyword table for the
//! request's language. A match yields a template with confidence 0.85;
//! anything else yields a comment placeholder with confidence 0.3, which the
//! client's default threshold filters out.

use std::future::Future;

use duet_client::{ServiceError, SuggestionService};
use duet_proto::{AutocompleteRequest, AutocompleteResponse, Language};

/// Confidence reported for a keyword match.
pub const MATCH_CONFIDENCE: f64 = 0.85;

/// Confidence reported when nothing matched.
pub const FALLBACK_CONFIDENCE: f64 = 0.3;

/// Characters before the cursor considered for matching.
const WINDOW: usize = 20;

const PYTHON: &[(&str, &str)] = &[
    ("def ", "def function_name():\n    pass"),
    ("class ", "class ClassName:\n    def __init__(self):\n        pass"),
    ("for ", "for item in iterable:\n    "),
    ("if ", "if condition:\n    "),
    ("import ", "import module_name"),
    ("from ", "from module import name"),
    ("while ", "while condition:\n    "),
    ("try", "try:\n    pass\nexcept Exception as e:\n    pass"),
    ("with ", "with open('file.txt') as f:\n    "),
    ("print", "print()"),
    ("return", "return value"),
];

const JAVASCRIPT: &[(&str, &str)] = &[
    ("function ", "function name() {\n    \n}"),
    ("const ", "const name = value;"),
    ("let ", "let name = value;"),
    ("for ", "for (let i = 0; i < length; i++) {\n    \n}"),
    ("if ", "if (condition) {\n    \n}"),
    ("import ", "import { name } from 'module';"),
    ("export ", "export const name = value;"),
    ("async ", "async function name() {\n    \n}"),
    ("console", "console.log()"),
    ("return", "return value;"),
];

/// Keyword-table suggestion service.
#[derive(Debug, Clone, Copy, Default)]
pub struct PatternSuggester;

impl PatternSuggester {
    /// Create a suggester.
    pub fn new() -> Self {
        Self
    }

    /// Answer `request` synchronously.
    pub fn respond(&self, request: &AutocompleteRequest) -> AutocompleteResponse {
        let cursor = request.cursor_position.min(request.code.chars().count());
        let start = cursor.saturating_sub(WINDOW);
        let recent: String = request
            .code
            .chars()
            .skip(start)
            .take(cursor - start)
            .collect::<String>()
            .to_lowercase();

        let (table, fallback) = match request.language {
            Language::Python => (PYTHON, "# Continue coding..."),
            Language::Javascript | Language::Typescript => (JAVASCRIPT, "// Continue coding..."),
        };

        table
            .iter()
            .find(|(pattern, _)| recent.ends_with(*pattern))
            .map_or_else(
                || AutocompleteResponse {
                    suggestion: fallback.to_string(),
                    confidence: FALLBACK_CONFIDENCE,
                },
                |(_, template)| AutocompleteResponse {
                    suggestion: (*template).to_string(),
                    confidence: MATCH_CONFIDENCE,
                },
            )
    }
}

impl SuggestionService for PatternSuggester {
    fn suggest(
        &self,
        request: AutocompleteRequest,
    ) -> impl Future<Output = Result<AutocompleteResponse, ServiceError>> + Send {
        std::future::ready(Ok(self.respond(&request)))
    }
}
