//! Casual-query detection: greetings, thanks, and small talk that need no
//! retrieval. A match short-circuits the whole pipeline and returns a canned
//! response directly, purely as a latency/cost optimization.
//!
//! Every pattern is anchored at both ends so a technical question that
//! merely contains a greeting word ("how does authentication work") never
//! matches. When in doubt the rules stay silent and retrieval runs.

use regex::Regex;

/// Ordered (pattern, response) rules, first match wins.
pub struct CasualResponder {
    rules: Vec<(Regex, String)>,
}

impl CasualResponder {
    /// Build from raw rules. Invalid patterns are a programmer error.
    pub fn new(rules: &[(&str, &str)]) -> Self {
        let rules = rules
            .iter()
            .map(|(pattern, response)| {
                let re = Regex::new(&format!("(?i)^{pattern}[!?,.\\s]*$"))
                    .unwrap_or_else(|e| panic!("invalid casual pattern {pattern:?}: {e}"));
                (re, response.to_string())
            })
            .collect();
        Self { rules }
    }

    pub fn default_rules() -> Self {
        Self::new(&[
            (
                r"(hi+|hey+|hello+|howdy|hiya|yo)( there| everyone| all)?",
                "Hello! I'm the documentation assistant. Ask me anything about the codebase.",
            ),
            (
                r"how are (you|u)",
                "Doing well, thanks! Ready to help you navigate the documentation. What would you like to know?",
            ),
            (
                r"(good\s)?(morning|afternoon|evening|night)",
                "Hello! Ready to help with any documentation questions.",
            ),
            (
                r"(thanks?|thank you|thx|ty)( (so|very) much)?( a lot)?",
                "You're welcome! Let me know if you have more questions.",
            ),
            (
                r"(bye|goodbye|see you|later|cya|take care)",
                "Goodbye! Come back anytime you need help with the docs.",
            ),
            (
                r"(ok|okay|sure|got it|alright|cool|great|nice|awesome|perfect)",
                "Glad to help! Anything else you'd like to look up?",
            ),
            (
                r"who are you",
                "I'm a documentation assistant with access to the generated docs for the \
                 backend, frontend, and CMS codebases. Ask me about any file, API, or concept.",
            ),
            (
                r"(what can you do|help)",
                "I can search the documentation and answer questions about the backend \
                 (PHP/Symfony), frontend (Vue/Nuxt), and CMS. Try asking about a specific \
                 file, endpoint, or feature.",
            ),
        ])
    }

    /// The canned response for a casual query, or None when the query looks
    /// informational and should go through retrieval.
    pub fn respond(&self, query: &str) -> Option<&str> {
        let trimmed = query.trim();
        if trimmed.is_empty() {
            return None;
        }
        self.rules
            .iter()
            .find(|(re, _)| re.is_match(trimmed))
            .map(|(_, response)| response.as_str())
    }

    pub fn is_casual(&self, query: &str) -> bool {
        self.respond(query).is_some()
    }
}
