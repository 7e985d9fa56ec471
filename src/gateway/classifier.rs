//! Decides whether a request method needs a proof.

use std::collections::HashSet;

use axum::http::Method;

/// Case-insensitive membership test against the configured protected methods.
#[derive(Debug, Clone, Default)]
pub struct MethodClassifier {
    protected: HashSet<String>,
}

impl MethodClassifier {
    pub fn new<I, S>(methods: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            protected: methods
                .into_iter()
                .map(|m| m.as_ref().trim().to_ascii_uppercase())
                .filter(|m| !m.is_empty())
                .collect(),
        }
    }

    pub fn requires_proof(&self, method: &Method) -> bool {
        self.protected.contains(&method.as_str().to_ascii_uppercase())
    }

    pub fn is_empty(&self) -> bool {
        self.protected.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protected_methods() {
        let classifier = MethodClassifier::new(["POST", "delete"]);
        assert!(classifier.requires_proof(&Method::POST));
        assert!(classifier.requires_proof(&Method::DELETE));
        assert!(!classifier.requires_proof(&Method::GET));
        assert!(!classifier.requires_proof(&Method::OPTIONS));
    }

    #[test]
    fn test_case_insensitive_extension_method() {
        let classifier = MethodClassifier::new(["POST"]);
        let lower = Method::from_bytes(b"post").unwrap();
        assert!(classifier.requires_proof(&lower));
    }

    #[test]
    fn test_empty_set_protects_nothing() {
        let classifier = MethodClassifier::new(Vec::<String>::new());
        assert!(classifier.is_empty());
        assert!(!classifier.requires_proof(&Method::POST));
    }
}
