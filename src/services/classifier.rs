use crate::models::incident::Classification;
use crate::models::organization::CategoryTag;

/// Keyword sets per category. Order fixes the tie-break: lowest index wins.
/// A fixed compile-time table, loaded once rather than read from config.
const KEYWORD_SETS: [(CategoryTag, &[&str]); 3] = [
    (
        CategoryTag::Health,
        &[
            "injury", "injured", "bleeding", "unconscious", "ambulance", "heart attack",
            "stroke", "accident", "medical", "overdose", "breathing", "fever", "pain",
            "fell", "fracture", "burn", "poisoning", "seizure", "pregnant", "chest pain",
        ],
    ),
    (
        CategoryTag::Investigation,
        &[
            "fraud", "missing person", "scam", "forgery", "embezzlement",
            "identity theft", "cybercrime", "corruption", "counterfeit", "extortion",
            "blackmail", "evidence", "suspect", "witness",
        ],
    ),
    (
        CategoryTag::Police,
        &[
            "fight", "assault", "weapon", "gun", "knife", "threat", "violence",
            "domestic", "disturbance", "trespassing", "vandalism", "noise", "drunk",
            "suspicious", "fire", "gang", "kidnap", "riot", "shots fired", "emergency",
            "theft", "stole", "stolen", "robbery", "burglary",
        ],
    ),
];

const FALLBACK_CONFIDENCE_THRESHOLD: u8 = 5;

/// Maps free-text title/description to a responder category by weighted
/// keyword matching. Stateless; the keyword table is loaded once at process
/// start rather than read from a config file.
pub struct Classifier;

impl Classifier {
    pub fn classify(title: &str, description: &str) -> Classification {
        let haystack = format!("{} {}", title, description).to_lowercase();

        let mut best_idx = 0usize;
        let mut best_confidence: u8 = 0;
        let mut best_matches: Vec<String> = Vec::new();

        for (idx, (_, keywords)) in KEYWORD_SETS.iter().enumerate() {
            let mut matched = Vec::new();
            for kw in keywords.iter() {
                if haystack.contains(kw) {
                    matched.push((*kw).to_string());
                }
            }
            let confidence = ((matched.len() as f64 / keywords.len() as f64) * 100.0).round() as u8;
            if confidence > best_confidence {
                best_confidence = confidence;
                best_idx = idx;
                best_matches = matched;
            }
        }

        if best_confidence < FALLBACK_CONFIDENCE_THRESHOLD {
            return Classification {
                category: CategoryTag::Police,
                confidence: 50,
                matched_keywords: vec!["general incident".to_string()],
            };
        }

        Classification {
            category: KEYWORD_SETS[best_idx].0,
            confidence: best_confidence,
            matched_keywords: best_matches,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_medical_emergency_as_health() {
        let result = Classifier::classify(
            "Man collapsed",
            "Unconscious and not breathing, possible heart attack",
        );
        assert_eq!(result.category, CategoryTag::Health);
        assert!(result.confidence >= FALLBACK_CONFIDENCE_THRESHOLD);
    }

    #[test]
    fn classifies_theft_as_police() {
        let result = Classifier::classify("Theft reported", "Someone stole my wallet on the street");
        assert_eq!(result.category, CategoryTag::Police);
        assert!(result.confidence >= FALLBACK_CONFIDENCE_THRESHOLD);
    }

    #[test]
    fn classifies_fraud_as_investigation() {
        let result = Classifier::classify("Fraud case", "Suspect used a counterfeit identity for embezzlement");
        assert_eq!(result.category, CategoryTag::Investigation);
    }

    #[test]
    fn falls_back_to_police_below_threshold() {
        let result = Classifier::classify("hello", "just checking in, nothing urgent");
        assert_eq!(result.category, CategoryTag::Police);
        assert_eq!(result.confidence, 50);
        assert_eq!(result.matched_keywords, vec!["general incident".to_string()]);
    }

    #[test]
    fn is_deterministic() {
        let a = Classifier::classify("Armed robbery", "Man with a gun threatened the clerk");
        let b = Classifier::classify("Armed robbery", "Man with a gun threatened the clerk");
        assert_eq!(a.category, b.category);
        assert_eq!(a.confidence, b.confidence);
        assert_eq!(a.matched_keywords, b.matched_keywords);
    }
}
