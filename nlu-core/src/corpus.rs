//! # Built-in demo dataset
//!
//! A small annotated travel-assistant dataset plus matching synonym pairs,
//! used by the demo server and the integration tests. Annotations are built
//! by locating each entity surface in its sentence, so the character offsets
//! stay consistent with the span aligner's arithmetic.

use crate::bio::Annotation;
use crate::pipeline::TrainingExample;
use crate::synonyms::SynonymTable;

/// Build one example, deriving character offsets from the entity surfaces.
/// Surfaces must occur in the text; this is static demo data, checked once
/// at startup.
fn example(text: &str, entities: &[(&str, &str)]) -> TrainingExample {
    let entities = entities
        .iter()
        .map(|(name, surface)| {
            let byte = text
                .find(surface)
                .unwrap_or_else(|| panic!("demo surface {surface:?} not in {text:?}"));
            let begin = text[..byte].chars().count();
            Annotation::new(*name, begin, begin + surface.chars().count())
        })
        .collect();
    TrainingExample::new(text, entities)
}

/// Annotated travel-domain training examples.
pub fn demo_training_data() -> Vec<TrainingExample> {
    vec![
        example(
            "book a flight to paris tomorrow",
            &[("city", "paris"), ("date", "tomorrow")],
        ),
        example("fly me to london please", &[("city", "london")]),
        example(
            "i need a ticket to new york on friday",
            &[("city", "new york"), ("date", "friday")],
        ),
        example("show flights to berlin", &[("city", "berlin")]),
        example(
            "book delta to boston",
            &[("airline", "delta"), ("city", "boston")],
        ),
        example(
            "reserve a seat to tokyo next week",
            &[("city", "tokyo"), ("date", "next week")],
        ),
        example("fly me to nyc on monday", &[("city", "nyc"), ("date", "monday")]),
        example("i want to cancel my booking", &[]),
        example("what time is my flight", &[]),
    ]
}

/// Synonym pairs matching the demo dataset.
pub fn demo_synonyms() -> SynonymTable {
    SynonymTable::from_pairs([
        ("nyc", "New York City"),
        ("new york", "New York City"),
        ("sf", "San Francisco"),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotator::{Annotator, HeuristicAnnotator};
    use crate::bio;

    #[test]
    fn test_demo_annotations_all_align() {
        for example in demo_training_data() {
            let tokens = HeuristicAnnotator.annotate(&example.text);
            let encoded = bio::encode(&example.text, &tokens, &example.entities);
            assert!(
                encoded.skipped.is_empty(),
                "unresolvable demo annotation in {:?}",
                example.text
            );
        }
    }

    #[test]
    fn test_demo_labels_cover_surfaces() {
        let examples = demo_training_data();
        let tokens = HeuristicAnnotator.annotate(&examples[0].text);
        let encoded = bio::encode(&examples[0].text, &tokens, &examples[0].entities);
        assert_eq!(encoded.tokens[4].label, "B-city");
        assert_eq!(encoded.tokens[5].label, "B-date");
    }
}
