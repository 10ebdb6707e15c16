//! Random practice questions

use rand::seq::SliceRandom;
use rand::Rng;

/// Question patterns; `{topic}` is replaced by one of [`TOPICS`]
pub const QUESTION_TEMPLATES: [&str; 5] = [
    "How do I create a {topic} array?",
    "How do I plot {topic} data?",
    "How do I filter a {topic} DataFrame?",
    "How do I compute {topic} statistics?",
    "How do I join {topic} datasets?",
];

pub const TOPICS: [&str; 4] = ["NumPy", "pandas", "matplotlib", "data science"];

const TOPIC_PLACEHOLDER: &str = "{topic}";

/// Pick a template and a topic uniformly at random
pub fn random_question<R: Rng + ?Sized>(rng: &mut R) -> String {
    // both arrays are non-empty
    let template = QUESTION_TEMPLATES.choose(rng).copied().unwrap_or(QUESTION_TEMPLATES[0]);
    let topic = TOPICS.choose(rng).copied().unwrap_or(TOPICS[0]);
    template.replace(TOPIC_PLACEHOLDER, topic)
}
