use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;
use tracing::debug;

use super::text::clean;
use crate::parser::locate::has_type;

/// Candidate numbered marker inside a line: `1. `, `12) `.
static STEP_MARKER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{1,2})[.)]\s").unwrap());
/// `N. ` / `N) ` or `Step N:` at the start of a plain-string step.
static LEADING_MARKER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(?:step\s*\d{1,3}(?:[.)](?:\s+|$)|:\s*)|\d{1,3}[.)](?:\s+|$))").unwrap()
});

const STEP_TYPES: &[&str] = &["HowToStep", "HowToDirection", "HowToTip"];

/// Every accepted shape of `recipeInstructions`.
#[derive(Debug, PartialEq)]
pub enum InstructionsShape<'a> {
    Absent,
    /// One block of text holding all steps.
    Text(&'a str),
    Strings(Vec<&'a str>),
    Steps(Vec<Step<'a>>),
    Sections(Vec<Section<'a>>),
    Mixed(Vec<InstructionItem<'a>>),
    Unrecognized,
}

#[derive(Debug, PartialEq)]
pub enum InstructionItem<'a> {
    Text(&'a str),
    Step(Step<'a>),
    Section(Section<'a>),
    Unrecognized,
}

#[derive(Debug, PartialEq)]
pub struct Step<'a> {
    pub text: &'a str,
}

#[derive(Debug, PartialEq)]
pub struct Section<'a> {
    pub name: Option<&'a str>,
    pub items: Vec<InstructionItem<'a>>,
}

// ── Classification ──

pub fn classify(value: Option<&Value>) -> InstructionsShape<'_> {
    match value {
        None | Some(Value::Null) => InstructionsShape::Absent,
        Some(Value::String(s)) => InstructionsShape::Text(s),
        Some(Value::Array(arr)) => classify_list(classify_items(arr)),
        Some(obj @ Value::Object(_)) => classify_list(classify_items(std::slice::from_ref(obj))),
        Some(_) => InstructionsShape::Unrecognized,
    }
}

fn classify_list(items: Vec<InstructionItem<'_>>) -> InstructionsShape<'_> {
    if items.iter().all(|i| matches!(i, InstructionItem::Text(_))) {
        return InstructionsShape::Strings(
            items
                .into_iter()
                .filter_map(|i| match i {
                    InstructionItem::Text(s) => Some(s),
                    _ => None,
                })
                .collect(),
        );
    }
    if items.iter().all(|i| matches!(i, InstructionItem::Step(_))) {
        return InstructionsShape::Steps(
            items
                .into_iter()
                .filter_map(|i| match i {
                    InstructionItem::Step(s) => Some(s),
                    _ => None,
                })
                .collect(),
        );
    }
    if items.iter().all(|i| matches!(i, InstructionItem::Section(_))) {
        return InstructionsShape::Sections(
            items
                .into_iter()
                .filter_map(|i| match i {
                    InstructionItem::Section(s) => Some(s),
                    _ => None,
                })
                .collect(),
        );
    }
    InstructionsShape::Mixed(items)
}

/// Classify list entries; nested lists are flattened in place.
fn classify_items(values: &[Value]) -> Vec<InstructionItem<'_>> {
    let mut items = Vec::with_capacity(values.len());
    for v in values {
        match v {
            Value::Array(inner) => items.extend(classify_items(inner)),
            other => items.push(classify_item(other)),
        }
    }
    items
}

fn classify_item(value: &Value) -> InstructionItem<'_> {
    let Value::Object(obj) = value else {
        return match value {
            Value::String(s) => InstructionItem::Text(s),
            _ => InstructionItem::Unrecognized,
        };
    };

    let tag = obj.get("@type");
    let text = ["text", "name"].iter().find_map(|k| {
        obj.get(*k)
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
    });
    let children = obj.get("itemListElement");

    let is_section = tag.is_some_and(|t| has_type(t, "HowToSection"));
    let is_step = tag.is_some_and(|t| STEP_TYPES.iter().any(|st| has_type(t, st)));

    if is_section || (!is_step && obj.get("text").is_none() && children.is_some()) {
        let items = match children {
            Some(Value::Array(arr)) => classify_items(arr),
            Some(other @ Value::Object(_)) => vec![classify_item(other)],
            Some(Value::String(s)) => vec![InstructionItem::Text(s)],
            _ => Vec::new(),
        };
        return InstructionItem::Section(Section {
            name: obj.get("name").and_then(Value::as_str),
            items,
        });
    }

    match text {
        Some(t) => InstructionItem::Step(Step { text: t }),
        None => {
            debug!("Skipping instruction entry without text: {}", value);
            InstructionItem::Unrecognized
        }
    }
}

// ── Normalization ──

/// Flat, ordered, decoded instruction strings from any accepted shape.
pub fn normalize_instructions(value: Option<&Value>) -> Vec<String> {
    let mut out = Vec::new();
    match classify(value) {
        InstructionsShape::Absent | InstructionsShape::Unrecognized => {}
        InstructionsShape::Text(s) => out.extend(split_text(s)),
        InstructionsShape::Strings(list) => out.extend(list.into_iter().filter_map(clean_step)),
        InstructionsShape::Steps(steps) => {
            out.extend(steps.into_iter().filter_map(|s| clean(s.text)))
        }
        InstructionsShape::Sections(sections) => {
            for section in sections {
                flatten_section(section, &mut out);
            }
        }
        InstructionsShape::Mixed(items) => {
            for item in items {
                flatten_item(item, &mut out);
            }
        }
    }
    out
}

/// Section labels are dropped; only the steps are kept, depth-first.
fn flatten_section(section: Section<'_>, out: &mut Vec<String>) {
    for item in section.items {
        flatten_item(item, out);
    }
}

fn flatten_item(item: InstructionItem<'_>, out: &mut Vec<String>) {
    match item {
        InstructionItem::Text(s) => out.extend(clean_step(s)),
        InstructionItem::Step(step) => out.extend(clean(step.text)),
        InstructionItem::Section(section) => flatten_section(section, out),
        InstructionItem::Unrecognized => {}
    }
}

/// Split a single block of text on line breaks and numbered markers.
fn split_text(text: &str) -> Vec<String> {
    let decoded = super::text::decode(text);
    let mut steps = Vec::new();

    for line in decoded.lines() {
        let mut start = 0;
        let mut next_number = None;
        for caps in STEP_MARKER_RE.captures_iter(line) {
            let (Some(marker), Some(num)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            let Ok(n) = num.as_str().parse::<u32>() else {
                continue;
            };
            if !starts_step(line, marker.start(), n, next_number) {
                continue;
            }
            if marker.start() > start {
                steps.extend(strip_marker(&line[start..marker.start()]));
            }
            start = marker.start();
            next_number = Some(n + 1);
        }
        steps.extend(strip_marker(&line[start..]));
    }

    steps
}

/// A marker opens a step at line start, after sentence punctuation, or when
/// it continues the running sequence (`1. Mix 2. Bake`).
fn starts_step(line: &str, at: usize, n: u32, next_number: Option<u32>) -> bool {
    let before = &line[..at];
    if before.chars().next_back().is_some_and(|c| !c.is_whitespace()) {
        return false;
    }
    match before.trim_end().chars().next_back() {
        None => true,
        Some(c) if ".!?;:)".contains(c) => true,
        Some(_) => next_number == Some(n),
    }
}

/// Plain-string entries may carry their own numbering.
fn clean_step(s: &str) -> Option<String> {
    strip_marker(&clean(s)?)
}

fn strip_marker(s: &str) -> Option<String> {
    let stripped = LEADING_MARKER_RE.replace(s, "");
    let trimmed = stripped.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn norm(v: Value) -> Vec<String> {
        normalize_instructions(Some(&v))
    }

    #[test]
    fn string_list() {
        assert_eq!(norm(json!(["Step 1", "Step 2"])), vec!["Step 1", "Step 2"]);
    }

    #[test]
    fn step_objects() {
        assert_eq!(norm(json!([{"text": "Mix"}])), vec!["Mix"]);
        assert_eq!(
            norm(json!([
                {"@type": "HowToStep", "text": "Preheat &amp; grease."},
                {"@type": "HowToStep", "name": "Bake"},
            ])),
            vec!["Preheat & grease.", "Bake"]
        );
    }

    #[test]
    fn plain_string_newlines() {
        let steps = norm(json!("Mix the flour and water.\nBake for 20 minutes."));
        assert_eq!(steps, vec!["Mix the flour and water.", "Bake for 20 minutes."]);
    }

    #[test]
    fn plain_string_numbered_markers() {
        let steps = norm(json!("1. Mix the batter. 2. Pour into a pan. 3. Bake at 350 degrees."));
        assert_eq!(
            steps,
            vec!["Mix the batter.", "Pour into a pan.", "Bake at 350 degrees."]
        );
    }

    #[test]
    fn numbers_mid_sentence_are_not_markers() {
        let steps = norm(json!("Bake at 350. Then cool."));
        assert_eq!(steps, vec!["Bake at 350. Then cool."]);
        let steps = norm(json!("Heat to 20. Stir well."));
        assert_eq!(steps, vec!["Heat to 20. Stir well."]);
    }

    #[test]
    fn ratios_and_step_text_keep_their_numbers() {
        assert_eq!(
            norm(json!(["1:1 ratio of sugar to water makes syrup."])),
            vec!["1:1 ratio of sugar to water makes syrup."]
        );
        assert_eq!(
            norm(json!([{"@type": "HowToStep", "text": "2: 1 cup milk, warmed"}])),
            vec!["2: 1 cup milk, warmed"]
        );
        assert_eq!(
            norm(json!([{"@type": "HowToStep", "text": "3. Fold gently."}])),
            vec!["3. Fold gently."]
        );
    }

    #[test]
    fn run_on_numbered_list_splits() {
        assert_eq!(
            norm(json!("1. Mix the flour 2. Bake the bread")),
            vec!["Mix the flour", "Bake the bread"]
        );
        assert_eq!(
            norm(json!("1) Soak beans overnight 2) Drain 3) Simmer 2 hours")),
            vec!["Soak beans overnight", "Drain", "Simmer 2 hours"]
        );
        // Out-of-sequence numbers inside a step stay put.
        assert_eq!(
            norm(json!("1. Bake for 5 minutes 4. Rest")),
            vec!["Bake for 5 minutes 4. Rest"]
        );
    }

    #[test]
    fn decimals_keep_their_digits() {
        assert_eq!(norm(json!(["2.5 hours later, stir."])), vec!["2.5 hours later, stir."]);
    }

    #[test]
    fn string_items_lose_numbering() {
        assert_eq!(norm(json!(["1. Chop", "2) Fry", "Step 3: Serve"])), vec!["Chop", "Fry", "Serve"]);
    }

    #[test]
    fn sections_flatten_in_order() {
        let v = json!([
            {
                "@type": "HowToSection",
                "name": "For the dough",
                "itemListElement": [
                    {"@type": "HowToStep", "text": "Knead."},
                    {"@type": "HowToStep", "text": "Rest."},
                ]
            },
            {
                "@type": "HowToSection",
                "name": "To finish",
                "itemListElement": [
                    {
                        "@type": "HowToSection",
                        "name": "Nested",
                        "itemListElement": [{"@type": "HowToStep", "text": "Shape."}]
                    },
                    {"@type": "HowToStep", "text": "Bake."},
                ]
            }
        ]);
        assert_eq!(norm(v), vec!["Knead.", "Rest.", "Shape.", "Bake."]);
    }

    #[test]
    fn untyped_section_with_item_list() {
        let v = json!([{"name": "Sauce", "itemListElement": ["Simmer.", "Season."]}]);
        assert_eq!(norm(v), vec!["Simmer.", "Season."]);
    }

    #[test]
    fn mixed_list() {
        let v = json!([
            "Gather ingredients.",
            {"@type": "HowToStep", "text": "Whisk."},
            {"@type": "HowToSection", "itemListElement": [{"text": "Fold."}]},
            42,
            {"@type": "HowToStep"},
            ["Nested string."],
        ]);
        assert_eq!(
            norm(v),
            vec!["Gather ingredients.", "Whisk.", "Fold.", "Nested string."]
        );
    }

    #[test]
    fn blank_entries_dropped() {
        assert_eq!(norm(json!(["", "  ", "&nbsp;", "Serve."])), vec!["Serve."]);
        assert_eq!(norm(json!([{"text": " "}, {"text": "Eat."}])), vec!["Eat."]);
    }

    #[test]
    fn single_object_accepted() {
        assert_eq!(norm(json!({"@type": "HowToStep", "text": "Only step."})), vec!["Only step."]);
    }

    #[test]
    fn absent_and_unrecognized() {
        assert!(normalize_instructions(None).is_empty());
        assert!(norm(json!(null)).is_empty());
        assert!(norm(json!(12)).is_empty());
        assert!(norm(json!(true)).is_empty());
    }

    #[test]
    fn classification_tags() {
        let v = json!(["a", "b"]);
        assert_eq!(classify(Some(&v)), InstructionsShape::Strings(vec!["a", "b"]));

        let v = json!([{"text": "a"}]);
        assert_eq!(classify(Some(&v)), InstructionsShape::Steps(vec![Step { text: "a" }]));

        let v = json!([{"@type": "HowToSection", "name": "S", "itemListElement": []}]);
        assert!(matches!(classify(Some(&v)), InstructionsShape::Sections(s) if s[0].name == Some("S")));

        let v = json!(["a", {"text": "b"}]);
        assert!(matches!(classify(Some(&v)), InstructionsShape::Mixed(_)));

        let v = json!("one");
        assert_eq!(classify(Some(&v)), InstructionsShape::Text("one"));
    }
}
