//! Keyword-and-grammar intent extraction.
//!
//! One pass over the text: classify by a fixed keyword battery (first kind
//! in priority order wins), then pull the kind's fields with a small grammar:
//!
//! - quantity + item: first `<integer> <word>` pair (currency words excluded)
//! - amount + currency: first `<integer> (cusd|celo|naira|dollar)` pair
//! - supplier: first token after the word "pay", else after "from"
//! - beneficiary item: first token after the word "for"
//!
//! Missing fields never raise; the intent just comes back `Incomplete`.

use crate::types::{Currency, Field, Intent, IntentKind};
use std::collections::BTreeMap;
use tracing::debug;

/// A keyword test. Words match a whole token (or its plural), phrases match
/// anywhere in the normalized text.
#[derive(Debug, Clone, Copy)]
enum Keyword {
    Word(&'static str),
    Phrase(&'static str),
}

const SALE_KEYWORDS: &[Keyword] = &[
    Keyword::Word("sold"),
    Keyword::Word("sale"),
    Keyword::Word("selling"),
];

const PAYMENT_KEYWORDS: &[Keyword] = &[
    Keyword::Word("pay"),
    Keyword::Word("order"),
    Keyword::Word("restock"),
    Keyword::Word("supplier"),
];

const LOAN_KEYWORDS: &[Keyword] = &[
    Keyword::Word("loan"),
    Keyword::Word("capital"),
    Keyword::Word("borrow"),
    Keyword::Word("borrowing"),
];

const SCORE_KEYWORDS: &[Keyword] = &[
    Keyword::Phrase("credit score"),
    Keyword::Phrase("update my score"),
    Keyword::Phrase("refresh my score"),
];

const ADVICE_KEYWORDS: &[Keyword] = &[
    Keyword::Word("advice"),
    Keyword::Word("tip"),
    Keyword::Word("optimize"),
    Keyword::Phrase("how am i doing"),
];

/// Words skipped when reading the token after "for".
const FILLER_WORDS: &[&str] = &["the", "a", "an", "my", "some", "our", "his", "her"];

fn keywords(kind: IntentKind) -> &'static [Keyword] {
    match kind {
        IntentKind::RecordSale => SALE_KEYWORDS,
        IntentKind::PaySupplier => PAYMENT_KEYWORDS,
        IntentKind::RequestLoan => LOAN_KEYWORDS,
        IntentKind::UpdateScore => SCORE_KEYWORDS,
        IntentKind::GetAdvice => ADVICE_KEYWORDS,
        IntentKind::Unknown => &[],
    }
}

#[derive(Debug, Clone)]
struct Token {
    raw: String,
    lower: String,
}

impl Token {
    fn is_integer(&self) -> bool {
        !self.raw.is_empty() && self.raw.chars().all(|c| c.is_ascii_digit())
    }

    fn is_word(&self) -> bool {
        !self.raw.is_empty() && self.raw.chars().all(char::is_alphabetic)
    }

    fn currency(&self) -> Option<Currency> {
        self.lower.parse().ok()
    }
}

/// Stateless extractor; cheap to construct and share.
#[derive(Debug, Clone, Default)]
pub struct IntentExtractor;

impl IntentExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Classify `text` and extract the fields of the winning kind.
    pub fn extract(&self, text: &str) -> Intent {
        self.extract_as(classify(text), text)
    }

    /// Extract the fields of a kind the caller has already chosen.
    pub fn extract_as(&self, kind: IntentKind, text: &str) -> Intent {
        let tokens = tokenize(text);
        let mut fields = BTreeMap::new();

        match kind {
            IntentKind::RecordSale => {
                if let Some((quantity, item)) = quantity_and_item(&tokens) {
                    fields.insert(Field::Quantity, quantity);
                    fields.insert(Field::Item, item);
                }
                if let Some((amount, currency)) = amount_and_currency(&tokens) {
                    fields.insert(Field::Amount, amount);
                    fields.insert(Field::Currency, currency.as_token().to_string());
                }
            }
            IntentKind::PaySupplier => {
                if let Some(supplier) =
                    word_after(&tokens, "pay").or_else(|| word_after(&tokens, "from"))
                {
                    fields.insert(Field::Supplier, supplier);
                }
                if let Some((amount, currency)) = amount_and_currency(&tokens) {
                    fields.insert(Field::Amount, amount);
                    fields.insert(Field::Currency, currency.as_token().to_string());
                }
                if let Some(item) = word_after(&tokens, "for") {
                    if let Some(quantity) = quantity_of(&tokens, &item) {
                        fields.insert(Field::Quantity, quantity);
                    }
                    fields.insert(Field::Item, item);
                }
            }
            IntentKind::RequestLoan => {
                let amount = amount_and_currency(&tokens).or_else(|| {
                    tokens
                        .iter()
                        .find(|t| t.is_integer())
                        .map(|t| (t.raw.clone(), Currency::Cusd))
                });
                if let Some((amount, currency)) = amount {
                    fields.insert(Field::Amount, amount);
                    fields.insert(Field::Currency, currency.as_token().to_string());
                }
            }
            IntentKind::UpdateScore | IntentKind::GetAdvice | IntentKind::Unknown => {}
        }

        let intent = Intent::new(kind, fields);
        debug!(
            "Extracted {} intent ({:?}) with {} fields",
            intent.kind(),
            intent.confidence(),
            intent.fields().len()
        );
        intent
    }
}

/// First kind, in priority order, whose keyword battery matches `text`.
pub fn classify(text: &str) -> IntentKind {
    let normalized = normalize_text(text);
    let tokens = tokenize(text);

    IntentKind::ALL
        .into_iter()
        .find(|kind| keyword_hit(*kind, &normalized, &tokens))
        .unwrap_or(IntentKind::Unknown)
}

/// Whether `text` matches the keyword battery of `kind`.
pub fn matches_kind(kind: IntentKind, text: &str) -> bool {
    keyword_hit(kind, &normalize_text(text), &tokenize(text))
}

fn keyword_hit(kind: IntentKind, normalized: &str, tokens: &[Token]) -> bool {
    keywords(kind).iter().any(|keyword| match keyword {
        Keyword::Phrase(phrase) => normalized.contains(phrase),
        Keyword::Word(word) => tokens.iter().any(|t| {
            t.lower == *word || t.lower.strip_suffix('s').is_some_and(|stem| stem == *word)
        }),
    })
}

/// Lowercase and collapse whitespace so phrases match across line breaks.
fn normalize_text(text: &str) -> String {
    text.to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Split on anything that is not alphanumeric. Thousands separators between
/// digits ("15,000") are dropped so the number survives as one token.
fn tokenize(text: &str) -> Vec<Token> {
    let chars: Vec<char> = text.chars().collect();
    let mut sanitized = String::with_capacity(text.len());

    for (index, character) in chars.iter().enumerate() {
        if character.is_alphanumeric() {
            sanitized.push(*character);
        } else if *character == ','
            && index > 0
            && chars[index - 1].is_ascii_digit()
            && chars.get(index + 1).is_some_and(|c| c.is_ascii_digit())
        {
            continue;
        } else {
            sanitized.push(' ');
        }
    }

    sanitized
        .split_whitespace()
        .map(|raw| Token {
            raw: raw.to_string(),
            lower: raw.to_lowercase(),
        })
        .collect()
}

fn quantity_and_item(tokens: &[Token]) -> Option<(String, String)> {
    tokens.windows(2).find_map(|window| match window {
        [value, word] if value.is_integer() && word.is_word() && word.currency().is_none() => {
            Some((value.raw.clone(), word.raw.clone()))
        }
        _ => None,
    })
}

fn amount_and_currency(tokens: &[Token]) -> Option<(String, Currency)> {
    tokens.windows(2).find_map(|window| match window {
        [value, unit] if value.is_integer() => unit.currency().map(|c| (value.raw.clone(), c)),
        _ => None,
    })
}

/// First word after the literal `marker`, skipping filler words.
fn word_after(tokens: &[Token], marker: &str) -> Option<String> {
    let position = tokens.iter().position(|t| t.lower == marker)?;
    tokens[position + 1..]
        .iter()
        .find(|t| !FILLER_WORDS.contains(&t.lower.as_str()))
        .filter(|t| t.is_word())
        .map(|t| t.raw.clone())
}

/// Quantity written as `<integer> <item>` for a specific item.
fn quantity_of(tokens: &[Token], item: &str) -> Option<String> {
    let item = item.to_lowercase();
    tokens.windows(2).find_map(|window| match window {
        [value, word] if value.is_integer() && word.lower == item => Some(value.raw.clone()),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Confidence;

    fn extract(text: &str) -> Intent {
        IntentExtractor::new().extract(text)
    }

    #[test]
    fn sale_with_quantity_and_price() {
        let intent = extract("I sold 10 tomatoes for 500 naira");
        assert_eq!(intent.kind(), IntentKind::RecordSale);
        assert_eq!(intent.confidence(), Confidence::Complete);
        assert_eq!(intent.field(Field::Quantity), Some("10"));
        assert_eq!(intent.field(Field::Item), Some("tomatoes"));
        assert_eq!(intent.field(Field::Amount), Some("500"));
        assert_eq!(intent.field(Field::Currency), Some("naira"));
    }

    #[test]
    fn sale_accepts_thousands_separator() {
        let intent = extract("Agent, I just sold 10 bags of rice for 15,000 naira");
        assert_eq!(intent.field(Field::Quantity), Some("10"));
        assert_eq!(intent.field(Field::Item), Some("bags"));
        assert_eq!(intent.field(Field::Amount), Some("15000"));
    }

    #[test]
    fn sale_without_price_is_incomplete() {
        let intent = extract("I sold 10 tomatoes today");
        assert_eq!(intent.kind(), IntentKind::RecordSale);
        assert_eq!(intent.confidence(), Confidence::Incomplete);
        assert_eq!(intent.missing_fields(), vec![Field::Amount, Field::Currency]);
    }

    #[test]
    fn currency_word_is_not_an_item() {
        let intent = extract("sold tomatoes for 500 naira");
        assert_eq!(intent.field(Field::Item), None);
        assert_eq!(intent.field(Field::Amount), Some("500"));
    }

    #[test]
    fn supplier_payment() {
        let intent = extract("Pay Bala 30 cUSD for onions");
        assert_eq!(intent.kind(), IntentKind::PaySupplier);
        assert_eq!(intent.confidence(), Confidence::Complete);
        assert_eq!(intent.field(Field::Supplier), Some("Bala"));
        assert_eq!(intent.field(Field::Amount), Some("30"));
        assert_eq!(intent.field(Field::Currency), Some("cusd"));
        assert_eq!(intent.field(Field::Item), Some("onions"));
        assert_eq!(intent.field(Field::Quantity), None);
    }

    #[test]
    fn order_names_supplier_after_from() {
        let intent = extract("order 20 onions from Bala");
        assert_eq!(intent.kind(), IntentKind::PaySupplier);
        assert_eq!(intent.field(Field::Supplier), Some("Bala"));
        assert_eq!(intent.confidence(), Confidence::Incomplete);
    }

    #[test]
    fn supplier_payment_skips_articles_and_reads_quantity() {
        let intent = extract("yes, pay Bala 30 cusd for the tomatoes, 40 tomatoes total");
        assert_eq!(intent.field(Field::Item), Some("tomatoes"));
        assert_eq!(intent.field(Field::Quantity), Some("40"));
    }

    #[test]
    fn loan_with_currency_or_bare_amount() {
        let intent = extract("Can I borrow 200 cUSD?");
        assert_eq!(intent.kind(), IntentKind::RequestLoan);
        assert_eq!(intent.field(Field::Amount), Some("200"));

        let bare = extract("I need a loan of 150");
        assert_eq!(bare.field(Field::Amount), Some("150"));
        assert_eq!(bare.field(Field::Currency), Some("cusd"));

        let vague = extract("I need some capital");
        assert_eq!(vague.confidence(), Confidence::Incomplete);
    }

    #[test]
    fn score_and_advice_need_no_fields() {
        let score = extract("Agent, update my credit score");
        assert_eq!(score.kind(), IntentKind::UpdateScore);
        assert_eq!(score.confidence(), Confidence::Complete);

        assert_eq!(extract("any tips?").kind(), IntentKind::GetAdvice);
        assert_eq!(extract("How am I doing this week?").kind(), IntentKind::GetAdvice);
    }

    #[test]
    fn priority_order_breaks_ties() {
        // Mentions both a sale and a loan: sale comes first.
        assert_eq!(
            classify("I sold 5 rice for 20 cusd, can I get a loan?"),
            IntentKind::RecordSale
        );
        assert_eq!(classify("pay back my loan"), IntentKind::PaySupplier);
    }

    #[test]
    fn unmatched_text_is_unknown() {
        for text in ["hello there", "", "what is the weather", "wholesome"] {
            assert_eq!(extract(text).kind(), IntentKind::Unknown, "{text}");
        }
    }

    #[test]
    fn matches_kind_is_per_action() {
        assert!(matches_kind(IntentKind::RequestLoan, "loans please"));
        assert!(!matches_kind(IntentKind::RequestLoan, "any tips?"));
        assert!(!matches_kind(IntentKind::Unknown, "anything"));
    }
}
