use feriabot_types::TransactionType;
use regex::Regex;

const SALE_CORRECTIONS: [&str; 4] = ["venta", "vendí", "vendi", "es venta"];
const EXPENSE_CORRECTIONS: [&str; 5] = ["gasto", "compra", "compre", "compré", "es gasto"];

const GREETING_KEYWORDS: [&str; 7] = [
    "hola",
    "buenas",
    "ayuda",
    "help",
    "empezar",
    "cómo funciona",
    "como funciona",
];

const BALANCE_KEYWORDS: [&str; 8] = [
    "saldo",
    "balance",
    "cuánto tengo",
    "cuanto tengo",
    "dinero",
    "estado",
    "resumen",
    "cuentas",
];

/// Exact (trimmed, case-insensitive) match against the correction keyword
/// sets. Anything longer falls through to normal routing so a running
/// conversation never trips the correction flow by accident.
pub fn correction_keyword(text: &str) -> Option<TransactionType> {
    let text = text.trim().to_lowercase();

    if SALE_CORRECTIONS.iter().any(|keyword| *keyword == text) {
        Some(TransactionType::Sale)
    } else if EXPENSE_CORRECTIONS.iter().any(|keyword| *keyword == text) {
        Some(TransactionType::Expense)
    } else {
        None
    }
}

pub fn is_greeting(text: &str) -> bool {
    let text = text.trim().to_lowercase();
    GREETING_KEYWORDS.iter().any(|keyword| text.contains(keyword))
}

pub fn is_balance_inquiry(text: &str) -> bool {
    let text = text.trim().to_lowercase();
    BALANCE_KEYWORDS.iter().any(|keyword| text.contains(keyword))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub term: String,
    pub kind: TransactionType,
}

/// Compiled search-command patterns; built once at router construction.
pub struct SearchPatterns {
    expense: Regex,
    sale: Regex,
}

impl SearchPatterns {
    pub fn new() -> Self {
        Self {
            expense: Regex::new(r"(?i)(?:cu[aá]nto\s+gast[eé]\s+en|gastos\s+de)\s+(.+)")
                .expect("expense search pattern is valid"),
            sale: Regex::new(r"(?i)(?:cu[aá]nto\s+vend[ií]\s+de|ventas\s+de)\s+(.+)")
                .expect("sale search pattern is valid"),
        }
    }

    /// Extracts the free-text term after a search phrase, inferring the
    /// transaction type from the verb. Trailing punctuation and the fillers
    /// "hoy"/"ayer" are stripped from the term.
    pub fn parse(&self, text: &str) -> Option<SearchQuery> {
        if let Some(captures) = self.expense.captures(text) {
            return clean_term(&captures[1]).map(|term| SearchQuery {
                term,
                kind: TransactionType::Expense,
            });
        }

        if let Some(captures) = self.sale.captures(text) {
            return clean_term(&captures[1]).map(|term| SearchQuery {
                term,
                kind: TransactionType::Sale,
            });
        }

        None
    }
}

impl Default for SearchPatterns {
    fn default() -> Self {
        Self::new()
    }
}

fn clean_term(raw: &str) -> Option<String> {
    let term = raw
        .trim()
        .trim_end_matches(['?', '!', '.', ',', '¿', '¡'])
        .trim();

    let mut words: Vec<&str> = term.split_whitespace().collect();
    while let Some(last) = words.last() {
        let last = last.to_lowercase();
        if last == "hoy" || last == "ayer" {
            words.pop();
        } else {
            break;
        }
    }

    if words.is_empty() {
        None
    } else {
        Some(words.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_correction_keywords() {
        assert_eq!(correction_keyword("venta"), Some(TransactionType::Sale));
        assert_eq!(correction_keyword("  VENTA  "), Some(TransactionType::Sale));
        assert_eq!(correction_keyword("es venta"), Some(TransactionType::Sale));
        assert_eq!(correction_keyword("gasto"), Some(TransactionType::Expense));
        assert_eq!(correction_keyword("compré"), Some(TransactionType::Expense));

        // Not exact matches: these are normal messages.
        assert_eq!(correction_keyword("vendí 3 cocas a 10"), None);
        assert_eq!(correction_keyword("el gasto de ayer"), None);
    }

    #[test]
    fn test_balance_keywords() {
        assert!(is_balance_inquiry("¿cuánto tengo?"));
        assert!(is_balance_inquiry("saldo"));
        assert!(is_balance_inquiry("dame el resumen"));
        assert!(!is_balance_inquiry("vendí 3 cocas a 10"));
    }

    #[test]
    fn test_search_expense_pattern() {
        let patterns = SearchPatterns::new();
        let query = patterns.parse("cuánto gasté en mercancía").unwrap();
        assert_eq!(query.kind, TransactionType::Expense);
        assert_eq!(query.term, "mercancía");

        let query = patterns.parse("¿Cuanto gaste en luz?").unwrap();
        assert_eq!(query.term, "luz");
    }

    #[test]
    fn test_search_sale_pattern() {
        let patterns = SearchPatterns::new();
        let query = patterns.parse("ventas de refrescos hoy").unwrap();
        assert_eq!(query.kind, TransactionType::Sale);
        assert_eq!(query.term, "refrescos");

        let query = patterns.parse("cuánto vendí de dulces ayer?").unwrap();
        assert_eq!(query.term, "dulces");
    }

    #[test]
    fn test_search_requires_a_term() {
        let patterns = SearchPatterns::new();
        assert!(patterns.parse("gastos de hoy").is_none());
        assert!(patterns.parse("vendí 3 cocas").is_none());
    }
}
