//! User-facing reply copy, Mexican Spanish throughout.
//!
//! Everything the bot says is assembled here so the flow code stays free of
//! string building and the copy can be reviewed in one place.

use feriabot_types::{Balance, CashFlowEstimate, ProcessedTransaction, Transaction, TransactionType};
use rust_decimal::Decimal;

const SEARCH_RESULT_LINES: usize = 5;

fn fmt_money(amount: Decimal) -> String {
    format!("${:.2}", amount)
}

/// Which keyword the vendor should answer to flip the registered type.
fn opposite_label(kind: TransactionType) -> &'static str {
    match kind {
        TransactionType::Sale => "GASTO",
        TransactionType::Expense => "VENTA",
        TransactionType::CashAdjustment => "VENTA o GASTO",
    }
}

fn balance_lines(balance: &Balance) -> String {
    format!(
        "💰 Saldo actual: {} MXN\n📈 Total ventas: {}\n📉 Total gastos: {}\n🔄 Total ajustes: {}",
        fmt_money(balance.current_balance),
        fmt_money(balance.total_sales),
        fmt_money(balance.total_expenses),
        fmt_money(balance.total_adjustments),
    )
}

pub fn welcome() -> &'static str {
    "¡Hola! Soy tu asistente de cuentas 🤖\n\n\
     Mándame tus movimientos como los dirías de palabra:\n\
     • \"Vendí 3 refrescos a 15 pesos\"\n\
     • \"Compré mercancía por 500\"\n\
     • \"Empiezo con 500 pesos en caja\"\n\n\
     También entiendo notas de voz 🎤 y fotos de tickets 🧾.\n\
     Pregúntame \"¿cuánto tengo?\" para ver tu saldo, o \
     \"¿cuánto gasté en mercancía?\" para buscar movimientos."
}

pub fn transaction_registered(
    kind: TransactionType,
    amount: Decimal,
    description: &str,
    balance: &Balance,
) -> String {
    format!(
        "✅ Registré {} de {} ({})\n\n{}\n\n❌ ¿Está mal? Responde {} para corregir",
        kind.label_es(),
        fmt_money(amount),
        description,
        balance_lines(balance),
        opposite_label(kind),
    )
}

pub fn clarification_request(suggestion: &ProcessedTransaction) -> String {
    format!(
        "📊 Leí {} ({})\n\n¿Es una {} o lo contrario?\nResponde: VENTA o GASTO",
        fmt_money(suggestion.amount),
        suggestion.description,
        suggestion.kind.label_es(),
    )
}

pub fn correction_applied(
    kind: TransactionType,
    amount: Decimal,
    description: &str,
    balance: &Balance,
) -> String {
    format!(
        "✅ Corregido a {} de {} ({})\n\n{}",
        kind.label_es(),
        fmt_money(amount),
        description,
        balance_lines(balance),
    )
}

pub fn no_pending_correction() -> &'static str {
    "No hay transacciones pendientes de corrección 🤔"
}

pub fn balance_summary(balance: &Balance, estimate: &CashFlowEstimate) -> String {
    let runway = match &estimate.days_left {
        Some(days) => format!(
            "⏳ Al ritmo de {} diarios, tu lana alcanza como para {} días",
            fmt_money(estimate.daily_average),
            days,
        ),
        None => "⏳ Sin fondos para estimar cuánto te dura la lana".to_string(),
    };

    format!(
        "Aquí tienes tu saldo actual, jefe 📊\n\n{}\n\n{}",
        balance_lines(balance),
        runway,
    )
}

pub fn search_results(term: &str, kind: TransactionType, matches: &[Transaction]) -> String {
    if matches.is_empty() {
        return format!("No encontré movimientos de \"{}\" 🔍", term);
    }

    let total: Decimal = matches.iter().map(|t| t.amount).sum();
    let mut reply = format!(
        "🔍 {} de \"{}\": {} en {} movimiento(s)\n",
        kind.label_es(),
        term,
        fmt_money(total),
        matches.len(),
    );

    for transaction in matches.iter().take(SEARCH_RESULT_LINES) {
        reply.push_str(&format!(
            "\n• {} — {} ({})",
            transaction.description,
            fmt_money(transaction.amount),
            transaction.created_at.format("%d/%m"),
        ));
    }

    reply
}

/// Trailing alert line for replies that follow a balance-changing
/// operation, when the till dropped below the configured threshold.
pub fn low_balance_alert(balance: &Balance) -> String {
    format!(
        "\n\n🚨 ¡Aguas! Tu saldo está muy bajo: {}. Considera hacer más ventas o reducir gastos.",
        fmt_money(balance.current_balance),
    )
}

pub fn unintelligible_text() -> &'static str {
    "No pude entender si es una venta o gasto. ¿Puedes ser más específico? \
     Por ejemplo: 'Vendí 3 refrescos a 10 pesos' 🤔"
}

pub fn unintelligible_audio() -> &'static str {
    "¡Órale! No pude entender el audio. ¿Puedes intentar de nuevo o escribir tu mensaje? 🎤"
}

pub fn unreadable_ticket() -> &'static str {
    "No pude encontrar información de compra en esta imagen. ¿Puedes tomar otra foto del ticket? 🧾"
}

pub fn media_download_failed() -> &'static str {
    "¡Órale! No pude descargar tu mensaje. ¿Puedes intentar de nuevo? 📎"
}

pub fn classifier_unavailable() -> &'static str {
    "¡Órale! Algo salió mal por acá. Intenta de nuevo en un ratito 🤖"
}

pub fn store_failed() -> &'static str {
    "No pude guardar tu movimiento ahorita. Intenta de nuevo en un momento 😕"
}
