//! Plain-text rendering of a cycle outcome.

use cycle_core::types::{CycleScore, NATIVE_MINT, NATIVE_UNITS_PER_TOKEN, STABLE_UNITS_PER_TOKEN};
use risk_manager::{LoanSeverity, TriggerDirection};

use crate::cycle::{CycleOutcome, TradeOutcome};

/// Price triggers shown in the report.
pub const MAX_REPORT_TRIGGERS: usize = 8;

const WIDTH: usize = 72;

/// Format a dollar amount rounded to whole dollars, with thousands separators.
pub fn format_usd(value: f64) -> String {
    let rounded = value.round();
    let digits = format!("{:.0}", rounded.abs());
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    if rounded < 0.0 {
        format!("-${}", grouped)
    } else {
        format!("${}", grouped)
    }
}

fn section(report: &mut String, title: &str) {
    report.push_str(&format!("\n=== {} ===\n", title));
}

fn signal_table(report: &mut String, score: &CycleScore) {
    for signal in &score.signals {
        let marker = if signal.tier.is_active() { "[X]" } else { "[ ]" };
        report.push_str(&format!(
            "  {} {:<22} {:>8.3}  {:<7}  {}\n",
            marker,
            signal.name(),
            signal.value,
            signal.tier.as_str(),
            signal.threshold
        ));
    }
}

fn severity_icon(severity: LoanSeverity) -> &'static str {
    match severity {
        LoanSeverity::Danger => "[!!!]",
        LoanSeverity::Opportunity => "[ $ ]",
        LoanSeverity::Warning => "[!! ]",
        LoanSeverity::Info => "[ i ]",
    }
}

fn trade_section(report: &mut String, trade: &TradeOutcome) {
    let action = &trade.action;
    let (input_units, output_units) = if action.input_mint == NATIVE_MINT {
        (NATIVE_UNITS_PER_TOKEN, STABLE_UNITS_PER_TOKEN)
    } else {
        (STABLE_UNITS_PER_TOKEN, NATIVE_UNITS_PER_TOKEN)
    };

    report.push_str(&format!(
        "  {} {:.1}% of portfolio ({:.4} input tokens, slippage {} bps)\n",
        action.direction,
        action.percent,
        action.amount as f64 / input_units as f64,
        action.slippage_bps
    ));
    match (&trade.fill, &trade.error) {
        (Some(fill), _) => {
            report.push_str("  Status: FILLED\n");
            report.push_str(&format!("  TX:     {}\n", fill.tx_id));
            report.push_str(&format!(
                "  Output: {:.4} tokens\n",
                fill.output_amount as f64 / output_units as f64
            ));
        }
        (None, Some(error)) => {
            report.push_str("  Status: FAILED\n");
            report.push_str(&format!("  Error:  {}\n", error));
        }
        (None, None) => report.push_str("  Status: UNKNOWN\n"),
    }
}

/// Render the full cycle report.
pub fn render_report(outcome: &CycleOutcome) -> String {
    let snapshot = &outcome.snapshot;
    let assessment = &outcome.assessment;
    let rule = "=".repeat(WIDTH);

    let mut report = String::new();
    report.push_str(&rule);
    report.push('\n');
    report.push_str(&format!(
        "  BTC CYCLE REPORT: {} [{}]\n",
        outcome.alert.signal, outcome.alert.severity
    ));
    report.push_str(&format!(
        "  Generated: {}\n",
        outcome.generated_at.format("%Y-%m-%d %H:%M UTC")
    ));
    match (snapshot.timestamp, outcome.data_age_hours) {
        (Some(ts), Some(age)) => {
            let stale = if outcome.stale { " (STALE)" } else { "" };
            report.push_str(&format!(
                "  Data:      {} ({:.1}h old){}\n",
                ts.format("%Y-%m-%d %H:%M UTC"),
                age,
                stale
            ));
        }
        _ => report.push_str("  Data:      timestamp unknown\n"),
    }
    report.push_str(&rule);
    report.push('\n');

    section(&mut report, "MARKET OVERVIEW");
    let overview = [
        ("BTC Price", snapshot.price),
        ("Realized Price", snapshot.realized_price),
        ("STH Cost Basis", snapshot.sth_cost_basis),
        ("200-day SMA", snapshot.sma_200),
        ("True Market Mean", snapshot.true_market_mean),
        ("CVDD Floor", snapshot.cvdd_floor),
        ("Terminal Price", snapshot.terminal_price),
    ];
    for (label, value) in overview {
        report.push_str(&format!("  {:<18} {:>12}\n", format!("{}:", label), format_usd(value)));
    }

    section(
        &mut report,
        &format!(
            "BOTTOM SIGNALS ({}/{})",
            assessment.bottom.score, assessment.bottom.max_score
        ),
    );
    signal_table(&mut report, &assessment.bottom);

    section(
        &mut report,
        &format!("TOP SIGNALS ({}/{})", assessment.top.score, assessment.top.max_score),
    );
    signal_table(&mut report, &assessment.top);

    if !assessment.bottom.convergences.is_empty() || !assessment.top.convergences.is_empty() {
        section(&mut report, "CONVERGENCES");
        for fact in &assessment.bottom.convergences {
            report.push_str(&format!("  [BOTTOM] {}\n", fact.message()));
        }
        for fact in &assessment.top.convergences {
            report.push_str(&format!("  [TOP]    {}\n", fact.message()));
        }
    }

    section(&mut report, "RECOMMENDATION");
    report.push_str(&format!(
        "  Level: {} | Urgency: {} | Action: {} | Target exposure: {}%\n",
        assessment.level,
        assessment.urgency,
        assessment.suggested_action,
        assessment.exposure_percent
    ));
    for line in &assessment.rationale {
        report.push_str(&format!("  {}\n", line));
    }

    if !assessment.price_triggers.is_empty() {
        section(&mut report, "PRICE TRIGGERS");
        for trigger in assessment.price_triggers.iter().take(MAX_REPORT_TRIGGERS) {
            let arrow = match trigger.direction {
                TriggerDirection::Above => "UP",
                TriggerDirection::Below => "DN",
            };
            report.push_str(&format!(
                "  {} {:>12}  ({:>+7.1}%)  {}\n",
                arrow,
                format_usd(trigger.price),
                trigger.distance_pct(snapshot.price),
                trigger.label
            ));
        }
    }

    if !outcome.loan_warnings.is_empty() || outcome.positions_unavailable {
        section(&mut report, "LOAN MANAGEMENT");
        if outcome.positions_unavailable {
            report.push_str(
                "  [!! ] Lending positions could not be loaded; no position was checked.\n",
            );
        }
        for warning in &outcome.loan_warnings {
            report.push_str(&format!(
                "  {} {}\n",
                severity_icon(warning.severity),
                warning.message
            ));
        }
    }

    if let Some(trade) = &outcome.trade {
        section(&mut report, "TRADE EXECUTION");
        trade_section(&mut report, trade);
    }

    report.push('\n');
    report.push_str(&rule);
    report
}
