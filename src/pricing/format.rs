//! Indian number formatting for rupee amounts

/// Format a rupee amount with Indian digit grouping, e.g. `14,26,158`.
///
/// Amounts are rounded to whole rupees.
pub fn format_indian_price(amount: f64) -> String {
    let rounded = amount.round();
    let negative = rounded < 0.0;
    let digits = format!("{:.0}", rounded.abs());

    let grouped = if digits.len() <= 3 {
        digits
    } else {
        let (head, last_three) = digits.split_at(digits.len() - 3);
        let mut groups: Vec<&str> = Vec::new();
        let mut end = head.len();
        while end > 0 {
            let start = end.saturating_sub(2);
            groups.push(&head[start..end]);
            end = start;
        }
        groups.reverse();
        format!("{},{}", groups.join(","), last_three)
    };

    if negative {
        format!("-{}", grouped)
    } else {
        grouped
    }
}

/// Format an amount in lakhs with two decimals, e.g. `12.00 Lakh`
pub fn format_lakh(amount: f64) -> String {
    format!("{:.2} Lakh", amount / 100_000.0)
}
