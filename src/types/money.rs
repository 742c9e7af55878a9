/// Monetary amounts are integer US cents.
pub type Cents = i64;

/// Format cents as a dollar string with thousands separators, e.g. `$8,500.00`.
pub fn format_usd(amount: Cents) -> String {
    let sign = if amount < 0 { "-" } else { "" };
    let cents = amount.unsigned_abs();
    let dollars = cents / 100;
    let rem = cents % 100;

    let digits = dollars.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    format!("{sign}${grouped}.{rem:02}")
}
