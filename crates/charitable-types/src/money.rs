/// Smallest donation the backend accepts, in cents ($1).
pub const MIN_DONATION_CENTS: u64 = 100;

/// Amounts offered on the donate screen, in cents.
pub const PRESET_AMOUNTS: [u64; 4] = [1000, 2500, 5000, 10000];

/// Whole-dollar input to cents. `None` on overflow.
pub fn dollars_to_cents(dollars: u64) -> Option<u64> {
    dollars.checked_mul(100)
}

/// `2500` -> `"$25.00"`, `123456789` -> `"$1,234,567.89"`.
pub fn format_cents(cents: u64) -> String {
    let dollars = (cents / 100).to_string();
    let mut grouped = String::with_capacity(dollars.len() + dollars.len() / 3);
    for (i, ch) in dollars.chars().enumerate() {
        if i > 0 && (dollars.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    format!("${}.{:02}", grouped, cents % 100)
}
