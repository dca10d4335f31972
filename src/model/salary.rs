//! Salary string helpers
//!
//! Listing salaries are free text such as `"$50,000 - $70,000"` or
//! `"$25.00 - $30.00 per hour"`. Hourly rates are annualised at 40 hours a
//! week, 52 weeks a year.

const HOURS_PER_YEAR: f64 = 40.0 * 52.0;

/// Parses a salary string and returns the minimum annual salary
///
/// Returns 0.0 when no dollar amount can be found.
pub fn parse_minimum_annual_salary(salary: &str) -> f64 {
    let Some(amount) = first_dollar_amount(salary) else {
        return 0.0;
    };

    if is_hourly(salary) {
        amount * HOURS_PER_YEAR
    } else {
        amount
    }
}

/// Formats a whole-dollar amount with thousands separators, e.g. `$50,000`
pub fn format_salary(salary: f64) -> String {
    let whole = salary.round().max(0.0) as u64;
    let digits = whole.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    format!("${}", out)
}

fn first_dollar_amount(salary: &str) -> Option<f64> {
    let start = salary.find('$')? + 1;
    let number: String = salary[start..]
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == ',' || *c == '.')
        .filter(|c| *c != ',')
        .collect();
    number.parse().ok()
}

fn is_hourly(salary: &str) -> bool {
    let lower = salary.to_lowercase();
    let normalized: String = lower.split_whitespace().collect::<Vec<_>>().join(" ");
    normalized.contains("per hour") || normalized.contains("/hour") || normalized.contains("hourly")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_annual_range() {
        assert_eq!(parse_minimum_annual_salary("$50,000 - $70,000"), 50000.0);
    }

    #[test]
    fn test_hourly_range() {
        assert_eq!(
            parse_minimum_annual_salary("$25.00 - $30.00 per hour"),
            52000.0
        );
    }

    #[test]
    fn test_hourly_suffix_variants() {
        assert_eq!(parse_minimum_annual_salary("$20/hour"), 41600.0);
        assert_eq!(parse_minimum_annual_salary("$20 Hourly"), 41600.0);
    }

    #[test]
    fn test_unparseable() {
        assert_eq!(parse_minimum_annual_salary(""), 0.0);
        assert_eq!(parse_minimum_annual_salary("Competitive"), 0.0);
    }

    #[test]
    fn test_format_salary() {
        assert_eq!(format_salary(50000.0), "$50,000");
        assert_eq!(format_salary(999.0), "$999");
        assert_eq!(format_salary(1234567.4), "$1,234,567");
    }
}
