use super::tables::MAN;

const OKU: f64 = 100_000_000.0;
const PLACEHOLDER: &str = "---";

pub fn to_man(yen: f64) -> f64 {
    yen / MAN
}

pub fn to_yen(man: f64) -> f64 {
    man * MAN
}

/// Yen amount for display: "1.2億円" from one hundred million up, otherwise
/// rounded man-yen such as "1,234万円". Non-finite input renders "---".
pub fn format_yen(yen: f64) -> String {
    if !yen.is_finite() {
        return PLACEHOLDER.to_string();
    }
    if yen >= OKU {
        format!("{:.1}億円", yen / OKU)
    } else {
        format!("{}万円", group_thousands(to_man(yen).round()))
    }
}

pub fn format_man(man: f64) -> String {
    if !man.is_finite() {
        return format!("{PLACEHOLDER}万円");
    }
    format!("{}万円", group_thousands(man.round()))
}

pub fn format_man_bare(man: f64) -> String {
    if !man.is_finite() {
        return PLACEHOLDER.to_string();
    }
    format!("{}万", group_thousands(man.round()))
}

fn group_thousands(value: f64) -> String {
    let digits = format!("{:.0}", value.abs());
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if value < 0.0 {
        grouped.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_conversion() {
        assert_eq!(to_man(12_340_000.0), 1_234.0);
        assert_eq!(to_yen(240.0), 2_400_000.0);
    }

    #[test]
    fn yen_formats_as_man_or_oku() {
        assert_eq!(format_yen(12_345_678.0), "1,235万円");
        assert_eq!(format_yen(0.0), "0万円");
        assert_eq!(format_yen(99_990_000.0), "9,999万円");
        assert_eq!(format_yen(100_000_000.0), "1.0億円");
        assert_eq!(format_yen(256_000_000.0), "2.6億円");
        assert_eq!(format_yen(-3_000_000.0), "-300万円");
    }

    #[test]
    fn non_finite_values_fail_soft() {
        assert_eq!(format_yen(f64::NAN), "---");
        assert_eq!(format_yen(f64::INFINITY), "---");
        assert_eq!(format_man(f64::NAN), "---万円");
        assert_eq!(format_man_bare(f64::NEG_INFINITY), "---");
    }

    #[test]
    fn man_values_group_thousands() {
        assert_eq!(format_man(1_234_567.4), "1,234,567万円");
        assert_eq!(format_man(999.5), "1,000万円");
        assert_eq!(format_man_bare(42.0), "42万");
    }
}
