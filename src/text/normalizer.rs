//! Text normalization
//!
//! Normalizes input text ahead of unit selection by handling:
//! - Numbers to words conversion (Brazilian Portuguese cardinals)
//! - Lowercasing (ASCII plus the accented letters the voice inventory uses)

const UNITS: [&str; 20] = [
    "zero",
    "um",
    "dois",
    "três",
    "quatro",
    "cinco",
    "seis",
    "sete",
    "oito",
    "nove",
    "dez",
    "onze",
    "doze",
    "treze",
    "quatorze",
    "quinze",
    "dezesseis",
    "dezessete",
    "dezoito",
    "dezenove",
];

const TENS: [&str; 10] = [
    "", "", "vinte", "trinta", "quarenta", "cinquenta", "sessenta", "setenta", "oitenta",
    "noventa",
];

const HUNDREDS: [&str; 10] = [
    "",
    "cento",
    "duzentos",
    "trezentos",
    "quatrocentos",
    "quinhentos",
    "seiscentos",
    "setecentos",
    "oitocentos",
    "novecentos",
];

/// Largest value spoken with scale words; longer digit runs are spelled out
const MAX_SCALED: u64 = 999_999_999_999;

/// Lowercase ASCII `A–Z` plus the accented uppercase letters that occur in
/// unit labels (`É Ó Ô Ç`); everything else passes through
pub fn lowercase(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            'A'..='Z' => c.to_ascii_lowercase(),
            'É' => 'é',
            'Ó' => 'ó',
            'Ô' => 'ô',
            'Ç' => 'ç',
            _ => c,
        })
        .collect()
}

/// Replace every maximal run of ASCII digits with its cardinal reading
///
/// A `-` immediately before a digit run reads as `menos`.
pub fn expand_numbers(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut result = String::with_capacity(text.len() * 2);
    let mut i = 0;

    while i < chars.len() {
        let negative = chars[i] == '-' && i + 1 < chars.len() && chars[i + 1].is_ascii_digit();
        if negative || chars[i].is_ascii_digit() {
            if negative {
                i += 1;
            }
            let start = i;
            while i < chars.len() && chars[i].is_ascii_digit() {
                i += 1;
            }
            let digits: String = chars[start..i].iter().collect();
            if negative {
                result.push_str("menos ");
            }
            result.push_str(&cardinal_words(&digits));
        } else {
            result.push(chars[i]);
            i += 1;
        }
    }

    result
}

/// Spoken form of a digit run; falls back to digit-by-digit reading when the
/// value exceeds the supported scales
fn cardinal_words(digits: &str) -> String {
    match digits.parse::<u64>() {
        Ok(n) if n <= MAX_SCALED => integer_to_words(n),
        _ => digits
            .chars()
            .filter_map(|c| c.to_digit(10))
            .map(|d| UNITS[d as usize])
            .collect::<Vec<_>>()
            .join(" "),
    }
}

fn under_hundred(n: u64) -> String {
    if n < 20 {
        return UNITS[n as usize].to_string();
    }
    let tens = TENS[(n / 10) as usize];
    if n % 10 == 0 {
        tens.to_string()
    } else {
        format!("{tens} e {}", UNITS[(n % 10) as usize])
    }
}

fn under_thousand(n: u64) -> String {
    if n == 100 {
        return "cem".to_string();
    }
    let hundreds = n / 100;
    let rest = n % 100;
    if hundreds == 0 {
        under_hundred(rest)
    } else if rest == 0 {
        HUNDREDS[hundreds as usize].to_string()
    } else {
        format!("{} e {}", HUNDREDS[hundreds as usize], under_hundred(rest))
    }
}

fn scale_group(count: u64, singular: &str, plural: &str) -> String {
    if count == 1 {
        format!("um {singular}")
    } else {
        format!("{} {plural}", under_thousand(count))
    }
}

fn integer_to_words(n: u64) -> String {
    if n == 0 {
        return "zero".to_string();
    }

    let billions = n / 1_000_000_000;
    let millions = (n / 1_000_000) % 1000;
    let thousands = (n / 1000) % 1000;
    let rest = n % 1000;

    let mut groups: Vec<String> = Vec::new();
    if billions > 0 {
        groups.push(scale_group(billions, "bilhão", "bilhões"));
    }
    if millions > 0 {
        groups.push(scale_group(millions, "milhão", "milhões"));
    }
    if thousands > 0 {
        groups.push(if thousands == 1 {
            "mil".to_string()
        } else {
            format!("{} mil", under_thousand(thousands))
        });
    }
    if rest > 0 {
        groups.push(under_thousand(rest));
    }

    // "e" binds a trailing residue under one hundred to the scale groups
    if groups.len() >= 2 && rest > 0 && rest < 100 {
        if let Some((last, init)) = groups.split_last() {
            let heads: Vec<&str> = init.iter().map(String::as_str).collect();
            return format!("{} e {last}", heads.join(" "));
        }
    }
    groups.join(" ")
}
