use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Maximum decimal precision of a symbol.
pub const MAX_PRECISION: u8 = 18;

/// Maximum length of a symbol code.
pub const MAX_SYMBOL_LEN: usize = 7;

/// A token symbol: an uppercase code plus the number of decimal places.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Symbol {
    precision: u8,
    code: String,
}

impl Symbol {
    pub fn new(precision: u8, code: impl Into<String>) -> Result<Self, TypeError> {
        let code = code.into();
        let invalid = |reason: &str| TypeError::InvalidSymbol {
            symbol: code.clone(),
            reason: reason.to_string(),
        };
        if precision > MAX_PRECISION {
            return Err(invalid("precision exceeds 18"));
        }
        if code.is_empty() || code.len() > MAX_SYMBOL_LEN {
            return Err(invalid("code must be 1 to 7 characters"));
        }
        if !code.bytes().all(|b| b.is_ascii_uppercase()) {
            return Err(invalid("code must be uppercase A-Z"));
        }
        Ok(Self { precision, code })
    }

    pub fn precision(&self) -> u8 {
        self.precision
    }

    pub fn code(&self) -> &str {
        &self.code
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.precision, self.code)
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.code)
    }
}

/// A fixed-point quantity of some symbol.
///
/// `amount` is in the smallest unit: `Asset::new(150, HUSD@2)` is `1.50 HUSD`.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Asset {
    amount: i64,
    symbol: Symbol,
}

impl Asset {
    pub fn new(amount: i64, symbol: Symbol) -> Self {
        Self { amount, symbol }
    }

    pub fn amount(&self) -> i64 {
        self.amount
    }

    pub fn symbol(&self) -> &Symbol {
        &self.symbol
    }
}

impl fmt::Debug for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Asset({self})")
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let precision = u32::from(self.symbol.precision);
        let sign = if self.amount < 0 { "-" } else { "" };
        let magnitude = self.amount.unsigned_abs();
        if precision == 0 {
            return write!(f, "{sign}{magnitude} {}", self.symbol.code);
        }
        let scale = 10u128.pow(precision);
        let whole = u128::from(magnitude) / scale;
        let frac = u128::from(magnitude) % scale;
        write!(
            f,
            "{sign}{whole}.{frac:0width$} {}",
            self.symbol.code,
            width = precision as usize
        )
    }
}

impl FromStr for Asset {
    type Err = TypeError;

    /// Parse `"<amount> <CODE>"`; precision is the number of fractional digits.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| TypeError::InvalidAsset {
            text: s.to_string(),
            reason: reason.to_string(),
        };

        let (number, code) = s
            .trim()
            .split_once(' ')
            .ok_or_else(|| invalid("expected '<amount> <SYMBOL>'"))?;
        let (negative, digits) = match number.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, number),
        };
        let (whole, frac) = digits.split_once('.').unwrap_or((digits, ""));
        if whole.is_empty() || (digits.contains('.') && frac.is_empty()) {
            return Err(invalid("malformed amount"));
        }
        if !whole.bytes().chain(frac.bytes()).all(|b| b.is_ascii_digit()) {
            return Err(invalid("amount must be decimal digits"));
        }

        let precision =
            u8::try_from(frac.len()).map_err(|_| invalid("too many fractional digits"))?;
        let symbol = Symbol::new(precision, code.trim())?;

        let joined = format!("{whole}{frac}");
        let magnitude: i64 = joined
            .parse()
            .map_err(|_| invalid("amount out of range"))?;
        let amount = if negative { -magnitude } else { magnitude };
        Ok(Self::new(amount, symbol))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn husd() -> Symbol {
        Symbol::new(2, "HUSD").unwrap()
    }

    #[test]
    fn display_applies_precision() {
        assert_eq!(Asset::new(150, husd()).to_string(), "1.50 HUSD");
        assert_eq!(Asset::new(5, husd()).to_string(), "0.05 HUSD");
        assert_eq!(Asset::new(-1234, husd()).to_string(), "-12.34 HUSD");
        let whole = Symbol::new(0, "VOTE").unwrap();
        assert_eq!(Asset::new(42, whole).to_string(), "42 VOTE");
    }

    #[test]
    fn parse_infers_precision() {
        let asset: Asset = "1.50 HUSD".parse().unwrap();
        assert_eq!(asset.amount(), 150);
        assert_eq!(asset.symbol().precision(), 2);
        assert_eq!(asset.symbol().code(), "HUSD");

        let neg: Asset = "-0.0001 SEEDS".parse().unwrap();
        assert_eq!(neg.amount(), -1);
        assert_eq!(neg.to_string(), "-0.0001 SEEDS");
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!("".parse::<Asset>().is_err());
        assert!("1.00".parse::<Asset>().is_err());
        assert!("1. HUSD".parse::<Asset>().is_err());
        assert!("1.0x HUSD".parse::<Asset>().is_err());
        assert!("1.00 husd".parse::<Asset>().is_err());
    }

    #[test]
    fn symbol_validation() {
        assert!(Symbol::new(19, "HUSD").is_err());
        assert!(Symbol::new(2, "").is_err());
        assert!(Symbol::new(2, "TOOLONGX").is_err());
        assert!(matches!(
            Symbol::new(2, "h1"),
            Err(TypeError::InvalidSymbol { .. })
        ));
    }

    proptest::proptest! {
        #[test]
        fn display_parses_back(
            amount in any::<i64>().prop_filter("abs", |a| *a != i64::MIN),
            precision in 0u8..=8
        ) {
            let asset = Asset::new(amount, Symbol::new(precision, "TOK").unwrap());
            let parsed: Asset = asset.to_string().parse().unwrap();
            prop_assert_eq!(parsed, asset);
        }
    }
}
