use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::ValidationError;

const MAX_SYMBOL_LEN: usize = 15;

/// Exchange-qualified security code such as `sh.600000` or `sz.000858`.
///
/// Stored lowercase as `<exchange>.<code>`: the exchange is ASCII letters,
/// the code is ASCII alphanumerics with optional `-` separators.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Symbol(String);

impl Symbol {
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let normalized = input.trim().to_ascii_lowercase();
        let Some(first) = normalized.chars().next() else {
            return Err(ValidationError::EmptySymbol);
        };
        let len = normalized.chars().count();
        if len > MAX_SYMBOL_LEN {
            return Err(ValidationError::SymbolTooLong {
                len,
                max: MAX_SYMBOL_LEN,
            });
        }
        if !first.is_ascii_alphabetic() {
            return Err(ValidationError::SymbolInvalidStart { ch: first });
        }

        let Some((exchange, code)) = normalized.split_once('.') else {
            return Err(ValidationError::SymbolNotQualified { value: normalized });
        };
        if code.is_empty() {
            return Err(ValidationError::SymbolNotQualified { value: normalized });
        }
        if let Some((index, ch)) = exchange
            .char_indices()
            .find(|(_, ch)| !ch.is_ascii_alphabetic())
        {
            return Err(ValidationError::SymbolInvalidChar { ch, index });
        }
        let offset = exchange.len() + 1;
        if let Some((index, ch)) = code
            .char_indices()
            .find(|(_, ch)| !(ch.is_ascii_alphanumeric() || *ch == '-'))
        {
            return Err(ValidationError::SymbolInvalidChar {
                ch,
                index: offset + index,
            });
        }

        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Market prefix, e.g. `sh`.
    pub fn exchange(&self) -> &str {
        self.0.split_once('.').map_or(self.as_str(), |(exchange, _)| exchange)
    }

    /// Security code within the exchange, e.g. `600000`.
    pub fn code(&self) -> &str {
        self.0.split_once('.').map_or("", |(_, code)| code)
    }
}

impl Display for Symbol {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for Symbol {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Symbol> for String {
    fn from(value: Symbol) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowercases_and_splits_exchange_from_code() {
        let symbol = Symbol::parse(" SZ.000858 ").expect("symbol should parse");
        assert_eq!(symbol.as_str(), "sz.000858");
        assert_eq!(symbol.exchange(), "sz");
        assert_eq!(symbol.code(), "000858");
    }

    #[test]
    fn bare_codes_are_not_qualified() {
        let err = Symbol::parse("600000").expect_err("digit start");
        assert!(matches!(err, ValidationError::SymbolInvalidStart { ch: '6' }));

        for input in ["sh600000", "sh."] {
            let err = Symbol::parse(input).expect_err("missing code");
            assert!(
                matches!(err, ValidationError::SymbolNotQualified { .. }),
                "{input} should need an exchange prefix"
            );
        }
    }

    #[test]
    fn exchange_is_letters_and_code_has_no_second_dot() {
        let err = Symbol::parse("s1.600000").expect_err("digit in exchange");
        assert!(matches!(err, ValidationError::SymbolInvalidChar { ch: '1', index: 1 }));

        let err = Symbol::parse("sh.600.000").expect_err("second dot");
        assert!(matches!(err, ValidationError::SymbolInvalidChar { ch: '.', index: 6 }));

        let err = Symbol::parse("sh_600000").expect_err("underscore");
        assert!(matches!(err, ValidationError::SymbolNotQualified { .. }));
    }

    #[test]
    fn rejects_overlong_and_empty_input() {
        assert!(matches!(
            Symbol::parse("   "),
            Err(ValidationError::EmptySymbol)
        ));
        assert!(matches!(
            Symbol::parse("sh.6000000000000"),
            Err(ValidationError::SymbolTooLong { len: 16, .. })
        ));
    }
}
