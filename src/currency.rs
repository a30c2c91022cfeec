//! Currency catalog: supported codes, display symbols and symbol lookup
//!
//! The set of currencies is closed. Every currency has exactly one display
//! symbol, but several symbols are shared between currencies (`$`, `£`,
//! `kr`, ...). Lookup by symbol resolves those through the fixed
//! [`AMBIGUOUS_SYMBOLS`] table and never fails on ambiguity.

use crate::error::{MoneyError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

macro_rules! currencies {
    ($($code:ident => $symbol:expr,)+) => {
        /// Currency enumeration (ISO 4217 style codes)
        #[allow(clippy::upper_case_acronyms)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub enum Currency {
            $($code,)+
        }

        impl Currency {
            /// Every supported currency, sorted by code
            pub const VARIANTS: &'static [Currency] = &[$(Currency::$code,)+];

            /// Upper-case three letter code
            pub fn code(&self) -> &'static str {
                match self {
                    $(Currency::$code => stringify!($code),)+
                }
            }

            /// Display symbol. Some symbols carry a trailing space so that
            /// `{symbol}{amount}` reads naturally ("kr 10.00").
            pub fn symbol(&self) -> &'static str {
                match self {
                    $(Currency::$code => $symbol,)+
                }
            }
        }
    };
}

currencies! {
    AED => "د.إ",
    AFN => "؋",
    ALL => "Lek ",
    AMD => "֏",
    ANG => "ƒ",
    AOA => "Kz ",
    ARS => "AR$",
    AUD => "A$",
    AWG => "ƒ",
    AZN => "ман",
    BAM => "KM ",
    BBD => "BBD$",
    BDT => "৳",
    BGN => "лв",
    BHD => ".د.ب",
    BIF => "FBu",
    BMD => "$",
    BND => "B$",
    BOB => "$b",
    BRL => "R$",
    BSD => "B$",
    BTN => "Nu.",
    BWP => "P ",
    BYN => "Rbl",
    BZD => "BZ$",
    CAD => "C$",
    CDF => "FC ",
    CHF => "CHF ",
    CLP => "CLP",
    CNY => "¥",
    COP => "COP",
    CRC => "₡",
    CUP => "₱",
    CVE => "Esc ",
    CZK => "Kč",
    DJF => "Fdj",
    DKK => "kr ",
    DOP => "RD$",
    DZD => "دج",
    EGP => "E£",
    ERN => "Nkf",
    ETB => "ብር",
    EUR => "€",
    FJD => "FJ$",
    FKP => "FK£",
    GBP => "£",
    GEL => "ლ",
    GGP => "G£",
    GHS => "GH₵",
    GIP => "£",
    GMD => "D ",
    GNF => "GFr",
    GTQ => "Q ",
    GYD => "G$",
    HKD => "HK$",
    HNL => "L ",
    HRK => "kn ",
    HTG => "G ",
    HUF => "Ft ",
    IDR => "Rp ",
    ILS => "₪",
    IMP => "£",
    INR => "₹",
    IQD => "د.ع",
    IRR => "﷼",
    ISK => "kr ",
    JEP => "£",
    JMD => "J$",
    JOD => "د.أ",
    JPY => "JP¥",
    KES => "Ksh ",
    KGS => "лв",
    KHR => "៛",
    KMF => "CF",
    KPW => "₩",
    KRW => "₩",
    KWD => "د.ك",
    KYD => "CI$",
    KZT => "лв",
    LAK => "₭",
    LBP => "ل.ل.",
    LKR => "₨",
    LRD => "L$",
    LSL => "M ",
    LYD => "ل.د",
    MAD => "MAD ",
    MDL => "L ",
    MGA => "Ar ",
    MKD => "ден",
    MMK => "K",
    MNT => "₮",
    MOP => "MOP$",
    MRU => "UM",
    MUR => "₨",
    MVR => "Rf. ",
    MWK => "MK ",
    MXN => "Mex$",
    MYR => "RM ",
    MZN => "MT ",
    NAD => "N$",
    NGN => "₦",
    NIO => "C$",
    NOK => "kr ",
    NPR => "₨",
    NZD => "NZ$",
    OMR => "﷼",
    PAB => "B/.",
    PEN => "S/.",
    PGK => "K",
    PHP => "₱",
    PKR => "₨",
    PLN => "zł",
    PYG => "Gs ",
    QAR => "﷼",
    RON => "lei ",
    RSD => "Дин.",
    RUB => "₽",
    RWF => "R₣",
    SAR => "﷼",
    SBD => "SI$",
    SCR => "₨",
    SDG => "PT",
    SEK => "kr ",
    SGD => "S$",
    SHP => "£",
    SLE => "Le ",
    SLL => "Le ",
    SOS => "S ",
    SRD => "Sr$",
    SSP => "SS£",
    STD => "Db",
    SYP => "£S",
    SZL => "L",
    THB => "฿",
    TJS => "SM ",
    TMT => "m",
    TND => "د.ت",
    TOP => "T$",
    TRY => "₤",
    TTD => "TT$",
    TVD => "$T",
    TWD => "NT$",
    TZS => "TSh ",
    UAH => "₴",
    UGX => "USh ",
    USD => "$",
    UYU => "$U ",
    UZS => "лв",
    VEF => "Bs ",
    VES => "Bs. S",
    VND => "₫",
    VUV => "VT ",
    WST => "WS$",
    XAF => "FCFA ",
    XCD => "EC$",
    XOF => "CFA ",
    XPF => "₣",
    YER => "﷼",
    ZAR => "R ",
    ZMW => "ZK",
}

/// Canonical resolution for symbols shared by more than one currency.
///
/// Consulted before the per-currency symbol table, so these entries decide
/// which currency a shared symbol means.
pub const AMBIGUOUS_SYMBOLS: &[(&str, Currency)] = &[
    // also BMD
    ("$", Currency::USD),
    // also GIP, IMP, JEP, SHP
    ("£", Currency::GBP),
    // also NIO
    ("C$", Currency::CAD),
    // also BND
    ("B$", Currency::BSD),
    // also AWG
    ("ƒ", Currency::ANG),
    // also KGS, KZT, UZS
    ("лв", Currency::BGN),
    // also DKK, ISK, NOK
    ("kr ", Currency::SEK),
    // also LKR, MUR, NPR, SCR
    ("₨", Currency::PKR),
    // also IRR, OMR, QAR, YER
    ("﷼", Currency::SAR),
    // also MDL
    ("L ", Currency::HNL),
    // also PGK
    ("K", Currency::MMK),
    // also KPW
    ("₩", Currency::KRW),
    // also CUP
    ("₱", Currency::PHP),
    // also SLL
    ("Le ", Currency::SLE),
];

impl Currency {
    /// Resolve a currency code (any case) or a known symbol.
    ///
    /// Symbols are matched first, exactly and then ignoring surrounding
    /// whitespace, so both `"kr "` and `"kr"` resolve to SEK.
    pub fn parse(token: &str) -> Result<Self> {
        Self::from_symbol(token)
            .or_else(|| Self::from_code(token))
            .or_else(|| {
                let trimmed = token.trim();
                if trimmed.is_empty() {
                    return None;
                }
                Self::from_trimmed_symbol(trimmed).or_else(|| Self::from_code(trimmed))
            })
            .ok_or_else(|| MoneyError::UnknownCurrency(token.to_string()))
    }

    /// Parse from code, case-insensitive
    pub fn from_code(code: &str) -> Option<Self> {
        Self::VARIANTS
            .iter()
            .copied()
            .find(|c| c.code().eq_ignore_ascii_case(code))
    }

    /// Exact symbol lookup, honouring [`AMBIGUOUS_SYMBOLS`]
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        AMBIGUOUS_SYMBOLS
            .iter()
            .find(|(s, _)| *s == symbol)
            .map(|(_, c)| *c)
            .or_else(|| Self::VARIANTS.iter().copied().find(|c| c.symbol() == symbol))
    }

    fn from_trimmed_symbol(symbol: &str) -> Option<Self> {
        AMBIGUOUS_SYMBOLS
            .iter()
            .find(|(s, _)| s.trim() == symbol)
            .map(|(_, c)| *c)
            .or_else(|| {
                Self::VARIANTS
                    .iter()
                    .copied()
                    .find(|c| c.symbol().trim() == symbol)
            })
    }

    /// Lower-case code, used as the cache column name
    pub fn column(&self) -> String {
        self.code().to_ascii_lowercase()
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for Currency {
    type Err = MoneyError;

    fn from_str(s: &str) -> Result<Self> {
        Currency::parse(s)
    }
}

impl TryFrom<String> for Currency {
    type Error = MoneyError;

    fn try_from(value: String) -> Result<Self> {
        Currency::parse(&value)
    }
}

impl From<Currency> for String {
    fn from(currency: Currency) -> Self {
        currency.code().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_currency_code() {
        assert_eq!(Currency::USD.code(), "USD");
        assert_eq!(Currency::EUR.code(), "EUR");
        assert_eq!(Currency::TRY.code(), "TRY");
    }

    #[test]
    fn test_currency_symbol() {
        assert_eq!(Currency::USD.symbol(), "$");
        assert_eq!(Currency::EUR.symbol(), "€");
        assert_eq!(Currency::GBP.symbol(), "£");
        assert_eq!(Currency::INR.symbol(), "₹");
    }

    #[test]
    fn test_parse_code_any_case() {
        assert_eq!(Currency::parse("EUR").unwrap(), Currency::EUR);
        assert_eq!(Currency::parse("eur").unwrap(), Currency::EUR);
        assert_eq!(Currency::parse("Aud").unwrap(), Currency::AUD);
    }

    #[test]
    fn test_parse_symbol() {
        assert_eq!(Currency::parse("€").unwrap(), Currency::EUR);
        assert_eq!(Currency::parse("A$").unwrap(), Currency::AUD);
        assert_eq!(Currency::parse("₹").unwrap(), Currency::INR);
        assert_eq!(Currency::parse("JP¥").unwrap(), Currency::JPY);
    }

    #[test]
    fn test_ambiguous_symbols_resolve_canonically() {
        assert_eq!(Currency::parse("$").unwrap(), Currency::USD);
        assert_eq!(Currency::parse("£").unwrap(), Currency::GBP);
        assert_eq!(Currency::parse("C$").unwrap(), Currency::CAD);
        assert_eq!(Currency::parse("kr ").unwrap(), Currency::SEK);
        assert_eq!(Currency::parse("kr").unwrap(), Currency::SEK);
    }

    #[test]
    fn test_trimmed_symbol_prefers_exact_match() {
        // "L" is SZL exactly; "L " (HNL/MDL) only matches with its space
        assert_eq!(Currency::parse("L").unwrap(), Currency::SZL);
        assert_eq!(Currency::parse("L ").unwrap(), Currency::HNL);
    }

    #[test]
    fn test_ambiguous_table_only_lists_shared_symbols() {
        for (symbol, canonical) in AMBIGUOUS_SYMBOLS {
            assert_eq!(canonical.symbol(), *symbol);
            let holders = Currency::VARIANTS.iter().filter(|c| c.symbol() == *symbol).count();
            assert!(holders > 1, "{symbol:?} is not shared");
        }
    }

    #[test]
    fn test_every_shared_symbol_is_listed() {
        for currency in Currency::VARIANTS {
            let shared = Currency::VARIANTS
                .iter()
                .filter(|c| c.symbol() == currency.symbol())
                .count();
            if shared > 1 {
                assert!(
                    AMBIGUOUS_SYMBOLS.iter().any(|(s, _)| *s == currency.symbol()),
                    "{} shares {:?} without a canonical entry",
                    currency,
                    currency.symbol()
                );
            }
        }
    }

    #[test]
    fn test_unknown_currency() {
        assert!(matches!(
            Currency::parse("XXX"),
            Err(MoneyError::UnknownCurrency(_))
        ));
        assert!(Currency::parse("").is_err());
        assert!(Currency::parse("   ").is_err());
    }

    #[test]
    fn test_currency_display_and_from_str() {
        assert_eq!(format!("{}", Currency::USD), "USD");
        let parsed: Currency = "gbp".parse().unwrap();
        assert_eq!(parsed, Currency::GBP);
    }

    #[test]
    fn test_serde_accepts_symbols_and_codes() {
        let c: Currency = serde_json::from_str("\"€\"").unwrap();
        assert_eq!(c, Currency::EUR);
        let c: Currency = serde_json::from_str("\"usd\"").unwrap();
        assert_eq!(c, Currency::USD);
        assert_eq!(serde_json::to_string(&Currency::AUD).unwrap(), "\"AUD\"");
    }

    #[test]
    fn test_all_currencies() {
        assert_eq!(Currency::VARIANTS.len(), 160);
        assert!(Currency::VARIANTS.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(Currency::EUR.column(), "eur");
    }

    #[test]
    fn test_lek_is_a_regular_variant() {
        assert!(Currency::VARIANTS.contains(&Currency::ALL));
        assert_eq!(Currency::ALL.code(), "ALL");
        assert_eq!(Currency::parse("all").unwrap(), Currency::ALL);
        assert_eq!(Currency::parse("Lek").unwrap(), Currency::ALL);
    }
}
