//! Macro symbol naming.
//!
//! Settings, packages and APIs are exposed to C code as `MYNEWT_VAL_*`,
//! `MYNEWT_PKG_*` and `MYNEWT_API_*` macros. Setting values may name these
//! symbols directly, which is what the resolver substitutes.

/// Prefix of setting macros.
pub const SETTING_PREFIX: &str = "MYNEWT_VAL_";

/// Prefix of package-presence macros.
pub const PACKAGE_PREFIX: &str = "MYNEWT_PKG_";

/// Prefix of API-presence macros.
pub const API_PREFIX: &str = "MYNEWT_API_";

/// Replace `/`, `-` and space with `_`, then upper-case.
pub fn escape(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            '/' | '-' | ' ' => '_',
            other => other,
        })
        .collect::<String>()
        .to_uppercase()
}

/// `MYNEWT_VAL_<ESCAPED_UPPER_NAME>`
pub fn setting_symbol(name: &str) -> String {
    format!("{}{}", SETTING_PREFIX, escape(name))
}

/// `MYNEWT_PKG_<ESCAPED_UPPER_NAME>`
pub fn package_symbol(name: &str) -> String {
    format!("{}{}", PACKAGE_PREFIX, escape(name))
}

/// `MYNEWT_API_<UPPER_NAME>`; API names are upper-cased but not escaped.
pub fn api_symbol(name: &str) -> String {
    format!("{}{}", API_PREFIX, name.to_uppercase())
}

pub fn is_setting_symbol(s: &str) -> bool {
    s.starts_with(SETTING_PREFIX)
}

pub fn is_package_symbol(s: &str) -> bool {
    s.starts_with(PACKAGE_PREFIX)
}

pub fn is_api_symbol(s: &str) -> bool {
    s.starts_with(API_PREFIX)
}

/// Compiler flag that defines a feature as enabled.
pub fn feature_to_cflag(name: &str) -> String {
    format!("-D{}=1", setting_symbol(name))
}
