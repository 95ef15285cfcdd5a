//! Symbol roster and symbolic-reference substitution.

use std::collections::BTreeMap;

use super::setting::Setting;
use crate::error::SyscfgError;
use crate::symbol::{
    api_symbol, is_api_symbol, is_package_symbol, package_symbol, setting_symbol,
};

/// Derived lookup tables used for substitution and header emission.
///
/// Never authoritative: rebuilt from scratch whenever settings change.
#[derive(Debug, Clone, Default)]
pub struct Roster {
    settings: BTreeMap<String, String>,
    packages: BTreeMap<String, bool>,
    apis: BTreeMap<String, bool>,
}

impl Roster {
    /// Build from current settings and the declared package and API sets.
    ///
    /// Package and API symbols referenced by any setting (current or last
    /// authored value) but not declared are recorded as absent.
    pub fn build(
        settings: &BTreeMap<String, Setting>,
        packages: &[String],
        apis: &[String],
    ) -> Self {
        let mut roster = Roster::default();

        for (name, setting) in settings {
            roster
                .settings
                .insert(setting_symbol(name), setting.value.clone());
        }
        for name in packages {
            roster.packages.insert(package_symbol(name), true);
        }
        for name in apis {
            roster.apis.insert(api_symbol(name), true);
        }

        for setting in settings.values() {
            for value in [setting.value.as_str(), setting.unfixed_value()] {
                if is_package_symbol(value) {
                    roster.packages.entry(value.to_string()).or_insert(false);
                } else if is_api_symbol(value) {
                    roster.apis.entry(value.to_string()).or_insert(false);
                }
            }
        }

        roster
    }

    /// Package-presence table, symbol order.
    pub fn packages(&self) -> &BTreeMap<String, bool> {
        &self.packages
    }

    /// API-presence table, symbol order.
    pub fn apis(&self) -> &BTreeMap<String, bool> {
        &self.apis
    }

    pub fn setting_value(&self, symbol: &str) -> Option<&str> {
        self.settings.get(symbol).map(String::as_str)
    }

    fn presence(&self, symbol: &str) -> Option<&'static str> {
        self.apis
            .get(symbol)
            .or_else(|| self.packages.get(symbol))
            .map(|present| if *present { "1" } else { "0" })
    }

    /// Resolve one value.
    ///
    /// Returns `Ok(None)` for plain literals, `Ok(Some(v))` when a
    /// substitution applies, and `Err(chain)` when following setting
    /// references revisits a symbol.
    pub fn resolve_value(&self, value: &str) -> Result<Option<String>, Vec<String>> {
        if !self.settings.contains_key(value) {
            return Ok(self.presence(value).map(str::to_string));
        }

        let mut chain = vec![value.to_string()];
        let mut cur = value;
        while let Some(next) = self.settings.get(cur) {
            let seen = chain.iter().any(|s| s == next);
            chain.push(next.clone());
            if seen {
                return Err(chain);
            }
            cur = next.as_str();
        }

        let resolved = self.presence(cur).unwrap_or(cur);
        Ok(Some(resolved.to_string()))
    }
}

/// Substitute every symbolic value against a roster snapshot.
pub(crate) fn fixup(
    settings: &mut BTreeMap<String, Setting>,
    roster: &Roster,
) -> Result<(), SyscfgError> {
    for (name, setting) in settings.iter_mut() {
        match roster.resolve_value(&setting.value) {
            Ok(Some(value)) => setting.value = value,
            Ok(None) => {}
            Err(chain) => {
                return Err(SyscfgError::CyclicReference {
                    setting: name.clone(),
                    chain,
                })
            }
        }
    }
    Ok(())
}
