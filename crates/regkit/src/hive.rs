//! Registry hives and their accepted spellings.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Top-level namespace root of the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Hive {
    /// HKEY_LOCAL_MACHINE
    LocalMachine,
    /// HKEY_CURRENT_USER
    CurrentUser,
    /// HKEY_CLASSES_ROOT
    ClassesRoot,
    /// HKEY_USERS
    Users,
    /// HKEY_CURRENT_CONFIG
    CurrentConfig,
}

impl Hive {
    /// Every hive, in display order.
    pub const ALL: [Hive; 5] = [
        Hive::LocalMachine,
        Hive::CurrentUser,
        Hive::ClassesRoot,
        Hive::Users,
        Hive::CurrentConfig,
    ];

    /// The single canonical spelling used in canonical paths.
    pub fn canonical(&self) -> &'static str {
        match self {
            Hive::LocalMachine => "HKLM",
            Hive::CurrentUser => "HKCU",
            Hive::ClassesRoot => "HKCR",
            Hive::Users => "HKU",
            Hive::CurrentConfig => "HKCC",
        }
    }

    /// The long `HKEY_*` spelling.
    pub fn long_name(&self) -> &'static str {
        match self {
            Hive::LocalMachine => "HKEY_LOCAL_MACHINE",
            Hive::CurrentUser => "HKEY_CURRENT_USER",
            Hive::ClassesRoot => "HKEY_CLASSES_ROOT",
            Hive::Users => "HKEY_USERS",
            Hive::CurrentConfig => "HKEY_CURRENT_CONFIG",
        }
    }

    /// Look up a hive by any accepted alias, case-insensitively.
    pub fn from_alias(alias: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|hive| {
            alias.eq_ignore_ascii_case(hive.canonical())
                || alias.eq_ignore_ascii_case(hive.long_name())
        })
    }
}

impl fmt::Display for Hive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.canonical())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_and_long_aliases() {
        assert_eq!(Hive::from_alias("HKLM"), Some(Hive::LocalMachine));
        assert_eq!(
            Hive::from_alias("HKEY_LOCAL_MACHINE"),
            Some(Hive::LocalMachine)
        );
        assert_eq!(Hive::from_alias("hkcu"), Some(Hive::CurrentUser));
        assert_eq!(Hive::from_alias("Hkey_Users"), Some(Hive::Users));
        assert_eq!(Hive::from_alias("HKCC"), Some(Hive::CurrentConfig));
    }

    #[test]
    fn test_unknown_alias() {
        assert_eq!(Hive::from_alias("HKXX"), None);
        assert_eq!(Hive::from_alias(""), None);
        assert_eq!(Hive::from_alias("HKLM "), None);
    }

    #[test]
    fn test_every_alias_maps_back_to_its_hive() {
        for hive in Hive::ALL {
            assert_eq!(Hive::from_alias(hive.canonical()), Some(hive));
            assert_eq!(Hive::from_alias(hive.long_name()), Some(hive));
            assert_eq!(hive.to_string(), hive.canonical());
        }
    }
}
