//! The compiler's `module` option.
//!
//! Discriminants follow the compiler API's own enumeration so values read from
//! numeric option dumps map to the right variant.

use std::fmt;

/// Module system the compiler emits.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum ModuleKind {
    /// No module system.
    None = 0,
    /// CommonJS.
    CommonJs = 1,
    /// Asynchronous module definition.
    Amd = 2,
    /// Universal module definition.
    Umd = 3,
    /// SystemJS.
    System = 4,
    /// ECMAScript 2015 modules.
    Es2015 = 5,
    /// ECMAScript 2020 modules (adds `import.meta`, dynamic import).
    Es2020 = 6,
    /// ECMAScript 2022 modules (adds top-level await).
    Es2022 = 7,
    /// Latest ECMAScript modules.
    EsNext = 99,
    /// Node 16 resolution rules.
    Node16 = 100,
    /// Latest Node resolution rules.
    NodeNext = 199,
    /// Preserve import/export syntax as written.
    Preserve = 200,
}

impl ModuleKind {
    /// Parses the option's string spelling, case-insensitively.
    pub fn parse(s: &str) -> Option<Self> {
        Some(match s.to_ascii_lowercase().as_str() {
            "none" => ModuleKind::None,
            "commonjs" => ModuleKind::CommonJs,
            "amd" => ModuleKind::Amd,
            "umd" => ModuleKind::Umd,
            "system" => ModuleKind::System,
            "es6" | "es2015" => ModuleKind::Es2015,
            "es2020" => ModuleKind::Es2020,
            "es2022" => ModuleKind::Es2022,
            "esnext" => ModuleKind::EsNext,
            "node16" => ModuleKind::Node16,
            "nodenext" => ModuleKind::NodeNext,
            "preserve" => ModuleKind::Preserve,
            _ => return None,
        })
    }

    /// Maps a numeric option value to a variant.
    pub fn from_code(code: u64) -> Option<Self> {
        Some(match code {
            0 => ModuleKind::None,
            1 => ModuleKind::CommonJs,
            2 => ModuleKind::Amd,
            3 => ModuleKind::Umd,
            4 => ModuleKind::System,
            5 => ModuleKind::Es2015,
            6 => ModuleKind::Es2020,
            7 => ModuleKind::Es2022,
            99 => ModuleKind::EsNext,
            100 => ModuleKind::Node16,
            199 => ModuleKind::NodeNext,
            200 => ModuleKind::Preserve,
            _ => return None,
        })
    }

    /// The compiler's default when `module` is unset: ES2015 modules for
    /// ES2015-or-later script targets, CommonJS otherwise.
    pub fn default_for_target(target: Option<&str>) -> Self {
        match target.map(str::to_ascii_lowercase).as_deref() {
            None | Some("es3") | Some("es5") => ModuleKind::CommonJs,
            Some(_) => ModuleKind::Es2015,
        }
    }

    /// Returns `true` for the ECMAScript module kinds, whose code maps are
    /// written as `.mjs.map`.
    pub fn is_esm(self) -> bool {
        matches!(
            self,
            ModuleKind::Es2015 | ModuleKind::Es2020 | ModuleKind::Es2022 | ModuleKind::EsNext
        )
    }
}

impl fmt::Display for ModuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ModuleKind::None => "None",
            ModuleKind::CommonJs => "CommonJS",
            ModuleKind::Amd => "AMD",
            ModuleKind::Umd => "UMD",
            ModuleKind::System => "System",
            ModuleKind::Es2015 => "ES2015",
            ModuleKind::Es2020 => "ES2020",
            ModuleKind::Es2022 => "ES2022",
            ModuleKind::EsNext => "ESNext",
            ModuleKind::Node16 => "Node16",
            ModuleKind::NodeNext => "NodeNext",
            ModuleKind::Preserve => "Preserve",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn es2015_is_code_five() {
        assert_eq!(ModuleKind::Es2015 as u32, 5);
        assert_eq!(ModuleKind::from_code(5), Some(ModuleKind::Es2015));
    }

    #[test]
    fn parse_spellings() {
        assert_eq!(ModuleKind::parse("CommonJS"), Some(ModuleKind::CommonJs));
        assert_eq!(ModuleKind::parse("es6"), Some(ModuleKind::Es2015));
        assert_eq!(ModuleKind::parse("ESNext"), Some(ModuleKind::EsNext));
        assert_eq!(ModuleKind::parse("bogus"), None);
    }

    #[test]
    fn esm_classification() {
        assert!(ModuleKind::Es2015.is_esm());
        assert!(ModuleKind::EsNext.is_esm());
        assert!(!ModuleKind::CommonJs.is_esm());
        assert!(!ModuleKind::Umd.is_esm());
        assert!(!ModuleKind::NodeNext.is_esm());
    }

    #[test]
    fn default_follows_script_target() {
        assert_eq!(ModuleKind::default_for_target(None), ModuleKind::CommonJs);
        assert_eq!(ModuleKind::default_for_target(Some("ES5")), ModuleKind::CommonJs);
        assert_eq!(ModuleKind::default_for_target(Some("es2017")), ModuleKind::Es2015);
    }

    #[test]
    fn codes_roundtrip() {
        for code in [0u64, 1, 2, 3, 4, 5, 6, 7, 99, 100, 199, 200] {
            let kind = ModuleKind::from_code(code).unwrap();
            assert_eq!(kind as u64, code);
        }
        assert_eq!(ModuleKind::from_code(8), None);
    }
}
