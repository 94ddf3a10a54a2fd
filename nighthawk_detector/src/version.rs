//! Plugin version, taken from the crate manifest.
//!
//! Everything that needs the vesper-nighthawk version gets it from here.

pub const MAJOR_NUMBER: &str = env!("CARGO_PKG_VERSION_MAJOR");
pub const MINOR_NUMBER: &str = env!("CARGO_PKG_VERSION_MINOR");
pub const PATCH_NUMBER: &str = env!("CARGO_PKG_VERSION_PATCH");
pub const SUFFIX: &str = env!("CARGO_PKG_VERSION_PRE");

pub fn major_version() -> String {
    MAJOR_NUMBER.to_string()
}

pub fn minor_version() -> String {
    format!("{}.{MINOR_NUMBER}", major_version())
}

pub fn patch_version() -> String {
    format!("{}.{PATCH_NUMBER}", minor_version())
}

/// Full version including any pre-release suffix, e.g. `0.1.0-alpha.1`.
pub fn full_version() -> String {
    if SUFFIX.is_empty() {
        patch_version()
    } else {
        format!("{}-{SUFFIX}", patch_version())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_version_matches_cargo() {
        assert_eq!(full_version(), env!("CARGO_PKG_VERSION"));
    }

    #[test]
    fn versions_nest() {
        assert!(minor_version().starts_with(&major_version()));
        assert!(patch_version().starts_with(&minor_version()));
    }
}
