//! Mirror template resolution
//!
//! Templates follow the pacman mirrorlist convention: `$repo` and `$arch`
//! are substituted, e.g. `https://mirror.pkgbuild.com/$repo/os/$arch`.

/// Placeholder replaced by the repository name
pub const REPO_PLACEHOLDER: &str = "$repo";

/// Placeholder replaced by the architecture
pub const ARCH_PLACEHOLDER: &str = "$arch";

/// Resolve a mirror template to a base URL without a trailing slash.
///
/// Pure string substitution. A malformed template produces a malformed URL,
/// which surfaces later as a failed mirror attempt.
pub fn resolve(template: &str, repository: &str, arch: &str) -> String {
    template
        .replace(REPO_PLACEHOLDER, repository)
        .replace(ARCH_PLACEHOLDER, arch)
        .trim_end_matches('/')
        .to_string()
}

/// Full URL of a package file under a resolved base URL.
pub fn package_url(base_url: &str, file: &str) -> String {
    format!("{}/{}", base_url, file)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_substitutes_both_placeholders() {
        assert_eq!(
            resolve("https://mirror.pkgbuild.com/$repo/os/$arch", "core", "x86_64"),
            "https://mirror.pkgbuild.com/core/os/x86_64"
        );
    }

    #[test]
    fn test_resolve_strips_trailing_separator() {
        assert_eq!(resolve("http://m1/$repo/$arch/", "extra", "aarch64"), "http://m1/extra/aarch64");
        assert_eq!(resolve("http://m1/$repo/$arch//", "extra", "aarch64"), "http://m1/extra/aarch64");
    }

    #[test]
    fn test_resolve_without_placeholders_is_identity() {
        assert_eq!(resolve("http://static.example/pkgs", "core", "x86_64"), "http://static.example/pkgs");
    }

    #[test]
    fn test_resolve_repeated_placeholders() {
        assert_eq!(resolve("http://m/$arch/$repo/$arch", "core", "x86_64"), "http://m/x86_64/core/x86_64");
    }

    #[test]
    fn test_package_url() {
        let base = resolve("http://m1/$repo/$arch", "core", "x86_64");
        assert_eq!(
            package_url(&base, "tar-1.34-1-x86_64.pkg.tar.zst"),
            "http://m1/core/x86_64/tar-1.34-1-x86_64.pkg.tar.zst"
        );
    }
}
