const GLOB_CHARS: [char; 4] = ['*', '?', '[', ']'];

pub fn has_glob(input: &str) -> bool {
    input.chars().any(|c| GLOB_CHARS.contains(&c))
}

/// Splits a `/` separated filesystem path containing an optional glob pattern
/// into (base_path, optional_glob_pattern).
///
/// Examples:
/// - "/data/**/*.csv" -> ("/data", Some("**/*.csv"))
/// - "/data/*.csv"    -> ("/data", Some("*.csv"))
/// - "/*.csv"         -> ("/", Some("*.csv"))
/// - "*.csv"          -> ("", Some("*.csv"))
/// - "/data/a.csv"    -> ("/data/a.csv", None)
pub fn split_path_and_glob(input: &str) -> (String, Option<String>) {
    let parts: Vec<&str> = input.split('/').collect();

    match parts.iter().position(|p| has_glob(p)) {
        Some(i) => {
            let mut base = parts[..i].join("/");
            if base.is_empty() && input.starts_with('/') {
                base.push('/');
            }
            (base, Some(parts[i..].join("/")))
        }
        None => (input.to_string(), None),
    }
}

/// Compiles a full path pattern with `/` treated as a hard separator, so `*`
/// never crosses directory boundaries while `**` does.
pub fn compile_pattern(pattern: &str) -> Result<(glob::Pattern, glob::MatchOptions), glob::PatternError> {
    let options = glob::MatchOptions {
        case_sensitive: true,
        require_literal_separator: true,
        require_literal_leading_dot: false,
    };
    Ok((glob::Pattern::new(pattern)?, options))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_glob() {
        let (base, glob) = split_path_and_glob("/data/main.csv");
        assert_eq!(base, "/data/main.csv");
        assert_eq!(glob, None);
    }

    #[test]
    fn test_simple_glob() {
        let (base, glob) = split_path_and_glob("/data/*.csv");
        assert_eq!(base, "/data");
        assert_eq!(glob, Some("*.csv".to_string()));
    }

    #[test]
    fn test_recursive_glob() {
        let (base, glob) = split_path_and_glob("data/**/*.csv");
        assert_eq!(base, "data");
        assert_eq!(glob, Some("**/*.csv".to_string()));
    }

    #[test]
    fn test_glob_at_root() {
        let (base, glob) = split_path_and_glob("/*.txt");
        assert_eq!(base, "/");
        assert_eq!(glob, Some("*.txt".to_string()));
    }

    #[test]
    fn test_relative_glob_at_start() {
        let (base, glob) = split_path_and_glob("file[0-9].log");
        assert_eq!(base, "");
        assert_eq!(glob, Some("file[0-9].log".to_string()));
    }

    #[test]
    fn test_glob_in_middle_segment() {
        let (base, glob) = split_path_and_glob("/logs/2024-0?/app.log");
        assert_eq!(base, "/logs");
        assert_eq!(glob, Some("2024-0?/app.log".to_string()));
    }

    #[test]
    fn star_does_not_cross_directories() {
        let (pattern, options) = compile_pattern("/data/*.csv").unwrap();
        assert!(pattern.matches_with("/data/a.csv", options));
        assert!(!pattern.matches_with("/data/nested/a.csv", options));

        let (pattern, options) = compile_pattern("/data/**/*.csv").unwrap();
        assert!(pattern.matches_with("/data/nested/a.csv", options));
    }

    #[test]
    fn invalid_pattern_is_rejected() {
        assert!(compile_pattern("/data/[invalid").is_err());
    }
}
