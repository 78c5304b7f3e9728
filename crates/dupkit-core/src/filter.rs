use std::fmt;
use std::fs;
use std::path::{is_separator, Path, PathBuf};
use tracing::debug;

const FILTER_PREFIXES: [&str; 4] = ["-", "+", "i:", "e:"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterToken {
    PassThrough(String),
    File(String),
    Directory(String),
}

impl FilterToken {
    pub fn pattern(&self) -> String {
        match self {
            Self::PassThrough(expr) => expr.clone(),
            Self::File(path) => format!("+{path}"),
            Self::Directory(path) if path.is_empty() => "+*".to_string(),
            Self::Directory(path) => format!("+{path}/*"),
        }
    }
}

impl fmt::Display for FilterToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.pattern())
    }
}

pub struct FilterTranslator {
    repository: PathBuf,
    guess_root: PathBuf,
}

impl FilterTranslator {
    pub fn new(repository: impl AsRef<Path>, guess_root: impl AsRef<Path>) -> Self {
        Self {
            repository: repository.as_ref().to_path_buf(),
            guess_root: guess_root.as_ref().to_path_buf(),
        }
    }

    pub fn translate_all<S: AsRef<str>>(&self, inputs: &[S]) -> Vec<FilterToken> {
        inputs.iter().map(|input| self.translate(input.as_ref())).collect()
    }

    pub fn translate(&self, input: &str) -> FilterToken {
        if FILTER_PREFIXES.iter().any(|prefix| input.starts_with(*prefix)) {
            return FilterToken::PassThrough(input.to_string());
        }

        if input.ends_with(is_separator) {
            let dir = trim_separators(input).trim_end_matches(is_separator);
            return FilterToken::Directory(dir.to_string());
        }

        if let Ok(canonical) = fs::canonicalize(input) {
            let relative = self.relative_to_repository(&canonical);
            let token = if canonical.is_dir() {
                FilterToken::Directory(relative)
            } else {
                FilterToken::File(relative)
            };
            debug!("{input} resolved to {}", token.pattern());
            return token;
        }

        // Best effort: the filesystem may change before the engine runs.
        let relative = trim_separators(input).to_string();
        let guess = self.guess_root.join(&relative);
        if guess.is_dir() {
            debug!("{input} found as directory under {}", self.guess_root.display());
            FilterToken::Directory(relative)
        } else {
            if !guess.is_file() {
                debug!("{input} not found locally or under {}", self.guess_root.display());
            }
            FilterToken::File(relative)
        }
    }

    fn relative_to_repository(&self, canonical: &Path) -> String {
        let repository =
            fs::canonicalize(&self.repository).unwrap_or_else(|_| self.repository.clone());
        let relative = canonical.strip_prefix(&repository).unwrap_or(canonical);
        trim_separators(&relative.to_string_lossy()).to_string()
    }
}

fn trim_separators(path: &str) -> &str {
    path.trim_start_matches(is_separator)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn root_translator() -> FilterTranslator {
        FilterTranslator::new("/", "/nonexistent-guess-root")
    }

    #[test]
    fn filter_expressions_pass_through() {
        let translator = root_translator();
        for expr in ["+foo/*", "-*.tmp", "i:^etc/.*\\.conf$", "e:cache/"] {
            assert_eq!(translator.translate(expr), FilterToken::PassThrough(expr.to_string()));
            assert_eq!(translator.translate(expr).pattern(), expr);
        }
    }

    #[test]
    fn trailing_separator_means_recursive_directory() {
        let translator = root_translator();
        assert_eq!(translator.translate("var/log/").pattern(), "+var/log/*");
        assert_eq!(translator.translate("//var/log/").pattern(), "+var/log/*");
    }

    #[test]
    fn existing_directory_and_file_are_classified() {
        let tmp = tempdir().unwrap();
        let dir = tmp.path().join("etc");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("hosts"), "127.0.0.1 localhost\n").unwrap();

        let translator = FilterTranslator::new(tmp.path(), "/nonexistent-guess-root");
        assert_eq!(
            translator.translate(dir.to_str().unwrap()),
            FilterToken::Directory("etc".to_string())
        );
        assert_eq!(
            translator.translate(dir.join("hosts").to_str().unwrap()).pattern(),
            "+etc/hosts"
        );
    }

    #[test]
    fn paths_outside_repository_lose_only_the_leading_separator() {
        let tmp = tempdir().unwrap();
        let file = tmp.path().join("notes.txt");
        fs::write(&file, "x").unwrap();
        let canonical = fs::canonicalize(&file).unwrap();

        let translator = root_translator();
        let expected = format!("+{}", canonical.to_str().unwrap().trim_start_matches('/'));
        assert_eq!(translator.translate(file.to_str().unwrap()).pattern(), expected);
    }

    #[test]
    fn symlinks_resolve_to_their_target() {
        let tmp = tempdir().unwrap();
        let real = tmp.path().join("data/real");
        fs::create_dir_all(&real).unwrap();
        let link = tmp.path().join("link");
        std::os::unix::fs::symlink(&real, &link).unwrap();

        let translator = FilterTranslator::new(tmp.path(), "/nonexistent-guess-root");
        assert_eq!(translator.translate(link.to_str().unwrap()).pattern(), "+data/real/*");
    }

    #[test]
    fn missing_paths_are_probed_under_guess_root() {
        let mirror = tempdir().unwrap();
        fs::create_dir_all(mirror.path().join("dupkit-probe/www")).unwrap();
        fs::write(mirror.path().join("dupkit-probe/www/index.html"), "<html/>").unwrap();

        let translator = FilterTranslator::new("/", mirror.path());
        assert_eq!(translator.translate("/dupkit-probe/www").pattern(), "+dupkit-probe/www/*");
        assert_eq!(
            translator.translate("dupkit-probe/www/index.html").pattern(),
            "+dupkit-probe/www/index.html"
        );
    }

    #[test]
    fn unknown_paths_become_literal_inclusions() {
        let translator = root_translator();
        assert_eq!(
            translator.translate("/definitely/not/here.db"),
            FilterToken::File("definitely/not/here.db".to_string())
        );
    }

    #[test]
    fn translate_all_keeps_input_order() {
        let translator = root_translator();
        let patterns: Vec<String> = translator
            .translate_all(&["home/alice/", "-*.bak", "+opt/*"])
            .iter()
            .map(FilterToken::pattern)
            .collect();
        assert_eq!(patterns, vec!["+home/alice/*", "-*.bak", "+opt/*"]);
    }
}
