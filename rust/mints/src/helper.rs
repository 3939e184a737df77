//! Whitespace-separated auxiliary file readers: fixed-variable lists,
//! solution hints, and flippable-pair registrations for the CLI.

use fnv::{FnvHashMap, FnvHashSet};
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Read `name value` per line into a map. Values are rounded to the nearest
/// integer; lines with any other number of tokens are skipped.
pub fn read_names_and_values(
    path: impl AsRef<Path>,
) -> std::io::Result<FnvHashMap<String, i64>> {
    let mut result: FnvHashMap<String, i64> = Default::default();
    for line in lines_of(path)? {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.len() != 2 {
            continue;
        }
        if let Ok(value) = tokens[1].parse::<f64>() {
            result.insert(tokens[0].to_string(), (value + 0.5).floor() as i64);
        }
    }
    Ok(result)
}

/// Read the first token of each non-empty line into a set.
pub fn read_names(path: impl AsRef<Path>) -> std::io::Result<FnvHashSet<String>> {
    let mut result: FnvHashSet<String> = Default::default();
    for line in lines_of(path)? {
        if let Some(token) = line.split_whitespace().next() {
            result.insert(token.to_string());
        }
    }
    Ok(result)
}

/// Read the first two tokens of each line into a pair sequence; lines with
/// fewer than two tokens are skipped.
pub fn read_name_pairs(path: impl AsRef<Path>) -> std::io::Result<Vec<(String, String)>> {
    let mut result = Vec::new();
    for line in lines_of(path)? {
        let mut tokens = line.split_whitespace();
        if let (Some(first), Some(second)) = (tokens.next(), tokens.next()) {
            result.push((first.to_string(), second.to_string()));
        }
    }
    Ok(result)
}

fn lines_of(path: impl AsRef<Path>) -> std::io::Result<Vec<String>> {
    let reader = BufReader::new(std::fs::File::open(path)?);
    reader.lines().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_file(content: &str) -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("aux.txt");
        let mut file = std::fs::File::create(&path).unwrap();
        write!(file, "{content}").unwrap();
        (dir, path)
    }

    #[test]
    fn names_and_values_round_and_skip_malformed() {
        let (_dir, path) = write_file("x[0] 3\nx[1] 2.6\n\nmalformed line here\ny -1\n");
        let map = read_names_and_values(&path).unwrap();
        assert_eq!(map.len(), 3);
        assert_eq!(map["x[0]"], 3);
        assert_eq!(map["x[1]"], 3);
        assert_eq!(map["y"], -1);
    }

    #[test]
    fn names_take_the_first_token() {
        let (_dir, path) = write_file("a\nb trailing junk\n\nc\n");
        let names = read_names(&path).unwrap();
        assert_eq!(names.len(), 3);
        assert!(names.contains("b"));
    }

    #[test]
    fn pairs_skip_short_lines() {
        let (_dir, path) = write_file("a b\nonly\nc d extra\n");
        let pairs = read_name_pairs(&path).unwrap();
        assert_eq!(
            pairs,
            vec![
                ("a".to_string(), "b".to_string()),
                ("c".to_string(), "d".to_string())
            ]
        );
    }

    #[test]
    fn missing_file_is_an_io_error() {
        assert!(read_names("definitely/not/here.txt").is_err());
    }
}
