use std::fs::File;
use std::io::{BufRead, BufWriter, Write};
use std::path::Path;

use crate::{Result, SamplePair, ScopeError};

/// Writes one `"x y"` record per pair, six decimals, no header.
pub fn write_points<W: Write>(mut writer: W, pairs: &[SamplePair]) -> Result<()> {
    for pair in pairs {
        writeln!(writer, "{:.6} {:.6}", pair.x, pair.y)?;
    }
    writer.flush()?;
    Ok(())
}

/// Creates (or truncates) `path` and writes `pairs` to it.
pub fn export_to_path(path: impl AsRef<Path>, pairs: &[SamplePair]) -> Result<()> {
    let path = path.as_ref();
    let export_error = |source| ScopeError::Export {
        path: path.to_path_buf(),
        source,
    };

    let file = File::create(path).map_err(export_error)?;
    write_points(BufWriter::new(file), pairs).map_err(|err| match err {
        ScopeError::Io(source) => export_error(source),
        other => other,
    })?;

    tracing::info!(path = %path.display(), points = pairs.len(), "exported points");
    Ok(())
}

/// Parses the format produced by [`write_points`]. Blank lines are skipped.
pub fn read_points<R: BufRead>(reader: R) -> Result<Vec<SamplePair>> {
    let mut pairs = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let line_no = index + 1;
        if line.trim().is_empty() {
            continue;
        }

        let mut fields = line.split_whitespace();
        let (Some(x), Some(y), None) = (fields.next(), fields.next(), fields.next()) else {
            return Err(ScopeError::Parse {
                line: line_no,
                message: format!("expected two values, found `{line}`"),
            });
        };
        pairs.push(SamplePair::new(
            parse_value(x, line_no)?,
            parse_value(y, line_no)?,
        ));
    }
    Ok(pairs)
}

fn parse_value(field: &str, line: usize) -> Result<f32> {
    field.parse().map_err(|err| ScopeError::Parse {
        line,
        message: format!("`{field}`: {err}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_with_six_decimals() {
        let pairs = [SamplePair::new(0.5, -0.5), SamplePair::new(1.0, 1.0)];
        let mut out = Vec::new();
        write_points(&mut out, &pairs).unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "0.500000 -0.500000\n1.000000 1.000000\n"
        );
    }

    #[test]
    fn empty_input_writes_nothing() {
        let mut out = Vec::new();
        write_points(&mut out, &[]).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn exported_text_parses_back() {
        let pairs = [
            SamplePair::new(0.125, -0.75),
            SamplePair::new(-1.25, 0.0),
            SamplePair::new(0.333_333, 1.5),
        ];
        let mut out = Vec::new();
        write_points(&mut out, &pairs).unwrap();

        let parsed = read_points(out.as_slice()).unwrap();
        assert_eq!(parsed.len(), pairs.len());
        for (read, written) in parsed.iter().zip(&pairs) {
            assert!((read.x - written.x).abs() < 1e-6);
            assert!((read.y - written.y).abs() < 1e-6);
        }
    }

    #[test]
    fn malformed_line_reports_its_number() {
        let err = read_points("0.1 0.2\n\n0.3\n".as_bytes()).unwrap_err();
        assert!(matches!(err, ScopeError::Parse { line: 3, .. }));

        let err = read_points("0.1 nope\n".as_bytes()).unwrap_err();
        assert!(matches!(err, ScopeError::Parse { line: 1, .. }));
    }

    #[test]
    fn unopenable_destination_is_an_export_error() {
        let dir = std::env::temp_dir().join("xy-scope-missing-dir-for-export-test");
        let _ = std::fs::remove_dir_all(&dir);
        let path = dir.join("points.txt");

        let err = export_to_path(&path, &[SamplePair::default()]).unwrap_err();
        match err {
            ScopeError::Export { path: failed, .. } => assert_eq!(failed, path),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn export_writes_file() {
        let path = std::env::temp_dir().join(format!("xy-scope-export-{}.txt", std::process::id()));
        export_to_path(&path, &[SamplePair::new(0.5, -0.5)]).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(text, "0.500000 -0.500000\n");
    }
}
